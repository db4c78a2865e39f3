//! Heuristic stat-block parser.
//!
//! Text before the first section header holds the name, the size/type line,
//! core stats and meta lists; leftover lines there are trait candidates. Each
//! header (`Actions`, `Reactions`, ...) opens a section of `Name. text` entries.

use std::sync::LazyLock;

use data::monster::proficiency_bonus_for_cr;
use regex::Regex;

use super::normalize::{normalize_text, repair_number};
use super::{Abilities, Confidence, Entry, SectionKind, StatBlockDraft};

static SIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(tiny|small|medium|large|huge|gargantuan)\b").unwrap());
static AC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^armor class\s+(\S+)\s*(.*)$").unwrap());
static HP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^hit points\s+(\S+)\s*(.*)$").unwrap());
static SPEED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^speed\s+(.+)$").unwrap());
static SPEED_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\d+\s*ft").unwrap());
static CR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:challenge|cr)\s+([0-9lIO|o/]+)(.*)$").unwrap());
static XP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:([0-9][0-9,lIO|o]*)\s*XP\b|\bXP\s*([0-9][0-9,lIO|o]*))").unwrap()
});
static PB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:proficiency bonus|\bPB)\s*\+?\s*([0-9lIO|o]+)").unwrap());
static META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(saving throws|saves|skills|damage resistances|resistances|damage immunities|immunities|damage vulnerabilities|vulnerabilities|condition immunities|senses|languages)\b\s*(.*)$",
    )
    .unwrap()
});
static ABILITY_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:STR|DEX|CON|INT|WIS|CHA|MOD|SAVE)\b|[0-9lIO|o]{1,2}\s*\()").unwrap()
});
static ABILITY_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bSTR\s+DEX\s+CON\s+INT\s+WIS\s+CHA\b((?:\s*[0-9lIO|o]{1,2}\s*\(\s*[+\-\u{2013}]?\s*[0-9lIO|o]{1,2}\s*\)){6})",
    )
    .unwrap()
});
static ABILITY_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9lIO|o]{1,2})\s*\(").unwrap());
static ABILITY_INLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(STR|DEX|CON|INT|WIS|CHA)\b\s*:?\s*([0-9lIO|o]{1,2})\s*(?:\(\s*[+\-\u{2013}]?\s*[0-9lIO|o]{1,2}\s*\)|[+\-\u{2013}]\s*\d{1,2})",
    )
    .unwrap()
});
static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][^.:]{0,60}?)\.(?:\s+(\S.*))?$").unwrap());
static PARENS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]*)\)").unwrap());

const NAME_CONNECTORS: &[&str] = &["a", "an", "and", "at", "by", "for", "from", "in", "of", "on", "or", "per", "the", "to", "with"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meta {
    Speed,
    Saves,
    Skills,
    Resistances,
    Immunities,
    Vulnerabilities,
    ConditionImmunities,
    Senses,
    Languages,
}

impl Meta {
    fn from_label(label: &str) -> Option<Self> {
        Some(match label.to_lowercase().as_str() {
            "saving throws" | "saves" => Meta::Saves,
            "skills" => Meta::Skills,
            "damage resistances" | "resistances" => Meta::Resistances,
            "damage immunities" | "immunities" => Meta::Immunities,
            "damage vulnerabilities" | "vulnerabilities" => Meta::Vulnerabilities,
            "condition immunities" => Meta::ConditionImmunities,
            "senses" => Meta::Senses,
            "languages" => Meta::Languages,
            _ => return None,
        })
    }

    fn field(self, draft: &mut StatBlockDraft) -> &mut String {
        match self {
            Meta::Speed => &mut draft.speed,
            Meta::Saves => &mut draft.saves,
            Meta::Skills => &mut draft.skills,
            Meta::Resistances => &mut draft.damage_resistances,
            Meta::Immunities => &mut draft.damage_immunities,
            Meta::Vulnerabilities => &mut draft.damage_vulnerabilities,
            Meta::ConditionImmunities => &mut draft.condition_immunities,
            Meta::Senses => &mut draft.senses,
            Meta::Languages => &mut draft.languages,
        }
    }
}

/// Turn OCR output into a draft for manual review.
pub fn parse_stat_block(raw: &str) -> StatBlockDraft {
    let text = normalize_text(raw);
    let lines: Vec<&str> = text.lines().collect();

    let first_header = lines
        .iter()
        .position(|l| SectionKind::from_header(l).is_some())
        .unwrap_or(lines.len());
    let (preamble, rest) = lines.split_at(first_header);

    let mut draft = StatBlockDraft::default();
    let traits = parse_preamble(&mut draft, preamble);
    if !traits.is_empty() {
        attach_entries(&mut draft, SectionKind::Traits, &traits);
    }

    let mut current: Option<(SectionKind, Vec<&str>)> = None;
    for &line in rest {
        if let Some(kind) = SectionKind::from_header(line) {
            if let Some((kind, body)) = current.take() {
                attach_entries(&mut draft, kind, &body);
            }
            draft.section_mut(kind);
            current = Some((kind, Vec::new()));
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }
    if let Some((kind, body)) = current {
        attach_entries(&mut draft, kind, &body);
    }

    draft.text = text;
    tracing::debug!(
        name = %draft.name,
        sections = draft.sections.len(),
        ac = ?draft.confidence.ac,
        hp = ?draft.confidence.hp,
        cr = ?draft.confidence.cr,
        "parsed stat block"
    );
    draft
}

fn is_field_line(line: &str) -> bool {
    AC_RE.is_match(line)
        || HP_RE.is_match(line)
        || SPEED_RE.is_match(line)
        || CR_RE.is_match(line)
        || META_RE.is_match(line)
        || ABILITY_LINE_RE.is_match(line)
        || SIZE_RE.is_match(line)
}

/// Fill the fields found before the first section header and return the
/// remaining trait candidate lines.
fn parse_preamble<'a>(draft: &mut StatBlockDraft, lines: &[&'a str]) -> Vec<&'a str> {
    let mut index = 0;
    if let Some(first) = lines.first().filter(|l| !is_field_line(l)) {
        draft.name = first.trim_end_matches(['.', ':', ',']).to_string();
        index = 1;
    }
    if let Some(offset) = lines[index..].iter().take(2).position(|l| SIZE_RE.is_match(l)) {
        draft.size_type = lines[index + offset].to_string();
        index += offset + 1;
    }

    let mut ability_text = String::new();
    let mut traits = Vec::new();
    let mut last_meta: Option<Meta> = None;
    let mut pb: Option<(i64, bool)> = None;

    for &line in &lines[index..] {
        if let Some(c) = AC_RE.captures(line) {
            last_meta = None;
            if let Some((ac, repaired)) = repair_number(&c[1]) {
                draft.ac = i32::try_from(ac).ok();
                draft.confidence.ac = match draft.ac {
                    Some(_) => grade(repaired || !(1..=40).contains(&ac)),
                    None => Confidence::Low,
                };
            }
            draft.ac_note = strip_parens(&c[2]);
        } else if let Some(c) = HP_RE.captures(line) {
            last_meta = None;
            if let Some((hp, repaired)) = repair_number(&c[1]) {
                draft.hp = i32::try_from(hp).ok();
                draft.confidence.hp = match draft.hp {
                    Some(_) => grade(repaired || hp <= 0),
                    None => Confidence::Low,
                };
            }
            draft.hp_formula = match PARENS_RE.captures(&c[2]) {
                Some(p) => p[1].trim().to_string(),
                None => c[2].trim().to_string(),
            };
        } else if let Some(c) = SPEED_RE.captures(line) {
            draft.speed = c[1].trim().to_string();
            draft.confidence.speed = grade(!SPEED_VALUE_RE.is_match(&draft.speed));
            last_meta = Some(Meta::Speed);
        } else if let Some(c) = CR_RE.captures(line) {
            last_meta = None;
            if let Some((cr, repaired)) = parse_cr_token(&c[1]) {
                draft.cr = cr;
                draft.confidence.cr = grade(repaired);
            }
            if let Some(x) = XP_RE.captures(&c[2]) {
                let token = x.get(1).or_else(|| x.get(2)).map(|m| m.as_str()).unwrap_or_default();
                if let Some((xp, repaired)) = repair_number(token) {
                    draft.xp = u32::try_from(xp).ok();
                    draft.confidence.xp = if draft.xp.is_some() { grade(repaired) } else { Confidence::Low };
                }
            }
            if let Some(p) = PB_RE.captures(&c[2]) {
                pb = repair_number(&p[1]);
            }
        } else if line.to_lowercase().starts_with("proficiency bonus") {
            last_meta = None;
            if let Some(p) = PB_RE.captures(line) {
                pb = repair_number(&p[1]);
            }
        } else if ABILITY_LINE_RE.is_match(line) {
            last_meta = None;
            ability_text.push_str(line);
            ability_text.push(' ');
        } else if let Some(c) = META_RE.captures(line) {
            let Some(meta) = Meta::from_label(&c[1]) else {
                continue;
            };
            *meta.field(draft) = c[2].trim().to_string();
            last_meta = Some(meta);
        } else if let Some(meta) = last_meta.filter(|m| continues(m.field(draft), line)) {
            let field = meta.field(draft);
            field.push(' ');
            field.push_str(line);
        } else {
            last_meta = None;
            traits.push(line);
        }
    }

    parse_abilities(draft, &ability_text);

    match pb.and_then(|(value, repaired)| Some((i32::try_from(value).ok()?, repaired))) {
        Some((value, repaired)) => {
            draft.proficiency_bonus = Some(value);
            draft.confidence.proficiency_bonus = grade(repaired);
        }
        None => {
            draft.proficiency_bonus = proficiency_bonus_for_cr(&draft.cr);
            if draft.proficiency_bonus.is_some() {
                draft.confidence.proficiency_bonus = Confidence::Medium;
            }
        }
    }

    traits
}

fn grade(repaired: bool) -> Confidence {
    if repaired { Confidence::Medium } else { Confidence::High }
}

/// A wrapped meta line: the value so far ends with a separator or the new line starts lowercase.
fn continues(value: &str, line: &str) -> bool {
    value.ends_with([',', ';']) || line.starts_with(|c: char| c.is_lowercase())
}

fn strip_parens(s: &str) -> String {
    let s = s.trim();
    s.strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(s)
        .trim()
        .to_string()
}

fn parse_cr_token(token: &str) -> Option<(String, bool)> {
    let token = token.trim_matches(|c: char| matches!(c, ',' | '.' | ';'));
    if let Some((n, d)) = token.split_once('/') {
        let (n, r1) = repair_number(n)?;
        let (d, r2) = repair_number(d)?;
        let cr = format!("{n}/{d}");
        matches!(cr.as_str(), "1/8" | "1/4" | "1/2").then_some((cr, r1 || r2))
    } else {
        let (value, repaired) = repair_number(token)?;
        (0..=30).contains(&value).then(|| (value.to_string(), repaired))
    }
}

fn parse_abilities(draft: &mut StatBlockDraft, text: &str) {
    let mut values: [Option<(i64, bool)>; 6] = [None; 6];

    if let Some(c) = ABILITY_HEADER_RE.captures(text) {
        for (slot, v) in values.iter_mut().zip(ABILITY_VALUE_RE.captures_iter(&c[1])) {
            *slot = repair_number(&v[1]);
        }
    } else {
        for c in ABILITY_INLINE_RE.captures_iter(text) {
            let label = c[1].to_uppercase();
            let Some(i) = Abilities::LABELS.iter().position(|l| *l == label) else {
                continue;
            };
            if values[i].is_none() {
                values[i] = repair_number(&c[2]);
            }
        }
    }

    let values = values.map(|v| v.filter(|(n, _)| (1..=30).contains(n)));
    let found = values.iter().flatten().count();
    if found == 0 {
        return;
    }

    let repaired = values.iter().flatten().any(|(_, r)| *r);
    draft.abilities = Some(Abilities::from_array(values.map(|v| v.and_then(|(n, _)| i32::try_from(n).ok()).unwrap_or(10))));
    draft.confidence.abilities = if found == 6 && !repaired { Confidence::High } else { Confidence::Medium };
}

fn looks_like_name(name: &str) -> bool {
    let words: Vec<&str> = name.split_whitespace().collect();
    !words.is_empty()
        && words.len() <= 8
        && words.iter().all(|w| {
            let w = w.trim_start_matches('(');
            w.starts_with(|c: char| c.is_uppercase() || c.is_ascii_digit()) || NAME_CONNECTORS.contains(&w)
        })
}

/// Split section lines into `Name. text` entries. Wrapped lines continue the
/// previous entry; anything before the first entry goes to the raw text.
fn attach_entries(draft: &mut StatBlockDraft, kind: SectionKind, lines: &[&str]) {
    let section = draft.section_mut(kind);
    for &line in lines {
        let open = section
            .entries
            .last()
            .is_some_and(|e| !e.desc.is_empty() && !e.desc.ends_with(['.', '!', '?', ':']));

        let start = if open {
            None
        } else {
            ENTRY_RE.captures(line).filter(|c| looks_like_name(&c[1]))
        };

        if let Some(c) = start {
            section.entries.push(Entry {
                name: c[1].trim().to_string(),
                desc: c.get(2).map(|m| m.as_str().trim().to_string()).unwrap_or_default(),
            });
        } else if let Some(entry) = section.entries.last_mut() {
            if !entry.desc.is_empty() {
                entry.desc.push(' ');
            }
            entry.desc.push_str(line);
        } else {
            if !section.raw.is_empty() {
                section.raw.push('\n');
            }
            section.raw.push_str(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOBLIN: &str = "GOBLIN
Small humanoid (goblinoid), neutral evil
Armor Class 15 (leather armor, shield)
Hit Points 7 (2d6)
Speed 30 ft.
STR DEX CON INT WIS CHA
8 (-1) 14 (+2) 10 (+0) 10 (+0) 8 (-1) 8 (-1)
Skills Stealth +6
Senses darkvision 60 ft.,
passive Perception 9
Languages Common, Goblin
Challenge 1/4 (50 XP)
Nimble Escape. The goblin can take the Disengage or Hide action as a bonus
action on each of its turns.
Actions
Scimitar. Melee Weapon Attack: +4 to hit, reach 5 ft., one target. Hit: 5
(1d6 + 2) slashing damage.
Shortbow. Ranged Weapon Attack: +4 to hit, range 80/320 ft., one target.
Hit: 5 (1d6 + 2) piercing damage.";

    #[test]
    fn clean_goblin() {
        let d = parse_stat_block(GOBLIN);

        assert_eq!(d.name, "GOBLIN");
        assert_eq!(d.size_type, "Small humanoid (goblinoid), neutral evil");
        assert_eq!(d.ac, Some(15));
        assert_eq!(d.ac_note, "leather armor, shield");
        assert_eq!(d.hp, Some(7));
        assert_eq!(d.hp_formula, "2d6");
        assert_eq!(d.speed, "30 ft.");
        assert_eq!(d.skills, "Stealth +6");
        assert_eq!(d.senses, "darkvision 60 ft., passive Perception 9");
        assert_eq!(d.languages, "Common, Goblin");
        assert_eq!(d.cr, "1/4");
        assert_eq!(d.xp, Some(50));
        assert_eq!(d.proficiency_bonus, Some(2));
        assert_eq!(d.abilities.map(|a| a.as_array()), Some([8, 14, 10, 10, 8, 8]));

        assert_eq!(d.confidence.ac, Confidence::High);
        assert_eq!(d.confidence.hp, Confidence::High);
        assert_eq!(d.confidence.speed, Confidence::High);
        assert_eq!(d.confidence.cr, Confidence::High);
        assert_eq!(d.confidence.abilities, Confidence::High);
        assert_eq!(d.confidence.proficiency_bonus, Confidence::Medium);

        let traits = d.entries(SectionKind::Traits);
        assert_eq!(traits.len(), 1);
        assert_eq!(traits[0].name, "Nimble Escape");
        assert!(traits[0].desc.ends_with("as a bonus action on each of its turns."));

        let actions = d.entries(SectionKind::Actions);
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].name, "Scimitar");
        assert!(actions[0].desc.ends_with("Hit: 5 (1d6 + 2) slashing damage."));
        assert_eq!(actions[1].name, "Shortbow");
        assert!(actions[1].desc.ends_with("one target. Hit: 5 (1d6 + 2) piercing damage."));
    }

    const CAPTAIN: &str = "Bandit Captain
Medium humanoid (any race), any non-lawful alignment
Armour Class l5 (studded leather)
Hit Paints 65 (10d8 + 20)
Speed 30 ft.
STR 15 (+2) DEX 16 (+3) CON l4 (+2)
INT 14 (+2) WIS 11 (+0) CHA 14 (+2)
Saving Throws Str +4, Dex +5, Wis +2
Challenge 2 (450 XP)
Actlons
Multiattack. The captain makes three melee attacks.
Reaction
The captain can take one reaction, choosing from the options listed here.
Parry. The captain adds 2 to its AC against one melee attack that would hit it.";

    #[test]
    fn misread_captain() {
        let d = parse_stat_block(CAPTAIN);

        assert_eq!(d.name, "Bandit Captain");
        assert_eq!(d.ac, Some(15));
        assert_eq!(d.confidence.ac, Confidence::Medium);
        assert_eq!(d.ac_note, "studded leather");
        assert_eq!(d.hp, Some(65));
        assert_eq!(d.hp_formula, "10d8 + 20");
        assert_eq!(d.confidence.hp, Confidence::High);
        assert_eq!(d.saves, "Str +4, Dex +5, Wis +2");
        assert_eq!(d.abilities.map(|a| a.as_array()), Some([15, 16, 14, 14, 11, 14]));
        assert_eq!(d.confidence.abilities, Confidence::Medium);
        assert_eq!(d.cr, "2");
        assert_eq!(d.xp, Some(450));

        assert_eq!(d.entries(SectionKind::Actions)[0].name, "Multiattack");
        let reactions = d.section(SectionKind::Reactions).unwrap();
        assert_eq!(reactions.entries.len(), 1);
        assert_eq!(reactions.entries[0].name, "Parry");
        assert!(reactions.raw.starts_with("The captain can take one reaction"));
    }

    #[test]
    fn compact_challenge_line() {
        let d = parse_stat_block("Wolf\nArmor Class 13\nCR 1/4 (XP 50; PB +2)\nBonus Actions\nDash. The wolf moves.");
        assert_eq!(d.cr, "1/4");
        assert_eq!(d.xp, Some(50));
        assert_eq!(d.proficiency_bonus, Some(2));
        assert_eq!(d.confidence.proficiency_bonus, Confidence::High);
        assert_eq!(d.entries(SectionKind::BonusActions)[0].name, "Dash");
    }

    #[test]
    fn missing_fields_are_low_confidence() {
        let d = parse_stat_block("Some creature\nIt is very scary.");
        assert_eq!(d.ac, None);
        assert_eq!(d.confidence.ac, Confidence::Low);
        assert_eq!(d.confidence.hp, Confidence::Low);
        assert_eq!(d.confidence.abilities, Confidence::Low);
        assert_eq!(d.proficiency_bonus, None);
        assert_eq!(d.section(SectionKind::Traits).unwrap().raw, "It is very scary.");
    }

    #[test]
    fn empty_text_gives_empty_draft() {
        let d = parse_stat_block("");
        assert_eq!(d, StatBlockDraft::default());
    }

    #[test]
    fn unreadable_numbers_stay_empty() {
        let d = parse_stat_block("Ghost\nArmor Class ??\nChallenge lO (5,9OO XP)");
        assert_eq!(d.ac, None);
        assert_eq!(d.confidence.ac, Confidence::Low);
        assert_eq!(d.cr, "10");
        assert_eq!(d.confidence.cr, Confidence::Medium);
        assert_eq!(d.xp, Some(5900));
        assert_eq!(d.proficiency_bonus, Some(4));
    }

    #[test]
    fn out_of_range_numbers_are_dropped() {
        let d = parse_stat_block(
            "Colossus\nArmor Class 99999999999\nHit Points 4294967296 (9d9)\nChallenge 2 (99999999999 XP)\nProficiency Bonus +99999999999",
        );
        assert_eq!(d.ac, None);
        assert_eq!(d.confidence.ac, Confidence::Low);
        assert_eq!(d.hp, None);
        assert_eq!(d.confidence.hp, Confidence::Low);
        assert_eq!(d.hp_formula, "9d9");
        assert_eq!(d.cr, "2");
        assert_eq!(d.xp, None);
        assert_eq!(d.confidence.xp, Confidence::Low);
        assert_eq!(d.proficiency_bonus, Some(2));
        assert_eq!(d.confidence.proficiency_bonus, Confidence::Medium);
    }

    #[test]
    fn sentence_lines_are_not_entry_names() {
        assert!(looks_like_name("Legendary Resistance (3/Day)"));
        assert!(looks_like_name("Wing Attack (Costs 2 Actions)"));
        assert!(looks_like_name("Breath of the Dragon"));
        assert!(!looks_like_name("The goblin hides"));
    }
}
