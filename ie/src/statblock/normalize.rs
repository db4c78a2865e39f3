//! Text cleanup ahead of parsing.

use super::SectionKind;

/// Field labels that start a line of a stat block.
pub(super) const FIELD_LABELS: &[&str] = &[
    "Armor Class",
    "Hit Points",
    "Speed",
    "Saving Throws",
    "Skills",
    "Damage Resistances",
    "Damage Immunities",
    "Damage Vulnerabilities",
    "Condition Immunities",
    "Senses",
    "Languages",
    "Challenge",
    "Proficiency Bonus",
];

/// Misreads seen often enough to fix outright.
const KNOWN_TYPOS: &[(&str, &str)] = &[
    ("Armour Class", "Armor Class"),
    ("Armor C1ass", "Armor Class"),
    ("Arrnor Class", "Armor Class"),
    ("Hit Paints", "Hit Points"),
    ("Hit Polnts", "Hit Points"),
    ("Hlt Points", "Hit Points"),
    ("Spced", "Speed"),
    ("Saving Thraws", "Saving Throws"),
    ("Langauges", "Languages"),
    ("Challange", "Challenge"),
    ("Chal1enge", "Challenge"),
    ("Proficiency Bonns", "Proficiency Bonus"),
    ("Actlons", "Actions"),
    ("Reactlons", "Reactions"),
];

/// Unify line endings, collapse whitespace, drop blank lines and fix
/// misread field labels and section headers.
pub fn normalize_text(raw: &str) -> String {
    raw.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(|line| {
            let line = line
                .replace(['\u{2018}', '\u{2019}'], "'")
                .replace(['\u{201c}', '\u{201d}'], "\"")
                .replace('\u{2212}', "-");
            line.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .filter(|line| !line.is_empty())
        .map(|line| fix_label_typos(&line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn max_distance(label: &str) -> usize {
    if label.len() >= 8 { 2 } else { 1 }
}

/// Fix a misread field label at the start of `line`, or a misread header
/// making up the whole line.
pub fn fix_label_typos(line: &str) -> String {
    for (typo, fixed) in KNOWN_TYPOS {
        if let Some(rest) = strip_prefix_ignore_case(line, typo) {
            if rest.is_empty() || !rest.starts_with(char::is_alphanumeric) {
                return format!("{fixed}{rest}");
            }
        }
    }

    let bare = line.trim_end_matches(':');
    if SectionKind::from_header(bare).is_none() && bare.len() >= 7 {
        for kind in SectionKind::ALL {
            let label = kind.label();
            if kind != SectionKind::Traits && levenshtein::levenshtein(&bare.to_lowercase(), &label.to_lowercase()) <= 1 {
                return label.to_string();
            }
        }
    }

    for label in FIELD_LABELS {
        let Some(prefix) = line.get(..label.len()) else {
            continue;
        };
        let rest = &line[label.len()..];
        if !(rest.is_empty() || rest.starts_with(' ')) || prefix.eq_ignore_ascii_case(label) {
            continue;
        }
        if levenshtein::levenshtein(&prefix.to_lowercase(), &label.to_lowercase()) <= max_distance(label) {
            return format!("{label}{rest}");
        }
    }

    line.to_string()
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &line[prefix.len()..])
}

/// Parse a number, repairing common OCR digit confusions
/// (`l`, `I`, `|`, `i` read for `1` and `O`, `o` read for `0`).
///
/// Returns the value and whether any repair was needed.
pub fn repair_number(token: &str) -> Option<(i64, bool)> {
    let token = token.trim_matches(|c: char| matches!(c, ',' | '.' | ';' | ':'));
    let negative = token.starts_with(['-', '\u{2013}']);
    let body = token.trim_start_matches(['+', '-', '\u{2013}']);
    if body.is_empty() {
        return None;
    }

    let mut repaired = false;
    let mut digits = String::with_capacity(body.len());
    for ch in body.chars() {
        match ch {
            '0'..='9' => digits.push(ch),
            ',' => {}
            'l' | 'I' | '|' | 'i' => {
                digits.push('1');
                repaired = true;
            }
            'O' | 'o' => {
                digits.push('0');
                repaired = true;
            }
            _ => return None,
        }
    }
    if digits.is_empty() {
        return None;
    }
    let value: i64 = digits.parse().ok()?;
    Some((if negative { -value } else { value }, repaired))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_and_line_endings() {
        let raw = "Goblin\r\n\r\n  Armor   Class 15\rHit Points\t7 (2d6)\n\n";
        assert_eq!(normalize_text(raw), "Goblin\nArmor Class 15\nHit Points 7 (2d6)");
    }

    #[test]
    fn known_typos() {
        assert_eq!(fix_label_typos("Armour Class 12"), "Armor Class 12");
        assert_eq!(fix_label_typos("Hit Paints 7 (2d6)"), "Hit Points 7 (2d6)");
        assert_eq!(fix_label_typos("Actlons"), "Actions");
    }

    #[test]
    fn fuzzy_label_prefixes() {
        assert_eq!(fix_label_typos("Sanses darkvision 60 ft."), "Senses darkvision 60 ft.");
        assert_eq!(fix_label_typos("Languaqes Common, Goblin"), "Languages Common, Goblin");
        assert_eq!(fix_label_typos("Condltion lmmunities poisoned"), "Condition Immunities poisoned");
        assert_eq!(fix_label_typos("Legendory Actions"), "Legendary Actions");
    }

    #[test]
    fn ordinary_lines_are_left_alone() {
        for line in [
            "Spells. The goblin knows no spells.",
            "Scimitar. Melee Weapon Attack: +4 to hit",
            "Senses darkvision 60 ft.",
            "Speedy. The creature moves fast.",
        ] {
            assert_eq!(fix_label_typos(line), line);
        }
    }

    #[test]
    fn dropped_header_letters_are_restored() {
        assert_eq!(fix_label_typos("Reaction"), "Reactions");
        assert_eq!(fix_label_typos("Bonus Action:"), "Bonus Actions");
    }

    #[test]
    fn digit_repair() {
        assert_eq!(repair_number("15"), Some((15, false)));
        assert_eq!(repair_number("l5"), Some((15, true)));
        assert_eq!(repair_number("2O"), Some((20, true)));
        assert_eq!(repair_number("1,100"), Some((1100, false)));
        assert_eq!(repair_number("+3"), Some((3, false)));
        assert_eq!(repair_number("-1"), Some((-1, false)));
        assert_eq!(repair_number("15,"), Some((15, false)));
        assert_eq!(repair_number("one"), None);
        assert_eq!(repair_number(""), None);
    }
}
