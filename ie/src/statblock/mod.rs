//! Stat-block drafts recovered from OCR text.
//!
//! Parsing is a best-effort heuristic. Every draft is meant to be reviewed
//! and edited by hand before it is used.

mod normalize;
mod parse;

pub use normalize::{fix_label_typos, normalize_text, repair_number};
pub use parse::parse_stat_block;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Not found.
    #[default]
    Low,
    /// Found after digit repair, or only partially.
    Medium,
    /// Clean match.
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldConfidence {
    pub ac: Confidence,
    pub hp: Confidence,
    pub speed: Confidence,
    pub cr: Confidence,
    pub xp: Confidence,
    pub proficiency_bonus: Confidence,
    pub abilities: Confidence,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abilities {
    pub str: i32,
    pub dex: i32,
    pub con: i32,
    pub int: i32,
    pub wis: i32,
    pub cha: i32,
}

impl Abilities {
    pub const LABELS: [&'static str; 6] = ["STR", "DEX", "CON", "INT", "WIS", "CHA"];

    pub fn from_array([str, dex, con, int, wis, cha]: [i32; 6]) -> Self {
        Self { str, dex, con, int, wis, cha }
    }

    pub fn as_array(&self) -> [i32; 6] {
        [self.str, self.dex, self.con, self.int, self.wis, self.cha]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub desc: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    Traits,
    Actions,
    BonusActions,
    Reactions,
    LegendaryActions,
    LairActions,
    MythicActions,
}

impl SectionKind {
    pub const ALL: [SectionKind; 7] = [
        SectionKind::Traits,
        SectionKind::Actions,
        SectionKind::BonusActions,
        SectionKind::Reactions,
        SectionKind::LegendaryActions,
        SectionKind::LairActions,
        SectionKind::MythicActions,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SectionKind::Traits => "Traits",
            SectionKind::Actions => "Actions",
            SectionKind::BonusActions => "Bonus Actions",
            SectionKind::Reactions => "Reactions",
            SectionKind::LegendaryActions => "Legendary Actions",
            SectionKind::LairActions => "Lair Actions",
            SectionKind::MythicActions => "Mythic Actions",
        }
    }

    /// Section started by a header line such as `"Legendary Actions"`.
    /// Traits have no header of their own.
    pub fn from_header(line: &str) -> Option<Self> {
        let line = line.trim().trim_end_matches(':').trim();
        Self::ALL
            .into_iter()
            .filter(|k| *k != SectionKind::Traits)
            .find(|k| k.label().eq_ignore_ascii_case(line))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub entries: Vec<Entry>,
    /// Lines that could not be attached to an entry.
    #[serde(default)]
    pub raw: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatBlockDraft {
    pub name: String,
    pub size_type: String,
    pub ac: Option<i32>,
    pub ac_note: String,
    pub hp: Option<i32>,
    pub hp_formula: String,
    pub speed: String,
    pub cr: String,
    pub xp: Option<u32>,
    pub proficiency_bonus: Option<i32>,
    pub abilities: Option<Abilities>,
    pub saves: String,
    pub skills: String,
    pub damage_resistances: String,
    pub damage_immunities: String,
    pub damage_vulnerabilities: String,
    pub condition_immunities: String,
    pub senses: String,
    pub languages: String,
    pub sections: Vec<Section>,
    pub confidence: FieldConfidence,
    /// Normalised OCR text the draft was built from.
    pub text: String,
}

impl StatBlockDraft {
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    pub fn entries(&self, kind: SectionKind) -> &[Entry] {
        self.section(kind).map(|s| s.entries.as_slice()).unwrap_or_default()
    }

    pub fn section_mut(&mut self, kind: SectionKind) -> &mut Section {
        let index = match self.sections.iter().position(|s| s.kind == kind) {
            Some(i) => i,
            None => {
                self.sections.push(Section { kind, entries: Vec::new(), raw: String::new() });
                self.sections.len() - 1
            }
        };
        &mut self.sections[index]
    }

    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() { "(unnamed)" } else { self.name.trim() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers() {
        assert_eq!(SectionKind::from_header("Legendary Actions"), Some(SectionKind::LegendaryActions));
        assert_eq!(SectionKind::from_header("  actions: "), Some(SectionKind::Actions));
        assert_eq!(SectionKind::from_header("Traits"), None);
        assert_eq!(SectionKind::from_header("Actions are free"), None);
    }

    #[test]
    fn draft_survives_storage() {
        let mut draft = StatBlockDraft { name: "Goblin".into(), ac: Some(15), ..Default::default() };
        draft.section_mut(SectionKind::Actions).entries.push(Entry { name: "Scimitar".into(), desc: "Slash.".into() });
        draft.confidence.ac = Confidence::High;

        let json = serde_json::to_string(&draft).unwrap();
        assert!(json.contains("\"confidence\":{\"ac\":\"high\""));
        let back: StatBlockDraft = serde_json::from_str(&json).unwrap();
        assert_eq!(back, draft);
        assert_eq!(back.entries(SectionKind::Actions).len(), 1);
        assert!(back.entries(SectionKind::Reactions).is_empty());
    }
}
