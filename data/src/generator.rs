//! Random text generators and their persisted collection.
//!
//! A generator is one of three kinds: a flat list of strings, a bilingual
//! lexicon, or a pattern/token template that draws from other generators.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::token;

pub const MAX_GENERATE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Generator {
	pub id: String,
	#[serde(default)]
	pub folder: String,
	pub name: String,
	#[serde(flatten)]
	pub kind: GeneratorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "items", rename_all = "lowercase")]
pub enum GeneratorKind {
	List(Vec<String>),
	Lexicon(Vec<LexiconEntry>),
	Advanced(Template),
}

impl GeneratorKind {
	pub fn label(&self) -> &'static str {
		match self {
			Self::List(_) => "list",
			Self::Lexicon(_) => "lexicon",
			Self::Advanced(_) => "advanced",
		}
	}

	/// Number of entries (list items, lexicon pairs or patterns).
	pub fn len(&self) -> usize {
		match self {
			Self::List(items) => items.len(),
			Self::Lexicon(entries) => entries.len(),
			Self::Advanced(template) => template.patterns.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
	pub english: String,
	pub valathi: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
	#[serde(default)]
	pub patterns: Vec<String>,
	/// Token -> source generator id.
	#[serde(default)]
	pub token_map: BTreeMap<String, String>,
	/// Token -> candidate source generator ids (advanced mode).
	#[serde(default)]
	pub multi_token_map: BTreeMap<String, Vec<String>>,
	#[serde(default)]
	pub advanced_mode: bool,
}

impl Generator {
	pub fn new(name: impl Into<String>, folder: impl Into<String>, kind: GeneratorKind) -> Self {
		Self {
			id: uuid::Uuid::new_v4().to_string(),
			folder: folder.into(),
			name: name.into(),
			kind,
		}
	}

	/// Strings this generator can contribute when used as a token source.
	///
	/// Templates contribute nothing: token resolution never recurses.
	pub fn source_items(&self) -> Vec<&str> {
		match &self.kind {
			GeneratorKind::List(items) => items.iter().map(String::as_str).collect(),
			GeneratorKind::Lexicon(entries) => entries.iter().map(|e| e.valathi.as_str()).collect(),
			GeneratorKind::Advanced(_) => Vec::new(),
		}
	}
}

// ----------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedItems<T> {
	pub items: Vec<T>,
	/// Non-empty lines dropped as case-insensitive duplicates.
	pub duplicates: usize,
	/// Non-empty lines that could not be parsed at all.
	pub rejected: usize,
}

/// One item per non-empty line, trimmed, deduplicated ignoring case.
pub fn parse_generator_items(text: &str) -> ParsedItems<String> {
	let mut seen = HashSet::new();
	let mut out = ParsedItems::default();
	for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
		if seen.insert(line.to_lowercase()) {
			out.items.push(line.to_string());
		} else {
			out.duplicates += 1;
		}
	}
	out
}

/// `english = valathi` pairs, one per line. Tab and `;` also separate.
pub fn parse_lexicon_items(text: &str) -> ParsedItems<LexiconEntry> {
	let mut seen = HashSet::new();
	let mut out = ParsedItems::default();
	for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
		let Some((english, valathi)) = line.split_once(['=', '\t', ';']) else {
			out.rejected += 1;
			continue;
		};
		let (english, valathi) = (english.trim(), valathi.trim());
		if english.is_empty() || valathi.is_empty() {
			out.rejected += 1;
			continue;
		}
		if seen.insert(english.to_lowercase()) {
			out.items.push(LexiconEntry {
				english: english.to_string(),
				valathi: valathi.to_string(),
			});
		} else {
			out.duplicates += 1;
		}
	}
	out
}

pub fn parse_patterns(text: &str) -> Vec<String> {
	text.lines()
		.map(str::trim)
		.filter(|l| !l.is_empty())
		.map(str::to_string)
		.collect()
}

/// Render items back into the line-based editing format.
pub fn items_to_text(kind: &GeneratorKind) -> String {
	match kind {
		GeneratorKind::List(items) => items.join("\n"),
		GeneratorKind::Lexicon(entries) => entries
			.iter()
			.map(|e| format!("{} = {}", e.english, e.valathi))
			.collect::<Vec<_>>()
			.join("\n"),
		GeneratorKind::Advanced(template) => template.patterns.join("\n"),
	}
}

/// Produce `count` results (clamped to `1..=MAX_GENERATE`).
pub fn generate(generator: &Generator, all: &[Generator], count: usize, rng: &mut impl Rng) -> Vec<String> {
	let count = count.clamp(1, MAX_GENERATE);
	match &generator.kind {
		GeneratorKind::List(items) => (0..count)
			.filter_map(|_| items.choose(rng).cloned())
			.collect(),
		GeneratorKind::Lexicon(entries) => (0..count)
			.filter_map(|_| entries.choose(rng))
			.map(|e| format!("{} ({})", e.valathi, e.english))
			.collect(),
		GeneratorKind::Advanced(template) => (0..count)
			.map(|_| token::resolve(template, all, rng))
			.collect(),
	}
}

// ----------

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
	#[error("not a valid JSON export: {0}")]
	Json(#[from] serde_json::Error),
	#[error("no valid entries found")]
	NoValidEntries,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
	Replace,
	Merge,
}

/// Folder collapse state, persisted separately from the generators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderState {
	#[serde(default)]
	pub collapsed: BTreeSet<String>,
}

impl FolderState {
	pub fn is_collapsed(&self, folder: &str) -> bool {
		self.collapsed.contains(folder)
	}

	pub fn toggle(&mut self, folder: &str) {
		if !self.collapsed.remove(folder) {
			self.collapsed.insert(folder.to_string());
		}
	}
}

/// The persisted generator collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratorStore {
	generators: Vec<Generator>,
}

impl GeneratorStore {
	pub fn from_vec(generators: Vec<Generator>) -> Self {
		Self { generators }
	}

	pub fn all(&self) -> &[Generator] {
		&self.generators
	}

	pub fn get(&self, id: &str) -> Option<&Generator> {
		self.generators.iter().find(|g| g.id == id)
	}

	fn get_mut(&mut self, id: &str) -> Option<&mut Generator> {
		self.generators.iter_mut().find(|g| g.id == id)
	}

	/// Add a generator and return its id.
	pub fn create(&mut self, name: impl Into<String>, folder: impl Into<String>, kind: GeneratorKind) -> String {
		let generator = Generator::new(name, folder, kind);
		let id = generator.id.clone();
		self.generators.push(generator);
		id
	}

	pub fn rename(&mut self, id: &str, name: impl Into<String>) -> bool {
		self.get_mut(id).map(|g| g.name = name.into()).is_some()
	}

	pub fn move_to_folder(&mut self, id: &str, folder: impl Into<String>) -> bool {
		self.get_mut(id).map(|g| g.folder = folder.into()).is_some()
	}

	pub fn set_kind(&mut self, id: &str, kind: GeneratorKind) -> bool {
		self.get_mut(id).map(|g| g.kind = kind).is_some()
	}

	pub fn delete(&mut self, id: &str) -> Option<Generator> {
		let index = self.generators.iter().position(|g| g.id == id)?;
		Some(self.generators.remove(index))
	}

	/// Sorted unique folder names (the empty folder is "unfiled").
	pub fn folders(&self) -> Vec<String> {
		self.generators
			.iter()
			.map(|g| g.folder.clone())
			.collect::<BTreeSet<_>>()
			.into_iter()
			.collect()
	}

	pub fn in_folder<'a>(&'a self, folder: &'a str) -> impl Iterator<Item = &'a Generator> + 'a {
		self.generators.iter().filter(move |g| g.folder == folder)
	}

	pub fn export_json(&self) -> serde_json::Result<String> {
		serde_json::to_string_pretty(&self.generators)
	}

	/// Import a JSON export. Entries that fail to decode are skipped.
	///
	/// Returns the number of generators added.
	pub fn import_json(&mut self, json: &str, mode: ImportMode) -> Result<usize, ImportError> {
		let raw: Vec<serde_json::Value> = serde_json::from_str(json)?;
		let valid = raw
			.into_iter()
			.filter_map(|value| match serde_json::from_value::<Generator>(value) {
				Ok(g) if !g.id.is_empty() && !g.name.trim().is_empty() => Some(g),
				Ok(_) => None,
				Err(err) => {
					tracing::debug!(error = %err, "skipping invalid generator entry");
					None
				}
			})
			.collect::<Vec<_>>();

		if valid.is_empty() {
			return Err(ImportError::NoValidEntries);
		}

		match mode {
			ImportMode::Replace => {
				let count = valid.len();
				self.generators = valid;
				Ok(count)
			}
			ImportMode::Merge => {
				let mut added = 0;
				for g in valid {
					if self.get(&g.id).is_none() {
						self.generators.push(g);
						added += 1;
					}
				}
				Ok(added)
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use rand::{SeedableRng, rngs::StdRng};

	use super::*;

	#[test]
	fn list_items_are_deduplicated_ignoring_case() {
		let parsed = parse_generator_items("Aria\n  aria \n\nBran\nARIA\nCael\n   \nbran");

		assert_eq!(parsed.items, vec!["Aria", "Bran", "Cael"]);
		assert_eq!(parsed.duplicates, 3);
	}

	#[test]
	fn duplicate_count_matches_dropped_lines() {
		let text = "a\nb\nA\nc\nB\nb\nd";
		let non_empty = text.lines().filter(|l| !l.trim().is_empty()).count();
		let parsed = parse_generator_items(text);

		assert_eq!(parsed.duplicates, non_empty - parsed.items.len());
		let lowered = parsed.items.iter().map(|i| i.to_lowercase()).collect::<HashSet<_>>();
		assert_eq!(lowered.len(), parsed.items.len());
	}

	#[test]
	fn lexicon_lines_split_on_separators() {
		let parsed = parse_lexicon_items("fire = ithra\nwater\tsel\nFire = other\nstone;korr\nbroken line");

		assert_eq!(parsed.items.len(), 3);
		assert_eq!(parsed.items[1], LexiconEntry { english: "water".into(), valathi: "sel".into() });
		assert_eq!(parsed.duplicates, 1);
		assert_eq!(parsed.rejected, 1);
	}

	#[test]
	fn serialises_with_type_and_items() {
		let g = Generator {
			id: "g1".into(),
			folder: "Names".into(),
			name: "Elves".into(),
			kind: GeneratorKind::List(vec!["Aelar".into()]),
		};
		let value = serde_json::to_value(&g).unwrap();

		assert_eq!(value["type"], "list");
		assert_eq!(value["items"][0], "Aelar");
		assert_eq!(serde_json::from_value::<Generator>(value).unwrap(), g);
	}

	#[test]
	fn export_then_import_reproduces_the_list() {
		let mut store = GeneratorStore::default();
		store.create("Elves", "Names", GeneratorKind::List(vec!["Aelar".into(), "Bryn".into()]));
		store.create(
			"Words",
			"Lexicons",
			GeneratorKind::Lexicon(vec![LexiconEntry { english: "sun".into(), valathi: "sol".into() }]),
		);
		store.create(
			"Towns",
			"",
			GeneratorKind::Advanced(Template {
				patterns: vec!["{A}ford".into()],
				token_map: BTreeMap::from([("A".into(), "x".into())]),
				..Default::default()
			}),
		);

		let json = store.export_json().unwrap();
		let mut imported = GeneratorStore::default();
		let count = imported.import_json(&json, ImportMode::Replace).unwrap();

		assert_eq!(count, 3);
		assert_eq!(imported, store);
	}

	#[test]
	fn import_rejects_exports_without_valid_entries() {
		let mut store = GeneratorStore::default();

		assert!(matches!(store.import_json("[]", ImportMode::Replace), Err(ImportError::NoValidEntries)));
		assert!(matches!(
			store.import_json(r#"[{"id":"x","type":"bogus"}]"#, ImportMode::Replace),
			Err(ImportError::NoValidEntries)
		));
		assert!(matches!(store.import_json("nope", ImportMode::Merge), Err(ImportError::Json(_))));
	}

	#[test]
	fn merge_skips_known_ids() {
		let mut store = GeneratorStore::default();
		let id = store.create("Elves", "", GeneratorKind::List(vec!["a".into()]));
		let json = store.export_json().unwrap();

		assert_eq!(store.import_json(&json, ImportMode::Merge).unwrap(), 0);
		assert_eq!(store.all().len(), 1);
		assert!(store.get(&id).is_some());
	}

	#[test]
	fn crud_and_folders() {
		let mut store = GeneratorStore::default();
		let a = store.create("A", "Names", GeneratorKind::List(vec![]));
		let b = store.create("B", "Places", GeneratorKind::List(vec![]));

		assert!(store.rename(&a, "Alpha"));
		assert!(store.move_to_folder(&b, "Names"));
		assert_eq!(store.folders(), vec!["Names".to_string()]);
		assert_eq!(store.in_folder("Names").count(), 2);
		assert_eq!(store.delete(&a).map(|g| g.name), Some("Alpha".to_string()));
		assert!(!store.rename(&a, "again"));
	}

	#[test]
	fn generate_clamps_count_and_draws_from_items() {
		let mut rng = StdRng::seed_from_u64(7);
		let g = Generator::new("x", "", GeneratorKind::List(vec!["one".into(), "two".into()]));

		let out = generate(&g, &[], 500, &mut rng);
		assert_eq!(out.len(), MAX_GENERATE);
		assert!(out.iter().all(|s| s == "one" || s == "two"));
		assert_eq!(generate(&g, &[], 0, &mut rng).len(), 1);
	}

	#[test]
	fn folder_state_toggles() {
		let mut state = FolderState::default();
		state.toggle("Names");
		assert!(state.is_collapsed("Names"));
		state.toggle("Names");
		assert!(!state.is_collapsed("Names"));
	}
}
