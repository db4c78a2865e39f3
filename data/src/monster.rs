//! Monster vault: bundled SRD seed data merged with user homebrew.

use std::collections::{BTreeMap, HashSet};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::schema::monster as remote;

pub const SRD_SOURCE: &str = "SRD 5.1";
pub const HOMEBREW_SOURCE: &str = "Homebrew";
const HOMEBREW_PREFIX: &str = "hb-";

static SRD_JSON: &str = include_str!("../srd/monsters.json");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilityScores {
	pub str: i32,
	pub dex: i32,
	pub con: i32,
	pub int: i32,
	pub wis: i32,
	pub cha: i32,
}

impl AbilityScores {
	pub fn modifier(score: i32) -> i32 {
		(score - 10).div_euclid(2)
	}

	pub fn as_array(&self) -> [(&'static str, i32); 6] {
		[
			("STR", self.str),
			("DEX", self.dex),
			("CON", self.con),
			("INT", self.int),
			("WIS", self.wis),
			("CHA", self.cha),
		]
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
	pub name: String,
	pub desc: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonsterDetails {
	pub ability_scores: Option<AbilityScores>,
	pub saves: String,
	pub skills: String,
	pub senses: String,
	pub languages: String,
	pub traits: Vec<Entry>,
	pub actions: Vec<Entry>,
	pub reactions: Vec<Entry>,
	pub legendary_actions: Vec<Entry>,
	/// Set once a remote lookup succeeded, even if it returned no entries.
	pub hydrated: bool,
}

impl MonsterDetails {
	fn entries(&self) -> impl Iterator<Item = &Entry> {
		self.traits
			.iter()
			.chain(&self.actions)
			.chain(&self.reactions)
			.chain(&self.legendary_actions)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monster {
	#[serde(default)]
	pub id: String,
	pub name: String,
	/// e.g. "Medium humanoid (goblinoid), neutral evil".
	#[serde(default)]
	pub size_type: String,
	/// Challenge rating as written ("1/4", "5").
	#[serde(default)]
	pub cr: String,
	#[serde(default)]
	pub xp: u32,
	#[serde(default)]
	pub ac: i32,
	#[serde(default)]
	pub hp: i32,
	#[serde(default)]
	pub speed: String,
	#[serde(default)]
	pub initiative: i32,
	#[serde(default, rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub source: String,
	#[serde(default)]
	pub is_homebrew: bool,
	#[serde(default)]
	pub details: MonsterDetails,
}

impl Monster {
	/// SRD entries ship without action text; it is fetched on first expansion.
	pub fn needs_hydration(&self) -> bool {
		!self.is_homebrew && !self.details.hydrated
	}

	fn haystack(&self) -> String {
		let parts: [&str; 5] = [&self.name, &self.size_type, &self.cr, &self.source, &self.kind];
		let mut out = parts.join(" ");
		for e in self.details.entries() {
			out.push(' ');
			out.push_str(&e.name);
			out.push(' ');
			out.push_str(&e.desc);
		}
		out.to_lowercase()
	}
}

// ----------

/// Parse a challenge rating such as `"1/2"`, `"0.25"` or `"7"`.
pub fn parse_cr(cr: &str) -> Option<f32> {
	let cr = cr.trim();
	if let Some((n, d)) = cr.split_once('/') {
		let n = n.trim().parse::<f32>().ok()?;
		let d = d.trim().parse::<f32>().ok()?;
		return (d != 0.0).then(|| n / d);
	}
	cr.parse::<f32>().ok()
}

const XP_BY_CR: [(f32, u32); 34] = [
	(0.0, 10),
	(0.125, 25),
	(0.25, 50),
	(0.5, 100),
	(1.0, 200),
	(2.0, 450),
	(3.0, 700),
	(4.0, 1100),
	(5.0, 1800),
	(6.0, 2300),
	(7.0, 2900),
	(8.0, 3900),
	(9.0, 5000),
	(10.0, 5900),
	(11.0, 7200),
	(12.0, 8400),
	(13.0, 10000),
	(14.0, 11500),
	(15.0, 13000),
	(16.0, 15000),
	(17.0, 18000),
	(18.0, 20000),
	(19.0, 22000),
	(20.0, 25000),
	(21.0, 33000),
	(22.0, 41000),
	(23.0, 50000),
	(24.0, 62000),
	(25.0, 75000),
	(26.0, 90000),
	(27.0, 105000),
	(28.0, 120000),
	(29.0, 135000),
	(30.0, 155000),
];

pub fn cr_to_xp(cr: &str) -> Option<u32> {
	let value = parse_cr(cr)?;
	XP_BY_CR
		.iter()
		.find(|(c, _)| (c - value).abs() < f32::EPSILON)
		.map(|(_, xp)| *xp)
}

pub fn proficiency_bonus_for_cr(cr: &str) -> Option<i32> {
	let value = parse_cr(cr)?;
	if value < 0.0 {
		return None;
	}
	Some(2 + ((value.max(1.0) - 1.0) / 4.0).floor() as i32)
}

// ----------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SourceFacet {
	#[default]
	All,
	Srd,
	Homebrew,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
	pub search: String,
	pub source: SourceFacet,
	/// Exact challenge rating match; empty means any.
	pub cr: String,
}

/// Persisted vault state: homebrew entries plus cached SRD detail lookups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultState {
	pub homebrew: Vec<Monster>,
	pub detail_cache: BTreeMap<String, MonsterDetails>,
}

impl<'de> Deserialize<'de> for VaultState {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(rename_all = "camelCase")]
		struct Fields {
			#[serde(default)]
			homebrew: Vec<Monster>,
			#[serde(default)]
			detail_cache: BTreeMap<String, MonsterDetails>,
		}

		// The first release stored the homebrew list on its own.
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Shape {
			Current(Fields),
			Legacy(Vec<Monster>),
		}

		Ok(match Shape::deserialize(deserializer)? {
			Shape::Current(f) => VaultState { homebrew: f.homebrew, detail_cache: f.detail_cache },
			Shape::Legacy(homebrew) => VaultState { homebrew, detail_cache: BTreeMap::new() },
		})
	}
}

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
	#[error("SRD monsters are read-only")]
	ReadOnly,
	#[error("no monster with id {0}")]
	NotFound(String),
}

pub struct Vault {
	srd: Vec<Monster>,
	pub state: VaultState,
}

impl Vault {
	/// Build the vault from bundled SRD data and persisted state.
	pub fn new(state: VaultState) -> Result<Self> {
		Ok(Self::with_srd(load_srd()?, state))
	}

	pub fn with_srd(mut srd: Vec<Monster>, state: VaultState) -> Self {
		for m in &mut srd {
			m.is_homebrew = false;
			if m.source.is_empty() {
				m.source = SRD_SOURCE.to_string();
			}
			if let Some(details) = state.detail_cache.get(&m.id) {
				m.details = MonsterDetails { hydrated: true, ..details.clone() };
			}
		}
		Self { srd, state }
	}

	pub fn srd(&self) -> &[Monster] {
		&self.srd
	}

	pub fn homebrew(&self) -> &[Monster] {
		&self.state.homebrew
	}

	pub fn all(&self) -> impl Iterator<Item = &Monster> {
		self.srd.iter().chain(&self.state.homebrew)
	}

	pub fn get(&self, id: &str) -> Option<&Monster> {
		self.all().find(|m| m.id == id)
	}

	/// Distinct challenge ratings, ordered numerically.
	pub fn crs(&self) -> Vec<String> {
		let mut crs = self
			.all()
			.map(|m| m.cr.clone())
			.filter(|c| !c.is_empty())
			.collect::<HashSet<_>>()
			.into_iter()
			.collect::<Vec<_>>();
		crs.sort_by(|a, b| {
			parse_cr(a)
				.unwrap_or(f32::MAX)
				.total_cmp(&parse_cr(b).unwrap_or(f32::MAX))
		});
		crs
	}

	pub fn filter(&self, filter: &Filter) -> Vec<&Monster> {
		let needle = filter.search.trim().to_lowercase();
		let cr = filter.cr.trim();
		let mut out = self
			.all()
			.filter(|m| match filter.source {
				SourceFacet::All => true,
				SourceFacet::Srd => !m.is_homebrew,
				SourceFacet::Homebrew => m.is_homebrew,
			})
			.filter(|m| cr.is_empty() || m.cr == cr)
			.filter(|m| needle.is_empty() || m.haystack().contains(&needle))
			.collect::<Vec<_>>();
		out.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
		out
	}

	/// Add a homebrew monster, returning its id.
	pub fn add_homebrew(&mut self, mut monster: Monster) -> String {
		monster.id = format!("{HOMEBREW_PREFIX}{}", uuid::Uuid::new_v4());
		monster.is_homebrew = true;
		monster.source = HOMEBREW_SOURCE.to_string();
		if monster.xp == 0 {
			monster.xp = cr_to_xp(&monster.cr).unwrap_or(0);
		}
		let id = monster.id.clone();
		self.state.homebrew.push(monster);
		id
	}

	pub fn update_homebrew(&mut self, monster: Monster) -> Result<(), VaultError> {
		if self.srd.iter().any(|m| m.id == monster.id) {
			return Err(VaultError::ReadOnly);
		}
		let slot = self
			.state
			.homebrew
			.iter_mut()
			.find(|m| m.id == monster.id)
			.ok_or_else(|| VaultError::NotFound(monster.id.clone()))?;
		*slot = Monster { is_homebrew: true, ..monster };
		Ok(())
	}

	pub fn delete_homebrew(&mut self, id: &str) -> Result<Monster, VaultError> {
		if self.srd.iter().any(|m| m.id == id) {
			return Err(VaultError::ReadOnly);
		}
		let index = self
			.state
			.homebrew
			.iter()
			.position(|m| m.id == id)
			.ok_or_else(|| VaultError::NotFound(id.to_string()))?;
		Ok(self.state.homebrew.remove(index))
	}

	/// Store fetched details on an SRD entry and in the persisted cache.
	pub fn apply_details(&mut self, id: &str, mut details: MonsterDetails) -> bool {
		let Some(m) = self.srd.iter_mut().find(|m| m.id == id) else {
			return false;
		};
		details.hydrated = true;
		m.details = details.clone();
		self.state.detail_cache.insert(id.to_string(), details);
		true
	}

	pub fn export_homebrew(&self) -> serde_json::Result<String> {
		serde_json::to_string_pretty(&self.state.homebrew)
	}

	/// Import a homebrew export. Entries get fresh ids when they collide.
	pub fn import_homebrew(&mut self, json: &str, mode: crate::ImportMode) -> Result<usize, crate::ImportError> {
		let raw: Vec<serde_json::Value> = serde_json::from_str(json)?;
		let valid = raw
			.into_iter()
			.filter_map(|v| serde_json::from_value::<Monster>(v).ok())
			.filter(|m| !m.name.trim().is_empty())
			.collect::<Vec<_>>();
		if valid.is_empty() {
			return Err(crate::ImportError::NoValidEntries);
		}

		if mode == crate::ImportMode::Replace {
			self.state.homebrew.clear();
		}
		let count = valid.len();
		for mut m in valid {
			let taken = m.id.is_empty() || !m.id.starts_with(HOMEBREW_PREFIX) || self.get(&m.id).is_some();
			if taken {
				m.id = format!("{HOMEBREW_PREFIX}{}", uuid::Uuid::new_v4());
			}
			m.is_homebrew = true;
			m.source = HOMEBREW_SOURCE.to_string();
			self.state.homebrew.push(m);
		}
		Ok(count)
	}
}

pub fn load_srd() -> Result<Vec<Monster>> {
	serde_json::from_str(SRD_JSON).context("parse bundled SRD monsters")
}

// ----------

/// Session bookkeeping for remote detail lookups.
///
/// A monster is fetched at most once at a time, and a failed lookup is not
/// retried for the rest of the session.
#[derive(Debug, Default)]
pub struct DetailLookups {
	in_flight: HashSet<String>,
	failed: HashSet<String>,
}

impl DetailLookups {
	/// Claim a lookup. Returns `false` if one is running or already failed.
	pub fn begin(&mut self, id: &str) -> bool {
		if self.failed.contains(id) || self.in_flight.contains(id) {
			return false;
		}
		self.in_flight.insert(id.to_string());
		true
	}

	pub fn finish(&mut self, id: &str, ok: bool) {
		self.in_flight.remove(id);
		if !ok {
			self.failed.insert(id.to_string());
		}
	}

	pub fn is_in_flight(&self, id: &str) -> bool {
		self.in_flight.contains(id)
	}

	pub fn has_failed(&self, id: &str) -> bool {
		self.failed.contains(id)
	}
}

pub fn slugify(name: &str) -> String {
	let mut slug = String::with_capacity(name.len());
	for ch in name.trim().chars() {
		if ch.is_ascii_alphanumeric() {
			slug.push(ch.to_ascii_lowercase());
		} else if !slug.ends_with('-') && !slug.is_empty() {
			slug.push('-');
		}
	}
	slug.trim_end_matches('-').to_string()
}

/// Candidate URLs for a monster, newest API version first.
pub fn detail_urls(slug: &str) -> Vec<String> {
	remote::BASE_URLS
		.iter()
		.map(|base| format!("{base}/{slug}"))
		.collect()
}

/// Blocking fetch of monster details, trying each URL candidate in order.
pub fn fetch_details(name: &str) -> Result<MonsterDetails> {
	let slug = slugify(name);
	let mut last_err = None;
	for url in detail_urls(&slug) {
		match fetch_url(&url) {
			Ok(details) => return Ok(details),
			Err(err) => {
				tracing::debug!(url, error = %err, "monster detail candidate failed");
				last_err = Some(err);
			}
		}
	}
	Err(last_err.unwrap_or_else(|| anyhow::anyhow!("no detail URL for {name}")))
}

fn fetch_url(url: &str) -> Result<MonsterDetails> {
	let mut res = ureq::get(url).call().with_context(|| format!("GET {url}"))?;
	let body = res
		.body_mut()
		.read_json::<remote::ApiMonster>()
		.with_context(|| format!("decode {url}"))?;
	Ok(body.into_details())
}

impl remote::ApiMonster {
	pub fn into_details(self) -> MonsterDetails {
		let entries = |v: Vec<remote::ApiEntry>| {
			v.into_iter()
				.map(|e| Entry { name: e.name, desc: e.desc })
				.collect::<Vec<_>>()
		};
		let senses = self
			.senses
			.iter()
			.map(|(k, v)| format!("{} {}", k.replace('_', " "), json_text(v)))
			.collect::<Vec<_>>()
			.join(", ");
		let (saves, skills): (Vec<_>, Vec<_>) = self
			.proficiencies
			.iter()
			.partition(|p| p.proficiency.name.starts_with("Saving Throw"));
		let fmt_prof = |list: Vec<&remote::ApiProficiency>| {
			list.iter()
				.map(|p| {
					let label = p.proficiency.name.rsplit(": ").next().unwrap_or(&p.proficiency.name);
					format!("{label} {:+}", p.value)
				})
				.collect::<Vec<_>>()
				.join(", ")
		};

		MonsterDetails {
			ability_scores: Some(AbilityScores {
				str: self.strength,
				dex: self.dexterity,
				con: self.constitution,
				int: self.intelligence,
				wis: self.wisdom,
				cha: self.charisma,
			}),
			saves: fmt_prof(saves),
			skills: fmt_prof(skills),
			senses,
			languages: self.languages,
			traits: entries(self.special_abilities),
			actions: entries(self.actions),
			reactions: entries(self.reactions),
			legendary_actions: entries(self.legendary_actions),
			hydrated: true,
		}
	}
}

fn json_text(v: &serde_json::Value) -> String {
	match v {
		serde_json::Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{ImportError, ImportMode};

	fn vault() -> Vault {
		Vault::new(VaultState::default()).unwrap()
	}

	fn homebrew(name: &str, cr: &str) -> Monster {
		Monster { name: name.into(), cr: cr.into(), ac: 13, hp: 22, ..Default::default() }
	}

	#[test]
	fn bundled_srd_parses() {
		let srd = load_srd().unwrap();
		assert_eq!(srd.len(), 321);
		assert!(srd.iter().all(|m| !m.id.is_empty() && !m.name.is_empty()));
		assert!(srd.iter().all(|m| m.id == slugify(&m.name)));
		assert!(srd.iter().all(|m| cr_to_xp(&m.cr) == Some(m.xp)));
		let ids = srd.iter().map(|m| &m.id).collect::<HashSet<_>>();
		assert_eq!(ids.len(), srd.len());
	}

	#[test]
	fn bundled_srd_spot_checks() {
		let v = vault();
		let tarrasque = v.get("tarrasque").unwrap();
		assert_eq!((tarrasque.cr.as_str(), tarrasque.ac, tarrasque.hp), ("30", 25, 676));
		assert_eq!(tarrasque.xp, 155000);

		let dragon = v.get("ancient-gold-dragon").unwrap();
		assert_eq!(dragon.size_type, "Gargantuan dragon, lawful good");
		assert_eq!(dragon.kind, "dragon");

		let acolyte = v.get("acolyte").unwrap();
		assert_eq!((acolyte.cr.as_str(), acolyte.ac, acolyte.hp), ("1/4", 10, 9));
		assert_eq!(acolyte.source, SRD_SOURCE);

		let swarm = v.get("swarm-of-rats").unwrap();
		assert_eq!(swarm.kind, "swarm of Tiny beasts");
		assert!(v.get("will-o-wisp").is_some());
	}

	#[test]
	fn challenge_rating_tables() {
		assert_eq!(parse_cr("1/2"), Some(0.5));
		assert_eq!(parse_cr("1/0"), None);
		assert_eq!(cr_to_xp("1/4"), Some(50));
		assert_eq!(cr_to_xp("10"), Some(5900));
		assert_eq!(cr_to_xp("banana"), None);
		assert_eq!(proficiency_bonus_for_cr("1/8"), Some(2));
		assert_eq!(proficiency_bonus_for_cr("5"), Some(3));
		assert_eq!(proficiency_bonus_for_cr("17"), Some(6));
		assert_eq!(proficiency_bonus_for_cr("1/4"), Some(2));
		assert_eq!(proficiency_bonus_for_cr("4"), Some(2));
		assert_eq!(proficiency_bonus_for_cr("30"), Some(9));
		assert_eq!(proficiency_bonus_for_cr("x"), None);
	}

	#[test]
	fn filters_by_text_source_and_cr() {
		let mut v = vault();
		let mut beast = homebrew("Ash Hound", "2");
		beast.details.actions.push(Entry { name: "Cinder Bite".into(), desc: "Melee Weapon Attack".into() });
		v.add_homebrew(beast);

		let by_action = v.filter(&Filter { search: "cinder".into(), ..Default::default() });
		assert_eq!(by_action.len(), 1);
		assert_eq!(by_action[0].name, "Ash Hound");

		let hb = v.filter(&Filter { source: SourceFacet::Homebrew, ..Default::default() });
		assert_eq!(hb.len(), 1);

		let srd = v.filter(&Filter { source: SourceFacet::Srd, ..Default::default() });
		assert_eq!(srd.len(), v.srd().len());

		let cr2 = v.filter(&Filter { cr: "2".into(), ..Default::default() });
		assert!(cr2.iter().all(|m| m.cr == "2"));
		assert!(cr2.iter().any(|m| m.name == "Ash Hound"));

		let goblin = v.filter(&Filter { search: "GOBLIN".into(), ..Default::default() });
		assert!(goblin.iter().any(|m| m.name == "Goblin"));
	}

	#[test]
	fn homebrew_crud_and_srd_is_read_only() {
		let mut v = vault();
		let id = v.add_homebrew(homebrew("Bog Troll", "5"));
		assert!(id.starts_with("hb-"));
		assert_eq!(v.get(&id).unwrap().xp, 1800);

		let mut edited = v.get(&id).unwrap().clone();
		edited.hp = 99;
		v.update_homebrew(edited).unwrap();
		assert_eq!(v.get(&id).unwrap().hp, 99);

		let srd_id = v.srd()[0].id.clone();
		assert!(matches!(v.delete_homebrew(&srd_id), Err(VaultError::ReadOnly)));
		let srd_copy = v.srd()[0].clone();
		assert!(matches!(v.update_homebrew(srd_copy), Err(VaultError::ReadOnly)));

		v.delete_homebrew(&id).unwrap();
		assert!(v.get(&id).is_none());
	}

	#[test]
	fn homebrew_export_import() {
		let mut v = vault();
		v.add_homebrew(homebrew("Bog Troll", "5"));
		let json = v.export_homebrew().unwrap();

		assert_eq!(v.import_homebrew(&json, ImportMode::Merge).unwrap(), 1);
		assert_eq!(v.homebrew().len(), 2);
		assert_ne!(v.homebrew()[0].id, v.homebrew()[1].id);

		assert_eq!(v.import_homebrew(&json, ImportMode::Replace).unwrap(), 1);
		assert_eq!(v.homebrew().len(), 1);

		assert!(matches!(v.import_homebrew("[{}]", ImportMode::Merge), Err(ImportError::NoValidEntries)));
	}

	#[test]
	fn details_are_cached_in_state() {
		let mut v = vault();
		let id = v.srd()[0].id.clone();
		assert!(v.get(&id).unwrap().needs_hydration());

		let details = MonsterDetails {
			actions: vec![Entry { name: "Bite".into(), desc: "Hits.".into() }],
			..Default::default()
		};
		assert!(v.apply_details(&id, details));
		assert!(!v.get(&id).unwrap().needs_hydration());

		let reloaded = Vault::new(v.state.clone()).unwrap();
		assert_eq!(reloaded.get(&id).unwrap().details.actions[0].name, "Bite");
	}

	#[test]
	fn empty_lookup_still_counts_as_hydrated() {
		let mut v = vault();
		assert!(v.get("shrieker").unwrap().needs_hydration());

		assert!(v.apply_details("shrieker", MonsterDetails::default()));
		let shrieker = v.get("shrieker").unwrap();
		assert!(shrieker.details.actions.is_empty());
		assert!(!shrieker.needs_hydration());

		let reloaded = Vault::new(v.state.clone()).unwrap();
		assert!(!reloaded.get("shrieker").unwrap().needs_hydration());
	}

	#[test]
	fn cached_details_without_flag_load_as_hydrated() {
		let state: VaultState = serde_json::from_value(serde_json::json!({
			"homebrew": [],
			"detailCache": { "goblin": { "languages": "Common, Goblin" } }
		}))
		.unwrap();
		let v = Vault::new(state).unwrap();
		assert!(!v.get("goblin").unwrap().needs_hydration());
		assert!(v.get("orc").unwrap().needs_hydration());
	}

	#[test]
	fn legacy_homebrew_array_loads() {
		let legacy = serde_json::json!([{ "id": "hb-1", "name": "Mudling" }]);
		let state: VaultState = serde_json::from_value(legacy).unwrap();
		assert_eq!(state.homebrew[0].name, "Mudling");
	}

	#[test]
	fn lookups_do_not_repeat() {
		let mut lookups = DetailLookups::default();
		assert!(lookups.begin("goblin"));
		assert!(!lookups.begin("goblin"));
		lookups.finish("goblin", false);
		assert!(lookups.has_failed("goblin"));
		assert!(!lookups.begin("goblin"));

		assert!(lookups.begin("orc"));
		lookups.finish("orc", true);
		assert!(!lookups.is_in_flight("orc"));
		assert!(lookups.begin("orc"));
	}

	#[test]
	fn slugs_and_urls() {
		assert_eq!(slugify("Adult Red Dragon"), "adult-red-dragon");
		assert_eq!(slugify("  Will-o'-Wisp "), "will-o-wisp");
		let urls = detail_urls("goblin");
		assert!(urls.len() >= 2);
		assert!(urls.iter().all(|u| u.ends_with("/goblin")));
	}

	#[test]
	fn api_payload_maps_to_details() {
		let json = serde_json::json!({
			"strength": 8, "dexterity": 14, "constitution": 10,
			"intelligence": 10, "wisdom": 8, "charisma": 8,
			"proficiencies": [
				{ "value": 6, "proficiency": { "name": "Skill: Stealth" } },
				{ "value": 4, "proficiency": { "name": "Saving Throw: DEX" } }
			],
			"senses": { "darkvision": "60 ft.", "passive_perception": 9 },
			"languages": "Common, Goblin",
			"special_abilities": [{ "name": "Nimble Escape", "desc": "Disengage or Hide as a bonus action." }],
			"actions": [{ "name": "Scimitar", "desc": "Melee Weapon Attack: +4 to hit." }]
		});
		let api: remote::ApiMonster = serde_json::from_value(json).unwrap();
		let d = api.into_details();

		assert_eq!(d.ability_scores.unwrap().dex, 14);
		assert_eq!(d.skills, "Stealth +6");
		assert_eq!(d.saves, "DEX +4");
		assert!(d.senses.contains("darkvision 60 ft."));
		assert!(d.senses.contains("passive perception 9"));
		assert_eq!(d.traits[0].name, "Nimble Escape");
		assert_eq!(d.actions[0].name, "Scimitar");
		assert!(d.reactions.is_empty());
	}

	#[test]
	fn ability_modifiers() {
		assert_eq!(AbilityScores::modifier(10), 0);
		assert_eq!(AbilityScores::modifier(9), -1);
		assert_eq!(AbilityScores::modifier(18), 4);
		assert_eq!(AbilityScores::modifier(1), -5);
	}
}
