//! Wire format of the public D&D 5e SRD API (`dnd5eapi.co`).

use std::collections::BTreeMap;

/// Monster endpoints, newest API revision first. `/{slug}` is appended.
pub const BASE_URLS: [&str; 2] = [
	"https://www.dnd5eapi.co/api/2014/monsters",
	"https://www.dnd5eapi.co/api/monsters",
];

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ApiMonster {
	pub strength: i32,
	pub dexterity: i32,
	pub constitution: i32,
	pub intelligence: i32,
	pub wisdom: i32,
	pub charisma: i32,
	pub proficiencies: Vec<ApiProficiency>,
	pub senses: BTreeMap<String, serde_json::Value>,
	pub languages: String,
	pub special_abilities: Vec<ApiEntry>,
	pub actions: Vec<ApiEntry>,
	pub reactions: Vec<ApiEntry>,
	pub legendary_actions: Vec<ApiEntry>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ApiEntry {
	pub name: String,
	pub desc: String,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ApiProficiency {
	pub value: i32,
	pub proficiency: ApiReference,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ApiReference {
	pub name: String,
}
