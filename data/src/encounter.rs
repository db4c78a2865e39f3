//! Initiative order and turn tracking.

use std::cmp::Ordering;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	#[default]
	Player,
	Ally,
	Enemy,
	Neutral,
}

impl Role {
	pub const ALL: [Role; 4] = [Role::Player, Role::Ally, Role::Enemy, Role::Neutral];

	pub fn label(self) -> &'static str {
		match self {
			Role::Player => "Player",
			Role::Ally => "Ally",
			Role::Enemy => "Enemy",
			Role::Neutral => "Neutral",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combatant {
	pub id: String,
	pub name: String,
	#[serde(default)]
	pub role: Role,
	/// Creature type, free text ("humanoid", "undead", ...).
	#[serde(default, rename = "type")]
	pub kind: String,
	pub initiative: i32,
	#[serde(default)]
	pub ac: i32,
	#[serde(default)]
	pub max_hp: i32,
	#[serde(default)]
	pub current_hp: i32,
	#[serde(default)]
	pub speed: String,
}

impl Combatant {
	pub fn new(name: impl Into<String>, role: Role, initiative: i32, ac: i32, max_hp: i32) -> Self {
		Self {
			id: uuid::Uuid::new_v4().to_string(),
			name: name.into(),
			role,
			kind: String::new(),
			initiative,
			ac,
			max_hp,
			current_hp: max_hp,
			speed: String::new(),
		}
	}

	pub fn is_down(&self) -> bool {
		self.current_hp <= 0
	}
}

fn initiative_order(a: &Combatant, b: &Combatant) -> Ordering {
	b.initiative
		.cmp(&a.initiative)
		.then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
		.then_with(|| a.name.cmp(&b.name))
}

/// `1d20 + modifier`.
pub fn roll_initiative(modifier: i32, rng: &mut impl Rng) -> i32 {
	rng.gen_range(1..=20) + modifier
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
	pub combatants: Vec<Combatant>,
	pub round: u32,
	pub active_index: usize,
}

impl Default for Encounter {
	fn default() -> Self {
		Self { combatants: Vec::new(), round: 1, active_index: 0 }
	}
}

impl<'de> Deserialize<'de> for Encounter {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		#[derive(Deserialize)]
		#[serde(rename_all = "camelCase")]
		struct Fields {
			#[serde(default)]
			combatants: Vec<Combatant>,
			#[serde(default = "first_round")]
			round: u32,
			#[serde(default)]
			active_index: usize,
		}
		fn first_round() -> u32 {
			1
		}

		// Early versions stored only the combatant list.
		#[derive(Deserialize)]
		#[serde(untagged)]
		enum Shape {
			Current(Fields),
			Legacy(Vec<Combatant>),
		}

		let mut encounter = match Shape::deserialize(deserializer)? {
			Shape::Current(f) => Encounter { combatants: f.combatants, round: f.round.max(1), active_index: f.active_index },
			Shape::Legacy(combatants) => Encounter { combatants, ..Encounter::default() },
		};
		if encounter.active_index >= encounter.combatants.len() {
			encounter.active_index = 0;
		}
		Ok(encounter)
	}
}

impl Encounter {
	pub fn active(&self) -> Option<&Combatant> {
		self.combatants.get(self.active_index)
	}

	pub fn get(&self, id: &str) -> Option<&Combatant> {
		self.combatants.iter().find(|c| c.id == id)
	}

	fn position(&self, id: &str) -> Option<usize> {
		self.combatants.iter().position(|c| c.id == id)
	}

	/// Stable sort by initiative (desc) then name, keeping the active combatant active.
	pub fn sort(&mut self) {
		let active_id = self.active().map(|c| c.id.clone());
		self.combatants.sort_by(initiative_order);
		self.active_index = active_id.and_then(|id| self.position(&id)).unwrap_or(0);
	}

	pub fn add(&mut self, combatant: Combatant) {
		self.combatants.push(combatant);
		self.sort();
	}

	pub fn remove(&mut self, id: &str) -> Option<Combatant> {
		let index = self.position(id)?;
		let removed = self.combatants.remove(index);
		if index < self.active_index {
			self.active_index -= 1;
		}
		if self.active_index >= self.combatants.len() {
			self.active_index = 0;
		}
		Some(removed)
	}

	/// Replace a combatant's record (matched by id) and restore ordering.
	pub fn update(&mut self, combatant: Combatant) -> bool {
		let Some(index) = self.position(&combatant.id) else {
			return false;
		};
		self.combatants[index] = combatant;
		self.sort();
		true
	}

	pub fn set_initiative(&mut self, id: &str, initiative: i32) -> bool {
		let Some(index) = self.position(id) else {
			return false;
		};
		self.combatants[index].initiative = initiative;
		self.sort();
		true
	}

	/// Apply damage (negative) or healing (positive), clamped to `[0, max_hp]`.
	pub fn adjust_hp(&mut self, id: &str, delta: i32) -> Option<i32> {
		let index = self.position(id)?;
		let c = &mut self.combatants[index];
		c.current_hp = c.current_hp.saturating_add(delta).clamp(0, c.max_hp.max(0));
		Some(c.current_hp)
	}

	fn first_living(&self) -> Option<usize> {
		self.combatants.iter().position(|c| !c.is_down())
	}

	/// Advance to the next combatant still standing, wrapping around the order.
	///
	/// If everyone is down the pointer stays where it is.
	pub fn next_turn(&mut self) {
		let len = self.combatants.len();
		if len == 0 {
			return;
		}
		for step in 1..=len {
			let index = (self.active_index + step) % len;
			if !self.combatants[index].is_down() {
				self.active_index = index;
				return;
			}
		}
	}

	pub fn prev_turn(&mut self) {
		let len = self.combatants.len();
		if len == 0 {
			return;
		}
		for step in 1..=len {
			let index = (self.active_index + len * step - step) % len;
			if !self.combatants[index].is_down() {
				self.active_index = index;
				return;
			}
		}
	}

	pub fn next_round(&mut self) {
		self.round += 1;
		self.active_index = self.first_living().unwrap_or(0);
	}

	pub fn prev_round(&mut self) {
		self.round = self.round.saturating_sub(1).max(1);
	}

	pub fn reset_round(&mut self) {
		self.round = 1;
		self.active_index = self.first_living().unwrap_or(0);
	}

	pub fn clear(&mut self) {
		*self = Self::default();
	}

	/// Move the combatant at `from` to `to` (drag and drop), keeping the turn pointer
	/// on the same combatant.
	pub fn move_combatant(&mut self, from: usize, to: usize) -> bool {
		let len = self.combatants.len();
		if from >= len || to >= len || from == to {
			return false;
		}
		let moved = self.combatants.remove(from);
		self.combatants.insert(to, moved);

		let active = self.active_index;
		self.active_index = if active == from {
			to
		} else if from < active && to >= active {
			active - 1
		} else if from > active && to <= active {
			active + 1
		} else {
			active
		};
		true
	}
}

// ----------

/// A saved party that can be dropped into any encounter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
	pub members: Vec<Combatant>,
}

impl Party {
	/// Snapshot the player characters of an encounter.
	pub fn from_encounter(encounter: &Encounter) -> Self {
		Self {
			members: encounter
				.combatants
				.iter()
				.filter(|c| c.role == Role::Player)
				.cloned()
				.collect(),
		}
	}

	/// Add every member with a fresh id and full HP. Returns how many were added.
	pub fn add_to(&self, encounter: &mut Encounter) -> usize {
		for member in &self.members {
			let mut c = member.clone();
			c.id = uuid::Uuid::new_v4().to_string();
			c.current_hp = c.max_hp;
			encounter.combatants.push(c);
		}
		encounter.sort();
		self.members.len()
	}
}
