use std::collections::HashMap;

use data::{Combatant, Encounter, Party, Role, keys};

use crate::{UiExt, tr, ui::Status};

/// Edits collected while drawing and applied afterwards.
#[derive(Debug)]
enum Action {
	Add(Combatant),
	Initiative(String, i32),
	Hp(String, i32),
	Move(usize, usize),
	Remove(String),
	Activate(usize),
	NextTurn,
	PrevTurn,
	NextRound,
	PrevRound,
	ResetRounds,
	Clear,
}

/// Apply one edit. Returns false when it did not change anything.
fn apply_action(encounter: &mut Encounter, hp_deltas: &mut HashMap<String, i32>, action: Action) -> bool {
	match action {
		Action::Add(combatant) => {
			encounter.add(combatant);
			true
		}
		Action::Initiative(id, value) => encounter.set_initiative(&id, value),
		Action::Hp(id, delta) => {
			hp_deltas.remove(&id);
			match encounter.adjust_hp(&id, delta) {
				Some(hp) => {
					tracing::debug!(id, delta, hp, "hp adjusted");
					true
				}
				None => false,
			}
		}
		Action::Move(from, to) => encounter.move_combatant(from, to),
		Action::Remove(id) => {
			hp_deltas.remove(&id);
			encounter.remove(&id).is_some()
		}
		Action::Activate(index) => {
			if index >= encounter.combatants.len() {
				return false;
			}
			encounter.active_index = index;
			true
		}
		Action::NextTurn => {
			encounter.next_turn();
			true
		}
		Action::PrevTurn => {
			encounter.prev_turn();
			true
		}
		Action::NextRound => {
			encounter.next_round();
			true
		}
		Action::PrevRound => {
			encounter.prev_round();
			true
		}
		Action::ResetRounds => {
			encounter.reset_round();
			true
		}
		Action::Clear => {
			encounter.clear();
			hp_deltas.clear();
			true
		}
	}
}

fn role_label(role: Role) -> String {
	tr!("combatant-role", role = role.label().to_lowercase())
}

#[derive(Default)]
struct NewCombatant {
	name: String,
	kind: String,
	role: Role,
	initiative: i32,
	modifier: i32,
	ac: i32,
	max_hp: i32,
	speed: String,
}

impl NewCombatant {
	fn blank() -> Self {
		Self { ac: 10, max_hp: 10, ..Default::default() }
	}

	fn into_combatant(self) -> Combatant {
		let mut combatant = Combatant::new(self.name.trim(), self.role, self.initiative, self.ac, self.max_hp);
		combatant.kind = self.kind.trim().to_string();
		combatant.speed = self.speed.trim().to_string();
		combatant
	}
}

pub struct EncounterTracker {
	uniform: crate::Uniform,

	encounter: Encounter,
	party: Party,

	form: NewCombatant,
	monster_search: String,
	hp_deltas: HashMap<String, i32>,
	status: Status,
}

impl EncounterTracker {
	pub fn new(uniform: crate::Uniform) -> Self {
		let encounter = uniform.store.load_or_default::<Encounter>(keys::ENCOUNTER);
		let party = uniform.store.load_or_default::<Party>(keys::PARTY);
		Self {
			uniform,
			encounter,
			party,
			form: NewCombatant::blank(),
			monster_search: String::new(),
			hp_deltas: HashMap::new(),
			status: Status::Idle,
		}
	}

	fn persist(&self) {
		self.uniform.store.save(keys::ENCOUNTER, &self.encounter);
	}

	/// Apply an edit and save the encounter if it changed.
	fn apply(&mut self, action: Action) -> bool {
		let changed = apply_action(&mut self.encounter, &mut self.hp_deltas, action);
		if changed {
			self.persist();
		}
		changed
	}

	fn save_party(&mut self) -> usize {
		self.party = Party::from_encounter(&self.encounter);
		self.uniform.store.save(keys::PARTY, &self.party);
		self.party.members.len()
	}

	fn add_party(&mut self) -> usize {
		let added = self.party.add_to(&mut self.encounter);
		if added > 0 {
			self.persist();
		}
		added
	}

	fn ui_turns(&mut self, ui: &mut egui::Ui) -> Option<Action> {
		let mut action = None;
		ui.horizontal(|ui| {
			ui.heading(tr!("encounter-round", round = self.encounter.round));
			ui.separator();
			if ui.button(tr!("encounter-prev-turn")).clicked() {
				action = Some(Action::PrevTurn);
			}
			if ui.button(tr!("encounter-next-turn")).clicked() {
				action = Some(Action::NextTurn);
			}
			if ui.button(tr!("encounter-prev-round")).clicked() {
				action = Some(Action::PrevRound);
			}
			if ui.button(tr!("encounter-next-round")).clicked() {
				action = Some(Action::NextRound);
			}
			if ui.button(tr!("encounter-reset-rounds")).clicked() {
				action = Some(Action::ResetRounds);
			}
			if ui.confirm_button("clear-encounter", &tr!("encounter-clear")) {
				action = Some(Action::Clear);
			}
		});

		if let Some(active) = self.encounter.active() {
			ui.label(tr!("encounter-active", name = active.name.as_str()));
		}
		action
	}

	fn ui_party(&mut self, ui: &mut egui::Ui) {
		ui.horizontal(|ui| {
			ui.label(tr!("party-saved", count = self.party.members.len()));
			if ui.button(tr!("party-save")).clicked() {
				let count = self.save_party();
				self.status = Status::info(tr!("party-saved-status", count = count));
			}
			let can_load = !self.party.members.is_empty();
			if ui.add_enabled(can_load, egui::Button::new(tr!("party-add"))).clicked() {
				let added = self.add_party();
				self.status = Status::info(tr!("party-added-status", count = added));
			}
		});
	}

	fn ui_add_form(&mut self, ui: &mut egui::Ui) -> Option<Action> {
		let form = &mut self.form;
		egui::Grid::new("new-combatant").num_columns(2).show(ui, |ui| {
			ui.label(tr!("field-name"));
			ui.text_edit_singleline(&mut form.name);
			ui.end_row();

			ui.label(tr!("field-type"));
			ui.text_edit_singleline(&mut form.kind);
			ui.end_row();

			ui.label(tr!("field-role"));
			egui::ComboBox::from_id_salt("new-combatant-role")
				.selected_text(role_label(form.role))
				.show_ui(ui, |ui| {
					for role in Role::ALL {
						ui.selectable_value(&mut form.role, role, role_label(role));
					}
				});
			ui.end_row();

			ui.label(tr!("field-initiative"));
			ui.horizontal(|ui| {
				ui.add(egui::DragValue::new(&mut form.initiative));
				ui.label(tr!("field-modifier"));
				ui.add(egui::DragValue::new(&mut form.modifier).range(-10..=20));
				if ui.small_button("🎲").on_hover_text(tr!("encounter-roll-initiative")).clicked() {
					form.initiative = data::encounter::roll_initiative(form.modifier, &mut rand::thread_rng());
				}
			});
			ui.end_row();

			ui.label(tr!("field-ac-max-hp"));
			ui.horizontal(|ui| {
				ui.add(egui::DragValue::new(&mut form.ac).range(0..=40));
				ui.add(egui::DragValue::new(&mut form.max_hp).range(0..=9999));
			});
			ui.end_row();

			ui.label(tr!("field-speed"));
			ui.text_edit_singleline(&mut form.speed);
			ui.end_row();
		});

		let ready = !self.form.name.trim().is_empty();
		if ui.add_enabled(ready, egui::Button::new(tr!("encounter-add-combatant"))).clicked() {
			let form = std::mem::replace(&mut self.form, NewCombatant::blank());
			return Some(Action::Add(form.into_combatant()));
		}
		None
	}

	fn ui_add_monster(&mut self, ui: &mut egui::Ui) -> Option<Action> {
		ui.horizontal(|ui| {
			ui.label(tr!("encounter-from-vault"));
			ui.add(
				egui::TextEdit::singleline(&mut self.monster_search)
					.hint_text(tr!("encounter-search-hint"))
					.desired_width(160.0),
			);
		});
		if self.monster_search.trim().is_empty() {
			return None;
		}

		let picked = {
			let vault = self.uniform.vault();
			let filter = data::monster::Filter { search: self.monster_search.clone(), ..Default::default() };
			let mut picked = None;
			for monster in vault.filter(&filter).into_iter().take(8) {
				let label = tr!(
					"encounter-monster-choice",
					name = monster.name.as_str(),
					cr = monster.cr.as_str(),
					ac = monster.ac,
					hp = monster.hp,
				);
				if ui.small_button(label).clicked() {
					picked = Some(monster.clone());
				}
			}
			picked
		};

		let monster = picked?;
		let initiative = data::encounter::roll_initiative(monster.initiative, &mut rand::thread_rng());
		let mut combatant = Combatant::new(&monster.name, Role::Enemy, initiative, monster.ac, monster.hp);
		combatant.kind = monster.kind.clone();
		combatant.speed = monster.speed.clone();
		self.status = Status::info(tr!("encounter-monster-joins", name = monster.name.as_str(), initiative = initiative));
		Some(Action::Add(combatant))
	}

	fn ui_table(&mut self, ui: &mut egui::Ui) -> Vec<Action> {
		let mut actions = Vec::new();
		let active = self.encounter.active_index;

		egui::Grid::new("combatants").striped(true).num_columns(9).show(ui, |ui| {
			let headers = [
				String::new(),
				String::new(),
				tr!("column-initiative"),
				tr!("field-name"),
				tr!("field-role"),
				tr!("column-ac"),
				tr!("column-hp"),
				tr!("column-adjust"),
				String::new(),
			];
			for header in headers {
				ui.strong(header);
			}
			ui.end_row();

			for (i, c) in self.encounter.combatants.iter().enumerate() {
				// Rows are reordered by dragging the handle onto another row's handle.
				let handle = ui
					.dnd_drag_source(egui::Id::new(("combatant-drag", &c.id)), i, |ui| ui.label("☰"))
					.response
					.on_hover_text(tr!("encounter-drag-hint"));
				if let Some(from) = handle.dnd_hover_payload::<usize>()
					&& *from != i
				{
					let stroke = ui.visuals().selection.stroke;
					let y = if *from < i { handle.rect.bottom() } else { handle.rect.top() };
					ui.painter().hline(handle.rect.x_range(), y, stroke);
				}
				if let Some(from) = handle.dnd_release_payload::<usize>() {
					actions.push(Action::Move(*from, i));
				}

				let marker = if i == active { "▶" } else { " " };
				if ui.selectable_label(i == active, marker).on_hover_text(tr!("encounter-make-active")).clicked() {
					actions.push(Action::Activate(i));
				}

				let mut initiative = c.initiative;
				if ui.add(egui::DragValue::new(&mut initiative)).changed() {
					actions.push(Action::Initiative(c.id.clone(), initiative));
				}

				let name = if c.is_down() {
					egui::RichText::new(&c.name).strikethrough().weak()
				} else {
					egui::RichText::new(&c.name)
				};
				ui.label(name).on_hover_text(format!("{} {}", c.kind, c.speed));
				ui.label(role_label(c.role));
				ui.label(c.ac.to_string());
				ui.label(format!("{}/{}", c.current_hp, c.max_hp));

				ui.horizontal(|ui| {
					let delta = self.hp_deltas.entry(c.id.clone()).or_insert(1);
					ui.add(egui::DragValue::new(delta).range(0..=9999));
					let delta = *delta;
					if ui.small_button("−").on_hover_text(tr!("encounter-damage")).clicked() {
						actions.push(Action::Hp(c.id.clone(), -delta));
					}
					if ui.small_button("+").on_hover_text(tr!("encounter-heal")).clicked() {
						actions.push(Action::Hp(c.id.clone(), delta));
					}
				});

				if ui.confirm_button(&c.id, &tr!("encounter-remove")) {
					actions.push(Action::Remove(c.id.clone()));
				}
				ui.end_row();
			}
		});
		actions
	}
}

impl super::Module for EncounterTracker {
	fn name(&self) -> String {
		tr!("tab-encounter")
	}

	fn ui(&mut self, ui: &mut egui::Ui) {
		let mut actions = Vec::new();
		actions.extend(self.ui_turns(ui));
		ui.separator();

		egui::SidePanel::right("encounter-add")
			.resizable(false)
			.default_width(280.0)
			.show_inside(ui, |ui| {
				self.ui_party(ui);
				ui.separator();
				actions.extend(self.ui_add_form(ui));
				ui.separator();
				actions.extend(self.ui_add_monster(ui));
				ui.spacer();
				ui.status(&self.status);
			});

		egui::ScrollArea::vertical().show(ui, |ui| {
			if self.encounter.combatants.is_empty() {
				ui.label(tr!("encounter-empty"));
			}
			actions.extend(self.ui_table(ui));
		});

		for action in actions {
			self.apply(action);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn tracker(dir: &tempfile::TempDir) -> EncounterTracker {
		EncounterTracker::new(crate::UniformData::in_dir(dir.path()))
	}

	fn saved(tracker: &EncounterTracker) -> Encounter {
		tracker.uniform.store.load_or_default::<Encounter>(keys::ENCOUNTER)
	}

	fn add(tracker: &mut EncounterTracker, name: &str, initiative: i32, max_hp: i32) -> String {
		let combatant = Combatant::new(name, Role::Enemy, initiative, 12, max_hp);
		let id = combatant.id.clone();
		assert!(tracker.apply(Action::Add(combatant)));
		id
	}

	#[test]
	fn added_combatants_are_sorted_and_saved() {
		let dir = tempfile::tempdir().unwrap();
		let mut tracker = tracker(&dir);
		add(&mut tracker, "Goblin", 8, 7);
		add(&mut tracker, "Aria", 17, 24);

		let names: Vec<_> = saved(&tracker).combatants.iter().map(|c| c.name.clone()).collect();
		assert_eq!(names, ["Aria", "Goblin"]);

		// A new tracker over the same folder resumes the encounter.
		assert_eq!(EncounterTracker::new(tracker.uniform.clone()).encounter, tracker.encounter);
	}

	#[test]
	fn form_becomes_trimmed_combatant() {
		let form = NewCombatant { name: "  Bren ".into(), kind: " human ".into(), role: Role::Player, initiative: 14, ..NewCombatant::blank() };
		let c = form.into_combatant();
		assert_eq!(c.name, "Bren");
		assert_eq!(c.kind, "human");
		assert_eq!((c.ac, c.max_hp, c.current_hp), (10, 10, 10));
	}

	#[test]
	fn hp_changes_are_clamped_and_saved() {
		let dir = tempfile::tempdir().unwrap();
		let mut tracker = tracker(&dir);
		let id = add(&mut tracker, "Ogre", 5, 59);
		tracker.hp_deltas.insert(id.clone(), 80);

		assert!(tracker.apply(Action::Hp(id.clone(), -80)));
		assert!(!tracker.hp_deltas.contains_key(&id));
		assert_eq!(saved(&tracker).get(&id).map(|c| c.current_hp), Some(0));

		assert!(tracker.apply(Action::Hp(id.clone(), 100)));
		assert_eq!(saved(&tracker).get(&id).map(|c| c.current_hp), Some(59));

		assert!(!tracker.apply(Action::Hp("missing".into(), -3)));
	}

	#[test]
	fn removal_is_saved() {
		let dir = tempfile::tempdir().unwrap();
		let mut tracker = tracker(&dir);
		let goblin = add(&mut tracker, "Goblin", 12, 7);
		add(&mut tracker, "Wolf", 9, 11);
		tracker.hp_deltas.insert(goblin.clone(), 4);

		assert!(tracker.apply(Action::Remove(goblin.clone())));
		assert!(tracker.hp_deltas.is_empty());
		let encounter = saved(&tracker);
		assert_eq!(encounter.combatants.len(), 1);
		assert!(encounter.get(&goblin).is_none());

		assert!(!tracker.apply(Action::Remove(goblin)));
	}

	#[test]
	fn dragging_keeps_the_active_combatant() {
		let dir = tempfile::tempdir().unwrap();
		let mut tracker = tracker(&dir);
		add(&mut tracker, "A", 20, 5);
		let b = add(&mut tracker, "B", 15, 5);
		add(&mut tracker, "C", 10, 5);
		assert!(tracker.apply(Action::Activate(1)));

		// Drop "C" above "A".
		assert!(tracker.apply(Action::Move(2, 0)));
		let encounter = saved(&tracker);
		let names: Vec<_> = encounter.combatants.iter().map(|c| c.name.as_str()).collect();
		assert_eq!(names, ["C", "A", "B"]);
		assert_eq!(encounter.active().map(|c| c.id.clone()), Some(b.clone()));

		// Dropping a row onto itself is not an edit.
		assert!(!tracker.apply(Action::Move(1, 1)));
		assert!(!tracker.apply(Action::Activate(7)));
	}

	#[test]
	fn turn_controls_are_saved() {
		let dir = tempfile::tempdir().unwrap();
		let mut tracker = tracker(&dir);
		add(&mut tracker, "A", 20, 5);
		add(&mut tracker, "B", 15, 5);

		assert!(tracker.apply(Action::NextTurn));
		assert_eq!(saved(&tracker).active_index, 1);
		assert!(tracker.apply(Action::NextRound));
		let encounter = saved(&tracker);
		assert_eq!((encounter.round, encounter.active_index), (2, 0));

		tracker.hp_deltas.insert("x".into(), 2);
		assert!(tracker.apply(Action::Clear));
		assert!(tracker.hp_deltas.is_empty());
		assert_eq!(saved(&tracker), Encounter::default());
	}

	#[test]
	fn party_round_trip() {
		let dir = tempfile::tempdir().unwrap();
		let mut tracker = tracker(&dir);
		let hero = Combatant::new("Aria", Role::Player, 15, 16, 24);
		tracker.apply(Action::Add(hero));
		add(&mut tracker, "Goblin", 8, 7);

		assert_eq!(tracker.save_party(), 1);
		tracker.apply(Action::Clear);
		assert_eq!(tracker.add_party(), 1);
		assert_eq!(saved(&tracker).combatants[0].name, "Aria");
		assert_eq!(tracker.uniform.store.load_or_default::<Party>(keys::PARTY).members.len(), 1);
	}
}
