use std::sync::mpsc::{Receiver, Sender, channel};

use data::monster::{AbilityScores, DetailLookups, Entry, Filter, Monster, MonsterDetails, SourceFacet};
use data::ImportMode;

use crate::{UiExt, tr, ui::Status};

type DetailResult = (String, Result<MonsterDetails, String>);

/// `Name. Description` per line, the editing format for trait and action lists.
fn parse_entries(text: &str) -> Vec<Entry> {
	text.lines()
		.map(str::trim)
		.filter(|l| !l.is_empty())
		.map(|line| match line.split_once(". ") {
			Some((name, desc)) => Entry { name: name.trim().to_string(), desc: desc.trim().to_string() },
			None => Entry { name: line.trim_end_matches('.').to_string(), desc: String::new() },
		})
		.collect()
}

fn entries_to_text(entries: &[Entry]) -> String {
	entries
		.iter()
		.map(|e| if e.desc.is_empty() { format!("{}.", e.name) } else { format!("{}. {}", e.name, e.desc) })
		.collect::<Vec<_>>()
		.join("\n")
}

/// Homebrew monster being edited.
struct Editor {
	monster: Monster,
	abilities: [i32; 6],
	traits: String,
	actions: String,
	reactions: String,
	legendary: String,
}

impl Editor {
	fn new(monster: Monster) -> Self {
		let d = &monster.details;
		let abilities = d
			.ability_scores
			.as_ref()
			.map(|a| a.as_array().map(|(_, v)| v))
			.unwrap_or([10; 6]);
		Self {
			abilities,
			traits: entries_to_text(&d.traits),
			actions: entries_to_text(&d.actions),
			reactions: entries_to_text(&d.reactions),
			legendary: entries_to_text(&d.legendary_actions),
			monster,
		}
	}

	fn finish(self) -> Monster {
		let [str, dex, con, int, wis, cha] = self.abilities;
		let mut monster = self.monster;
		monster.details.ability_scores = Some(AbilityScores { str, dex, con, int, wis, cha });
		monster.details.traits = parse_entries(&self.traits);
		monster.details.actions = parse_entries(&self.actions);
		monster.details.reactions = parse_entries(&self.reactions);
		monster.details.legendary_actions = parse_entries(&self.legendary);
		monster.name = monster.name.trim().to_string();
		monster
	}

	/// Returns `Some(true)` on save and `Some(false)` on cancel.
	fn ui(&mut self, ui: &mut egui::Ui) -> Option<bool> {
		let m = &mut self.monster;
		egui::Grid::new("monster-editor").num_columns(2).show(ui, |ui| {
			ui.label(tr!("field-name"));
			ui.text_edit_singleline(&mut m.name);
			ui.end_row();
			ui.label(tr!("field-size-type"));
			ui.text_edit_singleline(&mut m.size_type);
			ui.end_row();
			ui.label(tr!("field-type"));
			ui.text_edit_singleline(&mut m.kind);
			ui.end_row();
			ui.label(tr!("field-cr-xp"));
			ui.horizontal(|ui| {
				ui.add(egui::TextEdit::singleline(&mut m.cr).desired_width(50.0));
				ui.add(egui::DragValue::new(&mut m.xp));
				if ui.small_button(tr!("vault-xp-from-cr")).clicked() {
					m.xp = data::monster::cr_to_xp(&m.cr).unwrap_or(m.xp);
				}
			});
			ui.end_row();
			ui.label(tr!("field-ac-hp-init"));
			ui.horizontal(|ui| {
				ui.add(egui::DragValue::new(&mut m.ac).range(0..=40));
				ui.add(egui::DragValue::new(&mut m.hp).range(0..=9999));
				ui.add(egui::DragValue::new(&mut m.initiative).range(-10..=20));
			});
			ui.end_row();
			ui.label(tr!("field-speed"));
			ui.text_edit_singleline(&mut m.speed);
			ui.end_row();
			ui.label(tr!("field-abilities"));
			ui.horizontal(|ui| {
				for (label, value) in ["STR", "DEX", "CON", "INT", "WIS", "CHA"].iter().zip(&mut self.abilities) {
					ui.label(*label);
					ui.add(egui::DragValue::new(value).range(1..=30));
				}
			});
			ui.end_row();
			ui.label(tr!("field-saves"));
			ui.text_edit_singleline(&mut m.details.saves);
			ui.end_row();
			ui.label(tr!("field-skills"));
			ui.text_edit_singleline(&mut m.details.skills);
			ui.end_row();
			ui.label(tr!("field-senses"));
			ui.text_edit_singleline(&mut m.details.senses);
			ui.end_row();
			ui.label(tr!("field-languages"));
			ui.text_edit_singleline(&mut m.details.languages);
			ui.end_row();
		});

		for (label, text) in [
			(tr!("section-traits"), &mut self.traits),
			(tr!("section-actions"), &mut self.actions),
			(tr!("section-reactions"), &mut self.reactions),
			(tr!("section-legendary"), &mut self.legendary),
		] {
			ui.label(label);
			ui.add(egui::TextEdit::multiline(text).hint_text(tr!("vault-entry-hint")).desired_rows(3));
		}

		let mut outcome = None;
		ui.horizontal(|ui| {
			let named = !self.monster.name.trim().is_empty();
			if ui.add_enabled(named, egui::Button::new(tr!("action-save"))).clicked() {
				outcome = Some(true);
			}
			if ui.button(tr!("action-cancel")).clicked() {
				outcome = Some(false);
			}
		});
		outcome
	}
}

pub struct MonsterVault {
	uniform: crate::Uniform,

	filter: Filter,
	editor: Option<Editor>,

	lookups: DetailLookups,
	pending: usize,
	details_tx: Sender<DetailResult>,
	details_rx: Receiver<DetailResult>,

	status: Status,
}

impl MonsterVault {
	pub fn new(uniform: crate::Uniform) -> Self {
		let (details_tx, details_rx) = channel();
		Self {
			uniform,
			filter: Filter::default(),
			editor: None,
			lookups: DetailLookups::default(),
			pending: 0,
			details_tx,
			details_rx,
			status: Status::Idle,
		}
	}

	/// Fetch SRD details in the background, at most once per monster and session.
	fn request_details(&mut self, id: String, name: String) {
		if !crate::config_read().fetch_monster_details || !self.lookups.begin(&id) {
			return;
		}
		self.pending += 1;
		tracing::info!(id, name, "fetching monster details");
		let tx = self.details_tx.clone();
		std::thread::spawn(move || {
			let result = data::monster::fetch_details(&name).map_err(|err| format!("{err:#}"));
			// The panel may be gone by now.
			let _ = tx.send((id, result));
		});
	}

	fn save_editor(&mut self, editor: Editor) {
		let monster = editor.finish();
		let name = monster.name.clone();
		let mut vault = self.uniform.vault();
		let result = if monster.id.is_empty() {
			vault.add_homebrew(monster);
			Ok(())
		} else {
			vault.update_homebrew(monster)
		};
		match result {
			Ok(()) => {
				self.uniform.save_vault(&vault);
				self.status = Status::info(tr!("status-saved", name = name));
			}
			Err(err) => self.status = Status::error(err),
		}
	}

	fn export(&mut self) {
		let json = match self.uniform.vault().export_homebrew() {
			Ok(json) => json,
			Err(err) => {
				self.status = Status::error(err);
				return;
			}
		};
		match crate::util::files::save_json(&tr!("vault-export-title"), "homebrew-monsters.json", &json) {
			Some(Ok(path)) => self.status = Status::info(tr!("status-exported", path = path.display().to_string())),
			Some(Err(err)) => self.status = Status::error_chain(&err),
			None => {}
		}
	}

	fn import(&mut self, mode: ImportMode) {
		let json = match crate::util::files::open_json(&tr!("vault-import-title")) {
			Some(Ok(json)) => json,
			Some(Err(err)) => {
				self.status = Status::error_chain(&err);
				return;
			}
			None => return,
		};
		let mut vault = self.uniform.vault();
		match vault.import_homebrew(&json, mode) {
			Ok(count) => {
				self.uniform.save_vault(&vault);
				self.status = Status::info(tr!("vault-imported", count = count));
			}
			Err(err) => self.status = Status::error(err),
		}
	}

	fn ui_filter(&mut self, ui: &mut egui::Ui, crs: &[String]) {
		ui.horizontal(|ui| {
			ui.add(egui::TextEdit::singleline(&mut self.filter.search).hint_text(tr!("vault-search-hint")).desired_width(240.0));
			for (facet, label) in [
				(SourceFacet::All, tr!("vault-source-all")),
				(SourceFacet::Srd, tr!("vault-source-srd")),
				(SourceFacet::Homebrew, tr!("vault-source-homebrew")),
			] {
				ui.radio_value(&mut self.filter.source, facet, label);
			}
			let selected = if self.filter.cr.is_empty() { tr!("vault-any-cr") } else { tr!("vault-cr", cr = self.filter.cr.as_str()) };
			egui::ComboBox::from_id_salt("vault-cr").selected_text(selected).show_ui(ui, |ui| {
				ui.selectable_value(&mut self.filter.cr, String::new(), tr!("vault-any-cr"));
				for cr in crs {
					ui.selectable_value(&mut self.filter.cr, cr.clone(), tr!("vault-cr", cr = cr.as_str()));
				}
			});
		});
	}

	fn ui_toolbar(&mut self, ui: &mut egui::Ui) {
		ui.horizontal(|ui| {
			if ui.button(tr!("vault-new-homebrew")).clicked() {
				self.editor = Some(Editor::new(Monster { ac: 10, hp: 10, cr: "0".into(), ..Default::default() }));
			}
			ui.separator();
			if ui.button(tr!("action-export")).clicked() {
				self.export();
			}
			if ui.button(tr!("action-import-merge")).clicked() {
				self.import(ImportMode::Merge);
			}
			if ui.confirm_button("vault-import-replace", &tr!("action-import-replace")) {
				self.import(ImportMode::Replace);
			}
		});
	}
}

fn entries_ui(ui: &mut egui::Ui, heading: &str, entries: &[Entry]) {
	if entries.is_empty() {
		return;
	}
	ui.strong(heading);
	for e in entries {
		ui.horizontal_wrapped(|ui| {
			ui.label(egui::RichText::new(format!("{}.", e.name)).italics().strong());
			ui.label(&e.desc);
		});
	}
}

fn details_ui(ui: &mut egui::Ui, m: &Monster) {
	ui.label(egui::RichText::new(&m.size_type).italics());
	ui.label(tr!("vault-defenses", ac = m.ac, hp = m.hp, speed = m.speed.as_str()));
	let challenge = tr!("vault-challenge", cr = m.cr.as_str(), xp = m.xp);
	match data::monster::proficiency_bonus_for_cr(&m.cr) {
		Some(pb) => ui.label(tr!("vault-challenge-pb", challenge = challenge, pb = pb)),
		None => ui.label(challenge),
	};

	let d = &m.details;
	if let Some(scores) = &d.ability_scores {
		ui.horizontal(|ui| {
			for (label, score) in scores.as_array() {
				ui.monospace(format!("{label} {score} ({:+})", AbilityScores::modifier(score)));
			}
		});
	}
	for (label, value) in [
		(tr!("field-saving-throws"), &d.saves),
		(tr!("field-skills"), &d.skills),
		(tr!("field-senses"), &d.senses),
		(tr!("field-languages"), &d.languages),
	] {
		if !value.is_empty() {
			ui.label(format!("{label} {value}"));
		}
	}
	entries_ui(ui, &tr!("section-traits"), &d.traits);
	entries_ui(ui, &tr!("section-actions"), &d.actions);
	entries_ui(ui, &tr!("section-reactions"), &d.reactions);
	entries_ui(ui, &tr!("section-legendary"), &d.legendary_actions);
}

impl super::Module for MonsterVault {
	fn name(&self) -> String {
		tr!("tab-vault")
	}

	fn ui(&mut self, ui: &mut egui::Ui) {
		if let Some(editor) = &mut self.editor {
			let outcome = egui::ScrollArea::vertical().show(ui, |ui| editor.ui(ui)).inner;
			match outcome {
				Some(true) => {
					if let Some(editor) = self.editor.take() {
						self.save_editor(editor);
					}
				}
				Some(false) => self.editor = None,
				None => {}
			}
			return;
		}

		self.ui_toolbar(ui);
		let crs = self.uniform.vault().crs();
		self.ui_filter(ui, &crs);
		ui.status(&self.status);
		ui.separator();

		let mut wanted = Vec::new();
		let mut edit = None;
		let mut delete = None;
		{
			let uniform = self.uniform.clone();
			let vault = uniform.vault();
			let results = vault.filter(&self.filter);
			ui.label(tr!("vault-count", count = results.len()));

			egui::ScrollArea::vertical().show(ui, |ui| {
				for m in results {
					let title = if m.is_homebrew {
						tr!("vault-title-homebrew", name = m.name.as_str(), cr = m.cr.as_str())
					} else {
						tr!("vault-title", name = m.name.as_str(), cr = m.cr.as_str())
					};
					egui::CollapsingHeader::new(title).id_salt(&m.id).show(ui, |ui| {
						if m.needs_hydration() {
							if self.lookups.is_in_flight(&m.id) {
								ui.horizontal(|ui| {
									ui.spinner();
									ui.label(tr!("vault-loading"));
								});
							} else if self.lookups.has_failed(&m.id) {
								ui.weak(tr!("vault-unavailable"));
							} else {
								wanted.push((m.id.clone(), m.name.clone()));
							}
						}
						details_ui(ui, m);
						if m.is_homebrew {
							ui.horizontal(|ui| {
								if ui.button(tr!("action-edit")).clicked() {
									edit = Some(m.clone());
								}
								if ui.confirm_button(&m.id, &tr!("action-delete")) {
									delete = Some(m.id.clone());
								}
							});
						}
					});
				}
			});
		}

		for (id, name) in wanted {
			self.request_details(id, name);
		}
		if let Some(monster) = edit {
			self.editor = Some(Editor::new(monster));
		}
		if let Some(id) = delete {
			let mut vault = self.uniform.vault();
			match vault.delete_homebrew(&id) {
				Ok(m) => {
					self.uniform.save_vault(&vault);
					self.status = Status::info(tr!("status-deleted", name = m.name));
				}
				Err(err) => self.status = Status::error(err),
			}
		}
	}

	fn ui_settings(&mut self, ui: &mut egui::Ui, config: &mut crate::config::Config) -> bool {
		ui.label(tr!("tab-vault"));
		ui.checkbox(&mut config.fetch_monster_details, tr!("vault-fetch-details"))
			.changed()
	}

	fn busy(&self) -> bool {
		self.pending > 0
	}

	fn tick(&mut self) {
		while let Ok((id, result)) = self.details_rx.try_recv() {
			self.pending = self.pending.saturating_sub(1);
			match result {
				Ok(details) => {
					self.lookups.finish(&id, true);
					let mut vault = self.uniform.vault();
					if vault.apply_details(&id, details) {
						self.uniform.save_vault(&vault);
					}
				}
				Err(err) => {
					tracing::warn!(id, error = %err, "monster detail lookup failed");
					self.lookups.finish(&id, false);
				}
			}
		}
	}
}
