use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError, channel};

use data::keys;
use data::monster::{AbilityScores, Entry, Monster, MonsterDetails};
use ie::statblock::{Confidence, SectionKind, StatBlockDraft};

use crate::{UiExt, tr, ui::Status};

enum OcrEvent {
	Progress(usize, usize),
	Done(Result<StatBlockDraft, String>),
}

/// Creature type out of a size/type line such as
/// `"Medium humanoid (goblinoid), neutral evil"`.
fn creature_kind(size_type: &str) -> String {
	let head = size_type.split([',', '(']).next().unwrap_or_default();
	let mut words = head.split_whitespace();
	words.next();
	words.collect::<Vec<_>>().join(" ").to_lowercase()
}

fn entries(draft: &StatBlockDraft, kind: SectionKind, suffix: &str) -> Vec<Entry> {
	draft
		.entries(kind)
		.iter()
		.map(|e| Entry { name: format!("{}{suffix}", e.name), desc: e.desc.clone() })
		.collect()
}

/// Convert a reviewed draft into a homebrew monster.
fn draft_to_monster(draft: &StatBlockDraft) -> Monster {
	let ability_scores = draft.abilities.map(|a| {
		let [str, dex, con, int, wis, cha] = a.as_array();
		AbilityScores { str, dex, con, int, wis, cha }
	});

	let mut traits = Vec::new();
	for (name, value) in [
		("Damage Resistances", &draft.damage_resistances),
		("Damage Immunities", &draft.damage_immunities),
		("Damage Vulnerabilities", &draft.damage_vulnerabilities),
		("Condition Immunities", &draft.condition_immunities),
	] {
		if !value.trim().is_empty() {
			traits.push(Entry { name: name.to_string(), desc: value.trim().to_string() });
		}
	}
	traits.extend(entries(draft, SectionKind::Traits, ""));

	let mut actions = entries(draft, SectionKind::Actions, "");
	actions.extend(entries(draft, SectionKind::BonusActions, " (Bonus Action)"));
	let mut legendary_actions = entries(draft, SectionKind::LegendaryActions, "");
	legendary_actions.extend(entries(draft, SectionKind::MythicActions, " (Mythic)"));
	legendary_actions.extend(entries(draft, SectionKind::LairActions, " (Lair)"));

	Monster {
		name: draft.display_name().to_string(),
		kind: creature_kind(&draft.size_type),
		size_type: draft.size_type.clone(),
		cr: draft.cr.clone(),
		xp: draft.xp.or_else(|| data::monster::cr_to_xp(&draft.cr)).unwrap_or(0),
		ac: draft.ac.unwrap_or(10),
		hp: draft.hp.unwrap_or(1),
		speed: draft.speed.clone(),
		initiative: ability_scores.as_ref().map_or(0, |a| AbilityScores::modifier(a.dex)),
		details: MonsterDetails {
			ability_scores,
			saves: draft.saves.clone(),
			skills: draft.skills.clone(),
			senses: draft.senses.clone(),
			languages: draft.languages.clone(),
			traits,
			actions,
			reactions: entries(draft, SectionKind::Reactions, ""),
			legendary_actions,
			..Default::default()
		},
		..Default::default()
	}
}

fn section_label(kind: SectionKind) -> String {
	match kind {
		SectionKind::Traits => tr!("section-traits"),
		SectionKind::Actions => tr!("section-actions"),
		SectionKind::BonusActions => tr!("section-bonus-actions"),
		SectionKind::Reactions => tr!("section-reactions"),
		SectionKind::LegendaryActions => tr!("section-legendary"),
		SectionKind::LairActions => tr!("section-lair"),
		SectionKind::MythicActions => tr!("section-mythic"),
	}
}

fn confidence_color(ui: &egui::Ui, confidence: Confidence) -> egui::Color32 {
	match confidence {
		Confidence::High => egui::Color32::from_rgb(80, 180, 90),
		Confidence::Medium => ui.visuals().warn_fg_color,
		Confidence::Low => ui.visuals().error_fg_color,
	}
}

/// Optional number with its confidence shown as the label color.
fn opt_num(ui: &mut egui::Ui, label: &str, value: &mut Option<i32>, confidence: Confidence) -> bool {
	ui.colored_label(confidence_color(ui, confidence), label);
	let mut v = value.unwrap_or_default();
	let changed = ui.add(egui::DragValue::new(&mut v)).changed();
	if changed {
		*value = Some(v);
	}
	changed
}

fn draft_ui(ui: &mut egui::Ui, draft: &mut StatBlockDraft) -> bool {
	let mut changed = false;
	let confidence = draft.confidence;

	egui::Grid::new("draft-fields").num_columns(2).show(ui, |ui| {
		ui.label(tr!("field-name"));
		changed |= ui.text_edit_singleline(&mut draft.name).changed();
		ui.end_row();
		ui.label(tr!("field-size-type"));
		changed |= ui.text_edit_singleline(&mut draft.size_type).changed();
		ui.end_row();

		changed |= opt_num(ui, &tr!("field-armor-class"), &mut draft.ac, confidence.ac);
		ui.end_row();
		ui.label(tr!("field-ac-note"));
		changed |= ui.text_edit_singleline(&mut draft.ac_note).changed();
		ui.end_row();
		changed |= opt_num(ui, &tr!("field-hit-points"), &mut draft.hp, confidence.hp);
		ui.end_row();
		ui.label(tr!("field-hp-formula"));
		changed |= ui.text_edit_singleline(&mut draft.hp_formula).changed();
		ui.end_row();

		ui.colored_label(confidence_color(ui, confidence.speed), tr!("field-speed"));
		changed |= ui.text_edit_singleline(&mut draft.speed).changed();
		ui.end_row();
		ui.colored_label(confidence_color(ui, confidence.cr), tr!("field-challenge"));
		changed |= ui.text_edit_singleline(&mut draft.cr).changed();
		ui.end_row();

		ui.colored_label(confidence_color(ui, confidence.xp), tr!("field-xp"));
		let mut xp = draft.xp.unwrap_or_default();
		if ui.add(egui::DragValue::new(&mut xp)).changed() {
			draft.xp = Some(xp);
			changed = true;
		}
		ui.end_row();
		changed |= opt_num(
			ui,
			&tr!("field-proficiency-bonus"),
			&mut draft.proficiency_bonus,
			confidence.proficiency_bonus,
		);
		ui.end_row();

		ui.colored_label(confidence_color(ui, confidence.abilities), tr!("field-abilities"));
		ui.horizontal(|ui| match &mut draft.abilities {
			Some(abilities) => {
				let mut values = abilities.as_array();
				for (label, value) in ie::statblock::Abilities::LABELS.iter().zip(&mut values) {
					ui.label(*label);
					changed |= ui.add(egui::DragValue::new(value).range(1..=30)).changed();
				}
				*abilities = ie::statblock::Abilities::from_array(values);
			}
			None => {
				if ui.button(tr!("statblock-add-scores")).clicked() {
					draft.abilities = Some(ie::statblock::Abilities::from_array([10; 6]));
					changed = true;
				}
			}
		});
		ui.end_row();

		for (label, value) in [
			(tr!("field-saving-throws"), &mut draft.saves),
			(tr!("field-skills"), &mut draft.skills),
			(tr!("field-damage-resistances"), &mut draft.damage_resistances),
			(tr!("field-damage-immunities"), &mut draft.damage_immunities),
			(tr!("field-damage-vulnerabilities"), &mut draft.damage_vulnerabilities),
			(tr!("field-condition-immunities"), &mut draft.condition_immunities),
			(tr!("field-senses"), &mut draft.senses),
			(tr!("field-languages"), &mut draft.languages),
		] {
			ui.label(label);
			changed |= ui.text_edit_singleline(value).changed();
			ui.end_row();
		}
	});

	for section in &mut draft.sections {
		ui.spacer();
		ui.strong(section_label(section.kind));
		let mut remove = None;
		for (i, entry) in section.entries.iter_mut().enumerate() {
			ui.horizontal(|ui| {
				changed |= ui.add(egui::TextEdit::singleline(&mut entry.name).desired_width(150.0)).changed();
				changed |= ui
					.add(egui::TextEdit::multiline(&mut entry.desc).desired_rows(1).desired_width(f32::INFINITY))
					.changed();
			});
			if ui.small_button(tr!("statblock-remove-entry")).clicked() {
				remove = Some(i);
			}
		}
		if let Some(i) = remove {
			section.entries.remove(i);
			changed = true;
		}
		if ui.small_button(tr!("statblock-add-entry")).clicked() {
			section.entries.push(ie::statblock::Entry::default());
			changed = true;
		}
		if !section.raw.is_empty() {
			ui.weak(tr!("statblock-unassigned"));
			changed |= ui.add(egui::TextEdit::multiline(&mut section.raw).desired_width(f32::INFINITY)).changed();
		}
	}
	changed
}

pub struct StatBlockImport {
	uniform: crate::Uniform,

	image: Option<Arc<ie::OwnedImage>>,
	texture: Option<egui::TextureHandle>,

	job: Option<Receiver<OcrEvent>>,
	progress: (usize, usize),

	drafts: Vec<StatBlockDraft>,
	selected: Option<usize>,
	status: Status,
}

impl StatBlockImport {
	pub fn new(uniform: crate::Uniform) -> Self {
		let drafts = uniform.store.load_or_default::<Vec<StatBlockDraft>>(keys::STATBLOCK_DRAFTS);
		Self {
			uniform,
			image: None,
			texture: None,
			job: None,
			progress: (0, 0),
			selected: (!drafts.is_empty()).then_some(0),
			drafts,
			status: Status::Idle,
		}
	}

	fn persist(&self) {
		self.uniform.store.save(keys::STATBLOCK_DRAFTS, &self.drafts);
	}

	fn add_draft(&mut self, draft: StatBlockDraft) {
		self.drafts.insert(0, draft);
		self.selected = Some(0);
		self.persist();
	}

	fn load_image(&mut self, ctx: &egui::Context) {
		let Some(path) = crate::util::files::pick_image(&tr!("statblock-open-title")) else { return };
		match ie::OwnedImage::load(&path) {
			Ok(image) => {
				self.texture = Some(crate::util::files::load_texture(ctx, "statblock", &image));
				self.image = Some(Arc::new(image));
				self.status = Status::info(tr!("status-loaded", path = path.display().to_string()));
			}
			Err(err) => self.status = Status::error_chain(&err),
		}
	}

	fn start_ocr(&mut self) {
		let (Ok(ocr), Some(image)) = (&self.uniform.ocr, &self.image) else { return };
		let (ocr, image) = (ocr.clone(), image.clone());
		let (tx, rx) = channel();
		std::thread::spawn(move || {
			let progress = tx.clone();
			let result = ocr.read_stat_block(&image, |done, total| {
				let _ = progress.send(OcrEvent::Progress(done, total));
			});
			// The panel may be gone by now.
			let _ = tx.send(OcrEvent::Done(result.map_err(|err| format!("{err:#}"))));
		});
		self.job = Some(rx);
		self.progress = (0, 0);
		self.status = Status::info(tr!("statblock-recognising"));
	}

	fn send_to_vault(&mut self, index: usize) {
		let Some(draft) = self.drafts.get(index) else { return };
		let monster = draft_to_monster(draft);
		let name = monster.name.clone();
		let mut vault = self.uniform.vault();
		vault.add_homebrew(monster);
		self.uniform.save_vault(&vault);
		tracing::info!(name, "draft added to the vault");
		self.status = Status::info(tr!("statblock-sent", name = name));
	}

	fn ui_source(&mut self, ui: &mut egui::Ui) {
		if let Err(reason) = &self.uniform.ocr {
			ui.group(|ui| {
				ui.label(egui::RichText::new(tr!("ocr-missing")).strong());
				ui.small(reason);
			});
		}

		ui.horizontal(|ui| {
			if ui.add_enabled(self.job.is_none(), egui::Button::new(tr!("statblock-open"))).clicked() {
				self.load_image(ui.ctx());
			}
			let ready = self.uniform.ocr.is_ok() && self.image.is_some() && self.job.is_none();
			if ui.add_enabled(ready, egui::Button::new(tr!("statblock-recognise"))).clicked() {
				self.start_ocr();
			}
			if ui.button(tr!("statblock-new-from-text")).on_hover_text(tr!("statblock-new-from-text-hint")).clicked() {
				self.add_draft(StatBlockDraft::default());
			}
		});

		if self.job.is_some() {
			let (done, total) = self.progress;
			let fraction = if total == 0 { 0.0 } else { done as f32 / total as f32 };
			ui.add(egui::ProgressBar::new(fraction).text(tr!("statblock-ocr-pass", done = done, total = total)).animate(true));
		}

		if let Some(texture) = &self.texture {
			egui::CollapsingHeader::new(tr!("statblock-screenshot")).default_open(false).show(ui, |ui| {
				ui.add(egui::Image::from_texture(egui::load::SizedTexture::from_handle(texture)).max_width(ui.available_width()));
			});
		}
	}

	fn ui_drafts(&mut self, ui: &mut egui::Ui) {
		let mut delete = None;
		for (i, draft) in self.drafts.iter().enumerate() {
			ui.horizontal(|ui| {
				if ui.selectable_label(self.selected == Some(i), draft.display_name()).clicked() {
					self.selected = Some(i);
				}
				if ui.confirm_button(("delete-draft", i), "✕") {
					delete = Some(i);
				}
			});
		}
		if let Some(i) = delete {
			self.drafts.remove(i);
			self.selected = match self.selected {
				Some(s) if s == i => None,
				Some(s) if s > i => Some(s - 1),
				other => other,
			};
			self.persist();
		}
	}

	fn ui_editor(&mut self, ui: &mut egui::Ui) {
		let Some(index) = self.selected.filter(|&i| i < self.drafts.len()) else {
			ui.label(tr!("statblock-no-draft"));
			return;
		};

		ui.horizontal(|ui| {
			if ui.button(tr!("statblock-send")).clicked() {
				self.send_to_vault(index);
			}
			if ui.button(tr!("statblock-reparse")).on_hover_text(tr!("statblock-reparse-hint")).clicked() {
				let text = self.drafts[index].text.clone();
				self.drafts[index] = ie::parse_stat_block(&text);
				self.persist();
			}
		});

		let draft = &mut self.drafts[index];
		let mut changed = false;
		egui::CollapsingHeader::new(tr!("statblock-text")).default_open(draft.name.is_empty()).show(ui, |ui| {
			changed |= ui
				.add(egui::TextEdit::multiline(&mut draft.text).desired_rows(8).desired_width(f32::INFINITY))
				.changed();
		});
		changed |= draft_ui(ui, draft);
		if changed {
			self.persist();
		}
	}
}

impl super::Module for StatBlockImport {
	fn name(&self) -> String {
		tr!("tab-statblock")
	}

	fn ui(&mut self, ui: &mut egui::Ui) {
		egui::SidePanel::left("statblock-drafts")
			.default_width(220.0)
			.show_inside(ui, |ui| {
				self.ui_source(ui);
				ui.status(&self.status);
				ui.separator();
				ui.strong(tr!("statblock-drafts"));
				egui::ScrollArea::vertical().id_salt("draft-list").show(ui, |ui| self.ui_drafts(ui));
			});
		egui::CentralPanel::default().show_inside(ui, |ui| {
			egui::ScrollArea::vertical().id_salt("draft-editor").show(ui, |ui| self.ui_editor(ui));
		});
	}

	fn busy(&self) -> bool {
		self.job.is_some()
	}

	fn tick(&mut self) {
		let Some(rx) = &self.job else { return };
		let mut finished = None;
		loop {
			match rx.try_recv() {
				Ok(OcrEvent::Progress(done, total)) => self.progress = (done, total),
				Ok(OcrEvent::Done(result)) => {
					finished = Some(result);
					break;
				}
				Err(TryRecvError::Empty) => break,
				Err(TryRecvError::Disconnected) => {
					finished = Some(Err(tr!("statblock-worker-stopped")));
					break;
				}
			}
		}

		let Some(result) = finished else { return };
		self.job = None;
		match result {
			Ok(draft) => {
				self.status = Status::info(tr!("statblock-recognised", name = draft.display_name()));
				self.add_draft(draft);
			}
			Err(err) => {
				tracing::warn!(error = %err, "stat block OCR failed");
				self.status = Status::error(err);
			}
		}
	}
}
