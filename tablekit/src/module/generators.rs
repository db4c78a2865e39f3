use data::generator::{
	FolderState, GeneratorKind, GeneratorStore, ImportMode, MAX_GENERATE, Template, items_to_text, parse_generator_items,
	parse_lexicon_items, parse_patterns,
};
use data::{keys, token};

use crate::{UiExt, tr, ui::Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KindChoice {
	List,
	Lexicon,
	Advanced,
}

impl KindChoice {
	const ALL: [KindChoice; 3] = [KindChoice::List, KindChoice::Lexicon, KindChoice::Advanced];

	fn label(self) -> String {
		match self {
			KindChoice::List => tr!("generator-kind-list"),
			KindChoice::Lexicon => tr!("generator-kind-lexicon"),
			KindChoice::Advanced => tr!("generator-kind-template"),
		}
	}

	fn empty(self) -> GeneratorKind {
		match self {
			KindChoice::List => GeneratorKind::List(Vec::new()),
			KindChoice::Lexicon => GeneratorKind::Lexicon(Vec::new()),
			KindChoice::Advanced => GeneratorKind::Advanced(Template::default()),
		}
	}
}

/// What a save kept and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SaveSummary {
	List { items: usize, duplicates: usize },
	Lexicon { entries: usize, duplicates: usize, rejected: usize },
	Template { patterns: usize, unmapped: Vec<String> },
}

impl SaveSummary {
	fn message(&self) -> String {
		match self {
			SaveSummary::List { items, duplicates } => {
				tr!("generator-saved-list", count = *items, duplicates = *duplicates)
			}
			SaveSummary::Lexicon { entries, duplicates, rejected } => {
				let mut message = tr!("generator-saved-lexicon", count = *entries, duplicates = *duplicates);
				if *rejected > 0 {
					message.push_str(&tr!("generator-lines-skipped", count = *rejected));
				}
				message
			}
			SaveSummary::Template { patterns, unmapped } => {
				let mut message = tr!("generator-saved-template", count = *patterns);
				if !unmapped.is_empty() {
					message.push_str(&tr!("generator-unmapped-suffix", tokens = unmapped.join(", ")));
				}
				message
			}
		}
	}
}

/// Parse the edit buffer into the kind the generator already has.
fn rebuild_kind(current: &GeneratorKind, sel: &Selection) -> (GeneratorKind, SaveSummary) {
	match current {
		GeneratorKind::List(_) => {
			let parsed = parse_generator_items(&sel.text);
			let summary = SaveSummary::List { items: parsed.items.len(), duplicates: parsed.duplicates };
			(GeneratorKind::List(parsed.items), summary)
		}
		GeneratorKind::Lexicon(_) => {
			let parsed = parse_lexicon_items(&sel.text);
			let summary = SaveSummary::Lexicon {
				entries: parsed.items.len(),
				duplicates: parsed.duplicates,
				rejected: parsed.rejected,
			};
			(GeneratorKind::Lexicon(parsed.items), summary)
		}
		GeneratorKind::Advanced(_) => {
			let template = Template { patterns: parse_patterns(&sel.text), ..sel.template.clone() };
			let summary = SaveSummary::Template {
				patterns: template.patterns.len(),
				unmapped: token::unmapped_tokens(&template),
			};
			(GeneratorKind::Advanced(template), summary)
		}
	}
}

/// Edit buffers of the selected generator.
struct Selection {
	id: String,
	name: String,
	folder: String,
	/// Items, lexicon lines or patterns, one per line.
	text: String,
	/// Token mappings while editing a template.
	template: Template,
}

pub struct Generators {
	uniform: crate::Uniform,

	store: GeneratorStore,
	folders: FolderState,
	selection: Option<Selection>,

	new_name: String,
	new_folder: String,
	new_kind: KindChoice,

	count: usize,
	output: Vec<String>,
	status: Status,
}

impl Generators {
	pub fn new(uniform: crate::Uniform) -> Self {
		let store = uniform.store.load_or_default::<GeneratorStore>(keys::GENERATORS);
		let folders = uniform.store.load_or_default::<FolderState>(keys::GENERATOR_FOLDERS);
		tracing::debug!(count = store.all().len(), "generators loaded");
		Self {
			uniform,
			store,
			folders,
			selection: None,
			new_name: String::new(),
			new_folder: String::new(),
			new_kind: KindChoice::List,
			count: 5,
			output: Vec::new(),
			status: Status::Idle,
		}
	}

	fn persist(&self) {
		self.uniform.store.save(keys::GENERATORS, &self.store);
	}

	fn select(&mut self, id: &str) {
		self.selection = self.store.get(id).map(|g| Selection {
			id: g.id.clone(),
			name: g.name.clone(),
			folder: g.folder.clone(),
			text: items_to_text(&g.kind),
			template: match &g.kind {
				GeneratorKind::Advanced(template) => template.clone(),
				_ => Template::default(),
			},
		});
		self.output.clear();
	}

	/// Write the edit buffers back, deduplicating items on the way.
	fn save_selection(&mut self) -> Option<SaveSummary> {
		let sel = self.selection.as_ref()?;
		let current = self.store.get(&sel.id)?;
		let (kind, summary) = rebuild_kind(&current.kind, sel);

		let id = sel.id.clone();
		let name = sel.name.trim().to_string();
		let folder = sel.folder.trim().to_string();
		self.store.set_kind(&id, kind);
		if !name.is_empty() {
			self.store.rename(&id, name);
		}
		self.store.move_to_folder(&id, folder);
		self.persist();
		self.select(&id);
		self.status = Status::info(summary.message());
		Some(summary)
	}

	fn create(&mut self) -> String {
		let id = self.store.create(self.new_name.trim(), self.new_folder.trim(), self.new_kind.empty());
		self.persist();
		self.new_name.clear();
		self.select(&id);
		id
	}

	fn delete(&mut self, id: &str) {
		if let Some(g) = self.store.delete(id) {
			self.persist();
			self.status = Status::info(tr!("status-deleted", name = g.name));
		}
		self.selection = None;
		self.output.clear();
	}

	fn generate(&mut self) {
		let Some(generator) = self.selection.as_ref().and_then(|s| self.store.get(&s.id)) else {
			return;
		};
		self.output = data::generator::generate(generator, self.store.all(), self.count, &mut rand::thread_rng());
		if self.output.is_empty() {
			self.status = Status::info(tr!("generator-empty"));
		}
	}

	fn export(&mut self) {
		let json = match self.store.export_json() {
			Ok(json) => json,
			Err(err) => {
				self.status = Status::error(err);
				return;
			}
		};
		match crate::util::files::save_json(&tr!("generator-export-title"), "generators.json", &json) {
			Some(Ok(path)) => self.status = Status::info(tr!("status-exported", path = path.display().to_string())),
			Some(Err(err)) => self.status = Status::error_chain(&err),
			None => {}
		}
	}

	fn import(&mut self, mode: ImportMode) {
		let json = match crate::util::files::open_json(&tr!("generator-import-title")) {
			Some(Ok(json)) => json,
			Some(Err(err)) => {
				self.status = Status::error_chain(&err);
				return;
			}
			None => return,
		};
		match self.store.import_json(&json, mode) {
			Ok(count) => {
				self.persist();
				self.selection = None;
				self.output.clear();
				self.status = Status::info(tr!("generator-imported", count = count));
			}
			Err(err) => self.status = Status::error(err),
		}
	}

	fn ui_list(&mut self, ui: &mut egui::Ui) {
		ui.horizontal(|ui| {
			if ui.button(tr!("action-export")).clicked() {
				self.export();
			}
			if ui.button(tr!("action-import-merge")).clicked() {
				self.import(ImportMode::Merge);
			}
			if ui.confirm_button("generators-import-replace", &tr!("action-import-replace")) {
				self.import(ImportMode::Replace);
			}
		});
		ui.separator();

		egui::Grid::new("new-generator").num_columns(2).show(ui, |ui| {
			ui.label(tr!("field-name"));
			ui.text_edit_singleline(&mut self.new_name);
			ui.end_row();
			ui.label(tr!("field-folder"));
			ui.text_edit_singleline(&mut self.new_folder);
			ui.end_row();
			ui.label(tr!("field-kind"));
			ui.horizontal(|ui| {
				for kind in KindChoice::ALL {
					ui.radio_value(&mut self.new_kind, kind, kind.label());
				}
			});
			ui.end_row();
		});
		if ui.add_enabled(!self.new_name.trim().is_empty(), egui::Button::new(tr!("generator-create"))).clicked() {
			self.create();
		}
		ui.separator();

		let mut clicked = None;
		let mut toggled = None;
		egui::ScrollArea::vertical().show(ui, |ui| {
			for folder in self.store.folders() {
				let label = if folder.is_empty() { tr!("generator-unfiled") } else { folder.clone() };
				let open = !self.folders.is_collapsed(&folder);
				let response = egui::CollapsingHeader::new(label)
					.id_salt(("generator-folder", &folder))
					.open(Some(open))
					.show(ui, |ui| {
						for g in self.store.in_folder(&folder) {
							let selected = self.selection.as_ref().is_some_and(|s| s.id == g.id);
							let text = format!("{} ({}, {})", g.name, g.kind.label(), g.kind.len());
							if ui.selectable_label(selected, text).clicked() {
								clicked = Some(g.id.clone());
							}
						}
					});
				if response.header_response.clicked() {
					toggled = Some(folder);
				}
			}
		});

		if let Some(folder) = toggled {
			self.folders.toggle(&folder);
			self.uniform.store.save(keys::GENERATOR_FOLDERS, &self.folders);
		}
		if let Some(id) = clicked {
			self.select(&id);
		}
	}

	fn ui_mapping(&mut self, ui: &mut egui::Ui) {
		let Some(sel) = &mut self.selection else { return };
		let sources = self
			.store
			.all()
			.iter()
			.filter(|g| g.id != sel.id && !matches!(g.kind, GeneratorKind::Advanced(_)))
			.map(|g| (g.id.clone(), g.name.clone()))
			.collect::<Vec<_>>();
		let name_of = |id: &str| {
			sources
				.iter()
				.find(|(sid, _)| sid == id)
				.map_or_else(|| tr!("generator-no-source"), |(_, name)| name.clone())
		};

		sel.template.patterns = parse_patterns(&sel.text);
		ui.checkbox(&mut sel.template.advanced_mode, tr!("generator-advanced-mode"));

		for tok in token::all_tokens(&sel.template) {
			ui.horizontal(|ui| {
				ui.monospace(format!("{{{tok}}}"));
				let current = sel.template.token_map.get(&tok).cloned().unwrap_or_default();
				egui::ComboBox::from_id_salt(("token-map", &tok))
					.selected_text(name_of(&current))
					.show_ui(ui, |ui| {
						let mut choice = current.clone();
						ui.selectable_value(&mut choice, String::new(), tr!("generator-no-source"));
						for (id, name) in &sources {
							ui.selectable_value(&mut choice, id.clone(), name.as_str());
						}
						if choice != current {
							if choice.is_empty() {
								sel.template.token_map.remove(&tok);
							} else {
								sel.template.token_map.insert(tok.clone(), choice);
							}
						}
					});
			});

			if sel.template.advanced_mode {
				ui.indent(("token-multi", &tok), |ui| {
					let ids = sel.template.multi_token_map.entry(tok.clone()).or_default();
					for (id, name) in &sources {
						let mut on = ids.contains(id);
						if ui.checkbox(&mut on, name.as_str()).changed() {
							if on {
								ids.push(id.clone());
							} else {
								ids.retain(|x| x != id);
							}
						}
					}
				});
			}
		}

		let unmapped = token::unmapped_tokens(&sel.template);
		if !unmapped.is_empty() {
			ui.colored_label(ui.visuals().warn_fg_color, tr!("generator-unmapped", tokens = unmapped.join(", ")));
		}
	}

	fn ui_editor(&mut self, ui: &mut egui::Ui) {
		let Some(sel) = &mut self.selection else {
			ui.label(tr!("generator-none-selected"));
			return;
		};
		let Some(kind) = self.store.get(&sel.id).map(|g| g.kind.label()) else {
			self.selection = None;
			return;
		};

		egui::Grid::new("generator-meta").num_columns(2).show(ui, |ui| {
			ui.label(tr!("field-name"));
			ui.text_edit_singleline(&mut sel.name);
			ui.end_row();
			ui.label(tr!("field-folder"));
			ui.text_edit_singleline(&mut sel.folder);
			ui.end_row();
		});

		let hint = match kind {
			"lexicon" => "english = valathi".to_string(),
			"advanced" => "{Prefix}{Suffix} of {Place}".to_string(),
			_ => tr!("generator-hint-list"),
		};
		ui.add(
			egui::TextEdit::multiline(&mut sel.text)
				.hint_text(hint)
				.desired_rows(10)
				.desired_width(f32::INFINITY),
		);

		if kind == "advanced" {
			self.ui_mapping(ui);
		}

		ui.horizontal(|ui| {
			if ui.button(tr!("action-save")).clicked() {
				self.save_selection();
			}
			let id = self.selection.as_ref().map(|s| s.id.clone()).unwrap_or_default();
			if ui.confirm_button(("delete-generator", &id), &tr!("action-delete")) {
				self.delete(&id);
			}
		});
		ui.status(&self.status);
		ui.separator();

		ui.horizontal(|ui| {
			ui.add(egui::DragValue::new(&mut self.count).range(1..=MAX_GENERATE));
			if ui.button(tr!("generator-generate")).clicked() {
				self.generate();
			}
			if !self.output.is_empty() && ui.button(tr!("generator-copy")).clicked() {
				ui.ctx().copy_text(self.output.join("\n"));
			}
		});
		egui::ScrollArea::vertical().id_salt("generator-output").show(ui, |ui| {
			for line in &self.output {
				ui.label(line);
			}
		});
	}
}

impl super::Module for Generators {
	fn name(&self) -> String {
		tr!("tab-generators")
	}

	fn ui(&mut self, ui: &mut egui::Ui) {
		egui::SidePanel::left("generator-list")
			.default_width(260.0)
			.show_inside(ui, |ui| self.ui_list(ui));
		egui::CentralPanel::default().show_inside(ui, |ui| {
			egui::ScrollArea::vertical().id_salt("generator-editor").show(ui, |ui| self.ui_editor(ui));
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn generators(dir: &tempfile::TempDir) -> Generators {
		Generators::new(crate::UniformData::in_dir(dir.path()))
	}

	fn create(g: &mut Generators, name: &str, kind: KindChoice) -> String {
		g.new_name = name.to_string();
		g.new_kind = kind;
		g.create()
	}

	#[test]
	fn list_save_dedupes_and_persists() {
		let dir = tempfile::tempdir().unwrap();
		let mut g = generators(&dir);
		g.new_folder = " Taverns ".into();
		let id = create(&mut g, "Tavern names", KindChoice::List);
		assert!(g.new_name.is_empty());

		if let Some(sel) = &mut g.selection {
			sel.text = "The Prancing Pony\nthe prancing pony\n\nGreen Dragon".into();
			sel.name = " Inns ".into();
		}
		assert_eq!(g.save_selection(), Some(SaveSummary::List { items: 2, duplicates: 1 }));

		let reloaded = generators(&dir);
		let saved = reloaded.store.get(&id).unwrap();
		assert_eq!(saved.name, "Inns");
		assert_eq!(saved.folder, "Taverns");
		assert_eq!(saved.kind, GeneratorKind::List(vec!["The Prancing Pony".into(), "Green Dragon".into()]));

		g.count = 3;
		g.generate();
		assert_eq!(g.output.len(), 3);
	}

	#[test]
	fn lexicon_save_counts_rejected_lines() {
		let dir = tempfile::tempdir().unwrap();
		let mut g = generators(&dir);
		create(&mut g, "Words", KindChoice::Lexicon);
		if let Some(sel) = &mut g.selection {
			sel.text = "fire = ignis\nFire = flamma\nno separator".into();
		}
		assert_eq!(
			g.save_selection(),
			Some(SaveSummary::Lexicon { entries: 1, duplicates: 1, rejected: 1 })
		);
	}

	#[test]
	fn template_save_reports_unmapped_tokens() {
		let dir = tempfile::tempdir().unwrap();
		let mut g = generators(&dir);
		let source = create(&mut g, "Prefixes", KindChoice::List);
		create(&mut g, "Town names", KindChoice::Advanced);
		if let Some(sel) = &mut g.selection {
			sel.text = "{Prefix}{Suffix}".into();
			sel.template.token_map.insert("Prefix".into(), source);
		}
		assert_eq!(
			g.save_selection(),
			Some(SaveSummary::Template { patterns: 1, unmapped: vec!["Suffix".to_string()] })
		);
	}

	#[test]
	fn nothing_selected_saves_nothing() {
		let dir = tempfile::tempdir().unwrap();
		let mut g = generators(&dir);
		assert_eq!(g.save_selection(), None);
		assert!(!g.uniform.store.contains(keys::GENERATORS));
	}

	#[test]
	fn delete_clears_selection() {
		let dir = tempfile::tempdir().unwrap();
		let mut g = generators(&dir);
		let id = create(&mut g, "Doomed", KindChoice::List);
		g.output.push("x".into());

		g.delete(&id);
		assert!(g.selection.is_none());
		assert!(g.output.is_empty());
		assert!(generators(&dir).store.all().is_empty());
	}
}
