use std::sync::{Arc, Mutex};
use std::time::Duration;

mod ext;
pub use ext::{Status, UiExt};

mod settings;

pub struct TableKit {
	modules: Vec<Box<dyn crate::module::Module>>,
	tab: Tab,
}

impl TableKit {
	pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
		let config = crate::config_read();

		// Apply UI zoom (in addition to OS DPI scaling).
		cc.egui_ctx.set_zoom_factor(config.ui_zoom_factor);

		let store = config.store();
		tracing::info!(dir = %store.dir().display(), "using data store");

		let ocr = crate::util::assets::load_ocr(config.ocr_dir.as_deref())
			.map(Arc::new)
			.map_err(|err| {
				tracing::warn!(error = %err, "OCR disabled");
				format!("{err:#}")
			});

		let state = store.load_or_default::<data::VaultState>(data::keys::MONSTER_VAULT);
		let vault = data::Vault::new(state.clone()).unwrap_or_else(|err| {
			tracing::warn!(error = %err, "bundled SRD data unreadable; vault starts with homebrew only");
			data::Vault::with_srd(Vec::new(), state)
		});

		let uniform = Arc::new(crate::UniformData {
			store,
			ocr,
			vault: Mutex::new(vault),
		});

		let modules: Vec<Box<dyn crate::module::Module>> = vec![
			Box::new(crate::module::Generators::new(uniform.clone())),
			Box::new(crate::module::Dice::new()),
			Box::new(crate::module::EncounterTracker::new(uniform.clone())),
			Box::new(crate::module::MonsterVault::new(uniform.clone())),
			Box::new(crate::module::MapMeasurer::new(uniform.clone())),
			Box::new(crate::module::StatBlockImport::new(uniform)),
		];

		Self {
			modules,
			tab: Tab::Module(0),
		}
	}
}

impl eframe::App for TableKit {
	fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
		// Background results first so this frame already shows them.
		for module in &mut self.modules {
			module.tick();
		}

		// Apply zoom changes if user updated config while running.
		let zoom = crate::config().ui_zoom_factor;
		if (ctx.zoom_factor() - zoom).abs() > f32::EPSILON {
			ctx.set_zoom_factor(zoom);
		}

		egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
			ui.horizontal(|ui| {
				for (i, module) in self.modules.iter().enumerate() {
					ui.selectable_value(&mut self.tab, Tab::Module(i), module.name());
				}
				ui.separator();
				ui.selectable_value(&mut self.tab, Tab::Settings, crate::tr!("tab-settings"));
			});
		});

		egui::CentralPanel::default().show(ctx, |ui| match self.tab {
			Tab::Module(i) => {
				if let Some(module) = self.modules.get_mut(i) {
					module.ui(ui);
				}
			}
			Tab::Settings => {
				egui::ScrollArea::vertical().show(ui, |ui| settings::ui(ui, &mut self.modules));
			}
		});

		// Keep polling while background work is running.
		if self.modules.iter().any(|m| m.busy()) {
			ctx.request_repaint_after(Duration::from_millis(100));
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tab {
	Module(usize),
	Settings,
}
