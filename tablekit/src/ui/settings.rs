use std::path::PathBuf;

use crate::ui::ext::UiExt;

fn path_edit(ui: &mut egui::Ui, value: &mut Option<PathBuf>, label: &str) -> bool {
	let mut changed = false;
	ui.horizontal(|ui| {
		let mut text = value.as_ref().map(|p| p.display().to_string()).unwrap_or_default();
		if ui.text_edit_singleline(&mut text).changed() {
			*value = (!text.trim().is_empty()).then(|| PathBuf::from(text.trim()));
			changed = true;
		}
		if ui.button("…").clicked()
			&& let Some(dir) = rfd::FileDialog::new().pick_folder()
		{
			*value = Some(dir);
			changed = true;
		}
		ui.label(label);
	});
	changed
}

pub fn ui(ui: &mut egui::Ui, modules: &mut [Box<dyn crate::module::Module>]) {
	let mut config = crate::config();
	let mut changed = false;

	changed |= ui
		.num_edit_range(&mut config.ui_zoom_factor, &crate::tr!("settings-zoom"), 0.5..=3.0)
		.changed();

	ui.horizontal(|ui| {
		let mut locale = config.locale.clone().unwrap_or_default();
		if ui.text_edit_singleline(&mut locale).lost_focus() {
			let locale = (!locale.trim().is_empty()).then(|| locale.trim().to_string());
			if locale != config.locale {
				crate::i18n::set_locale(locale.as_deref());
				config.locale = locale;
				changed = true;
			}
		}
		ui.label(crate::tr!("settings-locale"));
	});

	ui.separator();
	ui.label(crate::tr!("settings-storage-heading"));
	changed |= path_edit(ui, &mut config.storage_dir, &crate::tr!("settings-storage-dir"));
	changed |= path_edit(ui, &mut config.ocr_dir, &crate::tr!("settings-ocr-dir"));
	ui.small(crate::tr!("settings-restart-note"));

	for module in modules {
		ui.spacer();
		changed |= module.ui_settings(ui, &mut config);
	}

	if changed && let Err(err) = config.save() {
		tracing::warn!(error = %err, "failed to save config");
	}
}
