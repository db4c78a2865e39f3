//! TableKit: game master tools for tabletop sessions.
//!
//! The binary hosts the egui shell. Every tool is a [`module::Module`] that
//! owns its own state and persists it through the shared [`data::Store`].

use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

mod config;
mod i18n;
mod module;
mod ui;
mod util;

pub use ui::UiExt;

static CONFIG: LazyLock<Mutex<config::Config>> = LazyLock::new(|| Mutex::new(config::Config::load_or_default()));

/// Lock the global config for editing.
pub fn config() -> MutexGuard<'static, config::Config> {
	CONFIG.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Snapshot of the global config.
pub fn config_read() -> config::Config {
	config().clone()
}

pub type Uniform = Arc<UniformData>;

/// State shared by every tool.
pub struct UniformData {
	pub store: data::Store,
	/// OCR engine, or the reason it could not be loaded.
	pub ocr: Result<Arc<ie::Ie>, String>,
	vault: Mutex<data::Vault>,
}

impl UniformData {
	pub fn vault(&self) -> MutexGuard<'_, data::Vault> {
		self.vault.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	pub fn save_vault(&self, vault: &data::Vault) {
		self.store.save(data::keys::MONSTER_VAULT, &vault.state);
	}

	/// Shared state over `dir` with an empty vault and no OCR engine.
	#[cfg(test)]
	pub fn in_dir(dir: &std::path::Path) -> Uniform {
		Arc::new(Self {
			store: data::Store::new(dir),
			ocr: Err("OCR is not loaded in tests".to_string()),
			vault: Mutex::new(data::Vault::with_srd(Vec::new(), data::VaultState::default())),
		})
	}
}

fn main() -> eframe::Result {
	// Structured logging. Use `RUST_LOG=info` etc.
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.init();

	let locale = config_read().locale;
	i18n::init(locale.as_deref());

	let options = eframe::NativeOptions {
		viewport: egui::ViewportBuilder::default()
			.with_inner_size([1180.0, 780.0])
			.with_title(tr!("app-title")),
		..Default::default()
	};

	eframe::run_native(
		"TableKit",
		options,
		Box::new(|cc| Ok(Box::new(ui::TableKit::new(cc)))),
	)
}
