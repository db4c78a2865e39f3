//! Persistent application configuration.
//!
//! Stored as JSON in a platform-appropriate config directory.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// On-disk configuration for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Extra UI zoom on top of OS DPI scaling.
	pub ui_zoom_factor: f32,

	/// Where tool data is kept. `None` means `<data_dir>/TableKit`.
	pub storage_dir: Option<PathBuf>,

	/// Folder holding the OCR models. Searched before the default locations.
	pub ocr_dir: Option<PathBuf>,

	/// Number of dice rolls kept in the history.
	pub dice_history_len: usize,

	/// Allow fetching SRD monster details from the public 5e API.
	pub fetch_monster_details: bool,

	/// Forced UI locale such as `"en"`. `None` follows the system.
	pub locale: Option<String>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			ui_zoom_factor: 1.0,
			storage_dir: None,
			ocr_dir: None,
			dice_history_len: 50,
			fetch_monster_details: true,
			locale: None,
		}
	}
}

impl Config {
	/// Path to the config file.
	pub fn path() -> Result<PathBuf> {
		let base = dirs::config_dir().context("config_dir() unavailable")?;
		Ok(base.join("tablekit.json"))
	}

	/// Load configuration from disk, falling back to defaults on any failure.
	pub fn load_or_default() -> Self {
		match Self::try_load() {
			Ok(cfg) => cfg,
			Err(err) => {
				tracing::warn!(error = %err, "failed to load config; using defaults");
				Self::default()
			}
		}
	}

	/// Try to load configuration from disk. A missing file yields the defaults.
	pub fn try_load() -> Result<Self> {
		let path = Self::path()?;
		if !path.exists() {
			return Ok(Self::default());
		}
		let json = fs::read_to_string(&path).with_context(|| format!("read {:?}", path))?;
		let cfg = serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?;
		Ok(cfg)
	}

	/// Save configuration to disk.
	pub fn save(&self) -> Result<()> {
		let path = Self::path()?;
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
		}
		let json = serde_json::to_string_pretty(self).context("serialize config")?;
		fs::write(&path, json).with_context(|| format!("write {:?}", path))?;
		Ok(())
	}

	/// The data store this config points at.
	pub fn store(&self) -> data::Store {
		if let Some(dir) = &self.storage_dir {
			return data::Store::new(dir);
		}
		data::Store::default_location().unwrap_or_else(|err| {
			tracing::warn!(error = %err, "no platform data dir; storing next to the working directory");
			data::Store::new("tablekit-data")
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_config_fills_defaults() {
		let cfg: Config = serde_json::from_str(r#"{"dice_history_len": 10}"#).unwrap();
		assert_eq!(cfg.dice_history_len, 10);
		assert_eq!(cfg.ui_zoom_factor, 1.0);
		assert!(cfg.fetch_monster_details);
		assert!(cfg.locale.is_none());
	}

	#[test]
	fn storage_override_is_used() {
		let cfg = Config { storage_dir: Some(PathBuf::from("/tmp/tk")), ..Config::default() };
		assert_eq!(cfg.store().dir(), std::path::Path::new("/tmp/tk"));
	}
}
