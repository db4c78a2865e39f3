//! Key-value persistence.
//!
//! Every tool keeps its state as one JSON blob under its own key. Reads are
//! best-effort: a missing or corrupt blob falls back to the default value so a
//! damaged file can never keep a tool from opening.

use std::{
	fs::File,
	io::{BufReader, BufWriter, Write},
	path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};

/// Storage keys used by the tools.
pub mod keys {
	pub const GENERATORS: &str = "generators";
	pub const GENERATOR_FOLDERS: &str = "generator-folders";
	pub const ENCOUNTER: &str = "encounter";
	pub const PARTY: &str = "party";
	pub const MONSTER_VAULT: &str = "monster-vault";
	pub const MAP_MEASURER: &str = "map-measurer";
	pub const STATBLOCK_DRAFTS: &str = "statblock-drafts";
}

#[derive(Debug, Clone)]
pub struct Store {
	dir: PathBuf,
}

impl Store {
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	/// Store rooted in the platform data directory (`<data_dir>/TableKit`).
	pub fn default_location() -> Result<Self> {
		let base = dirs::data_dir().context("data_dir() unavailable")?;
		Ok(Self::new(base.join("TableKit")))
	}

	pub fn dir(&self) -> &Path {
		&self.dir
	}

	fn path(&self, key: &str) -> PathBuf {
		self.dir.join(format!("{key}.json"))
	}

	pub fn contains(&self, key: &str) -> bool {
		self.path(key).is_file()
	}

	/// Read and decode a blob. A missing blob is `Ok(None)`.
	pub fn try_load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
		let path = self.path(key);
		if !path.exists() {
			return Ok(None);
		}
		let file = File::open(&path).with_context(|| format!("open {}", path.display()))?;
		let value = serde_json::from_reader(BufReader::new(file))
			.with_context(|| format!("parse {}", path.display()))?;
		Ok(Some(value))
	}

	/// Read a blob, falling back to `T::default()` on any failure.
	pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
		match self.try_load(key) {
			Ok(Some(value)) => value,
			Ok(None) => T::default(),
			Err(err) => {
				tracing::warn!(key, error = %err, "failed to load stored state; using defaults");
				T::default()
			}
		}
	}

	/// Write a blob through a temp file so a crash never leaves half a file behind.
	pub fn try_save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
		std::fs::create_dir_all(&self.dir)
			.with_context(|| format!("create {}", self.dir.display()))?;

		let path = self.path(key);
		let tmp = path.with_extension("json.tmp");
		let file = File::create(&tmp).with_context(|| format!("write {}", tmp.display()))?;
		let mut writer = BufWriter::new(file);
		serde_json::to_writer_pretty(&mut writer, value).with_context(|| format!("serialize {key}"))?;
		writer.flush().with_context(|| format!("flush {}", tmp.display()))?;
		drop(writer);

		// Replace existing file (Windows-friendly).
		if std::fs::rename(&tmp, &path).is_err() {
			let _ = std::fs::remove_file(&path);
			std::fs::rename(&tmp, &path).with_context(|| format!("persist {}", path.display()))?;
		}
		Ok(())
	}

	/// Best-effort write; failures are logged and otherwise ignored.
	pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
		if let Err(err) = self.try_save(key, value) {
			tracing::warn!(key, error = %err, "failed to persist state");
		}
	}

	pub fn remove(&self, key: &str) -> Result<()> {
		let path = self.path(key);
		if path.exists() {
			std::fs::remove_file(&path).with_context(|| format!("remove {}", path.display()))?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
	struct Sample {
		name: String,
		count: u32,
	}

	#[test]
	fn round_trips_a_blob() {
		let dir = tempfile::tempdir().unwrap();
		let store = Store::new(dir.path());
		let value = Sample { name: "goblin".into(), count: 3 };

		store.try_save("sample", &value).unwrap();

		assert!(store.contains("sample"));
		assert_eq!(store.load_or_default::<Sample>("sample"), value);
	}

	#[test]
	fn missing_blob_is_default() {
		let dir = tempfile::tempdir().unwrap();
		let store = Store::new(dir.path());

		assert_eq!(store.try_load::<Sample>("nothing").unwrap(), None);
		assert_eq!(store.load_or_default::<Sample>("nothing"), Sample::default());
	}

	#[test]
	fn corrupt_blob_falls_back_to_default() {
		let dir = tempfile::tempdir().unwrap();
		let store = Store::new(dir.path());
		std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

		assert!(store.try_load::<Sample>("broken").is_err());
		assert_eq!(store.load_or_default::<Sample>("broken"), Sample::default());
	}

	#[test]
	fn remove_deletes_the_blob() {
		let dir = tempfile::tempdir().unwrap();
		let store = Store::new(dir.path());
		store.try_save("gone", &Sample::default()).unwrap();

		store.remove("gone").unwrap();

		assert!(!store.contains("gone"));
	}
}
