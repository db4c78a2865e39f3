use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

/// Recognition model set shipped with the app.
pub const OCR_LANGUAGE: &str = "latin";

#[derive(Debug, Clone)]
pub struct OcrAssets {
	pub detection: PathBuf,
	pub recognition: PathBuf,
	pub charset: PathBuf,
}

fn normalize_ocr_dir(dir: PathBuf) -> PathBuf {
	// Accept either the app root (containing `ocr/`) or the `ocr/` folder itself.
	if dir.join("detection.mnn").is_file() {
		dir
	} else {
		dir.join("ocr")
	}
}

fn candidate_dirs(configured: Option<&Path>) -> Vec<PathBuf> {
	let mut candidates = Vec::new();
	if let Some(dir) = std::env::var_os("TABLEKIT_ASSETS_DIR") {
		candidates.push(PathBuf::from(dir));
	}
	if let Some(dir) = configured {
		candidates.push(dir.to_path_buf());
	}
	if let Ok(exe) = std::env::current_exe()
		&& let Some(dir) = exe.parent()
	{
		candidates.push(dir.to_path_buf());
	}
	if let Ok(cwd) = std::env::current_dir() {
		candidates.push(cwd);
	}
	// Workspace root during local development.
	#[cfg(debug_assertions)]
	candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".."));
	candidates
}

/// Resolve OCR model paths.
///
/// Searched in order: `TABLEKIT_ASSETS_DIR`, the configured OCR folder,
/// next to the executable, then the working directory.
pub fn resolve_ocr_assets(lang_code: &str, configured: Option<&Path>) -> Result<OcrAssets> {
	find_in(&candidate_dirs(configured), lang_code)
}

fn find_in(candidates: &[PathBuf], lang_code: &str) -> Result<OcrAssets> {
	let recognition_name = format!("{lang_code}_recognition.mnn");
	let charset_name = format!("{lang_code}_charset.txt");

	let mut tried = Vec::new();
	for base in candidates {
		let ocr_dir = normalize_ocr_dir(base.clone());
		let detection = ocr_dir.join("detection.mnn");
		let recognition = ocr_dir.join(&recognition_name);
		let charset = ocr_dir.join(&charset_name);

		if detection.is_file() && recognition.is_file() && charset.is_file() {
			return Ok(OcrAssets { detection, recognition, charset });
		}

		tried.push(ocr_dir);
	}

	bail!(
		"OCR model files not found. Expected these files:\n  - ocr/detection.mnn\n  - ocr/{recognition_name}\n  - ocr/{charset_name}\n\nSearched in:\n{}\n\nFix: copy the 'ocr/' folder next to the executable, pick it in Settings, or set TABLEKIT_ASSETS_DIR.",
		tried
			.into_iter()
			.map(|p| format!("  - {}", p.display()))
			.collect::<Vec<_>>()
			.join("\n")
	)
}

/// Load the OCR engine, returning a readable reason on failure.
pub fn load_ocr(configured: Option<&Path>) -> Result<ie::Ie> {
	let assets = resolve_ocr_assets(OCR_LANGUAGE, configured)?;
	tracing::info!(detection = %assets.detection.display(), "loading OCR models");
	ie::Ie::try_new(&assets.detection, &assets.recognition, &assets.charset)
}

#[cfg(test)]
mod tests {
	use std::fs;

	use super::*;

	fn touch(path: &Path) {
		fs::write(path, b"").unwrap();
	}

	#[test]
	fn finds_models_in_ocr_subfolder() {
		let dir = tempfile::tempdir().unwrap();
		let root = dir.path().to_path_buf();
		let ocr = root.join("ocr");
		fs::create_dir_all(&ocr).unwrap();
		touch(&ocr.join("detection.mnn"));
		touch(&ocr.join("latin_recognition.mnn"));
		touch(&ocr.join("latin_charset.txt"));

		let found = find_in(&[PathBuf::from("/nonexistent"), root.clone()], "latin").unwrap();
		assert_eq!(found.charset, ocr.join("latin_charset.txt"));

		let err = find_in(&[root.clone()], "greek").unwrap_err().to_string();
		assert!(err.contains("greek_recognition.mnn"));
		assert!(err.contains(&ocr.display().to_string()));
	}
}
