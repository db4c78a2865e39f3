//! OCR wrapper.
//!
//! The project relies on `ocr-rs` (Rust PaddleOCR bindings). Preprocessing
//! happens in `multipass` before calling into this module.

use std::path::Path;

use anyhow::{Context, Result};

/// Something that turns an image into text. The multi-pass runner only needs this.
pub trait TextRecognizer {
    fn recognize(&self, image: crate::Image) -> Result<String>;
}

pub struct Ocr {
    engine: ocr_rs::OcrEngine,
}

impl Ocr {
    /// Initialize the OCR engine with the given model paths.
    pub fn try_new(
        detection: impl AsRef<Path>,
        recognition: impl AsRef<Path>,
        charsset: impl AsRef<Path>,
    ) -> Result<Self> {
        let thread_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        let engine = ocr_rs::OcrEngine::new(
            detection,
            recognition,
            charsset,
            Some(ocr_rs::OcrEngineConfig {
                backend: ocr_rs::Backend::CPU,
                thread_count,
                // Stat blocks use small serif fonts; High pays off there.
                precision_mode: ocr_rs::PrecisionMode::High,
                enable_parallel: thread_count > 1,
                min_result_confidence: 0.5,
                ..Default::default()
            }),
        )
        .context("failed to initialize OCR engine (missing or invalid model files?)")?;

        Ok(Self { engine })
    }
}

impl TextRecognizer for Ocr {
    /// Recognize text lines from an RGB image view, one line per detected box.
    fn recognize(&self, image: crate::Image) -> Result<String> {
        let image = ocr_rs::preprocess::rgb_to_image(&image.get_bytes(), image.width(), image.height());

        let results = self.engine.recognize(&image).context("OCR recognition")?;
        Ok(results
            .into_iter()
            .map(|v| v.text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
