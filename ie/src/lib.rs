mod image;
pub use self::image::{Color, Image, OwnedImage};
pub mod multipass;
mod ocr;
pub use ocr::TextRecognizer;
pub mod statblock;
pub use statblock::{StatBlockDraft, parse_stat_block};

pub struct Ie {
	ocr: ocr::Ocr,
}

impl Ie {
	pub fn try_new(
		ocr_detection: impl AsRef<std::path::Path>,
		ocr_recognition: impl AsRef<std::path::Path>,
		ocr_charsset: impl AsRef<std::path::Path>,
	) -> anyhow::Result<Self> {
		Ok(Self {
			ocr: ocr::Ocr::try_new(ocr_detection, ocr_recognition, ocr_charsset)?,
		})
	}

	/// Best OCR text of a screenshot over all preprocessing passes.
	pub fn read_text(&self, image: &OwnedImage, progress: impl FnMut(usize, usize)) -> anyhow::Result<multipass::Candidate> {
		multipass::run(image, &self.ocr, progress)
	}

	/// OCR a stat-block screenshot into a draft for review.
	pub fn read_stat_block(&self, image: &OwnedImage, progress: impl FnMut(usize, usize)) -> anyhow::Result<StatBlockDraft> {
		read_stat_block_with(&self.ocr, image, progress)
	}
}

pub fn read_stat_block_with(
	ocr: &impl TextRecognizer,
	image: &OwnedImage,
	progress: impl FnMut(usize, usize),
) -> anyhow::Result<StatBlockDraft> {
	let best = multipass::run(image, ocr, progress)?;
	tracing::info!(variant = best.variant.label(), split = best.split, score = best.score, "stat block OCR done");
	Ok(parse_stat_block(&best.text))
}
