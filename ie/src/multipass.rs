//! Multi-pass OCR over preprocessed variants of a screenshot.
//!
//! Every variant is recognised once over the whole image and, when a column
//! gutter is found, once more as a left column followed by a right column.
//! The candidate text that looks most like a stat block wins.

use anyhow::{Result, bail};
use imageproc::contrast::{ThresholdType, equalize_histogram, otsu_level, threshold};
use imageproc::filter::{median_filter, sharpen3x3};

use crate::ocr::TextRecognizer;
use crate::{Image, OwnedImage};

/// Screenshots narrower than this are upscaled before recognition.
const MIN_WIDTH: u32 = 1200;
const MAX_UPSCALE: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Raw,
    /// Grayscale, histogram equalised and median denoised.
    Enhanced,
    /// Sharpened then Otsu thresholded to dark text on a light background.
    Binarized,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Raw, Variant::Enhanced, Variant::Binarized];

    pub fn label(self) -> &'static str {
        match self {
            Variant::Raw => "raw",
            Variant::Enhanced => "enhanced",
            Variant::Binarized => "binarized",
        }
    }

    pub fn apply(self, base: &OwnedImage) -> OwnedImage {
        match self {
            Variant::Raw => base.clone(),
            Variant::Enhanced => {
                let gray = equalize_histogram(&base.to_gray_image());
                OwnedImage::from_gray_as_rgb(&median_filter(&gray, 1, 1))
            }
            Variant::Binarized => {
                let gray = sharpen3x3(&base.to_gray_image());
                let level = otsu_level(&gray);
                let bin = threshold(&gray, level, ThresholdType::Binary);
                OwnedImage::from_gray_as_rgb(&ensure_dark_text_on_light(bin))
            }
        }
    }
}

fn ensure_dark_text_on_light(mut bin: image::GrayImage) -> image::GrayImage {
    // If the image is mostly black, invert it so background becomes light.
    let black = bin.pixels().filter(|p| p.0[0] == 0).count();
    if black * 2 > (bin.width() * bin.height()) as usize {
        for p in bin.pixels_mut() {
            p.0[0] = 255u8.saturating_sub(p.0[0]);
        }
    }
    bin
}

// ----------

/// Find a vertical gutter separating two text columns.
///
/// Only the middle band of the image is searched. A gutter is the widest run
/// of columns with (almost) no ink, and both sides of it must carry ink.
/// Returns the x coordinate of the gutter's centre.
pub fn find_column_gutter(gray: &image::GrayImage) -> Option<u32> {
    let (width, height) = gray.dimensions();
    if width < 200 || height == 0 {
        return None;
    }

    let level = otsu_level(gray);
    let bright = gray.pixels().filter(|p| p.0[0] > level).count();
    let light_background = bright * 2 >= (width * height) as usize;
    let is_ink = |v: u8| if light_background { v <= level } else { v > level };

    let ink: Vec<u32> = (0..width)
        .map(|x| (0..height).filter(|&y| is_ink(gray.get_pixel(x, y).0[0])).count() as u32)
        .collect();
    let quiet = (height / 200).max(1);

    let (lo, hi) = (width * 35 / 100, width * 65 / 100);
    let mut best: Option<(u32, u32)> = None;
    let mut run_start = None;
    for x in lo..=hi {
        let empty = x < hi && ink[x as usize] <= quiet;
        match (empty, run_start) {
            (true, None) => run_start = Some(x),
            (false, Some(start)) => {
                let len = x - start;
                if best.is_none_or(|(_, l)| len > l) {
                    best = Some((start, len));
                }
                run_start = None;
            }
            _ => {}
        }
    }

    let (start, len) = best?;
    if len < (width / 40).max(4) {
        return None;
    }
    let left_ink: u32 = ink[..start as usize].iter().sum();
    let right_ink: u32 = ink[(start + len) as usize..].iter().sum();
    (left_ink > 0 && right_ink > 0).then_some(start + len / 2)
}

// ----------

const KEYWORDS: &[&str] = &[
    "armor class",
    "hit points",
    "speed",
    "str",
    "dex",
    "con",
    "int",
    "wis",
    "cha",
    "saving throws",
    "skills",
    "senses",
    "languages",
    "challenge",
    "proficiency bonus",
    "damage resistances",
    "damage immunities",
    "condition immunities",
    "actions",
    "reactions",
    "legendary actions",
    "multiattack",
    "weapon attack",
    "hit:",
];

const COMMON_PUNCTUATION: &str = ".,;:'\"()[]+-/%!?&*\u{2019}\u{2013}\u{2014}";

/// Score a candidate text by how much it looks like a stat block.
///
/// +10 per distinct keyword, +1 per ten alphanumerics, -3 per unusual character.
pub fn score_statblock_text(text: &str) -> i64 {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric() && c != ':')
        .filter(|w| !w.is_empty())
        .collect();

    let mut score = 0i64;
    for keyword in KEYWORDS {
        let found = if keyword.contains(' ') || keyword.ends_with(':') {
            lower.contains(keyword)
        } else {
            words.contains(keyword)
        };
        if found {
            score += 10;
        }
    }

    let mut alnum = 0i64;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            alnum += 1;
        } else if !ch.is_whitespace() && !COMMON_PUNCTUATION.contains(ch) {
            score -= 3;
        }
    }
    score + alnum / 10
}

// ----------

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub variant: Variant,
    pub split: bool,
    pub text: String,
    pub score: i64,
}

/// Run every pass sequentially and return the best candidate.
///
/// `progress` receives `(done, total)` after each pass. Failing passes are
/// logged and skipped; an error is only returned if every pass failed.
pub fn run(
    image: &OwnedImage,
    ocr: &impl TextRecognizer,
    mut progress: impl FnMut(usize, usize),
) -> Result<Candidate> {
    let base = image.clone().upscaled_to_width(MIN_WIDTH, MAX_UPSCALE)?;
    let gutter = find_column_gutter(&base.to_gray_image());
    if let Some(x) = gutter {
        tracing::debug!(x, "column gutter found");
    }

    let total = Variant::ALL.len() * if gutter.is_some() { 2 } else { 1 };
    let mut done = 0;
    let mut best: Option<Candidate> = None;
    let mut last_err = None;

    for variant in Variant::ALL {
        let prepared = variant.apply(&base);
        let view = prepared.as_image();

        for split in [false, true] {
            let result = match (split, gutter) {
                (false, _) => ocr.recognize(view),
                (true, Some(x)) => recognize_columns(view, x, ocr),
                (true, None) => continue,
            };
            done += 1;
            progress(done, total);
            match result {
                Ok(text) => {
                    let score = score_statblock_text(&text);
                    tracing::debug!(variant = variant.label(), split, score, "OCR pass");
                    if best.as_ref().is_none_or(|b| score > b.score) {
                        best = Some(Candidate { variant, split, text, score });
                    }
                }
                Err(err) => {
                    tracing::warn!(variant = variant.label(), split, error = %err, "OCR pass failed");
                    last_err = Some(err);
                }
            }
        }
    }

    match (best, last_err) {
        (Some(best), _) => Ok(best),
        (None, Some(err)) => Err(err),
        (None, None) => bail!("no OCR passes ran"),
    }
}

fn recognize_columns(view: Image, x: u32, ocr: &impl TextRecognizer) -> Result<String> {
    let (left, right) = view.split_at_column(x);
    let left = ocr.recognize(left)?;
    let right = ocr.recognize(right)?;
    Ok(format!("{left}\n{right}"))
}
