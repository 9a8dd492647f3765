//! Text recognition pipeline.
//!
//! This module provides:
//! - Frame enhancement for the second-chance attempt (`preprocess`)
//! - Tesseract invocation (`engine`) and engine/language setup (`setup`)
//! - Field extraction from recognized text (`extract`)
//! - The multi-strategy runner (`recognize_document`)

pub mod engine;
pub mod extract;
pub mod preprocess;
pub mod setup;

pub use engine::OcrConfig;
pub use extract::{CandidateRecord, FieldKind};
pub use setup::ensure_language;

use image::{DynamicImage, RgbImage};

/// Trimmed recognition output must exceed this many characters to count as
/// usable text.
const MIN_USEFUL_LEN: usize = 3;

/// Anything the orchestrator can turn frames into text with. Total: "no
/// text" is an empty string, never an error.
pub trait TextRecognizer {
    fn recognize(&mut self, frame: &RgbImage) -> String;
}

/// The production recognizer: multi-strategy Tesseract runs.
pub struct TesseractRecognizer {
    lang: String,
}

impl TesseractRecognizer {
    pub fn new(lang: String) -> Self {
        Self { lang }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&mut self, frame: &RgbImage) -> String {
        recognize_document(frame, &self.lang)
    }
}

/// Runs recognition strategies against a frame and returns the best text
/// (possibly empty). Never fails: per-attempt engine errors count as empty
/// output for that attempt.
///
/// The raw frame is tried first with default settings; that is the common,
/// cheap-success case and over-processing already-legible text degrades it.
/// Only when the plain attempt yields nothing useful is the frame enhanced,
/// moderately upscaled and retried under each page-segmentation config. The
/// longest trimmed output wins; false positives are filtered downstream by
/// the extraction engine, not here.
pub fn recognize_document(frame: &RgbImage, lang: &str) -> String {
    let plain = DynamicImage::ImageRgb8(frame.clone());
    let fast = OcrConfig {
        lang: Some(lang),
        psm: None,
    };

    if let Ok(text) = engine::recognize(&plain, &fast) {
        let text = text.trim();
        if text.chars().count() > MIN_USEFUL_LEN {
            return text.to_string();
        }
    }

    let enhanced = preprocess::enhance(frame);
    let upscaled = DynamicImage::ImageLuma8(preprocess::upscale(&enhanced));

    // Distinct page-segmentation assumptions, in priority order: block of
    // text, single line, single word, then engine-default language passes.
    let attempts = [
        OcrConfig { lang: Some(lang), psm: Some(6) },
        OcrConfig { lang: Some(lang), psm: Some(7) },
        OcrConfig { lang: Some(lang), psm: Some(8) },
        OcrConfig { lang: None, psm: Some(6) },
        OcrConfig { lang: None, psm: Some(13) },
    ];

    let mut best = String::new();
    for config in &attempts {
        if let Ok(text) = engine::recognize(&upscaled, config) {
            let text = text.trim();
            if text.chars().count() > best.chars().count() {
                best = text.to_string();
            }
        }
    }

    best
}
