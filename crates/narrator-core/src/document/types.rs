//! Page, fragment and sentence model produced from an opened document.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Width estimate per character when the engine reports no width.
pub const FALLBACK_CHAR_WIDTH: f32 = 8.0;
/// Height estimate when the engine reports no height.
pub const FALLBACK_HEIGHT: f32 = 12.0;

/// Rendered page raster handed back by the PDF engine.
pub type Bitmap = image::RgbaImage;

/// A run of extracted text with its position on the page.
///
/// `x`/`y` are the baseline origin in unscaled page space, with Y measured
/// from the bottom edge of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TextFragment {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    pub source_index: usize,
    pub page_number: usize,
}

impl TextFragment {
    /// Build a fragment, estimating missing or non-positive dimensions.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        text: impl Into<String>,
        x: f32,
        y: f32,
        width: Option<f32>,
        height: Option<f32>,
        font_size: f32,
        source_index: usize,
        page_number: usize,
    ) -> Self {
        let text = text.into();
        let width = width
            .filter(|w| w.is_finite() && *w > 0.0)
            .unwrap_or_else(|| FALLBACK_CHAR_WIDTH * text.chars().count() as f32);
        let height = height
            .filter(|h| h.is_finite() && *h > 0.0)
            .unwrap_or(FALLBACK_HEIGHT);
        Self {
            text,
            x,
            y,
            width,
            height,
            font_size,
            source_index,
            page_number,
        }
    }
}

/// Pixel dimensions of a page rendered at a particular scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RenderedSize {
    pub width: u32,
    pub height: u32,
}

impl RenderedSize {
    pub fn from_points(width_pt: f32, height_pt: f32, scale: f32) -> Self {
        Self {
            width: (width_pt * scale).round().max(1.0) as u32,
            height: (height_pt * scale).round().max(1.0) as u32,
        }
    }
}

/// Per-page extraction result; cached for the lifetime of a zoom scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-indexed.
    pub page_number: usize,
    pub fragments: Vec<TextFragment>,
    pub rendered_size: RenderedSize,
}

pub fn page_text(fragments: &[TextFragment]) -> String {
    fragments.iter().map(|fragment| fragment.text.as_str()).collect()
}

/// One entry of the document-wide sentence sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct Sentence {
    pub index: usize,
    pub text: String,
}
