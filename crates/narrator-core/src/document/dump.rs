//! PDF engine backed by a pre-extracted JSON dump.
//!
//! Browser front-ends run the real rasterizer and text extractor; what reaches
//! this crate is the per-page geometry and the text items in the shape the
//! extractor reports them (`str`, baseline `x`/`y`, optional `width`/`height`,
//! `fontSize`). Rendering yields a blank page raster at the requested scale so
//! the highlight overlay has something of the right size to sit on.

use super::error::{ReaderError, ReaderResult};
use super::traits::{PdfDocument, PdfEngine, PdfPage};
use super::types::{Bitmap, RenderedSize, TextFragment};
use image::Rgba;
use serde::Deserialize;
use tracing::{debug, info};

const DEFAULT_FONT_SIZE: f32 = 12.0;

#[derive(Debug, Clone, Deserialize)]
struct DumpFile {
    pages: Vec<DumpPage>,
}

#[derive(Debug, Clone, Deserialize)]
struct DumpPage {
    width: f32,
    height: f32,
    #[serde(default)]
    items: Vec<DumpItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DumpItem {
    #[serde(rename = "str")]
    text: String,
    x: f32,
    y: f32,
    #[serde(default)]
    width: Option<f32>,
    #[serde(default)]
    height: Option<f32>,
    #[serde(default)]
    font_size: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct DumpEngine;

impl DumpEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PdfEngine for DumpEngine {
    fn open(&self, bytes: &[u8]) -> ReaderResult<Box<dyn PdfDocument>> {
        let dump: DumpFile = serde_json::from_slice(bytes)
            .map_err(|err| ReaderError::InvalidFormat(format!("unreadable dump: {err}")))?;
        if dump.pages.is_empty() {
            return Err(ReaderError::InvalidFormat(
                "document contains no pages".to_string(),
            ));
        }
        if let Some((idx, _)) = dump
            .pages
            .iter()
            .enumerate()
            .find(|(_, page)| !(page.width > 0.0 && page.height > 0.0))
        {
            return Err(ReaderError::InvalidFormat(format!(
                "page {} has non-positive dimensions",
                idx + 1
            )));
        }
        info!(pages = dump.pages.len(), "Opened extracted document dump");
        Ok(Box::new(DumpDocument { pages: dump.pages }))
    }
}

pub struct DumpDocument {
    pages: Vec<DumpPage>,
}

impl PdfDocument for DumpDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, page_number: usize) -> ReaderResult<Box<dyn PdfPage + '_>> {
        let page = page_number
            .checked_sub(1)
            .and_then(|idx| self.pages.get(idx))
            .ok_or(ReaderError::PageOutOfRange {
                page: page_number,
                page_count: self.pages.len(),
            })?;
        Ok(Box::new(DumpPageRef { page_number, page }))
    }
}

struct DumpPageRef<'a> {
    page_number: usize,
    page: &'a DumpPage,
}

impl PdfPage for DumpPageRef<'_> {
    fn page_number(&self) -> usize {
        self.page_number
    }

    fn size(&self) -> (f32, f32) {
        (self.page.width, self.page.height)
    }

    fn render(&self, scale: f32) -> ReaderResult<Bitmap> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ReaderError::Render(format!("invalid scale {scale}")));
        }
        let size = RenderedSize::from_points(self.page.width, self.page.height, scale);
        debug!(
            page = self.page_number,
            width = size.width,
            height = size.height,
            "Rendering blank page raster"
        );
        Ok(Bitmap::from_pixel(
            size.width,
            size.height,
            Rgba([255, 255, 255, 255]),
        ))
    }

    fn fragments(&self) -> ReaderResult<Vec<TextFragment>> {
        Ok(self
            .page
            .items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                TextFragment::new(
                    item.text.clone(),
                    item.x,
                    item.y,
                    item.width,
                    item.height,
                    item.font_size.unwrap_or(DEFAULT_FONT_SIZE),
                    idx,
                    self.page_number,
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "pages": [
            {"width": 200, "height": 100, "items": [
                {"str": "Hello there", "x": 10, "y": 80, "width": 60, "height": 10, "fontSize": 10},
                {"str": "friend", "x": 72, "y": 80}
            ]},
            {"width": 200, "height": 100}
        ]
    }"#;

    #[test]
    fn opens_dump_and_reads_fragments() {
        let document = DumpEngine::new()
            .open(SAMPLE.as_bytes())
            .expect("sample dump should open");
        assert_eq!(document.page_count(), 2);
        let page = document.page(1).expect("page 1 exists");
        let fragments = page.fragments().expect("fragments");
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1].text, "friend");
        assert!((fragments[1].width - 48.0).abs() < f32::EPSILON);
        assert_eq!(fragments[1].source_index, 1);
        assert_eq!(fragments[1].page_number, 1);
        assert!(document.page(2).expect("page 2").fragments().expect("empty").is_empty());
    }

    #[test]
    fn rejects_garbage_bytes() {
        let result = DumpEngine::new().open(b"%PDF-1.7 binary");
        assert!(matches!(result, Err(ReaderError::InvalidFormat(_))));
    }

    #[test]
    fn page_lookup_is_bounds_checked() {
        let document = DumpEngine::new().open(SAMPLE.as_bytes()).expect("open");
        assert!(matches!(
            document.page(0),
            Err(ReaderError::PageOutOfRange { page: 0, page_count: 2 })
        ));
        assert!(matches!(
            document.page(3),
            Err(ReaderError::PageOutOfRange { page: 3, page_count: 2 })
        ));
    }

    #[test]
    fn render_scales_page() {
        let document = DumpEngine::new().open(SAMPLE.as_bytes()).expect("open");
        let bitmap = document.page(1).expect("page").render(1.5).expect("render");
        assert_eq!(bitmap.dimensions(), (300, 150));
    }
}
