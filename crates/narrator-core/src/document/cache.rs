//! Per-document page cache keyed by zoom scale.
//!
//! Rendered sizes (and everything painted from them) depend on the scale, so a
//! scale change drops every cached page rather than trying to rescale them.

use super::error::ReaderResult;
use super::traits::PdfDocument;
use super::types::{Page, RenderedSize};
use std::collections::HashMap;
use tracing::debug;

/// Scale multiplied by 100 so it can be compared and hashed as an integer.
fn scale_key(scale: f32) -> u32 {
    (scale * 100.0).round() as u32
}

#[derive(Debug, Default)]
pub struct PageCache {
    scale_key: Option<u32>,
    pages: HashMap<usize, Page>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached page for `scale`, extracting it on first access.
    pub fn get_or_load(
        &mut self,
        document: &dyn PdfDocument,
        page_number: usize,
        scale: f32,
    ) -> ReaderResult<&Page> {
        let key = scale_key(scale);
        if self.scale_key != Some(key) {
            if !self.pages.is_empty() {
                debug!(
                    previous = ?self.scale_key,
                    next = key,
                    "Scale changed; dropping cached pages"
                );
            }
            self.pages.clear();
            self.scale_key = Some(key);
        }

        if !self.pages.contains_key(&page_number) {
            let handle = document.page(page_number)?;
            let (width, height) = handle.size();
            let page = Page {
                page_number,
                fragments: handle.fragments()?,
                rendered_size: RenderedSize::from_points(width, height, scale),
            };
            debug!(
                page = page_number,
                fragments = page.fragments.len(),
                "Cached page extraction"
            );
            self.pages.insert(page_number, page);
        }

        Ok(&self.pages[&page_number])
    }

    pub fn invalidate(&mut self) {
        self.pages.clear();
        self.scale_key = None;
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DumpEngine, PdfEngine};

    const SAMPLE: &str = r#"{"pages": [
        {"width": 100, "height": 50, "items": [{"str": "alpha", "x": 1, "y": 2}]},
        {"width": 100, "height": 50, "items": []}
    ]}"#;

    #[test]
    fn caches_pages_until_scale_changes() {
        let document = DumpEngine::new().open(SAMPLE.as_bytes()).expect("open");
        let mut cache = PageCache::new();

        let page = cache
            .get_or_load(document.as_ref(), 1, 1.0)
            .expect("page 1");
        assert_eq!(page.rendered_size, RenderedSize { width: 100, height: 50 });
        cache.get_or_load(document.as_ref(), 2, 1.0).expect("page 2");
        assert_eq!(cache.len(), 2);

        let page = cache
            .get_or_load(document.as_ref(), 1, 2.0)
            .expect("page 1 rescaled");
        assert_eq!(page.rendered_size, RenderedSize { width: 200, height: 100 });
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn out_of_range_pages_are_not_cached() {
        let document = DumpEngine::new().open(SAMPLE.as_bytes()).expect("open");
        let mut cache = PageCache::new();
        assert!(cache.get_or_load(document.as_ref(), 9, 1.0).is_err());
        assert!(cache.is_empty());
    }
}
