//! Collaborator interfaces for the external PDF engine.

use super::error::ReaderResult;
use super::types::{Bitmap, TextFragment};

/// Decodes raw bytes into a document handle.
pub trait PdfEngine {
    fn open(&self, bytes: &[u8]) -> ReaderResult<Box<dyn PdfDocument>>;
}

/// An opened document. Owned by the session and dropped on teardown.
pub trait PdfDocument {
    fn page_count(&self) -> usize;

    /// Fetch a 1-indexed page; fails with `PageOutOfRange` otherwise.
    fn page(&self, page_number: usize) -> ReaderResult<Box<dyn PdfPage + '_>>;
}

pub trait PdfPage {
    fn page_number(&self) -> usize;

    /// Unscaled page size in points (width, height).
    fn size(&self) -> (f32, f32);

    fn render(&self, scale: f32) -> ReaderResult<Bitmap>;

    /// Fragments in extraction order, positions in unscaled page space.
    fn fragments(&self) -> ReaderResult<Vec<TextFragment>>;
}
