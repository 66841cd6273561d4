//! Document collaborator boundary.
//!
//! The PDF engine itself lives outside this crate; these modules describe what
//! the reader needs from it (page count, page rasters, positioned text) and
//! hold the derived per-page model plus a scale-keyed cache of it.

mod cache;
mod dump;
mod error;
mod traits;
mod types;

pub use cache::PageCache;
pub use dump::{DumpDocument, DumpEngine};
pub use error::{ReaderError, ReaderResult};
pub use traits::{PdfDocument, PdfEngine, PdfPage};
pub use types::{
    Bitmap, FALLBACK_CHAR_WIDTH, FALLBACK_HEIGHT, Page, RenderedSize, Sentence, TextFragment,
    page_text,
};
