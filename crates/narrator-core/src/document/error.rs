//! Error taxonomy shared by the document, speech and history collaborators.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReaderError {
    /// Bytes could not be decoded as a document.
    #[error("Invalid document format: {0}")]
    InvalidFormat(String),

    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Speech engine error: {0}")]
    Speech(String),

    /// Backing key-value storage unavailable or full.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid history index {index} (history has {len} entries)")]
    InvalidHistoryIndex { index: usize, len: usize },
}

pub type ReaderResult<T> = std::result::Result<T, ReaderError>;
