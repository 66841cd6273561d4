//! Sentence-synchronized PDF narration: segmenting extracted text, speaking
//! it sentence by sentence, and keeping the page overlay and text list
//! highlighted in step with playback.
//!
//! PDF decoding, speech synthesis and storage are collaborators behind traits
//! in [`document`], [`speech`] and [`history`]; [`session::ReaderSession`]
//! owns one of each and wires them to the playback state machine.

pub mod config;
pub mod document;
pub mod highlight;
pub mod history;
pub mod locator;
pub mod playback;
pub mod progress;
pub mod session;
pub mod speech;
pub mod text_utils;
pub mod view;
