//! Sentence playback state machine.
//!
//! Every change to [`PlaybackState`] goes through [`transition`], which
//! returns the side effects for the session to carry out. Engine callbacks
//! and timers are matched against the utterance id and generation they were
//! issued under so late arrivals are dropped instead of re-entering.

mod state;
mod transitions;

pub use state::{PlaybackController, PlaybackState, PlaybackStatus, PlaybackTiming};
pub use transitions::{PlaybackAction, PlaybackEvent, transition};

impl PlaybackController {
    pub fn apply(&mut self, event: PlaybackEvent) -> Vec<PlaybackAction> {
        transition(self, event)
    }
}
