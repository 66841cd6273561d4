//! Speech engine collaborator.
//!
//! Engines report completion asynchronously; the host forwards those reports
//! to the session as [`SpeechEvent`]s tagged with the utterance they concern.

use crate::document::ReaderResult;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const MIN_RATE: f32 = 0.1;
pub const MAX_RATE: f32 = 10.0;
pub const MAX_PITCH: f32 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VoiceParams {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    /// `None` selects the engine default voice.
    pub voice_id: Option<String>,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
            voice_id: None,
        }
    }
}

impl VoiceParams {
    /// Clamp into the ranges speech engines accept.
    pub fn clamped(mut self) -> Self {
        self.rate = clamp_or(self.rate, MIN_RATE, MAX_RATE, 1.0);
        self.pitch = clamp_or(self.pitch, 0.0, MAX_PITCH, 1.0);
        self.volume = clamp_or(self.volume, 0.0, 1.0, 1.0);
        self
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VoiceDescriptor {
    pub id: String,
    pub name: String,
    pub lang: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Handle for one `speak` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UtteranceId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    Ended(UtteranceId),
    Failed { utterance: UtteranceId, reason: String },
    /// The engine's voice list changed after the fact.
    VoicesChanged,
}

/// Text-to-speech engine. `pause`, `resume` and `cancel` act on whichever
/// utterance is active and must be no-ops when there is none.
pub trait SpeechEngine {
    fn speak(&mut self, text: &str, params: &VoiceParams) -> ReaderResult<UtteranceId>;
    fn pause(&mut self);
    fn resume(&mut self);
    fn cancel(&mut self);
    fn list_voices(&self) -> Vec<VoiceDescriptor>;
}
