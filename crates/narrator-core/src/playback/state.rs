use crate::speech::{UtteranceId, VoiceParams};
use serde::Serialize;
use std::time::Duration;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, TS)]
#[ts(export)]
pub enum PlaybackStatus {
    #[default]
    Stopped,
    Reading,
    Paused,
}

impl std::fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PlaybackStatus::Stopped => "Stopped",
            PlaybackStatus::Reading => "Reading",
            PlaybackStatus::Paused => "Paused",
        };
        write!(f, "{}", label)
    }
}

/// Observable playback state for the loaded document.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct PlaybackState {
    pub current_index: usize,
    pub status: PlaybackStatus,
    pub voice_params: VoiceParams,
}

/// Delays applied between utterances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackTiming {
    /// Gap between an utterance ending and the next one starting.
    pub advance_delay: Duration,
    /// Gap between cancelling and restarting after a voice change.
    pub restart_delay: Duration,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self {
            advance_delay: Duration::from_millis(500),
            restart_delay: Duration::from_millis(100),
        }
    }
}

/// Owns [`PlaybackState`] plus the bookkeeping needed to reject late engine
/// callbacks and timers. Only [`super::transition`] mutates it.
#[derive(Debug, Clone)]
pub struct PlaybackController {
    pub(super) state: PlaybackState,
    pub(super) sentence_count: usize,
    pub(super) timing: PlaybackTiming,
    /// Set for a newly loaded document and after the last sentence finished.
    pub(super) fresh: bool,
    pub(super) active_utterance: Option<UtteranceId>,
    /// Bumped whenever a scheduled speak must no longer fire.
    pub(super) generation: u64,
    /// Auto-advance is suspended after a speech error.
    pub(super) halted: bool,
}

impl PlaybackController {
    pub fn new(sentence_count: usize, voice_params: VoiceParams, timing: PlaybackTiming) -> Self {
        Self {
            state: PlaybackState {
                current_index: 0,
                status: PlaybackStatus::Stopped,
                voice_params: voice_params.clamped(),
            },
            sentence_count,
            timing,
            fresh: true,
            active_utterance: None,
            generation: 0,
            halted: false,
        }
    }

    /// Fresh state for a newly loaded document; voice settings carry over.
    pub fn reset_for_document(&mut self, sentence_count: usize) {
        self.state.current_index = 0;
        self.state.status = PlaybackStatus::Stopped;
        self.sentence_count = sentence_count;
        self.fresh = true;
        self.active_utterance = None;
        self.generation = self.generation.wrapping_add(1);
        self.halted = false;
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.status
    }

    pub fn voice_params(&self) -> &VoiceParams {
        &self.state.voice_params
    }

    pub fn sentence_count(&self) -> usize {
        self.sentence_count
    }

    pub fn has_content(&self) -> bool {
        self.sentence_count > 0
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn active_utterance(&self) -> Option<UtteranceId> {
        self.active_utterance
    }

    pub(super) fn bump_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }
}
