//! Speech engine that narrates to the log instead of a sound card.
//!
//! Each utterance "plays" for as long as it would take to read aloud at
//! [`BASE_WPM`] scaled by the voice rate. The driver polls for finished
//! utterances and feeds them back into the session.

use narrator_core::document::{ReaderError, ReaderResult};
use narrator_core::speech::{SpeechEngine, SpeechEvent, UtteranceId, VoiceDescriptor, VoiceParams};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const BASE_WPM: f64 = 170.0;
/// Longest simulated utterance, whatever the text, rate or time scale.
const MAX_UTTERANCE: Duration = Duration::from_secs(60 * 60);
const CONSOLE_VOICE_ID: &str = "console";

#[derive(Debug)]
struct ActiveUtterance {
    id: UtteranceId,
    remaining: Duration,
    /// `None` while paused.
    resumed_at: Option<Instant>,
}

impl ActiveUtterance {
    fn finishes_at(&self) -> Option<Instant> {
        self.resumed_at.and_then(|at| at.checked_add(self.remaining))
    }
}

#[derive(Debug, Default)]
pub struct ConsoleClock {
    active: Option<ActiveUtterance>,
    next_id: u64,
}

impl ConsoleClock {
    /// Earliest instant at which [`Self::poll`] could report something.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.active.as_ref().and_then(ActiveUtterance::finishes_at)
    }

    pub fn poll(&mut self, now: Instant) -> Option<SpeechEvent> {
        let finished = self
            .active
            .as_ref()
            .and_then(ActiveUtterance::finishes_at)
            .is_some_and(|at| at <= now);
        if !finished {
            return None;
        }
        self.active.take().map(|utterance| SpeechEvent::Ended(utterance.id))
    }
}

pub struct ConsoleSpeech {
    clock: Rc<RefCell<ConsoleClock>>,
    time_scale: f64,
}

impl ConsoleSpeech {
    pub fn new(clock: Rc<RefCell<ConsoleClock>>, time_scale: f64) -> Self {
        Self { clock, time_scale }
    }

    fn duration_for(&self, text: &str, params: &VoiceParams) -> Duration {
        let words = text.split_whitespace().count().max(1) as f64;
        let wpm = BASE_WPM * f64::from(params.rate.max(0.1));
        Duration::try_from_secs_f64(words / wpm * 60.0 * self.time_scale)
            .unwrap_or(MAX_UTTERANCE)
            .min(MAX_UTTERANCE)
    }
}

impl SpeechEngine for ConsoleSpeech {
    fn speak(&mut self, text: &str, params: &VoiceParams) -> ReaderResult<UtteranceId> {
        if let Some(voice) = params.voice_id.as_deref() {
            if voice != CONSOLE_VOICE_ID {
                return Err(ReaderError::Speech(format!("unknown voice {voice}")));
            }
        }
        let duration = self.duration_for(text, params);
        let mut clock = self.clock.borrow_mut();
        clock.next_id += 1;
        let id = UtteranceId(clock.next_id);
        clock.active = Some(ActiveUtterance {
            id,
            remaining: duration,
            resumed_at: Some(Instant::now()),
        });
        info!(
            utterance = id.0,
            rate = params.rate,
            duration_ms = duration.as_millis() as u64,
            "Narrating: {text}"
        );
        Ok(id)
    }

    fn pause(&mut self) {
        let mut clock = self.clock.borrow_mut();
        if let Some(active) = clock.active.as_mut() {
            if let Some(resumed_at) = active.resumed_at.take() {
                active.remaining = active.remaining.saturating_sub(resumed_at.elapsed());
                debug!(utterance = active.id.0, "Narration paused");
            }
        }
    }

    fn resume(&mut self) {
        let mut clock = self.clock.borrow_mut();
        if let Some(active) = clock.active.as_mut() {
            if active.resumed_at.is_none() {
                active.resumed_at = Some(Instant::now());
                debug!(utterance = active.id.0, "Narration resumed");
            }
        }
    }

    fn cancel(&mut self) {
        if let Some(active) = self.clock.borrow_mut().active.take() {
            debug!(utterance = active.id.0, "Narration cancelled");
        }
    }

    fn list_voices(&self) -> Vec<VoiceDescriptor> {
        vec![VoiceDescriptor {
            id: CONSOLE_VOICE_ID.to_string(),
            name: "Console narrator".to_string(),
            lang: "en".to_string(),
            is_default: true,
        }]
    }
}
