use super::state::{PlaybackController, PlaybackStatus};
use crate::speech::{UtteranceId, VoiceParams};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Start,
    Pause,
    Resume,
    TogglePause,
    Stop,
    Next,
    Previous,
    JumpTo(usize),
    /// The engine accepted a `Speak` and handed back its utterance id.
    UtteranceStarted(UtteranceId),
    UtteranceEnded(UtteranceId),
    /// `utterance` is `None` when the engine refused the text outright.
    UtteranceFailed {
        utterance: Option<UtteranceId>,
        reason: String,
    },
    VoiceParamsChanged(VoiceParams),
    TimerFired(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackAction {
    Speak { index: usize },
    CancelUtterance,
    PauseUtterance,
    ResumeUtterance,
    ScheduleSpeak {
        index: usize,
        delay: Duration,
        ticket: u64,
    },
    Highlight { index: usize },
    ClearHighlights,
    /// Position or status changed; refresh displays and persisted progress.
    ProgressChanged,
}

pub fn transition(controller: &mut PlaybackController, event: PlaybackEvent) -> Vec<PlaybackAction> {
    match event {
        PlaybackEvent::Start => on_start(controller),
        PlaybackEvent::Pause => on_pause(controller),
        PlaybackEvent::Resume => on_resume(controller),
        PlaybackEvent::TogglePause => match controller.state.status {
            PlaybackStatus::Reading => on_pause(controller),
            PlaybackStatus::Paused => on_resume(controller),
            PlaybackStatus::Stopped => Vec::new(),
        },
        PlaybackEvent::Stop => on_stop(controller),
        PlaybackEvent::Next => on_step(controller, 1),
        PlaybackEvent::Previous => on_step(controller, -1),
        PlaybackEvent::JumpTo(index) => on_jump(controller, index),
        PlaybackEvent::UtteranceStarted(utterance) => {
            controller.active_utterance = Some(utterance);
            Vec::new()
        }
        PlaybackEvent::UtteranceEnded(utterance) => on_utterance_ended(controller, utterance),
        PlaybackEvent::UtteranceFailed { utterance, reason } => {
            on_utterance_failed(controller, utterance, reason)
        }
        PlaybackEvent::VoiceParamsChanged(params) => on_voice_params_changed(controller, params),
        PlaybackEvent::TimerFired(ticket) => on_timer_fired(controller, ticket),
    }
}

fn speak_current(controller: &mut PlaybackController) -> Vec<PlaybackAction> {
    let index = controller.state.current_index;
    controller.bump_generation();
    controller.halted = false;
    controller.active_utterance = None;
    vec![
        PlaybackAction::CancelUtterance,
        PlaybackAction::Speak { index },
        PlaybackAction::Highlight { index },
        PlaybackAction::ProgressChanged,
    ]
}

fn on_start(controller: &mut PlaybackController) -> Vec<PlaybackAction> {
    if !controller.has_content() {
        info!("No sentences to read; ignoring start");
        return Vec::new();
    }
    match controller.state.status {
        PlaybackStatus::Stopped => {
            if controller.fresh {
                controller.state.current_index = 0;
            }
            controller.fresh = false;
            controller.state.status = PlaybackStatus::Reading;
            info!(
                sentence_idx = controller.state.current_index,
                total = controller.sentence_count,
                "Starting playback"
            );
            speak_current(controller)
        }
        PlaybackStatus::Paused => on_resume(controller),
        PlaybackStatus::Reading if controller.halted => {
            info!(
                sentence_idx = controller.state.current_index,
                "Restarting halted playback"
            );
            speak_current(controller)
        }
        PlaybackStatus::Reading => {
            debug!("Start requested while already reading");
            Vec::new()
        }
    }
}

fn on_pause(controller: &mut PlaybackController) -> Vec<PlaybackAction> {
    if controller.state.status != PlaybackStatus::Reading {
        debug!(status = %controller.state.status, "Pause ignored");
        return Vec::new();
    }
    controller.state.status = PlaybackStatus::Paused;
    // A pending auto-advance must not fire while paused.
    controller.bump_generation();
    info!(sentence_idx = controller.state.current_index, "Paused playback");
    let mut actions = Vec::new();
    if controller.active_utterance.is_some() {
        actions.push(PlaybackAction::PauseUtterance);
    }
    actions.push(PlaybackAction::ProgressChanged);
    actions
}

fn on_resume(controller: &mut PlaybackController) -> Vec<PlaybackAction> {
    if controller.state.status != PlaybackStatus::Paused {
        debug!(status = %controller.state.status, "Resume ignored");
        return Vec::new();
    }
    controller.state.status = PlaybackStatus::Reading;
    info!(sentence_idx = controller.state.current_index, "Resumed playback");
    if controller.active_utterance.is_some() && !controller.halted {
        return vec![
            PlaybackAction::ResumeUtterance,
            PlaybackAction::ProgressChanged,
        ];
    }
    // Nothing suspended in the engine (paused during the gap, moved while
    // paused, or halted by an error): speak the current sentence afresh.
    speak_current(controller)
}

fn on_stop(controller: &mut PlaybackController) -> Vec<PlaybackAction> {
    info!(
        previous = %controller.state.status,
        sentence_idx = controller.state.current_index,
        "Stopping playback"
    );
    controller.state.status = PlaybackStatus::Stopped;
    controller.state.current_index = 0;
    controller.active_utterance = None;
    controller.halted = false;
    controller.bump_generation();
    vec![
        PlaybackAction::CancelUtterance,
        PlaybackAction::ClearHighlights,
        PlaybackAction::ProgressChanged,
    ]
}

fn on_step(controller: &mut PlaybackController, delta: isize) -> Vec<PlaybackAction> {
    if !controller.has_content() {
        return Vec::new();
    }
    let last = controller.sentence_count - 1;
    let current = controller.state.current_index;
    let target = current.saturating_add_signed(delta).min(last);
    if target == current {
        debug!(sentence_idx = current, delta, "Already at document edge");
        return Vec::new();
    }
    move_to(controller, target, false)
}

fn on_jump(controller: &mut PlaybackController, index: usize) -> Vec<PlaybackAction> {
    if index >= controller.sentence_count {
        warn!(
            sentence_idx = index,
            total = controller.sentence_count,
            "Ignoring jump past the last sentence"
        );
        return Vec::new();
    }
    move_to(controller, index, true)
}

/// Reposition; a paused jump resumes reading at the new sentence.
fn move_to(
    controller: &mut PlaybackController,
    index: usize,
    resume_if_paused: bool,
) -> Vec<PlaybackAction> {
    controller.state.current_index = index;
    controller.fresh = false;
    debug!(sentence_idx = index, status = %controller.state.status, "Moved reading position");
    match controller.state.status {
        PlaybackStatus::Reading => speak_current(controller),
        PlaybackStatus::Paused if resume_if_paused => {
            controller.state.status = PlaybackStatus::Reading;
            speak_current(controller)
        }
        PlaybackStatus::Paused => {
            controller.bump_generation();
            controller.active_utterance = None;
            controller.halted = false;
            vec![
                PlaybackAction::CancelUtterance,
                PlaybackAction::Highlight { index },
                PlaybackAction::ProgressChanged,
            ]
        }
        PlaybackStatus::Stopped => vec![
            PlaybackAction::Highlight { index },
            PlaybackAction::ProgressChanged,
        ],
    }
}

fn on_utterance_ended(
    controller: &mut PlaybackController,
    utterance: UtteranceId,
) -> Vec<PlaybackAction> {
    if controller.active_utterance != Some(utterance) {
        debug!(
            utterance = utterance.0,
            active = ?controller.active_utterance.map(|id| id.0),
            "Ignoring stale utterance end"
        );
        return Vec::new();
    }
    controller.active_utterance = None;
    if controller.state.status != PlaybackStatus::Reading || controller.halted {
        return Vec::new();
    }

    let finished = controller.state.current_index;
    if finished + 1 >= controller.sentence_count {
        info!(total = controller.sentence_count, "Finished reading document");
        controller.state.status = PlaybackStatus::Stopped;
        controller.fresh = true;
        controller.bump_generation();
        return vec![
            PlaybackAction::ClearHighlights,
            PlaybackAction::ProgressChanged,
        ];
    }

    let next = finished + 1;
    controller.state.current_index = next;
    let ticket = controller.bump_generation();
    debug!(sentence_idx = next, ticket, "Scheduling auto-advance");
    vec![
        PlaybackAction::Highlight { index: next },
        PlaybackAction::ProgressChanged,
        PlaybackAction::ScheduleSpeak {
            index: next,
            delay: controller.timing.advance_delay,
            ticket,
        },
    ]
}

fn on_utterance_failed(
    controller: &mut PlaybackController,
    utterance: Option<UtteranceId>,
    reason: String,
) -> Vec<PlaybackAction> {
    if let Some(id) = utterance {
        if controller.active_utterance != Some(id) {
            debug!(utterance = id.0, "Ignoring error from stale utterance");
            return Vec::new();
        }
    }
    controller.active_utterance = None;
    controller.halted = true;
    controller.bump_generation();
    warn!(
        sentence_idx = controller.state.current_index,
        status = %controller.state.status,
        "Speech failed; auto-advance halted until next user action: {reason}"
    );
    Vec::new()
}

fn on_voice_params_changed(
    controller: &mut PlaybackController,
    params: VoiceParams,
) -> Vec<PlaybackAction> {
    controller.state.voice_params = params.clamped();
    if controller.state.status != PlaybackStatus::Reading || controller.halted {
        return Vec::new();
    }
    controller.active_utterance = None;
    let ticket = controller.bump_generation();
    let index = controller.state.current_index;
    info!(sentence_idx = index, "Restarting sentence with new voice settings");
    vec![
        PlaybackAction::CancelUtterance,
        PlaybackAction::ScheduleSpeak {
            index,
            delay: controller.timing.restart_delay,
            ticket,
        },
    ]
}

fn on_timer_fired(controller: &mut PlaybackController, ticket: u64) -> Vec<PlaybackAction> {
    if ticket != controller.generation || controller.state.status != PlaybackStatus::Reading {
        debug!(
            ticket,
            current = controller.generation,
            "Ignoring superseded speak timer"
        );
        return Vec::new();
    }
    vec![PlaybackAction::Speak {
        index: controller.state.current_index,
    }]
}
