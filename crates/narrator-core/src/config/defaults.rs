use super::models::{HighlightColor, LogLevel};
use crate::locator::LocatorStrategy;

pub(crate) fn default_voice_rate() -> f32 {
    1.0
}

pub(crate) fn default_voice_pitch() -> f32 {
    1.0
}

pub(crate) fn default_voice_volume() -> f32 {
    1.0
}

pub(crate) fn default_advance_delay_ms() -> u64 {
    500
}

pub(crate) fn default_restart_delay_ms() -> u64 {
    100
}

pub(crate) fn default_secs_per_sentence() -> f32 {
    4.0
}

pub(crate) fn default_initial_zoom() -> f32 {
    1.5
}

pub(crate) fn default_zoom_min() -> f32 {
    0.5
}

pub(crate) fn default_zoom_max() -> f32 {
    2.0
}

pub(crate) fn default_zoom_step() -> f32 {
    0.1
}

pub(crate) fn default_zoom_min_change() -> f32 {
    0.05
}

pub(crate) fn default_click_seek_distance() -> f32 {
    50.0
}

pub(crate) fn default_locator_strategy() -> LocatorStrategy {
    LocatorStrategy::WordOverlap
}

pub(crate) fn default_current_fill() -> HighlightColor {
    HighlightColor {
        r: 1.0,
        g: 1.0,
        b: 0.0,
        a: 0.6,
    }
}

pub(crate) fn default_current_stroke() -> HighlightColor {
    HighlightColor {
        r: 1.0,
        g: 200.0 / 255.0,
        b: 0.0,
        a: 0.8,
    }
}

pub(crate) fn default_completed_fill() -> HighlightColor {
    HighlightColor {
        r: 0.0,
        g: 1.0,
        b: 0.0,
        a: 0.4,
    }
}

pub(crate) fn default_completed_stroke() -> HighlightColor {
    HighlightColor {
        r: 0.0,
        g: 200.0 / 255.0,
        b: 0.0,
        a: 0.6,
    }
}

pub(crate) fn default_history_capacity() -> usize {
    crate::history::DEFAULT_HISTORY_CAPACITY
}

pub(crate) fn default_history_dir() -> String {
    ".cache/history".to_string()
}

pub(crate) fn default_log_level() -> LogLevel {
    LogLevel::Debug
}
