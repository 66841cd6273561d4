use crate::highlight::{HighlightPalette, RoleColors};
use crate::locator::LocatorStrategy;
use crate::playback::PlaybackTiming;
use crate::speech::VoiceParams;
use crate::view::ZoomLimits;
use serde::Deserialize;
use std::time::Duration;

/// Longest grace or restart delay honoured; larger configured values are capped.
pub const MAX_DELAY_MS: u64 = 60_000;

/// High-level reader configuration; deserializable from TOML.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct AppConfig {
    #[serde(default = "crate::config::defaults::default_voice_rate")]
    pub voice_rate: f32,
    #[serde(default = "crate::config::defaults::default_voice_pitch")]
    pub voice_pitch: f32,
    #[serde(default = "crate::config::defaults::default_voice_volume")]
    pub voice_volume: f32,
    #[serde(default)]
    pub voice_id: Option<String>,
    #[serde(default = "crate::config::defaults::default_advance_delay_ms")]
    pub advance_delay_ms: u64,
    #[serde(default = "crate::config::defaults::default_restart_delay_ms")]
    pub restart_delay_ms: u64,
    #[serde(default = "crate::config::defaults::default_secs_per_sentence")]
    pub secs_per_sentence: f32,
    #[serde(default = "crate::config::defaults::default_initial_zoom")]
    pub initial_zoom: f32,
    #[serde(default = "crate::config::defaults::default_zoom_min")]
    pub zoom_min: f32,
    #[serde(default = "crate::config::defaults::default_zoom_max")]
    pub zoom_max: f32,
    #[serde(default = "crate::config::defaults::default_zoom_step")]
    pub zoom_step: f32,
    #[serde(default = "crate::config::defaults::default_zoom_min_change")]
    pub zoom_min_change: f32,
    #[serde(default = "crate::config::defaults::default_click_seek_distance")]
    pub click_seek_distance: f32,
    #[serde(default)]
    pub start_in_text_view: bool,
    #[serde(default = "crate::config::defaults::default_locator_strategy")]
    pub locator_strategy: LocatorStrategy,
    #[serde(default = "crate::config::defaults::default_current_fill")]
    pub current_fill: HighlightColor,
    #[serde(default = "crate::config::defaults::default_current_stroke")]
    pub current_stroke: HighlightColor,
    #[serde(default = "crate::config::defaults::default_completed_fill")]
    pub completed_fill: HighlightColor,
    #[serde(default = "crate::config::defaults::default_completed_stroke")]
    pub completed_stroke: HighlightColor,
    #[serde(default = "crate::config::defaults::default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "crate::config::defaults::default_history_dir")]
    pub history_dir: String,
    #[serde(default = "crate::config::defaults::default_log_level")]
    pub log_level: LogLevel,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            voice_rate: crate::config::defaults::default_voice_rate(),
            voice_pitch: crate::config::defaults::default_voice_pitch(),
            voice_volume: crate::config::defaults::default_voice_volume(),
            voice_id: None,
            advance_delay_ms: crate::config::defaults::default_advance_delay_ms(),
            restart_delay_ms: crate::config::defaults::default_restart_delay_ms(),
            secs_per_sentence: crate::config::defaults::default_secs_per_sentence(),
            initial_zoom: crate::config::defaults::default_initial_zoom(),
            zoom_min: crate::config::defaults::default_zoom_min(),
            zoom_max: crate::config::defaults::default_zoom_max(),
            zoom_step: crate::config::defaults::default_zoom_step(),
            zoom_min_change: crate::config::defaults::default_zoom_min_change(),
            click_seek_distance: crate::config::defaults::default_click_seek_distance(),
            start_in_text_view: false,
            locator_strategy: crate::config::defaults::default_locator_strategy(),
            current_fill: crate::config::defaults::default_current_fill(),
            current_stroke: crate::config::defaults::default_current_stroke(),
            completed_fill: crate::config::defaults::default_completed_fill(),
            completed_stroke: crate::config::defaults::default_completed_stroke(),
            history_capacity: crate::config::defaults::default_history_capacity(),
            history_dir: crate::config::defaults::default_history_dir(),
            log_level: crate::config::defaults::default_log_level(),
        }
    }
}

impl AppConfig {
    pub fn voice_params(&self) -> VoiceParams {
        VoiceParams {
            rate: self.voice_rate,
            pitch: self.voice_pitch,
            volume: self.voice_volume,
            voice_id: self.voice_id.clone(),
        }
        .clamped()
    }

    pub fn playback_timing(&self) -> PlaybackTiming {
        PlaybackTiming {
            advance_delay: Duration::from_millis(self.advance_delay_ms.min(MAX_DELAY_MS)),
            restart_delay: Duration::from_millis(self.restart_delay_ms.min(MAX_DELAY_MS)),
        }
    }

    pub fn highlight_palette(&self) -> HighlightPalette {
        HighlightPalette {
            current: RoleColors {
                fill: self.current_fill,
                stroke: self.current_stroke,
            },
            completed: RoleColors {
                fill: self.completed_fill,
                stroke: self.completed_stroke,
            },
        }
    }

    /// Zoom bounds; an inverted or non-positive range falls back to defaults.
    pub fn zoom_limits(&self) -> ZoomLimits {
        let sane = self.zoom_min > 0.0
            && self.zoom_max >= self.zoom_min
            && self.zoom_step > 0.0
            && self.zoom_min_change >= 0.0;
        if sane {
            ZoomLimits {
                min: self.zoom_min,
                max: self.zoom_max,
                step: self.zoom_step,
                min_change: self.zoom_min_change,
            }
        } else {
            ZoomLimits::default()
        }
    }
}

/// RGBA with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct HighlightColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Supported logging verbosity levels.
#[derive(Debug, Clone, Copy, Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

impl LogLevel {
    pub fn as_filter_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}
