use super::defaults;
use super::models::{AppConfig, HighlightColor, LogLevel};
use crate::locator::LocatorStrategy;
use serde::Deserialize;

/// On-disk layout of `conf/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, serde::Serialize)]
pub(super) struct ConfigTables {
    #[serde(default)]
    playback: PlaybackConfig,
    #[serde(default)]
    view: ViewConfig,
    #[serde(default)]
    highlight: HighlightConfig,
    #[serde(default)]
    history: HistoryConfig,
    #[serde(default)]
    logging: LoggingConfig,
}

impl From<ConfigTables> for AppConfig {
    fn from(tables: ConfigTables) -> Self {
        AppConfig {
            voice_rate: tables.playback.voice_rate,
            voice_pitch: tables.playback.voice_pitch,
            voice_volume: tables.playback.voice_volume,
            voice_id: tables.playback.voice_id,
            advance_delay_ms: tables.playback.advance_delay_ms,
            restart_delay_ms: tables.playback.restart_delay_ms,
            secs_per_sentence: tables.playback.secs_per_sentence,
            initial_zoom: tables.view.initial_zoom,
            zoom_min: tables.view.zoom_min,
            zoom_max: tables.view.zoom_max,
            zoom_step: tables.view.zoom_step,
            zoom_min_change: tables.view.zoom_min_change,
            click_seek_distance: tables.view.click_seek_distance,
            start_in_text_view: tables.view.start_in_text_view,
            locator_strategy: tables.highlight.locator_strategy,
            current_fill: tables.highlight.current_fill,
            current_stroke: tables.highlight.current_stroke,
            completed_fill: tables.highlight.completed_fill,
            completed_stroke: tables.highlight.completed_stroke,
            history_capacity: tables.history.capacity,
            history_dir: tables.history.dir,
            log_level: tables.logging.log_level,
        }
    }
}

impl From<&AppConfig> for ConfigTables {
    fn from(config: &AppConfig) -> Self {
        ConfigTables {
            playback: PlaybackConfig {
                voice_rate: config.voice_rate,
                voice_pitch: config.voice_pitch,
                voice_volume: config.voice_volume,
                voice_id: config.voice_id.clone(),
                advance_delay_ms: config.advance_delay_ms,
                restart_delay_ms: config.restart_delay_ms,
                secs_per_sentence: config.secs_per_sentence,
            },
            view: ViewConfig {
                initial_zoom: config.initial_zoom,
                zoom_min: config.zoom_min,
                zoom_max: config.zoom_max,
                zoom_step: config.zoom_step,
                zoom_min_change: config.zoom_min_change,
                click_seek_distance: config.click_seek_distance,
                start_in_text_view: config.start_in_text_view,
            },
            highlight: HighlightConfig {
                locator_strategy: config.locator_strategy,
                current_fill: config.current_fill,
                current_stroke: config.current_stroke,
                completed_fill: config.completed_fill,
                completed_stroke: config.completed_stroke,
            },
            history: HistoryConfig {
                capacity: config.history_capacity,
                dir: config.history_dir.clone(),
            },
            logging: LoggingConfig {
                log_level: config.log_level,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct PlaybackConfig {
    #[serde(default = "defaults::default_voice_rate")]
    voice_rate: f32,
    #[serde(default = "defaults::default_voice_pitch")]
    voice_pitch: f32,
    #[serde(default = "defaults::default_voice_volume")]
    voice_volume: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    voice_id: Option<String>,
    #[serde(default = "defaults::default_advance_delay_ms")]
    advance_delay_ms: u64,
    #[serde(default = "defaults::default_restart_delay_ms")]
    restart_delay_ms: u64,
    #[serde(default = "defaults::default_secs_per_sentence")]
    secs_per_sentence: f32,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        PlaybackConfig {
            voice_rate: defaults::default_voice_rate(),
            voice_pitch: defaults::default_voice_pitch(),
            voice_volume: defaults::default_voice_volume(),
            voice_id: None,
            advance_delay_ms: defaults::default_advance_delay_ms(),
            restart_delay_ms: defaults::default_restart_delay_ms(),
            secs_per_sentence: defaults::default_secs_per_sentence(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct ViewConfig {
    #[serde(default = "defaults::default_initial_zoom")]
    initial_zoom: f32,
    #[serde(default = "defaults::default_zoom_min")]
    zoom_min: f32,
    #[serde(default = "defaults::default_zoom_max")]
    zoom_max: f32,
    #[serde(default = "defaults::default_zoom_step")]
    zoom_step: f32,
    #[serde(default = "defaults::default_zoom_min_change")]
    zoom_min_change: f32,
    #[serde(default = "defaults::default_click_seek_distance")]
    click_seek_distance: f32,
    #[serde(default)]
    start_in_text_view: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            initial_zoom: defaults::default_initial_zoom(),
            zoom_min: defaults::default_zoom_min(),
            zoom_max: defaults::default_zoom_max(),
            zoom_step: defaults::default_zoom_step(),
            zoom_min_change: defaults::default_zoom_min_change(),
            click_seek_distance: defaults::default_click_seek_distance(),
            start_in_text_view: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct HighlightConfig {
    #[serde(default = "defaults::default_locator_strategy")]
    locator_strategy: LocatorStrategy,
    #[serde(default = "defaults::default_current_fill")]
    current_fill: HighlightColor,
    #[serde(default = "defaults::default_current_stroke")]
    current_stroke: HighlightColor,
    #[serde(default = "defaults::default_completed_fill")]
    completed_fill: HighlightColor,
    #[serde(default = "defaults::default_completed_stroke")]
    completed_stroke: HighlightColor,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        HighlightConfig {
            locator_strategy: defaults::default_locator_strategy(),
            current_fill: defaults::default_current_fill(),
            current_stroke: defaults::default_current_stroke(),
            completed_fill: defaults::default_completed_fill(),
            completed_stroke: defaults::default_completed_stroke(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct HistoryConfig {
    #[serde(default = "defaults::default_history_capacity")]
    capacity: usize,
    #[serde(default = "defaults::default_history_dir")]
    dir: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            capacity: defaults::default_history_capacity(),
            dir: defaults::default_history_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, serde::Serialize)]
struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    log_level: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_level: defaults::default_log_level(),
        }
    }
}
