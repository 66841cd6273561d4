//! Entry point for the headless PDF narrator.
//!
//! Responsibilities here are intentionally minimal:
//! - Parse command-line arguments.
//! - Load user configuration from `conf/config.toml`.
//! - Open the extracted document dump and hand it to a reading session.
//! - Drive the session until it finishes or Ctrl+C arrives.

mod console_speech;
mod driver;

use crate::console_speech::{ConsoleClock, ConsoleSpeech};
use crate::driver::Driver;
use anyhow::{Context, Result, anyhow};
use narrator_core::config::load_config;
use narrator_core::document::DumpEngine;
use narrator_core::history::{FileStore, HistoryStore};
use narrator_core::session::ReaderSession;
use std::cell::RefCell;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const MAX_TIME_SCALE: f64 = 100.0;

const USAGE: &str = "Usage: pdf-narrator <document.json> [--overlay-dir <dir>] [--start <sentence>] [--time-scale <factor>]";

#[derive(Debug, Clone, PartialEq)]
struct Args {
    document: PathBuf,
    overlay_dir: Option<PathBuf>,
    start_sentence: Option<usize>,
    time_scale: f64,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    let config = load_config(Path::new("conf/config.toml"));
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        path = %args.document.display(),
        level = %config.log_level,
        strategy = %config.locator_strategy,
        "Starting PDF narrator"
    );

    let bytes = fs::read(&args.document)
        .with_context(|| format!("Failed to read {}", args.document.display()))?;
    let name = args
        .document
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document")
        .to_string();

    let clock = Rc::new(RefCell::new(ConsoleClock::default()));
    let speech = ConsoleSpeech::new(Rc::clone(&clock), args.time_scale);
    let history = HistoryStore::new(
        Box::new(FileStore::new(&config.history_dir)),
        config.history_capacity,
    );
    let mut session = ReaderSession::new(
        config,
        Box::new(DumpEngine::new()),
        Box::new(speech),
        history,
    );
    session
        .load_document(&name, &bytes)
        .with_context(|| format!("Failed to open {}", args.document.display()))?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    if let Err(err) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!("Failed to install Ctrl+C handler: {err}");
    }

    Driver::new(session, clock, args.overlay_dir).run(args.start_sentence, &interrupted)
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut document = None;
    let mut overlay_dir = None;
    let mut start_sentence = None;
    let mut time_scale = 1.0;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--overlay-dir" => {
                let dir = args.next().ok_or_else(|| anyhow!(USAGE))?;
                overlay_dir = Some(PathBuf::from(dir));
            }
            "--start" => {
                let value = args.next().ok_or_else(|| anyhow!(USAGE))?;
                start_sentence = Some(
                    value
                        .parse::<usize>()
                        .with_context(|| format!("Invalid sentence index {value}"))?,
                );
            }
            "--time-scale" => {
                let value = args.next().ok_or_else(|| anyhow!(USAGE))?;
                let parsed = value
                    .parse::<f64>()
                    .with_context(|| format!("Invalid time scale {value}"))?;
                if !(parsed.is_finite() && (0.0..=MAX_TIME_SCALE).contains(&parsed)) {
                    return Err(anyhow!("Time scale must be between 0 and {MAX_TIME_SCALE}"));
                }
                time_scale = parsed;
            }
            other if other.starts_with("--") => return Err(anyhow!("Unknown flag {other}\n{USAGE}")),
            other => document = Some(PathBuf::from(other)),
        }
    }

    let document = document.ok_or_else(|| anyhow!(USAGE))?;
    if !document.exists() {
        return Err(anyhow!("File not found: {}", document.display()));
    }
    Ok(Args {
        document,
        overlay_dir,
        start_sentence,
        time_scale,
    })
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_filter(filter_layer),
        )
        .init();
    warn!("Logging initialized; override level with config.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|arg| arg.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_flags_in_any_order() {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be after epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("pdf-narrator-args-{nonce}.json"));
        fs::write(&path, "{}").expect("write temp file");
        let path_str = path.to_string_lossy().to_string();

        let parsed = parse_args(args(&[
            "--time-scale",
            "0.5",
            &path_str,
            "--overlay-dir",
            "frames",
            "--start",
            "3",
        ]))
        .expect("valid args");
        assert_eq!(parsed.document, path);
        assert_eq!(parsed.overlay_dir, Some(PathBuf::from("frames")));
        assert_eq!(parsed.start_sentence, Some(3));
        assert!((parsed.time_scale - 0.5).abs() < f64::EPSILON);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn rejects_missing_and_unknown_arguments() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["--loud"])).is_err());
        assert!(parse_args(args(&["/nonexistent/pdf-narrator.json"])).is_err());
        assert!(parse_args(args(&["--start"])).is_err());
        assert!(parse_args(args(&["--time-scale", "1e300"])).is_err());
        assert!(parse_args(args(&["--time-scale", "-1"])).is_err());
    }
}
