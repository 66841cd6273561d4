//! Headless event loop: runs the session's host tasks on a wall clock and
//! feeds speech completions back until the document is read or interrupted.

use crate::console_speech::ConsoleClock;
use anyhow::{Context, Result};
use narrator_core::playback::PlaybackStatus;
use narrator_core::session::{HostTask, ReaderSession, SessionCommand};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Upper bound on one sleep so Ctrl+C is noticed promptly.
const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// Timers further out than this are pulled in to it.
const MAX_TIMER_DELAY: Duration = Duration::from_secs(60 * 60);

pub struct Driver {
    session: ReaderSession,
    clock: Rc<RefCell<ConsoleClock>>,
    timers: Vec<(Instant, u64)>,
    overlay_dir: Option<PathBuf>,
    last_written: Option<(usize, usize)>,
}

impl Driver {
    pub fn new(
        session: ReaderSession,
        clock: Rc<RefCell<ConsoleClock>>,
        overlay_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            session,
            clock,
            timers: Vec::new(),
            overlay_dir,
            last_written: None,
        }
    }

    pub fn run(&mut self, start_sentence: Option<usize>, interrupted: &Arc<AtomicBool>) -> Result<()> {
        if let Some(dir) = &self.overlay_dir {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create overlay dir {}", dir.display()))?;
        }
        if let Some(sentence_idx) = start_sentence {
            self.session
                .apply_command(SessionCommand::SentenceClick { sentence_idx });
        }
        let event = self.session.apply_command(SessionCommand::Start);
        if event.snapshot.playback.state.status != PlaybackStatus::Reading {
            warn!("Nothing to read in this document");
            return Ok(());
        }

        loop {
            self.drain_tasks();
            self.write_overlay_if_changed();

            if interrupted.load(Ordering::SeqCst) {
                info!("Interrupted; stopping playback");
                self.session.apply_command(SessionCommand::Stop);
                break;
            }
            if self.session.playback().status() == PlaybackStatus::Stopped {
                info!("Playback finished");
                break;
            }

            let now = Instant::now();
            let finished = self.clock.borrow_mut().poll(now);
            if let Some(event) = finished {
                self.session.handle_speech_event(event);
                continue;
            }
            if let Some(pos) = self.timers.iter().position(|(due, _)| *due <= now) {
                let (_, ticket) = self.timers.remove(pos);
                self.session.fire_timer(ticket);
                continue;
            }
            if self.session.playback().is_halted() {
                warn!("Speech failed; stopping headless run");
                self.session.apply_command(SessionCommand::Stop);
                break;
            }

            let next_due = self
                .timers
                .iter()
                .map(|(due, _)| *due)
                .chain(self.clock.borrow().next_deadline())
                .min();
            let wait = next_due
                .map(|due| due.saturating_duration_since(now))
                .unwrap_or(POLL_INTERVAL)
                .min(POLL_INTERVAL);
            thread::sleep(wait);
        }

        let progress = self.session.progress();
        info!(
            position = %progress.position_label,
            percent = progress.percent_rounded(),
            "Session closed"
        );
        Ok(())
    }

    fn drain_tasks(&mut self) {
        for task in self.session.take_tasks() {
            match task {
                HostTask::Timer { ticket, delay } => {
                    self.timers.push((timer_deadline(Instant::now(), delay), ticket));
                }
                HostTask::Navigate { request_id, page } => {
                    // Rendering is synchronous here, so the page is "up" immediately.
                    debug!(request_id, page, "Completing page navigation");
                    self.session.complete_navigation(request_id);
                }
            }
        }
    }

    fn write_overlay_if_changed(&mut self) {
        let Some(dir) = self.overlay_dir.clone() else {
            return;
        };
        let key = (
            self.session.view().current_page(),
            self.session.playback().current_index(),
        );
        if self.last_written == Some(key) || self.session.overlay().painted().is_empty() {
            return;
        }
        self.last_written = Some(key);
        if let Err(err) = write_frame(&self.session, &dir, key.1) {
            warn!(sentence_idx = key.1, "Failed to write overlay frame: {err:#}");
        }
    }
}

fn timer_deadline(now: Instant, delay: Duration) -> Instant {
    now.checked_add(delay.min(MAX_TIMER_DELAY)).unwrap_or(now)
}

/// Composite the highlight overlay onto the rendered page and save it as PNG.
fn write_frame(session: &ReaderSession, dir: &Path, sentence_idx: usize) -> Result<()> {
    let mut frame = session
        .render_current_page()
        .context("Failed to render page")?;
    let overlay = session.overlay().image();
    if overlay.dimensions() == frame.dimensions() {
        image::imageops::overlay(&mut frame, overlay, 0, 0);
    }
    let path = dir.join(format!("sentence-{sentence_idx:04}.png"));
    frame
        .save(&path)
        .with_context(|| format!("Failed to save {}", path.display()))?;
    debug!(path = %path.display(), "Wrote overlay frame");
    Ok(())
}
