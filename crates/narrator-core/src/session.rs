use crate::config::AppConfig;
use crate::document::{
    Bitmap, PageCache, PdfDocument, PdfEngine, ReaderError, ReaderResult, Sentence, page_text,
};
use crate::highlight::{CanvasOverlay, HighlightPalette, PaintedRect, TextListView};
use crate::history::{HistoryEntry, HistoryStore, ReadingProgress};
use crate::locator::{DocumentIndex, FragmentLocator, nearest_fragment};
use crate::playback::{
    PlaybackAction, PlaybackController, PlaybackEvent, PlaybackState, PlaybackStatus,
};
use crate::progress::{ProgressReport, percent_complete, progress_report};
use crate::speech::{SpeechEngine, SpeechEvent, VoiceDescriptor, VoiceParams};
use crate::view::ViewCoordinator;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, warn};
use ts_rs::TS;

/// Work the host must carry out and report back on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostTask {
    /// Call [`ReaderSession::fire_timer`] with `ticket` after `delay`.
    Timer { ticket: u64, delay: Duration },
    /// Render `page`, then call [`ReaderSession::complete_navigation`].
    Navigate { request_id: u64, page: usize },
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct PlaybackView {
    pub state: PlaybackState,
    pub can_start: bool,
    pub halted: bool,
    pub progress: ProgressReport,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct HistoryItemView {
    pub entry: HistoryEntry,
    pub formatted_size: String,
    pub is_current: bool,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ReaderSnapshot {
    pub document_name: Option<String>,
    pub current_page: usize,
    pub total_pages: usize,
    pub pending_page: Option<usize>,
    pub scale: f32,
    pub text_view_active: bool,
    pub sentences: Vec<Sentence>,
    pub highlighted_sentence_idx: Option<usize>,
    pub highlights: Vec<PaintedRect>,
    pub playback: PlaybackView,
    pub voices: Vec<VoiceDescriptor>,
    pub history: Vec<HistoryItemView>,
    pub notice: Option<String>,
}

#[derive(Debug, Clone)]
pub enum SessionCommand {
    GetSnapshot,
    Start,
    Pause,
    Resume,
    TogglePause,
    Stop,
    NextSentence,
    PrevSentence,
    SentenceClick { sentence_idx: usize },
    CanvasClick { x: f32, y: f32 },
    ToggleTextView,
    ZoomIn,
    ZoomOut,
    SetZoom { scale: f32 },
    NextPage,
    PrevPage,
    SetPage { page: usize },
    SetVoiceParams { params: VoiceParams },
    SelectVoice { voice_id: Option<String> },
    DeleteHistory { index: usize },
    ClearHistory,
}

impl SessionCommand {
    pub fn action(&self) -> &'static str {
        match self {
            Self::GetSnapshot => "reader_get_snapshot",
            Self::Start => "reader_tts_start",
            Self::Pause => "reader_tts_pause",
            Self::Resume => "reader_tts_resume",
            Self::TogglePause => "reader_tts_toggle_pause",
            Self::Stop => "reader_tts_stop",
            Self::NextSentence => "reader_next_sentence",
            Self::PrevSentence => "reader_prev_sentence",
            Self::SentenceClick { .. } => "reader_sentence_click",
            Self::CanvasClick { .. } => "reader_canvas_click",
            Self::ToggleTextView => "reader_toggle_text_view",
            Self::ZoomIn => "reader_zoom_in",
            Self::ZoomOut => "reader_zoom_out",
            Self::SetZoom { .. } => "reader_set_zoom",
            Self::NextPage => "reader_next_page",
            Self::PrevPage => "reader_prev_page",
            Self::SetPage { .. } => "reader_set_page",
            Self::SetVoiceParams { .. } => "reader_set_voice_params",
            Self::SelectVoice { .. } => "reader_select_voice",
            Self::DeleteHistory { .. } => "reader_delete_history",
            Self::ClearHistory => "reader_clear_history",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub action: &'static str,
    pub snapshot: ReaderSnapshot,
}

struct LoadedDocument {
    name: String,
    size_bytes: u64,
    handle: Box<dyn PdfDocument>,
    index: DocumentIndex,
}

/// Single owner of one reader: the open document, playback, both views and
/// the collaborators they drive.
pub struct ReaderSession {
    config: AppConfig,
    engine: Box<dyn PdfEngine>,
    speech: Box<dyn SpeechEngine>,
    history: HistoryStore,
    document: Option<LoadedDocument>,
    pages: PageCache,
    locator: FragmentLocator,
    palette: HighlightPalette,
    controller: PlaybackController,
    view: ViewCoordinator,
    overlay: CanvasOverlay,
    text_list: TextListView,
    voices: Vec<VoiceDescriptor>,
    tasks: VecDeque<HostTask>,
    notice: Option<String>,
}

impl ReaderSession {
    pub fn new(
        config: AppConfig,
        engine: Box<dyn PdfEngine>,
        speech: Box<dyn SpeechEngine>,
        history: HistoryStore,
    ) -> Self {
        let view = ViewCoordinator::new(
            config.initial_zoom,
            config.zoom_limits(),
            config.start_in_text_view,
        );
        let voices = speech.list_voices();
        Self {
            engine,
            speech,
            history,
            document: None,
            pages: PageCache::new(),
            locator: FragmentLocator::new(config.locator_strategy),
            palette: config.highlight_palette(),
            controller: PlaybackController::new(
                0,
                config.voice_params(),
                config.playback_timing(),
            ),
            overlay: CanvasOverlay::new(Default::default(), view.scale()),
            view,
            text_list: TextListView::default(),
            voices,
            tasks: VecDeque::new(),
            notice: None,
            config,
        }
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn view(&self) -> &ViewCoordinator {
        &self.view
    }

    pub fn overlay(&self) -> &CanvasOverlay {
        &self.overlay
    }

    pub fn sentences(&self) -> &[Sentence] {
        self.document
            .as_ref()
            .map(|doc| doc.index.sentences())
            .unwrap_or(&[])
    }

    /// Open `bytes` as the new active document.
    ///
    /// On failure the previous document, if any, stays loaded untouched.
    pub fn load_document(&mut self, name: &str, bytes: &[u8]) -> ReaderResult<()> {
        let opened = self.engine.open(bytes).and_then(|handle| {
            let page_texts = extract_page_texts(handle.as_ref())?;
            Ok((handle, page_texts))
        });
        let (handle, page_texts) = match opened {
            Ok(opened) => opened,
            Err(err) => {
                warn!(name, "Failed to open document: {err}");
                self.notice = Some(err.to_string());
                return Err(err);
            }
        };
        let page_count = handle.page_count();
        let index = DocumentIndex::build(page_texts);

        self.teardown();
        self.controller.reset_for_document(index.len());
        self.view.reset_for_document(page_count);
        self.text_list = TextListView::new(index.len());
        info!(
            name,
            pages = page_count,
            sentences = index.len(),
            "Loaded document"
        );
        if index.is_empty() {
            info!(name, "Document has no readable sentences; playback disabled");
        }
        self.document = Some(LoadedDocument {
            name: name.to_string(),
            size_bytes: bytes.len() as u64,
            handle,
            index,
        });
        self.notice = None;
        self.refresh_page_surface();
        self.record_progress();
        Ok(())
    }

    /// Drop every trace of the previous document's playback and highlights.
    fn teardown(&mut self) {
        if let Some(previous) = self.document.take() {
            debug!(name = %previous.name, "Tearing down previous document");
        }
        self.speech.cancel();
        self.overlay.clear();
        self.text_list.clear();
        self.pages.invalidate();
        self.view.supersede_navigation();
        self.tasks.clear();
    }

    /// Reload the displayed page at the current scale and size the overlay to it.
    fn refresh_page_surface(&mut self) {
        let Some(doc) = self.document.as_ref() else {
            return;
        };
        if doc.handle.page_count() == 0 {
            return;
        }
        let scale = self.view.scale();
        match self
            .pages
            .get_or_load(doc.handle.as_ref(), self.view.current_page(), scale)
        {
            Ok(page) => self.overlay.resize(page.rendered_size, scale),
            Err(err) => warn!(page = self.view.current_page(), "Failed to load page: {err}"),
        }
    }

    pub fn apply_command(&mut self, command: SessionCommand) -> SessionEvent {
        let action = command.action();
        match command {
            SessionCommand::GetSnapshot => {}
            SessionCommand::Start => self.dispatch(PlaybackEvent::Start),
            SessionCommand::Pause => self.dispatch(PlaybackEvent::Pause),
            SessionCommand::Resume => self.dispatch(PlaybackEvent::Resume),
            SessionCommand::TogglePause => self.dispatch(PlaybackEvent::TogglePause),
            SessionCommand::Stop => self.dispatch(PlaybackEvent::Stop),
            SessionCommand::NextSentence => self.dispatch(PlaybackEvent::Next),
            SessionCommand::PrevSentence => self.dispatch(PlaybackEvent::Previous),
            SessionCommand::SentenceClick { sentence_idx } => {
                self.dispatch(PlaybackEvent::JumpTo(sentence_idx))
            }
            SessionCommand::CanvasClick { x, y } => self.canvas_click(x, y),
            SessionCommand::ToggleTextView => self.toggle_text_view(),
            SessionCommand::ZoomIn => {
                let changed = self.view.zoom_in();
                self.apply_zoom(changed);
            }
            SessionCommand::ZoomOut => {
                let changed = self.view.zoom_out();
                self.apply_zoom(changed);
            }
            SessionCommand::SetZoom { scale } => {
                let changed = self.view.set_zoom(scale);
                self.apply_zoom(changed);
            }
            SessionCommand::NextPage => self.go_to_page(self.view.current_page() + 1),
            SessionCommand::PrevPage => {
                self.go_to_page(self.view.current_page().saturating_sub(1))
            }
            SessionCommand::SetPage { page } => self.go_to_page(page),
            SessionCommand::SetVoiceParams { params } => {
                self.dispatch(PlaybackEvent::VoiceParamsChanged(params))
            }
            SessionCommand::SelectVoice { voice_id } => {
                let params = VoiceParams {
                    voice_id,
                    ..self.controller.voice_params().clone()
                };
                self.dispatch(PlaybackEvent::VoiceParamsChanged(params));
            }
            SessionCommand::DeleteHistory { index } => {
                if let Err(err) = self.history.delete_at(index) {
                    self.notice = Some(err.to_string());
                }
            }
            SessionCommand::ClearHistory => {
                if !self.history.clear() {
                    self.notice = Some("Could not clear reading history".to_string());
                }
            }
        }
        SessionEvent {
            action,
            snapshot: self.snapshot(),
        }
    }

    /// Forward an engine notification.
    pub fn handle_speech_event(&mut self, event: SpeechEvent) {
        match event {
            SpeechEvent::Ended(utterance) => {
                self.dispatch(PlaybackEvent::UtteranceEnded(utterance))
            }
            SpeechEvent::Failed { utterance, reason } => {
                self.notice = Some(format!("Speech error: {reason}"));
                self.dispatch(PlaybackEvent::UtteranceFailed {
                    utterance: Some(utterance),
                    reason,
                });
            }
            SpeechEvent::VoicesChanged => self.refresh_voices(),
        }
    }

    pub fn fire_timer(&mut self, ticket: u64) {
        self.dispatch(PlaybackEvent::TimerFired(ticket));
    }

    /// Drain the work queued for the host since the last call.
    pub fn take_tasks(&mut self) -> Vec<HostTask> {
        self.tasks.drain(..).collect()
    }

    /// The host finished a page render. Superseded requests are discarded.
    pub fn complete_navigation(&mut self, request_id: u64) -> bool {
        let Some(request) = self.view.complete_navigation(request_id) else {
            return false;
        };
        debug!(request_id, page = request.page, "Page navigation landed");
        self.refresh_page_surface();

        let current = self.controller.current_index();
        match request.sentence_index {
            Some(idx) if idx == current => self.paint_canvas(idx),
            Some(idx) => debug!(
                sentence_idx = idx,
                current, "Discarding highlight for superseded sentence"
            ),
            None => {
                let on_this_page = self
                    .document
                    .as_ref()
                    .and_then(|doc| doc.index.target_page(current))
                    == Some(request.page);
                if on_this_page
                    && ViewCoordinator::should_rehighlight(self.controller.status(), current)
                {
                    self.paint_canvas(current);
                }
            }
        }
        true
    }

    /// Rasterize the displayed page at the current zoom.
    pub fn render_current_page(&self) -> ReaderResult<Bitmap> {
        let doc = self
            .document
            .as_ref()
            .ok_or_else(|| ReaderError::Render("no document loaded".to_string()))?;
        doc.handle
            .page(self.view.current_page())?
            .render(self.view.scale())
    }

    fn dispatch(&mut self, event: PlaybackEvent) {
        let actions = self.controller.apply(event);
        self.run_actions(actions);
    }

    fn run_actions(&mut self, actions: Vec<PlaybackAction>) {
        for action in actions {
            match action {
                PlaybackAction::Speak { index } => self.speak(index),
                PlaybackAction::CancelUtterance => self.speech.cancel(),
                PlaybackAction::PauseUtterance => self.speech.pause(),
                PlaybackAction::ResumeUtterance => self.speech.resume(),
                PlaybackAction::ScheduleSpeak {
                    index,
                    delay,
                    ticket,
                } => {
                    debug!(sentence_idx = index, ticket, delay_ms = delay.as_millis() as u64, "Queued speak timer");
                    self.tasks.push_back(HostTask::Timer { ticket, delay });
                }
                PlaybackAction::Highlight { index } => self.highlight_sentence(index),
                PlaybackAction::ClearHighlights => {
                    self.overlay.clear();
                    self.text_list.clear();
                    self.view.supersede_navigation();
                }
                PlaybackAction::ProgressChanged => self.record_progress(),
            }
        }
    }

    fn speak(&mut self, index: usize) {
        let Some(text) = self
            .document
            .as_ref()
            .and_then(|doc| doc.index.sentence(index))
            .map(|sentence| sentence.text.clone())
        else {
            warn!(sentence_idx = index, "No sentence to speak");
            return;
        };
        info!(
            sentence_idx = index,
            total = self.controller.sentence_count(),
            "Speaking sentence"
        );
        let params = self.controller.voice_params().clone();
        let follow_up = match self.speech.speak(&text, &params) {
            Ok(utterance) => self
                .controller
                .apply(PlaybackEvent::UtteranceStarted(utterance)),
            Err(err) => {
                self.notice = Some(err.to_string());
                self.controller.apply(PlaybackEvent::UtteranceFailed {
                    utterance: None,
                    reason: err.to_string(),
                })
            }
        };
        self.run_actions(follow_up);
    }

    fn highlight_sentence(&mut self, index: usize) {
        if self.view.text_view_active() {
            self.text_list.highlight(index);
            return;
        }
        let Some(target) = self
            .document
            .as_ref()
            .map(|doc| doc.index.target_page(index).unwrap_or(self.view.current_page()))
        else {
            return;
        };
        if target != self.view.current_page() {
            if let Some(request) = self.view.request_page(target, Some(index)) {
                // Paint once the page is up; the old page's marks are stale now.
                self.overlay.clear();
                self.tasks.push_back(HostTask::Navigate {
                    request_id: request.request_id,
                    page: request.page,
                });
            }
            return;
        }
        self.view.supersede_navigation();
        self.paint_canvas(index);
    }

    fn paint_canvas(&mut self, index: usize) {
        if self.view.text_view_active() {
            return;
        }
        let Some(doc) = self.document.as_ref() else {
            return;
        };
        let page_number = self.view.current_page();
        let page = match self
            .pages
            .get_or_load(doc.handle.as_ref(), page_number, self.view.scale())
        {
            Ok(page) => page,
            Err(err) => {
                warn!(page = page_number, "Cannot highlight; page unavailable: {err}");
                return;
            }
        };
        let plan = self
            .locator
            .plan(&doc.index, index, page_number, &page.fragments);
        self.overlay
            .paint_plan(&page.fragments, &plan.completed, &plan.current, &self.palette);
    }

    fn toggle_text_view(&mut self) {
        let text_view = self.view.toggle_text_view();
        if text_view {
            // A page render still in flight belongs to the canvas view.
            self.view.supersede_navigation();
            self.overlay.clear();
        } else {
            self.text_list.clear();
        }
        let current = self.controller.current_index();
        if ViewCoordinator::should_rehighlight(self.controller.status(), current) {
            self.highlight_sentence(current);
        }
    }

    fn apply_zoom(&mut self, changed: Option<f32>) {
        if changed.is_none() {
            return;
        }
        self.pages.invalidate();
        self.refresh_page_surface();
        let current = self.controller.current_index();
        if !self.view.text_view_active()
            && ViewCoordinator::should_rehighlight(self.controller.status(), current)
        {
            self.highlight_sentence(current);
        }
    }

    fn go_to_page(&mut self, page: usize) {
        if self.document.is_none() {
            return;
        }
        if let Some(request) = self.view.request_page(page, None) {
            self.tasks.push_back(HostTask::Navigate {
                request_id: request.request_id,
                page: request.page,
            });
        }
    }

    fn canvas_click(&mut self, x: f32, y: f32) {
        if self.view.text_view_active() {
            return;
        }
        let Some(doc) = self.document.as_ref() else {
            return;
        };
        let scale = self.view.scale();
        let Ok(page) = self
            .pages
            .get_or_load(doc.handle.as_ref(), self.view.current_page(), scale)
        else {
            return;
        };
        let canvas_height = page.rendered_size.height as f32;
        let sentence = nearest_fragment(
            &page.fragments,
            x,
            y,
            scale,
            canvas_height,
            self.config.click_seek_distance,
        )
        .and_then(|fragment| doc.index.sentence_at_fragment(&page.fragments, fragment));
        match sentence {
            Some(sentence_idx) => {
                info!(sentence_idx, x, y, "Canvas click resolved to sentence");
                self.dispatch(PlaybackEvent::JumpTo(sentence_idx));
            }
            None => debug!(x, y, "Canvas click not near any text"),
        }
    }

    fn refresh_voices(&mut self) {
        self.voices = self.speech.list_voices();
        debug!(count = self.voices.len(), "Voice list changed");
        let params = self.controller.voice_params().clone();
        if let Some(selected) = params.voice_id.as_deref() {
            if !self.voices.iter().any(|voice| voice.id == selected) {
                warn!(voice = selected, "Selected voice disappeared; using default");
                self.dispatch(PlaybackEvent::VoiceParamsChanged(VoiceParams {
                    voice_id: None,
                    ..params
                }));
            }
        }
    }

    fn record_progress(&mut self) {
        let Some(doc) = self.document.as_ref() else {
            return;
        };
        let total = doc.index.len();
        let last_index = self.controller.current_index();
        let entry = HistoryEntry::new(
            doc.name.clone(),
            doc.size_bytes,
            ReadingProgress {
                last_index,
                total_sentences: total,
                percent_complete: percent_complete(last_index, total),
            },
        );
        if !self.history.upsert(entry) {
            debug!("Reading progress not persisted");
        }
    }

    pub fn progress(&self) -> ProgressReport {
        progress_report(
            self.controller.current_index(),
            self.controller.sentence_count(),
            self.controller.status(),
            self.config.secs_per_sentence,
        )
    }

    pub fn snapshot(&self) -> ReaderSnapshot {
        let document_name = self.document.as_ref().map(|doc| doc.name.clone());
        let history = self
            .history
            .list()
            .into_iter()
            .map(|entry| HistoryItemView {
                formatted_size: entry.formatted_size(),
                is_current: document_name.as_deref() == Some(entry.name.as_str()),
                entry,
            })
            .collect();
        ReaderSnapshot {
            current_page: self.view.current_page(),
            total_pages: self.view.page_count(),
            pending_page: self.view.pending_navigation().map(|request| request.page),
            scale: self.view.scale(),
            text_view_active: self.view.text_view_active(),
            sentences: self.sentences().to_vec(),
            highlighted_sentence_idx: self.text_list.highlighted(),
            highlights: self.overlay.painted().to_vec(),
            playback: PlaybackView {
                state: self.controller.state().clone(),
                can_start: self.controller.has_content()
                    && self.controller.status() != PlaybackStatus::Reading,
                halted: self.controller.is_halted(),
                progress: self.progress(),
            },
            voices: self.voices.clone(),
            history,
            notice: self.notice.clone(),
            document_name,
        }
    }
}

/// Concatenated fragment text of every page, page 1 first.
fn extract_page_texts(document: &dyn PdfDocument) -> ReaderResult<Vec<String>> {
    (1..=document.page_count())
        .map(|page_number| {
            let fragments = document.page(page_number)?.fragments()?;
            Ok(page_text(&fragments))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DumpEngine, PdfPage};
    use crate::speech::UtteranceId;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Script {
        spoken: Vec<String>,
        cancels: usize,
        pauses: usize,
        voices: Vec<VoiceDescriptor>,
        refuse: bool,
    }

    struct ScriptedSpeech {
        script: Rc<RefCell<Script>>,
        next_id: u64,
    }

    impl SpeechEngine for ScriptedSpeech {
        fn speak(&mut self, text: &str, _params: &VoiceParams) -> ReaderResult<UtteranceId> {
            let mut script = self.script.borrow_mut();
            if script.refuse {
                return Err(ReaderError::Speech("synthesis unavailable".to_string()));
            }
            script.spoken.push(text.to_string());
            self.next_id += 1;
            Ok(UtteranceId(self.next_id))
        }

        fn pause(&mut self) {
            self.script.borrow_mut().pauses += 1;
        }

        fn resume(&mut self) {}

        fn cancel(&mut self) {
            self.script.borrow_mut().cancels += 1;
        }

        fn list_voices(&self) -> Vec<VoiceDescriptor> {
            self.script.borrow().voices.clone()
        }
    }

    const TWO_PAGES: &str = r#"{"pages": [
        {"width": 200, "height": 100, "items": [
            {"str": "The quick brown fox jumps. ", "x": 10, "y": 80, "width": 150, "height": 10},
            {"str": "Lazy dogs sleep all day long.", "x": 10, "y": 60, "width": 150, "height": 10}
        ]},
        {"width": 200, "height": 100, "items": [
            {"str": "Second page sentence here.", "x": 10, "y": 80, "width": 150, "height": 10}
        ]}
    ]}"#;

    /// Opens dumps normally, but `UNREADABLE` opens a document whose text
    /// layer cannot be extracted.
    struct PartlyBrokenEngine;

    const UNREADABLE: &[u8] = b"unreadable";

    struct UnreadableDocument;

    impl PdfDocument for UnreadableDocument {
        fn page_count(&self) -> usize {
            1
        }

        fn page(&self, _page_number: usize) -> ReaderResult<Box<dyn PdfPage + '_>> {
            Err(ReaderError::Render("text layer unreadable".to_string()))
        }
    }

    impl PdfEngine for PartlyBrokenEngine {
        fn open(&self, bytes: &[u8]) -> ReaderResult<Box<dyn PdfDocument>> {
            if bytes == UNREADABLE {
                return Ok(Box::new(UnreadableDocument));
            }
            DumpEngine::new().open(bytes)
        }
    }

    fn session() -> (ReaderSession, Rc<RefCell<Script>>) {
        session_with(Box::new(DumpEngine::new()))
    }

    fn session_with(engine: Box<dyn PdfEngine>) -> (ReaderSession, Rc<RefCell<Script>>) {
        let script = Rc::new(RefCell::new(Script::default()));
        let speech = ScriptedSpeech {
            script: Rc::clone(&script),
            next_id: 0,
        };
        let mut config = AppConfig::default();
        config.initial_zoom = 1.0;
        let session = ReaderSession::new(
            config,
            engine,
            Box::new(speech),
            HistoryStore::in_memory(),
        );
        (session, script)
    }

    fn loaded() -> (ReaderSession, Rc<RefCell<Script>>) {
        let (mut session, script) = session();
        session
            .load_document("fox.pdf", TWO_PAGES.as_bytes())
            .expect("dump should load");
        (session, script)
    }

    fn timer_ticket(tasks: &[HostTask]) -> u64 {
        tasks
            .iter()
            .find_map(|task| match task {
                HostTask::Timer { ticket, .. } => Some(*ticket),
                HostTask::Navigate { .. } => None,
            })
            .expect("timer task")
    }

    #[test]
    fn start_speaks_and_highlights_first_sentence() {
        let (mut session, script) = loaded();
        assert_eq!(session.sentences().len(), 3);
        let event = session.apply_command(SessionCommand::Start);
        assert_eq!(event.action, "reader_tts_start");
        assert_eq!(event.snapshot.playback.state.status, PlaybackStatus::Reading);
        assert_eq!(script.borrow().spoken, vec!["The quick brown fox jumps"]);
        assert_eq!(event.snapshot.highlights.len(), 1);
        assert_eq!(event.snapshot.highlights[0].fragment_index, 0);
        assert_eq!(event.snapshot.playback.progress.position_label, "Sentence 1 of 3");
    }

    #[test]
    fn utterance_end_advances_after_timer() {
        let (mut session, script) = loaded();
        session.apply_command(SessionCommand::Start);
        session.handle_speech_event(SpeechEvent::Ended(UtteranceId(1)));
        assert_eq!(session.playback().current_index(), 1);
        let ticket = timer_ticket(&session.take_tasks());
        session.fire_timer(ticket);
        assert_eq!(script.borrow().spoken.len(), 2);
        assert_eq!(script.borrow().spoken[1], "Lazy dogs sleep all day long");

        let snapshot = session.snapshot();
        let roles: Vec<_> = snapshot.highlights.iter().map(|p| p.fragment_index).collect();
        assert_eq!(roles, vec![0, 1]);
    }

    #[test]
    fn sentence_on_next_page_waits_for_navigation() {
        let (mut session, _script) = loaded();
        session.apply_command(SessionCommand::Start);
        session.apply_command(SessionCommand::SentenceClick { sentence_idx: 2 });
        let tasks = session.take_tasks();
        let Some(HostTask::Navigate { request_id, page }) = tasks.last().copied() else {
            panic!("expected navigation, got {tasks:?}");
        };
        assert_eq!(page, 2);
        assert!(session.overlay().painted().is_empty());

        assert!(session.complete_navigation(request_id));
        assert_eq!(session.view().current_page(), 2);
        assert_eq!(session.overlay().painted().len(), 1);
        assert!(!session.complete_navigation(request_id));
    }

    #[test]
    fn superseded_navigation_is_discarded() {
        let (mut session, _script) = loaded();
        session.apply_command(SessionCommand::Start);
        session.apply_command(SessionCommand::SentenceClick { sentence_idx: 2 });
        let stale = session.take_tasks();
        session.apply_command(SessionCommand::SentenceClick { sentence_idx: 0 });
        let Some(HostTask::Navigate { request_id, .. }) = stale.last().copied() else {
            panic!("expected navigation");
        };
        assert!(!session.complete_navigation(request_id));
        assert_eq!(session.view().current_page(), 1);
        assert_eq!(session.overlay().painted()[0].fragment_index, 0);
    }

    #[test]
    fn text_view_toggle_drops_pending_canvas_navigation() {
        let (mut session, _script) = loaded();
        session.apply_command(SessionCommand::Start);
        session.apply_command(SessionCommand::SentenceClick { sentence_idx: 2 });
        let Some(HostTask::Navigate { request_id, .. }) = session.take_tasks().last().copied()
        else {
            panic!("expected navigation");
        };
        let event = session.apply_command(SessionCommand::ToggleTextView);
        assert_eq!(event.snapshot.highlighted_sentence_idx, Some(2));

        assert!(!session.complete_navigation(request_id));
        let snapshot = session.snapshot();
        assert!(snapshot.text_view_active);
        assert!(snapshot.highlights.is_empty());
        assert_eq!(snapshot.highlighted_sentence_idx, Some(2));
    }

    #[test]
    fn stop_discards_navigation_in_flight() {
        let (mut session, _script) = loaded();
        session.apply_command(SessionCommand::Start);
        session.apply_command(SessionCommand::SentenceClick { sentence_idx: 2 });
        let Some(HostTask::Navigate { request_id, .. }) = session.take_tasks().last().copied()
        else {
            panic!("expected navigation");
        };
        session.apply_command(SessionCommand::Stop);

        assert!(!session.complete_navigation(request_id));
        assert_eq!(session.view().current_page(), 1);
        assert!(session.overlay().painted().is_empty());
        assert_eq!(session.playback().current_index(), 0);
    }

    #[test]
    fn invalid_bytes_keep_previous_document() {
        let (mut session, _script) = loaded();
        let err = session.load_document("broken.pdf", b"not a pdf");
        assert!(matches!(err, Err(ReaderError::InvalidFormat(_))));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.document_name.as_deref(), Some("fox.pdf"));
        assert!(snapshot.notice.is_some());
    }

    #[test]
    fn failed_extraction_is_reported_like_failed_open() {
        let (mut session, _script) = session_with(Box::new(PartlyBrokenEngine));
        session
            .load_document("fox.pdf", TWO_PAGES.as_bytes())
            .expect("dump should load");
        session.apply_command(SessionCommand::Start);

        let err = session.load_document("scan.pdf", UNREADABLE);
        assert!(matches!(err, Err(ReaderError::Render(_))));
        let snapshot = session.snapshot();
        assert_eq!(snapshot.document_name.as_deref(), Some("fox.pdf"));
        assert_eq!(
            snapshot.notice.as_deref(),
            Some("Render error: text layer unreadable")
        );
        assert_eq!(snapshot.playback.state.status, PlaybackStatus::Reading);
    }

    #[test]
    fn new_document_tears_down_playback() {
        let (mut session, script) = loaded();
        session.apply_command(SessionCommand::Start);
        session.apply_command(SessionCommand::NextSentence);
        session.handle_speech_event(SpeechEvent::Ended(UtteranceId(2)));
        let cancels_before = script.borrow().cancels;

        session
            .load_document("other.pdf", TWO_PAGES.as_bytes())
            .expect("reload");
        assert!(session.take_tasks().is_empty());
        assert!(script.borrow().cancels > cancels_before);
        assert_eq!(session.playback().current_index(), 0);
        assert_eq!(session.playback().status(), PlaybackStatus::Stopped);
        assert!(session.overlay().painted().is_empty());
        let history = session.snapshot().history;
        assert_eq!(history[0].entry.name, "other.pdf");
        assert!(history[0].is_current);
    }

    #[test]
    fn toggle_pause_suspends_speech_in_place() {
        let (mut session, script) = loaded();
        session.apply_command(SessionCommand::Start);
        let event = session.apply_command(SessionCommand::TogglePause);
        assert_eq!(event.snapshot.playback.state.status, PlaybackStatus::Paused);
        assert_eq!(script.borrow().pauses, 1);
        let event = session.apply_command(SessionCommand::TogglePause);
        assert_eq!(event.snapshot.playback.state.status, PlaybackStatus::Reading);
        assert_eq!(script.borrow().spoken.len(), 1);
    }

    #[test]
    fn text_view_receives_highlight_on_toggle() {
        let (mut session, _script) = loaded();
        session.apply_command(SessionCommand::Start);
        session.apply_command(SessionCommand::NextSentence);
        let event = session.apply_command(SessionCommand::ToggleTextView);
        assert!(event.snapshot.text_view_active);
        assert_eq!(event.snapshot.highlighted_sentence_idx, Some(1));
        assert!(event.snapshot.highlights.is_empty());

        let event = session.apply_command(SessionCommand::ToggleTextView);
        assert_eq!(event.snapshot.highlighted_sentence_idx, None);
        assert!(!event.snapshot.highlights.is_empty());
    }

    #[test]
    fn canvas_click_jumps_to_sentence() {
        let (mut session, script) = loaded();
        // Second fragment: y 60, height 10 on a 100pt page at 1.0 -> canvas y 30..40.
        session.apply_command(SessionCommand::CanvasClick { x: 50.0, y: 35.0 });
        assert_eq!(session.playback().current_index(), 1);
        assert_eq!(session.playback().status(), PlaybackStatus::Stopped);
        assert!(script.borrow().spoken.is_empty());

        session.apply_command(SessionCommand::CanvasClick { x: 199.0, y: 99.0 });
        assert_eq!(session.playback().current_index(), 1);
    }

    #[test]
    fn zoom_rescales_overlay_and_repaints() {
        let (mut session, _script) = loaded();
        session.apply_command(SessionCommand::Start);
        let event = session.apply_command(SessionCommand::ZoomIn);
        assert!((event.snapshot.scale - 1.1).abs() < 1e-6);
        assert_eq!(session.overlay().image().dimensions(), (220, 110));
        assert_eq!(event.snapshot.highlights.len(), 1);
    }

    #[test]
    fn vanished_voice_falls_back_to_default() {
        let (mut session, script) = loaded();
        script.borrow_mut().voices = vec![VoiceDescriptor {
            id: "en-1".to_string(),
            name: "English".to_string(),
            lang: "en-US".to_string(),
            is_default: true,
        }];
        session.apply_command(SessionCommand::SelectVoice {
            voice_id: Some("de-1".to_string()),
        });
        session.apply_command(SessionCommand::Start);
        session.handle_speech_event(SpeechEvent::VoicesChanged);
        assert_eq!(session.playback().voice_params().voice_id, None);
        assert_eq!(session.playback().current_index(), 0);
        assert!(
            session
                .take_tasks()
                .iter()
                .any(|task| matches!(task, HostTask::Timer { .. }))
        );
    }

    #[test]
    fn refused_speech_halts_without_crashing() {
        let (mut session, script) = loaded();
        script.borrow_mut().refuse = true;
        let event = session.apply_command(SessionCommand::Start);
        assert!(event.snapshot.playback.halted);
        assert_eq!(event.snapshot.playback.state.status, PlaybackStatus::Reading);
        assert!(event.snapshot.notice.is_some());

        script.borrow_mut().refuse = false;
        session.apply_command(SessionCommand::Start);
        assert_eq!(script.borrow().spoken, vec!["The quick brown fox jumps"]);
    }

    #[test]
    fn empty_document_disables_start() {
        let (mut session, script) = session();
        session
            .load_document("blank.pdf", br#"{"pages": [{"width": 10, "height": 10}]}"#)
            .expect("blank dump loads");
        let event = session.apply_command(SessionCommand::Start);
        assert!(!event.snapshot.playback.can_start);
        assert_eq!(event.snapshot.playback.state.status, PlaybackStatus::Stopped);
        assert!(script.borrow().spoken.is_empty());
    }

    #[test]
    fn history_delete_reports_bad_index() {
        let (mut session, _script) = loaded();
        let event = session.apply_command(SessionCommand::DeleteHistory { index: 4 });
        assert!(event.snapshot.notice.is_some());
        assert_eq!(event.snapshot.history.len(), 1);
        let event = session.apply_command(SessionCommand::ClearHistory);
        assert!(event.snapshot.history.is_empty());
    }
}
