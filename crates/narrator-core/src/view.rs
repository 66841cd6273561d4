//! Which view is showing, at what zoom, on which page.
//!
//! Page navigation is asynchronous: a request gets an id, and only the most
//! recent request may land. Anything older is dropped when it completes.

use crate::playback::PlaybackStatus;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min: f32,
    pub max: f32,
    pub step: f32,
    /// Smaller adjustments are ignored rather than re-rendering.
    pub min_change: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 2.0,
            step: 0.1,
            min_change: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationRequest {
    pub request_id: u64,
    pub page: usize,
    /// Sentence to highlight once the page is up.
    pub sentence_index: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ViewCoordinator {
    text_view_active: bool,
    scale: f32,
    limits: ZoomLimits,
    current_page: usize,
    page_count: usize,
    request_id: u64,
    pending: Option<NavigationRequest>,
}

impl ViewCoordinator {
    pub fn new(initial_scale: f32, limits: ZoomLimits, text_view_active: bool) -> Self {
        let scale = if initial_scale.is_finite() {
            initial_scale.clamp(limits.min, limits.max)
        } else {
            limits.min.max(1.0).min(limits.max)
        };
        Self {
            text_view_active,
            scale,
            limits,
            current_page: 1,
            page_count: 0,
            request_id: 0,
            pending: None,
        }
    }

    /// Point at page 1 of a new document and forget in-flight navigation.
    pub fn reset_for_document(&mut self, page_count: usize) {
        self.page_count = page_count;
        self.current_page = 1;
        self.supersede_navigation();
    }

    pub fn text_view_active(&self) -> bool {
        self.text_view_active
    }

    pub fn toggle_text_view(&mut self) -> bool {
        self.text_view_active = !self.text_view_active;
        info!(text_view = self.text_view_active, "Toggled reader view");
        self.text_view_active
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn pending_navigation(&self) -> Option<NavigationRequest> {
        self.pending
    }

    pub fn zoom_in(&mut self) -> Option<f32> {
        self.set_zoom(self.scale + self.limits.step)
    }

    pub fn zoom_out(&mut self) -> Option<f32> {
        self.set_zoom(self.scale - self.limits.step)
    }

    /// Apply a clamped zoom; returns the new scale when it actually changed.
    pub fn set_zoom(&mut self, target: f32) -> Option<f32> {
        if !target.is_finite() {
            return None;
        }
        let clamped = target.clamp(self.limits.min, self.limits.max);
        if (clamped - self.scale).abs() <= self.limits.min_change {
            debug!(scale = self.scale, target, "Zoom change too small; ignoring");
            return None;
        }
        // Keep repeated steps from drifting off the 0.1 grid.
        self.scale = (clamped * 100.0).round() / 100.0;
        info!(scale = self.scale, "Zoom changed");
        Some(self.scale)
    }

    /// Ask for `page` (clamped to the document). `None` when already there
    /// with nothing in flight.
    pub fn request_page(
        &mut self,
        page: usize,
        sentence_index: Option<usize>,
    ) -> Option<NavigationRequest> {
        if self.page_count == 0 {
            return None;
        }
        let page = page.clamp(1, self.page_count);
        if page == self.current_page && self.pending.is_none() {
            return None;
        }
        self.request_id = self.request_id.wrapping_add(1);
        let request = NavigationRequest {
            request_id: self.request_id,
            page,
            sentence_index,
        };
        debug!(
            request_id = request.request_id,
            page,
            sentence_idx = ?sentence_index,
            "Requested page navigation"
        );
        self.pending = Some(request);
        Some(request)
    }

    /// Invalidate whatever navigation is in flight.
    pub fn supersede_navigation(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(request_id = pending.request_id, "Superseded page navigation");
        }
        self.request_id = self.request_id.wrapping_add(1);
    }

    /// Land a navigation. Returns the request if it is still the latest one.
    pub fn complete_navigation(&mut self, request_id: u64) -> Option<NavigationRequest> {
        match self.pending {
            Some(pending) if pending.request_id == request_id => {
                self.pending = None;
                self.current_page = pending.page;
                Some(pending)
            }
            _ => {
                debug!(
                    request_id,
                    current = self.request_id,
                    "Ignoring stale page navigation"
                );
                None
            }
        }
    }

    /// Whether a view or zoom change should re-paint the current sentence.
    pub fn should_rehighlight(status: PlaybackStatus, current_index: usize) -> bool {
        status != PlaybackStatus::Stopped || current_index > 0
    }
}
