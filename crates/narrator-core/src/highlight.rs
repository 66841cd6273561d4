//! Highlight painting for the canvas overlay and the text list.
//!
//! Fragment geometry lives in unscaled page space with the Y axis measured up
//! from the bottom edge. The overlay is a top-left-origin raster at the
//! current zoom, sized to the page bitmap it sits on.

use crate::config::HighlightColor;
use crate::document::{RenderedSize, TextFragment};
use image::{Pixel, Rgba, RgbaImage};
use serde::Serialize;
use tracing::{debug, trace};
use ts_rs::TS;

/// Extra pixels painted around every highlighted fragment.
pub const HIGHLIGHT_PADDING: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum HighlightRole {
    Current,
    Completed,
}

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct CanvasRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CanvasRect {
    fn padded(self, padding: f32) -> Self {
        Self {
            x: self.x - padding,
            y: self.y - padding,
            width: self.width + padding * 2.0,
            height: self.height + padding * 2.0,
        }
    }
}

/// Convert a fragment's page-space box to canvas space.
///
/// `canvas_height` is the rendered page height in pixels at `scale`.
pub fn canvas_rect(fragment: &TextFragment, scale: f32, canvas_height: f32) -> CanvasRect {
    CanvasRect {
        x: fragment.x * scale,
        y: (canvas_height / scale - fragment.y - fragment.height) * scale,
        width: fragment.width * scale,
        height: fragment.height * scale,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RoleColors {
    pub fill: HighlightColor,
    pub stroke: HighlightColor,
}

/// Fill and stroke per role, taken from configuration.
#[derive(Debug, Clone, Copy)]
pub struct HighlightPalette {
    pub current: RoleColors,
    pub completed: RoleColors,
}

impl HighlightPalette {
    fn colors(&self, role: HighlightRole) -> RoleColors {
        match role {
            HighlightRole::Current => self.current,
            HighlightRole::Completed => self.completed,
        }
    }
}

fn to_rgba(color: HighlightColor) -> Rgba<u8> {
    let channel = |value: f32| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
    Rgba([
        channel(color.r),
        channel(color.g),
        channel(color.b),
        channel(color.a),
    ])
}

/// A rectangle that has been painted, kept so front-ends that draw their own
/// overlay can replay it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct PaintedRect {
    pub role: HighlightRole,
    pub fragment_index: usize,
    pub rect: CanvasRect,
}

/// Transparent raster laid over the rendered page.
#[derive(Debug, Clone)]
pub struct CanvasOverlay {
    image: RgbaImage,
    scale: f32,
    painted: Vec<PaintedRect>,
}

impl CanvasOverlay {
    pub fn new(size: RenderedSize, scale: f32) -> Self {
        Self {
            image: RgbaImage::new(size.width, size.height),
            scale,
            painted: Vec::new(),
        }
    }

    /// Match a freshly rendered page; drops whatever was painted.
    pub fn resize(&mut self, size: RenderedSize, scale: f32) {
        if self.image.dimensions() != (size.width, size.height) {
            debug!(
                width = size.width,
                height = size.height,
                scale,
                "Resizing highlight overlay"
            );
            self.image = RgbaImage::new(size.width, size.height);
        } else {
            self.clear();
        }
        self.scale = scale;
        self.painted.clear();
    }

    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
        self.painted.clear();
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn painted(&self) -> &[PaintedRect] {
        &self.painted
    }

    /// Paint one fragment. Rectangles are clipped to the overlay bounds.
    pub fn paint(
        &mut self,
        fragment: &TextFragment,
        fragment_index: usize,
        role: HighlightRole,
        palette: &HighlightPalette,
    ) {
        let (width, height) = self.image.dimensions();
        let rect = canvas_rect(fragment, self.scale, height as f32).padded(HIGHLIGHT_PADDING);
        let colors = palette.colors(role);
        let fill = to_rgba(colors.fill);
        let stroke = to_rgba(colors.stroke);

        let x0 = rect.x.floor().max(0.0) as u32;
        let y0 = rect.y.floor().max(0.0) as u32;
        let x1 = ((rect.x + rect.width).ceil().max(0.0) as u32).min(width);
        let y1 = ((rect.y + rect.height).ceil().max(0.0) as u32).min(height);
        if x0 >= x1 || y0 >= y1 {
            trace!(fragment_index, "Highlight rectangle falls outside overlay");
            return;
        }

        for y in y0..y1 {
            for x in x0..x1 {
                let on_edge = x == x0 || x + 1 == x1 || y == y0 || y + 1 == y1;
                let color = if on_edge { stroke } else { fill };
                self.image.get_pixel_mut(x, y).blend(&color);
            }
        }
        self.painted.push(PaintedRect {
            role,
            fragment_index,
            rect,
        });
    }

    /// Clear, then paint completed markers under the current highlight.
    pub fn paint_plan(
        &mut self,
        fragments: &[TextFragment],
        completed: &[usize],
        current: &[usize],
        palette: &HighlightPalette,
    ) {
        self.clear();
        let layers = completed
            .iter()
            .map(|idx| (*idx, HighlightRole::Completed))
            .chain(current.iter().map(|idx| (*idx, HighlightRole::Current)));
        for (idx, role) in layers {
            if let Some(fragment) = fragments.get(idx) {
                self.paint(fragment, idx, role, palette);
            }
        }
    }
}

/// Marker state for the sentence list shown in text view.
#[derive(Debug, Clone, Default)]
pub struct TextListView {
    markers: Vec<bool>,
    scrolled_to: Option<usize>,
}

impl TextListView {
    pub fn new(sentence_count: usize) -> Self {
        Self {
            markers: vec![false; sentence_count],
            scrolled_to: None,
        }
    }

    /// Clear every marker, then mark `index` and scroll it into view.
    pub fn highlight(&mut self, index: usize) {
        self.clear();
        if let Some(marker) = self.markers.get_mut(index) {
            *marker = true;
            self.scrolled_to = Some(index);
        }
    }

    pub fn clear(&mut self) {
        self.markers.iter_mut().for_each(|marker| *marker = false);
        self.scrolled_to = None;
    }

    pub fn is_highlighted(&self, index: usize) -> bool {
        self.markers.get(index).copied().unwrap_or(false)
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.markers.iter().position(|marker| *marker)
    }

    pub fn scrolled_to(&self) -> Option<usize> {
        self.scrolled_to
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> HighlightPalette {
        let color = |r, g, b, a| HighlightColor { r, g, b, a };
        HighlightPalette {
            current: RoleColors {
                fill: color(1.0, 1.0, 0.0, 0.6),
                stroke: color(1.0, 0.78, 0.0, 0.8),
            },
            completed: RoleColors {
                fill: color(0.0, 1.0, 0.0, 0.4),
                stroke: color(0.0, 0.78, 0.0, 0.6),
            },
        }
    }

    #[test]
    fn flips_baseline_y_into_canvas_space() {
        let fragment = TextFragment::new("word", 10.0, 700.0, Some(40.0), Some(12.0), 12.0, 0, 1);
        // 792pt page at 1.5x renders 1188px tall.
        let rect = canvas_rect(&fragment, 1.5, 1188.0);
        assert!((rect.x - 15.0).abs() < 1e-3);
        assert!((rect.y - (792.0 - 700.0 - 12.0) * 1.5).abs() < 1e-3);
        assert!((rect.width - 60.0).abs() < 1e-3);
        assert!((rect.height - 18.0).abs() < 1e-3);
    }

    #[test]
    fn paint_blends_fill_and_records_rect() {
        let mut overlay = CanvasOverlay::new(RenderedSize { width: 100, height: 50 }, 1.0);
        let fragment = TextFragment::new("word", 10.0, 20.0, Some(30.0), Some(10.0), 10.0, 0, 1);
        overlay.paint(&fragment, 0, HighlightRole::Current, &palette());

        // Rect spans x 9..41, y 19..31 after padding.
        let inside = overlay.image().get_pixel(20, 25);
        assert_eq!(inside.0[0], 255);
        assert_eq!(inside.0[2], 0);
        assert!(inside.0[3] > 0);
        assert_eq!(overlay.image().get_pixel(5, 5).0[3], 0);
        assert_eq!(overlay.painted().len(), 1);
        assert_eq!(overlay.painted()[0].role, HighlightRole::Current);
    }

    #[test]
    fn paint_plan_clears_previous_highlights() {
        let mut overlay = CanvasOverlay::new(RenderedSize { width: 100, height: 100 }, 1.0);
        let fragments = vec![
            TextFragment::new("first", 0.0, 80.0, Some(40.0), Some(10.0), 10.0, 0, 1),
            TextFragment::new("second", 0.0, 20.0, Some(40.0), Some(10.0), 10.0, 1, 1),
        ];
        overlay.paint_plan(&fragments, &[], &[0], &palette());
        assert!(overlay.image().get_pixel(10, 15).0[3] > 0);

        overlay.paint_plan(&fragments, &[0], &[1], &palette());
        let roles: Vec<_> = overlay.painted().iter().map(|p| p.role).collect();
        assert_eq!(roles, vec![HighlightRole::Completed, HighlightRole::Current]);
        // Completed marker is green now, not yellow.
        assert_eq!(overlay.image().get_pixel(10, 15).0[0], 0);
    }

    #[test]
    fn off_canvas_fragments_are_skipped() {
        let mut overlay = CanvasOverlay::new(RenderedSize { width: 20, height: 20 }, 1.0);
        let fragment = TextFragment::new("far", 500.0, 5.0, Some(10.0), Some(5.0), 5.0, 0, 1);
        overlay.paint(&fragment, 0, HighlightRole::Completed, &palette());
        assert!(overlay.painted().is_empty());
    }

    #[test]
    fn text_view_keeps_single_marker() {
        let mut view = TextListView::new(4);
        view.highlight(1);
        view.highlight(3);
        assert!(!view.is_highlighted(1));
        assert!(view.is_highlighted(3));
        assert_eq!(view.scrolled_to(), Some(3));
        view.highlight(9);
        assert_eq!(view.highlighted(), None);
        assert_eq!(view.scrolled_to(), None);
    }
}
