//! Drag-to-select, pan, and zoom-around-cursor over a displayed page.
//!
//! Pointer positions are given relative to the scrolling viewport. The
//! selection lives in displayed pixel space, which is the viewport position
//! plus the scroll offset.

use crate::error::{WaterlogoError, WaterlogoResult};
use crate::page::PdfPageContext;

/// Zoom multiplier per wheel notch.
pub const WHEEL_ZOOM_IN: f32 = 1.1;
pub const WHEEL_ZOOM_OUT: f32 = 0.9;

/// Zoom changes smaller than this are ignored.
const ZOOM_EPSILON: f32 = 1e-4;

/// Two corners of a selection in displayed pixels. `(x0, y0)` is where the
/// drag started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl SelectionRect {
    pub fn collapsed(x: f32, y: f32) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x,
            y1: y,
        }
    }

    pub fn left(&self) -> f32 {
        self.x0.min(self.x1)
    }

    pub fn top(&self) -> f32 {
        self.y0.min(self.y1)
    }

    pub fn width(&self) -> f32 {
        (self.x1 - self.x0).abs()
    }

    pub fn height(&self) -> f32 {
        (self.y1 - self.y0).abs()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }
}

/// Width over height from a preset and an optional custom entry.
///
/// A valid custom entry wins. Entries are `"w:h"` with both parts positive,
/// or a positive number. `"free"` and anything invalid mean no lock.
pub fn parse_aspect_ratio(preset: &str, custom: &str) -> Option<f32> {
    let custom = custom.trim();
    if !custom.is_empty() {
        if let Some(ratio) = parse_ratio(custom) {
            return Some(ratio);
        }
    }
    if preset == "free" {
        return None;
    }
    parse_ratio(preset)
}

fn parse_ratio(s: &str) -> Option<f32> {
    if let Some((w, h)) = s.split_once(':') {
        if let (Some(w), Some(h)) = (parse_leading_float(w), parse_leading_float(h)) {
            if w > 0.0 && h > 0.0 {
                return Some(w / h);
            }
        }
    }
    parse_leading_float(s).filter(|&r| r > 0.0)
}

/// Longest numeric prefix, so `"16:9"` reads as 16 and `" 1.5x"` as 1.5.
fn parse_leading_float(s: &str) -> Option<f32> {
    let s = s.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => {}
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    let candidate = &s[..end];
    (1..=candidate.len())
        .rev()
        .find_map(|n| candidate[..n].parse::<f32>().ok())
        .filter(|v| v.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interaction {
    Idle,
    Dragging,
    Panning {
        start: (f32, f32),
        start_scroll: (f32, f32),
    },
}

/// Selection, pan and zoom state for one displayed page.
#[derive(Debug, Clone)]
pub struct SelectionTool {
    page: PdfPageContext,
    viewport: (f32, f32),
    scroll: (f32, f32),
    aspect: Option<f32>,
    space_held: bool,
    interaction: Interaction,
    selection: Option<SelectionRect>,
}

impl SelectionTool {
    /// `viewport` is the visible client area in pixels.
    pub fn new(page: PdfPageContext, viewport: (f32, f32)) -> Self {
        Self {
            page,
            viewport,
            scroll: (0.0, 0.0),
            aspect: None,
            space_held: false,
            interaction: Interaction::Idle,
            selection: None,
        }
    }

    pub fn page(&self) -> &PdfPageContext {
        &self.page
    }

    pub fn scroll(&self) -> (f32, f32) {
        self.scroll
    }

    pub fn interaction(&self) -> Interaction {
        self.interaction
    }

    pub fn selection(&self) -> Option<&SelectionRect> {
        self.selection.as_ref()
    }

    /// The selection an export should use.
    pub fn committed_selection(&self) -> WaterlogoResult<SelectionRect> {
        self.selection.ok_or_else(|| {
            WaterlogoError::InvalidConfiguration("drag to select a crop region first".to_string())
        })
    }

    pub fn set_aspect_ratio(&mut self, ratio: Option<f32>) {
        self.aspect = ratio.filter(|r| r.is_finite() && *r > 0.0);
    }

    pub fn set_space_held(&mut self, held: bool) {
        self.space_held = held;
    }

    pub fn set_viewport(&mut self, viewport: (f32, f32)) {
        self.viewport = viewport;
        self.scroll = self.clamp_scroll(self.scroll);
    }

    /// Show a different page context. Re-rendering drops the selection.
    pub fn set_page(&mut self, page: PdfPageContext) {
        self.page = page;
        self.selection = None;
        self.interaction = Interaction::Idle;
        self.scroll = self.clamp_scroll(self.scroll);
    }

    fn content_size(&self) -> (f32, f32) {
        let (w, h) = self.page.displayed_size();
        (w as f32, h as f32)
    }

    fn max_scroll(&self) -> (f32, f32) {
        let (cw, ch) = self.content_size();
        ((cw - self.viewport.0).max(0.0), (ch - self.viewport.1).max(0.0))
    }

    fn clamp_scroll(&self, scroll: (f32, f32)) -> (f32, f32) {
        let (mx, my) = self.max_scroll();
        (scroll.0.clamp(0.0, mx), scroll.1.clamp(0.0, my))
    }

    fn to_content(&self, pos: (f32, f32)) -> (f32, f32) {
        (pos.0 + self.scroll.0, pos.1 + self.scroll.1)
    }

    pub fn pointer_down(&mut self, button: PointerButton, pos: (f32, f32)) {
        if button != PointerButton::Primary || self.space_held {
            log::debug!(target: "selection", "pan start at {:?}", pos);
            self.interaction = Interaction::Panning {
                start: pos,
                start_scroll: self.scroll,
            };
            return;
        }
        let (x, y) = self.to_content(pos);
        log::debug!(target: "selection", "drag start at {} {}", x, y);
        self.interaction = Interaction::Dragging;
        self.selection = Some(SelectionRect::collapsed(x, y));
    }

    pub fn pointer_move(&mut self, pos: (f32, f32)) {
        match self.interaction {
            Interaction::Idle => {}
            Interaction::Panning {
                start,
                start_scroll,
            } => {
                let target = (
                    start_scroll.0 - (pos.0 - start.0),
                    start_scroll.1 - (pos.1 - start.1),
                );
                self.scroll = self.clamp_scroll(target);
            }
            Interaction::Dragging => {
                let (x, y) = self.to_content(pos);
                let aspect = self.aspect;
                if let Some(sel) = self.selection.as_mut() {
                    drag_corner(sel, x, y, aspect);
                }
            }
        }
    }

    /// Ends dragging and panning; the selection stays.
    pub fn pointer_up(&mut self) {
        self.interaction = Interaction::Idle;
    }

    pub fn pointer_leave(&mut self) {
        self.pointer_up();
    }

    /// Zoom by `factor`, keeping the content point under `cursor` (viewport
    /// coordinates) in place. Returns false when the clamped zoom does not
    /// change. Like every re-render, a zoom drops the selection.
    pub fn zoom_at(&mut self, factor: f32, cursor: (f32, f32)) -> bool {
        let old_zoom = self.page.zoom;
        let new_page = self.page.with_zoom(old_zoom * factor);
        if (new_page.zoom - old_zoom).abs() < ZOOM_EPSILON {
            return false;
        }

        let (cw, ch) = self.content_size();
        let (mx, my) = self.to_content(cursor);
        let rel = (mx / cw.max(1.0), my / ch.max(1.0));

        self.set_page(new_page);
        let (nw, nh) = self.content_size();
        self.scroll = self.clamp_scroll((rel.0 * nw - cursor.0, rel.1 * nh - cursor.1));
        log::debug!(target: "selection", "zoom {} -> {}, scroll {:?}", old_zoom, self.page.zoom, self.scroll);
        true
    }

    /// Wheel zoom: scrolling up zooms in.
    pub fn wheel(&mut self, delta_y: f32, cursor: (f32, f32)) -> bool {
        let factor = if delta_y < 0.0 {
            WHEEL_ZOOM_IN
        } else {
            WHEEL_ZOOM_OUT
        };
        self.zoom_at(factor, cursor)
    }
}

/// Move the free corner to `(x, y)`. With an aspect lock the axis that moved
/// further drives the other one.
fn drag_corner(sel: &mut SelectionRect, x: f32, y: f32, aspect: Option<f32>) {
    let Some(ratio) = aspect else {
        sel.x1 = x;
        sel.y1 = y;
        return;
    };
    let dx = x - sel.x0;
    let dy = y - sel.y0;
    if dx.abs() >= dy.abs() {
        let height = dx.abs() / ratio;
        sel.x1 = x;
        sel.y1 = sel.y0 + if dy >= 0.0 { height } else { -height };
    } else {
        let width = dy.abs() * ratio;
        sel.y1 = y;
        sel.x1 = sel.x0 + if dx >= 0.0 { width } else { -width };
    }
}
