//! Anchor placement and tile grids.

use std::fmt;

/// Inset of every non-centre anchor from the canvas edge, in pixels.
pub const ANCHOR_MARGIN: f32 = 50.0;

/// Padding added to an image overlay to form its minimum tile step.
pub const IMAGE_TILE_PADDING: f32 = 40.0;

/// Smallest edge an image overlay is drawn at.
pub const MIN_OVERLAY_EDGE: f32 = 16.0;

/// The nine named placement positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Start,
    Middle,
    End,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::CenterLeft,
        Anchor::Center,
        Anchor::CenterRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    pub fn from_name(name: &str) -> Option<Anchor> {
        Anchor::ALL.into_iter().find(|a| a.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Anchor::TopLeft => "top-left",
            Anchor::TopCenter => "top-center",
            Anchor::TopRight => "top-right",
            Anchor::CenterLeft => "center-left",
            Anchor::Center => "center",
            Anchor::CenterRight => "center-right",
            Anchor::BottomLeft => "bottom-left",
            Anchor::BottomCenter => "bottom-center",
            Anchor::BottomRight => "bottom-right",
        }
    }

    /// Horizontal and vertical edge this anchor hugs.
    fn edges(&self) -> (Edge, Edge) {
        use Edge::*;
        match self {
            Anchor::TopLeft => (Start, Start),
            Anchor::TopCenter => (Middle, Start),
            Anchor::TopRight => (End, Start),
            Anchor::CenterLeft => (Start, Middle),
            Anchor::Center => (Middle, Middle),
            Anchor::CenterRight => (End, Middle),
            Anchor::BottomLeft => (Start, End),
            Anchor::BottomCenter => (Middle, End),
            Anchor::BottomRight => (End, End),
        }
    }

    /// Centre point of an overlay of the given size placed at this anchor.
    pub fn center_point(&self, canvas: (f32, f32), overlay: (f32, f32)) -> (f32, f32) {
        let (h, v) = self.edges();
        (
            axis_center(h, canvas.0, overlay.0),
            axis_center(v, canvas.1, overlay.1),
        )
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn axis_center(edge: Edge, canvas: f32, overlay: f32) -> f32 {
    match edge {
        Edge::Start => ANCHOR_MARGIN + overlay / 2.0,
        Edge::Middle => canvas / 2.0,
        Edge::End => canvas - ANCHOR_MARGIN - overlay / 2.0,
    }
}

/// Which branch produced a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Exact,
    /// The input was not recognised and a default was used.
    Fallback { requested: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub path: Resolution,
}

impl<T> Resolved<T> {
    pub fn is_fallback(&self) -> bool {
        matches!(self.path, Resolution::Fallback { .. })
    }
}

/// Centre point for a non-tiled overlay.
///
/// Unknown names resolve to the canvas centre. The result is tagged
/// [`Resolution::Fallback`] so the silent default can be told apart from an
/// explicit `"center"`.
pub fn resolve_anchor(
    name: &str,
    canvas_w: f32,
    canvas_h: f32,
    overlay_w: f32,
    overlay_h: f32,
) -> Resolved<(f32, f32)> {
    let (anchor, path) = match Anchor::from_name(name) {
        Some(anchor) => (anchor, Resolution::Exact),
        None => {
            log::warn!(target: "overlay", "unknown anchor {:?}, using center", name);
            (
                Anchor::Center,
                Resolution::Fallback {
                    requested: name.to_string(),
                },
            )
        }
    };
    Resolved {
        value: anchor.center_point((canvas_w, canvas_h), (overlay_w, overlay_h)),
        path,
    }
}

/// Tile origins covering a canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    pub step_x: f32,
    pub step_y: f32,
    pub xs: Vec<f32>,
    pub ys: Vec<f32>,
}

impl TileGrid {
    pub fn len(&self) -> usize {
        self.xs.len() * self.ys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Origins in row-major order.
    pub fn origins(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.ys
            .iter()
            .flat_map(move |&y| self.xs.iter().map(move |&x| (x, y)))
    }
}

/// Tile origins from `-step` up to (excluding) `dimension + step` on each axis.
///
/// The effective step is `max(step, floor, 1)`, so a tiny requested spacing
/// cannot blow up the iteration count.
pub fn tile_origins(
    canvas_w: f32,
    canvas_h: f32,
    step_x: f32,
    step_y: f32,
    floor_x: f32,
    floor_y: f32,
) -> TileGrid {
    let step_x = effective_step(step_x, floor_x);
    let step_y = effective_step(step_y, floor_y);
    TileGrid {
        step_x,
        step_y,
        xs: axis_origins(canvas_w, step_x),
        ys: axis_origins(canvas_h, step_y),
    }
}

fn effective_step(step: f32, floor: f32) -> f32 {
    let step = if step.is_finite() { step } else { 0.0 };
    let floor = if floor.is_finite() { floor } else { 0.0 };
    step.max(floor).max(1.0)
}

fn axis_origins(dimension: f32, step: f32) -> Vec<f32> {
    let mut origins = Vec::new();
    let mut i = -1i64;
    loop {
        let v = i as f32 * step;
        if v >= dimension + step {
            break;
        }
        origins.push(v);
        i += 1;
    }
    origins
}

/// Tile step floor for a text overlay.
pub fn text_tile_floor(font_size: f32) -> f32 {
    font_size * 2.0
}

/// Tile step floor for an image overlay of the given drawn size.
pub fn image_tile_floor(overlay_edge: f32) -> f32 {
    overlay_edge + IMAGE_TILE_PADDING
}

/// Drawn size of an image overlay: `max(16, round(natural * scale))` per axis.
pub fn overlay_size(natural_w: u32, natural_h: u32, scale: f32) -> (u32, u32) {
    let edge = |n: u32| ((n as f32 * scale).round()).max(MIN_OVERLAY_EDGE) as u32;
    (edge(natural_w), edge(natural_h))
}
