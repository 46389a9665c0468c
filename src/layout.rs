//! Geometry and layout-mode types shared by slots and chat windows.

use serde::{Deserialize, Serialize};

/// Pixel coordinate, relative to the dashboard container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Top-left origin plus dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub origin: Point,
    pub size: Size,
}

impl Frame {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    /// True when the two frames share interior area. Touching edges do not count.
    pub fn overlaps(&self, other: &Frame) -> bool {
        self.origin.x < other.origin.x + other.size.width
            && other.origin.x < self.origin.x + self.size.width
            && self.origin.y < other.origin.y + other.size.height
            && other.origin.y < self.origin.y + self.size.height
    }

    /// The frame pulled back onto the canvas: origin within
    /// `[-CANVAS_LIMIT, CANVAS_LIMIT]`, size within `[min, CANVAS_LIMIT]`.
    /// NaN components collapse to the lower bound.
    pub fn bounded(self, min: Size) -> Frame {
        Frame::new(
            bound(self.origin.x, -CANVAS_LIMIT, CANVAS_LIMIT),
            bound(self.origin.y, -CANVAS_LIMIT, CANVAS_LIMIT),
            bound(self.size.width, min.width, CANVAS_LIMIT),
            bound(self.size.height, min.height, CANVAS_LIMIT),
        )
    }
}

/// Largest coordinate or extent a frame may take.
pub const CANVAS_LIMIT: f64 = 100_000.0;

/// `v` clamped to `[lo, hi]`, with NaN mapped to `lo`.
pub fn bound(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() {
        lo
    } else {
        v.clamp(lo, hi)
    }
}

/// Smallest size a stream slot may be resized to.
pub const SLOT_MIN_SIZE: Size = Size::new(300.0, 200.0);
/// Default frame size of a newly placed slot.
pub const SLOT_DEFAULT_SIZE: Size = Size::new(600.0, 400.0);
/// Horizontal distance between default slot origins.
pub const SLOT_PITCH_X: f64 = 620.0;
/// Vertical distance between default slot origins.
pub const SLOT_PITCH_Y: f64 = 420.0;
/// Columns of the default placement grid.
pub const SLOT_GRID_COLUMNS: usize = 3;

/// Logical size hint; maps to a column span in grid mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl StreamSize {
    pub fn next(self) -> Self {
        match self {
            StreamSize::Small => StreamSize::Medium,
            StreamSize::Medium => StreamSize::Large,
            StreamSize::Large => StreamSize::Small,
        }
    }

    pub fn column_span(self) -> u8 {
        match self {
            StreamSize::Small => 1,
            StreamSize::Medium => 2,
            StreamSize::Large => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Row {
    #[default]
    Top,
    Bottom,
}

impl Row {
    pub fn flipped(self) -> Self {
        match self {
            Row::Top => Row::Bottom,
            Row::Bottom => Row::Top,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    #[default]
    Grid,
    /// Legacy two-row layout. Not part of the cycle, only settable directly.
    TopBottom,
    Freeform,
}

impl LayoutMode {
    /// Next mode of the layout toggle: grid and free-form alternate.
    pub fn cycled(self) -> Self {
        match self {
            LayoutMode::Grid => LayoutMode::Freeform,
            LayoutMode::TopBottom | LayoutMode::Freeform => LayoutMode::Grid,
        }
    }
}

/// What a slot looks like under one layout mode. Only the fields that mode
/// uses are present.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum Placement {
    Grid { span: u8 },
    TopBottom { row: Row },
    Freeform { frame: Frame },
}

/// How a corner resize treats position when a dimension hits its minimum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClampPolicy {
    /// Position follows the raw pointer delta even while the size is pinned
    /// at its minimum, so the frame slides once clamped.
    #[default]
    ShiftByRawDelta,
    /// Position follows only the part of the delta the size absorbed, so the
    /// opposite edge stays put.
    AnchorOppositeEdge,
}
