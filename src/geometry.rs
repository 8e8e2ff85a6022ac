//! Axis-aligned rectangles in PDF page space.
//!
//! Coordinates are in points with the PDF convention used by pdfium: origin at
//! the bottom-left corner of the page, `y` growing upwards. `x0 ≤ x1` and
//! `y0 ≤ y1` for well-formed rectangles; this is not enforced, malformed
//! input flows through unchanged.

use serde::{Deserialize, Serialize};

/// An immutable axis-aligned rectangle `(x0, y0, x1, y1)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl Rect {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn x0(&self) -> f32 {
        self.x0
    }

    pub fn y0(&self) -> f32 {
        self.y0
    }

    pub fn x1(&self) -> f32 {
        self.x1
    }

    pub fn y1(&self) -> f32 {
        self.y1
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Vertical centre, used to group text spans into rows.
    pub fn center_y(&self) -> f32 {
        (self.y0 + self.y1) / 2.0
    }

    pub fn center_x(&self) -> f32 {
        (self.x0 + self.x1) / 2.0
    }

    /// True when `other` lies entirely inside `self`. Shared edges count.
    pub fn contains(&self, other: &Rect) -> bool {
        self.x0 <= other.x0 && self.y0 <= other.y0 && self.x1 >= other.x1 && self.y1 >= other.y1
    }

    /// True unless the two boxes are disjoint. Touching edges overlap.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.x0 > other.x1 || other.x0 > self.x1 || self.y0 > other.y1 || other.y0 > self.y1)
    }

    /// Overlapping region, or `None` when the boxes are disjoint.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        Some(Rect::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        ))
    }
}

impl From<(f32, f32, f32, f32)> for Rect {
    fn from((x0, y0, x1, y1): (f32, f32, f32, f32)) -> Self {
        Rect::new(x0, y0, x1, y1)
    }
}
