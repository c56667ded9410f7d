//! Bay Geometry
//!
//! Leaf utilities shared by every generation pass and by the cut-length engine:
//! the zone coordinate model, the through/non-through classifier, the generic
//! band segmentation primitive and the tolerance-bounded spatial index.

pub mod index;
pub mod run;
pub mod segment;
pub mod zone;

pub use index::AxisIndex;
pub use run::is_through;
pub use segment::{segment_band, Crosser, CrossingRule};
pub use zone::{FrameContext, Zone};

use serde::{Deserialize, Serialize};

/// Closed interval along one axis, in bay length units (mm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: f64,
    pub end: f64,
}

impl Span {
    pub fn new(start: f64, end: f64) -> Self {
        Span { start, end }
    }

    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    /// `value` lies in the span, boundaries widened by `tol`.
    pub fn covers(&self, value: f64, tol: f64) -> bool {
        value >= self.start - tol && value <= self.end + tol
    }

    /// `value` lies strictly inside the span, boundaries narrowed by `tol`.
    pub fn contains_strictly(&self, value: f64, tol: f64) -> bool {
        value > self.start + tol && value < self.end - tol
    }

    /// Both endpoints match within `tol`.
    pub fn approx_eq(&self, other: &Span, tol: f64) -> bool {
        approx_eq(self.start, other.start, tol) && approx_eq(self.end, other.end, tol)
    }
}

/// Orientation of a bar: horizontal bars sit at a height and span along X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

/// Integer millimetres, never negative.
pub fn floor_length(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.floor().min(u32::MAX as f64) as u32
}
