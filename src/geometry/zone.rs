//! Zone coordinate model.
//!
//! A bay is split along X into a fixed-left zone, the passage and a
//! fixed-right zone. `Bay` stands for the whole width and is used by members
//! that may span, or be cut by, members of any sub-zone.

use crate::error::ChassisError;
use crate::geometry::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    FixedLeft,
    Passage,
    FixedRight,
    Bay,
}

impl Zone {
    pub const ALL: [Zone; 4] = [Zone::FixedLeft, Zone::Passage, Zone::FixedRight, Zone::Bay];

    /// Strict label parsing. `IMPOSTE` names a height band rather than a width
    /// zone and resolves to the passage it sits over.
    pub fn parse(label: &str) -> Option<Zone> {
        match label.trim().to_uppercase().as_str() {
            "FIXED_LEFT" => Some(Zone::FixedLeft),
            "PASSAGE" | "IMPOSTE" => Some(Zone::Passage),
            "FIXED_RIGHT" => Some(Zone::FixedRight),
            "BAY" | "" => Some(Zone::Bay),
            _ => None,
        }
    }

    /// Lenient parsing: anything unrecognised is the whole bay.
    pub fn from_label(label: &str) -> Zone {
        Zone::parse(label).unwrap_or(Zone::Bay)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Zone::FixedLeft => "FIXED_LEFT",
            Zone::Passage => "PASSAGE",
            Zone::FixedRight => "FIXED_RIGHT",
            Zone::Bay => "BAY",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Immutable per-invocation bay dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameContext {
    pub bay_width: f64,
    pub bay_height: f64,
    pub fixed_left_width: f64,
    pub fixed_right_width: f64,
    pub passage_width: f64,
    /// Imposte (passage) height, when configured on the bay.
    pub passage_height: Option<f64>,
    pub mullions_through: bool,
    /// The bay model requires a passage-height transom.
    pub has_imposte: bool,
    pub tolerance: f64,
}

impl FrameContext {
    pub const DEFAULT_TOLERANCE: f64 = 0.5;

    /// Checks the dimensional invariants the passes rely on.
    pub fn validate(&self) -> Result<(), ChassisError> {
        if !(self.bay_width > 0.0) || !(self.bay_height > 0.0) {
            return Err(ChassisError::ConfigError(
                "Bay dimensions are incomplete (width and height must be positive)".to_string(),
            ));
        }
        let widths = [self.fixed_left_width, self.passage_width, self.fixed_right_width];
        if widths.iter().any(|w| *w < 0.0 || !w.is_finite()) {
            return Err(ChassisError::ConfigError(
                "Zone widths must be finite and non-negative".to_string(),
            ));
        }
        let used: f64 = widths.iter().sum();
        if used > self.bay_width + self.tolerance {
            return Err(ChassisError::ConfigError(format!(
                "Zone widths ({}) exceed bay width ({})",
                used, self.bay_width
            )));
        }
        Ok(())
    }

    pub fn zone_width(&self, zone: Zone) -> f64 {
        match zone {
            Zone::FixedLeft => self.fixed_left_width,
            Zone::Passage => self.passage_width,
            Zone::FixedRight => self.fixed_right_width,
            Zone::Bay => self.bay_width,
        }
    }

    pub fn zone_offset_x(&self, zone: Zone) -> f64 {
        match zone {
            Zone::FixedLeft | Zone::Bay => 0.0,
            Zone::Passage => self.fixed_left_width,
            Zone::FixedRight => self.fixed_left_width + self.passage_width,
        }
    }

    /// Absolute X extent of a zone.
    pub fn zone_span(&self, zone: Zone) -> Span {
        let offset = self.zone_offset_x(zone);
        Span::new(offset, offset + self.zone_width(zone))
    }

    pub fn full_height(&self) -> Span {
        Span::new(0.0, self.bay_height)
    }
}
