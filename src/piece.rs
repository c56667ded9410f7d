//! Generated Pieces
//!
//! The unit of output: one manufacturable bar with its absolute placement and,
//! once the length pass has run, its cut length.

use crate::geometry::{Orientation, Span, Zone};
use crate::store::records::PieceRecord;
use crate::types::{CellKey, RecordId};
use serde::{Deserialize, Serialize};

/// What the bar is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Frame,
    Mullion,
    Transom,
    Bead,
}

/// Side of a glazing cell a bead closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
    Bottom,
    Top,
}

/// Where the piece came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    FromNomenclature,
    FromIntermediate,
}

/// Absolute geometry: the fixed-axis position and the free-axis span.
/// A horizontal piece sits at height `position` and spans along X.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub orientation: Orientation,
    pub position: f64,
    pub span: Span,
}

impl Placement {
    pub fn horizontal(y: f64, span: Span) -> Self {
        Placement {
            orientation: Orientation::Horizontal,
            position: y,
            span,
        }
    }

    pub fn vertical(x: f64, span: Span) -> Self {
        Placement {
            orientation: Orientation::Vertical,
            position: x,
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedPiece {
    pub role: Role,
    pub zone: Zone,
    /// Frame lines without a geometric edge (fillers, other bars) have none.
    pub placement: Option<Placement>,
    pub side: Option<Side>,
    pub cell_key: Option<CellKey>,
    pub material: Option<RecordId>,
    pub source: Source,
    pub reinforced: bool,
    pub position_label: Option<String>,
    pub nomenclature_id: Option<RecordId>,
    pub cut_rule: Option<String>,
    pub quantity: u32,
    pub cut_length: Option<u32>,
}

impl GeneratedPiece {
    /// A bare piece of `role` in `zone`; callers fill in the rest.
    pub fn new(role: Role, zone: Zone, source: Source) -> Self {
        GeneratedPiece {
            role,
            zone,
            placement: None,
            side: None,
            cell_key: None,
            material: None,
            source,
            reinforced: false,
            position_label: None,
            nomenclature_id: None,
            cut_rule: None,
            quantity: 1,
            cut_length: None,
        }
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    pub fn with_material(mut self, material: Option<RecordId>) -> Self {
        self.material = material;
        self
    }

    pub fn orientation(&self) -> Option<Orientation> {
        self.placement.map(|p| p.orientation)
    }

    /// Raw (undeducted) span length, zero without placement.
    pub fn raw_length(&self) -> f64 {
        self.placement.map(|p| p.span.len()).unwrap_or(0.0)
    }

    pub fn to_record(&self, bay_id: &RecordId) -> PieceRecord {
        PieceRecord {
            bay_id: bay_id.clone(),
            role: self.role,
            zone: self.zone,
            orientation: self.placement.map(|p| p.orientation),
            position: self.placement.map(|p| p.position),
            span_start: self.placement.map(|p| p.span.start),
            span_end: self.placement.map(|p| p.span.end),
            side: self.side,
            cell_key: self.cell_key.clone(),
            material_id: self.material.clone(),
            source: self.source,
            reinforced: self.reinforced,
            position_label: self.position_label.clone(),
            nomenclature_id: self.nomenclature_id.clone(),
            cut_rule: self.cut_rule.clone(),
            quantity: self.quantity,
            cut_length: self.cut_length,
        }
    }

    pub fn from_record(record: PieceRecord) -> Self {
        let placement = match (
            record.orientation,
            record.position,
            record.span_start,
            record.span_end,
        ) {
            (Some(orientation), Some(position), Some(start), Some(end)) => Some(Placement {
                orientation,
                position,
                span: Span::new(start, end),
            }),
            _ => None,
        };
        GeneratedPiece {
            role: record.role,
            zone: record.zone,
            placement,
            side: record.side,
            cell_key: record.cell_key,
            material: record.material_id,
            source: record.source,
            reinforced: record.reinforced,
            position_label: record.position_label,
            nomenclature_id: record.nomenclature_id,
            cut_rule: record.cut_rule,
            quantity: record.quantity,
            cut_length: record.cut_length,
        }
    }
}
