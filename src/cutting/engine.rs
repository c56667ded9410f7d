//! Cut-length engine.
//!
//! Each covered piece is resolved at both ends of its span:
//!
//! - against the outer frame (bay bottom/top, zone left/right edge): the full
//!   interior thickness of the frame bar, or of the stack of frame mullion
//!   and fillers on that edge;
//! - otherwise against the nearest crossing member within tolerance whose
//!   run covers the joint: half its interior thickness;
//! - a non-through mullion standing on the passage-height transom takes half
//!   the exterior plus half the interior thickness of that transom.
//!
//! The bay top-transom segment over the passage, when mullions run through,
//! has no edge deductions and is lengthened by the passage fillers that stop
//! below it. Reinforced mullions are cut at full bay height. Side beads also
//! lose the interior thickness of their cell's bottom and top beads.

use crate::config::GenerationConfig;
use crate::cutting::thickness::{Thickness, ThicknessSource};
use crate::geometry::{
    approx_eq, floor_length, is_through, AxisIndex, FrameContext, Orientation, Span, Zone,
};
use crate::nomenclature::Position;
use crate::piece::{GeneratedPiece, Placement, Role, Side};
use crate::types::{CellKey, RecordId};
use std::collections::HashMap;
use tracing::debug;

/// Tolerances of the passage special cases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Match window for a mullion start on the passage-height transom.
    pub passage_match_tolerance: f64,
    /// Match window for a top-transom segment against the passage span.
    pub passage_span_tolerance: f64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            passage_match_tolerance: 5.0,
            passage_span_tolerance: 1.0,
        }
    }
}

impl From<&GenerationConfig> for EngineSettings {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            passage_match_tolerance: config.passage_match_tolerance,
            passage_span_tolerance: config.passage_span_tolerance,
        }
    }
}

/// A bar another piece may end against.
#[derive(Debug, Clone, Copy)]
struct Bar {
    zone: Zone,
    span: Span,
    thickness: Thickness,
    frame: bool,
}

/// Lookups built once over the whole piece set.
struct Neighbours {
    /// Horizontal frame bars by height.
    frame_rails: AxisIndex<Bar>,
    /// Frame and intermediate verticals by X.
    mullions: AxisIndex<Bar>,
    /// Intermediate transom segments by height.
    transoms: AxisIndex<Bar>,
    /// Interior thickness stacked on each zone edge.
    edge_stacks: HashMap<(Zone, Side), f64>,
    /// Passage fillers: placement and interior thickness.
    passage_fillers: Vec<(Option<Placement>, f64)>,
    /// Interior thickness of the bottom and top beads of each cell.
    cell_rails: HashMap<CellKey, f64>,
    /// Frame lines whose top transom was split into several pieces.
    split_top_lines: Vec<Option<RecordId>>,
}

pub struct CutLengthEngine<'a> {
    ctx: &'a FrameContext,
    settings: EngineSettings,
    source: &'a dyn ThicknessSource,
}

impl<'a> CutLengthEngine<'a> {
    pub fn new(
        ctx: &'a FrameContext,
        settings: EngineSettings,
        source: &'a dyn ThicknessSource,
    ) -> Self {
        Self {
            ctx,
            settings,
            source,
        }
    }

    fn thickness(&self, piece: &GeneratedPiece) -> Thickness {
        piece
            .material
            .as_ref()
            .and_then(|m| self.source.thickness(m))
            .unwrap_or(Thickness::ZERO)
    }

    /// Cut length of every piece the engine covers, `None` for the rest.
    /// The result is index-aligned with `pieces`.
    pub fn compute(&self, pieces: &[GeneratedPiece]) -> Vec<Option<u32>> {
        let positions: Vec<Position> = pieces.iter().map(position_of).collect();
        let neighbours = self.neighbours(pieces, &positions);
        pieces
            .iter()
            .zip(&positions)
            .map(|(piece, position)| {
                let length = self.resolve(&neighbours, piece, position);
                if let Some(length) = length {
                    debug!(
                        role = ?piece.role,
                        zone = %piece.zone,
                        raw = piece.raw_length(),
                        length,
                        "Resolved cut length"
                    );
                }
                length
            })
            .collect()
    }

    fn neighbours(&self, pieces: &[GeneratedPiece], positions: &[Position]) -> Neighbours {
        let mut frame_rails = Vec::new();
        let mut mullions = Vec::new();
        let mut transoms = Vec::new();
        let mut edge_stacks: HashMap<(Zone, Side), f64> = HashMap::new();
        let mut passage_fillers = Vec::new();
        let mut cell_rails: HashMap<CellKey, f64> = HashMap::new();
        let mut top_counts: HashMap<Option<RecordId>, usize> = HashMap::new();

        for (piece, position) in pieces.iter().zip(positions) {
            let thickness = self.thickness(piece);
            let frame = piece.role == Role::Frame;

            if frame {
                let edge = match position {
                    Position::LeftMullion | Position::LeftFiller => Some(Side::Left),
                    Position::RightMullion | Position::RightFiller => Some(Side::Right),
                    _ => None,
                };
                if let Some(side) = edge {
                    *edge_stacks.entry((piece.zone, side)).or_default() += thickness.interior;
                }
                if position.is_filler() && piece.zone == Zone::Passage {
                    passage_fillers.push((piece.placement, thickness.interior));
                }
                if *position == Position::TopTransom
                    && piece.zone == Zone::Bay
                    && piece.placement.is_some()
                {
                    *top_counts.entry(piece.nomenclature_id.clone()).or_default() += 1;
                }
            }

            if piece.role == Role::Bead && matches!(piece.side, Some(Side::Bottom | Side::Top)) {
                if let Some(key) = &piece.cell_key {
                    *cell_rails.entry(key.clone()).or_default() += thickness.interior;
                }
            }

            let Some(placement) = piece.placement else { continue };
            let bar = Bar {
                zone: piece.zone,
                span: placement.span,
                thickness,
                frame,
            };
            match (piece.role, placement.orientation) {
                (Role::Frame, Orientation::Horizontal) => {
                    frame_rails.push((placement.position, bar))
                }
                (Role::Frame | Role::Mullion, Orientation::Vertical) => {
                    mullions.push((placement.position, bar))
                }
                (Role::Transom, Orientation::Horizontal) => {
                    transoms.push((placement.position, bar))
                }
                _ => {}
            }
        }

        let split_top_lines = if self.ctx.mullions_through {
            top_counts
                .into_iter()
                .filter(|(_, count)| *count > 1)
                .map(|(line, _)| line)
                .collect()
        } else {
            Vec::new()
        };

        Neighbours {
            frame_rails: AxisIndex::new(frame_rails),
            mullions: AxisIndex::new(mullions),
            transoms: AxisIndex::new(transoms),
            edge_stacks,
            passage_fillers,
            cell_rails,
            split_top_lines,
        }
    }

    fn is_split_top_segment(
        &self,
        n: &Neighbours,
        piece: &GeneratedPiece,
        position: &Position,
    ) -> bool {
        piece.role == Role::Frame
            && piece.zone == Zone::Bay
            && *position == Position::TopTransom
            && n.split_top_lines.contains(&piece.nomenclature_id)
    }

    fn resolve(
        &self,
        n: &Neighbours,
        piece: &GeneratedPiece,
        position: &Position,
    ) -> Option<u32> {
        let placement = piece.placement?;
        match piece.role {
            Role::Mullion if piece.reinforced => return Some(floor_length(self.ctx.bay_height)),
            Role::Mullion | Role::Transom | Role::Bead => {}
            Role::Frame if self.is_split_top_segment(n, piece, position) => {}
            Role::Frame => return None,
        }

        let raw = placement.span.len();
        let length = match placement.orientation {
            Orientation::Vertical => raw - self.vertical_deductions(n, piece, &placement),
            Orientation::Horizontal => {
                if piece.role == Role::Frame && self.is_passage_segment(&placement) {
                    raw + self.passage_bonus(n, placement.position)
                } else {
                    raw - self.horizontal_deductions(n, piece, &placement)
                }
            }
        };
        Some(floor_length(length))
    }

    fn vertical_deductions(
        &self,
        n: &Neighbours,
        piece: &GeneratedPiece,
        placement: &Placement,
    ) -> f64 {
        let tol = self.ctx.tolerance;
        let x = placement.position;
        let span = placement.span;

        let start = if approx_eq(span.start, 0.0, tol) {
            self.frame_rail(n, 0.0, x, piece.zone)
        } else if let Some(rest) = self.passage_rest(n, piece, placement) {
            rest
        } else {
            self.transom_joint(n, span.start, x)
        };
        let end = if approx_eq(span.end, self.ctx.bay_height, tol) {
            self.frame_rail(n, self.ctx.bay_height, x, piece.zone)
        } else {
            self.transom_joint(n, span.end, x)
        };
        let rails = match (&piece.role, &piece.cell_key) {
            (Role::Bead, Some(key)) => n.cell_rails.get(key).copied().unwrap_or(0.0),
            _ => 0.0,
        };
        start + end + rails
    }

    fn horizontal_deductions(
        &self,
        n: &Neighbours,
        piece: &GeneratedPiece,
        placement: &Placement,
    ) -> f64 {
        let tol = self.ctx.tolerance;
        let y = placement.position;
        let span = placement.span;
        let edges = self.ctx.zone_span(piece.zone);
        let any_zone = piece.zone == Zone::Bay || piece.role == Role::Bead;

        let left = if approx_eq(span.start, edges.start, tol) {
            self.edge(n, piece.zone, Side::Left, span.start, y)
        } else {
            self.mullion_joint(n, span.start, y, piece.zone, any_zone)
        };
        let right = if approx_eq(span.end, edges.end, tol) {
            self.edge(n, piece.zone, Side::Right, span.end, y)
        } else {
            self.mullion_joint(n, span.end, y, piece.zone, any_zone)
        };
        left + right
    }

    /// Full interior thickness of the frame rail at height `y` under `x`:
    /// same zone first, then the bay rail, then any.
    fn frame_rail(&self, n: &Neighbours, y: f64, x: f64, zone: Zone) -> f64 {
        let tol = self.ctx.tolerance;
        let candidates: Vec<&Bar> = n
            .frame_rails
            .within(y, tol)
            .map(|(_, bar)| bar)
            .filter(|bar| bar.span.covers(x, tol))
            .collect();
        candidates
            .iter()
            .find(|bar| bar.zone == zone)
            .or_else(|| candidates.iter().find(|bar| bar.zone == Zone::Bay))
            .or_else(|| candidates.first())
            .map(|bar| bar.thickness.interior)
            .unwrap_or(0.0)
    }

    /// Interior stack on a zone edge. Missing stacks fall back from the bay
    /// to the outer fixed zone and back, then to any frame vertical there.
    fn edge(&self, n: &Neighbours, zone: Zone, side: Side, x: f64, y: f64) -> f64 {
        let fallback = match (zone, side) {
            (Zone::Bay, Side::Left) => Some(Zone::FixedLeft),
            (Zone::Bay, Side::Right) => Some(Zone::FixedRight),
            (Zone::FixedLeft, Side::Left) | (Zone::FixedRight, Side::Right) => Some(Zone::Bay),
            _ => None,
        };
        if let Some(stack) = n.edge_stacks.get(&(zone, side)) {
            return *stack;
        }
        if let Some(stack) = fallback.and_then(|z| n.edge_stacks.get(&(z, side))) {
            return *stack;
        }
        let tol = self.ctx.tolerance;
        n.mullions
            .nearest(x, tol, |bar| bar.frame && bar.span.covers(y, tol))
            .map(|bar| bar.thickness.interior)
            .unwrap_or(0.0)
    }

    fn mullion_joint(&self, n: &Neighbours, x: f64, y: f64, zone: Zone, any_zone: bool) -> f64 {
        let tol = self.ctx.tolerance;
        n.mullions
            .nearest(x, tol, |bar| {
                (any_zone || bar.zone == zone) && bar.span.covers(y, tol)
            })
            .map(|bar| bar.thickness.interior / 2.0)
            .unwrap_or(0.0)
    }

    fn transom_joint(&self, n: &Neighbours, y: f64, x: f64) -> f64 {
        let tol = self.ctx.tolerance;
        n.transoms
            .nearest(y, tol, |bar| bar.span.covers(x, tol))
            .map(|bar| bar.thickness.interior / 2.0)
            .unwrap_or(0.0)
    }

    /// A non-through mullion starting on the passage-height transom, drawn
    /// from the transom's centre line or from its lower face.
    fn passage_rest(
        &self,
        n: &Neighbours,
        piece: &GeneratedPiece,
        placement: &Placement,
    ) -> Option<f64> {
        if piece.role != Role::Mullion {
            return None;
        }
        let tol = self.ctx.tolerance;
        let passage_height = self.ctx.passage_height?;
        if is_through(Some(&placement.span), self.ctx.bay_height, tol) {
            return None;
        }
        let window = self.settings.passage_match_tolerance;
        let start = placement.span.start;
        n.transoms
            .iter()
            .filter(|(y, bar)| {
                approx_eq(*y, passage_height, window) && bar.span.covers(placement.position, tol)
            })
            .find(|(y, bar)| {
                approx_eq(start, *y, window)
                    || approx_eq(start, *y - bar.thickness.exterior / 2.0, window)
            })
            .map(|(_, bar)| bar.thickness.exterior / 2.0 + bar.thickness.interior / 2.0)
    }

    fn is_passage_segment(&self, placement: &Placement) -> bool {
        self.ctx.mullions_through
            && placement
                .span
                .approx_eq(&self.ctx.zone_span(Zone::Passage), self.settings.passage_span_tolerance)
    }

    /// Passage fillers that stop below the top transom at `y`.
    fn passage_bonus(&self, n: &Neighbours, y: f64) -> f64 {
        let tol = self.ctx.tolerance;
        n.passage_fillers
            .iter()
            .filter(|(placement, _)| placement.map_or(true, |p| p.span.end < y - tol))
            .map(|(_, interior)| interior)
            .sum()
    }
}

fn position_of(piece: &GeneratedPiece) -> Position {
    piece
        .position_label
        .as_deref()
        .map(Position::classify)
        .unwrap_or_else(|| Position::Other(String::new()))
}
