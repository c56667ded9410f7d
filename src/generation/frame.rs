//! Frame generation pass.
//!
//! Pass 1 turns every nomenclature line into absolute geometry from its
//! tagged position and collects the frame mullions and transoms. Pass 2
//! materializes the pieces; under "mullions run through" the bay's top
//! transom is emitted as one piece per gap between frame mullions.

use crate::geometry::{segment_band, Crosser, CrossingRule, FrameContext, Span, Zone};
use crate::nomenclature::{FrameLine, Position};
use crate::piece::{GeneratedPiece, Placement, Role, Source};
use crate::types::RecordId;
use tracing::debug;

/// A frame bar with geometry, kept for cross-zone reference.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMember {
    pub zone: Zone,
    pub position: Position,
    pub placement: Placement,
    pub material: RecordId,
}

impl FrameMember {
    pub fn crosser(&self) -> Crosser {
        Crosser::new(self.placement.position, Some(self.placement.span))
    }
}

/// Output of the frame pass.
#[derive(Debug, Clone, Default)]
pub struct FrameLayout {
    pub pieces: Vec<GeneratedPiece>,
    /// Vertical frame bars, in line order.
    pub mullions: Vec<FrameMember>,
    /// Horizontal frame bars, in line order.
    pub transoms: Vec<FrameMember>,
    /// Pieces the bay top transom was split into (0 when not split).
    pub top_transom_segments: usize,
}

/// Geometry implied by a line's position, or `None` for bars without an
/// edge of their own (fillers and unclassified labels).
pub fn frame_placement(ctx: &FrameContext, line: &FrameLine) -> Option<Placement> {
    let zone_span = ctx.zone_span(line.zone);
    match line.position {
        Position::TopTransom => Some(Placement::horizontal(ctx.bay_height, zone_span)),
        Position::BottomTransom => Some(Placement::horizontal(0.0, zone_span)),
        Position::LeftMullion => Some(Placement::vertical(
            zone_span.start,
            mullion_run(ctx, line.zone, Zone::FixedRight),
        )),
        Position::RightMullion => Some(Placement::vertical(
            zone_span.end,
            mullion_run(ctx, line.zone, Zone::FixedLeft),
        )),
        Position::LeftFiller | Position::RightFiller | Position::Other(_) => None,
    }
}

/// Full height, except for the fixed-zone mullion bordering the passage,
/// which stops on the imposte when mullions do not run through.
fn mullion_run(ctx: &FrameContext, zone: Zone, inner_zone: Zone) -> Span {
    match ctx.passage_height {
        Some(height) if zone == inner_zone && ctx.has_imposte && !ctx.mullions_through => {
            Span::new(0.0, height.min(ctx.bay_height))
        }
        _ => ctx.full_height(),
    }
}

fn line_piece(line: &FrameLine) -> GeneratedPiece {
    let mut piece = GeneratedPiece::new(Role::Frame, line.zone, Source::FromNomenclature)
        .with_material(Some(line.material.clone()));
    piece.position_label = Some(line.label.clone());
    piece.nomenclature_id = Some(line.id.clone());
    piece.cut_rule = line.cut_rule.clone();
    piece.quantity = line.quantity;
    piece
}

/// Run both frame sub-passes over the ingested lines.
pub fn generate_frame(ctx: &FrameContext, lines: &[FrameLine]) -> FrameLayout {
    let mut layout = FrameLayout::default();

    // Pass 1: geometry and global member lists.
    let placements: Vec<Option<Placement>> =
        lines.iter().map(|line| frame_placement(ctx, line)).collect();
    for (line, placement) in lines.iter().zip(&placements) {
        let Some(placement) = placement else { continue };
        let member = FrameMember {
            zone: line.zone,
            position: line.position.clone(),
            placement: *placement,
            material: line.material.clone(),
        };
        if line.position.is_mullion() {
            layout.mullions.push(member);
        } else if line.position.is_transom() {
            layout.transoms.push(member);
        }
    }

    // Pass 2: materialize.
    let crossers: Vec<Crosser> = layout.mullions.iter().map(FrameMember::crosser).collect();
    for (line, placement) in lines.iter().zip(placements) {
        let base = line_piece(line);
        let Some(placement) = placement else {
            layout.pieces.push(base);
            continue;
        };

        let resegment = ctx.mullions_through
            && line.zone == Zone::Bay
            && line.position == Position::TopTransom;
        if !resegment {
            layout.pieces.push(base.with_placement(placement));
            continue;
        }

        let segments = segment_band(
            placement.span,
            &crossers,
            CrossingRule::Unconditional,
            ctx.bay_height,
            ctx.tolerance,
        );
        debug!(
            line = %line.id,
            segments = segments.len(),
            "Resegmented bay top transom"
        );
        if segments.len() > 1 {
            layout.top_transom_segments += segments.len();
        }
        for span in segments {
            let mut piece = base
                .clone()
                .with_placement(Placement::horizontal(placement.position, span));
            piece.quantity = 1;
            layout.pieces.push(piece);
        }
    }

    layout
}
