//! Intermediate member materialization.
//!
//! User-placed mullions and transoms are stored in zone-local coordinates.
//! Mullions become absolute pieces here and feed two lookups: per-zone lists
//! in local coordinates, and the cross-zone list (frame plus intermediate,
//! absolute X) that the transom and glazing passes cut against. Transoms are
//! handed on to the transom pass unchanged.

use crate::generation::frame::FrameMember;
use crate::geometry::{Crosser, FrameContext, Span, Zone};
use crate::piece::{GeneratedPiece, Placement, Role, Source};
use crate::store::records::MemberRecord;
use crate::types::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Mullion,
    /// Mullion with a steel core, always cut at full bay height.
    ReinforcedMullion,
    Transom,
}

impl MemberKind {
    pub fn is_mullion(&self) -> bool {
        matches!(self, MemberKind::Mullion | MemberKind::ReinforcedMullion)
    }
}

/// A user-placed member in its zone's local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub id: RecordId,
    pub kind: MemberKind,
    pub zone: Zone,
    /// X for mullions, Y for transoms, relative to the zone origin.
    pub position: f64,
    pub run: Option<Span>,
    pub material: Option<RecordId>,
}

impl Member {
    pub fn from_record(id: RecordId, record: &MemberRecord) -> Self {
        let run = match (record.run_start, record.run_end) {
            (Some(start), Some(end)) => Some(Span::new(start.min(end), start.max(end))),
            _ => None,
        };
        Member {
            id,
            kind: record.kind,
            zone: Zone::from_label(&record.zone),
            position: record.position,
            run,
            material: record.material_id.clone(),
        }
    }
}

/// Mullion pieces plus the lookups later passes cut against.
#[derive(Debug, Clone, Default)]
pub struct MullionLayout {
    pub pieces: Vec<GeneratedPiece>,
    /// Intermediate mullions per zone, local X, run as stored.
    pub by_zone: BTreeMap<Zone, Vec<Crosser>>,
    /// Frame and intermediate mullions, absolute X, sorted ascending.
    pub cross_zone: Vec<Crosser>,
}

impl MullionLayout {
    pub fn zone_mullions(&self, zone: Zone) -> &[Crosser] {
        self.by_zone.get(&zone).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Materialize the intermediate mullions and build the cross-zone list.
pub fn materialize_members(
    ctx: &FrameContext,
    members: &[Member],
    frame_mullions: &[FrameMember],
) -> MullionLayout {
    let mut layout = MullionLayout::default();
    let full_height = ctx.full_height();
    let effective_run = |run: Option<Span>| {
        if ctx.mullions_through {
            full_height
        } else {
            run.unwrap_or(full_height)
        }
    };

    for member in members.iter().filter(|m| m.kind.is_mullion()) {
        let x = member.position + ctx.zone_offset_x(member.zone);
        let run = member.run.unwrap_or(full_height);

        let mut piece = GeneratedPiece::new(Role::Mullion, member.zone, Source::FromIntermediate)
            .with_placement(Placement::vertical(x, run))
            .with_material(member.material.clone());
        piece.reinforced = member.kind == MemberKind::ReinforcedMullion;
        layout.pieces.push(piece);

        layout
            .by_zone
            .entry(member.zone)
            .or_default()
            .push(Crosser::new(member.position, member.run));
        layout
            .cross_zone
            .push(Crosser::new(x, Some(effective_run(member.run))));
    }

    for mullion in frame_mullions {
        layout.cross_zone.push(Crosser::new(
            mullion.placement.position,
            Some(effective_run(Some(mullion.placement.span))),
        ));
    }
    layout
        .cross_zone
        .sort_by(|a, b| a.coordinate.total_cmp(&b.coordinate));

    layout
}
