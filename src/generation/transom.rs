//! Transom segmentation pass.
//!
//! A bay-wide transom may be cut by any mullion of the bay; a zone transom
//! only by the intermediate mullions of its own zone, compared in local
//! coordinates. Both use the transom crossing rule: a mullion that merely
//! rests on the transom does not cut it.

use crate::generation::intermediate::{Member, MullionLayout};
use crate::geometry::{segment_band, CrossingRule, FrameContext, Span, Zone};
use crate::piece::{GeneratedPiece, Placement, Role, Source};
use tracing::debug;

/// Emit one transom piece per segment, absolute coordinates.
pub fn segment_transoms(
    ctx: &FrameContext,
    members: &[Member],
    mullions: &MullionLayout,
) -> Vec<GeneratedPiece> {
    let mut pieces = Vec::new();
    for transom in members.iter().filter(|m| !m.kind.is_mullion()) {
        let offset = ctx.zone_offset_x(transom.zone);
        let local = transom
            .run
            .unwrap_or_else(|| Span::new(0.0, ctx.zone_width(transom.zone)));
        let crossers = match transom.zone {
            Zone::Bay => &mullions.cross_zone[..],
            zone => mullions.zone_mullions(zone),
        };
        // Bay offset is zero, so the band is already absolute there.
        let segments = segment_band(
            local,
            crossers,
            CrossingRule::Transom {
                height: transom.position,
            },
            ctx.bay_height,
            ctx.tolerance,
        );
        debug!(
            member = %transom.id,
            zone = %transom.zone,
            segments = segments.len(),
            "Segmented transom"
        );
        for span in segments {
            let absolute = Span::new(span.start + offset, span.end + offset);
            pieces.push(
                GeneratedPiece::new(Role::Transom, transom.zone, Source::FromIntermediate)
                    .with_placement(Placement::horizontal(transom.position, absolute))
                    .with_material(transom.material.clone()),
            );
        }
    }
    pieces
}

/// Heights of every transom member, with their zones.
pub fn transom_heights(members: &[Member]) -> Vec<(Zone, f64)> {
    members
        .iter()
        .filter(|m| !m.kind.is_mullion())
        .map(|m| (m.zone, m.position))
        .collect()
}
