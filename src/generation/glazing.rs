//! Glazing-cell generation.
//!
//! The bay is cut into height bands at every transom. Above the imposte a
//! band glazes the full width; below it only the fixed zones are glazed, the
//! passage is left to the sash. Each band interval is then split by the
//! mullions that cover the whole band, and every resulting cell is closed by
//! four beads sharing one cell key.

use crate::geometry::{segment_band, Crosser, CrossingRule, FrameContext, Span, Zone};
use crate::piece::{GeneratedPiece, Placement, Role, Side, Source};
use crate::types::{CellKey, RecordId};
use tracing::debug;

/// Beads of every glazing cell.
#[derive(Debug, Clone, Default)]
pub struct GlazingLayout {
    pub pieces: Vec<GeneratedPiece>,
    pub cells: usize,
    pub bands: usize,
}

/// Distinct band boundaries: bay bottom and top plus every transom height,
/// clamped to the bay and merged within tolerance.
pub fn band_heights(ctx: &FrameContext, transoms: &[(Zone, f64)]) -> Vec<f64> {
    let mut heights: Vec<f64> = vec![0.0, ctx.bay_height];
    heights.extend(
        transoms
            .iter()
            .map(|(_, y)| y.clamp(0.0, ctx.bay_height)),
    );
    heights.sort_by(|a, b| a.total_cmp(b));
    heights.dedup_by(|later, earlier| (*later - *earlier).abs() <= ctx.tolerance);
    heights
}

/// Lowest bay-wide transom strictly inside the bay.
pub fn imposte_height(ctx: &FrameContext, transoms: &[(Zone, f64)]) -> Option<f64> {
    let bay = ctx.full_height();
    transoms
        .iter()
        .filter(|(zone, y)| *zone == Zone::Bay && bay.contains_strictly(*y, ctx.tolerance))
        .map(|(_, y)| *y)
        .min_by(|a, b| a.total_cmp(b))
}

/// Horizontal intervals glazed within the band starting at `y0`. Without an
/// imposte every band keeps to the fixed zones.
pub fn band_intervals(ctx: &FrameContext, y0: f64, imposte: Option<f64>) -> Vec<(Zone, Span)> {
    if imposte.map_or(false, |h| y0 >= h - ctx.tolerance) {
        return vec![(Zone::Bay, Span::new(0.0, ctx.bay_width))];
    }
    [
        (Zone::FixedLeft, Span::new(0.0, ctx.fixed_left_width)),
        (
            Zone::FixedRight,
            Span::new(ctx.fixed_left_width + ctx.passage_width, ctx.bay_width),
        ),
    ]
    .into_iter()
    .filter(|(_, span)| span.len() > ctx.tolerance)
    .collect()
}

fn bead(
    zone: Zone,
    side: Side,
    placement: Placement,
    key: &CellKey,
    material: &RecordId,
) -> GeneratedPiece {
    let mut piece = GeneratedPiece::new(Role::Bead, zone, Source::FromIntermediate)
        .with_placement(placement)
        .with_material(Some(material.clone()));
    piece.side = Some(side);
    piece.cell_key = Some(key.clone());
    piece
}

/// Generate the beads of every cell. `cross_zone` is the sorted cross-zone
/// mullion list in absolute coordinates.
pub fn generate_cells(
    ctx: &FrameContext,
    transoms: &[(Zone, f64)],
    cross_zone: &[Crosser],
    bead_material: &RecordId,
) -> GlazingLayout {
    let mut layout = GlazingLayout::default();
    let heights = band_heights(ctx, transoms);
    let imposte = imposte_height(ctx, transoms);

    for (band_index, pair) in heights.windows(2).enumerate() {
        let band = Span::new(pair[0], pair[1]);
        layout.bands += 1;
        for (zone, interval) in band_intervals(ctx, band.start, imposte) {
            let segments = segment_band(
                interval,
                cross_zone,
                CrossingRule::Band { band },
                ctx.bay_height,
                ctx.tolerance,
            );
            for (column, x) in segments.into_iter().enumerate() {
                let key = CellKey::mint(column, band_index, layout.cells);
                let place = |side, placement| bead(zone, side, placement, &key, bead_material);
                layout.pieces.extend([
                    place(Side::Left, Placement::vertical(x.start, band)),
                    place(Side::Right, Placement::vertical(x.end, band)),
                    place(Side::Bottom, Placement::horizontal(band.start, x)),
                    place(Side::Top, Placement::horizontal(band.end, x)),
                ]);
                layout.cells += 1;
            }
        }
    }

    debug!(
        bands = layout.bands,
        cells = layout.cells,
        imposte = ?imposte,
        "Generated glazing cells"
    );
    layout
}
