//! Band segmentation primitive.
//!
//! Given a band `[b0, b1]` on one axis and a list of candidate crossers, cut
//! the band at every crosser that lies strictly inside it and satisfies the
//! active coverage rule. Used for the top frame transom, intermediate
//! transoms and glazing cells alike.

use crate::geometry::run::is_through;
use crate::geometry::Span;

/// A member that may cut a band: its coordinate on the band's axis and its
/// optional run-range along the perpendicular axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crosser {
    pub coordinate: f64,
    pub run: Option<Span>,
}

impl Crosser {
    pub fn new(coordinate: f64, run: Option<Span>) -> Self {
        Crosser { coordinate, run }
    }
}

/// Coverage predicate deciding whether a crosser cuts the band.
///
/// The transom rule excludes boundary contact (a member resting on a transom
/// does not cut it) while the band rule includes it (a member starting on the
/// band's lower edge still splits the glazing). Both are kept as they are.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrossingRule {
    /// Every crosser cuts.
    Unconditional,
    /// Cuts a transom sitting at `height`.
    Transom { height: f64 },
    /// Cuts the glazing band `band` (perpendicular extent).
    Band { band: Span },
}

impl CrossingRule {
    /// `extent` is the full perpendicular extent used for the through test.
    pub fn cuts(&self, crosser: &Crosser, extent: f64, tol: f64) -> bool {
        let run = match (self, crosser.run.as_ref()) {
            (CrossingRule::Unconditional, _) => return true,
            (_, None) => return true,
            (_, Some(run)) => run,
        };
        if is_through(Some(run), extent, tol) {
            return true;
        }
        match self {
            CrossingRule::Unconditional => true,
            CrossingRule::Transom { height } => run.contains_strictly(*height, tol),
            CrossingRule::Band { band } => {
                run.start <= band.start + tol && run.end >= band.end - tol
            }
        }
    }
}

/// Cut `band` at the qualifying crossers and return the ordered,
/// non-degenerate sub-segments. Segments no longer than `tol` are dropped.
pub fn segment_band(
    band: Span,
    crossers: &[Crosser],
    rule: CrossingRule,
    extent: f64,
    tol: f64,
) -> Vec<Span> {
    let mut cuts: Vec<f64> = crossers
        .iter()
        .filter(|c| band.contains_strictly(c.coordinate, tol))
        .filter(|c| rule.cuts(c, extent, tol))
        .map(|c| c.coordinate)
        .collect();
    cuts.sort_by(|a, b| a.total_cmp(b));
    cuts.dedup_by(|later, earlier| (*later - *earlier).abs() <= tol);

    let mut endpoints = Vec::with_capacity(cuts.len() + 2);
    endpoints.push(band.start);
    endpoints.extend(cuts);
    endpoints.push(band.end);

    endpoints
        .windows(2)
        .filter(|pair| pair[1] > pair[0] + tol)
        .map(|pair| Span::new(pair[0], pair[1]))
        .collect()
}
