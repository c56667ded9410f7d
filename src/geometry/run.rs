//! Through / non-through ("filant") classification.

use crate::geometry::Span;

/// A member is through when it has no run-range, or when its run-range covers
/// `[0, extent]` within `tol`. Every cut-eligibility rule starts from here.
pub fn is_through(run: Option<&Span>, extent: f64, tol: f64) -> bool {
    match run {
        None => true,
        Some(run) => run.start <= tol && run.end >= extent - tol,
    }
}
