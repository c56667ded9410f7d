//! Tolerance-bounded nearest lookup along one axis.
//!
//! Entries are kept sorted by coordinate; a lookup scans only the window
//! `[coordinate - tol, coordinate + tol]` and returns the closest entry that
//! satisfies the caller's predicate. Ties keep insertion order.

#[derive(Debug, Clone)]
pub struct AxisIndex<T> {
    entries: Vec<(f64, T)>,
}

impl<T> Default for AxisIndex<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> AxisIndex<T> {
    pub fn new(entries: impl IntoIterator<Item = (f64, T)>) -> Self {
        let mut entries: Vec<(f64, T)> = entries.into_iter().collect();
        // Stable sort: equal coordinates keep insertion order.
        entries.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose coordinate lies within `tol` of `coordinate`.
    pub fn within(&self, coordinate: f64, tol: f64) -> impl Iterator<Item = (f64, &T)> {
        let lower = coordinate - tol;
        let upper = coordinate + tol;
        let first = self.entries.partition_point(|(c, _)| *c < lower);
        self.entries[first..]
            .iter()
            .take_while(move |(c, _)| *c <= upper)
            .map(|(c, value)| (*c, value))
    }

    /// Closest entry within `tol` that satisfies `accept`.
    pub fn nearest<F>(&self, coordinate: f64, tol: f64, mut accept: F) -> Option<&T>
    where
        F: FnMut(&T) -> bool,
    {
        let mut best: Option<(f64, &T)> = None;
        for (c, value) in self.within(coordinate, tol) {
            if !accept(value) {
                continue;
            }
            let distance = (c - coordinate).abs();
            match best {
                Some((best_distance, _)) if best_distance <= distance => {}
                _ => best = Some((distance, value)),
            }
        }
        best.map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &T)> {
        self.entries.iter().map(|(c, value)| (*c, value))
    }
}
