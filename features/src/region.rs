//! Touched-region estimation for buffer accesses.

use skein_ir::BoundAnalyzer;

use crate::access::IndexTuple;

/// Per-dimension extents of the box touched by `indices` under the
/// analyzer's current bound context.
///
/// With a single tuple each dimension is the width of that index's bound;
/// with several tuples the per-dimension bounds are unioned first. Extents
/// saturate rather than overflow when a bound is the unknown sentinel.
pub fn region_extents(indices: &[IndexTuple], ana: &BoundAnalyzer) -> Vec<i64> {
    let Some(first) = indices.first() else {
        return Vec::new();
    };

    let mut region = Vec::with_capacity(first.len());

    if indices.len() == 1 {
        for index in first.iter() {
            let bound = ana.const_int_bound(index);
            region.push(bound.max.saturating_sub(bound.min).saturating_add(1));
        }
    } else {
        for dim in 0..first.len() {
            let mut minimum = i64::MAX;
            let mut maximum = i64::MIN;
            for tuple in indices {
                let bound = ana.const_int_bound(&tuple[dim]);
                minimum = minimum.min(bound.min);
                maximum = maximum.max(bound.max);
            }
            region.push(maximum.saturating_sub(minimum).saturating_add(1));
        }
    }

    region
}

/// Number of elements in a touched region.
pub fn region_elems(region: &[i64]) -> i64 {
    region.iter().fold(1i64, |acc, extent| acc.saturating_mul(*extent))
}
