//! Data-reuse classification for one buffer access.

use skein_ir::Buffer;

use crate::access::IndexTuple;
use crate::stride::var_in_indices;
use crate::types::{LoopFrame, PerLoopRegionTable, TouchRegionMap};

/// Kind of data reuse an access exhibits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReuseKind {
    /// A loop that doesn't appear in the indices re-reads the same data on
    /// every iteration.
    LoopMultipleRead = 0,
    /// Several accesses to the buffer inside one serial loop body touch
    /// overlapping data.
    SerialMultipleReadWrite = 1,
    NoReuse = 2,
}

/// Classify the reuse of `buffer` under the current loop stack.
///
/// Returns `(kind, reuse distance in iterations, reuse distance in bytes,
/// reuse count)`. The stack is scanned innermost outward; each level that
/// carries an index variable stretches the reuse distance, and the first
/// level that doesn't closes it.
pub fn compute_reuse(
    buffer: &Buffer,
    indices: &[IndexTuple],
    loop_stack: &[LoopFrame],
    touch_regions: &TouchRegionMap,
) -> (ReuseKind, f32, f32, f32) {
    let mut reuse_dis_iter: f32 = 1.0;
    let mut reuse_dis_bytes: f32 = -1.0;

    for frame in loop_stack.iter().rev() {
        let table = touch_regions.get(&frame.id).expect("region table missing for loop frame");
        let carried = var_in_indices(indices, &frame.var);
        let extent = frame.extent as f32;

        if carried {
            reuse_dis_iter *= extent;
            reuse_dis_bytes = table_bytes(table, |elems| elems);
        } else {
            // This level re-reads without moving: loop-multiple-read reuse.
            if reuse_dis_bytes < 0.0 {
                // Innermost level; nothing accumulated yet, so one element
                // per access.
                reuse_dis_bytes = table_bytes(table, |_| 1);
            }
            return (ReuseKind::LoopMultipleRead, reuse_dis_iter, reuse_dis_bytes, extent);
        }

        let entries = table.get(&buffer.id()).expect("buffer missing from region table");
        if entries.len() > 1 {
            // Multiple accesses to the same buffer within this loop body.
            let min_elems = entries.iter().map(|(_, elems, _)| *elems).min().unwrap_or(0) as f32;
            let bytes = table_bytes(table, |elems| elems);
            let count = (entries.len() - 1) as f32;
            return (ReuseKind::SerialMultipleReadWrite, min_elems / extent, bytes / extent, count);
        }
    }

    (ReuseKind::NoReuse, 0.0, 0.0, 0.0)
}

/// Total bytes over every entry of every buffer in one loop's table, with
/// the element count mapped through `f`.
fn table_bytes(table: &PerLoopRegionTable, f: impl Fn(i64) -> i64) -> f32 {
    let mut total: i64 = 0;
    for entries in table.values() {
        for (_, elems, elem_bytes) in entries {
            total = total.saturating_add(f(*elems).saturating_mul(*elem_bytes));
        }
    }
    total as f32
}
