//! Per-buffer access collection for one store statement.

use std::collections::HashMap;
use std::sync::Arc;

use smallvec::SmallVec;

use skein_ir::{Buffer, Expr};

/// How a buffer is touched within one store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read = 0,
    Write = 1,
    ReadWrite = 2,
    Unknown = 3,
}

/// One index tuple: a scalar expression per buffer dimension.
pub type IndexTuple = SmallVec<[Arc<Expr>; 4]>;

/// All observed accesses to one buffer inside one store.
#[derive(Debug, Clone)]
pub struct BufferAccess {
    pub kind: AccessKind,
    pub indices: Vec<IndexTuple>,
}

impl Default for BufferAccess {
    fn default() -> Self {
        Self { kind: AccessKind::Unknown, indices: Vec::new() }
    }
}

/// Collects buffer accesses in insertion order.
///
/// The store's destination is inserted first as a write; the value
/// expression is then scanned for loads. Insertion order is preserved so
/// extraction stays deterministic across runs.
#[derive(Debug, Default)]
pub struct AccessCollector {
    accesses: Vec<(Buffer, BufferAccess)>,
    index: HashMap<u64, usize>,
}

impl AccessCollector {
    /// Record an access with an explicit kind, appending its index tuple.
    pub fn insert_access(&mut self, buffer: &Buffer, kind: AccessKind, indices: &[Arc<Expr>]) {
        let acc = self.entry(buffer);
        acc.kind = kind;
        acc.indices.push(IndexTuple::from(indices));
    }

    /// Scan `expr` for buffer loads and merge them in.
    ///
    /// A load observed on a buffer already written makes it read-write. In
    /// the source DSL a read-write buffer is an update-style store whose
    /// load shares the store's indices, so further tuples are not appended.
    pub fn collect_reads(&mut self, expr: &Expr) {
        expr.visit_post_order(&mut |node| {
            if let Expr::Load { buffer, indices } = node {
                let acc = self.entry(buffer);
                acc.kind = match acc.kind {
                    AccessKind::Unknown => AccessKind::Read,
                    AccessKind::Read => AccessKind::Read,
                    AccessKind::Write | AccessKind::ReadWrite => AccessKind::ReadWrite,
                };
                if acc.kind != AccessKind::ReadWrite {
                    acc.indices.push(indices.clone());
                }
            }
        });
    }

    /// Accesses in the order their buffers were first observed.
    pub fn iter(&self) -> impl Iterator<Item = &(Buffer, BufferAccess)> {
        self.accesses.iter()
    }

    pub fn len(&self) -> usize {
        self.accesses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accesses.is_empty()
    }

    fn entry(&mut self, buffer: &Buffer) -> &mut BufferAccess {
        let slot = *self.index.entry(buffer.id()).or_insert_with(|| {
            self.accesses.push((buffer.clone(), BufferAccess::default()));
            self.accesses.len() - 1
        });
        &mut self.accesses[slot].1
    }
}
