//! Statement nodes of the lowered loop nest.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::{Buffer, Expr, Var};

/// How a loop is scheduled to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForKind {
    Serial,
    Parallel,
    Vectorized,
    Unrolled,
}

/// Attribute-scope keys the analysis understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrKey {
    /// Binds a GPU thread axis (`blockIdx.*` / `threadIdx.*`) to an extent.
    ThreadExtent,
    /// Binds a virtual-thread axis to an extent.
    VirtualThread,
    /// Overrides the auto-unroll step limit within the scope.
    AutoUnrollMaxStep,
}

/// One dimension of a buffer realization scope.
#[derive(Debug, Clone)]
pub struct RealizeBound {
    pub min: Arc<Expr>,
    pub extent: Arc<Expr>,
}

/// A statement of the lowered program.
#[derive(Debug)]
pub enum Stmt {
    For {
        var: Var,
        min: Arc<Expr>,
        extent: Arc<Expr>,
        kind: ForKind,
        body: Arc<Stmt>,
    },
    Attr {
        key: AttrKey,
        var: Var,
        value: Arc<Expr>,
        body: Arc<Stmt>,
    },
    Store {
        buffer: Buffer,
        indices: SmallVec<[Arc<Expr>; 4]>,
        value: Arc<Expr>,
    },
    Realize {
        buffer: Buffer,
        bounds: Vec<RealizeBound>,
        body: Arc<Stmt>,
    },
    Seq(Vec<Arc<Stmt>>),
    Evaluate(Arc<Expr>),
}

impl Stmt {
    pub fn for_(var: &Var, min: Arc<Expr>, extent: Arc<Expr>, kind: ForKind, body: Arc<Stmt>) -> Arc<Self> {
        Arc::new(Self::For { var: var.clone(), min, extent, kind, body })
    }

    /// Serial loop `for var in min..min+extent`.
    pub fn serial(var: &Var, min: Arc<Expr>, extent: Arc<Expr>, body: Arc<Stmt>) -> Arc<Self> {
        Self::for_(var, min, extent, ForKind::Serial, body)
    }

    pub fn attr(key: AttrKey, var: &Var, value: Arc<Expr>, body: Arc<Stmt>) -> Arc<Self> {
        Arc::new(Self::Attr { key, var: var.clone(), value, body })
    }

    pub fn store(buffer: &Buffer, indices: Vec<Arc<Expr>>, value: Arc<Expr>) -> Arc<Self> {
        Arc::new(Self::Store { buffer: buffer.clone(), indices: SmallVec::from_vec(indices), value })
    }

    pub fn realize(buffer: &Buffer, bounds: Vec<RealizeBound>, body: Arc<Stmt>) -> Arc<Self> {
        Arc::new(Self::Realize { buffer: buffer.clone(), bounds, body })
    }

    pub fn seq(stmts: Vec<Arc<Stmt>>) -> Arc<Self> {
        Arc::new(Self::Seq(stmts))
    }
}
