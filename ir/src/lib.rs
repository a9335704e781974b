//! Read-only structural view of a lowered tensor program.
//!
//! A lowered program is a loop nest over typed multi-dimensional buffers:
//! [`Stmt`] nodes form the nest (loops, attribute scopes, stores, buffer
//! realizations) and [`Expr`] nodes form the scalar computation inside it.
//! The view is deliberately small: it exposes exactly what downstream
//! analyses need (loop bounds, buffer index expressions, operand types,
//! call effects) and nothing of the scheduling pipeline that produced it.
//!
//! # Module Organization
//!
//! - [`expr`] - Scalar expressions with typed operands
//! - [`stmt`] - Statement nodes of the loop nest
//! - [`bounds`] - Conservative const-int-bound analysis over expressions
//! - [`effect`] - Effect classification for call operators
//! - [`error`] - Malformed-IR errors

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use skein_dtype::DType;

pub mod bounds;
pub mod effect;
pub mod error;
pub mod expr;
pub mod stmt;

#[cfg(test)]
pub mod test;

pub use bounds::{BoundAnalyzer, ConstIntBound};
pub use effect::{CallEffect, OpEffectTable};
pub use error::{Error, Result};
pub use expr::{BinOp, Expr};
pub use stmt::{AttrKey, ForKind, RealizeBound, Stmt};

// Monotonic IDs for interned nodes.
//
// Vars and buffers are compared by identity, never structurally: two buffers
// with the same name and shape are still two buffers. A process-wide atomic
// (relaxed, no ordering requirements) keeps IDs unique even when records are
// lowered on worker threads.
static NODE_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_node_id() -> u64 {
    NODE_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug)]
struct VarNode {
    id: u64,
    name: String,
    dtype: DType,
}

/// A scalar loop/thread variable, compared by identity.
#[derive(Debug, Clone)]
pub struct Var(Arc<VarNode>);

impl Var {
    pub fn new(name: impl Into<String>, dtype: DType) -> Self {
        Self(Arc::new(VarNode { id: next_node_id(), name: name.into(), dtype }))
    }

    /// Stable identity of this variable.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn dtype(&self) -> DType {
        self.0.dtype
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Var {}

impl std::hash::Hash for Var {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

#[derive(Debug)]
struct BufferNode {
    id: u64,
    name: String,
    shape: Vec<i64>,
    dtype: DType,
}

/// A typed multi-dimensional buffer, compared by identity.
#[derive(Debug, Clone)]
pub struct Buffer(Arc<BufferNode>);

impl Buffer {
    pub fn new(name: impl Into<String>, shape: Vec<i64>, dtype: DType) -> Self {
        Self(Arc::new(BufferNode { id: next_node_id(), name: name.into(), shape, dtype }))
    }

    /// Stable identity of this buffer.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn shape(&self) -> &[i64] {
        &self.0.shape
    }

    pub fn ndim(&self) -> usize {
        self.0.shape.len()
    }

    pub fn dtype(&self) -> DType {
        self.0.dtype
    }

    /// Size of a single element in bytes.
    pub fn elem_bytes(&self) -> i64 {
        self.0.dtype.bytes()
    }
}

impl PartialEq for Buffer {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Buffer {}

impl std::hash::Hash for Buffer {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}
