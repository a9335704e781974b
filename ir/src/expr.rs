//! Scalar expressions of the lowered IR.
//!
//! Expressions arrive fully typed from the lowering pipeline; no promotion
//! or checking happens here. Nodes are shared behind `Arc` so a program can
//! reuse subexpressions freely, and all traversal is read-only.

use std::sync::Arc;

use smallvec::SmallVec;

use skein_dtype::DType;

use crate::{Buffer, Var};

/// Binary operators on scalars.
///
/// Comparisons and logical connectives produce `Bool`; every other operator
/// preserves the left operand's dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    FloorDiv,
    FloorMod,
    Min,
    Max,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinOp {
    /// Returns true for operators whose result is `Bool` regardless of
    /// operand types.
    pub fn is_boolean_valued(self) -> bool {
        matches!(self, Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::And | Self::Or)
    }
}

/// A scalar expression node.
#[derive(Debug)]
pub enum Expr {
    IntImm { value: i64, dtype: DType },
    FloatImm { value: f64, dtype: DType },
    Var(Var),
    Cast { src: Arc<Expr>, dtype: DType },
    Binary { op: BinOp, a: Arc<Expr>, b: Arc<Expr> },
    Not { src: Arc<Expr> },
    Select { cond: Arc<Expr>, then_case: Arc<Expr>, else_case: Arc<Expr> },
    Call { op: String, args: SmallVec<[Arc<Expr>; 4]>, dtype: DType },
    Load { buffer: Buffer, indices: SmallVec<[Arc<Expr>; 4]> },
}

impl Expr {
    pub fn dtype(&self) -> DType {
        match self {
            Self::IntImm { dtype, .. } | Self::FloatImm { dtype, .. } | Self::Call { dtype, .. } => *dtype,
            Self::Var(var) => var.dtype(),
            Self::Cast { dtype, .. } => *dtype,
            Self::Binary { op, a, .. } => {
                if op.is_boolean_valued() {
                    DType::Bool
                } else {
                    a.dtype()
                }
            }
            Self::Not { .. } => DType::Bool,
            Self::Select { then_case, .. } => then_case.dtype(),
            Self::Load { buffer, .. } => buffer.dtype(),
        }
    }

    /// Direct children of this node.
    pub fn children(&self) -> SmallVec<[&Arc<Expr>; 4]> {
        match self {
            Self::IntImm { .. } | Self::FloatImm { .. } | Self::Var(_) => SmallVec::new(),
            Self::Cast { src, .. } | Self::Not { src } => SmallVec::from_slice(&[src]),
            Self::Binary { a, b, .. } => SmallVec::from_slice(&[a, b]),
            Self::Select { cond, then_case, else_case } => SmallVec::from_slice(&[cond, then_case, else_case]),
            Self::Call { args, .. } => args.iter().collect(),
            Self::Load { indices, .. } => indices.iter().collect(),
        }
    }

    /// Visit the expression tree post-order: children first, then the node.
    pub fn visit_post_order(&self, f: &mut dyn FnMut(&Expr)) {
        for child in self.children() {
            child.visit_post_order(f);
        }
        f(self);
    }

    /// Whether `var` occurs anywhere in this expression.
    pub fn contains_var(&self, var: &Var) -> bool {
        match self {
            Self::Var(v) => v == var,
            _ => self.children().into_iter().any(|child| child.contains_var(var)),
        }
    }

    /// The value of a direct integer immediate, if this node is one.
    pub fn as_const_int(&self) -> Option<i64> {
        match self {
            Self::IntImm { value, .. } => Some(*value),
            _ => None,
        }
    }

    // Construction helpers. The lowering collaborator builds programs
    // through these; tests build their fixtures the same way.

    pub fn int(value: i64) -> Arc<Self> {
        Arc::new(Self::IntImm { value, dtype: DType::Int32 })
    }

    pub fn int_typed(value: i64, dtype: DType) -> Arc<Self> {
        Arc::new(Self::IntImm { value, dtype })
    }

    pub fn float(value: f64) -> Arc<Self> {
        Arc::new(Self::FloatImm { value, dtype: DType::Float32 })
    }

    pub fn float_typed(value: f64, dtype: DType) -> Arc<Self> {
        Arc::new(Self::FloatImm { value, dtype })
    }

    pub fn var(var: &Var) -> Arc<Self> {
        Arc::new(Self::Var(var.clone()))
    }

    pub fn cast(src: Arc<Self>, dtype: DType) -> Arc<Self> {
        Arc::new(Self::Cast { src, dtype })
    }

    pub fn binary(op: BinOp, a: Arc<Self>, b: Arc<Self>) -> Arc<Self> {
        Arc::new(Self::Binary { op, a, b })
    }

    pub fn add(a: Arc<Self>, b: Arc<Self>) -> Arc<Self> {
        Self::binary(BinOp::Add, a, b)
    }

    pub fn sub(a: Arc<Self>, b: Arc<Self>) -> Arc<Self> {
        Self::binary(BinOp::Sub, a, b)
    }

    pub fn mul(a: Arc<Self>, b: Arc<Self>) -> Arc<Self> {
        Self::binary(BinOp::Mul, a, b)
    }

    pub fn not(src: Arc<Self>) -> Arc<Self> {
        Arc::new(Self::Not { src })
    }

    pub fn select(cond: Arc<Self>, then_case: Arc<Self>, else_case: Arc<Self>) -> Arc<Self> {
        Arc::new(Self::Select { cond, then_case, else_case })
    }

    pub fn call(op: impl Into<String>, args: Vec<Arc<Self>>, dtype: DType) -> Arc<Self> {
        Arc::new(Self::Call { op: op.into(), args: SmallVec::from_vec(args), dtype })
    }

    pub fn load(buffer: &Buffer, indices: Vec<Arc<Self>>) -> Arc<Self> {
        Arc::new(Self::Load { buffer: buffer.clone(), indices: SmallVec::from_vec(indices) })
    }
}
