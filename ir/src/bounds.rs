//! Conservative const-int-bound analysis over expressions.
//!
//! The analyzer tracks an inclusive integer interval per bound variable and
//! evaluates expression bounds bottom-up. The analysis is conservative:
//! when in doubt it returns the full sentinel range rather than risk an
//! interval that excludes a reachable value.

use std::collections::HashMap;

use crate::expr::{BinOp, Expr};
use crate::Var;

/// An inclusive integer interval, with `i64` extremes as infinities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstIntBound {
    pub min: i64,
    pub max: i64,
}

impl ConstIntBound {
    pub const POS_INF: i64 = i64::MAX;
    pub const NEG_INF: i64 = i64::MIN;

    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// The full sentinel range: nothing is known.
    pub const fn everything() -> Self {
        Self { min: Self::NEG_INF, max: Self::POS_INF }
    }

    pub const fn single(value: i64) -> Self {
        Self { min: value, max: value }
    }

    fn union(self, other: Self) -> Self {
        Self { min: self.min.min(other.min), max: self.max.max(other.max) }
    }

    fn intersect(self, other: Self) -> Self {
        Self { min: self.min.max(other.min), max: self.max.min(other.max) }
    }

    fn contains_zero(self) -> bool {
        self.min <= 0 && self.max >= 0
    }

    const BOOL: Self = Self { min: 0, max: 1 };
}

/// Interval bindings for loop variables plus bottom-up bound evaluation.
#[derive(Debug, Default)]
pub struct BoundAnalyzer {
    bindings: HashMap<u64, ConstIntBound>,
}

impl BoundAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `var` to `[min, min + extent)`. Re-binding overrides the
    /// previous interval; the loop min is evaluated under the bindings
    /// present at the time of the call, so outer variables referenced by a
    /// non-constant min must be bound first.
    pub fn bind(&mut self, var: &Var, min: &Expr, extent: i64) {
        let extent = extent.max(1);
        let m = self.const_int_bound(min);
        let bound = ConstIntBound::new(m.min, m.max.saturating_add(extent - 1));
        self.bindings.insert(var.id(), bound);
    }

    /// Conservative interval of `expr` under the current bindings.
    pub fn const_int_bound(&self, expr: &Expr) -> ConstIntBound {
        match expr {
            Expr::IntImm { value, .. } => ConstIntBound::single(*value),
            Expr::FloatImm { .. } => ConstIntBound::everything(),
            Expr::Var(var) => match self.bindings.get(&var.id()) {
                Some(bound) => *bound,
                None => match var.dtype().int_bounds() {
                    Some((min, max)) => ConstIntBound::new(min, max),
                    None => ConstIntBound::everything(),
                },
            },
            Expr::Cast { src, dtype } => {
                let inner = self.const_int_bound(src);
                match dtype.int_bounds() {
                    Some((min, max)) => inner.intersect(ConstIntBound::new(min, max)),
                    None => ConstIntBound::everything(),
                }
            }
            Expr::Binary { op, a, b } => {
                let a = self.const_int_bound(a);
                let b = self.const_int_bound(b);
                binary_bound(*op, a, b)
            }
            Expr::Not { .. } => ConstIntBound::BOOL,
            Expr::Select { then_case, else_case, .. } => {
                self.const_int_bound(then_case).union(self.const_int_bound(else_case))
            }
            Expr::Call { .. } | Expr::Load { .. } => ConstIntBound::everything(),
        }
    }
}

fn binary_bound(op: BinOp, a: ConstIntBound, b: ConstIntBound) -> ConstIntBound {
    match op {
        BinOp::Add => ConstIntBound::new(a.min.saturating_add(b.min), a.max.saturating_add(b.max)),
        BinOp::Sub => ConstIntBound::new(a.min.saturating_sub(b.max), a.max.saturating_sub(b.min)),
        BinOp::Mul => four_corners(a, b, |x, y| x.saturating_mul(y)),
        BinOp::Div | BinOp::FloorDiv => {
            // A divisor range straddling zero gives no usable bound.
            if b.contains_zero() {
                ConstIntBound::everything()
            } else {
                four_corners(a, b, |x, y| x.checked_div(y).unwrap_or(ConstIntBound::POS_INF))
            }
        }
        BinOp::Mod | BinOp::FloorMod => {
            if b.contains_zero() {
                ConstIntBound::everything()
            } else {
                // |a % b| < |b|; for a non-negative dividend the result is
                // non-negative as well.
                let m = b.min.saturating_abs().max(b.max.saturating_abs()).saturating_sub(1);
                if a.min >= 0 {
                    ConstIntBound::new(0, m)
                } else {
                    ConstIntBound::new(m.saturating_neg(), m)
                }
            }
        }
        BinOp::Min => ConstIntBound::new(a.min.min(b.min), a.max.min(b.max)),
        BinOp::Max => ConstIntBound::new(a.min.max(b.min), a.max.max(b.max)),
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge | BinOp::And | BinOp::Or => {
            ConstIntBound::BOOL
        }
    }
}

/// Evaluate `f` at the four corners of `a × b` and take the envelope.
fn four_corners(a: ConstIntBound, b: ConstIntBound, f: impl Fn(i64, i64) -> i64) -> ConstIntBound {
    let corners = [f(a.min, b.min), f(a.min, b.max), f(a.max, b.min), f(a.max, b.max)];
    let min = corners.iter().copied().min().unwrap_or(ConstIntBound::NEG_INF);
    let max = corners.iter().copied().max().unwrap_or(ConstIntBound::POS_INF);
    ConstIntBound::new(min, max)
}
