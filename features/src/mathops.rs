//! Math op counting over a store's value expression.

use skein_ir::{BinOp, Expr, OpEffectTable};
use snafu::OptionExt;

use crate::error::Result;

/// Per-category op counts for one store's value expression.
///
/// Binary ops split into float/int by the *left* operand's type; calls
/// split by the call's own result type and by the operator's effect
/// classification (pure calls are math functions, the rest are opaque).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MathOpCounts {
    // TODO: detect fused multiply-add; the mad counters are reserved in the
    // schema and currently always zero.
    pub float_mad: u64,
    pub float_addsub: u64,
    pub float_mul: u64,
    pub float_divmod: u64,
    pub float_cmp: u64,
    pub float_math_func: u64,
    pub float_other_func: u64,
    pub int_mad: u64,
    pub int_addsub: u64,
    pub int_mul: u64,
    pub int_divmod: u64,
    pub int_cmp: u64,
    pub int_math_func: u64,
    pub int_other_func: u64,
    pub bool_op: u64,
    pub select_op: u64,
}

impl MathOpCounts {
    /// Total floating-point ops; drives the arithmetic intensity curve.
    pub fn float_total(&self) -> u64 {
        self.float_mad
            + self.float_addsub
            + self.float_mul
            + self.float_divmod
            + self.float_cmp
            + self.float_math_func
            + self.float_other_func
    }
}

/// Count math ops in `expr`, post-order.
///
/// Fails when a call operator has no entry in the effect table; the record
/// is then dropped as malformed.
pub fn count_math_ops(expr: &Expr, effects: &OpEffectTable) -> Result<MathOpCounts> {
    let mut counts = MathOpCounts::default();
    visit(expr, effects, &mut counts)?;
    Ok(counts)
}

fn visit(expr: &Expr, effects: &OpEffectTable, counts: &mut MathOpCounts) -> Result<()> {
    for child in expr.children() {
        visit(child, effects, counts)?;
    }

    match expr {
        Expr::Binary { op, a, .. } => {
            let float = a.dtype().is_float();
            match op {
                BinOp::Add | BinOp::Sub => {
                    if float {
                        counts.float_addsub += 1;
                    } else {
                        counts.int_addsub += 1;
                    }
                }
                BinOp::Mul => {
                    if float {
                        counts.float_mul += 1;
                    } else {
                        counts.int_mul += 1;
                    }
                }
                BinOp::Div | BinOp::Mod | BinOp::FloorDiv | BinOp::FloorMod => {
                    if float {
                        counts.float_divmod += 1;
                    } else {
                        counts.int_divmod += 1;
                    }
                }
                BinOp::Min | BinOp::Max | BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                    if float {
                        counts.float_cmp += 1;
                    } else {
                        counts.int_cmp += 1;
                    }
                }
                BinOp::And | BinOp::Or => counts.bool_op += 1,
            }
        }
        Expr::Not { .. } => counts.bool_op += 1,
        Expr::Select { .. } => counts.select_op += 1,
        Expr::Call { op, dtype, .. } => {
            let effect = effects.effect(op).context(skein_ir::error::UnknownCallEffectSnafu { op: op.clone() })?;
            let float = dtype.is_float();
            if effect.is_pure() {
                if float {
                    counts.float_math_func += 1;
                } else {
                    counts.int_math_func += 1;
                }
            } else if float {
                counts.float_other_func += 1;
            } else {
                counts.int_other_func += 1;
            }
        }
        _ => {}
    }

    Ok(())
}
