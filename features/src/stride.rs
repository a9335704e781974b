//! Approximate stride of a loop variable within index expressions.
//!
//! The coefficient extraction is an approximation by intent: it resolves
//! the affine common cases (`c*V + k`) exactly, returns a conservative
//! nonzero sentinel for nested non-affine forms, and is far cheaper than a
//! full linear-equation detection.

use std::sync::Arc;

use skein_ir::{BinOp, Expr, Var};

use crate::access::IndexTuple;

/// Flags accumulated by one post-order scan for a single variable.
#[derive(Debug, Default)]
struct CoefficientExtractor {
    saw_var: bool,
    saw_mul: bool,
    saw_add: bool,
    stride: i64,
}

impl CoefficientExtractor {
    fn visit(&mut self, expr: &Expr, var: &Var) {
        for child in expr.children() {
            self.visit(child, var);
        }

        match expr {
            Expr::Var(v) if v == var => {
                self.saw_var = true;
                // Fallback stride when the surrounding form defeats the
                // approximation.
                self.stride = 2;
            }
            Expr::Binary { op: BinOp::Mul, a, b } => {
                if self.saw_var && !self.saw_add {
                    if let Some(c) = a.as_const_int().or_else(|| b.as_const_int()) {
                        self.saw_mul = true;
                        self.stride = c;
                    }
                }
            }
            Expr::Binary { op: BinOp::Add, .. } => {
                if self.saw_var && !self.saw_mul {
                    self.saw_add = true;
                    self.stride = 1;
                }
            }
            _ => {}
        }
    }
}

/// Approximate coefficient of `var` in `expr`.
///
/// Returns `(coefficient, var_occurs)`; the coefficient is only meaningful
/// when `var_occurs` is true.
pub fn extract_coefficient(expr: &Expr, var: &Var) -> (i64, bool) {
    let mut extractor = CoefficientExtractor::default();
    extractor.visit(expr, var);

    if extractor.saw_var && !extractor.saw_mul && !extractor.saw_add {
        (1, true)
    } else {
        (extractor.stride, extractor.saw_var)
    }
}

/// Stride in flattened elements when `var` ticks by one, minimized over
/// all index tuples of the access. Zero when `var` never appears.
///
/// For each tuple the innermost dimension containing `var` is found by
/// scanning from the last dimension backward; the coefficient there is
/// scaled by the row-major stride of that dimension.
pub fn access_stride(indices: &[IndexTuple], shape: &[i64], var: &Var) -> i64 {
    let mut min_stride = i64::MAX;
    let mut found = false;

    for tuple in indices {
        let mut shape_stride: i64 = 1;
        for (dim, index) in tuple.iter().enumerate().rev() {
            let (coef, occurs) = extract_coefficient(index, var);
            if occurs {
                found = true;
                min_stride = min_stride.min(coef.saturating_abs().saturating_mul(shape_stride));
                break;
            }
            shape_stride = shape_stride.saturating_mul(shape.get(dim).copied().unwrap_or(1));
        }
    }

    if found {
        min_stride
    } else {
        0
    }
}

/// Whether `var` appears in any index expression of any tuple.
pub fn var_in_indices(indices: &[IndexTuple], var: &Var) -> bool {
    indices.iter().flat_map(|tuple| tuple.iter()).any(|index: &Arc<Expr>| index.contains_var(var))
}
