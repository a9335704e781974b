//! Effect classification for call operators.
//!
//! The lowering pipeline attaches an effect kind to every operator it can
//! emit calls to. The table is an immutable lookup service handed to the
//! analysis at construction; there is no ambient registry.

use std::collections::HashMap;

/// Side-effect classification of a call operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallEffect {
    /// No side effects, result depends only on arguments.
    Pure,
    /// Pure annotation wrapper (e.g. `if_then_else`); computationally pure.
    ExprAnnotation,
    /// Reads global state.
    ReadState,
    /// Mutates global state.
    UpdateState,
    /// Effects unknown to the compiler.
    Opaque,
}

impl CallEffect {
    /// Pure and annotation calls count as math functions; everything else
    /// is an opaque "other" call.
    pub fn is_pure(self) -> bool {
        matches!(self, Self::Pure | Self::ExprAnnotation)
    }
}

/// Immutable map from operator name to its effect classification.
#[derive(Debug, Clone, Default)]
pub struct OpEffectTable {
    effects: HashMap<String, CallEffect>,
}

impl OpEffectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-populated with the intrinsics the lowering pipeline emits.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();

        const PURE: &[&str] = &[
            "exp", "exp2", "exp10", "log", "log2", "log10", "sqrt", "rsqrt", "sin", "cos", "tan", "sinh", "cosh",
            "tanh", "sigmoid", "erf", "pow", "fma", "fabs", "floor", "ceil", "round", "trunc", "fmod", "copysign",
            "nearbyint", "atan", "shift_left", "shift_right", "bitwise_and", "bitwise_or", "bitwise_xor",
        ];
        for op in PURE {
            table.register(*op, CallEffect::Pure);
        }

        table.register("if_then_else", CallEffect::ExprAnnotation);
        table.register("likely", CallEffect::ExprAnnotation);

        table.register("prefetch", CallEffect::ReadState);
        table.register("access_ptr", CallEffect::Opaque);
        table.register("call_extern", CallEffect::Opaque);

        table
    }

    pub fn register(&mut self, op: impl Into<String>, effect: CallEffect) {
        self.effects.insert(op.into(), effect);
    }

    /// Effect of `op`, or `None` when the operator was never classified.
    pub fn effect(&self, op: &str) -> Option<CallEffect> {
        self.effects.get(op).copied()
    }
}
