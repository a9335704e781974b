//! Op-effect table tests.

use crate::{CallEffect, OpEffectTable};

#[test]
fn test_builtins_cover_math_intrinsics() {
    let table = OpEffectTable::with_builtins();
    assert_eq!(table.effect("exp"), Some(CallEffect::Pure));
    assert_eq!(table.effect("sqrt"), Some(CallEffect::Pure));
    assert_eq!(table.effect("if_then_else"), Some(CallEffect::ExprAnnotation));
    assert_eq!(table.effect("access_ptr"), Some(CallEffect::Opaque));
}

#[test]
fn test_unregistered_op_is_none() {
    let table = OpEffectTable::with_builtins();
    assert_eq!(table.effect("my_custom_kernel"), None);
}

#[test]
fn test_register_overrides() {
    let mut table = OpEffectTable::new();
    table.register("exp", CallEffect::Opaque);
    assert_eq!(table.effect("exp"), Some(CallEffect::Opaque));
    table.register("exp", CallEffect::Pure);
    assert_eq!(table.effect("exp"), Some(CallEffect::Pure));
}

#[test]
fn test_purity_classification() {
    assert!(CallEffect::Pure.is_pure());
    assert!(CallEffect::ExprAnnotation.is_pure());
    assert!(!CallEffect::ReadState.is_pure());
    assert!(!CallEffect::UpdateState.is_pure());
    assert!(!CallEffect::Opaque.is_pure());
}
