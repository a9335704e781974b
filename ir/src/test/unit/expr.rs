//! Expression construction and traversal tests.

use skein_dtype::DType;

use crate::{BinOp, Buffer, Expr, Var};

#[test]
fn test_binary_dtype_follows_lhs() {
    let a = Expr::float(1.0);
    let b = Expr::float(2.0);
    let sum = Expr::add(a, b);
    assert_eq!(sum.dtype(), DType::Float32);
}

#[test]
fn test_comparison_dtype_is_bool() {
    let a = Expr::int(1);
    let b = Expr::int(2);
    let cmp = Expr::binary(BinOp::Lt, a, b);
    assert_eq!(cmp.dtype(), DType::Bool);
}

#[test]
fn test_load_dtype_follows_buffer() {
    let buf = Buffer::new("A", vec![16], DType::Float64);
    let load = Expr::load(&buf, vec![Expr::int(0)]);
    assert_eq!(load.dtype(), DType::Float64);
}

#[test]
fn test_var_identity() {
    let i = Var::new("i", DType::Int32);
    let j = Var::new("i", DType::Int32);

    // Same name, distinct identity.
    assert_ne!(i, j);
    assert_eq!(i, i.clone());
    assert_ne!(i.id(), j.id());
}

#[test]
fn test_buffer_identity() {
    let a = Buffer::new("A", vec![8, 8], DType::Float32);
    let b = Buffer::new("A", vec![8, 8], DType::Float32);

    assert_ne!(a, b);
    assert_eq!(a, a.clone());
}

#[test]
fn test_contains_var() {
    let i = Var::new("i", DType::Int32);
    let j = Var::new("j", DType::Int32);

    // i*8 + 3
    let expr = Expr::add(Expr::mul(Expr::var(&i), Expr::int(8)), Expr::int(3));
    assert!(expr.contains_var(&i));
    assert!(!expr.contains_var(&j));
}

#[test]
fn test_contains_var_through_load() {
    let i = Var::new("i", DType::Int32);
    let buf = Buffer::new("A", vec![16], DType::Float32);

    let load = Expr::load(&buf, vec![Expr::var(&i)]);
    assert!(load.contains_var(&i));
}

#[test]
fn test_post_order_visits_children_first() {
    let i = Var::new("i", DType::Int32);
    let expr = Expr::mul(Expr::var(&i), Expr::int(4));

    let mut order = Vec::new();
    expr.visit_post_order(&mut |node| {
        order.push(std::mem::discriminant(node));
    });

    assert_eq!(order.len(), 3);
    // The Mul node itself comes last.
    assert_eq!(order[2], std::mem::discriminant(&*expr));
}

#[test]
fn test_as_const_int() {
    assert_eq!(Expr::int(42).as_const_int(), Some(42));
    let i = Var::new("i", DType::Int32);
    assert_eq!(Expr::var(&i).as_const_int(), None);
    // Only direct immediates fold; no evaluation happens here.
    assert_eq!(Expr::add(Expr::int(1), Expr::int(2)).as_const_int(), None);
}
