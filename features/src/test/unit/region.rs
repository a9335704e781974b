//! Touched-region estimation tests.

use skein_dtype::DType;
use skein_ir::{BoundAnalyzer, Expr, Var};
use smallvec::smallvec;

use crate::access::IndexTuple;
use crate::region::{region_elems, region_extents};

#[test]
fn test_single_tuple_region() {
    let i = Var::new("i", DType::Int32);
    let j = Var::new("j", DType::Int32);
    let mut ana = BoundAnalyzer::new();
    ana.bind(&i, &Expr::int(0), 32);
    ana.bind(&j, &Expr::int(0), 8);

    let tuple: IndexTuple = smallvec![Expr::var(&i), Expr::var(&j)];
    let region = region_extents(&[tuple], &ana);
    assert_eq!(region, vec![32, 8]);
    assert_eq!(region_elems(&region), 256);
}

#[test]
fn test_degenerate_binding_gives_unit_extent() {
    let i = Var::new("i", DType::Int32);
    let mut ana = BoundAnalyzer::new();
    ana.bind(&i, &Expr::int(0), 1);

    let tuple: IndexTuple = smallvec![Expr::var(&i)];
    assert_eq!(region_extents(&[tuple], &ana), vec![1]);
}

#[test]
fn test_multiple_tuples_union_per_dimension() {
    let i = Var::new("i", DType::Int32);
    let mut ana = BoundAnalyzer::new();
    ana.bind(&i, &Expr::int(0), 32);

    // A[i] and A[i + 16] together touch [0, 48).
    let first: IndexTuple = smallvec![Expr::var(&i)];
    let second: IndexTuple = smallvec![Expr::add(Expr::var(&i), Expr::int(16))];
    assert_eq!(region_extents(&[first, second], &ana), vec![48]);
}

#[test]
fn test_affine_index_region() {
    let i = Var::new("i", DType::Int32);
    let mut ana = BoundAnalyzer::new();
    ana.bind(&i, &Expr::int(0), 8);

    // A[i*4]: bounds [0, 28], extent 29.
    let tuple: IndexTuple = smallvec![Expr::mul(Expr::var(&i), Expr::int(4))];
    assert_eq!(region_extents(&[tuple], &ana), vec![29]);
}

#[test]
fn test_empty_indices() {
    let ana = BoundAnalyzer::new();
    assert!(region_extents(&[], &ana).is_empty());
    assert_eq!(region_elems(&[]), 1);
}

#[test]
fn test_constant_index_region() {
    let ana = BoundAnalyzer::new();
    let tuple: IndexTuple = smallvec![Expr::int(7)];
    assert_eq!(region_extents(&[tuple], &ana), vec![1]);
}
