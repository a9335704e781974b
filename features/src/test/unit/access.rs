//! Access collection and kind-transition tests.

use skein_dtype::DType;
use skein_ir::{Buffer, Expr, Var};

use crate::access::{AccessCollector, AccessKind};

#[test]
fn test_load_only_is_read() {
    let i = Var::new("i", DType::Int32);
    let a = Buffer::new("A", vec![64], DType::Float32);
    let expr = Expr::load(&a, vec![Expr::var(&i)]);

    let mut collector = AccessCollector::default();
    collector.collect_reads(&expr);

    let accesses: Vec<_> = collector.iter().collect();
    assert_eq!(accesses.len(), 1);
    assert_eq!(accesses[0].1.kind, AccessKind::Read);
    assert_eq!(accesses[0].1.indices.len(), 1);
}

#[test]
fn test_repeated_loads_accumulate_tuples() {
    let i = Var::new("i", DType::Int32);
    let a = Buffer::new("A", vec![64], DType::Float32);
    let expr = Expr::add(Expr::load(&a, vec![Expr::var(&i)]), Expr::load(&a, vec![Expr::add(Expr::var(&i), Expr::int(1))]));

    let mut collector = AccessCollector::default();
    collector.collect_reads(&expr);

    let accesses: Vec<_> = collector.iter().collect();
    assert_eq!(accesses[0].1.kind, AccessKind::Read);
    assert_eq!(accesses[0].1.indices.len(), 2);
}

#[test]
fn test_write_then_load_is_read_write() {
    let i = Var::new("i", DType::Int32);
    let c = Buffer::new("C", vec![64], DType::Float32);

    let mut collector = AccessCollector::default();
    collector.insert_access(&c, AccessKind::Write, &[Expr::var(&i)]);
    collector.collect_reads(&Expr::load(&c, vec![Expr::var(&i)]));

    let accesses: Vec<_> = collector.iter().collect();
    assert_eq!(accesses[0].1.kind, AccessKind::ReadWrite);
    // Update-style accesses share indices with the write, so the load's
    // tuple is not appended.
    assert_eq!(accesses[0].1.indices.len(), 1);
}

#[test]
fn test_write_only_stays_write() {
    let i = Var::new("i", DType::Int32);
    let b = Buffer::new("B", vec![64], DType::Float32);

    let mut collector = AccessCollector::default();
    collector.insert_access(&b, AccessKind::Write, &[Expr::var(&i)]);

    let accesses: Vec<_> = collector.iter().collect();
    assert_eq!(accesses[0].1.kind, AccessKind::Write);
}

#[test]
fn test_insertion_order_is_preserved() {
    let i = Var::new("i", DType::Int32);
    let a = Buffer::new("A", vec![64], DType::Float32);
    let b = Buffer::new("B", vec![64], DType::Float32);
    let c = Buffer::new("C", vec![64], DType::Float32);

    let mut collector = AccessCollector::default();
    collector.insert_access(&c, AccessKind::Write, &[Expr::var(&i)]);
    let value = Expr::add(Expr::load(&a, vec![Expr::var(&i)]), Expr::load(&b, vec![Expr::var(&i)]));
    collector.collect_reads(&value);

    let order: Vec<&str> = collector.iter().map(|(buf, _)| buf.name()).collect();
    assert_eq!(order, ["C", "A", "B"]);
}
