//! Shared fixtures for the integration suites.
#![allow(dead_code)] // not every suite uses every fixture

use std::sync::Arc;

use riffle::prelude::*;

/// A "large" relation of id/value rows and a small id/category lookup.
/// The rows themselves stay tiny for assertion clarity; a cached exact
/// byte size makes the estimator see this side as the big one.
pub fn large_relation() -> Relation {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("value", DataType::Utf8, false),
    ]);
    let rows: Vec<Row> = vec![
        vec![Scalar::I64(1), Scalar::Str("A".into())],
        vec![Scalar::I64(2), Scalar::Str("B".into())],
        vec![Scalar::I64(3), Scalar::Str("C".into())],
    ];
    let source = MemSource::new(rows, 2)
        .unwrap()
        .with_known_bytes(20 * 1024 * 1024);
    Relation::new("large_df", schema, Arc::new(source)).unwrap()
}

pub fn lookup_relation() -> Relation {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("category", DataType::Utf8, false),
    ]);
    let rows: Vec<Row> = vec![
        vec![Scalar::I64(1), Scalar::Str("Category_1".into())],
        vec![Scalar::I64(2), Scalar::Str("Category_2".into())],
    ];
    Relation::new("lookup_df", schema, Arc::new(MemSource::new(rows, 2).unwrap())).unwrap()
}

/// Relation of `n` id/payload rows with ids cycling through `distinct` keys.
pub fn keyed_relation(id: &str, n: i64, distinct: i64) -> Relation {
    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("payload", DataType::Utf8, false),
    ]);
    let rows: Vec<Row> = (0..n)
        .map(|i| {
            vec![
                Scalar::I64(i % distinct),
                Scalar::Str(format!("{}_{}", id, i)),
            ]
        })
        .collect();
    Relation::new(id, schema, Arc::new(MemSource::new(rows, 2).unwrap())).unwrap()
}

/// Sort rows for multiset comparison (output order is not guaranteed
/// across partitions).
pub fn normalized(mut rows: Vec<Row>) -> Vec<Row> {
    rows.sort_by(|a, b| format!("{:?}", a).cmp(&format!("{:?}", b)));
    rows
}
