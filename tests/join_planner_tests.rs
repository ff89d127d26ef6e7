//! Planner-level properties: threshold policy, tie-breaks, explicit mode.

mod common;

use std::sync::Arc;

use common::{keyed_relation, large_relation, lookup_relation};
use riffle::prelude::*;
use riffle::{JoinKey, JoinStrategy, StrategyPlanner};

fn config(threshold: u64) -> JoinConfig {
    JoinConfig {
        threshold_bytes: threshold,
        broadcast_cap_bytes: (threshold.max(1)) * 16,
        ..Default::default()
    }
}

#[test]
fn tutorial_scenario_broadcasts_the_lookup_side() {
    // Both relations are far under a 50 MiB threshold; the smaller side
    // (the two-row lookup) is chosen for broadcast.
    let planner = StrategyPlanner::new(config(50 * 1024 * 1024));
    let plan = planner
        .plan(
            &large_relation(),
            &lookup_relation(),
            &JoinKey::on(&[("id", "id")]),
        )
        .unwrap();
    assert_eq!(plan.strategy, JoinStrategy::BroadcastHashJoin);
    assert_eq!(plan.broadcast_side, Some(JoinSide::Right));
    assert!(plan.left_estimate.is_some());
    assert!(plan.right_estimate.is_some());
}

#[test]
fn zero_threshold_always_sort_merges() {
    let planner = StrategyPlanner::new(config(0));
    let plan = planner
        .plan(
            &large_relation(),
            &lookup_relation(),
            &JoinKey::on(&[("id", "id")]),
        )
        .unwrap();
    assert_eq!(plan.strategy, JoinStrategy::SortMergeJoin);
    assert_eq!(plan.broadcast_side, None);
}

#[test]
fn smaller_side_wins_whichever_side_it_is() {
    let planner = StrategyPlanner::new(config(1 << 20));
    let small_left = planner
        .plan(
            &keyed_relation("small", 5, 5),
            &keyed_relation("big", 500, 50),
            &JoinKey::on(&[("id", "id")]),
        )
        .unwrap();
    assert_eq!(small_left.broadcast_side, Some(JoinSide::Left));

    let small_right = planner
        .plan(
            &keyed_relation("big", 500, 50),
            &keyed_relation("small", 5, 5),
            &JoinKey::on(&[("id", "id")]),
        )
        .unwrap();
    assert_eq!(small_right.broadcast_side, Some(JoinSide::Right));
}

#[test]
fn exact_size_tie_breaks_to_left() {
    let planner = StrategyPlanner::new(config(1 << 20));
    let plan = planner
        .plan(
            &keyed_relation("a", 10, 10),
            &keyed_relation("b", 10, 10),
            &JoinKey::on(&[("id", "id")]),
        )
        .unwrap();
    assert_eq!(plan.broadcast_side, Some(JoinSide::Left));
}

#[test]
fn explicit_mode_broadcasts_the_larger_side_without_veto() {
    let mut cfg = config(16);
    cfg.explicit_broadcast = Some(JoinSide::Left);
    let planner = StrategyPlanner::new(cfg);
    let plan = planner
        .plan(
            &keyed_relation("definitely_large", 10_000, 100),
            &keyed_relation("small", 3, 3),
            &JoinKey::on(&[("id", "id")]),
        )
        .unwrap();
    assert_eq!(plan.strategy, JoinStrategy::BroadcastHashJoin);
    assert_eq!(plan.broadcast_side, Some(JoinSide::Left));
}

#[test]
fn explicit_mode_tolerates_unavailable_estimates() {
    let schema = Schema::new(vec![Field::new("id", DataType::Int64, false)]);
    let unbounded = Relation::new(
        "stream",
        schema,
        Arc::new(
            MemSource::new(vec![vec![Scalar::I64(1)]], 1)
                .unwrap()
                .unbounded(),
        ),
    )
    .unwrap();
    let mut cfg = config(1024);
    cfg.explicit_broadcast = Some(JoinSide::Right);
    let plan = StrategyPlanner::new(cfg)
        .plan(
            &unbounded,
            &keyed_relation("small", 3, 3),
            &JoinKey::on(&[("id", "id")]),
        )
        .unwrap();
    assert_eq!(plan.strategy, JoinStrategy::BroadcastHashJoin);
    assert!(plan.left_estimate.is_none());
}

#[test]
fn invalid_key_surfaces_at_plan_time() {
    let planner = StrategyPlanner::new(config(1024));
    let err = planner
        .plan(
            &large_relation(),
            &lookup_relation(),
            &JoinKey::on(&[("id", "no_such_column")]),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidJoinKey(_)));
}

#[test]
fn type_mismatched_key_is_rejected() {
    let planner = StrategyPlanner::new(config(1024));
    let err = planner
        .plan(
            &large_relation(),
            &lookup_relation(),
            &JoinKey::on(&[("value", "id")]),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidJoinKey(_)));
}

#[test]
fn catalog_stats_short_circuit_scanning() {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(
        "large_df",
        TableStats {
            row_count: None,
            byte_size: Some(20 * 1024 * 1024),
        },
    );
    catalog.insert(
        "lookup_df",
        TableStats {
            row_count: None,
            byte_size: Some(1024),
        },
    );
    let planner = StrategyPlanner::new(config(10 * 1024 * 1024)).with_catalog(Arc::new(catalog));
    let plan = planner
        .plan(
            &large_relation(),
            &lookup_relation(),
            &JoinKey::on(&[("id", "id")]),
        )
        .unwrap();
    // Catalog says the left side is over threshold, right is under.
    assert_eq!(plan.broadcast_side, Some(JoinSide::Right));
    assert_eq!(plan.right_estimate.as_ref().unwrap().bytes, 1024);
}
