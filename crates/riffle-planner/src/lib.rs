#![forbid(unsafe_code)]
//! riffle-planner: from two relations and a join key → a `JoinPlan`.
//!
//! Planning is pure decision logic, deliberately independent of execution so
//! it is unit-testable without running any join:
//! - `estimate`: approximate byte sizes from hints, catalog stats, or sampling
//! - `plan`: threshold policy choosing broadcast-hash vs. sort-merge
//! - `explain`: deterministic, renderable plan tree

pub mod estimate;
pub mod explain;
pub mod plan;
pub mod planner;

pub use estimate::{EstimateSource, SizeEstimate, SizeEstimator};
pub use explain::{explain, render, PlanNode};
pub use plan::{JoinKey, JoinPlan, JoinStrategy};
pub use planner::StrategyPlanner;
