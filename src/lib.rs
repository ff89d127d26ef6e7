#![forbid(unsafe_code)]
//! riffle: a join-strategy planner and executor for tabular relations.
//!
//! Three entry points, mirroring how a distributed engine plans and runs an
//! equality join:
//! - [`StrategyPlanner::plan`] picks broadcast-hash vs. sort-merge from size
//!   estimates and a threshold policy, producing an immutable [`JoinPlan`].
//! - [`JoinExecutor::execute`] drives the chosen strategy over the two
//!   relations' row streams and yields the joined rows lazily.
//! - [`explain`] renders any plan (including a downgraded one) as a
//!   deterministic execution-plan tree.
//!
//! ```
//! use std::sync::Arc;
//! use riffle::prelude::*;
//! use riffle::{explain, JoinExecutor, JoinKey, StrategyPlanner};
//!
//! # fn main() -> Result<()> {
//! let schema = Schema::new(vec![
//!     Field::new("id", DataType::Int64, false),
//!     Field::new("value", DataType::Utf8, false),
//! ]);
//! let rows = vec![
//!     vec![Scalar::I64(1), Scalar::Str("A".into())],
//!     vec![Scalar::I64(2), Scalar::Str("B".into())],
//! ];
//! let left = Relation::new("orders", schema.clone(), Arc::new(MemSource::new(rows.clone(), 2)?))?;
//! let right = Relation::new("lookup", schema, Arc::new(MemSource::new(rows, 2)?))?;
//!
//! let config = JoinConfig::default();
//! let plan = StrategyPlanner::new(config.clone()).plan(&left, &right, &JoinKey::on(&[("id", "id")]))?;
//! let mut exec = JoinExecutor::new(config, Arc::new(FixedCluster::new(4)));
//! let joined: Vec<Row> = exec.execute(&plan, &left, &right)?.collect::<Result<_>>()?;
//! assert_eq!(joined.len(), 2);
//! println!("{}", riffle::render(&explain(exec.final_plan().unwrap())));
//! # Ok(())
//! # }
//! ```

pub use riffle_core::prelude;
pub use riffle_core::{cancel, catalog, cluster, config, error, relation, schema, types};
pub use riffle_exchange::{broadcast, partition};
pub use riffle_exec::{ExecState, JoinExecutor, JoinStream};
pub use riffle_planner::{
    explain, render, EstimateSource, JoinKey, JoinPlan, JoinStrategy, PlanNode, SizeEstimate,
    SizeEstimator, StrategyPlanner,
};
