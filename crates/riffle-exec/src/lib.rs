#![forbid(unsafe_code)]
//! riffle-exec: drives a `JoinPlan` against two relations' row streams.
//!
//! Heavy phases (broadcast, index build, shuffle, per-partition sort) run as
//! blocking prefixes inside `execute`; the returned `JoinStream` then emits
//! joined rows lazily. A broadcast that overruns the safety cap downgrades
//! the plan to sort-merge exactly once and restarts.

pub mod executor;
pub mod hash_join;
pub mod merge_join;

pub use executor::{ExecState, JoinExecutor, JoinStream};
