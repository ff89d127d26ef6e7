#![forbid(unsafe_code)]
//! riffle-exchange: the two data-movement primitives behind join execution.
//!
//! - `partition`: deterministic hash repartitioning (the shuffle side of a
//!   sort-merge join).
//! - `broadcast`: full-relation replication into an immutable shared
//!   snapshot (the build side of a broadcast-hash join).
//!
//! Both are explicit blocking boundaries: they consume their input stream
//! fully before returning. Downstream workers never see partial data.

pub mod broadcast;
pub mod partition;

pub use broadcast::{broadcast, BroadcastSnapshot};
pub use partition::{check_skew, partition, Partition};
