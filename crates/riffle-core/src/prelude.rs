//! Convenient re-exports for downstream crates.

pub use crate::cancel::CancelToken;
pub use crate::catalog::{MemoryCatalog, StatsCatalog, TableStats};
pub use crate::cluster::{ClusterInfo, FixedCluster};
pub use crate::config::{JoinConfig, JoinSide};
pub use crate::error::{Error, Result};
pub use crate::relation::{MemSource, Relation, RelationDesc, RowSource, RowStream};
pub use crate::schema::{DataType, Field, Schema};
pub use crate::types::{Row, Scalar};
