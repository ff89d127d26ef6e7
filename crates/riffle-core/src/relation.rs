//! Relations and restartable row sources.
//!
//! A `RowSource` hands out fresh lazy streams on every `scan()`; the iterator
//! returning `None` is the end-of-stream sentinel, and read failures surface
//! pull-based through the `Result` items. Broadcast and shuffle consume a
//! stream fully at an explicit blocking boundary; nothing here buffers
//! implicitly.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::types::Row;

/// Lazy pull stream of rows. `None` means end of stream.
pub type RowStream = Box<dyn Iterator<Item = Result<Row>> + Send>;

/// Contract for a relation's row source.
pub trait RowSource: Send + Sync {
    /// Open a fresh, restartable handle over the rows.
    fn scan(&self) -> RowStream;

    /// Exact byte size cached from a prior materialization, if known.
    fn known_bytes(&self) -> Option<u64> {
        None
    }

    /// Whether the source terminates. Unbounded sources cannot be fully
    /// sampled and cannot be broadcast or shuffled.
    fn bounded(&self) -> bool {
        true
    }
}

/// A named relation: identifier, schema, and its row source.
#[derive(Clone)]
pub struct Relation {
    pub id: String,
    pub schema: Schema,
    pub source: Arc<dyn RowSource>,
}

impl Relation {
    pub fn new(id: impl Into<String>, schema: Schema, source: Arc<dyn RowSource>) -> Result<Self> {
        schema.validate()?;
        Ok(Self {
            id: id.into(),
            schema,
            source,
        })
    }

    /// Serializable descriptor embedded in plans.
    pub fn desc(&self) -> RelationDesc {
        RelationDesc {
            id: self.id.clone(),
            schema: self.schema.clone(),
        }
    }
}

impl std::fmt::Debug for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relation")
            .field("id", &self.id)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

/// The part of a relation that travels inside a `JoinPlan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationDesc {
    pub id: String,
    pub schema: Schema,
}

/// In-memory row source backed by a shared vector (tests, lookup tables).
pub struct MemSource {
    rows: Arc<Vec<Row>>,
    known_bytes: Option<u64>,
    bounded: bool,
}

impl MemSource {
    /// Build from rows, checking that every row matches the expected arity.
    pub fn new(rows: Vec<Row>, arity: usize) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != arity {
                return Err(Error::Schema(format!(
                    "row {} has arity {}, schema expects {}",
                    i,
                    row.len(),
                    arity
                )));
            }
        }
        Ok(Self {
            rows: Arc::new(rows),
            known_bytes: None,
            bounded: true,
        })
    }

    /// Attach an exact byte size (as if cached from a prior materialization).
    pub fn with_known_bytes(mut self, bytes: u64) -> Self {
        self.known_bytes = Some(bytes);
        self
    }

    /// Mark the source unbounded. Scanning still yields the stored rows;
    /// this only flips the estimator/exchange contract, which is all the
    /// tests need.
    pub fn unbounded(mut self) -> Self {
        self.bounded = false;
        self
    }
}

impl RowSource for MemSource {
    fn scan(&self) -> RowStream {
        let rows = Arc::clone(&self.rows);
        let mut idx = 0usize;
        Box::new(std::iter::from_fn(move || {
            if idx < rows.len() {
                let row = rows[idx].clone();
                idx += 1;
                Some(Ok(row))
            } else {
                None
            }
        }))
    }

    fn known_bytes(&self) -> Option<u64> {
        self.known_bytes
    }

    fn bounded(&self) -> bool {
        self.bounded
    }
}

/// Row source that fails after yielding a prefix; exercises pull-based
/// error propagation in tests.
pub struct FailingSource {
    prefix: Vec<Row>,
    message: String,
}

impl FailingSource {
    pub fn new(prefix: Vec<Row>, message: impl Into<String>) -> Self {
        Self {
            prefix,
            message: message.into(),
        }
    }
}

impl RowSource for FailingSource {
    fn scan(&self) -> RowStream {
        let prefix = self.prefix.clone();
        let message = self.message.clone();
        let mut idx = 0usize;
        Box::new(std::iter::from_fn(move || {
            if idx < prefix.len() {
                let row = prefix[idx].clone();
                idx += 1;
                Some(Ok(row))
            } else if idx == prefix.len() {
                idx += 1;
                Some(Err(Error::Exec(message.clone())))
            } else {
                None
            }
        }))
    }
}
