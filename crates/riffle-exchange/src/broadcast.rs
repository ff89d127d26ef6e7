//! Broadcast replication for the build side of a broadcast-hash join.
//!
//! Materializes the whole relation into an immutable snapshot behind an
//! `Arc`; every consuming unit observes the same complete row set as of the
//! time the broadcast started. Later mutations of the source are invisible.

use std::sync::Arc;

use riffle_core::cancel::CancelToken;
use riffle_core::error::{Error, Result};
use riffle_core::relation::Relation;
use riffle_core::types::{approx_row_width, Row};

/// The replicated handle: a complete, immutable copy of a relation's rows,
/// shared read-only by every consuming unit (clone is an `Arc` bump).
#[derive(Debug, Clone)]
pub struct BroadcastSnapshot {
    rows: Arc<Vec<Row>>,
    bytes: u64,
    relation_id: String,
}

impl BroadcastSnapshot {
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Realized byte size of the snapshot.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn relation_id(&self) -> &str {
        &self.relation_id
    }
}

/// Materialize `relation` into a broadcast snapshot, failing with
/// `RelationTooLarge` the moment the realized size crosses `cap_bytes`.
///
/// The cap is a safety valve against planner misestimation; the caller
/// (executor) treats this failure as retryable-as-sort-merge, not fatal.
/// Blocking boundary: returns only once the relation is fully consumed.
pub fn broadcast(
    relation: &Relation,
    cap_bytes: u64,
    cancel: &CancelToken,
) -> Result<BroadcastSnapshot> {
    if !relation.source.bounded() {
        return Err(Error::Exec(format!(
            "cannot broadcast unbounded relation '{}'",
            relation.id
        )));
    }

    let mut rows = Vec::new();
    let mut bytes = 0u64;
    for row in relation.source.scan() {
        cancel.check()?;
        let row = row?;
        bytes += approx_row_width(&row);
        if bytes > cap_bytes {
            // No point finishing the scan once the cap is crossed.
            return Err(Error::RelationTooLarge {
                bytes,
                cap: cap_bytes,
            });
        }
        rows.push(row);
    }

    tracing::debug!(
        relation = %relation.id,
        rows = rows.len(),
        bytes = bytes,
        "broadcast snapshot materialized"
    );

    Ok(BroadcastSnapshot {
        rows: Arc::new(rows),
        bytes,
        relation_id: relation.id.clone(),
    })
}
