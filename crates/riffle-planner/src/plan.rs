//! The join plan: strategy, broadcast side, key, inputs, and the estimates
//! that drove the decision.
//!
//! Created once by the planner, immutable afterwards, consumed by both the
//! executor (to run) and the explainer (to describe).

use serde::{Deserialize, Serialize};

use riffle_core::config::JoinSide;
use riffle_core::error::{Error, Result};
use riffle_core::hash::{hash_serde, Hash256};
use riffle_core::relation::RelationDesc;
use riffle_core::schema::Schema;

use crate::estimate::SizeEstimate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinStrategy {
    BroadcastHashJoin,
    SortMergeJoin,
}

impl std::fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinStrategy::BroadcastHashJoin => write!(f, "BroadcastHashJoin"),
            JoinStrategy::SortMergeJoin => write!(f, "SortMergeJoin"),
        }
    }
}

/// Ordered equality predicate columns: (left column, right column) pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinKey(pub Vec<(String, String)>);

impl JoinKey {
    pub fn on(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(l, r)| (l.to_string(), r.to_string()))
                .collect(),
        )
    }

    /// Resolve the key to column indices, checking existence and type
    /// comparability on both sides. This is the cheap pre-flight validation
    /// that runs before any estimation work.
    pub fn resolve(&self, left: &Schema, right: &Schema) -> Result<(Vec<usize>, Vec<usize>)> {
        if self.0.is_empty() {
            return Err(Error::InvalidJoinKey("join key is empty".into()));
        }
        let mut left_idx = Vec::with_capacity(self.0.len());
        let mut right_idx = Vec::with_capacity(self.0.len());
        for (l, r) in &self.0 {
            let li = left
                .index_of(l)
                .ok_or_else(|| Error::InvalidJoinKey(format!("left column '{}' not found", l)))?;
            let ri = right
                .index_of(r)
                .ok_or_else(|| Error::InvalidJoinKey(format!("right column '{}' not found", r)))?;
            let lt = left.fields[li].data_type;
            let rt = right.fields[ri].data_type;
            if !lt.comparable_with(&rt) {
                return Err(Error::InvalidJoinKey(format!(
                    "columns '{}' ({:?}) and '{}' ({:?}) are not comparable",
                    l, lt, r, rt
                )));
            }
            left_idx.push(li);
            right_idx.push(ri);
        }
        Ok((left_idx, right_idx))
    }
}

/// Immutable output of planning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinPlan {
    pub strategy: JoinStrategy,
    /// Which side is replicated; `None` for sort-merge.
    pub broadcast_side: Option<JoinSide>,
    pub key: JoinKey,
    pub left: RelationDesc,
    pub right: RelationDesc,
    /// Estimates recorded for explainability; absent when estimation was
    /// unavailable for a side.
    pub left_estimate: Option<SizeEstimate>,
    pub right_estimate: Option<SizeEstimate>,
}

impl JoinPlan {
    /// Stable fingerprint over the serialized plan; identical plans hash
    /// identically.
    pub fn fingerprint(&self) -> Result<Hash256> {
        hash_serde(self)
    }

    /// Schema of the joined output (left fields then right fields).
    pub fn output_schema(&self) -> Schema {
        self.left.schema.joined_with(&self.right.schema)
    }

    /// The sort-merge plan this plan degrades to when a broadcast overruns
    /// the safety cap. Estimates are kept for explainability.
    pub fn downgraded_to_sort_merge(&self) -> JoinPlan {
        JoinPlan {
            strategy: JoinStrategy::SortMergeJoin,
            broadcast_side: None,
            ..self.clone()
        }
    }
}
