//! Threshold-driven join-strategy selection.
//!
//! Auto mode: broadcast the smaller side when its estimate is at or below
//! the configured threshold; otherwise shuffle both sides for a sort-merge
//! join. Explicit mode: the caller names the broadcast side and the planner
//! obliges without an estimation-based veto.

use std::sync::Arc;

use riffle_core::catalog::StatsCatalog;
use riffle_core::config::{JoinConfig, JoinSide};
use riffle_core::error::{Error, Result};
use riffle_core::relation::Relation;

use crate::estimate::{SizeEstimate, SizeEstimator};
use crate::plan::{JoinKey, JoinPlan, JoinStrategy};

pub struct StrategyPlanner {
    config: JoinConfig,
    estimator: SizeEstimator,
}

impl StrategyPlanner {
    pub fn new(config: JoinConfig) -> Self {
        let estimator = SizeEstimator::new(config.sample_rows);
        Self { config, estimator }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn StatsCatalog>) -> Self {
        self.estimator = SizeEstimator::new(self.config.sample_rows).with_catalog(catalog);
        self
    }

    /// Produce a `JoinPlan` for an equality join of `left` and `right`.
    ///
    /// Key validation runs first; `InvalidJoinKey` surfaces here, before any
    /// estimation work.
    pub fn plan(&self, left: &Relation, right: &Relation, key: &JoinKey) -> Result<JoinPlan> {
        self.config.validate()?;
        key.resolve(&left.schema, &right.schema)?;

        if let Some(side) = self.config.explicit_broadcast {
            return self.plan_explicit(left, right, key, side);
        }
        self.plan_auto(left, right, key)
    }

    /// Explicit mode: forced broadcast side, estimation only best-effort
    /// for explainability. Never fails due to `EstimationUnavailable`.
    fn plan_explicit(
        &self,
        left: &Relation,
        right: &Relation,
        key: &JoinKey,
        side: JoinSide,
    ) -> Result<JoinPlan> {
        let left_estimate = self.estimator.estimate(left).ok();
        let right_estimate = self.estimator.estimate(right).ok();

        tracing::debug!(side = %side, "explicit broadcast join requested");

        Ok(JoinPlan {
            strategy: JoinStrategy::BroadcastHashJoin,
            broadcast_side: Some(side),
            key: key.clone(),
            left: left.desc(),
            right: right.desc(),
            left_estimate,
            right_estimate,
        })
    }

    fn plan_auto(&self, left: &Relation, right: &Relation, key: &JoinKey) -> Result<JoinPlan> {
        let left_estimate = self.estimate_or_unknown(left)?;
        let right_estimate = self.estimate_or_unknown(right)?;

        let broadcast_side = self.pick_broadcast_side(&left_estimate, &right_estimate);
        let strategy = match broadcast_side {
            Some(_) => JoinStrategy::BroadcastHashJoin,
            None => JoinStrategy::SortMergeJoin,
        };

        tracing::debug!(
            strategy = %strategy,
            left = ?left_estimate.as_ref().map(|e| e.bytes),
            right = ?right_estimate.as_ref().map(|e| e.bytes),
            threshold = self.config.threshold_bytes,
            "join strategy selected"
        );

        Ok(JoinPlan {
            strategy,
            broadcast_side,
            key: key.clone(),
            left: left.desc(),
            right: right.desc(),
            left_estimate,
            right_estimate,
        })
    }

    /// `EstimationUnavailable` degrades to "unknown" (with a warning) in
    /// auto mode; any other estimation failure propagates.
    fn estimate_or_unknown(&self, relation: &Relation) -> Result<Option<SizeEstimate>> {
        match self.estimator.estimate(relation) {
            Ok(est) => Ok(Some(est)),
            Err(Error::EstimationUnavailable(msg)) => {
                tracing::warn!(relation = %relation.id, %msg, "size unknown, side not broadcastable");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Threshold policy. A side qualifies only when its size is known; the
    /// smaller qualifying side wins, exact ties go to the left. Threshold 0
    /// disables auto-broadcast entirely.
    fn pick_broadcast_side(
        &self,
        left: &Option<SizeEstimate>,
        right: &Option<SizeEstimate>,
    ) -> Option<JoinSide> {
        if self.config.threshold_bytes == 0 {
            return None;
        }
        let candidate = match (left, right) {
            (Some(l), Some(r)) => {
                if l.bytes <= r.bytes {
                    Some((JoinSide::Left, l.bytes))
                } else {
                    Some((JoinSide::Right, r.bytes))
                }
            }
            (Some(l), None) => Some((JoinSide::Left, l.bytes)),
            (None, Some(r)) => Some((JoinSide::Right, r.bytes)),
            (None, None) => None,
        };
        match candidate {
            Some((side, bytes)) if bytes <= self.config.threshold_bytes => Some(side),
            _ => None,
        }
    }
}
