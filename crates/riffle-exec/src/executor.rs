//! The join executor: state machine around a `JoinPlan`.
//!
//! `Planned -> Running -> {Completed, Failed}`. Re-running `execute` on the
//! same inputs re-executes the underlying reads (streams are not
//! restartable) and yields the same output multiset.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use riffle_core::cancel::CancelToken;
use riffle_core::cluster::ClusterInfo;
use riffle_core::config::{JoinConfig, JoinSide};
use riffle_core::error::{Error, Result};
use riffle_core::relation::Relation;
use riffle_core::types::Row;
use riffle_exchange::{broadcast, check_skew, partition};
use riffle_planner::plan::{JoinPlan, JoinStrategy};

use crate::hash_join::{build_index, HashJoinStream};
use crate::merge_join::{sort_by_key, MergeJoinStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecState {
    Planned,
    Running,
    Completed,
    Failed,
}

enum StreamImpl {
    Hash(HashJoinStream),
    Merge(MergeJoinStream),
}

/// Lazy, finite stream of joined rows. Not restartable: collect it again by
/// calling `execute` again.
pub struct JoinStream {
    inner: StreamImpl,
    state: Arc<Mutex<ExecState>>,
}

impl Iterator for JoinStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = match &mut self.inner {
            StreamImpl::Hash(s) => s.next(),
            StreamImpl::Merge(s) => s.next(),
        };
        match &item {
            Some(Err(_)) => set_state(&self.state, ExecState::Failed),
            None => {
                let mut st = self.state.lock().unwrap();
                if *st == ExecState::Running {
                    *st = ExecState::Completed;
                }
            }
            Some(Ok(_)) => {}
        }
        item
    }
}

fn set_state(state: &Arc<Mutex<ExecState>>, to: ExecState) {
    *state.lock().unwrap() = to;
}

pub struct JoinExecutor {
    config: JoinConfig,
    cluster: Arc<dyn ClusterInfo>,
    cancel: CancelToken,
    state: Arc<Mutex<ExecState>>,
    final_plan: Option<JoinPlan>,
}

impl JoinExecutor {
    pub fn new(config: JoinConfig, cluster: Arc<dyn ClusterInfo>) -> Self {
        Self {
            config,
            cluster,
            cancel: CancelToken::new(),
            state: Arc::new(Mutex::new(ExecState::Planned)),
            final_plan: None,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> ExecState {
        *self.state.lock().unwrap()
    }

    /// The plan that actually ran, reflecting a broadcast-to-sort-merge
    /// downgrade if one happened. Explain this, not the plan you passed in.
    pub fn final_plan(&self) -> Option<&JoinPlan> {
        self.final_plan.as_ref()
    }

    /// Run `plan` against the two relations and return the joined row
    /// stream. Blocking phases (broadcast, index build, shuffle, sort)
    /// happen here; emission is lazy.
    pub fn execute(
        &mut self,
        plan: &JoinPlan,
        left: &Relation,
        right: &Relation,
    ) -> Result<JoinStream> {
        self.config.validate()?;
        if plan.left.id != left.id || plan.right.id != right.id {
            return Err(Error::Exec(format!(
                "plan was built for ({}, {}), got ({}, {})",
                plan.left.id, plan.right.id, left.id, right.id
            )));
        }
        let (l_idx, r_idx) = plan.key.resolve(&left.schema, &right.schema)?;

        set_state(&self.state, ExecState::Planned);
        self.final_plan = Some(plan.clone());

        match self.run(plan, left, right, &l_idx, &r_idx) {
            Ok(inner) => {
                set_state(&self.state, ExecState::Running);
                Ok(JoinStream {
                    inner,
                    state: Arc::clone(&self.state),
                })
            }
            Err(e) => {
                set_state(&self.state, ExecState::Failed);
                Err(e)
            }
        }
    }

    fn run(
        &mut self,
        plan: &JoinPlan,
        left: &Relation,
        right: &Relation,
        l_idx: &[usize],
        r_idx: &[usize],
    ) -> Result<StreamImpl> {
        match plan.strategy {
            JoinStrategy::BroadcastHashJoin => {
                let side = plan
                    .broadcast_side
                    .ok_or_else(|| Error::Exec("broadcast plan has no broadcast side".into()))?;
                match self.run_broadcast(side, left, right, l_idx, r_idx) {
                    Ok(stream) => Ok(StreamImpl::Hash(stream)),
                    Err(Error::RelationTooLarge { bytes, cap }) => {
                        // Planner misestimation: downgrade once and restart
                        // from Planned. Sort-merge never broadcasts, so a
                        // second occurrence cannot happen.
                        tracing::warn!(
                            bytes = bytes,
                            cap = cap,
                            "broadcast overran safety cap, falling back to sort-merge"
                        );
                        let downgraded = plan.downgraded_to_sort_merge();
                        self.final_plan = Some(downgraded);
                        set_state(&self.state, ExecState::Planned);
                        self.run_sort_merge(left, right, l_idx, r_idx)
                            .map(StreamImpl::Merge)
                    }
                    Err(e) => Err(e),
                }
            }
            JoinStrategy::SortMergeJoin => self
                .run_sort_merge(left, right, l_idx, r_idx)
                .map(StreamImpl::Merge),
        }
    }

    fn run_broadcast(
        &self,
        side: JoinSide,
        left: &Relation,
        right: &Relation,
        l_idx: &[usize],
        r_idx: &[usize],
    ) -> Result<HashJoinStream> {
        let (build, probe, build_idx, probe_idx) = match side {
            JoinSide::Left => (left, right, l_idx, r_idx),
            JoinSide::Right => (right, left, r_idx, l_idx),
        };
        let snapshot = broadcast(build, self.config.broadcast_cap_bytes, &self.cancel)?;
        let index = build_index(&snapshot, build_idx, &self.cancel)?;
        Ok(HashJoinStream::new(
            index,
            probe.source.scan(),
            probe_idx.to_vec(),
            side,
            self.cancel.clone(),
        ))
    }

    fn run_sort_merge(
        &self,
        left: &Relation,
        right: &Relation,
        l_idx: &[usize],
        r_idx: &[usize],
    ) -> Result<MergeJoinStream> {
        for rel in [left, right] {
            if !rel.source.bounded() {
                return Err(Error::Exec(format!(
                    "cannot shuffle unbounded relation '{}'",
                    rel.id
                )));
            }
        }

        let parts = self
            .config
            .partition_count
            .unwrap_or_else(|| self.cluster.unit_count())
            .max(1);

        let left_parts = partition(left.source.scan(), l_idx, parts, &self.cancel)?;
        let right_parts = partition(right.source.scan(), r_idx, parts, &self.cancel)?;
        check_skew(&left_parts, self.config.skew_factor);
        check_skew(&right_parts, self.config.skew_factor);

        let mut pairs: Vec<(Vec<Row>, Vec<Row>)> = left_parts
            .into_iter()
            .zip(right_parts)
            .map(|(l, r)| (l.rows, r.rows))
            .collect();

        self.cancel.check()?;
        sort_partitions(&mut pairs, l_idx, r_idx, self.config.max_parallel_tasks);
        self.cancel.check()?;

        Ok(MergeJoinStream::new(
            VecDeque::from(pairs),
            l_idx.to_vec(),
            r_idx.to_vec(),
            self.cancel.clone(),
        ))
    }
}

/// Sort each partition pair by its join key. Partitions are independent, so
/// they sort on scoped worker threads bounded by `workers`.
fn sort_partitions(pairs: &mut [(Vec<Row>, Vec<Row>)], l_idx: &[usize], r_idx: &[usize], workers: usize) {
    if workers <= 1 || pairs.len() <= 1 {
        for (l, r) in pairs.iter_mut() {
            sort_by_key(l, l_idx);
            sort_by_key(r, r_idx);
        }
        return;
    }
    let chunk = pairs.len().div_ceil(workers);
    std::thread::scope(|s| {
        for slice in pairs.chunks_mut(chunk) {
            s.spawn(move || {
                for (l, r) in slice.iter_mut() {
                    sort_by_key(l, l_idx);
                    sort_by_key(r, r_idx);
                }
            });
        }
    });
}
