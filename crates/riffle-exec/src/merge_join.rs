//! Sort-merge join: per-partition sort then merge-walk.
//!
//! Both inputs arrive already hash-partitioned with the same partition
//! count, so equal keys are colocated. Within a partition the walk advances
//! whichever side holds the smaller key; on equality it emits the cross
//! product of the equal-key runs and advances both past them. Runs whose
//! key contains a Null never match (keeping the output multiset identical
//! to the hash strategy's).
//!
//! Emission is key-ordered within a partition; there is no ordering
//! guarantee across partitions.

use std::cmp::Ordering;
use std::collections::VecDeque;

use riffle_core::cancel::CancelToken;
use riffle_core::error::Result;
use riffle_core::types::{key_cmp, key_has_null, Row};

/// Sort rows in place by their join-key tuple.
pub fn sort_by_key(rows: &mut [Row], key_idx: &[usize]) {
    rows.sort_by(|a, b| key_cmp(a, key_idx, b, key_idx));
}

/// Merge cursor over one partition's sorted halves.
struct MergeCursor {
    left: Vec<Row>,
    right: Vec<Row>,
    l_idx: Vec<usize>,
    r_idx: Vec<usize>,
    li: usize,
    ri: usize,
    pending: VecDeque<Row>,
}

impl MergeCursor {
    fn new(left: Vec<Row>, right: Vec<Row>, l_idx: Vec<usize>, r_idx: Vec<usize>) -> Self {
        Self {
            left,
            right,
            l_idx,
            r_idx,
            li: 0,
            ri: 0,
            pending: VecDeque::new(),
        }
    }

    fn next_row(&mut self) -> Option<Row> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(row);
            }
            if self.li >= self.left.len() || self.ri >= self.right.len() {
                return None;
            }
            let cmp = key_cmp(
                &self.left[self.li],
                &self.l_idx,
                &self.right[self.ri],
                &self.r_idx,
            );
            match cmp {
                Ordering::Less => self.li += 1,
                Ordering::Greater => self.ri += 1,
                Ordering::Equal => {
                    // Bound the equal-key runs on both sides.
                    let ls = self.li;
                    let rs = self.ri;
                    let mut le = ls + 1;
                    while le < self.left.len()
                        && key_cmp(&self.left[le], &self.l_idx, &self.left[ls], &self.l_idx)
                            == Ordering::Equal
                    {
                        le += 1;
                    }
                    let mut re = rs + 1;
                    while re < self.right.len()
                        && key_cmp(&self.right[re], &self.r_idx, &self.right[rs], &self.r_idx)
                            == Ordering::Equal
                    {
                        re += 1;
                    }
                    // Null keys compare equal to each other but match nothing.
                    if !key_has_null(&self.left[ls], &self.l_idx) {
                        for l in ls..le {
                            for r in rs..re {
                                let mut out = self.left[l].clone();
                                out.extend(self.right[r].iter().cloned());
                                self.pending.push_back(out);
                            }
                        }
                    }
                    self.li = le;
                    self.ri = re;
                }
            }
        }
    }
}

/// Lazy stream over the merged output of all partitions, in partition-index
/// order. Inputs must be sorted; partition pairs are consumed one at a time.
pub struct MergeJoinStream {
    partitions: VecDeque<(Vec<Row>, Vec<Row>)>,
    current: Option<MergeCursor>,
    l_idx: Vec<usize>,
    r_idx: Vec<usize>,
    cancel: CancelToken,
    failed: bool,
}

impl MergeJoinStream {
    pub fn new(
        partitions: VecDeque<(Vec<Row>, Vec<Row>)>,
        l_idx: Vec<usize>,
        r_idx: Vec<usize>,
        cancel: CancelToken,
    ) -> Self {
        Self {
            partitions,
            current: None,
            l_idx,
            r_idx,
            cancel,
            failed: false,
        }
    }
}

impl Iterator for MergeJoinStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Err(e) = self.cancel.check() {
                self.failed = true;
                // Drop partition buffers before surfacing the cancellation.
                self.partitions.clear();
                self.current = None;
                return Some(Err(e));
            }
            if let Some(cursor) = self.current.as_mut() {
                if let Some(row) = cursor.next_row() {
                    return Some(Ok(row));
                }
                self.current = None;
            }
            let (left, right) = self.partitions.pop_front()?;
            self.current = Some(MergeCursor::new(
                left,
                right,
                self.l_idx.clone(),
                self.r_idx.clone(),
            ));
        }
    }
}
