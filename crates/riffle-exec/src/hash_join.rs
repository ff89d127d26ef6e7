//! Broadcast-hash join: blocking index build over the broadcast snapshot,
//! then streaming probe of the other side.
//!
//! Output rows are always left columns followed by right columns, whichever
//! side was broadcast. Emission order follows the probe side's input order.
//! Rows with Null key values are never indexed and never match (inner-join
//! semantics).

use std::collections::{HashMap, VecDeque};

use riffle_core::cancel::CancelToken;
use riffle_core::config::JoinSide;
use riffle_core::error::Result;
use riffle_core::relation::RowStream;
use riffle_core::types::{encode_key, Row};
use riffle_exchange::broadcast::BroadcastSnapshot;

/// In-memory hash index over the build side, keyed by the canonical key
/// encoding. Built locally at every consuming unit; here that is one build
/// per execution since units share the process.
pub type HashIndex = HashMap<Vec<u8>, Vec<Row>>;

/// Build the probe index. Blocking prefix: completes before any probe row
/// is read.
pub fn build_index(
    snapshot: &BroadcastSnapshot,
    key_idx: &[usize],
    cancel: &CancelToken,
) -> Result<HashIndex> {
    let mut index: HashIndex = HashMap::new();
    for row in snapshot.rows() {
        cancel.check()?;
        if let Some(key) = encode_key(row, key_idx) {
            index.entry(key).or_default().push(row.clone());
        }
    }
    tracing::debug!(
        relation = snapshot.relation_id(),
        keys = index.len(),
        "hash index built"
    );
    Ok(index)
}

/// Lazy probe stream: pulls the probe side row-by-row, looks up the index,
/// and emits the matches. No further coordination after the build.
pub struct HashJoinStream {
    index: HashIndex,
    probe: RowStream,
    probe_key_idx: Vec<usize>,
    /// Which side of the join was broadcast (the index side).
    build_side: JoinSide,
    pending: VecDeque<Row>,
    cancel: CancelToken,
    failed: bool,
}

impl HashJoinStream {
    pub fn new(
        index: HashIndex,
        probe: RowStream,
        probe_key_idx: Vec<usize>,
        build_side: JoinSide,
        cancel: CancelToken,
    ) -> Self {
        Self {
            index,
            probe,
            probe_key_idx,
            build_side,
            pending: VecDeque::new(),
            cancel,
            failed: false,
        }
    }

    fn joined(&self, probe_row: &Row, build_row: &Row) -> Row {
        // Output schema is left-then-right regardless of the build side.
        match self.build_side {
            JoinSide::Left => {
                let mut out = build_row.clone();
                out.extend(probe_row.iter().cloned());
                out
            }
            JoinSide::Right => {
                let mut out = probe_row.clone();
                out.extend(build_row.iter().cloned());
                out
            }
        }
    }
}

impl Iterator for HashJoinStream {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            if let Err(e) = self.cancel.check() {
                self.failed = true;
                return Some(Err(e));
            }
            let probe_row = match self.probe.next()? {
                Ok(row) => row,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            };
            let Some(key) = encode_key(&probe_row, &self.probe_key_idx) else {
                continue; // null key matches nothing
            };
            if let Some(matches) = self.index.get(&key) {
                for build_row in matches {
                    self.pending.push_back(self.joined(&probe_row, build_row));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riffle_core::types::Scalar;

    fn index_of(rows: Vec<Row>, key_idx: &[usize]) -> HashIndex {
        let mut index = HashIndex::new();
        for row in rows {
            if let Some(key) = encode_key(&row, key_idx) {
                index.entry(key).or_default().push(row);
            }
        }
        index
    }

    fn stream_of(rows: Vec<Row>) -> RowStream {
        Box::new(rows.into_iter().map(Ok))
    }

    #[test]
    fn probe_order_is_preserved() {
        let build = index_of(
            vec![
                vec![Scalar::I64(1), Scalar::Str("x".into())],
                vec![Scalar::I64(2), Scalar::Str("y".into())],
            ],
            &[0],
        );
        let probe = vec![
            vec![Scalar::I64(2), Scalar::Str("b".into())],
            vec![Scalar::I64(1), Scalar::Str("a".into())],
            vec![Scalar::I64(3), Scalar::Str("c".into())],
        ];
        let out: Vec<Row> = HashJoinStream::new(
            build,
            stream_of(probe),
            vec![0],
            JoinSide::Right,
            CancelToken::new(),
        )
        .map(|r| r.unwrap())
        .collect();
        assert_eq!(out.len(), 2);
        // Probe side is the left relation here; its order drives emission.
        assert_eq!(out[0][0], Scalar::I64(2));
        assert_eq!(out[1][0], Scalar::I64(1));
        assert_eq!(out[0].len(), 4);
    }

    #[test]
    fn left_build_still_emits_left_columns_first() {
        let build = index_of(vec![vec![Scalar::I64(1), Scalar::Str("left".into())]], &[0]);
        let probe = vec![vec![Scalar::I64(1), Scalar::Str("right".into())]];
        let out: Vec<Row> = HashJoinStream::new(
            build,
            stream_of(probe),
            vec![0],
            JoinSide::Left,
            CancelToken::new(),
        )
        .map(|r| r.unwrap())
        .collect();
        assert_eq!(out[0][1], Scalar::Str("left".into()));
        assert_eq!(out[0][3], Scalar::Str("right".into()));
    }

    #[test]
    fn null_probe_keys_match_nothing() {
        let build = index_of(vec![vec![Scalar::Null]], &[0]);
        let probe = vec![vec![Scalar::Null]];
        let out: Vec<_> = HashJoinStream::new(
            build,
            stream_of(probe),
            vec![0],
            JoinSide::Right,
            CancelToken::new(),
        )
        .collect();
        assert!(out.is_empty());
    }
}
