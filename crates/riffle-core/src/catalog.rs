//! Optional statistics catalog contract.
//!
//! When present, the catalog can short-circuit size estimation with exact
//! byte sizes or supply row counts for sampled approximation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stored statistics for one relation. Either field may be unknown.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TableStats {
    pub row_count: Option<u64>,
    pub byte_size: Option<u64>,
}

pub trait StatsCatalog: Send + Sync {
    fn stats_for(&self, relation_id: &str) -> Option<TableStats>;
}

/// Map-backed catalog (tests and embedded use).
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    stats: HashMap<String, TableStats>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, relation_id: impl Into<String>, stats: TableStats) {
        self.stats.insert(relation_id.into(), stats);
    }
}

impl StatsCatalog for MemoryCatalog {
    fn stats_for(&self, relation_id: &str) -> Option<TableStats> {
        self.stats.get(relation_id).copied()
    }
}
