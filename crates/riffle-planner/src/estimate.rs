//! Relation size estimation.
//!
//! Resolution order: exact bytes cached on the source, exact bytes from the
//! statistics catalog, then sampled approximation (row count × average row
//! width). A source that is unbounded and has no statistics cannot be
//! estimated; callers must treat that as "unknown", never as zero.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use riffle_core::catalog::StatsCatalog;
use riffle_core::error::{Error, Result};
use riffle_core::relation::Relation;
use riffle_core::types::approx_row_width;

/// Confidence tag on an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateSource {
    Exact,
    Approx,
}

impl std::fmt::Display for EstimateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EstimateSource::Exact => write!(f, "exact"),
            EstimateSource::Approx => write!(f, "approx"),
        }
    }
}

/// Byte-size estimate for one relation. Immutable once attached to a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeEstimate {
    pub relation: String,
    pub bytes: u64,
    pub source: EstimateSource,
}

/// Produces `SizeEstimate`s, optionally consulting a statistics catalog.
pub struct SizeEstimator {
    catalog: Option<Arc<dyn StatsCatalog>>,
    sample_rows: usize,
}

impl SizeEstimator {
    pub fn new(sample_rows: usize) -> Self {
        Self {
            catalog: None,
            sample_rows: sample_rows.max(1),
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn StatsCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn estimate(&self, relation: &Relation) -> Result<SizeEstimate> {
        if let Some(bytes) = relation.source.known_bytes() {
            return Ok(SizeEstimate {
                relation: relation.id.clone(),
                bytes,
                source: EstimateSource::Exact,
            });
        }

        let stats = self
            .catalog
            .as_ref()
            .and_then(|c| c.stats_for(&relation.id));

        if let Some(bytes) = stats.and_then(|s| s.byte_size) {
            return Ok(SizeEstimate {
                relation: relation.id.clone(),
                bytes,
                source: EstimateSource::Exact,
            });
        }

        let catalog_rows = stats.and_then(|s| s.row_count);

        if !relation.source.bounded() && catalog_rows.is_none() {
            return Err(Error::EstimationUnavailable(format!(
                "relation '{}' is unbounded and has no statistics",
                relation.id
            )));
        }

        // Sample a prefix; sampling may block on the underlying reads.
        let mut stream = relation.source.scan();
        let mut sampled_rows = 0u64;
        let mut sampled_bytes = 0u64;
        let mut exhausted = false;
        while sampled_rows < self.sample_rows as u64 {
            match stream.next() {
                Some(row) => {
                    sampled_bytes += approx_row_width(&row?);
                    sampled_rows += 1;
                }
                None => {
                    exhausted = true;
                    break;
                }
            }
        }

        let bytes = if exhausted {
            sampled_bytes
        } else if let Some(total_rows) = catalog_rows {
            let avg = if sampled_rows > 0 {
                sampled_bytes as f64 / sampled_rows as f64
            } else {
                0.0
            };
            (avg * total_rows as f64) as u64
        } else {
            // Bounded but deeper than the sample and no row count on file:
            // finish the scan, accumulating widths.
            let mut total = sampled_bytes;
            for row in stream {
                total += approx_row_width(&row?);
            }
            total
        };

        tracing::debug!(
            relation = %relation.id,
            bytes = bytes,
            sampled = sampled_rows,
            "size estimated by sampling"
        );

        Ok(SizeEstimate {
            relation: relation.id.clone(),
            bytes,
            source: EstimateSource::Approx,
        })
    }
}
