//! Join configuration that callers pass explicitly into plan/execute.
//!
//! No ambient global state: the threshold, partition count, and broadcast
//! cap always travel with the call.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which input of a join a setting refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinSide {
    Left,
    Right,
}

impl JoinSide {
    pub fn other(self) -> JoinSide {
        match self {
            JoinSide::Left => JoinSide::Right,
            JoinSide::Right => JoinSide::Left,
        }
    }
}

impl std::fmt::Display for JoinSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinSide::Left => write!(f, "left"),
            JoinSide::Right => write!(f, "right"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinConfig {
    /// Auto-broadcast threshold in bytes. A relation estimated at or below
    /// this size is broadcast. `0` disables auto-broadcast entirely.
    pub threshold_bytes: u64,

    /// Hard ceiling on realized broadcast size; a safety valve against
    /// planner misestimation, distinct from (and above) the threshold.
    pub broadcast_cap_bytes: u64,

    /// Shuffle partition count. Defaults to the cluster's unit count.
    pub partition_count: Option<usize>,

    /// Forced broadcast side (explicit mode). Bypasses estimation and the
    /// threshold comparison.
    pub explicit_broadcast: Option<JoinSide>,

    /// Estimator sampling depth (rows).
    pub sample_rows: usize,

    /// Per-partition sort/merge parallelism.
    pub max_parallel_tasks: usize,

    /// A partition holding more than `skew_factor` times the mean row count
    /// is reported as skewed (logged, never fatal).
    pub skew_factor: f64,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            threshold_bytes: 10 * 1024 * 1024, // 10 MiB default
            broadcast_cap_bytes: 256 * 1024 * 1024,
            partition_count: None,
            explicit_broadcast: None,
            sample_rows: 1024,
            max_parallel_tasks: 4,
            skew_factor: 4.0,
        }
    }
}

impl JoinConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `RIFFLE_THRESHOLD_BYTES`: auto-broadcast threshold in bytes
    /// - `RIFFLE_BROADCAST_CAP_BYTES`: broadcast hard cap in bytes
    /// - `RIFFLE_PARTITION_COUNT`: shuffle partition count
    /// - `RIFFLE_SAMPLE_ROWS`: estimator sampling depth
    /// - `RIFFLE_MAX_PARALLEL_TASKS`: partition parallelism
    /// - `RIFFLE_SKEW_FACTOR`: partition skew warning ratio
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("RIFFLE_THRESHOLD_BYTES") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.threshold_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("RIFFLE_BROADCAST_CAP_BYTES") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.broadcast_cap_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("RIFFLE_PARTITION_COUNT") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.partition_count = Some(v);
            }
        }

        if let Ok(s) = std::env::var("RIFFLE_SAMPLE_ROWS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.sample_rows = v;
            }
        }

        if let Ok(s) = std::env::var("RIFFLE_MAX_PARALLEL_TASKS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_parallel_tasks = v;
            }
        }

        if let Ok(s) = std::env::var("RIFFLE_SKEW_FACTOR") {
            if let Ok(v) = s.parse::<f64>() {
                cfg.skew_factor = v;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<()> {
        if self.threshold_bytes > 0 && self.broadcast_cap_bytes <= self.threshold_bytes {
            return Err(Error::Config(format!(
                "broadcast_cap_bytes ({}) must exceed threshold_bytes ({})",
                self.broadcast_cap_bytes, self.threshold_bytes
            )));
        }
        if let Some(0) = self.partition_count {
            return Err(Error::Config("partition_count must be nonzero".into()));
        }
        if self.max_parallel_tasks == 0 {
            return Err(Error::Config("max_parallel_tasks must be nonzero".into()));
        }
        if self.skew_factor < 1.0 {
            return Err(Error::Config("skew_factor must be at least 1.0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(JoinConfig::default().validate().is_ok());
    }

    #[test]
    fn cap_must_exceed_threshold() {
        let cfg = JoinConfig {
            threshold_bytes: 100,
            broadcast_cap_bytes: 100,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn from_env_reads_overrides_and_ignores_malformed_values() {
        // One test owns all RIFFLE_* variables so parallel test threads
        // never observe each other's environment edits.
        std::env::set_var("RIFFLE_THRESHOLD_BYTES", "2048");
        std::env::set_var("RIFFLE_BROADCAST_CAP_BYTES", "65536");
        std::env::set_var("RIFFLE_PARTITION_COUNT", "8");
        std::env::set_var("RIFFLE_MAX_PARALLEL_TASKS", "2");
        std::env::set_var("RIFFLE_SKEW_FACTOR", "2.5");
        std::env::set_var("RIFFLE_SAMPLE_ROWS", "not-a-number");

        let cfg = JoinConfig::from_env();
        assert_eq!(cfg.threshold_bytes, 2048);
        assert_eq!(cfg.broadcast_cap_bytes, 65536);
        assert_eq!(cfg.partition_count, Some(8));
        assert_eq!(cfg.max_parallel_tasks, 2);
        assert_eq!(cfg.skew_factor, 2.5);
        // Malformed values fall back to the default.
        assert_eq!(cfg.sample_rows, JoinConfig::default().sample_rows);
        assert!(cfg.validate().is_ok());

        for key in [
            "RIFFLE_THRESHOLD_BYTES",
            "RIFFLE_BROADCAST_CAP_BYTES",
            "RIFFLE_PARTITION_COUNT",
            "RIFFLE_MAX_PARALLEL_TASKS",
            "RIFFLE_SKEW_FACTOR",
            "RIFFLE_SAMPLE_ROWS",
        ] {
            std::env::remove_var(key);
        }
        let cfg = JoinConfig::from_env();
        assert_eq!(cfg.threshold_bytes, JoinConfig::default().threshold_bytes);
        assert_eq!(cfg.partition_count, None);
    }

    #[test]
    fn zero_threshold_skips_cap_check() {
        // Threshold 0 disables auto-broadcast, so any cap is acceptable.
        let cfg = JoinConfig {
            threshold_bytes: 0,
            broadcast_cap_bytes: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }
}
