//! Cluster membership contract.
//!
//! The engine only needs the current execution-unit count, for partition
//! sizing. Real deployments back this with a membership service.

/// Provider of the current execution-unit count.
pub trait ClusterInfo: Send + Sync {
    fn unit_count(&self) -> usize;
}

/// Fixed-size cluster (tests and single-process deployments).
#[derive(Debug, Clone, Copy)]
pub struct FixedCluster {
    units: usize,
}

impl FixedCluster {
    pub fn new(units: usize) -> Self {
        Self {
            units: units.max(1),
        }
    }
}

impl ClusterInfo for FixedCluster {
    fn unit_count(&self) -> usize {
        self.units
    }
}
