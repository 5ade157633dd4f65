//! Node-count termination.

use super::Termination;
use crate::stats::SolveStats;

/// Terminates after a number of branching decisions.
#[derive(Debug, Clone)]
pub struct NodeCountTermination {
    limit: u64,
}

impl NodeCountTermination {
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }
}

impl Termination for NodeCountTermination {
    fn is_terminated(&self, stats: &SolveStats) -> bool {
        stats.nodes >= self.limit
    }
}
