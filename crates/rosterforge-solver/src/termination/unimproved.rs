//! Termination once the incumbent stops improving.

use std::time::Duration;

use super::Termination;
use crate::stats::SolveStats;

/// Terminates when no better solution was found for `limit` since the last
/// improvement. Never fires before a first solution exists.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use rosterforge_solver::stats::SolveStats;
/// use rosterforge_solver::termination::{Termination, UnimprovedTimeTermination};
///
/// let term = UnimprovedTimeTermination::new(Duration::ZERO);
/// let mut stats = SolveStats::default();
/// assert!(!term.is_terminated(&stats));
///
/// stats.record_solution();
/// assert!(term.is_terminated(&stats));
/// ```
#[derive(Debug, Clone)]
pub struct UnimprovedTimeTermination {
    limit: Duration,
}

impl UnimprovedTimeTermination {
    pub fn new(limit: Duration) -> Self {
        Self { limit }
    }
}

impl Termination for UnimprovedTimeTermination {
    fn is_terminated(&self, stats: &SolveStats) -> bool {
        stats.since_improvement().is_some_and(|idle| idle >= self.limit)
    }
}
