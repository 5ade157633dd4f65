//! Wall-clock budget for one solve.

use std::time::{Duration, Instant};

use super::Termination;
use crate::stats::SolveStats;

/// Stops once a deadline passes.
///
/// The deadline is fixed when the termination is built, so clones handed
/// to portfolio workers all stop at the same instant however late a worker
/// was scheduled.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use rosterforge_solver::termination::{Termination, TimeTermination};
/// use rosterforge_solver::SolveStats;
///
/// let term = TimeTermination::new(Duration::from_secs(60));
/// assert!(!term.is_terminated(&SolveStats::default()));
/// ```
#[derive(Debug, Clone)]
pub struct TimeTermination {
    deadline: Option<Instant>,
}

impl TimeTermination {
    /// A deadline `limit` from now. Limits too large to represent never fire.
    pub fn new(limit: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(limit),
        }
    }
}

impl Termination for TimeTermination {
    fn is_terminated(&self, _stats: &SolveStats) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}
