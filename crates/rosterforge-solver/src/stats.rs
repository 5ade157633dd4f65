//! Search statistics.

use std::time::{Duration, Instant};

use serde::Serialize;

/// Counters for one solve.
///
/// # Example
///
/// ```
/// use rosterforge_solver::stats::SolveStats;
///
/// let mut stats = SolveStats::default();
/// stats.start();
/// stats.record_node();
/// stats.record_node();
/// stats.record_conflict();
///
/// assert_eq!(stats.nodes, 2);
/// assert_eq!(stats.conflicts, 1);
/// ```
#[derive(Debug, Clone, Default, Serialize)]
pub struct SolveStats {
    #[serde(skip)]
    start_time: Option<Instant>,
    #[serde(skip)]
    improved_at: Option<Instant>,
    /// Wall time, set when the solve finishes.
    pub wall_time: Duration,
    /// Branching decisions taken.
    pub nodes: u64,
    /// Dead ends, including bound prunes.
    pub conflicts: u64,
    /// Literals fixed by propagation.
    pub propagations: u64,
    /// Improving solutions found.
    pub solutions: u64,
}

impl SolveStats {
    /// Marks the start of solving.
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Returns the elapsed time since solving started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.map(|t| t.elapsed()).unwrap_or_default()
    }

    /// Freezes the wall time.
    pub fn finish(&mut self) {
        self.wall_time = self.elapsed();
    }

    pub fn record_node(&mut self) {
        self.nodes += 1;
    }

    pub fn record_conflict(&mut self) {
        self.conflicts += 1;
    }

    pub fn record_propagation(&mut self) {
        self.propagations += 1;
    }

    pub fn record_solution(&mut self) {
        self.solutions += 1;
        self.improved_at = Some(Instant::now());
    }

    /// Time since the last improving solution, if any was found.
    pub fn since_improvement(&self) -> Option<Duration> {
        self.improved_at.map(|t| t.elapsed())
    }

    /// Returns the nodes per second rate.
    pub fn nodes_per_second(&self) -> f64 {
        let secs = self.wall_time.as_secs_f64();
        if secs > 0.0 {
            self.nodes as f64 / secs
        } else {
            0.0
        }
    }

    /// Folds another worker's counters into these.
    pub(crate) fn absorb(&mut self, other: &SolveStats) {
        self.wall_time = self.wall_time.max(other.wall_time);
        self.nodes += other.nodes;
        self.conflicts += other.conflicts;
        self.propagations += other.propagations;
        self.solutions += other.solutions;
    }
}
