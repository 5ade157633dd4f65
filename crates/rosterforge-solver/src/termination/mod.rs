//! Termination conditions for a search worker.

mod external;
mod node_count;
mod time;
mod unimproved;

use std::fmt::Debug;

use crate::stats::SolveStats;

pub use external::ExternalTermination;
pub use node_count::NodeCountTermination;
pub use time::TimeTermination;
pub use unimproved::UnimprovedTimeTermination;

/// Trait for determining when to stop searching.
pub trait Termination: Send + Sync + Debug {
    /// Returns true if the search should stop.
    fn is_terminated(&self, stats: &SolveStats) -> bool;
}

/// Stops as soon as any child terminates.
#[derive(Debug, Default)]
pub struct OrTermination {
    children: Vec<Box<dyn Termination>>,
}

impl OrTermination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, termination: impl Termination + 'static) -> Self {
        self.children.push(Box::new(termination));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl Termination for OrTermination {
    fn is_terminated(&self, stats: &SolveStats) -> bool {
        self.children.iter().any(|t| t.is_terminated(stats))
    }
}
