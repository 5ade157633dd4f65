//! Flag-based termination shared between portfolio workers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::Termination;
use crate::stats::SolveStats;

/// Terminates once a shared flag is raised.
#[derive(Debug, Clone, Default)]
pub struct ExternalTermination {
    flag: Arc<AtomicBool>,
}

impl ExternalTermination {
    pub fn new(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    pub fn raise(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl Termination for ExternalTermination {
    fn is_terminated(&self, _stats: &SolveStats) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
