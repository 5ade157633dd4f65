//! Solver entry point and portfolio parallelism.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;
use tracing::debug;

use crate::model::Model;
use crate::search::{Search, WorkerOutcome};
use crate::stats::SolveStats;
use crate::status::{Assignment, SolveResult, SolveStatus};
use crate::termination::{
    ExternalTermination, NodeCountTermination, OrTermination, TimeTermination, UnimprovedTimeTermination,
};

/// Search limits and parallelism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub time_limit: Option<Duration>,
    pub node_limit: Option<u64>,
    /// Stop a worker once its incumbent has not improved for this long.
    pub unimproved_limit: Option<Duration>,
    /// Independent portfolio workers. Worker 0 uses the model's branch
    /// order as given; the others jitter it.
    pub workers: usize,
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_limit: Some(Duration::from_secs(30)),
            node_limit: None,
            unimproved_limit: None,
            workers: 1,
            seed: 0,
        }
    }
}

impl SearchConfig {
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }

    pub fn with_unimproved_limit(mut self, limit: Duration) -> Self {
        self.unimproved_limit = Some(limit);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Branch-and-bound solver over a [`Model`].
///
/// # Example
///
/// ```
/// use rosterforge_solver::{CpSolver, LinearExpr, Model, SearchConfig, SolveStatus};
///
/// let mut model = Model::new();
/// let a = model.new_bool_var("a");
/// let b = model.new_bool_var("b");
/// model.add_at_most_one(&[a.lit(), b.lit()]);
/// model.maximize(vec![(3, a), (5, b)]);
///
/// let result = CpSolver::new(SearchConfig::default()).solve(&model);
/// assert_eq!(result.status, SolveStatus::Optimal);
/// assert_eq!(result.objective, Some(5));
/// assert!(result.assignment.unwrap().value(b));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CpSolver {
    config: SearchConfig,
}

impl CpSolver {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn solve(&self, model: &Model) -> SolveResult {
        if let Err(err) = model.validate() {
            debug!(event = "solve_invalid", reason = %err);
            return SolveResult::invalid(err.to_string());
        }

        debug!(
            event = "solve_start",
            vars = model.num_vars(),
            constraints = model.constraints().len(),
            workers = self.config.workers,
        );

        let stop = ExternalTermination::new(Arc::new(AtomicBool::new(false)));
        let deadline = self.config.time_limit.map(TimeTermination::new);
        let outcomes: Vec<WorkerOutcome> = if self.config.workers <= 1 {
            vec![self.run_worker(model, 0, &stop, deadline.as_ref())]
        } else {
            (0..self.config.workers)
                .into_par_iter()
                .map(|w| self.run_worker(model, w, &stop, deadline.as_ref()))
                .collect()
        };

        let result = merge(outcomes);
        debug!(
            event = "solve_end",
            status = %result.status,
            objective = result.objective,
            worker = result.worker,
            nodes = result.stats.nodes,
            conflicts = result.stats.conflicts,
            duration_ms = result.stats.wall_time.as_millis() as u64,
        );
        result
    }

    fn run_worker(
        &self,
        model: &Model,
        worker: usize,
        stop: &ExternalTermination,
        deadline: Option<&TimeTermination>,
    ) -> WorkerOutcome {
        let mut termination = OrTermination::new().with(stop.clone());
        if let Some(deadline) = deadline {
            termination = termination.with(deadline.clone());
        }
        if let Some(limit) = self.config.node_limit {
            termination = termination.with(NodeCountTermination::new(limit));
        }
        if let Some(limit) = self.config.unimproved_limit {
            termination = termination.with(UnimprovedTimeTermination::new(limit));
        }
        let outcome = Search::new(model, worker, self.config.seed).run(&termination);
        if outcome.exhausted {
            stop.raise();
        }
        outcome
    }
}

/// Best objective wins, then the lowest worker index. Any exhausted worker
/// proves the merged status.
fn merge(outcomes: Vec<WorkerOutcome>) -> SolveResult {
    let mut stats = SolveStats::default();
    let mut exhausted = false;
    let mut best: Option<(i64, usize, Vec<bool>)> = None;

    for outcome in outcomes {
        stats.absorb(&outcome.stats);
        exhausted |= outcome.exhausted;
        if let Some((objective, values)) = outcome.best {
            let better = match &best {
                None => true,
                Some((b, w, _)) => objective > *b || (objective == *b && outcome.worker < *w),
            };
            if better {
                best = Some((objective, outcome.worker, values));
            }
        }
    }

    let status = SolveStatus::classify(exhausted, best.is_some());
    match best {
        Some((objective, worker, values)) => SolveResult {
            status,
            assignment: Some(Assignment::new(values)),
            objective: Some(objective),
            stats,
            worker,
            invalid_reason: None,
        },
        None => SolveResult {
            status,
            assignment: None,
            objective: None,
            stats,
            worker: 0,
            invalid_reason: None,
        },
    }
}

#[cfg(test)]
#[path = "solver_tests.rs"]
mod tests;
