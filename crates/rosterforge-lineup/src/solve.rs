//! Lineup solving with one retry on an inconclusive result.

use std::time::Duration;

use rosterforge_config::SolverSettings;
use rosterforge_core::{Lineup, Result};
use rosterforge_solver::{CpSolver, SearchConfig, SolveResult, SolveStatus};
use tracing::{debug, warn};

use crate::builder::LineupModel;

/// Result of solving one lineup model.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    Solved {
        lineup: Lineup,
        /// The search proved no better lineup exists.
        optimal: bool,
        objective: i64,
    },
    /// No lineup satisfies the model.
    Infeasible,
    /// The time budget ran out twice without a lineup.
    TimedOut { elapsed_ms: u64 },
    Invalid(String),
}

impl SolveOutcome {
    pub fn lineup(&self) -> Option<&Lineup> {
        match self {
            SolveOutcome::Solved { lineup, .. } => Some(lineup),
            _ => None,
        }
    }
}

/// Runs [`CpSolver`] over lineup models with the configured budget.
///
/// An UNKNOWN or INVALID result is retried once with the time limit scaled
/// by `retry_time_multiplier`.
#[derive(Debug, Clone)]
pub struct LineupSolver {
    config: SearchConfig,
    retry_limit: Duration,
}

impl LineupSolver {
    pub fn new(settings: &SolverSettings) -> Self {
        let mut config = SearchConfig::default()
            .with_time_limit(settings.time_limit())
            .with_workers(settings.workers.resolve())
            .with_seed(settings.random_seed.unwrap_or(0));
        if let Some(limit) = settings.node_limit {
            config = config.with_node_limit(limit);
        }
        if let Some(limit) = settings.unimproved_time_limit() {
            config = config.with_unimproved_limit(limit);
        }
        Self {
            config,
            retry_limit: settings.retry_time_limit(),
        }
    }

    pub fn from_config(config: SearchConfig, retry_limit: Duration) -> Self {
        Self { config, retry_limit }
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn solve(&self, model: &LineupModel) -> Result<SolveOutcome> {
        let first = CpSolver::new(self.config.clone()).solve(model.model());
        let result = match first.status {
            SolveStatus::Unknown | SolveStatus::Invalid => {
                warn!(
                    event = "solve_retry",
                    status = %first.status,
                    retry_ms = self.retry_limit.as_millis() as u64,
                );
                let retry = self.config.clone().with_time_limit(self.retry_limit);
                let mut second = CpSolver::new(retry).solve(model.model());
                second.stats.wall_time += first.stats.wall_time;
                second
            }
            _ => first,
        };
        self.outcome(model, result)
    }

    fn outcome(&self, model: &LineupModel, result: SolveResult) -> Result<SolveOutcome> {
        debug!(
            event = "lineup_solve",
            status = %result.status,
            objective = result.objective,
            nodes = result.stats.nodes,
            duration_ms = result.stats.wall_time.as_millis() as u64,
        );
        Ok(match (result.status, &result.assignment) {
            (SolveStatus::Optimal | SolveStatus::Feasible, Some(assignment)) => SolveOutcome::Solved {
                lineup: model.extract(assignment)?,
                optimal: result.status == SolveStatus::Optimal,
                objective: result.objective.unwrap_or_default(),
            },
            (SolveStatus::Infeasible, _) => SolveOutcome::Infeasible,
            (SolveStatus::Invalid, _) => {
                SolveOutcome::Invalid(result.invalid_reason.unwrap_or_else(|| "invalid model".to_string()))
            }
            _ => SolveOutcome::TimedOut {
                elapsed_ms: result.stats.wall_time.as_millis() as u64,
            },
        })
    }
}
