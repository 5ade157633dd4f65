//! The lineup generation loop.
//!
//! Each attempt builds a fresh model from the current exposure locks and
//! the lineups accepted so far, solves it, validates the result and either
//! accepts or accounts for it. Only configuration errors escape; every
//! other failure is recorded on the [`GenerationReport`].

use std::fmt;

use rosterforge_config::OptimizerConfig;
use rosterforge_core::{Lineup, PlayerCatalog, Result, RosterError, StackRole};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::builder::{resolve_player, Exclusions, LineupModel, LineupModelBuilder, ObjectiveWeights};
use crate::exposure::{ExposureCaps, ExposureCounter, ExposureSnapshot};
use crate::randomness::ProjectionRandomizer;
use crate::solve::{LineupSolver, SolveOutcome};
use crate::validation::{LineupValidator, ValidationProfile};

/// Which exposure caps were binding when generation ran out of lineups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExposureScope {
    PrimaryStack,
    SecondaryStack,
    Player,
}

impl fmt::Display for ExposureScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExposureScope::PrimaryStack => write!(f, "primary-stack"),
            ExposureScope::SecondaryStack => write!(f, "secondary-stack"),
            ExposureScope::Player => write!(f, "player"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// Every requested lineup was produced.
    Completed,
    /// The attempt budget ran out first.
    MaxAttempts,
    /// No lineup exists under the current exposure locks.
    ExposureExhausted(ExposureScope),
    /// No lineup exists even without exposure locks.
    Infeasible,
}

/// A failed attempt and why it failed.
#[derive(Debug)]
pub struct AttemptFailure {
    pub attempt: usize,
    pub error: RosterError,
}

/// Everything one generation run produced.
#[derive(Debug)]
pub struct GenerationReport {
    pub lineups: Vec<Lineup>,
    pub requested: usize,
    pub attempts: usize,
    /// Diversity comparisons dropped across the run.
    pub relaxations: usize,
    pub failures: Vec<AttemptFailure>,
    pub stop_reason: StopReason,
    pub exposure: ExposureSnapshot,
}

impl GenerationReport {
    pub fn is_complete(&self) -> bool {
        self.stop_reason == StopReason::Completed
    }

    /// One-line outcome, e.g. `187 of 300: stopped after 1000 attempts,
    /// primary-stack exposure exhausted`.
    pub fn summary(&self) -> String {
        let head = format!("{} of {}", self.lineups.len(), self.requested);
        match self.stop_reason {
            StopReason::Completed => format!("{head}: completed in {} attempts", self.attempts),
            StopReason::MaxAttempts => format!("{head}: stopped after {} attempts", self.attempts),
            StopReason::ExposureExhausted(scope) => {
                format!("{head}: stopped after {} attempts, {scope} exposure exhausted", self.attempts)
            }
            StopReason::Infeasible => {
                format!("{head}: stopped after {} attempts, no feasible lineup", self.attempts)
            }
        }
    }
}

/// Produces up to `lineup_count` distinct lineups for one slate.
///
/// # Example
///
/// ```no_run
/// use rosterforge_config::OptimizerConfig;
/// use rosterforge_lineup::LineupGenerator;
/// use rosterforge_test::{stack_catalog, stack_rules};
///
/// let config = OptimizerConfig::new(stack_rules()).with_lineup_count(3);
/// let catalog = stack_catalog();
/// let report = LineupGenerator::new(&config, &catalog).generate().unwrap();
/// println!("{}", report.summary());
/// ```
pub struct LineupGenerator<'a> {
    config: &'a OptimizerConfig,
    catalog: &'a PlayerCatalog,
}

/// What one attempt ended with after relaxation.
enum AttemptResult {
    Outcome(SolveOutcome),
    Failed(RosterError),
}

impl<'a> LineupGenerator<'a> {
    pub fn new(config: &'a OptimizerConfig, catalog: &'a PlayerCatalog) -> Self {
        Self { config, catalog }
    }

    pub fn generate(&self) -> Result<GenerationReport> {
        self.config.validate()?;
        let generation = &self.config.generation;
        let rules = &self.config.sport;

        let caps = ExposureCaps::from_config(rules, generation, self.catalog)?;
        let mut excluded = Exclusions::new();
        for name in &generation.excluded_players {
            excluded.exclude_player(resolve_player(self.catalog, name)?.id.clone());
        }

        let solver = LineupSolver::new(&self.config.solver);
        let validator = LineupValidator::new(rules);
        let mut randomizer = generation.randomness.as_ref().map(|randomness| {
            let mut randomness = randomness.clone();
            randomness.seed = randomness.seed.or(self.config.solver.random_seed);
            ProjectionRandomizer::new(&randomness)
        });
        let threshold = self.config.similarity_threshold();
        let max_relaxation = generation.max_relaxation_steps as usize;

        let mut counter = ExposureCounter::new(caps);
        let mut lineups: Vec<Lineup> = Vec::new();
        let mut rejected: Vec<Lineup> = Vec::new();
        let mut failures = Vec::new();
        let mut attempts = 0;
        let mut relaxations = 0;

        info!(
            event = "generation_start",
            requested = generation.lineup_count,
            max_attempts = generation.max_attempts,
            similarity_threshold = threshold,
            players = self.catalog.len(),
        );

        let stop_reason = loop {
            if lineups.len() >= generation.lineup_count {
                break StopReason::Completed;
            }
            if attempts >= generation.max_attempts {
                break StopReason::MaxAttempts;
            }
            attempts += 1;
            let attempt = attempts;

            let mut exclusions = counter.exclusions();
            exclusions.merge(&excluded);
            let weights = randomizer.as_mut().map(|r| r.draw(self.catalog));

            let mut relaxed = 0;
            let result = loop {
                let model = match self.build(&exclusions, &lineups, &rejected, relaxed, threshold, weights.as_ref()) {
                    Ok(model) => model,
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => break AttemptResult::Failed(err),
                };
                match solver.solve(&model) {
                    Ok(SolveOutcome::Infeasible) if relaxed < max_relaxation && relaxed < lineups.len() => {
                        relaxed += 1;
                        relaxations += 1;
                        debug!(event = "diversity_relaxed", attempt, dropped = relaxed);
                    }
                    Ok(outcome) => break AttemptResult::Outcome(outcome),
                    Err(err) => break AttemptResult::Failed(err),
                }
            };

            match result {
                AttemptResult::Outcome(SolveOutcome::Solved {
                    lineup,
                    optimal,
                    objective,
                }) => {
                    let violations = validator.validate(&lineup, ValidationProfile::Full);
                    if violations.is_empty() {
                        counter.record(&lineup);
                        info!(
                            event = "lineup_accepted",
                            attempt,
                            index = lineups.len(),
                            objective,
                            optimal,
                            salary = lineup.total_salary(),
                            primary_stack = ?lineup.primary_stack.as_ref().map(ToString::to_string),
                        );
                        lineups.push(lineup);
                    } else {
                        let reasons: Vec<String> = violations.iter().map(ToString::to_string).collect();
                        warn!(event = "lineup_rejected", attempt, violations = %reasons.join("; "));
                        rejected.push(lineup);
                        failures.push(AttemptFailure {
                            attempt,
                            error: RosterError::DataQuality(format!("lineup failed validation: {}", reasons.join("; "))),
                        });
                    }
                }
                AttemptResult::Outcome(SolveOutcome::Infeasible) => {
                    failures.push(AttemptFailure {
                        attempt,
                        error: RosterError::InfeasibleModel(format!(
                            "no lineup after dropping {relaxed} diversity comparisons"
                        )),
                    });
                    break match exhausted_scope(&counter) {
                        Some(scope) => StopReason::ExposureExhausted(scope),
                        None => StopReason::Infeasible,
                    };
                }
                AttemptResult::Outcome(SolveOutcome::TimedOut { elapsed_ms }) => {
                    warn!(event = "attempt_timed_out", attempt, elapsed_ms);
                    failures.push(AttemptFailure {
                        attempt,
                        error: RosterError::SolverTimeout { elapsed_ms },
                    });
                }
                AttemptResult::Outcome(SolveOutcome::Invalid(reason)) => {
                    warn!(event = "attempt_invalid", attempt, reason = %reason);
                    failures.push(AttemptFailure {
                        attempt,
                        error: RosterError::InfeasibleModel(format!("invalid model: {reason}")),
                    });
                }
                AttemptResult::Failed(error) => {
                    warn!(event = "attempt_failed", attempt, error = %error);
                    failures.push(AttemptFailure { attempt, error });
                }
            }
        };

        let report = GenerationReport {
            requested: generation.lineup_count,
            attempts,
            relaxations,
            failures,
            stop_reason,
            exposure: counter.snapshot(),
            lineups,
        };
        info!(
            event = "generation_finished",
            produced = report.lineups.len(),
            attempts = report.attempts,
            failures = report.failures.len(),
            summary = %report.summary(),
        );
        Ok(report)
    }

    /// Builds one attempt's model. The `relaxed` oldest lineups are only
    /// kept from being duplicated; the rest get the full threshold.
    fn build(
        &self,
        exclusions: &Exclusions,
        lineups: &[Lineup],
        rejected: &[Lineup],
        relaxed: usize,
        threshold: u32,
        weights: Option<&ObjectiveWeights>,
    ) -> Result<LineupModel> {
        let (loose, strict) = lineups.split_at(relaxed.min(lineups.len()));
        let mut builder = LineupModelBuilder::new(&self.config.sport, self.catalog)
            .with_exclusions(exclusions)
            .with_distinct_from(loose)
            .with_distinct_from(rejected)
            .with_previous_lineups(strict, threshold);
        if let Some(one_off) = &self.config.generation.one_off_players {
            builder = builder.with_one_off_players(one_off);
        }
        if let Some(weights) = weights {
            builder = builder.with_objective(weights);
        }
        builder.build()
    }
}

fn exhausted_scope(counter: &ExposureCounter) -> Option<ExposureScope> {
    if !counter.any_locked() {
        None
    } else if !counter.locked_stacks(StackRole::Primary).is_empty() {
        Some(ExposureScope::PrimaryStack)
    } else if !counter.locked_stacks(StackRole::Secondary).is_empty() {
        Some(ExposureScope::SecondaryStack)
    } else if !counter.locked_players().is_empty() {
        Some(ExposureScope::Player)
    } else {
        None
    }
}

#[cfg(test)]
mod tests;
