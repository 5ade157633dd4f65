//! The late-swap repair engine.

use std::collections::BTreeMap;

use rayon::prelude::*;
use rosterforge_config::{LateSwapConfig, OptimizerConfig, RepairStage, SolverSettings, SportRules, UnrepairablePolicy};
use rosterforge_core::{Lineup, PlayerCatalog, PlayerId, RosterError, StackKey};
use rosterforge_lineup::{LineupSolver, ValidationProfile};
use serde::Serialize;
use tracing::{info, warn};

use crate::analyzer::{SwapAnalysis, SwapAnalyzer, SwapVerdict};
use crate::greedy::GreedyStrategy;
use crate::multi_swap::MultiSwapStrategy;
use crate::stack_preserving::StackPreservingStrategy;
use crate::strategy::{RepairContext, RepairStrategy, StrategyFailure};

/// What happened to one lineup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RepairStatus {
    /// Every player was still eligible.
    Unchanged,
    /// Only players on locked teams were ineligible; nothing could change.
    Locked,
    Repaired,
    /// Every strategy failed.
    Unrepairable,
}

/// One substitution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapRecord {
    pub slot: String,
    pub out: PlayerId,
    pub r#in: PlayerId,
    pub projection_delta: f64,
    pub salary_delta: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepairOutcome {
    pub original: Lineup,
    /// The repaired lineup, or the original when nothing was repaired.
    pub repaired: Lineup,
    /// The stage that produced `repaired`.
    pub stage: Option<RepairStage>,
    pub swaps: Vec<SwapRecord>,
    pub status: RepairStatus,
    pub stack_preserved: bool,
    pub failures: Vec<StrategyFailure>,
}

impl RepairOutcome {
    fn untouched(lineup: &Lineup, status: RepairStatus, failures: Vec<StrategyFailure>) -> Self {
        Self {
            original: lineup.clone(),
            repaired: lineup.clone(),
            stage: None,
            swaps: Vec::new(),
            status,
            stack_preserved: true,
            failures,
        }
    }

    pub fn projection_delta(&self) -> f64 {
        self.swaps.iter().map(|s| s.projection_delta).sum()
    }

    pub fn salary_delta(&self) -> i64 {
        self.swaps.iter().map(|s| s.salary_delta).sum()
    }
}

/// A reportable event from a repair run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SwapWarning {
    /// The greedy stage changed a lineup's stack identities.
    StackBroken {
        lineup: usize,
        before: Option<StackKey>,
        after: Option<StackKey>,
    },
}

/// Results of repairing a set of lineups.
#[derive(Debug)]
pub struct LateSwapReport {
    /// One outcome per input lineup, in input order.
    pub outcomes: Vec<RepairOutcome>,
    /// The lineups to export after applying the unrepairable policy.
    pub lineups: Vec<Lineup>,
    pub unchanged: usize,
    pub locked: usize,
    pub repaired: BTreeMap<RepairStage, usize>,
    pub unrepairable: usize,
    pub dropped: usize,
    pub errors: Vec<RosterError>,
    pub warnings: Vec<SwapWarning>,
}

impl LateSwapReport {
    pub fn repaired_by(&self, stage: RepairStage) -> usize {
        self.repaired.get(&stage).copied().unwrap_or(0)
    }
}

/// Runs the configured strategy chain over lineups.
///
/// # Example
///
/// ```no_run
/// use rosterforge_config::OptimizerConfig;
/// use rosterforge_swap::LateSwapEngine;
/// use rosterforge_test::{mlb_catalog, mlb_stacked_rules, nyy_stack_lineup};
///
/// let config = OptimizerConfig::new(mlb_stacked_rules()).with_locked_teams(&["LAD"]);
/// let catalog = mlb_catalog();
/// let lineup = nyy_stack_lineup(&config.sport, &catalog);
///
/// let report = LateSwapEngine::from_config(&config).repair_all(&[lineup], &catalog);
/// assert_eq!(report.unchanged, 1);
/// ```
#[derive(Debug)]
pub struct LateSwapEngine<'a> {
    rules: &'a SportRules,
    config: &'a LateSwapConfig,
    solver: LineupSolver,
    strategies: Vec<Box<dyn RepairStrategy>>,
}

impl<'a> LateSwapEngine<'a> {
    pub fn new(rules: &'a SportRules, config: &'a LateSwapConfig, settings: &SolverSettings) -> Self {
        let strategies = config.strategies.iter().map(|stage| strategy_for(*stage)).collect();
        Self {
            rules,
            config,
            solver: LineupSolver::new(settings),
            strategies,
        }
    }

    pub fn from_config(config: &'a OptimizerConfig) -> Self {
        Self::new(&config.sport, &config.late_swap, &config.solver)
    }

    /// Replaces the configured chain.
    pub fn with_strategies(mut self, strategies: Vec<Box<dyn RepairStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn stages(&self) -> Vec<RepairStage> {
        self.strategies.iter().map(|s| s.stage()).collect()
    }

    pub fn analyze(&self, lineup: &Lineup, catalog: &PlayerCatalog) -> SwapAnalysis {
        SwapAnalyzer::new(self.rules, self.config).analyze(lineup, catalog)
    }

    /// Repairs one lineup against the refreshed catalog.
    pub fn repair(&self, lineup: &Lineup, catalog: &PlayerCatalog) -> RepairOutcome {
        let analysis = self.analyze(lineup, catalog);
        match analysis.verdict {
            SwapVerdict::NoSwapNeeded => return RepairOutcome::untouched(lineup, RepairStatus::Unchanged, Vec::new()),
            SwapVerdict::LockedOnly => return RepairOutcome::untouched(lineup, RepairStatus::Locked, Vec::new()),
            SwapVerdict::NeedsSwap => {}
        }

        let ctx = RepairContext {
            rules: self.rules,
            config: self.config,
            catalog,
            solver: &self.solver,
            lineup,
        };
        let mut failures = Vec::new();
        for strategy in &self.strategies {
            let stage = strategy.stage();
            let result = strategy
                .repair(&ctx, &analysis)
                .and_then(|repaired| self.check(&ctx, &analysis, stage, repaired));
            match result {
                Ok(repaired) => {
                    let stack_preserved = repaired.primary_stack == analysis.primary_stack
                        && repaired.secondary_stack == analysis.secondary_stack;
                    return RepairOutcome {
                        original: lineup.clone(),
                        swaps: swaps(lineup, &repaired),
                        repaired,
                        stage: Some(stage),
                        status: RepairStatus::Repaired,
                        stack_preserved,
                        failures,
                    };
                }
                Err(failure) => {
                    info!(event = "repair_stage_failed", stage = %stage, reason = %failure.reason);
                    failures.push(failure);
                }
            }
        }
        RepairOutcome::untouched(lineup, RepairStatus::Unrepairable, failures)
    }

    /// Repairs every lineup in parallel. Outcomes keep input order.
    pub fn repair_all(&self, lineups: &[Lineup], catalog: &PlayerCatalog) -> LateSwapReport {
        let outcomes: Vec<RepairOutcome> = lineups.par_iter().map(|l| self.repair(l, catalog)).collect();

        let mut report = LateSwapReport {
            outcomes: Vec::new(),
            lineups: Vec::with_capacity(lineups.len()),
            unchanged: 0,
            locked: 0,
            repaired: BTreeMap::new(),
            unrepairable: 0,
            dropped: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
        };
        for (index, outcome) in outcomes.iter().enumerate() {
            match outcome.status {
                RepairStatus::Unchanged => report.unchanged += 1,
                RepairStatus::Locked => report.locked += 1,
                RepairStatus::Repaired => {
                    if let Some(stage) = outcome.stage {
                        *report.repaired.entry(stage).or_insert(0) += 1;
                        if stage == RepairStage::Greedy && !outcome.stack_preserved {
                            warn!(
                                event = "greedy_stack_broken",
                                lineup = index,
                                before = ?outcome.original.primary_stack.as_ref().map(ToString::to_string),
                                after = ?outcome.repaired.primary_stack.as_ref().map(ToString::to_string),
                            );
                            report.warnings.push(SwapWarning::StackBroken {
                                lineup: index,
                                before: outcome.original.primary_stack.clone(),
                                after: outcome.repaired.primary_stack.clone(),
                            });
                        }
                    }
                }
                RepairStatus::Unrepairable => {
                    report.unrepairable += 1;
                    let reason = outcome
                        .failures
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join("; ");
                    warn!(event = "lineup_unrepairable", lineup = index, reason = %reason);
                    report.errors.push(RosterError::UnrepairableLineup { lineup: index, reason });
                    if self.config.unrepairable == UnrepairablePolicy::Drop {
                        report.dropped += 1;
                        continue;
                    }
                }
            }
            report.lineups.push(outcome.repaired.clone());
        }
        report.outcomes = outcomes;

        info!(
            event = "late_swap_finished",
            lineups = lineups.len(),
            unchanged = report.unchanged,
            locked = report.locked,
            repaired = report.repaired.values().sum::<usize>(),
            unrepairable = report.unrepairable,
        );
        report
    }

    /// Rejects a strategy result that breaks the rules, changes a slot
    /// that was still valid, or brings in a player from a locked team.
    fn check(
        &self,
        ctx: &RepairContext<'_>,
        analysis: &SwapAnalysis,
        stage: RepairStage,
        repaired: Lineup,
    ) -> Result<Lineup, StrategyFailure> {
        let profile = match stage {
            RepairStage::Greedy => ValidationProfile::Relaxed,
            _ => ValidationProfile::Full,
        };
        if let Some(violation) = ctx.validator().validate(&repaired, profile).first() {
            return Err(StrategyFailure::new(stage, format!("repaired lineup is invalid: {violation}")));
        }
        if repaired.len() != ctx.lineup.len() {
            return Err(StrategyFailure::new(stage, "repaired lineup has the wrong size"));
        }
        for (i, (before, after)) in ctx.lineup.entries.iter().zip(&repaired.entries).enumerate() {
            if analysis.is_invalid(i) {
                if self.config.is_locked(&after.player.team) && !ctx.lineup.contains(&after.player.id) {
                    return Err(StrategyFailure::new(
                        stage,
                        format!("{} is on locked team {}", after.player.id, after.player.team),
                    ));
                }
            } else if before.player.id != after.player.id {
                return Err(StrategyFailure::new(stage, format!("slot {} changed without cause", before.slot)));
            }
        }
        Ok(repaired)
    }
}

fn strategy_for(stage: RepairStage) -> Box<dyn RepairStrategy> {
    match stage {
        RepairStage::MultiSwap => Box::new(MultiSwapStrategy),
        RepairStage::StackPreserving => Box::new(StackPreservingStrategy),
        RepairStage::Greedy => Box::new(GreedyStrategy),
    }
}

fn swaps(original: &Lineup, repaired: &Lineup) -> Vec<SwapRecord> {
    original
        .entries
        .iter()
        .zip(&repaired.entries)
        .filter(|(before, after)| before.player.id != after.player.id)
        .map(|(before, after)| SwapRecord {
            slot: before.slot.clone(),
            out: before.player.id.clone(),
            r#in: after.player.id.clone(),
            projection_delta: after.player.projection - before.player.projection,
            salary_delta: after.player.salary as i64 - before.player.salary as i64,
        })
        .collect()
}
