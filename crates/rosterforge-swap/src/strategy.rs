//! The repair strategy seam.
//!
//! Strategies run in the configured order and the first success wins.
//! Each one sees the same context and analysis; none of them mutates the
//! original lineup.

use std::fmt::Debug;

use rosterforge_config::{LateSwapConfig, RepairStage, SportRules};
use rosterforge_core::{Lineup, LineupEntry, Player, PlayerCatalog, PlayerId};
use rosterforge_lineup::{LineupSolver, LineupValidator, ValidationProfile};
use thiserror::Error;

use crate::analyzer::{InvalidSlot, SwapAnalysis};

/// Why one strategy could not repair a lineup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} failed: {reason}")]
pub struct StrategyFailure {
    pub stage: RepairStage,
    pub reason: String,
}

impl StrategyFailure {
    pub fn new(stage: RepairStage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

/// Everything a strategy may read while repairing one lineup.
#[derive(Debug, Clone, Copy)]
pub struct RepairContext<'a> {
    pub rules: &'a SportRules,
    pub config: &'a LateSwapConfig,
    pub catalog: &'a PlayerCatalog,
    pub solver: &'a LineupSolver,
    pub lineup: &'a Lineup,
}

impl RepairContext<'_> {
    /// Projection of a player in the refreshed catalog, 0 when absent.
    pub fn refreshed_projection(&self, id: &PlayerId) -> f64 {
        self.catalog.get(id).map(|p| p.projection).unwrap_or(0.0)
    }

    pub fn validator(&self) -> LineupValidator<'_> {
        LineupValidator::new(self.rules)
    }
}

/// One stage of the late-swap chain.
pub trait RepairStrategy: Send + Sync + Debug {
    fn stage(&self) -> RepairStage;

    /// Returns a repaired lineup or the reason this stage gave up.
    fn repair(&self, ctx: &RepairContext<'_>, analysis: &SwapAnalysis) -> Result<Lineup, StrategyFailure>;
}

/// Fills invalid slots one at a time in priority order, taking the first
/// candidate that `accept` allows and that keeps `working` valid under
/// `profile`.
pub(crate) fn fill_slots(
    ctx: &RepairContext<'_>,
    analysis: &SwapAnalysis,
    stage: RepairStage,
    profile: ValidationProfile,
    accept: impl Fn(&InvalidSlot, &Player) -> bool,
) -> Result<Lineup, StrategyFailure> {
    let validator = ctx.validator();
    let mut working = ctx
        .lineup
        .clone()
        .with_stacks(analysis.primary_stack.clone(), analysis.secondary_stack.clone());

    for slot in &analysis.invalid_slots {
        let chosen = slot
            .candidates
            .iter()
            .filter(|c| accept(slot, *c) && !working.contains(&c.id))
            .find_map(|candidate| {
                let mut trial = working.clone();
                trial.entries[slot.index] = LineupEntry {
                    slot: slot.slot.clone(),
                    player: candidate.clone(),
                };
                validator.is_valid(&trial, profile).then_some(trial)
            });
        working = chosen.ok_or_else(|| {
            StrategyFailure::new(stage, format!("no valid replacement for {} in {}", slot.player.id, slot.slot))
        })?;
    }
    Ok(working)
}
