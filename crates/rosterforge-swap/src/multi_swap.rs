//! Joint re-optimization of every invalid slot.

use std::collections::BTreeSet;

use rosterforge_config::RepairStage;
use rosterforge_core::{Lineup, Player, PlayerCatalog, PlayerId, StackRole};
use rosterforge_lineup::{Exclusions, LineupModelBuilder, SolveOutcome};
use tracing::debug;

use crate::analyzer::SwapAnalysis;
use crate::strategy::{RepairContext, RepairStrategy, StrategyFailure};

/// Rebuilds the lineup model with every still-valid slot fixed and solves
/// for the best joint replacement.
///
/// Locked-team players stay in the catalog so rules can still name them,
/// but only the fixed ones may be used. With `preserve_stacks` the original
/// stack identities are pinned.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiSwapStrategy;

impl MultiSwapStrategy {
    fn scoped_catalog(ctx: &RepairContext<'_>, fixed: &BTreeSet<PlayerId>) -> Result<PlayerCatalog, StrategyFailure> {
        let mut players: Vec<Player> = ctx.catalog.iter().cloned().collect();
        // Fixed players dropped from the refreshed feed keep their recorded data.
        for player in ctx.lineup.players() {
            if fixed.contains(&player.id) && !ctx.catalog.contains(&player.id) {
                players.push(player.clone());
            }
        }
        PlayerCatalog::new(players).map_err(|e| StrategyFailure::new(RepairStage::MultiSwap, e.to_string()))
    }

    fn locked_exclusions(ctx: &RepairContext<'_>, fixed: &BTreeSet<PlayerId>) -> Exclusions {
        let mut exclusions = Exclusions::new();
        for player in ctx.catalog.iter() {
            if ctx.config.is_locked(&player.team) && !fixed.contains(&player.id) {
                exclusions.exclude_player(player.id.clone());
            }
        }
        exclusions
    }
}

impl RepairStrategy for MultiSwapStrategy {
    fn stage(&self) -> RepairStage {
        RepairStage::MultiSwap
    }

    fn repair(&self, ctx: &RepairContext<'_>, analysis: &SwapAnalysis) -> Result<Lineup, StrategyFailure> {
        let fail = |reason: String| StrategyFailure::new(RepairStage::MultiSwap, reason);

        let fixed: Vec<(usize, PlayerId)> = ctx
            .lineup
            .entries
            .iter()
            .enumerate()
            .filter(|(i, _)| !analysis.is_invalid(*i))
            .map(|(i, e)| (i, e.player.id.clone()))
            .collect();
        let fixed_ids: BTreeSet<PlayerId> = fixed.iter().map(|(_, id)| id.clone()).collect();
        let catalog = Self::scoped_catalog(ctx, &fixed_ids)?;

        let exclusions = Self::locked_exclusions(ctx, &fixed_ids);

        let mut builder = LineupModelBuilder::new(ctx.rules, &catalog)
            .with_fixed(&fixed)
            .with_exclusions(&exclusions);
        if ctx.config.preserve_stacks {
            if let Some(key) = &analysis.primary_stack {
                builder = builder.with_pinned_stack(StackRole::Primary, key.clone());
            }
            if let Some(key) = &analysis.secondary_stack {
                builder = builder.with_pinned_stack(StackRole::Secondary, key.clone());
            }
        }
        let model = builder.build().map_err(|e| fail(e.to_string()))?;
        debug!(
            event = "multi_swap_model",
            fixed = fixed.len(),
            open = analysis.invalid_slots.len(),
            pool = model.pool_size(),
        );

        match ctx.solver.solve(&model).map_err(|e| fail(e.to_string()))? {
            SolveOutcome::Solved { lineup, .. } => Ok(lineup),
            SolveOutcome::Infeasible => Err(fail("no joint replacement satisfies the rules".to_string())),
            SolveOutcome::TimedOut { elapsed_ms } => Err(fail(format!("solver timed out after {elapsed_ms}ms"))),
            SolveOutcome::Invalid(reason) => Err(fail(format!("invalid model: {reason}"))),
        }
    }
}
