//! Last-resort substitution without the stack preference.

use rosterforge_config::RepairStage;
use rosterforge_core::Lineup;
use rosterforge_lineup::{derive_stacks, ValidationProfile};

use crate::analyzer::SwapAnalysis;
use crate::strategy::{fill_slots, RepairContext, RepairStrategy, StrategyFailure};

/// Takes any candidate projected at least as high as the player it
/// replaces. Stack structure is not enforced, so the stack labels are
/// re-derived from the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyStrategy;

impl RepairStrategy for GreedyStrategy {
    fn stage(&self) -> RepairStage {
        RepairStage::Greedy
    }

    fn repair(&self, ctx: &RepairContext<'_>, analysis: &SwapAnalysis) -> Result<Lineup, StrategyFailure> {
        let mut by_projection = analysis.clone();
        for slot in &mut by_projection.invalid_slots {
            slot.candidates
                .sort_by(|a, b| b.projection.total_cmp(&a.projection).then_with(|| a.id.cmp(&b.id)));
        }
        let repaired = fill_slots(
            ctx,
            &by_projection,
            RepairStage::Greedy,
            ValidationProfile::Relaxed,
            |slot, candidate| candidate.projection >= ctx.refreshed_projection(&slot.player.id),
        )?;
        let (primary, secondary) = derive_stacks(ctx.rules, &repaired);
        Ok(repaired.with_stacks(primary, secondary))
    }
}
