//! Per-slot substitution inside the original stack.

use rosterforge_config::RepairStage;
use rosterforge_core::Lineup;
use rosterforge_lineup::{stack_key, ValidationProfile};

use crate::analyzer::SwapAnalysis;
use crate::strategy::{fill_slots, RepairContext, RepairStrategy, StrategyFailure};

/// Replaces each invalid player with the best candidate from the same
/// stack identity, or the best candidate overall for unstacked players.
/// Every substitution must keep the lineup fully valid.
#[derive(Debug, Clone, Copy, Default)]
pub struct StackPreservingStrategy;

impl RepairStrategy for StackPreservingStrategy {
    fn stage(&self) -> RepairStage {
        RepairStage::StackPreserving
    }

    fn repair(&self, ctx: &RepairContext<'_>, analysis: &SwapAnalysis) -> Result<Lineup, StrategyFailure> {
        fill_slots(
            ctx,
            analysis,
            RepairStage::StackPreserving,
            ValidationProfile::Full,
            |slot, candidate| match slot.stack(analysis) {
                Some(key) => stack_key(ctx.rules, candidate).as_ref() == Some(key),
                None => true,
            },
        )
    }
}
