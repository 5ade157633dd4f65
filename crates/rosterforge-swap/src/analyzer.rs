//! Late-swap analysis of one lineup against a refreshed catalog.

use std::cmp::Ordering;

use rosterforge_config::{LateSwapConfig, SportRules};
use rosterforge_core::{Lineup, Player, PlayerCatalog, RosterSlot, StackKey, StackRole};
use rosterforge_lineup::{derive_stacks, stack_key};
use serde::Serialize;
use tracing::debug;

/// Whether a lineup needs repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwapVerdict {
    /// Every player is still eligible. Callers must skip repair.
    NoSwapNeeded,
    /// Every ineligible player is on a locked team and stays.
    LockedOnly,
    NeedsSwap,
}

/// A slot held by a player who can no longer play.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvalidSlot {
    /// Position in slot-instance order.
    pub index: usize,
    pub slot: String,
    /// The player as recorded in the lineup.
    pub player: Player,
    /// The stack the player counted toward, if any.
    pub stack_role: Option<StackRole>,
    /// 3 for a primary-stack player, 2 secondary, 1 unstacked.
    pub priority: u8,
    /// Ranked replacements.
    pub candidates: Vec<Player>,
}

impl InvalidSlot {
    pub fn stack<'a>(&self, analysis: &'a SwapAnalysis) -> Option<&'a StackKey> {
        match self.stack_role? {
            StackRole::Primary => analysis.primary_stack.as_ref(),
            StackRole::Secondary => analysis.secondary_stack.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SwapAnalysis {
    pub verdict: SwapVerdict,
    pub primary_stack: Option<StackKey>,
    pub secondary_stack: Option<StackKey>,
    /// Sorted by priority, then slot index.
    pub invalid_slots: Vec<InvalidSlot>,
    /// Slot indices of ineligible players on locked teams.
    pub locked_invalid: Vec<usize>,
}

impl SwapAnalysis {
    pub fn needs_swap(&self) -> bool {
        self.verdict == SwapVerdict::NeedsSwap
    }

    pub fn is_invalid(&self, index: usize) -> bool {
        self.invalid_slots.iter().any(|s| s.index == index)
    }
}

/// Finds ineligible players and ranks their replacements.
///
/// Analysis is a pure function of the lineup, catalog and configuration:
/// running it twice gives the same verdict and the same rankings.
#[derive(Debug, Clone, Copy)]
pub struct SwapAnalyzer<'a> {
    rules: &'a SportRules,
    config: &'a LateSwapConfig,
}

impl<'a> SwapAnalyzer<'a> {
    pub fn new(rules: &'a SportRules, config: &'a LateSwapConfig) -> Self {
        Self { rules, config }
    }

    pub fn analyze(&self, lineup: &Lineup, catalog: &PlayerCatalog) -> SwapAnalysis {
        let (primary_stack, secondary_stack) = if lineup.primary_stack.is_some() || lineup.secondary_stack.is_some() {
            (lineup.primary_stack.clone(), lineup.secondary_stack.clone())
        } else {
            derive_stacks(self.rules, lineup)
        };

        let mut invalid = Vec::new();
        let mut locked_invalid = Vec::new();
        for (index, entry) in lineup.entries.iter().enumerate() {
            let eligible = catalog.get(&entry.player.id).is_some_and(|p| p.active);
            if eligible {
                continue;
            }
            if self.config.is_locked(&entry.player.team) {
                locked_invalid.push(index);
            } else {
                invalid.push(index);
            }
        }

        let slot_indices: Vec<usize> = RosterSlot::instances(&self.rules.slots)
            .map(|instance| instance.slot_index)
            .collect();
        let mut invalid_slots: Vec<InvalidSlot> = invalid
            .iter()
            .map(|&index| {
                let entry = &lineup.entries[index];
                let own_key = stack_key(self.rules, &entry.player);
                let stack_role = own_key.as_ref().and_then(|key| {
                    if primary_stack.as_ref() == Some(key) {
                        Some(StackRole::Primary)
                    } else if secondary_stack.as_ref() == Some(key) {
                        Some(StackRole::Secondary)
                    } else {
                        None
                    }
                });
                let priority = match stack_role {
                    Some(StackRole::Primary) => 3,
                    Some(StackRole::Secondary) => 2,
                    None => 1,
                };
                let stack = stack_role.and(own_key);
                let candidates = self.candidates(
                    lineup,
                    catalog,
                    &invalid,
                    index,
                    slot_indices.get(index).copied(),
                    stack.as_ref(),
                );
                InvalidSlot {
                    index,
                    slot: entry.slot.clone(),
                    player: entry.player.clone(),
                    stack_role,
                    priority,
                    candidates,
                }
            })
            .collect();
        invalid_slots.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.index.cmp(&b.index)));

        let verdict = if !invalid_slots.is_empty() {
            SwapVerdict::NeedsSwap
        } else if !locked_invalid.is_empty() {
            SwapVerdict::LockedOnly
        } else {
            SwapVerdict::NoSwapNeeded
        };
        debug!(
            event = "swap_analyzed",
            verdict = ?verdict,
            invalid = invalid_slots.len(),
            locked = locked_invalid.len(),
        );

        SwapAnalysis {
            verdict,
            primary_stack,
            secondary_stack,
            invalid_slots,
            locked_invalid,
        }
    }

    fn candidates(
        &self,
        lineup: &Lineup,
        catalog: &PlayerCatalog,
        invalid: &[usize],
        index: usize,
        slot_index: Option<usize>,
        stack: Option<&StackKey>,
    ) -> Vec<Player> {
        let Some(slot) = slot_index.and_then(|s| self.rules.slots.get(s)) else {
            return Vec::new();
        };
        let others: u32 = lineup
            .entries
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, e)| e.player.salary)
            .sum();
        let budget = self.rules.salary_cap.saturating_sub(others);
        let fixed: Vec<&Player> = lineup
            .entries
            .iter()
            .enumerate()
            .filter(|(i, _)| !invalid.contains(i))
            .map(|(_, e)| &e.player)
            .collect();

        let mut candidates: Vec<Player> = catalog
            .iter()
            .filter(|p| {
                slot.accepts(p)
                    && p.active
                    && p.projection > 0.0
                    && p.salary <= budget
                    && !lineup.contains(&p.id)
                    && !self.config.is_locked(&p.team)
                    && !self.faces_fixed(p, &fixed)
            })
            .cloned()
            .collect();
        let same_stack = |p: &Player| stack.is_some_and(|key| stack_key(self.rules, p).as_ref() == Some(key));
        candidates.sort_by(|a, b| rank(a, b, same_stack));
        candidates
    }

    fn faces_fixed(&self, candidate: &Player, fixed: &[&Player]) -> bool {
        if !self.rules.opponent_exclusion {
            return false;
        }
        if self.rules.is_marker(candidate) {
            !candidate.opponent.is_empty()
                && fixed
                    .iter()
                    .any(|p| !self.rules.is_marker(p) && p.team == candidate.opponent)
        } else {
            fixed
                .iter()
                .any(|p| self.rules.is_marker(p) && !p.opponent.is_empty() && p.opponent == candidate.team)
        }
    }
}

/// Same-stack first, then projection descending, then id ascending.
fn rank(a: &Player, b: &Player, same_stack: impl Fn(&Player) -> bool) -> Ordering {
    same_stack(b)
        .cmp(&same_stack(a))
        .then_with(|| b.projection.total_cmp(&a.projection))
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests;
