//! Stack identity helpers shared by the builder, the validator and late swap.

use std::collections::BTreeMap;

use rosterforge_config::{SportRules, StackGrouping};
use rosterforge_core::{Lineup, Player, StackKey, StackRole};

/// The stack identity a non-marker player counts toward.
pub fn stack_key(rules: &SportRules, player: &Player) -> Option<StackKey> {
    if rules.is_marker(player) {
        return None;
    }
    match rules.stacks.group_by {
        StackGrouping::Team => Some(StackKey::team(&player.team)),
        StackGrouping::TeamAndGroup => player
            .stack_group
            .as_ref()
            .map(|group| StackKey::grouped(&player.team, group)),
    }
}

/// Non-marker player count per stack identity.
pub fn stack_counts(rules: &SportRules, lineup: &Lineup) -> BTreeMap<StackKey, u32> {
    let mut counts = BTreeMap::new();
    for player in lineup.players() {
        if let Some(key) = stack_key(rules, player) {
            *counts.entry(key).or_insert(0) += 1;
        }
    }
    counts
}

/// Derives stack labels from player counts.
///
/// The primary stack is the identity whose count is an allowed primary
/// size (largest count first, then key order); the secondary is another
/// identity whose count is an allowed secondary size.
pub fn derive_stacks(rules: &SportRules, lineup: &Lineup) -> (Option<StackKey>, Option<StackKey>) {
    let counts = stack_counts(rules, lineup);
    let pick = |role: StackRole, skip: Option<&StackKey>| {
        let sizes = &rules.stacks.role(role)?.sizes;
        counts
            .iter()
            .filter(|&(key, &count)| sizes.contains(&count) && Some(key) != skip)
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(key, _)| key.clone())
    };
    let primary = pick(StackRole::Primary, None);
    let secondary = pick(StackRole::Secondary, primary.as_ref());
    (primary, secondary)
}
