//! Hand-built lineups.

use rosterforge_config::SportRules;
use rosterforge_core::{Lineup, LineupEntry, PlayerCatalog, PlayerId, RosterSlot, StackKey};

/// Builds a lineup from player ids given in slot-instance order.
///
/// Panics when an id is missing from the catalog or the id count does not
/// match the rules.
pub fn lineup_from_ids(rules: &SportRules, catalog: &PlayerCatalog, ids: &[&str]) -> Lineup {
    let instances: Vec<_> = RosterSlot::instances(&rules.slots).collect();
    assert_eq!(instances.len(), ids.len(), "one id per slot instance");
    let entries = instances
        .into_iter()
        .zip(ids)
        .map(|(instance, id)| LineupEntry {
            slot: instance.name,
            player: catalog
                .get(&PlayerId::new(*id))
                .unwrap_or_else(|| panic!("unknown fixture id {id}"))
                .clone(),
        })
        .collect();
    Lineup::new(entries)
}

/// A valid [`crate::rules::mlb_stacked_rules`] lineup stacking four NYY
/// hitters (Wells, Volpe, Judge, Soto). Salary 34,800.
pub fn nyy_stack_lineup(rules: &SportRules, catalog: &PlayerCatalog) -> Lineup {
    lineup_from_ids(
        rules,
        catalog,
        &["p03", "h05", "h15", "h17", "h04", "h01", "h02", "h07", "h09"],
    )
    .with_stacks(Some(StackKey::team("NYY")), None)
}
