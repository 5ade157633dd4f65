//! Sport rule fixtures.

use rosterforge_config::{SportRules, StackRules};
use rosterforge_core::RosterSlot;

/// Nine-slot MLB classic rules without stacking, $35,000 cap.
///
/// ```
/// use rosterforge_test::rules::mlb_rules;
///
/// let rules = mlb_rules();
/// assert_eq!(rules.marker_slot_count(), 1);
/// assert!(!rules.stacks.is_enabled());
/// ```
pub fn mlb_rules() -> SportRules {
    SportRules::new(
        "mlb_classic",
        35000,
        vec![
            RosterSlot::new("P", 1, &["P"]),
            RosterSlot::new("C/1B", 1, &["C", "1B"]),
            RosterSlot::new("2B", 1, &["2B"]),
            RosterSlot::new("3B", 1, &["3B"]),
            RosterSlot::new("SS", 1, &["SS"]),
            RosterSlot::new("OF", 3, &["OF"]),
            RosterSlot::new("UTIL", 1, &["C", "1B", "2B", "3B", "SS", "OF"]),
        ],
    )
    .with_markers(&["P"])
    .with_team_limit(5, 6)
}

/// [`mlb_rules`] with a required four-player primary team stack.
pub fn mlb_stacked_rules() -> SportRules {
    mlb_rules().with_stacks(StackRules::default().with_primary(&[4], 1.0))
}

/// Five-slot rules for the small slate: one pitcher, four hitters, a
/// two-player primary stack capped at 20% exposure, every other team
/// limited to one player.
pub fn stack_rules() -> SportRules {
    SportRules::new(
        "mlb_small",
        50000,
        vec![RosterSlot::new("P", 1, &["P"]), RosterSlot::new("UTIL", 4, &["OF"])],
    )
    .with_markers(&["P"])
    .with_stacks(
        StackRules::default()
            .with_primary(&[2], 0.2)
            .with_max_unstacked(1),
    )
}

/// [`mlb_rules`] at a $50,000 cap with a required four-player primary and
/// three-player secondary stack, for [`crate::pool::slate_catalog`].
pub fn slate_rules() -> SportRules {
    let mut rules = mlb_rules().with_stacks(
        StackRules::default()
            .with_primary(&[4], 1.0)
            .with_secondary(&[3], 1.0),
    );
    rules.salary_cap = 50000;
    rules
}
