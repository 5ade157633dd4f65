//! Roster slot definitions.

use serde::{Deserialize, Serialize};

use crate::player::Player;

/// A named position bucket, e.g. `"C/1B"` taking catchers and first basemen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSlot {
    pub name: String,
    pub count: u32,
    /// Player positions that may fill this slot.
    pub eligible: Vec<String>,
}

impl RosterSlot {
    pub fn new(name: impl Into<String>, count: u32, eligible: &[&str]) -> Self {
        Self {
            name: name.into(),
            count,
            eligible: eligible.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Returns true if the player's positions intersect the eligible set.
    pub fn accepts(&self, player: &Player) -> bool {
        player.plays_any(&self.eligible)
    }

    /// Expands a list of slots into ordered slot instances.
    ///
    /// ```
    /// use rosterforge_core::RosterSlot;
    ///
    /// let slots = vec![
    ///     RosterSlot::new("P", 1, &["P"]),
    ///     RosterSlot::new("OF", 3, &["OF"]),
    /// ];
    /// let names: Vec<_> = RosterSlot::instances(&slots).map(|s| s.name).collect();
    /// assert_eq!(names, ["P", "OF", "OF", "OF"]);
    /// ```
    pub fn instances(slots: &[RosterSlot]) -> impl Iterator<Item = SlotInstance> + '_ {
        slots.iter().enumerate().flat_map(|(slot_index, slot)| {
            (0..slot.count).map(move |ordinal| SlotInstance {
                slot_index,
                ordinal,
                name: slot.name.clone(),
            })
        })
    }
}

/// One concrete seat of a slot (the second `OF`, say).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotInstance {
    /// Index into the slot definition list.
    pub slot_index: usize,
    /// Position among instances of the same slot.
    pub ordinal: u32,
    pub name: String,
}
