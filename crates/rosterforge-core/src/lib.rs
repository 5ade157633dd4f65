//! RosterForge Core - data model for daily-fantasy lineup optimization
//!
//! This crate provides the types shared by every other RosterForge crate:
//! - Players and the immutable player catalog
//! - Roster slots and slot instances
//! - Lineups, stack identities and the interchange row shape
//! - The error taxonomy used across model building, solving and late swap

pub mod catalog;
pub mod error;
pub mod lineup;
pub mod player;
pub mod roster;

#[cfg(test)]
mod lineup_tests;

pub use catalog::{DataQualityReport, ExclusionReason, PlayerCatalog};
pub use error::{Result, RosterError};
pub use lineup::{Lineup, LineupEntry, LineupRow, StackKey, StackRole};
pub use player::{Player, PlayerId, PlayerRecord};
pub use roster::{RosterSlot, SlotInstance};
