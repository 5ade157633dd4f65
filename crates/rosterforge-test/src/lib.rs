//! Shared test fixtures for RosterForge crates.
//!
//! This crate provides player pools, sport rules and lineup helpers for
//! testing. It does NOT depend on the solver or lineup crates so those can
//! use it as a dev-dependency.
//!
//! - [`pool`] - Player pools (a 20-player MLB slate, a small stacking slate
//!   and a 120-player main slate)
//! - [`rules`] - Sport rules matching the pools
//! - [`lineups`] - Hand-built lineups for late-swap tests
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! rosterforge-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```
//! use rosterforge_test::pool::mlb_catalog;
//! use rosterforge_test::rules::mlb_rules;
//!
//! let catalog = mlb_catalog();
//! let rules = mlb_rules();
//! assert_eq!(catalog.len(), 20);
//! assert_eq!(rules.lineup_size(), 9);
//! ```

pub mod lineups;
pub mod pool;
pub mod rules;

pub use lineups::{lineup_from_ids, nyy_stack_lineup};
pub use pool::{mlb_catalog, mlb_players, slate_catalog, slate_players, stack_catalog, stack_players};
pub use rules::{mlb_rules, mlb_stacked_rules, slate_rules, stack_rules};
