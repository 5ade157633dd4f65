//! RosterForge Lineup - model building, solving and generation
//!
//! This crate turns a player catalog and sport rules into lineups:
//! - [`LineupModelBuilder`] encodes one lineup as a boolean model
//! - [`LineupSolver`] solves it with a single retry on inconclusive results
//! - [`LineupGenerator`] runs the multi-lineup loop with exposure caps and
//!   diversity constraints
//! - [`LineupValidator`] re-checks finished lineups without the solver
//!
//! # Example
//!
//! ```
//! use rosterforge_config::SolverSettings;
//! use rosterforge_lineup::{LineupModelBuilder, LineupSolver};
//! use rosterforge_test::{stack_catalog, stack_rules};
//!
//! let rules = stack_rules();
//! let catalog = stack_catalog();
//! let model = LineupModelBuilder::new(&rules, &catalog).build().unwrap();
//! let outcome = LineupSolver::new(&SolverSettings::default()).solve(&model).unwrap();
//! assert_eq!(outcome.lineup().unwrap().len(), 5);
//! ```

pub mod builder;
pub mod exposure;
pub mod generation;
pub mod randomness;
pub mod solve;
pub mod stacks;
pub mod validation;

pub use builder::{resolve_player, Exclusions, LineupModel, LineupModelBuilder, ObjectiveWeights, PROJECTION_SCALE};
pub use exposure::{ExposureCaps, ExposureCounter, ExposureEntry, ExposureSnapshot, Tracked};
pub use generation::{AttemptFailure, ExposureScope, GenerationReport, LineupGenerator, StopReason};
pub use randomness::ProjectionRandomizer;
pub use solve::{LineupSolver, SolveOutcome};
pub use stacks::{derive_stacks, stack_counts, stack_key};
pub use validation::{LineupValidator, ValidationProfile, Violation};
