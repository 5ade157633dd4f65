//! RosterForge Solver Engine
//!
//! A pseudo-boolean branch-and-bound solver sized for lineup models:
//! - Boolean variables, literals and half-reified linear constraints
//! - Depth-first search with bounds propagation and objective pruning
//! - Time, node and shared-flag termination
//! - Portfolio parallelism over rayon with a deterministic merge

pub mod model;
mod search;
pub mod solver;
pub mod stats;
pub mod status;
pub mod termination;

pub use model::{BoolVar, LinearConstraint, LinearExpr, Literal, Model, ModelError, Relation};
pub use solver::{CpSolver, SearchConfig};
pub use stats::SolveStats;
pub use status::{Assignment, SolveResult, SolveStatus};
