//! RosterForge Late Swap
//!
//! Repairs already-built lineups after players are scratched:
//! - [`SwapAnalyzer`] finds ineligible players and ranks replacements
//! - [`LateSwapEngine`] runs the strategy chain (multi-swap, stack-preserving,
//!   greedy) per lineup, in parallel across lineups
//!
//! Players on locked teams are never brought in as replacements.

pub mod analyzer;
pub mod engine;
pub mod greedy;
pub mod multi_swap;
pub mod stack_preserving;
pub mod strategy;

pub use analyzer::{InvalidSlot, SwapAnalysis, SwapAnalyzer, SwapVerdict};
pub use engine::{LateSwapEngine, LateSwapReport, RepairOutcome, RepairStatus, SwapRecord, SwapWarning};
pub use greedy::GreedyStrategy;
pub use multi_swap::MultiSwapStrategy;
pub use stack_preserving::StackPreservingStrategy;
pub use strategy::{RepairContext, RepairStrategy, StrategyFailure};
