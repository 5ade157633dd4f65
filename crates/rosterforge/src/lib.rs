//! RosterForge - DFS lineup optimization in Rust
//!
//! Builds many salary-capped, stack-aware lineups from a projected player
//! pool, then repairs them when players are scratched after lock.
//!
//! # Example
//!
//! ```rust
//! use rosterforge::prelude::*;
//! use rosterforge_test::{stack_catalog, stack_rules};
//!
//! let config = OptimizerConfig::new(stack_rules())
//!     .with_lineup_count(2)
//!     .with_similarity_threshold(4)
//!     .with_workers(1);
//!
//! let report = rosterforge::generate_lineups(&config, &stack_catalog()).unwrap();
//! assert_eq!(report.lineups.len(), 2);
//!
//! let mut csv = Vec::new();
//! rosterforge::export::write_lineups(&mut csv, &config.sport, &report.lineups).unwrap();
//! ```

// Domain types
pub use rosterforge_core::{
    DataQualityReport, ExclusionReason, Lineup, LineupEntry, LineupRow, Player, PlayerCatalog, PlayerId,
    PlayerRecord, Result, RosterError, RosterSlot, SlotInstance, StackKey, StackRole,
};

// Configuration
pub use rosterforge_config::{
    ConfigError, GenerationConfig, LateSwapConfig, MarkerStackRule, OptimizerConfig, RandomnessConfig, RepairStage,
    SolverSettings, SportRules, StackGrouping, StackRules, TeamLimit, UnrepairablePolicy, WorkerCount,
};

// Generation
pub use rosterforge_lineup::{
    ExposureCounter, ExposureScope, GenerationReport, LineupGenerator, LineupModelBuilder, LineupSolver,
    LineupValidator, SolveOutcome, StopReason, ValidationProfile,
};

// Late swap
pub use rosterforge_swap::{
    LateSwapEngine, LateSwapReport, RepairOutcome, RepairStatus, RepairStrategy, SwapAnalysis, SwapAnalyzer, SwapRecord,
    SwapWarning, SwapVerdict,
};

// Search statistics
pub use rosterforge_solver::{SolveStats, SolveStatus};

#[cfg(feature = "console")]
pub mod console;
pub mod export;

mod run;
pub use run::{generate_files, generate_lineups, late_swap, late_swap_files};

pub mod prelude {
    pub use super::{Lineup, Player, PlayerCatalog, PlayerId, RosterError, StackKey};
    pub use super::{LateSwapConfig, OptimizerConfig, RepairStage, SportRules, UnrepairablePolicy};
    pub use super::{GenerationReport, LateSwapReport, RepairStatus, StopReason};
}
