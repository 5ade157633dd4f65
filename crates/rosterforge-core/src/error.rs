//! Error types for RosterForge

use thiserror::Error;

/// Main error type for RosterForge operations.
///
/// Only [`RosterError::Configuration`] is fatal to a run. Every other
/// variant is recoverable at the generation-loop or late-swap boundary,
/// where it is turned into accounting instead of escaping to the caller.
#[derive(Debug, Error)]
pub enum RosterError {
    /// Impossible slot coverage, contradictory stack rules, or a rule that
    /// names a player missing from the catalog.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The solver proved that no lineup satisfies the current constraints.
    #[error("Infeasible model: {0}")]
    InfeasibleModel(String),

    /// The solver hit its time budget without finding a lineup.
    #[error("Solver timed out after {elapsed_ms}ms")]
    SolverTimeout { elapsed_ms: u64 },

    /// Player data with missing or malformed required fields.
    #[error("Data quality error: {0}")]
    DataQuality(String),

    /// Every late-swap repair strategy failed for a lineup.
    #[error("Unrepairable lineup {lineup}: {reason}")]
    UnrepairableLineup { lineup: usize, reason: String },

    /// Failure reading or writing the lineup interchange format.
    #[error("Interchange error: {0}")]
    Interchange(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RosterError {
    /// Returns true when the error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RosterError::Configuration(_))
    }

    pub fn config(msg: impl Into<String>) -> Self {
        RosterError::Configuration(msg.into())
    }
}

/// Result type alias for RosterForge operations
pub type Result<T> = std::result::Result<T, RosterError>;
