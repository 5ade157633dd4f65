//! Solve outcomes.

use std::fmt;

use serde::Serialize;

use crate::model::{BoolVar, Literal};
use crate::stats::SolveStats;

/// Terminal status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// Search exhausted with a solution: nothing better exists.
    Optimal,
    /// A solution was found before a limit was hit.
    Feasible,
    /// Search exhausted without a solution.
    Infeasible,
    /// A limit was hit before any solution was found.
    Unknown,
    /// The model itself is malformed.
    Invalid,
}

impl SolveStatus {
    /// Maps search completion and incumbent presence to a status.
    pub(crate) fn classify(exhausted: bool, has_solution: bool) -> Self {
        match (exhausted, has_solution) {
            (true, true) => SolveStatus::Optimal,
            (true, false) => SolveStatus::Infeasible,
            (false, true) => SolveStatus::Feasible,
            (false, false) => SolveStatus::Unknown,
        }
    }

    pub fn has_solution(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unknown => "UNKNOWN",
            SolveStatus::Invalid => "INVALID",
        };
        f.write_str(s)
    }
}

/// Complete variable assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    values: Vec<bool>,
}

impl Assignment {
    pub(crate) fn new(values: Vec<bool>) -> Self {
        Self { values }
    }

    pub fn value(&self, var: BoolVar) -> bool {
        self.values.get(var.index()).copied().unwrap_or(false)
    }

    pub fn holds(&self, lit: Literal) -> bool {
        lit.holds(self.value(lit.var()))
    }

    /// Variables set to true.
    pub fn true_vars(&self) -> impl Iterator<Item = BoolVar> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v)
            .map(|(i, _)| BoolVar(i as u32))
    }
}

/// Result of [`CpSolver::solve`](crate::CpSolver::solve).
#[derive(Debug, Clone)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub assignment: Option<Assignment>,
    pub objective: Option<i64>,
    pub stats: SolveStats,
    /// Portfolio worker that produced the assignment.
    pub worker: usize,
    /// Reason for an `Invalid` status.
    pub invalid_reason: Option<String>,
}

impl SolveResult {
    pub(crate) fn invalid(reason: String) -> Self {
        Self {
            status: SolveStatus::Invalid,
            assignment: None,
            objective: None,
            stats: SolveStats::default(),
            worker: 0,
            invalid_reason: Some(reason),
        }
    }
}
