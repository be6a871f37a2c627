//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the Veriform engine:
//! - Session identifiers (`SessionId`)
//! - Variable sorts and item kinds (`Sort`, `ItemKind`)
//! - Solving outcomes (`SolveStatus`, `SolverResult`, `Explanation`, `SolveTiming`)
//! - Error types (`SolverError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer or exact rational arithmetic only (no floating-point)
//! - Use `BTreeMap` for any keyed output so serialization order is stable

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// SESSION IDENTIFIER
// =============================================================================

/// Unique identifier for a session owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

// =============================================================================
// SORTS & ITEM KINDS
// =============================================================================

/// The sort (type) of a declared variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    /// Mathematical integers.
    Int,
    /// Exact real (rational) numbers.
    Real,
    /// Booleans.
    Bool,
}

impl Sort {
    /// Parse a sort name, case-insensitively.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "int" | "integer" => Some(Self::Int),
            "real" => Some(Self::Real),
            "bool" | "boolean" => Some(Self::Bool),
            _ => None,
        }
    }

    /// Whether values of this sort take part in arithmetic.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Real)
    }

    /// The SMT-LIB 2 sort symbol.
    #[must_use]
    pub const fn smtlib(self) -> &'static str {
        match self {
            Self::Int => "Int",
            Self::Real => "Real",
            Self::Bool => "Bool",
        }
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Int => "int",
            Self::Real => "real",
            Self::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Kind tag of a constraint item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Introduces a variable with a sort.
    Declaration,
    /// A boolean formula that must hold.
    Assertion,
}

// =============================================================================
// SOLVING OUTCOMES
// =============================================================================

/// The closed set of solving outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SolveStatus {
    /// The model has a satisfying assignment.
    Sat,
    /// The model has no satisfying assignment.
    Unsat,
    /// The backend could not decide.
    Unknown,
    /// The time bound was exceeded; the backend call was abandoned.
    Timeout,
    /// The backend failed while solving.
    Error,
}

impl SolveStatus {
    /// Upper-case label used in logs and messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sat => "SAT",
            Self::Unsat => "UNSAT",
            Self::Unknown => "UNKNOWN",
            Self::Timeout => "TIMEOUT",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A satisfying assignment: variable name to value text (`"10"`, `"5/2"`, `"true"`).
pub type Witness = BTreeMap<String, String>;

/// Why a result came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Explanation {
    /// Human-readable reason, if the backend gave one.
    pub message: Option<String>,
    /// Model indices of the items that conflict (UNSAT only).
    pub conflicting_items: Vec<usize>,
}

/// Timing and size metadata for one solve call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveTiming {
    /// Wall-clock time spent in the orchestrator, in milliseconds.
    pub elapsed_ms: u64,
    /// Number of items in the snapshot that was solved.
    pub item_count: usize,
    /// Name of the backend that handled the call.
    pub backend: String,
    /// The effective time bound.
    pub timeout_ms: u64,
}

/// Structured result of `solve_model`. Owned by the caller, never kept in the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverResult {
    pub status: SolveStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witness: Option<Witness>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
    pub timing: SolveTiming,
}

impl SolverResult {
    /// Whether the status is SAT.
    #[must_use]
    pub fn is_sat(&self) -> bool {
        self.status == SolveStatus::Sat
    }

    /// Conflicting item indices, empty unless UNSAT with a core.
    #[must_use]
    pub fn conflicting_items(&self) -> &[usize] {
        self.explanation
            .as_ref()
            .map_or(&[], |e| e.conflicting_items.as_slice())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors raised by the engine.
///
/// - Negative solving outcomes are statuses, not errors
/// - `Unsatisfiable` only appears when the caller asks for strict mode
/// - No error terminates a session; at most it aborts one call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    /// The backend gave up at the deadline.
    #[error("Solver timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Bad index, capacity exceeded, or another malformed mutation.
    #[error("Model build error: {0}")]
    ModelBuild(String),

    /// The model is unsatisfiable and strict mode was requested.
    #[error("Model is unsatisfiable (conflicting items: {conflicting:?})")]
    Unsatisfiable { conflicting: Vec<usize> },

    /// No usable backend for this call.
    #[error("Solver backend not available: {0}")]
    BackendNotAvailable(String),

    /// The content of an item is malformed or ill-sorted.
    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),

    /// Any other backend failure.
    #[error("Solver error: {0}")]
    Backend(String),
}

impl SolverError {
    /// Stable machine-readable code for structured error payloads.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "solver_timeout",
            Self::ModelBuild(_) => "model_build_error",
            Self::Unsatisfiable { .. } => "unsatisfiable",
            Self::BackendNotAvailable(_) => "backend_not_available",
            Self::InvalidConstraint(_) => "invalid_constraint",
            Self::Backend(_) => "solver_error",
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_parse_is_case_insensitive() {
        assert_eq!(Sort::parse("INT"), Some(Sort::Int));
        assert_eq!(Sort::parse("Real"), Some(Sort::Real));
        assert_eq!(Sort::parse("boolean"), Some(Sort::Bool));
        assert_eq!(Sort::parse("string"), None);
    }

    #[test]
    fn status_serializes_upper_case() {
        let json = serde_json::to_string(&SolveStatus::Unsat).expect("serialize");
        assert_eq!(json, "\"UNSAT\"");
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(SolverError::Timeout { timeout_ms: 1 }.code(), "solver_timeout");
        assert_eq!(SolverError::ModelBuild(String::new()).code(), "model_build_error");
        assert_eq!(
            SolverError::Unsatisfiable { conflicting: vec![] }.code(),
            "unsatisfiable"
        );
        assert_eq!(
            SolverError::BackendNotAvailable(String::new()).code(),
            "backend_not_available"
        );
        assert_eq!(
            SolverError::InvalidConstraint(String::new()).code(),
            "invalid_constraint"
        );
        assert_eq!(SolverError::Backend(String::new()).code(), "solver_error");
    }

    #[test]
    fn conflicting_items_defaults_to_empty() {
        let result = SolverResult {
            status: SolveStatus::Sat,
            witness: None,
            explanation: None,
            timing: SolveTiming {
                elapsed_ms: 0,
                item_count: 0,
                backend: "interval".to_string(),
                timeout_ms: 1,
            },
        };
        assert!(result.conflicting_items().is_empty());
        assert!(result.is_sat());
    }
}
