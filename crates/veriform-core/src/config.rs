//! # Solver Configuration
//!
//! Serde-deserializable settings for backend selection and time bounds.
//! The host decides where they come from (TOML file, environment); the
//! engine only consumes the parsed value.

use crate::primitives::{DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS};
use serde::{Deserialize, Serialize};

/// Settings for the external SMT-LIB process backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtLibConfig {
    /// Solver executable, looked up on `PATH` unless absolute.
    pub command: String,
    /// Arguments that make the solver read an SMT-LIB 2 script from stdin.
    pub args: Vec<String>,
    /// Arguments for the availability probe.
    pub version_args: Vec<String>,
}

impl Default for SmtLibConfig {
    fn default() -> Self {
        Self {
            command: "z3".to_string(),
            args: vec!["-in".to_string(), "-smt2".to_string()],
            version_args: vec!["--version".to_string()],
        }
    }
}

/// Engine-wide solver settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Backend used when a call names none. `None` picks the first available one.
    pub default_backend: Option<String>,
    /// Time bound applied when a call names none.
    pub default_timeout_ms: u64,
    /// Upper bound for any requested time bound.
    pub max_timeout_ms: u64,
    /// Whether UNSAT is raised as an error by default.
    pub strict: bool,
    /// External process backend settings.
    pub smtlib: SmtLibConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            default_backend: None,
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_timeout_ms: MAX_TIMEOUT_MS,
            strict: false,
            smtlib: SmtLibConfig::default(),
        }
    }
}

impl SolverConfig {
    /// Effective time bound for a request.
    ///
    /// Falls back to `default_timeout_ms`, then clamps into
    /// `[MIN_TIMEOUT_MS, min(max_timeout_ms, MAX_TIMEOUT_MS)]`.
    #[must_use]
    pub fn effective_timeout(&self, requested: Option<u64>) -> u64 {
        let ceiling = self.max_timeout_ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS);
        requested
            .unwrap_or(self.default_timeout_ms)
            .clamp(MIN_TIMEOUT_MS, ceiling)
    }
}
