//! # Solver Backends
//!
//! The capability interface every solving engine implements, its
//! object-safe erased form, and the registry that holds them.
//!
//! - `SolverBackend` is the typed contract: `is_available`, `translate`, `solve`
//! - `AnyBackend` is what the registry stores (`Arc<dyn AnyBackend>`)
//! - Backends are stateless with respect to any model
//!
//! ## Adapters
//!
//! - `smtlib`: drives an external SMT-LIB 2 solver process (z3 by default)
//! - `interval`: built-in bounds checker for single-variable linear bounds

mod interval;
mod registry;
mod smtlib;

pub use interval::{IntervalBackend, IntervalProblem};
pub use registry::BackendRegistry;
pub use smtlib::{SmtLibBackend, SmtLibScript, render_term};

use crate::model::ModelSnapshot;
use crate::{SolveStatus, SolverError, Witness};
use serde::{Deserialize, Serialize};
use std::any::Any;

// =============================================================================
// RAW RESULT
// =============================================================================

/// Unprocessed outcome of a backend `solve` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResult {
    pub status: SolveStatus,
    /// Variable assignments (SAT only).
    pub assignments: Witness,
    /// Model indices of conflicting items (UNSAT only, possibly empty).
    pub conflicting: Vec<usize>,
    /// Backend-supplied reason, mostly for UNKNOWN.
    pub reason: Option<String>,
}

impl RawResult {
    #[must_use]
    pub fn sat(assignments: Witness) -> Self {
        Self {
            status: SolveStatus::Sat,
            assignments,
            conflicting: Vec::new(),
            reason: None,
        }
    }

    #[must_use]
    pub fn unsat(mut conflicting: Vec<usize>) -> Self {
        conflicting.sort_unstable();
        conflicting.dedup();
        Self {
            status: SolveStatus::Unsat,
            assignments: Witness::new(),
            conflicting,
            reason: None,
        }
    }

    #[must_use]
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            status: SolveStatus::Unknown,
            assignments: Witness::new(),
            conflicting: Vec::new(),
            reason: Some(reason.into()),
        }
    }
}

// =============================================================================
// DESCRIPTOR
// =============================================================================

/// Name, availability and feature set of a registered backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDescriptor {
    pub name: String,
    pub available: bool,
    pub features: Vec<String>,
}

// =============================================================================
// BACKEND TRAITS
// =============================================================================

/// A pluggable solving engine.
///
/// `translate` turns a model snapshot into the engine's native form on the
/// caller's thread; `solve` may run on a worker thread and must honor
/// `timeout_ms` on its own when it can (the orchestrator abandons it otherwise).
pub trait SolverBackend: Send + Sync + 'static {
    /// The engine's input format.
    type Native: Send + 'static;

    /// Registry name.
    fn name(&self) -> &str;

    /// Whether the engine can be used right now.
    fn is_available(&self) -> bool;

    /// Optional capability tags.
    fn features(&self) -> &[&'static str] {
        &[]
    }

    /// Translate a model into the native form.
    fn translate(&self, model: &ModelSnapshot) -> Result<Self::Native, SolverError>;

    /// Solve a translated model.
    fn solve(&self, native: Self::Native, timeout_ms: u64) -> Result<RawResult, SolverError>;
}

/// A translated model whose concrete type only its backend knows.
pub type NativeForm = Box<dyn Any + Send>;

/// Object-safe view of a `SolverBackend`, as stored by the registry.
pub trait AnyBackend: Send + Sync {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    fn features(&self) -> Vec<String>;

    fn translate(&self, model: &ModelSnapshot) -> Result<NativeForm, SolverError>;

    fn solve(&self, native: NativeForm, timeout_ms: u64) -> Result<RawResult, SolverError>;

    /// Snapshot of name, availability and features.
    fn descriptor(&self) -> BackendDescriptor {
        BackendDescriptor {
            name: self.name().to_string(),
            available: self.is_available(),
            features: self.features(),
        }
    }
}

/// Wraps a typed backend so it can be stored as `dyn AnyBackend`.
pub(crate) struct Erased<B>(pub(crate) B);

impl<B: SolverBackend> AnyBackend for Erased<B> {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn is_available(&self) -> bool {
        self.0.is_available()
    }

    fn features(&self) -> Vec<String> {
        self.0.features().iter().map(|f| (*f).to_string()).collect()
    }

    fn translate(&self, model: &ModelSnapshot) -> Result<NativeForm, SolverError> {
        let native = self.0.translate(model)?;
        Ok(Box::new(native))
    }

    fn solve(&self, native: NativeForm, timeout_ms: u64) -> Result<RawResult, SolverError> {
        let native = native.downcast::<B::Native>().map_err(|_| {
            SolverError::Backend(format!(
                "backend '{}' received a model translated by another backend",
                self.0.name()
            ))
        })?;
        self.0.solve(*native, timeout_ms)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl SolverBackend for Echo {
        type Native = usize;

        fn name(&self) -> &str {
            "echo"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn features(&self) -> &[&'static str] {
            &["count"]
        }

        fn translate(&self, model: &ModelSnapshot) -> Result<usize, SolverError> {
            Ok(model.len())
        }

        fn solve(&self, native: usize, _timeout_ms: u64) -> Result<RawResult, SolverError> {
            let mut witness = Witness::new();
            witness.insert("items".to_string(), native.to_string());
            Ok(RawResult::sat(witness))
        }
    }

    #[test]
    fn erased_backend_round_trips_native_form() {
        let backend: Box<dyn AnyBackend> = Box::new(Erased(Echo));
        let native = backend
            .translate(&ModelSnapshot::default())
            .expect("translate");
        let raw = backend.solve(native, 10).expect("solve");
        assert_eq!(raw.assignments.get("items").map(String::as_str), Some("0"));
    }

    #[test]
    fn erased_backend_rejects_foreign_native_form() {
        let backend: Box<dyn AnyBackend> = Box::new(Erased(Echo));
        let foreign: NativeForm = Box::new("not a usize");
        let err = backend.solve(foreign, 10).expect_err("mismatch");
        assert_eq!(err.code(), "solver_error");
    }

    #[test]
    fn descriptor_reports_features() {
        let backend: Box<dyn AnyBackend> = Box::new(Erased(Echo));
        let descriptor = backend.descriptor();
        assert_eq!(descriptor.name, "echo");
        assert!(descriptor.available);
        assert_eq!(descriptor.features, vec!["count".to_string()]);
    }

    #[test]
    fn unsat_sorts_and_dedups_conflicts() {
        let raw = RawResult::unsat(vec![3, 1, 3]);
        assert_eq!(raw.conflicting, vec![1, 3]);
    }
}
