//! # Solve Orchestrator
//!
//! Runs one solve: resolve the backend, translate the snapshot, solve on a
//! worker thread under a time bound, and shape the outcome.
//!
//! The orchestrator never sees a live model, only a `ModelSnapshot`.
//! On expiry the worker thread is abandoned and the result is TIMEOUT.

use crate::backend::{AnyBackend, BackendRegistry, RawResult};
use crate::config::SolverConfig;
use crate::model::ModelSnapshot;
use crate::{Explanation, SolveStatus, SolveTiming, SolverError, SolverResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// Per-call solve options. Unset fields fall back to the configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolveOptions {
    /// Time bound in milliseconds, clamped into the accepted range.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Backend name.
    #[serde(default)]
    pub backend: Option<String>,
    /// Raise UNSAT as `SolverError::Unsatisfiable`.
    #[serde(default)]
    pub strict: Option<bool>,
}

impl SolveOptions {
    #[must_use]
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    #[must_use]
    pub fn with_backend(mut self, name: &str) -> Self {
        self.backend = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }
}

/// Stateless solve pipeline over a backend registry.
#[derive(Debug, Clone)]
pub struct SolveOrchestrator {
    registry: Arc<BackendRegistry>,
    config: SolverConfig,
}

impl SolveOrchestrator {
    #[must_use]
    pub fn new(registry: BackendRegistry, config: SolverConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
        }
    }

    /// Orchestrator over the built-in backends.
    #[must_use]
    pub fn from_config(config: SolverConfig) -> Self {
        let registry = BackendRegistry::with_defaults(&config);
        Self::new(registry, config)
    }

    #[must_use]
    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve a model snapshot.
    ///
    /// # Errors
    ///
    /// - `BackendNotAvailable` if no usable backend matches the request
    /// - `InvalidConstraint` if the backend cannot translate the model
    /// - `Unsatisfiable` if the model is UNSAT and strict mode is on
    ///
    /// Timeouts and backend failures are statuses (`TIMEOUT`, `ERROR`), not errors.
    pub fn solve_model(
        &self,
        model: &ModelSnapshot,
        options: &SolveOptions,
    ) -> Result<SolverResult, SolverError> {
        let timeout_ms = self.config.effective_timeout(options.timeout_ms);
        let strict = options.strict.unwrap_or(self.config.strict);
        let requested = options
            .backend
            .as_deref()
            .or(self.config.default_backend.as_deref());
        let backend = self.registry.select(requested)?;

        let span = tracing::debug_span!(
            "solve",
            backend = backend.name(),
            items = model.len(),
            revision = model.revision(),
            timeout_ms
        );
        let _entered = span.enter();
        let started = Instant::now();

        let native = backend.translate(model).map_err(|e| match e {
            SolverError::InvalidConstraint(_) | SolverError::BackendNotAvailable(_) => e,
            other => SolverError::InvalidConstraint(other.to_string()),
        })?;

        let outcome = run_detached(&backend, native, timeout_ms);
        let timing = SolveTiming {
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            item_count: model.len(),
            backend: backend.name().to_string(),
            timeout_ms,
        };

        let result = match outcome {
            Ok(Ok(raw)) => shape(raw, timing),
            Ok(Err(SolverError::Timeout { .. })) | Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    backend = %timing.backend,
                    timeout_ms,
                    "solve exceeded its time bound, worker abandoned"
                );
                failure(
                    SolveStatus::Timeout,
                    format!("no answer within {timeout_ms} ms"),
                    timing,
                )
            }
            Ok(Err(e @ SolverError::BackendNotAvailable(_))) => return Err(e),
            Ok(Err(e)) => {
                tracing::warn!(backend = %timing.backend, error = %e, "backend failed");
                failure(SolveStatus::Error, e.to_string(), timing)
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!(backend = %timing.backend, "solver worker exited without a result");
                failure(
                    SolveStatus::Error,
                    "solver worker exited without a result".to_string(),
                    timing,
                )
            }
        };

        tracing::info!(
            status = %result.status,
            elapsed_ms = result.timing.elapsed_ms,
            backend = %result.timing.backend,
            "solve finished"
        );

        if strict && result.status == SolveStatus::Unsat {
            return Err(SolverError::Unsatisfiable {
                conflicting: result.conflicting_items().to_vec(),
            });
        }
        Ok(result)
    }
}

/// Solve on a fresh thread and wait at most `timeout_ms` for the answer.
fn run_detached(
    backend: &Arc<dyn AnyBackend>,
    native: crate::backend::NativeForm,
    timeout_ms: u64,
) -> Result<Result<RawResult, SolverError>, RecvTimeoutError> {
    let (tx, rx) = mpsc::channel();
    let worker = Arc::clone(backend);
    let spawned = thread::Builder::new()
        .name(format!("veriform-solve-{}", backend.name()))
        .spawn(move || {
            // the receiver is gone once the caller stopped waiting
            let _ = tx.send(worker.solve(native, timeout_ms));
        });
    if let Err(e) = spawned {
        return Ok(Err(SolverError::Backend(format!(
            "failed to start solver thread: {e}"
        ))));
    }
    rx.recv_timeout(Duration::from_millis(timeout_ms))
}

fn shape(raw: RawResult, timing: SolveTiming) -> SolverResult {
    match raw.status {
        SolveStatus::Sat => SolverResult {
            status: SolveStatus::Sat,
            witness: Some(raw.assignments),
            explanation: None,
            timing,
        },
        SolveStatus::Unsat => SolverResult {
            status: SolveStatus::Unsat,
            witness: None,
            explanation: Some(Explanation {
                message: Some(
                    raw.reason
                        .unwrap_or_else(|| "constraints are unsatisfiable".to_string()),
                ),
                conflicting_items: raw.conflicting,
            }),
            timing,
        },
        status => failure(
            status,
            raw.reason
                .unwrap_or_else(|| format!("backend returned {status}")),
            timing,
        ),
    }
}

fn failure(status: SolveStatus, message: String, timing: SolveTiming) -> SolverResult {
    SolverResult {
        status,
        witness: None,
        explanation: Some(Explanation {
            message: Some(message),
            conflicting_items: Vec::new(),
        }),
        timing,
    }
}

// =============================================================================
// TESTS
// =============================================================================
