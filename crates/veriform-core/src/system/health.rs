//! # Health
//!
//! `SystemStatus` is a pure snapshot of the registry. `smoke_check` runs one
//! fixed solve end to end and reports the outcome instead of raising it.

use crate::backend::{BackendDescriptor, BackendRegistry};
use crate::model::{ConstraintItem, ModelStore};
use crate::orchestrator::{SolveOptions, SolveOrchestrator};
use crate::{SolveStatus, SolverError};
use serde::{Deserialize, Serialize};
use std::time::Instant;

// =============================================================================
// SYSTEM STATUS
// =============================================================================

/// Version and backend availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    /// Backend a solve without an explicit choice would use.
    pub default_backend: Option<String>,
    pub any_available: bool,
    pub backends: Vec<BackendDescriptor>,
}

impl SystemStatus {
    #[must_use]
    pub fn collect(registry: &BackendRegistry) -> Self {
        let backends = registry.list();
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            default_backend: registry.default_name(),
            any_available: backends.iter().any(|b| b.available),
            backends,
        }
    }
}

// =============================================================================
// SMOKE CHECK
// =============================================================================

const SMOKE_ITEMS: [&str; 2] = ["x: int", "x >= 1 and x <= 1"];

/// Outcome of `smoke_check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmokeCheck {
    /// Backend that answered, if one was selected.
    pub backend: Option<String>,
    pub status: Option<SolveStatus>,
    pub passed: bool,
    pub elapsed_ms: u64,
    pub message: String,
}

/// Solve `x: int`, `x >= 1 and x <= 1` and expect SAT with `x = 1`.
pub fn smoke_check(orchestrator: &SolveOrchestrator) -> SmokeCheck {
    let started = Instant::now();
    let outcome = smoke_model().and_then(|store| {
        orchestrator.solve_model(&store.get_model(), &SolveOptions::default().with_strict(false))
    });
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let check = match outcome {
        Ok(result) => {
            let witness = result
                .witness
                .as_ref()
                .and_then(|w| w.get("x"))
                .map(String::as_str);
            let passed = result.is_sat() && witness == Some("1");
            let message = if passed {
                "solver answered SAT with x = 1".to_string()
            } else {
                format!(
                    "expected SAT with x = 1, got {} with x = {}",
                    result.status,
                    witness.unwrap_or("?")
                )
            };
            SmokeCheck {
                backend: Some(result.timing.backend.clone()),
                status: Some(result.status),
                passed,
                elapsed_ms,
                message,
            }
        }
        Err(e) => SmokeCheck {
            backend: orchestrator.registry().default_name(),
            status: None,
            passed: false,
            elapsed_ms,
            message: e.to_string(),
        },
    };

    if check.passed {
        tracing::info!(backend = ?check.backend, elapsed_ms, "smoke check passed");
    } else {
        tracing::warn!(backend = ?check.backend, message = %check.message, "smoke check failed");
    }
    check
}

fn smoke_model() -> Result<ModelStore, SolverError> {
    let mut store = ModelStore::new();
    for source in SMOKE_ITEMS {
        store.add_item(ConstraintItem::parse(source)?, None)?;
    }
    Ok(store)
}

// =============================================================================
// TESTS
// =============================================================================
