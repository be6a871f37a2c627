//! # Session Module
//!
//! A session is one caller's scope: it owns exactly one model.
//!
//! - Mutations and snapshots are serialized by the session mutex
//! - Solving runs outside the lock, on a snapshot
//! - Sessions never share state; the manager only maps ids to sessions

use crate::model::{AddOutcome, ConstraintItem, ModelSnapshot, ModelStore};
use crate::orchestrator::{SolveOptions, SolveOrchestrator};
use crate::{SessionId, SolveStatus, SolverError, SolverResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Lifecycle phase of a session's model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelPhase {
    /// Fresh or just cleared.
    Empty,
    /// At least one mutation since the last clear.
    Building,
}

/// The last solve that completed against this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveRecord {
    /// Model revision the solve ran against.
    pub revision: u64,
    pub status: SolveStatus,
}

#[derive(Debug)]
struct SessionState {
    store: ModelStore,
    phase: ModelPhase,
    last_solve: Option<SolveRecord>,
}

// =============================================================================
// SESSION
// =============================================================================

/// One caller's model and its lifecycle.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    state: Mutex<SessionState>,
}

impl Session {
    #[must_use]
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            state: Mutex::new(SessionState {
                store: ModelStore::new(),
                phase: ModelPhase::Empty,
                last_solve: None,
            }),
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // every mutation is all-or-nothing, so a poisoned state is still consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn phase(&self) -> ModelPhase {
        self.lock().phase
    }

    #[must_use]
    pub fn last_solve(&self) -> Option<SolveRecord> {
        self.lock().last_solve
    }

    /// Whether the last solve ran against the current model.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        let state = self.lock();
        state
            .last_solve
            .is_some_and(|r| r.revision == state.store.revision())
    }

    /// Reset the model to empty. Returns the new count (always 0).
    pub fn clear_model(&self) -> usize {
        let mut state = self.lock();
        state.store.clear_model();
        state.phase = ModelPhase::Empty;
        state.store.len()
    }

    pub fn add_item(
        &self,
        item: ConstraintItem,
        index: Option<usize>,
    ) -> Result<AddOutcome, SolverError> {
        let mut state = self.lock();
        let outcome = state.store.add_item(item, index)?;
        state.phase = ModelPhase::Building;
        Ok(outcome)
    }

    pub fn delete_item(&self, index: usize) -> Result<usize, SolverError> {
        let mut state = self.lock();
        let count = state.store.delete_item(index)?;
        state.phase = ModelPhase::Building;
        Ok(count)
    }

    pub fn replace_item(&self, index: usize, item: ConstraintItem) -> Result<usize, SolverError> {
        let mut state = self.lock();
        let index = state.store.replace_item(index, item)?;
        state.phase = ModelPhase::Building;
        Ok(index)
    }

    /// Consistent snapshot of the current model.
    #[must_use]
    pub fn get_model(&self) -> ModelSnapshot {
        self.lock().store.get_model()
    }

    /// Solve the current model with `orchestrator`.
    ///
    /// The lock is held only to take the snapshot and to record the outcome.
    pub fn solve_with(
        &self,
        orchestrator: &SolveOrchestrator,
        options: &SolveOptions,
    ) -> Result<SolverResult, SolverError> {
        let snapshot = self.get_model();
        let outcome = orchestrator.solve_model(&snapshot, options);

        let status = match &outcome {
            Ok(result) => Some(result.status),
            Err(SolverError::Unsatisfiable { .. }) => Some(SolveStatus::Unsat),
            Err(_) => None,
        };
        if let Some(status) = status {
            let mut state = self.lock();
            if state.store.revision() == snapshot.revision() {
                state.last_solve = Some(SolveRecord {
                    revision: snapshot.revision(),
                    status,
                });
            }
        }
        outcome
    }
}

// =============================================================================
// SESSION MANAGER
// =============================================================================

/// Id-keyed registry of live sessions.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: Mutex<BTreeMap<SessionId, Arc<Session>>>,
    next_id: AtomicU64,
}

impl SessionManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, BTreeMap<SessionId, Arc<Session>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a session with a fresh, empty model.
    pub fn create(&self) -> Arc<Session> {
        let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed).saturating_add(1));
        let session = Arc::new(Session::new(id));
        self.map().insert(id, Arc::clone(&session));
        tracing::debug!(session = %id, "session created");
        session
    }

    #[must_use]
    pub fn get(&self, id: SessionId) -> Option<Arc<Session>> {
        self.map().get(&id).cloned()
    }

    /// Drop a session. Returns whether it existed.
    pub fn destroy(&self, id: SessionId) -> bool {
        let removed = self.map().remove(&id).is_some();
        if removed {
            tracing::debug!(session = %id, "session destroyed");
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
