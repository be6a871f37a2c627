//! # veriform-core
//!
//! Session-scoped constraint models and the solvers behind them.
//!
//! A caller builds a model item by item (declarations and assertions),
//! inspects it, and asks a pluggable backend whether it is satisfiable,
//! receiving a witness, a conflict explanation, or a bounded-time verdict.
//!
//! ## Layout
//!
//! - `model`: the ordered item store and its snapshots
//! - `backend`: the `SolverBackend` trait, the registry, `smtlib` and `interval`
//! - `orchestrator`: backend selection and time-bounded solving
//! - `session`: per-caller model ownership
//! - `facade`: the six-operation tool surface with structured errors
//! - `extract` / `isc`: numeric constraints from prose and the advisory check
//! - `system`: backend status and the smoke check
//!
//! ## Constraints
//!
//! - No async and no network: backends run on plain threads or child processes
//! - Numbers are exact rationals; there is no floating point in the solving path
//! - UNSAT, TIMEOUT and ERROR are statuses; errors are for malformed input and
//!   missing backends

// =============================================================================
// MODULES
// =============================================================================

pub mod backend;
pub mod config;
pub mod expr;
pub mod extract;
pub mod facade;
pub mod isc;
pub mod model;
pub mod orchestrator;
pub mod primitives;
pub mod session;
pub mod system;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    Explanation, ItemKind, SessionId, SolveStatus, SolveTiming, SolverError, SolverResult, Sort,
    Witness,
};

// =============================================================================
// RE-EXPORTS: Model and Solving
// =============================================================================

pub use backend::{
    AnyBackend, BackendDescriptor, BackendRegistry, IntervalBackend, RawResult, SmtLibBackend,
    SolverBackend,
};
pub use config::{SmtLibConfig, SolverConfig};
pub use expr::{CmpOp, Expr};
pub use model::{AddOutcome, ConstraintItem, ItemSpec, ItemView, ModelSnapshot, ModelStore};
pub use orchestrator::{SolveOptions, SolveOrchestrator};
pub use session::{ModelPhase, Session, SessionManager};

// =============================================================================
// RE-EXPORTS: Tool Surface
// =============================================================================

pub use facade::{TOOL_NAMES, ToolError, ToolFacade, ToolReply, ToolResult};

// =============================================================================
// RE-EXPORTS: Criteria Check and System
// =============================================================================

pub use extract::{
    ConstraintExtractor, Extraction, HeuristicExtractor, NumericConstraint,
    extract_numeric_constraints,
};
pub use isc::{Consistency, IscVerificationResult, IscVerifier};
pub use system::{SmokeCheck, SystemStatus, smoke_check};
