//! # Scenario Tier Tests (T0-T4)
//!
//! End-to-end behavior through the session and tool surface.
//!
//! ## Tiers
//! - T0: Model Integrity
//! - T1: Solving Outcomes
//! - T2: Bounded Solving and Missing Backends
//! - T3: Criteria Consistency
//! - T4: Concurrent Tool Calls on One Session

use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use veriform_core::{
    BackendRegistry, IntervalBackend, ModelSnapshot, RawResult, Session, SessionId, SolveOptions,
    SolveOrchestrator, SolveStatus, SolverBackend, SolverConfig, SolverError, ToolFacade,
};

fn facade_with(registry: BackendRegistry) -> ToolFacade {
    ToolFacade::new(Arc::new(SolveOrchestrator::new(
        registry,
        SolverConfig::default(),
    )))
}

fn interval_facade() -> ToolFacade {
    let mut registry = BackendRegistry::new();
    registry.register(IntervalBackend::new());
    facade_with(registry)
}

fn add(facade: &ToolFacade, session: &Session, item: &str) {
    let reply = facade.dispatch(session, "add_item", json!({ "item": item }));
    assert!(reply.ok, "add_item failed: {:?}", reply.error);
}

fn sources(session: &Session) -> Vec<String> {
    session
        .get_model()
        .items()
        .iter()
        .map(|i| i.source().to_string())
        .collect()
}

// =============================================================================
// TIER T0: MODEL INTEGRITY
// =============================================================================

mod t0_model_integrity {
    use super::*;

    /// T0.1: A malformed item is rejected and the model is untouched.
    #[test]
    fn malformed_item_rejected() {
        let facade = interval_facade();
        let session = Session::new(SessionId(1));
        add(&facade, &session, "x >= 1");

        let reply = facade.dispatch(
            &session,
            "add_item",
            json!({ "item": "not a valid expression###" }),
        );
        assert!(!reply.ok);
        assert_eq!(
            reply.error.map(|e| e.code),
            Some("invalid_constraint".to_string())
        );
        assert_eq!(sources(&session), vec!["x >= 1".to_string()]);
    }

    /// T0.2: Out-of-range indices are build errors, not crashes.
    #[test]
    fn bad_index_is_model_build_error() {
        let facade = interval_facade();
        let session = Session::new(SessionId(1));

        let reply = facade.dispatch(&session, "delete_item", json!({ "index": 3 }));
        assert_eq!(
            reply.error.map(|e| e.code),
            Some("model_build_error".to_string())
        );
        assert!(session.get_model().is_empty());
    }

    /// T0.3: get_model reports items in order with their indices.
    #[test]
    fn get_model_lists_items_in_order() {
        let facade = interval_facade();
        let session = Session::new(SessionId(1));
        add(&facade, &session, "x: int");
        add(&facade, &session, "x > 2");

        let reply = facade.dispatch(&session, "get_model", json!({}));
        let result = reply.result.expect("result");
        assert_eq!(result["count"], json!(2));
        assert_eq!(result["items"][0]["source"], json!("x: int"));
        assert_eq!(result["items"][1]["index"], json!(1));
    }
}

// =============================================================================
// TIER T1: SOLVING OUTCOMES
// =============================================================================

mod t1_solving_outcomes {
    use super::*;

    /// T1.1: Contradictory bounds are UNSAT and the model is kept as is.
    #[test]
    fn contradictory_bounds_unsat() {
        let facade = interval_facade();
        let session = Session::new(SessionId(1));
        add(&facade, &session, "x >= 10");
        add(&facade, &session, "x < 5");

        let result = facade
            .solve_model(&session, SolveOptions::default())
            .expect("solve");
        assert_eq!(result.status, SolveStatus::Unsat);
        assert_eq!(result.conflicting_items(), &[0, 1]);
        assert_eq!(
            sources(&session),
            vec!["x >= 10".to_string(), "x < 5".to_string()]
        );
    }

    /// T1.2: A satisfiable model returns a witness.
    #[test]
    fn satisfiable_model_has_witness() {
        let facade = interval_facade();
        let session = Session::new(SessionId(1));
        add(&facade, &session, "x: int");
        add(&facade, &session, "x > 4 and x < 6");

        let result = facade
            .solve_model(&session, SolveOptions::default())
            .expect("solve");
        assert!(result.is_sat());
        assert_eq!(
            result.witness.and_then(|w| w.get("x").cloned()),
            Some("5".to_string())
        );
    }

    /// T1.3: Solving the same model twice gives the same answer.
    #[test]
    fn repeated_solve_is_stable() {
        let facade = interval_facade();
        let session = Session::new(SessionId(1));
        add(&facade, &session, "y >= 1");
        add(&facade, &session, "y <= 3");

        let first = facade
            .solve_model(&session, SolveOptions::default())
            .expect("solve");
        let second = facade
            .solve_model(&session, SolveOptions::default())
            .expect("solve");
        assert_eq!(first.status, second.status);
        assert_eq!(first.witness, second.witness);
    }

    /// T1.4: Strict mode turns UNSAT into a structured error.
    #[test]
    fn strict_unsat_is_error() {
        let facade = interval_facade();
        let session = Session::new(SessionId(1));
        add(&facade, &session, "x >= 10");
        add(&facade, &session, "x < 5");

        let reply = facade.dispatch(&session, "solve_model", json!({ "strict": true }));
        assert!(!reply.ok);
        assert_eq!(
            reply.error.map(|e| e.code),
            Some("unsatisfiable".to_string())
        );
        assert_eq!(session.get_model().len(), 2);
    }
}

// =============================================================================
// TIER T2: BOUNDED SOLVING AND MISSING BACKENDS
// =============================================================================

mod t2_bounded_solving {
    use super::*;

    struct Sleepy;

    impl SolverBackend for Sleepy {
        type Native = ();

        fn name(&self) -> &str {
            "sleepy"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn translate(&self, _model: &ModelSnapshot) -> Result<(), SolverError> {
            Ok(())
        }

        fn solve(&self, _native: (), _timeout_ms: u64) -> Result<RawResult, SolverError> {
            thread::sleep(Duration::from_secs(2));
            Ok(RawResult::unknown("woke up"))
        }
    }

    /// T2.1: A slow backend yields TIMEOUT promptly and leaves the model intact.
    #[test]
    fn slow_backend_times_out() {
        let mut registry = BackendRegistry::new();
        registry.register(Sleepy);
        let facade = facade_with(registry);
        let session = Session::new(SessionId(1));
        add(&facade, &session, "x > 0");

        let started = Instant::now();
        let result = facade
            .solve_model(&session, SolveOptions::default().with_timeout(1))
            .expect("solve");
        assert_eq!(result.status, SolveStatus::Timeout);
        assert_eq!(result.timing.timeout_ms, 1);
        assert!(started.elapsed() < Duration::from_millis(500));
        assert_eq!(sources(&session), vec!["x > 0".to_string()]);
    }

    /// T2.2: With no backend, solving fails cleanly and the model is unchanged.
    #[test]
    fn no_backend_is_reported() {
        let facade = facade_with(BackendRegistry::new());
        let session = Session::new(SessionId(1));
        add(&facade, &session, "x > 0");
        let before = session.get_model();

        let err = facade
            .solve_model(&session, SolveOptions::default())
            .expect_err("no backend");
        assert_eq!(err.code, "backend_not_available");
        assert_eq!(session.get_model(), before);
        assert!(session.last_solve().is_none());
    }

    /// T2.3: Asking for an unregistered backend is the same error.
    #[test]
    fn unknown_backend_is_reported() {
        let facade = interval_facade();
        let session = Session::new(SessionId(1));

        let reply = facade.dispatch(&session, "solve_model", json!({ "backend": "nope" }));
        assert_eq!(
            reply.error.map(|e| e.code),
            Some("backend_not_available".to_string())
        );
    }
}

// =============================================================================
// TIER T3: CRITERIA CONSISTENCY
// =============================================================================

mod t3_criteria_consistency {
    use super::*;
    use veriform_core::{Consistency, IscVerifier};

    fn verifier() -> IscVerifier {
        let mut registry = BackendRegistry::new();
        registry.register(IntervalBackend::new());
        IscVerifier::new(Arc::new(SolveOrchestrator::new(
            registry,
            SolverConfig::default(),
        )))
    }

    /// T3.1: Contradictory criteria are flagged as advisory.
    #[test]
    fn contradiction_is_advisory() {
        let result = verifier().verify_criteria_consistency("must be at least 10 and less than 5", None);
        assert_eq!(result.extracted.len(), 2);
        assert_eq!(result.consistency, Consistency::PossiblyInconsistent);
        assert!(result.advisory);
    }

    /// T3.2: The check never touches a caller's session.
    #[test]
    fn session_is_untouched() {
        let facade = interval_facade();
        let session = Session::new(SessionId(1));
        add(&facade, &session, "x > 0");
        let before = session.get_model();

        let result = verifier().verify_criteria_consistency("x must be less than 0", None);
        assert!(result.is_consistent());
        assert_eq!(session.get_model(), before);
    }

    /// T3.3: Several subjects are checked independently.
    #[test]
    fn independent_subjects_are_consistent() {
        let result = verifier().verify_criteria_consistency(
            "Response time must be under 200 ms. Uptime must be at least 99.9%.",
            None,
        );
        assert_eq!(result.extracted.len(), 2);
        assert_ne!(result.extracted[0].variable, result.extracted[1].variable);
        assert!(result.is_consistent());
    }
}

// =============================================================================
// TIER T4: CONCURRENT TOOL CALLS ON ONE SESSION
// =============================================================================

mod t4_session_concurrency {
    use super::*;

    const THREADS: usize = 4;
    const ROUNDS: usize = 100;

    /// T4.1: Edits and solves from several threads are serialized per session.
    #[test]
    fn interleaved_edits_and_solves_stay_consistent() {
        let facade = interval_facade();
        let session = Arc::new(Session::new(SessionId(1)));

        let workers: Vec<_> = (0..THREADS)
            .map(|t| {
                let facade = facade.clone();
                let session = Arc::clone(&session);
                thread::spawn(move || {
                    let mut deletes = 0;
                    for round in 0..ROUNDS {
                        let reply = facade.dispatch(
                            &session,
                            "add_item",
                            json!({ "item": format!("v{t} >= {round}") }),
                        );
                        assert!(reply.ok, "add_item: {:?}", reply.error);

                        let reply = facade.dispatch(&session, "solve_model", json!({}));
                        assert!(reply.ok, "solve_model: {:?}", reply.error);
                        let result = reply.result.expect("solve result");
                        assert_eq!(result["status"], json!("SAT"));

                        // this thread has added more than it deleted, so index 0 exists
                        if round % 3 == 0 {
                            let reply = facade.dispatch(&session, "delete_item", json!({ "index": 0 }));
                            assert!(reply.ok, "delete_item: {:?}", reply.error);
                            deletes += 1;
                        } else if round % 3 == 1 {
                            let reply = facade.dispatch(
                                &session,
                                "replace_item",
                                json!({ "index": 0, "item": format!("v{t} <= 1000") }),
                            );
                            assert!(reply.ok, "replace_item: {:?}", reply.error);
                        }
                    }
                    deletes
                })
            })
            .collect();

        let deletes: usize = workers
            .into_iter()
            .map(|w| w.join().expect("worker thread"))
            .sum();

        let model = session.get_model();
        assert_eq!(model.len(), THREADS * ROUNDS - deletes);
        assert_eq!(deletes, THREADS * ROUNDS.div_ceil(3));
        for source in sources(&session) {
            assert!(source.starts_with('v'), "unexpected item {source}");
        }

        let reply = facade.dispatch(&session, "clear_model", json!({}));
        assert!(reply.ok, "clear_model: {:?}", reply.error);
        assert!(session.get_model().is_empty());
    }
}
