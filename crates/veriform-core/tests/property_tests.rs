//! # Property-Based Tests
//!
//! Model store invariants, solve determinism and extractor totality.

use proptest::collection::vec;
use proptest::prelude::*;
use std::sync::Arc;
use veriform_core::{
    BackendRegistry, Consistency, ConstraintItem, IntervalBackend, IscVerifier, ModelStore,
    SolveOptions, SolveOrchestrator, SolverConfig, extract_numeric_constraints,
};

fn bound(var: usize, value: i64) -> ConstraintItem {
    ConstraintItem::parse(&format!("v{var} >= {value}")).expect("valid item")
}

fn interval() -> SolveOrchestrator {
    let mut registry = BackendRegistry::new();
    registry.register(IntervalBackend::new());
    SolveOrchestrator::new(registry, SolverConfig::default())
}

fn sources(store: &ModelStore) -> Vec<String> {
    store
        .get_model()
        .items()
        .iter()
        .map(|i| i.source().to_string())
        .collect()
}

// =============================================================================
// MODEL STORE PROPERTIES
// =============================================================================

proptest! {
    /// An appended item is visible at the returned index.
    #[test]
    fn add_then_get_shows_item(values in vec(-1000i64..1000, 1..30)) {
        let mut store = ModelStore::new();
        for (i, value) in values.iter().enumerate() {
            let item = bound(i, *value);
            let outcome = store.add_item(item.clone(), None).expect("add");
            prop_assert_eq!(outcome.index, i);
            prop_assert_eq!(outcome.count, i + 1);
            let model = store.get_model();
            prop_assert_eq!(model.get(outcome.index), Some(&item));
        }
    }

    /// Delete shrinks by one and keeps the remaining order contiguous.
    #[test]
    fn delete_reindexes_contiguously(
        values in vec(-1000i64..1000, 1..30),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut store = ModelStore::new();
        for (i, value) in values.iter().enumerate() {
            store.add_item(bound(i, *value), None).expect("add");
        }
        let mut expected = sources(&store);
        let index = pick.index(values.len());

        let count = store.delete_item(index).expect("delete");
        expected.remove(index);

        prop_assert_eq!(count, values.len() - 1);
        prop_assert_eq!(sources(&store), expected);
        let views = store.get_model().views();
        for (position, view) in views.iter().enumerate() {
            prop_assert_eq!(view.index, position);
        }
    }

    /// Replace touches exactly one position.
    #[test]
    fn replace_changes_only_target(
        values in vec(-1000i64..1000, 1..30),
        pick in any::<prop::sample::Index>(),
        replacement in -1000i64..1000,
    ) {
        let mut store = ModelStore::new();
        for (i, value) in values.iter().enumerate() {
            store.add_item(bound(i, *value), None).expect("add");
        }
        let before = sources(&store);
        let index = pick.index(values.len());
        let item = ConstraintItem::parse(&format!("w <= {replacement}")).expect("valid item");

        prop_assert_eq!(store.replace_item(index, item.clone()).expect("replace"), index);

        let after = sources(&store);
        prop_assert_eq!(after.len(), before.len());
        for (i, source) in after.iter().enumerate() {
            if i == index {
                prop_assert_eq!(source.as_str(), item.source());
            } else {
                prop_assert_eq!(source, &before[i]);
            }
        }
    }

    /// Clear empties the model, and clearing again changes nothing.
    #[test]
    fn clear_is_idempotent(values in vec(-1000i64..1000, 0..30)) {
        let mut store = ModelStore::new();
        for (i, value) in values.iter().enumerate() {
            store.add_item(bound(i, *value), None).expect("add");
        }
        store.clear_model();
        prop_assert!(store.is_empty());
        let revision = store.revision();
        store.clear_model();
        prop_assert!(store.is_empty());
        prop_assert_eq!(store.revision(), revision);
    }
}

// =============================================================================
// SOLVING AND EXTRACTION PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Solving an unchanged model twice gives the same status and witness.
    #[test]
    fn repeated_solve_is_deterministic(
        bounds in vec((0usize..3, -50i64..50, any::<bool>()), 1..12)
    ) {
        let mut store = ModelStore::new();
        for (var, value, lower) in &bounds {
            let op = if *lower { ">=" } else { "<=" };
            let item = ConstraintItem::parse(&format!("v{var} {op} {value}")).expect("valid item");
            store.add_item(item, None).expect("add");
        }
        let orchestrator = interval();
        let model = store.get_model();

        let first = orchestrator.solve_model(&model, &SolveOptions::default()).expect("solve");
        let second = orchestrator.solve_model(&model, &SolveOptions::default()).expect("solve");

        prop_assert_eq!(first.status, second.status);
        prop_assert_eq!(&first.witness, &second.witness);
        prop_assert_eq!(first.conflicting_items(), second.conflicting_items());
        prop_assert_eq!(store.len(), bounds.len());
    }

    /// The extractor accepts any text and keeps its output in text order.
    #[test]
    fn extractor_is_total(text in any::<String>()) {
        let extraction = extract_numeric_constraints(&text);
        for constraint in &extraction.constraints {
            prop_assert!(constraint.confidence <= 100);
            prop_assert!(!constraint.variable.is_empty());
        }
        for skipped in &extraction.skipped {
            prop_assert!(skipped.confidence <= 30);
        }
    }

    /// The criteria check answers on any text, always as advisory.
    #[test]
    fn criteria_check_never_fails(text in any::<String>()) {
        assert_advisory(&text)?;
    }

    /// Dense comparator phrasing with oversized numbers is still answered.
    #[test]
    fn criteria_check_survives_phrase_heavy_text(text in phrase_heavy_criteria()) {
        assert_advisory(&text)?;
    }
}

fn assert_advisory(text: &str) -> Result<(), TestCaseError> {
    let verifier = IscVerifier::new(Arc::new(interval()));
    let result = verifier.verify_criteria_consistency(text, Some(2_000));
    prop_assert!(result.advisory);
    prop_assert_eq!(result.criteria.as_str(), text);
    if result.extracted.is_empty() {
        prop_assert_eq!(result.consistency, Consistency::NoConstraints);
    }
    Ok(())
}

/// Criteria built from comparator phrases, units and numbers up to 70 digits.
fn phrase_heavy_criteria() -> impl Strategy<Value = String> {
    let subject = prop::sample::select(vec![
        "latency",
        "the password",
        "batch size",
        "under no circumstances may cost",
        "",
    ]);
    let phrase = prop::sample::select(vec![
        "at least",
        "at most",
        "no more than",
        "not less than",
        "under",
        "exceed",
        "between 3 and",
        "from",
        ">=",
        "=",
        "!=",
    ]);
    let number = "-?[0-9]{1,70}(\\.[0-9]{1,6})?";
    let unit = prop::sample::select(vec!["", " ms", "%", " characters", " items", " and"]);
    let separator = prop::sample::select(vec![", ", ". ", " and ", "; ", " but "]);
    let clause = (subject, phrase, number, unit, separator)
        .prop_map(|(s, p, n, u, sep)| format!("{s} must be {p} {n}{u}{sep}"));
    vec(clause, 0..8).prop_map(|clauses| clauses.concat())
}
