//! # Criteria Consistency Check
//!
//! Advisory check of free-form acceptance criteria: extract numeric
//! thresholds, solve them as a transient model, report whether they can all
//! hold at once.
//!
//! The check never fails. Every problem along the way (nothing extracted,
//! no backend, timeout) becomes an `indeterminate` or `no_constraints`
//! verdict, and `advisory` is always `true`.

use crate::expr::Expr;
use crate::extract::{ConstraintExtractor, HeuristicExtractor, NumericConstraint, SkippedFragment};
use crate::model::{ConstraintItem, ModelStore};
use crate::orchestrator::{SolveOptions, SolveOrchestrator};
use crate::{SolveStatus, SolverError, SolverResult, Sort};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Verdict of a criteria consistency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    /// The extracted constraints can all hold together.
    Consistent,
    /// The extracted constraints cannot all hold. Advisory only.
    PossiblyInconsistent,
    /// The solver gave no verdict.
    Indeterminate,
    /// Nothing numeric was found.
    NoConstraints,
}

/// Outcome of `IscVerifier::verify_criteria_consistency`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IscVerificationResult {
    /// The text that was checked.
    pub criteria: String,
    pub consistency: Consistency,
    pub message: String,
    /// The constraints that were checked, in text order.
    pub extracted: Vec<NumericConstraint>,
    pub skipped: Vec<SkippedFragment>,
    pub solver_status: Option<SolveStatus>,
    /// Indices into `extracted` of the constraints that conflict.
    pub conflicting: Vec<usize>,
    pub diagnostics: Vec<String>,
    /// Always `true`: a negative verdict must not block the caller.
    pub advisory: bool,
}

impl IscVerificationResult {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.consistency == Consistency::Consistent
    }
}

/// Runs criteria consistency checks against a solver.
pub struct IscVerifier {
    extractor: Box<dyn ConstraintExtractor>,
    orchestrator: Arc<SolveOrchestrator>,
}

impl std::fmt::Debug for IscVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IscVerifier")
            .field("orchestrator", &self.orchestrator)
            .finish()
    }
}

impl IscVerifier {
    /// Verifier with the heuristic extractor.
    #[must_use]
    pub fn new(orchestrator: Arc<SolveOrchestrator>) -> Self {
        Self::with_extractor(orchestrator, HeuristicExtractor::default())
    }

    #[must_use]
    pub fn with_extractor(
        orchestrator: Arc<SolveOrchestrator>,
        extractor: impl ConstraintExtractor + 'static,
    ) -> Self {
        Self {
            extractor: Box::new(extractor),
            orchestrator,
        }
    }

    /// Check whether the numeric thresholds in `criteria` can all hold.
    ///
    /// Uses a model of its own; no session is read or written.
    pub fn verify_criteria_consistency(
        &self,
        criteria: &str,
        timeout_ms: Option<u64>,
    ) -> IscVerificationResult {
        let extraction = self.extractor.extract(criteria);
        let mut result = IscVerificationResult {
            criteria: criteria.to_string(),
            consistency: Consistency::NoConstraints,
            message: "no numeric constraints found in the criteria".to_string(),
            extracted: extraction.constraints,
            skipped: extraction.skipped,
            solver_status: None,
            conflicting: Vec::new(),
            diagnostics: Vec::new(),
            advisory: true,
        };
        if !result.skipped.is_empty() {
            result.diagnostics.push(format!(
                "{} fragment(s) could not be read as constraints",
                result.skipped.len()
            ));
        }
        if result.extracted.is_empty() {
            tracing::info!(skipped = result.skipped.len(), "criteria check: no constraints");
            return result;
        }

        let options = SolveOptions {
            timeout_ms,
            backend: None,
            strict: Some(false),
        };
        let outcome = build_model(&result.extracted).and_then(|(store, offset)| {
            self.orchestrator
                .solve_model(&store.get_model(), &options)
                .map(|solved| (solved, offset))
        });

        match outcome {
            Ok((solved, offset)) => apply(&mut result, &solved, offset),
            Err(e) => {
                tracing::debug!(error = %e, "criteria check could not solve");
                result.consistency = Consistency::Indeterminate;
                result.message = format!("consistency could not be determined: {e}");
                result.diagnostics.push(e.to_string());
            }
        }

        tracing::info!(
            consistency = ?result.consistency,
            constraints = result.extracted.len(),
            advisory = true,
            "criteria check finished"
        );
        result
    }
}

/// One `real` declaration per variable, then one assertion per constraint.
/// Returns the store and the model index of the first assertion.
fn build_model(constraints: &[NumericConstraint]) -> Result<(ModelStore, usize), SolverError> {
    let mut store = ModelStore::new();
    let mut declared: Vec<&str> = Vec::new();
    for constraint in constraints {
        if !declared.contains(&constraint.variable.as_str()) {
            declared.push(&constraint.variable);
            store.add_item(ConstraintItem::declaration(&constraint.variable, Sort::Real)?, None)?;
        }
    }
    let offset = store.len();
    for constraint in constraints {
        let formula = Expr::compare_var(
            &constraint.variable,
            constraint.comparator,
            constraint.threshold.clone(),
        );
        store.add_item(ConstraintItem::assertion(formula)?, None)?;
    }
    Ok((store, offset))
}

fn apply(result: &mut IscVerificationResult, solved: &SolverResult, offset: usize) {
    result.solver_status = Some(solved.status);
    match solved.status {
        SolveStatus::Sat => {
            result.consistency = Consistency::Consistent;
            result.message = "extracted constraints can all hold together".to_string();
        }
        SolveStatus::Unsat => {
            result.consistency = Consistency::PossiblyInconsistent;
            result.message = "criteria may be contradictory".to_string();
            result.conflicting = solved
                .conflicting_items()
                .iter()
                .filter_map(|i| i.checked_sub(offset))
                .collect();
            for &k in &result.conflicting {
                if let Some(c) = result.extracted.get(k) {
                    result.diagnostics.push(format!(
                        "conflicting: '{}' ({} {} {})",
                        c.fragment,
                        c.variable,
                        c.comparator.symbol(),
                        crate::expr::format_rational(&c.threshold)
                    ));
                }
            }
        }
        status => {
            result.consistency = Consistency::Indeterminate;
            result.message = format!("consistency could not be determined: solver returned {status}");
            if let Some(reason) = solved.explanation.as_ref().and_then(|e| e.message.clone()) {
                result.diagnostics.push(reason);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
