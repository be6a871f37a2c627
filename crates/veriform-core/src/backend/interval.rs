//! # Interval Backend
//!
//! Built-in, always-available bounds checker.
//!
//! Every conjunct of every assertion is classified as a single-variable
//! linear bound (`2*x + 1 <= 7`), a boolean literal (`p`, `not p`) or a
//! variable-free constant (`1 < 2`). Conflicts among those are exact and
//! reported as UNSAT with the items involved. A model holding any other
//! conjunct, and no conflict, is UNKNOWN: the check is sound, not complete.

use super::{RawResult, SolverBackend};
use crate::expr::{self, CmpOp, Expr, LinearForm};
use crate::model::ModelSnapshot;
use crate::primitives::INTERVAL_BACKEND;
use crate::{SolverError, Sort, Witness};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::collections::BTreeMap;

// =============================================================================
// NATIVE FORM
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Atom {
    Bound {
        var: String,
        op: CmpOp,
        value: BigRational,
    },
    Literal {
        var: String,
        value: bool,
    },
    Constant(bool),
}

/// A model reduced to bounds, literals and constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalProblem {
    sorts: BTreeMap<String, Sort>,
    atoms: Vec<(usize, Atom)>,
    unsupported: Vec<usize>,
}

impl IntervalProblem {
    /// Indices of assertions with a conjunct outside the bounds fragment.
    #[must_use]
    pub fn unsupported_items(&self) -> &[usize] {
        &self.unsupported
    }
}

/// Reduce one conjunct to an atom, `None` if it lies outside the fragment.
fn classify(term: &Expr, negated: bool) -> Option<Atom> {
    match term {
        Expr::Bool(b) => Some(Atom::Constant(*b != negated)),
        Expr::Var(name) => Some(Atom::Literal {
            var: name.clone(),
            value: !negated,
        }),
        Expr::Not(inner) => classify(inner, !negated),
        Expr::Cmp(op, lhs, rhs) => {
            let op = if negated { op.negate() } else { *op };
            let diff = LinearForm::difference(lhs.linear()?, rhs.linear()?);
            if let Some(constant) = diff.as_constant() {
                return Some(Atom::Constant(op.holds(&constant, &BigRational::zero())));
            }
            // coeff * var + constant  op  0
            let (var, coeff) = diff.single_variable()?;
            let value = -&diff.constant / coeff;
            let op = if coeff.is_negative() { op.flip() } else { op };
            Some(Atom::Bound {
                var: var.to_string(),
                op,
                value,
            })
        }
        _ => None,
    }
}

// =============================================================================
// RANGES
// =============================================================================

#[derive(Debug, Clone)]
struct Limit {
    value: BigRational,
    strict: bool,
    item: usize,
}

#[derive(Debug, Clone, Default)]
struct Range {
    lower: Option<Limit>,
    upper: Option<Limit>,
    excluded: Vec<(BigRational, usize)>,
}

/// Integer form of a bound: strict bounds become non-strict, values round inward.
/// `None` means the bound is trivially true (`!=`) or unsatisfiable (`==`) on integers.
fn tighten(op: CmpOp, value: &BigRational) -> Option<(CmpOp, BigRational)> {
    let one = BigRational::one();
    match op {
        CmpOp::Ge => Some((CmpOp::Ge, value.ceil())),
        CmpOp::Le => Some((CmpOp::Le, value.floor())),
        CmpOp::Gt => Some((CmpOp::Ge, value.floor() + one)),
        CmpOp::Lt => Some((CmpOp::Le, value.ceil() - one)),
        CmpOp::Eq | CmpOp::Ne => value.is_integer().then(|| (op, value.clone())),
    }
}

impl Range {
    /// Apply a bound; on conflict return the items involved.
    fn apply(
        &mut self,
        op: CmpOp,
        value: &BigRational,
        item: usize,
        integer: bool,
    ) -> Result<(), Vec<usize>> {
        let (op, value) = if integer {
            match tighten(op, value) {
                Some(bound) => bound,
                None if op == CmpOp::Eq => return Err(vec![item]),
                None => return Ok(()),
            }
        } else {
            (op, value.clone())
        };

        match op {
            CmpOp::Ge | CmpOp::Gt => self.raise(value, op == CmpOp::Gt, item),
            CmpOp::Le | CmpOp::Lt => self.cap(value, op == CmpOp::Lt, item),
            CmpOp::Eq => {
                self.raise(value.clone(), false, item);
                self.cap(value, false, item);
            }
            CmpOp::Ne => self.excluded.push((value, item)),
        }
        self.check(integer)
    }

    fn raise(&mut self, value: BigRational, strict: bool, item: usize) {
        let tighter = self.lower.as_ref().is_none_or(|cur| {
            value > cur.value || (value == cur.value && strict && !cur.strict)
        });
        if tighter {
            self.lower = Some(Limit {
                value,
                strict,
                item,
            });
        }
    }

    fn cap(&mut self, value: BigRational, strict: bool, item: usize) {
        let tighter = self.upper.as_ref().is_none_or(|cur| {
            value < cur.value || (value == cur.value && strict && !cur.strict)
        });
        if tighter {
            self.upper = Some(Limit {
                value,
                strict,
                item,
            });
        }
    }

    fn excludes(&self, value: &BigRational) -> Option<usize> {
        self.excluded
            .iter()
            .find(|(v, _)| v == value)
            .map(|(_, item)| *item)
    }

    fn check(&self, integer: bool) -> Result<(), Vec<usize>> {
        let (Some(lo), Some(hi)) = (&self.lower, &self.upper) else {
            return Ok(());
        };
        if lo.value > hi.value || (lo.value == hi.value && (lo.strict || hi.strict)) {
            return Err(vec![lo.item, hi.item]);
        }
        if lo.value == hi.value {
            if let Some(at) = self.excludes(&lo.value) {
                return Err(vec![lo.item, hi.item, at]);
            }
            return Ok(());
        }
        if integer {
            // integer bounds are non-strict here; only a range no wider than
            // the exclusion list can be fully excluded
            let width = &hi.value - &lo.value + BigRational::one();
            let excluded = BigRational::from_integer(BigInt::from(self.excluded.len()));
            if width <= excluded {
                let mut involved = vec![lo.item, hi.item];
                let mut value = lo.value.clone();
                while value <= hi.value {
                    match self.excludes(&value) {
                        Some(at) => involved.push(at),
                        None => return Ok(()),
                    }
                    value += BigRational::one();
                }
                return Err(involved);
            }
        }
        Ok(())
    }

    /// A value inside the range that no exclusion hits.
    fn pick(&self, integer: bool) -> BigRational {
        let one = BigRational::one();
        let tries = self.excluded.len() + 1;
        let stepping = |start: BigRational, step: BigRational| {
            std::iter::successors(Some(start), move |v| Some(v + &step)).take(tries)
        };

        let candidates: Vec<BigRational> = match (&self.lower, &self.upper) {
            (Some(lo), Some(hi)) if lo.value == hi.value => vec![lo.value.clone()],
            (Some(lo), Some(hi)) if integer => stepping(lo.value.clone(), one)
                .take_while(|v| *v <= hi.value)
                .collect(),
            (Some(lo), Some(hi)) => {
                let two = BigRational::from_integer(BigInt::from(2u8));
                let mut top = hi.value.clone();
                let mut out = Vec::with_capacity(tries);
                for _ in 0..tries {
                    let mid = (&lo.value + &top) / &two;
                    out.push(mid.clone());
                    top = mid;
                }
                out
            }
            (Some(lo), None) => {
                let start = if lo.strict { &lo.value + &one } else { lo.value.clone() };
                stepping(start, one).collect()
            }
            (None, Some(hi)) => {
                let start = if hi.strict { &hi.value - &one } else { hi.value.clone() };
                stepping(start, -one).collect()
            }
            (None, None) => stepping(BigRational::zero(), one).collect(),
        };

        candidates
            .into_iter()
            .find(|v| self.excludes(v).is_none())
            .unwrap_or_else(BigRational::zero)
    }
}

// =============================================================================
// BACKEND
// =============================================================================

/// Built-in bounds-consistency backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntervalBackend;

impl IntervalBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl SolverBackend for IntervalBackend {
    type Native = IntervalProblem;

    fn name(&self) -> &str {
        INTERVAL_BACKEND
    }

    fn is_available(&self) -> bool {
        true
    }

    fn features(&self) -> &[&'static str] {
        &["bounds", "models", "conflicts", "boolean"]
    }

    fn translate(&self, model: &ModelSnapshot) -> Result<IntervalProblem, SolverError> {
        let sorts = model.signature()?;
        let mut atoms = Vec::new();
        let mut unsupported = Vec::new();
        for (index, formula) in model.assertions() {
            let mut complete = true;
            for conjunct in formula.conjuncts() {
                match classify(conjunct, false) {
                    Some(atom) => atoms.push((index, atom)),
                    None => complete = false,
                }
            }
            if !complete {
                unsupported.push(index);
            }
        }
        Ok(IntervalProblem {
            sorts,
            atoms,
            unsupported,
        })
    }

    fn solve(&self, problem: IntervalProblem, _timeout_ms: u64) -> Result<RawResult, SolverError> {
        let mut ranges: BTreeMap<&str, Range> = BTreeMap::new();
        let mut literals: BTreeMap<&str, (bool, usize)> = BTreeMap::new();

        for (item, atom) in &problem.atoms {
            match atom {
                Atom::Constant(true) => {}
                Atom::Constant(false) => return Ok(RawResult::unsat(vec![*item])),
                Atom::Literal { var, value } => match literals.get(var.as_str()) {
                    Some((prev, at)) if prev != value => {
                        return Ok(RawResult::unsat(vec![*at, *item]));
                    }
                    Some(_) => {}
                    None => {
                        literals.insert(var.as_str(), (*value, *item));
                    }
                },
                Atom::Bound { var, op, value } => {
                    let integer = problem.sorts.get(var) == Some(&Sort::Int);
                    let range = ranges.entry(var.as_str()).or_default();
                    if let Err(conflict) = range.apply(*op, value, *item, integer) {
                        return Ok(RawResult::unsat(conflict));
                    }
                }
            }
        }

        if !problem.unsupported.is_empty() {
            let items: Vec<String> = problem.unsupported.iter().map(usize::to_string).collect();
            return Ok(RawResult::unknown(format!(
                "items {} are outside the single-variable bounds fragment",
                items.join(", ")
            )));
        }

        let unconstrained = Range::default();
        let witness: Witness = problem
            .sorts
            .iter()
            .map(|(name, sort)| {
                let value = match sort {
                    Sort::Bool => literals
                        .get(name.as_str())
                        .is_some_and(|(v, _)| *v)
                        .to_string(),
                    Sort::Int | Sort::Real => {
                        let range = ranges.get(name.as_str()).unwrap_or(&unconstrained);
                        expr::format_rational(&range.pick(*sort == Sort::Int))
                    }
                };
                (name.clone(), value)
            })
            .collect();
        Ok(RawResult::sat(witness))
    }
}

// =============================================================================
// TESTS
// =============================================================================
