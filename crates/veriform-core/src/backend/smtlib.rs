//! # SMT-LIB Process Backend
//!
//! Drives an external SMT-LIB 2 solver (z3 by default) over stdin/stdout.
//!
//! One process per solve. Every assertion is named `a<index>` so the
//! unsat core maps straight back to model positions. The process is
//! killed once the time bound passes.

use super::{RawResult, SolverBackend};
use crate::config::SmtLibConfig;
use crate::expr::{self, ArithOp, CmpOp, Expr};
use crate::model::ModelSnapshot;
use crate::primitives::SMTLIB_BACKEND;
use crate::{SolveStatus, SolverError, Sort, Witness};
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(5);
const PROBE_TIMEOUT_MS: u64 = 5_000;
const ASSERTION_PREFIX: &str = "a";

// =============================================================================
// NATIVE FORM
// =============================================================================

/// A model rendered as an SMT-LIB 2 script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtLibScript {
    text: String,
    sorts: BTreeMap<String, Sort>,
}

impl SmtLibScript {
    /// The full script, as written to the solver's stdin.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

// =============================================================================
// BACKEND
// =============================================================================

/// External SMT-LIB 2 solver process.
#[derive(Debug)]
pub struct SmtLibBackend {
    config: SmtLibConfig,
    probe: OnceLock<Result<String, String>>,
}

impl SmtLibBackend {
    #[must_use]
    pub fn new(config: SmtLibConfig) -> Self {
        Self {
            config,
            probe: OnceLock::new(),
        }
    }

    /// Backend for `z3` on `PATH`.
    #[must_use]
    pub fn z3() -> Self {
        Self::new(SmtLibConfig::default())
    }

    /// First line of the solver's version output, once probed successfully.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.probe().as_ref().ok().map(String::as_str)
    }

    fn probe(&self) -> &Result<String, String> {
        self.probe.get_or_init(|| {
            let result = self
                .run(&self.config.version_args, None, PROBE_TIMEOUT_MS)
                .map_err(|e| e.to_string())
                .and_then(|out| {
                    if out.success {
                        Ok(out.stdout.lines().next().unwrap_or_default().trim().to_string())
                    } else {
                        Err(format!("'{}' exited with failure", self.config.command))
                    }
                });
            match &result {
                Ok(version) => tracing::debug!(command = %self.config.command, %version, "smt solver found"),
                Err(reason) => tracing::debug!(command = %self.config.command, %reason, "smt solver unavailable"),
            }
            result
        })
    }

    /// Run the solver command, feeding `input` on stdin, killing it at the deadline.
    fn run(
        &self,
        args: &[String],
        input: Option<&str>,
        timeout_ms: u64,
    ) -> Result<ProcessOutput, SolverError> {
        let mut child = Command::new(&self.config.command)
            .args(args)
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(&e))?;

        let writer = match (input, child.stdin.take()) {
            (Some(text), Some(mut stdin)) => {
                let text = text.to_string();
                // stdin is closed when the thread drops it
                Some(thread::spawn(move || stdin.write_all(text.as_bytes())))
            }
            _ => None,
        };
        let stdout = child.stdout.take().map(|s| thread::spawn(move || read_all(s)));
        let stderr = child.stderr.take().map(|s| thread::spawn(move || read_all(s)));

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    terminate(&mut child, &self.config.command);
                    return Err(SolverError::Timeout { timeout_ms });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    terminate(&mut child, &self.config.command);
                    return Err(SolverError::Backend(format!(
                        "failed to wait for '{}': {e}",
                        self.config.command
                    )));
                }
            }
        };

        if let Some(Ok(Err(e))) = writer.map(thread::JoinHandle::join) {
            // the solver may exit before reading everything, e.g. on a parse error
            tracing::debug!(error = %e, "solver stdin closed early");
        }
        let collect = |handle: Option<thread::JoinHandle<String>>| {
            handle.and_then(|h| h.join().ok()).unwrap_or_default()
        };
        Ok(ProcessOutput {
            success: status.success(),
            stdout: collect(stdout),
            stderr: collect(stderr),
        })
    }

    fn spawn_error(&self, error: &io::Error) -> SolverError {
        if error.kind() == io::ErrorKind::NotFound {
            SolverError::BackendNotAvailable(format!(
                "solver command '{}' not found",
                self.config.command
            ))
        } else {
            SolverError::Backend(format!(
                "failed to start '{}': {error}",
                self.config.command
            ))
        }
    }
}

impl SolverBackend for SmtLibBackend {
    type Native = SmtLibScript;

    fn name(&self) -> &str {
        SMTLIB_BACKEND
    }

    fn is_available(&self) -> bool {
        self.probe().is_ok()
    }

    fn features(&self) -> &[&'static str] {
        &["smtlib2", "models", "unsat-cores", "nonlinear", "boolean"]
    }

    fn translate(&self, model: &ModelSnapshot) -> Result<SmtLibScript, SolverError> {
        let sorts = model.signature()?;
        let mut text = String::new();
        text.push_str("(set-option :produce-models true)\n");
        text.push_str("(set-option :produce-unsat-cores true)\n");
        text.push_str("(set-logic ALL)\n");
        for (name, sort) in &sorts {
            text.push_str(&format!("(declare-const {} {})\n", symbol(name), sort.smtlib()));
        }
        for (index, formula) in model.assertions() {
            text.push_str(&format!(
                "(assert (! {} :named {ASSERTION_PREFIX}{index}))\n",
                render_term(formula, &sorts)
            ));
        }
        text.push_str("(check-sat)\n");
        text.push_str("(get-model)\n");
        text.push_str("(get-unsat-core)\n");
        text.push_str("(get-info :reason-unknown)\n");
        text.push_str("(exit)\n");
        Ok(SmtLibScript { text, sorts })
    }

    fn solve(&self, native: SmtLibScript, timeout_ms: u64) -> Result<RawResult, SolverError> {
        let out = self.run(&self.config.args, Some(&native.text), timeout_ms)?;
        let result = interpret(&out.stdout, &native.sorts);
        if result.is_err() && !out.stderr.trim().is_empty() {
            tracing::debug!(stderr = %out.stderr.trim(), "solver stderr");
        }
        result
    }
}

struct ProcessOutput {
    success: bool,
    stdout: String,
    stderr: String,
}

/// Kill and reap a solver process; failures are logged, not returned.
fn terminate(child: &mut Child, command: &str) {
    if let Err(e) = child.kill() {
        tracing::debug!(command, error = %e, "failed to kill solver process");
    }
    if let Err(e) = child.wait() {
        tracing::debug!(command, error = %e, "failed to reap solver process");
    }
}

/// Read a pipe to its end. A read error keeps what arrived before it.
fn read_all(mut source: impl Read) -> String {
    let mut bytes = Vec::new();
    if let Err(e) = source.read_to_end(&mut bytes) {
        tracing::debug!(error = %e, read = bytes.len(), "solver output cut short");
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

// =============================================================================
// RENDERING
// =============================================================================

fn symbol(name: &str) -> String {
    format!("|{name}|")
}

/// Render a formula as an SMT-LIB 2 term.
///
/// Comparisons that involve a real operand are rendered in real arithmetic:
/// integer literals become decimals and integer variables are wrapped in
/// `to_real`.
#[must_use]
pub fn render_term(formula: &Expr, sorts: &BTreeMap<String, Sort>) -> String {
    let mut out = String::new();
    Renderer { sorts }.formula(formula, &mut out);
    out
}

struct Renderer<'a> {
    sorts: &'a BTreeMap<String, Sort>,
}

impl Renderer<'_> {
    fn is_real(&self, term: &Expr) -> bool {
        match term {
            Expr::Num(n) => !n.is_integer(),
            Expr::Var(name) => self.sorts.get(name) == Some(&Sort::Real),
            Expr::Neg(inner) => self.is_real(inner),
            Expr::Arith(ArithOp::Div, ..) => true,
            Expr::Arith(_, lhs, rhs) => self.is_real(lhs) || self.is_real(rhs),
            _ => false,
        }
    }

    fn formula(&self, term: &Expr, out: &mut String) {
        match term {
            Expr::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Expr::Var(name) => out.push_str(&symbol(name)),
            Expr::Not(inner) => {
                out.push_str("(not ");
                self.formula(inner, out);
                out.push(')');
            }
            Expr::And(parts) => self.connective("and", "true", parts, out),
            Expr::Or(parts) => self.connective("or", "false", parts, out),
            Expr::Implies(lhs, rhs) => {
                out.push_str("(=> ");
                self.formula(lhs, out);
                out.push(' ');
                self.formula(rhs, out);
                out.push(')');
            }
            Expr::Cmp(op, lhs, rhs) => {
                let real = self.is_real(lhs) || self.is_real(rhs);
                let head = match op {
                    CmpOp::Ne => "not (=",
                    CmpOp::Eq => "=",
                    other => other.symbol(),
                };
                out.push('(');
                out.push_str(head);
                out.push(' ');
                self.numeric(lhs, real, out);
                out.push(' ');
                self.numeric(rhs, real, out);
                out.push(')');
                if *op == CmpOp::Ne {
                    out.push(')');
                }
            }
            // numeric terms never reach a formula position once sort-checked
            Expr::Num(_) | Expr::Neg(_) | Expr::Arith(..) => self.numeric(term, false, out),
        }
    }

    fn connective(&self, head: &str, unit: &str, parts: &[Expr], out: &mut String) {
        match parts {
            [] => out.push_str(unit),
            [only] => self.formula(only, out),
            _ => {
                out.push('(');
                out.push_str(head);
                for part in parts {
                    out.push(' ');
                    self.formula(part, out);
                }
                out.push(')');
            }
        }
    }

    fn numeric(&self, term: &Expr, real: bool, out: &mut String) {
        match term {
            Expr::Num(n) => out.push_str(&literal(n, real)),
            Expr::Var(name) => {
                if real && self.sorts.get(name) == Some(&Sort::Int) {
                    out.push_str(&format!("(to_real {})", symbol(name)));
                } else {
                    out.push_str(&symbol(name));
                }
            }
            Expr::Neg(inner) => {
                out.push_str("(- ");
                self.numeric(inner, real, out);
                out.push(')');
            }
            Expr::Arith(op, lhs, rhs) => {
                let head = match op {
                    ArithOp::Add => "+",
                    ArithOp::Sub => "-",
                    ArithOp::Mul => "*",
                    ArithOp::Div => "/",
                };
                out.push('(');
                out.push_str(head);
                out.push(' ');
                self.numeric(lhs, real, out);
                out.push(' ');
                self.numeric(rhs, real, out);
                out.push(')');
            }
            _ => self.formula(term, out),
        }
    }
}

fn literal(value: &BigRational, real: bool) -> String {
    let magnitude = value.abs();
    let body = if magnitude.is_integer() {
        if real {
            format!("{}.0", magnitude.numer())
        } else {
            magnitude.numer().to_string()
        }
    } else {
        format!("(/ {}.0 {}.0)", magnitude.numer(), magnitude.denom())
    };
    if value.is_negative() {
        format!("(- {body})")
    } else {
        body
    }
}

// =============================================================================
// OUTPUT PARSING
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

impl Sexp {
    fn atom(&self) -> Option<&str> {
        match self {
            Self::Atom(a) => Some(a),
            Self::List(_) => None,
        }
    }

    fn head(&self) -> Option<&str> {
        match self {
            Self::List(items) => items.first().and_then(Sexp::atom),
            Self::Atom(_) => None,
        }
    }
}

impl std::fmt::Display for Sexp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Atom(a) => f.write_str(a),
            Self::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Parse solver output into top-level s-expressions. Unbalanced trailing input is dropped.
fn parse_sexps(text: &str) -> Vec<Sexp> {
    let mut stack: Vec<Vec<Sexp>> = vec![Vec::new()];
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '(' => stack.push(Vec::new()),
            ')' => {
                if stack.len() > 1 {
                    let list = stack.pop().unwrap_or_default();
                    if let Some(parent) = stack.last_mut() {
                        parent.push(Sexp::List(list));
                    }
                }
            }
            ';' => {
                while chars.next_if(|&c| c != '\n').is_some() {}
            }
            '|' => {
                let quoted: String = chars.by_ref().take_while(|&c| c != '|').collect();
                if let Some(top) = stack.last_mut() {
                    top.push(Sexp::Atom(quoted));
                }
            }
            '"' => {
                let mut s = String::new();
                while let Some(c) = chars.next() {
                    if c == '"' {
                        if chars.next_if_eq(&'"').is_some() {
                            s.push('"');
                            continue;
                        }
                        break;
                    }
                    s.push(c);
                }
                if let Some(top) = stack.last_mut() {
                    top.push(Sexp::Atom(s));
                }
            }
            c if c.is_whitespace() => {}
            c => {
                let mut atom = String::from(c);
                while let Some(next) =
                    chars.next_if(|&n| !n.is_whitespace() && !matches!(n, '(' | ')' | '|' | '"' | ';'))
                {
                    atom.push(next);
                }
                if let Some(top) = stack.last_mut() {
                    top.push(Sexp::Atom(atom));
                }
            }
        }
    }
    stack.into_iter().next().unwrap_or_default()
}

/// Interpret the solver's responses to the script built by `translate`.
///
/// An `(error ...)` before the `check-sat` answer means the script was
/// rejected. Errors after it come from `get-model` or `get-unsat-core`
/// not applying to the answer, and are ignored.
fn interpret(stdout: &str, sorts: &BTreeMap<String, Sort>) -> Result<RawResult, SolverError> {
    let mut status = None;
    let mut witness = Witness::new();
    let mut core = Vec::new();
    let mut reason = None;

    for sexp in parse_sexps(stdout) {
        if status.is_none() {
            match sexp.atom() {
                Some("sat") => status = Some(SolveStatus::Sat),
                Some("unsat") => status = Some(SolveStatus::Unsat),
                Some("unknown") => status = Some(SolveStatus::Unknown),
                _ => {
                    if sexp.head() == Some("error") {
                        return Err(SolverError::Backend(error_message(&sexp)));
                    }
                }
            }
            continue;
        }

        let Sexp::List(items) = &sexp else { continue };
        match sexp.head() {
            Some("error") => {}
            Some(":reason-unknown") => {
                reason = items.get(1).and_then(Sexp::atom).map(str::to_string);
            }
            Some("model") => read_model(&items[1..], sorts, &mut witness),
            Some("define-fun") => read_model(std::slice::from_ref(&sexp), sorts, &mut witness),
            _ if items.iter().all(|i| i.head() == Some("define-fun")) => {
                read_model(items, sorts, &mut witness);
            }
            _ => core.extend(items.iter().filter_map(|i| {
                i.atom()?
                    .strip_prefix(ASSERTION_PREFIX)?
                    .parse::<usize>()
                    .ok()
            })),
        }
    }

    match status {
        Some(SolveStatus::Sat) => Ok(RawResult::sat(witness)),
        Some(SolveStatus::Unsat) => Ok(RawResult::unsat(core)),
        Some(_) => Ok(RawResult::unknown(
            reason
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| "solver returned unknown".to_string()),
        )),
        None => Err(SolverError::Backend(
            "solver produced no check-sat answer".to_string(),
        )),
    }
}

fn error_message(sexp: &Sexp) -> String {
    match sexp {
        Sexp::List(items) => items
            .get(1)
            .map(|m| m.to_string())
            .unwrap_or_else(|| "solver reported an error".to_string()),
        Sexp::Atom(a) => a.clone(),
    }
}

/// Collect `(define-fun name () Sort value)` entries for model variables.
fn read_model(defs: &[Sexp], sorts: &BTreeMap<String, Sort>, witness: &mut Witness) {
    for def in defs {
        let Sexp::List(parts) = def else { continue };
        let [_, Sexp::Atom(name), Sexp::List(params), _, value] = parts.as_slice() else {
            continue;
        };
        if !params.is_empty() || !sorts.contains_key(name) {
            continue;
        }
        let rendered = value_of(value)
            .map(|v| expr::format_rational(&v))
            .unwrap_or_else(|| value.to_string());
        witness.insert(name.clone(), rendered);
    }
}

/// Exact value of a numeric model term: `5`, `2.5`, `(- 5)`, `(/ 1.0 3.0)`.
fn value_of(term: &Sexp) -> Option<BigRational> {
    match term {
        Sexp::Atom(a) => expr::parse_number(a),
        Sexp::List(items) => match items.as_slice() {
            [Sexp::Atom(op), inner] if op == "-" => value_of(inner).map(|v| -v),
            [Sexp::Atom(op), num, den] if op == "/" => {
                let den = value_of(den)?;
                if den.is_zero() {
                    return None;
                }
                Some(value_of(num)? / den)
            }
            _ => None,
        },
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConstraintItem;

    fn snapshot(sources: &[&str]) -> ModelSnapshot {
        ModelSnapshot::from_items(
            sources
                .iter()
                .map(|s| ConstraintItem::parse(s).expect("valid item"))
                .collect(),
        )
    }

    fn sorts(pairs: &[(&str, Sort)]) -> BTreeMap<String, Sort> {
        pairs.iter().map(|(n, s)| ((*n).to_string(), *s)).collect()
    }

    #[test]
    fn renders_integer_comparison() {
        let f = expr::parse_formula("x >= 10 and x != 3").expect("parse");
        let s = sorts(&[("x", Sort::Int)]);
        assert_eq!(
            render_term(&f, &s),
            "(and (>= |x| 10) (not (= |x| 3)))"
        );
    }

    #[test]
    fn mixed_comparison_is_rendered_in_reals() {
        let f = expr::parse_formula("n + r > -1.5").expect("parse");
        let s = sorts(&[("n", Sort::Int), ("r", Sort::Real)]);
        assert_eq!(
            render_term(&f, &s),
            "(> (+ (to_real |n|) |r|) (- (/ 3.0 2.0)))"
        );
    }

    #[test]
    fn script_names_assertions_by_index() {
        let backend = SmtLibBackend::z3();
        let script = backend
            .translate(&snapshot(&["x: int", "x >= 10", "x < 5"]))
            .expect("translate");
        let text = script.text();
        assert!(text.contains("(declare-const |x| Int)"));
        assert!(text.contains("(assert (! (>= |x| 10) :named a1))"));
        assert!(text.contains("(assert (! (< |x| 5) :named a2))"));
        assert!(text.contains("(check-sat)"));
    }

    #[test]
    fn translate_rejects_ill_sorted_model() {
        let backend = SmtLibBackend::z3();
        let err = backend
            .translate(&snapshot(&["b: bool", "b > 1"]))
            .expect_err("sort clash");
        assert_eq!(err.code(), "invalid_constraint");
    }

    #[test]
    fn interprets_sat_with_model() {
        let out = "sat\n(\n  (define-fun x () Int\n    10)\n  (define-fun r () Real\n    (- (/ 1.0 2.0)))\n)\n(error \"line 9 column 15: unsat core is not available\")\n";
        let s = sorts(&[("x", Sort::Int), ("r", Sort::Real)]);
        let raw = interpret(out, &s).expect("sat");
        assert_eq!(raw.status, SolveStatus::Sat);
        assert_eq!(raw.assignments.get("x").map(String::as_str), Some("10"));
        assert_eq!(raw.assignments.get("r").map(String::as_str), Some("-1/2"));
    }

    #[test]
    fn interprets_legacy_model_wrapper() {
        let out = "sat\n(model (define-fun p () Bool true))\n";
        let raw = interpret(out, &sorts(&[("p", Sort::Bool)])).expect("sat");
        assert_eq!(raw.assignments.get("p").map(String::as_str), Some("true"));
    }

    #[test]
    fn interprets_unsat_core() {
        let out = "unsat\n(error \"model is not available\")\n(a2 a1)\n";
        let raw = interpret(out, &sorts(&[("x", Sort::Int)])).expect("unsat");
        assert_eq!(raw.status, SolveStatus::Unsat);
        assert_eq!(raw.conflicting, vec![1, 2]);
    }

    #[test]
    fn interprets_unknown_reason() {
        let out = "unknown\n(error \"model is not available\")\n()\n(:reason-unknown \"incomplete\")\n";
        let raw = interpret(out, &BTreeMap::new()).expect("unknown");
        assert_eq!(raw.status, SolveStatus::Unknown);
        assert_eq!(raw.reason.as_deref(), Some("incomplete"));
    }

    #[test]
    fn error_before_answer_is_a_backend_error() {
        let out = "(error \"line 4 column 10: unknown constant y\")\nsat\n";
        let err = interpret(out, &BTreeMap::new()).expect_err("rejected");
        assert_eq!(err.code(), "solver_error");
        assert!(err.to_string().contains("unknown constant"));
    }

    #[test]
    fn empty_output_is_a_backend_error() {
        assert!(interpret("", &BTreeMap::new()).is_err());
    }

    #[test]
    fn sexp_parser_handles_quoting_and_comments() {
        let parsed = parse_sexps("(|odd name| \"say \"\"hi\"\"\") ; trailing\nsat");
        assert_eq!(
            parsed,
            vec![
                Sexp::List(vec![
                    Sexp::Atom("odd name".to_string()),
                    Sexp::Atom("say \"hi\"".to_string()),
                ]),
                Sexp::Atom("sat".to_string()),
            ]
        );
    }

    /// Yields `data` once, then fails.
    struct FailingReader {
        data: Option<&'static [u8]>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.take() {
                Some(data) => {
                    let n = data.len().min(buf.len());
                    buf[..n].copy_from_slice(&data[..n]);
                    Ok(n)
                }
                None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed")),
            }
        }
    }

    #[test]
    fn read_error_keeps_partial_output() {
        let text = read_all(FailingReader {
            data: Some(b"sat\n"),
        });
        assert_eq!(text, "sat\n");
    }

    #[test]
    fn missing_command_is_not_available() {
        let backend = SmtLibBackend::new(SmtLibConfig {
            command: "veriform-no-such-solver".to_string(),
            ..SmtLibConfig::default()
        });
        assert!(!backend.is_available());
        assert!(backend.version().is_none());

        let script = backend.translate(&snapshot(&["x > 1"])).expect("translate");
        let err = backend.solve(script, 1_000).expect_err("no binary");
        assert_eq!(err.code(), "backend_not_available");
    }

    #[test]
    fn solves_with_installed_z3() {
        let backend = SmtLibBackend::z3();
        if !backend.is_available() {
            return;
        }
        let model = snapshot(&["x: int", "x >= 10", "x < 5"]);
        let raw = backend
            .solve(backend.translate(&model).expect("translate"), 10_000)
            .expect("solve");
        assert_eq!(raw.status, SolveStatus::Unsat);
        assert_eq!(raw.conflicting, vec![1, 2]);

        let model = snapshot(&["x: int", "x >= 10", "x <= 10"]);
        let raw = backend
            .solve(backend.translate(&model).expect("translate"), 10_000)
            .expect("solve");
        assert_eq!(raw.status, SolveStatus::Sat);
        assert_eq!(raw.assignments.get("x").map(String::as_str), Some("10"));
    }
}
