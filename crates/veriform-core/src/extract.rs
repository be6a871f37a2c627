//! # Constraint Extraction
//!
//! Heuristic scan of free-form acceptance criteria for numeric thresholds
//! ("must be at least 10", "under 200 ms", "between 16 and 256").
//!
//! Extraction never fails. Anything that looks numeric but cannot be read
//! as a constraint is reported as a skipped fragment with a low confidence.

use crate::expr::{self, CmpOp};
use crate::primitives::{DEFAULT_SUBJECT, MAX_CRITERIA_LENGTH};
use num_rational::BigRational;
use regex::{Captures, Regex};
use serde::{Serialize, Serializer};
use std::cmp::Reverse;
use std::sync::OnceLock;

// =============================================================================
// VOCABULARY
// =============================================================================

/// Comparator phrases. The earliest match followed by a number wins, then the longest.
const PHRASES: &[(&str, CmpOp)] = &[
    ("at least", CmpOp::Ge),
    ("no less than", CmpOp::Ge),
    ("not less than", CmpOp::Ge),
    ("no fewer than", CmpOp::Ge),
    ("minimum of", CmpOp::Ge),
    ("minimum", CmpOp::Ge),
    ("min", CmpOp::Ge),
    (">=", CmpOp::Ge),
    ("≥", CmpOp::Ge),
    ("at most", CmpOp::Le),
    ("no more than", CmpOp::Le),
    ("not more than", CmpOp::Le),
    ("up to", CmpOp::Le),
    ("maximum of", CmpOp::Le),
    ("maximum", CmpOp::Le),
    ("max", CmpOp::Le),
    ("<=", CmpOp::Le),
    ("≤", CmpOp::Le),
    ("more than", CmpOp::Gt),
    ("greater than", CmpOp::Gt),
    ("over", CmpOp::Gt),
    ("above", CmpOp::Gt),
    ("exceeds", CmpOp::Gt),
    ("exceed", CmpOp::Gt),
    (">", CmpOp::Gt),
    ("less than", CmpOp::Lt),
    ("fewer than", CmpOp::Lt),
    ("under", CmpOp::Lt),
    ("below", CmpOp::Lt),
    ("<", CmpOp::Lt),
    ("not equal to", CmpOp::Ne),
    ("!=", CmpOp::Ne),
    ("≠", CmpOp::Ne),
    ("exactly", CmpOp::Eq),
    ("equal to", CmpOp::Eq),
    ("equals", CmpOp::Eq),
    ("==", CmpOp::Eq),
    ("=", CmpOp::Eq),
];

/// Words dropped from a subject.
const FILLER: &[&str] = &[
    "must", "should", "shall", "be", "is", "are", "have", "has", "the", "a", "an", "of", "to",
    "with", "contain", "contains", "need", "needs", "it", "also", "always", "may", "can",
    "could", "will", "any", "circumstances",
];

/// Words that invert the comparator that follows them.
const NEGATIONS: &[&str] = &[
    "not", "no", "never", "cannot", "can't", "mustn't", "shouldn't", "won't", "don't", "doesn't",
];

const UNITS: &[&str] = &[
    "percent", "pct", "milliseconds", "millisecond", "ms", "seconds", "second", "secs", "sec",
    "s", "minutes", "minute", "mins", "hours", "hour", "hrs", "h", "days", "day", "weeks",
    "week", "months", "month", "years", "year", "bytes", "byte", "kb", "mb", "gb", "tb",
    "characters", "character", "chars", "words", "word", "lines", "line", "items", "item",
    "users", "user", "requests", "rps", "times", "points", "dollars", "usd", "eur", "euros",
    "kg", "g", "km", "m", "cm", "mm", "px",
];

const NUMBER: &str = r"-?\d+(?:,\d+)*(?:\.\d+)?";

const PHRASE_CONFIDENCE: u8 = 80;
const SYMBOL_CONFIDENCE: u8 = 90;
const INHERITED_PENALTY: u8 = 10;
const DEFAULT_PENALTY: u8 = 30;
const UNIT_MISMATCH_PENALTY: u8 = 10;

// =============================================================================
// RESULT TYPES
// =============================================================================

/// One numeric threshold read from the criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumericConstraint {
    /// The subject as written, filler removed (`"response time"`).
    pub subject: String,
    /// The subject as a variable name (`"response_time"`).
    pub variable: String,
    pub comparator: CmpOp,
    #[serde(serialize_with = "serialize_rational")]
    pub threshold: BigRational,
    /// `%`, a currency sign, or a unit word.
    pub unit: Option<String>,
    /// The clause the constraint was read from.
    pub fragment: String,
    /// 0 to 100.
    pub confidence: u8,
}

/// A fragment that looked numeric but could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFragment {
    pub text: String,
    pub reason: String,
    /// 0 to 30.
    pub confidence: u8,
}

/// Everything read from one criteria text, in text order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    pub constraints: Vec<NumericConstraint>,
    pub skipped: Vec<SkippedFragment>,
}

impl Extraction {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

fn serialize_rational<S: Serializer>(value: &BigRational, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&expr::format_rational(value))
}

// =============================================================================
// EXTRACTOR
// =============================================================================

/// Turns criteria text into numeric constraints.
pub trait ConstraintExtractor: Send + Sync {
    /// Never fails: unreadable input ends up in `Extraction::skipped`.
    fn extract(&self, text: &str) -> Extraction;
}

/// Phrase-table extractor.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicExtractor {
    max_length: usize,
}

impl Default for HeuristicExtractor {
    fn default() -> Self {
        Self {
            max_length: MAX_CRITERIA_LENGTH,
        }
    }
}

impl HeuristicExtractor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan at most `max_length` bytes; the rest is reported as skipped.
    #[must_use]
    pub fn with_max_length(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl ConstraintExtractor for HeuristicExtractor {
    fn extract(&self, text: &str) -> Extraction {
        let mut out = Extraction::default();
        let mut cut = text.len().min(self.max_length);
        while !text.is_char_boundary(cut) {
            cut = cut.saturating_sub(1);
        }
        let (scanned, rest) = text.split_at(cut);

        for sentence in sentences(scanned) {
            let mut carry: Option<Subject> = None;
            for clause in clauses(sentence) {
                scan_clause(clause, &mut carry, &mut out);
            }
        }

        if !rest.trim().is_empty() {
            out.skipped.push(SkippedFragment {
                text: rest.chars().take(80).collect(),
                reason: format!(
                    "criteria longer than {} bytes, remainder not scanned",
                    self.max_length
                ),
                confidence: 0,
            });
        }
        out
    }
}

/// Extract with the default heuristic extractor.
#[must_use]
pub fn extract_numeric_constraints(text: &str) -> Extraction {
    HeuristicExtractor::default().extract(text)
}

// =============================================================================
// SPLITTING
// =============================================================================

/// Split on `;`, `!` (not `!=`), `?`, newlines, and `.` unless it sits between two digits.
fn sentences(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut out = Vec::new();
    let mut start = 0;
    for (k, &(at, c)) in chars.iter().enumerate() {
        let boundary = match c {
            ';' | '?' | '\n' => true,
            '!' => chars.get(k + 1).is_none_or(|(_, n)| *n != '='),
            '.' => {
                let digit_before = k
                    .checked_sub(1)
                    .and_then(|p| chars.get(p))
                    .is_some_and(|(_, p)| p.is_ascii_digit());
                let digit_after = chars.get(k + 1).is_some_and(|(_, n)| n.is_ascii_digit());
                !(digit_before && digit_after)
            }
            _ => false,
        };
        if boundary {
            out.push(&text[start..at]);
            start = at + c.len_utf8();
        }
    }
    out.push(&text[start..]);
    out.into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split a sentence on `,` (not inside a number), ` and ` and ` but `.
/// The `and` of `between X and Y` stays in its clause.
fn clauses(sentence: &str) -> Vec<&str> {
    let lower = sentence.to_ascii_lowercase();
    let mut out = Vec::new();
    let mut start = 0;
    let mut open_between = false;
    let mut i = 0;

    while let Some(c) = lower[i..].chars().next() {
        let rest = &lower[i..];
        if rest.starts_with("between ") && word_start(&lower, i) {
            open_between = true;
            i += "between ".len();
            continue;
        }
        let separator = if c == ',' {
            let digit_before = lower[..i].chars().next_back().is_some_and(|p| p.is_ascii_digit());
            let digit_after = lower[i + 1..].chars().next().is_some_and(|n| n.is_ascii_digit());
            (!(digit_before && digit_after)).then_some(1)
        } else if rest.starts_with(" and ") {
            if open_between {
                open_between = false;
                i += " and ".len();
                continue;
            }
            Some(" and ".len())
        } else if rest.starts_with(" but ") {
            Some(" but ".len())
        } else {
            None
        };

        match separator {
            Some(len) => {
                out.push(&sentence[start..i]);
                start = i + len;
                i = start;
                open_between = false;
            }
            None => i += c.len_utf8(),
        }
    }
    out.push(&sentence[start..]);
    out.into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn word_start(text: &str, at: usize) -> bool {
    !text[..at].chars().next_back().is_some_and(char::is_alphanumeric)
}

fn word_bounded(text: &str, start: usize, end: usize) -> bool {
    word_start(text, start) && !text[end..].chars().next().is_some_and(char::is_alphanumeric)
}

// =============================================================================
// CLAUSE SCANNING
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct Subject {
    text: String,
    variable: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubjectSource {
    Explicit,
    Inherited,
    Default,
}

fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: impl FnOnce() -> String) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(&pattern()).ok()).as_ref()
}

fn unit_pattern() -> String {
    let mut units = UNITS.to_vec();
    units.sort_by_key(|u| Reverse(u.len()));
    format!(r"%|(?:{})\b", units.join("|"))
}

/// Number (with optional currency and unit) right at the start of the text.
fn threshold_regex() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&CELL, || {
        format!(
            r"^\s*(?:of\s+)?(?P<cur>[$€£])?\s*(?P<num>{NUMBER})(?:\s*(?P<unit>{}))?",
            unit_pattern()
        )
    })
}

fn range_regex() -> Option<&'static Regex> {
    static CELL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&CELL, || {
        let units = unit_pattern();
        format!(
            r"\b(?:between|from)\s+(?P<cur>[$€£])?\s*(?P<lo>{NUMBER})(?:\s*(?P<unit_lo>{units}))?\s+(?:and|to)\s+[$€£]?\s*(?P<hi>{NUMBER})(?:\s*(?P<unit_hi>{units}))?"
        )
    })
}

fn read_number(text: &str) -> Option<BigRational> {
    expr::parse_number(&text.replace(',', ""))
}

fn unit_of(caps: &Captures<'_>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| caps.name(name))
        .map(|m| m.as_str().to_string())
}

/// A comparator phrase found in a clause.
#[derive(Debug, Clone, Copy)]
struct PhraseHit {
    start: usize,
    end: usize,
    op: CmpOp,
    symbolic: bool,
}

/// Every comparator phrase in `lower`, by position, longest first on ties.
fn phrase_hits(lower: &str) -> Vec<PhraseHit> {
    let mut hits = Vec::new();
    for (phrase, op) in PHRASES {
        let symbolic = !phrase.starts_with(|c: char| c.is_ascii_alphabetic());
        hits.extend(
            lower
                .match_indices(phrase)
                .map(|(at, _)| (at, at + phrase.len()))
                .filter(|&(start, end)| symbolic || word_bounded(lower, start, end))
                .map(|(start, end)| PhraseHit {
                    start,
                    end,
                    op: *op,
                    symbolic,
                }),
        );
    }
    hits.sort_by_key(|hit| (hit.start, Reverse(hit.end)));
    hits
}

/// The text of `prefix` outside the phrase hits that precede the comparator.
fn prefix_segments<'a>(prefix: &'a str, earlier: &[PhraseHit]) -> Vec<&'a str> {
    let mut segments = Vec::new();
    let mut cursor = 0;
    for hit in earlier {
        if hit.start > cursor {
            segments.push(&prefix[cursor..hit.start]);
        }
        cursor = cursor.max(hit.end.min(prefix.len()));
    }
    segments.push(&prefix[cursor..]);
    segments
}

/// Subject from the leading segment, else from the one next to the comparator.
/// Negations count in every segment.
fn read_subject_between(prefix: &str, earlier: &[PhraseHit]) -> (Option<Subject>, bool) {
    let segments = prefix_segments(prefix, earlier);
    let mut negated = false;
    let mut subject = None;
    let mut last = None;
    for (k, segment) in segments.iter().enumerate() {
        let (found, flips) = read_subject(segment);
        negated ^= flips;
        if k == 0 {
            subject = found;
        } else if found.is_some() {
            last = found;
        }
    }
    (subject.or(last), negated)
}

/// Read the subject words before a comparator. Returns the subject and whether it was negated.
fn read_subject(prefix: &str) -> (Option<Subject>, bool) {
    let mut negated = false;
    let mut words = Vec::new();
    for raw in prefix.split_whitespace() {
        let word = raw.trim_matches(|c: char| !c.is_alphanumeric());
        if word.is_empty() {
            continue;
        }
        if NEGATIONS.contains(&word) {
            negated = !negated;
        } else if !FILLER.contains(&word) {
            words.push(word);
        }
    }
    let text = words.join(" ");
    let subject = variable_name(&text).map(|variable| Subject { text, variable });
    (subject, negated)
}

/// Lowercase, `_`-joined identifier for a subject, `None` if nothing usable remains.
fn variable_name(subject: &str) -> Option<String> {
    let mut name = String::new();
    for c in subject.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c.to_ascii_lowercase());
        } else if !name.ends_with('_') && !name.is_empty() {
            name.push('_');
        }
    }
    let name = name.trim_end_matches('_');
    if name.is_empty() {
        return None;
    }
    let mut name = if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("n_{name}")
    } else {
        name.to_string()
    };
    if expr::is_keyword(&name) {
        name.push_str("_value");
    }
    expr::is_identifier(&name).then_some(name)
}

fn resolve(found: Option<Subject>, carry: &mut Option<Subject>) -> (Subject, SubjectSource) {
    if let Some(subject) = found {
        *carry = Some(subject.clone());
        return (subject, SubjectSource::Explicit);
    }
    match carry {
        Some(previous) => (previous.clone(), SubjectSource::Inherited),
        None => (
            Subject {
                text: DEFAULT_SUBJECT.to_string(),
                variable: DEFAULT_SUBJECT.to_string(),
            },
            SubjectSource::Default,
        ),
    }
}

fn skip(out: &mut Extraction, text: &str, reason: &str, confidence: u8) {
    out.skipped.push(SkippedFragment {
        text: text.to_string(),
        reason: reason.to_string(),
        confidence,
    });
}

fn push(
    out: &mut Extraction,
    subject: &Subject,
    source: SubjectSource,
    base: u8,
    comparator: CmpOp,
    threshold: BigRational,
    unit: Option<String>,
    fragment: &str,
) {
    let mut confidence = match source {
        SubjectSource::Explicit => base,
        SubjectSource::Inherited => base.saturating_sub(INHERITED_PENALTY),
        SubjectSource::Default => base.saturating_sub(DEFAULT_PENALTY),
    };
    let mismatch = unit.is_some()
        && out
            .constraints
            .iter()
            .any(|c| c.variable == subject.variable && c.unit.is_some() && c.unit != unit);
    if mismatch {
        confidence = confidence.saturating_sub(UNIT_MISMATCH_PENALTY);
    }
    out.constraints.push(NumericConstraint {
        subject: subject.text.clone(),
        variable: subject.variable.clone(),
        comparator,
        threshold,
        unit,
        fragment: fragment.to_string(),
        confidence,
    });
}

fn scan_clause(clause: &str, carry: &mut Option<Subject>, out: &mut Extraction) {
    let lower = clause.to_ascii_lowercase();
    let has_digit = lower.chars().any(|c| c.is_ascii_digit());

    if let Some(caps) = range_regex().and_then(|re| re.captures(&lower)) {
        let start = caps.get(0).map_or(0, |m| m.start());
        let bounds = caps
            .name("lo")
            .zip(caps.name("hi"))
            .and_then(|(lo, hi)| Some((read_number(lo.as_str())?, read_number(hi.as_str())?)));
        let Some((lo, hi)) = bounds else {
            skip(out, clause, "range bound could not be read as a number", 10);
            return;
        };
        if lo > hi {
            skip(out, clause, "range bounds are inverted", 30);
            return;
        }
        let unit = unit_of(&caps, &["unit_hi", "unit_lo", "cur"]);
        let (found, _) = read_subject(&lower[..start]);
        let (subject, source) = resolve(found, carry);
        push(out, &subject, source, PHRASE_CONFIDENCE, CmpOp::Ge, lo, unit.clone(), clause);
        push(out, &subject, source, PHRASE_CONFIDENCE, CmpOp::Le, hi, unit, clause);
        return;
    }

    let hits = phrase_hits(&lower);
    if hits.is_empty() {
        if has_digit {
            if lower.split_whitespace().any(|w| w == "between") {
                skip(out, clause, "malformed range", 20);
            } else {
                skip(out, clause, "number without a comparator", 10);
            }
        }
        return;
    }

    let chosen = hits.iter().enumerate().find_map(|(k, hit)| {
        let caps = threshold_regex()?.captures(&lower[hit.end..])?;
        Some((k, *hit, caps))
    });
    let Some((k, hit, caps)) = chosen else {
        // The subject still carries into the next clause of the sentence.
        if let Some(first) = hits.first()
            && let (Some(subject), _) = read_subject(&lower[..first.start])
        {
            *carry = Some(subject);
        }
        skip(out, clause, "comparator without a number", 20);
        return;
    };
    let Some(threshold) = caps.name("num").and_then(|m| read_number(m.as_str())) else {
        skip(out, clause, "threshold could not be read as a number", 10);
        return;
    };
    let unit = unit_of(&caps, &["unit", "cur"]);
    let earlier: Vec<PhraseHit> = hits[..k]
        .iter()
        .copied()
        .filter(|h| h.start < hit.start)
        .collect();
    let (found, negated) = read_subject_between(&lower[..hit.start], &earlier);
    let (subject, source) = resolve(found, carry);
    let op = if negated { hit.op.negate() } else { hit.op };
    let base = if hit.symbolic {
        SYMBOL_CONFIDENCE
    } else {
        PHRASE_CONFIDENCE
    };
    push(out, &subject, source, base, op, threshold, unit, clause);
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn num(text: &str) -> BigRational {
        expr::parse_number(text).expect("number")
    }

    fn summary(extraction: &Extraction) -> Vec<(String, CmpOp, String, u8)> {
        extraction
            .constraints
            .iter()
            .map(|c| {
                (
                    c.variable.clone(),
                    c.comparator,
                    expr::format_rational(&c.threshold),
                    c.confidence,
                )
            })
            .collect()
    }

    #[test]
    fn subjectless_clauses_fall_back_to_value() {
        let out = extract_numeric_constraints("must be at least 10 and less than 5");
        assert_eq!(
            summary(&out),
            vec![
                ("value".to_string(), CmpOp::Ge, "10".to_string(), 50),
                ("value".to_string(), CmpOp::Lt, "5".to_string(), 50),
            ]
        );
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn subject_is_inherited_within_a_sentence() {
        let out =
            extract_numeric_constraints("Password must be at least 8 characters and at most 64.");
        assert_eq!(
            summary(&out),
            vec![
                ("password".to_string(), CmpOp::Ge, "8".to_string(), 80),
                ("password".to_string(), CmpOp::Le, "64".to_string(), 70),
            ]
        );
        assert_eq!(out.constraints[0].unit.as_deref(), Some("characters"));
        assert_eq!(out.constraints[1].unit, None);
    }

    #[test]
    fn units_and_decimals() {
        let out =
            extract_numeric_constraints("Response time should be under 200 ms; uptime above 99.9%.");
        assert_eq!(out.constraints.len(), 2);
        let first = &out.constraints[0];
        assert_eq!(first.variable, "response_time");
        assert_eq!(first.subject, "response time");
        assert_eq!(first.comparator, CmpOp::Lt);
        assert_eq!(first.unit.as_deref(), Some("ms"));

        let second = &out.constraints[1];
        assert_eq!(second.variable, "uptime");
        assert_eq!(second.threshold, num("99.9"));
        assert_eq!(second.unit.as_deref(), Some("%"));
    }

    #[test]
    fn ranges_emit_two_bounds() {
        let out = extract_numeric_constraints("The batch size must be between 16 and 256.");
        assert_eq!(
            summary(&out),
            vec![
                ("batch_size".to_string(), CmpOp::Ge, "16".to_string(), 80),
                ("batch_size".to_string(), CmpOp::Le, "256".to_string(), 80),
            ]
        );

        let out = extract_numeric_constraints("Workers run from 2 to 8 threads");
        assert_eq!(out.constraints.len(), 2);
        assert_eq!(out.constraints[0].variable, "workers_run");
    }

    #[test]
    fn inverted_range_is_skipped() {
        let out = extract_numeric_constraints("Retries between 10 and 5");
        assert!(out.constraints.is_empty());
        assert_eq!(out.skipped.len(), 1);
        assert!(out.skipped[0].reason.contains("inverted"));
        assert!(out.skipped[0].confidence <= 30);
    }

    #[test]
    fn negation_inverts_comparator() {
        let out = extract_numeric_constraints("The payload must not exceed 5 MB");
        assert_eq!(out.constraints[0].variable, "payload");
        assert_eq!(out.constraints[0].comparator, CmpOp::Le);
        assert_eq!(out.constraints[0].unit.as_deref(), Some("mb"));
    }

    #[test]
    fn numberless_phrase_before_the_threshold_is_passed_over() {
        let out = extract_numeric_constraints("Under no circumstances may latency exceed 5");
        assert_eq!(
            summary(&out),
            vec![("latency".to_string(), CmpOp::Le, "5".to_string(), 80)]
        );
        assert!(out.skipped.is_empty());

        let out = extract_numeric_constraints("Latency under load stays under 5 ms");
        assert_eq!(
            summary(&out),
            vec![("latency".to_string(), CmpOp::Lt, "5".to_string(), 80)]
        );
        assert_eq!(out.constraints[0].unit.as_deref(), Some("ms"));
    }

    #[test]
    fn numberless_clause_still_names_the_subject() {
        let out = extract_numeric_constraints("latency must be under control and at most 5");
        assert_eq!(
            summary(&out),
            vec![("latency".to_string(), CmpOp::Le, "5".to_string(), 70)]
        );
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].reason, "comparator without a number");
    }

    #[test]
    fn symbols_score_higher_than_phrases() {
        let out = extract_numeric_constraints("x >= 3, y ≤ 4");
        assert_eq!(
            summary(&out),
            vec![
                ("x".to_string(), CmpOp::Ge, "3".to_string(), 90),
                ("y".to_string(), CmpOp::Le, "4".to_string(), 90),
            ]
        );
    }

    #[test]
    fn longer_phrase_wins_on_overlap() {
        let out = extract_numeric_constraints("Queue depth no more than 1,000 items");
        assert_eq!(out.constraints[0].comparator, CmpOp::Le);
        assert_eq!(out.constraints[0].threshold, num("1000"));
        assert_eq!(out.constraints[0].unit.as_deref(), Some("items"));
    }

    #[test]
    fn unreadable_fragments_are_skipped() {
        let out = extract_numeric_constraints("Version 2 is required. Latency must be below the limit.");
        assert!(out.constraints.is_empty());
        let reasons: Vec<&str> = out.skipped.iter().map(|s| s.reason.as_str()).collect();
        assert_eq!(
            reasons,
            vec!["number without a comparator", "comparator without a number"]
        );
    }

    #[test]
    fn plain_prose_is_ignored() {
        let out = extract_numeric_constraints("The dialog closes when the user clicks outside.");
        assert!(out.constraints.is_empty());
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn oversized_input_is_truncated_not_rejected() {
        let text = format!("x > 1. {}", "é".repeat(20_000));
        let out = extract_numeric_constraints(&text);
        assert_eq!(out.constraints.len(), 1);
        assert_eq!(out.skipped.last().map(|s| s.confidence), Some(0));
    }

    #[test]
    fn unit_mismatch_lowers_confidence() {
        let out = extract_numeric_constraints("Timeout at least 5 seconds. Timeout at most 100 ms.");
        assert_eq!(out.constraints[0].confidence, 80);
        assert_eq!(out.constraints[1].confidence, 70);
    }

    #[test]
    fn threshold_serializes_as_text() {
        let out = extract_numeric_constraints("cost below 2.5");
        let json = serde_json::to_value(&out.constraints[0]).expect("json");
        assert_eq!(json["threshold"], serde_json::json!("5/2"));
        assert_eq!(json["comparator"], serde_json::json!("<"));
    }
}
