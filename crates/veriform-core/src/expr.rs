//! # Expression Language
//!
//! The textual syntax of constraint items and its structured form.
//!
//! ```text
//! item     := IDENT ':' SORT | formula
//! formula  := disj (('=>' | 'implies') formula)?
//! disj     := conj (('or' | '||') conj)*
//! conj     := neg (('and' | '&&') neg)*
//! neg      := ('not' | '!') neg | cmp
//! cmp      := sum (CMP sum)?            CMP: >= <= > < == = !=
//! sum      := product (('+' | '-') product)*
//! product  := unary (('*' | '/') unary)*
//! unary    := '-' unary | atom
//! atom     := NUMBER | IDENT | 'true' | 'false' | '(' formula ')'
//! ```
//!
//! Numbers are exact (`BigRational`). Division is only allowed by a
//! non-zero constant, so every parsed expression has a total meaning.

use crate::SolverError;
use crate::primitives::{MAX_EXPRESSION_DEPTH, MAX_NUMBER_DIGITS};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// OPERATORS
// =============================================================================

/// Comparison operator. Serialized as its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CmpOp {
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
}

impl CmpOp {
    /// Surface syntax of the operator.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Ge => ">=",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Eq => "==",
            Self::Ne => "!=",
        }
    }

    /// The operator with operands swapped: `a op b` iff `b op.flip() a`.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Ge => Self::Le,
            Self::Le => Self::Ge,
            Self::Gt => Self::Lt,
            Self::Lt => Self::Gt,
            Self::Eq => Self::Eq,
            Self::Ne => Self::Ne,
        }
    }

    /// The logical negation: `not (a op b)` iff `a op.negate() b`.
    #[must_use]
    pub const fn negate(self) -> Self {
        match self {
            Self::Ge => Self::Lt,
            Self::Le => Self::Gt,
            Self::Gt => Self::Le,
            Self::Lt => Self::Ge,
            Self::Eq => Self::Ne,
            Self::Ne => Self::Eq,
        }
    }

    /// Evaluate the comparison on two constants.
    #[must_use]
    pub fn holds(self, lhs: &BigRational, rhs: &BigRational) -> bool {
        match self {
            Self::Ge => lhs >= rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Lt => lhs < rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
        }
    }
}

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
        }
    }
}

// =============================================================================
// EXPRESSION TREE
// =============================================================================

/// Structured constraint expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Num(BigRational),
    Var(String),
    Bool(bool),
    Neg(Box<Expr>),
    Arith(ArithOp, Box<Expr>, Box<Expr>),
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Implies(Box<Expr>, Box<Expr>),
}

/// How a variable is used inside an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    Numeric,
    Boolean,
}

impl Usage {
    const fn describe(self) -> &'static str {
        match self {
            Self::Numeric => "a number",
            Self::Boolean => "a formula",
        }
    }
}

impl Expr {
    /// Build a comparison `var op value`.
    #[must_use]
    pub fn compare_var(var: &str, op: CmpOp, value: BigRational) -> Self {
        Self::Cmp(op, Box::new(Self::Var(var.to_string())), Box::new(Self::Num(value)))
    }

    /// Value of a variable-free arithmetic expression.
    #[must_use]
    pub fn constant(&self) -> Option<BigRational> {
        match self {
            Self::Num(n) => Some(n.clone()),
            Self::Neg(inner) => inner.constant().map(|n| -n),
            Self::Arith(op, lhs, rhs) => {
                let (a, b) = (lhs.constant()?, rhs.constant()?);
                match op {
                    ArithOp::Add => Some(a + b),
                    ArithOp::Sub => Some(a - b),
                    ArithOp::Mul => Some(a * b),
                    ArithOp::Div if b.is_zero() => None,
                    ArithOp::Div => Some(a / b),
                }
            }
            _ => None,
        }
    }

    /// Record how each variable is used, in a context that expects `ctx`.
    ///
    /// Fails if the expression is ill-sorted: a number where a formula is
    /// expected, or a variable used both ways.
    pub fn collect_usage(
        &self,
        ctx: Usage,
        out: &mut BTreeMap<String, Usage>,
    ) -> Result<(), SolverError> {
        let expect = |wanted: Usage, what: &str| {
            if ctx == wanted {
                Ok(())
            } else {
                Err(SolverError::InvalidConstraint(format!(
                    "{what} used where {} is expected",
                    ctx.describe()
                )))
            }
        };
        match self {
            Self::Num(n) => expect(Usage::Numeric, &format!("number {}", format_rational(n))),
            Self::Bool(b) => expect(Usage::Boolean, &format!("literal {b}")),
            Self::Var(name) => match out.get(name) {
                Some(prev) if *prev != ctx => Err(SolverError::InvalidConstraint(format!(
                    "'{name}' is used both as {} and as {}",
                    prev.describe(),
                    ctx.describe()
                ))),
                Some(_) => Ok(()),
                None => {
                    out.insert(name.clone(), ctx);
                    Ok(())
                }
            },
            Self::Neg(inner) => {
                expect(Usage::Numeric, "negation")?;
                inner.collect_usage(Usage::Numeric, out)
            }
            Self::Arith(op, lhs, rhs) => {
                expect(Usage::Numeric, &format!("'{}' term", op.symbol()))?;
                lhs.collect_usage(Usage::Numeric, out)?;
                rhs.collect_usage(Usage::Numeric, out)
            }
            Self::Cmp(op, lhs, rhs) => {
                expect(Usage::Boolean, &format!("'{}' comparison", op.symbol()))?;
                lhs.collect_usage(Usage::Numeric, out)?;
                rhs.collect_usage(Usage::Numeric, out)
            }
            Self::Not(inner) => {
                expect(Usage::Boolean, "'not'")?;
                inner.collect_usage(Usage::Boolean, out)
            }
            Self::And(parts) | Self::Or(parts) => {
                expect(Usage::Boolean, "connective")?;
                parts
                    .iter()
                    .try_for_each(|p| p.collect_usage(Usage::Boolean, out))
            }
            Self::Implies(lhs, rhs) => {
                expect(Usage::Boolean, "implication")?;
                lhs.collect_usage(Usage::Boolean, out)?;
                rhs.collect_usage(Usage::Boolean, out)
            }
        }
    }

    /// Linear form of an arithmetic expression, `None` if it is non-linear.
    #[must_use]
    pub fn linear(&self) -> Option<LinearForm> {
        match self {
            Self::Num(n) => Some(LinearForm::constant(n.clone())),
            Self::Var(name) => Some(LinearForm::variable(name)),
            Self::Neg(inner) => Some(inner.linear()?.scale(&-BigRational::one())),
            Self::Arith(op, lhs, rhs) => {
                let (a, b) = (lhs.linear()?, rhs.linear()?);
                match op {
                    ArithOp::Add => Some(a.add(b)),
                    ArithOp::Sub => Some(a.add(b.scale(&-BigRational::one()))),
                    ArithOp::Mul => match (a.as_constant(), b.as_constant()) {
                        (Some(k), _) => Some(b.scale(&k)),
                        (_, Some(k)) => Some(a.scale(&k)),
                        _ => None,
                    },
                    ArithOp::Div => {
                        let k = b.as_constant()?;
                        if k.is_zero() {
                            return None;
                        }
                        Some(a.scale(&k.recip()))
                    }
                }
            }
            _ => None,
        }
    }

    /// Split top-level conjunctions into their conjuncts.
    #[must_use]
    pub fn conjuncts(&self) -> Vec<&Expr> {
        match self {
            Self::And(parts) => parts.iter().flat_map(Expr::conjuncts).collect(),
            other => vec![other],
        }
    }

    const fn precedence(&self) -> u8 {
        match self {
            Self::Implies(..) => 1,
            Self::Or(_) => 2,
            Self::And(_) => 3,
            Self::Not(_) => 4,
            Self::Cmp(..) => 5,
            Self::Arith(ArithOp::Add | ArithOp::Sub, ..) => 6,
            Self::Arith(ArithOp::Mul | ArithOp::Div, ..) => 7,
            Self::Neg(_) => 8,
            Self::Num(_) | Self::Var(_) | Self::Bool(_) => 9,
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, parent: u8) -> fmt::Result {
        let own = self.precedence();
        if own < parent {
            f.write_str("(")?;
        }
        match self {
            Self::Num(n) if n.is_integer() => write!(f, "{}", n.numer())?,
            Self::Num(n) => match format_decimal(n) {
                Some(decimal) => f.write_str(&decimal)?,
                None => write!(f, "({}/{})", n.numer(), n.denom())?,
            },
            Self::Var(name) => f.write_str(name)?,
            Self::Bool(b) => write!(f, "{b}")?,
            Self::Neg(inner) => {
                f.write_str("-")?;
                inner.fmt_prec(f, own)?;
            }
            Self::Arith(op, lhs, rhs) => {
                lhs.fmt_prec(f, own)?;
                write!(f, " {} ", op.symbol())?;
                rhs.fmt_prec(f, own + 1)?;
            }
            Self::Cmp(op, lhs, rhs) => {
                lhs.fmt_prec(f, own + 1)?;
                write!(f, " {} ", op.symbol())?;
                rhs.fmt_prec(f, own + 1)?;
            }
            Self::Not(inner) => {
                f.write_str("not ")?;
                inner.fmt_prec(f, own)?;
            }
            Self::And(parts) | Self::Or(parts) => {
                let sep = if matches!(self, Self::And(_)) { " and " } else { " or " };
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    part.fmt_prec(f, own + 1)?;
                }
            }
            Self::Implies(lhs, rhs) => {
                lhs.fmt_prec(f, own + 1)?;
                f.write_str(" => ")?;
                rhs.fmt_prec(f, own)?;
            }
        }
        if own < parent {
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}

/// Render a rational as `n` or `n/d`.
#[must_use]
pub fn format_rational(value: &BigRational) -> String {
    if value.is_integer() {
        value.numer().to_string()
    } else {
        format!("{}/{}", value.numer(), value.denom())
    }
}

/// Render a rational as a terminating decimal (`2.5`, `-0.125`), `None` if it repeats.
#[must_use]
pub fn format_decimal(value: &BigRational) -> Option<String> {
    let two = BigInt::from(2u8);
    let five = BigInt::from(5u8);
    let mut rest = value.denom().clone();
    let (mut twos, mut fives) = (0usize, 0usize);
    while (&rest % &two).is_zero() {
        rest /= &two;
        twos += 1;
    }
    while (&rest % &five).is_zero() {
        rest /= &five;
        fives += 1;
    }
    if !rest.is_one() {
        return None;
    }
    let places = twos.max(fives);
    let scale = BigRational::from_integer(num_traits::pow(BigInt::from(10u8), places));
    let digits = (value.clone() * scale).to_integer().abs().to_string();
    let digits = format!("{digits:0>width$}", width = places + 1);
    let (int_part, frac_part) = digits.split_at(digits.len() - places);
    let sign = if value.is_negative() { "-" } else { "" };
    Some(if frac_part.is_empty() {
        format!("{sign}{int_part}")
    } else {
        format!("{sign}{int_part}.{frac_part}")
    })
}

// =============================================================================
// LINEAR FORMS
// =============================================================================

/// `sum(coeff * var) + constant`, with zero coefficients pruned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinearForm {
    pub coeffs: BTreeMap<String, BigRational>,
    pub constant: BigRational,
}

impl LinearForm {
    fn constant(value: BigRational) -> Self {
        Self {
            coeffs: BTreeMap::new(),
            constant: value,
        }
    }

    fn variable(name: &str) -> Self {
        let mut coeffs = BTreeMap::new();
        coeffs.insert(name.to_string(), BigRational::one());
        Self {
            coeffs,
            constant: BigRational::zero(),
        }
    }

    fn add(mut self, other: Self) -> Self {
        for (name, coeff) in other.coeffs {
            let entry = self.coeffs.entry(name).or_insert_with(BigRational::zero);
            *entry += coeff;
        }
        self.coeffs.retain(|_, c| !c.is_zero());
        self.constant += other.constant;
        self
    }

    fn scale(mut self, k: &BigRational) -> Self {
        if k.is_zero() {
            return Self::constant(BigRational::zero());
        }
        for coeff in self.coeffs.values_mut() {
            *coeff *= k;
        }
        self.constant *= k;
        self
    }

    /// The constant value if no variable remains.
    #[must_use]
    pub fn as_constant(&self) -> Option<BigRational> {
        self.coeffs.is_empty().then(|| self.constant.clone())
    }

    /// `lhs - rhs`, the normal form of a comparison `lhs op rhs` against zero.
    #[must_use]
    pub fn difference(lhs: Self, rhs: Self) -> Self {
        lhs.add(rhs.scale(&-BigRational::one()))
    }

    /// The single variable and its coefficient, if exactly one remains.
    #[must_use]
    pub fn single_variable(&self) -> Option<(&str, &BigRational)> {
        let mut iter = self.coeffs.iter();
        let (name, coeff) = iter.next()?;
        iter.next().is_none().then_some((name.as_str(), coeff))
    }
}

// =============================================================================
// LEXER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Num(BigRational),
    Ident(String),
    True,
    False,
    And,
    Or,
    Not,
    Implies,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Colon,
    Cmp(CmpOp),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => f.write_str(&format_rational(n)),
            Self::Ident(name) => f.write_str(name),
            Self::True => f.write_str("true"),
            Self::False => f.write_str("false"),
            Self::And => f.write_str("and"),
            Self::Or => f.write_str("or"),
            Self::Not => f.write_str("not"),
            Self::Implies => f.write_str("=>"),
            Self::Plus => f.write_str("+"),
            Self::Minus => f.write_str("-"),
            Self::Star => f.write_str("*"),
            Self::Slash => f.write_str("/"),
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
            Self::Colon => f.write_str(":"),
            Self::Cmp(op) => f.write_str(op.symbol()),
        }
    }
}

fn invalid(message: impl Into<String>) -> SolverError {
    SolverError::InvalidConstraint(message.into())
}

/// Whether `word` is reserved by the expression language.
#[must_use]
pub fn is_keyword(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "and" | "or" | "not" | "true" | "false" | "implies"
    )
}

/// Whether `name` is a valid variable identifier.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !is_keyword(name)
}

fn lex(source: &str) -> Result<Vec<Token>, SolverError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c.is_ascii_digit() {
            let mut int_part = String::new();
            let mut frac_part = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                int_part.push(d);
                chars.next();
            }
            if chars.peek().is_some_and(|&(_, d)| d == '.') {
                chars.next();
                while let Some(&(_, d)) = chars.peek() {
                    if !d.is_ascii_digit() {
                        break;
                    }
                    frac_part.push(d);
                    chars.next();
                }
                if frac_part.is_empty() {
                    return Err(invalid(format!("malformed number at offset {offset}")));
                }
            }
            tokens.push(Token::Num(parse_decimal(&int_part, &frac_part)?));
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let mut word = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if !(d.is_ascii_alphanumeric() || d == '_') {
                    break;
                }
                word.push(d);
                chars.next();
            }
            let token = match word.to_ascii_lowercase().as_str() {
                "and" => Token::And,
                "or" => Token::Or,
                "not" => Token::Not,
                "true" => Token::True,
                "false" => Token::False,
                "implies" => Token::Implies,
                _ => Token::Ident(word),
            };
            tokens.push(token);
            continue;
        }

        chars.next();
        let next = chars.peek().map(|&(_, d)| d);
        let mut take = |tok: Token| {
            chars.next();
            tok
        };
        let token = match (c, next) {
            ('>', Some('=')) => take(Token::Cmp(CmpOp::Ge)),
            ('<', Some('=')) => take(Token::Cmp(CmpOp::Le)),
            ('=', Some('=')) => take(Token::Cmp(CmpOp::Eq)),
            ('=', Some('>')) => take(Token::Implies),
            ('!', Some('=')) => take(Token::Cmp(CmpOp::Ne)),
            ('&', Some('&')) => take(Token::And),
            ('|', Some('|')) => take(Token::Or),
            ('>', _) => Token::Cmp(CmpOp::Gt),
            ('<', _) => Token::Cmp(CmpOp::Lt),
            ('=', _) => Token::Cmp(CmpOp::Eq),
            ('≥', _) => Token::Cmp(CmpOp::Ge),
            ('≤', _) => Token::Cmp(CmpOp::Le),
            ('≠', _) => Token::Cmp(CmpOp::Ne),
            ('!', _) => Token::Not,
            ('+', _) => Token::Plus,
            ('-', _) => Token::Minus,
            ('*', _) => Token::Star,
            ('/', _) => Token::Slash,
            ('(', _) => Token::LParen,
            (')', _) => Token::RParen,
            (':', _) => Token::Colon,
            _ => {
                return Err(invalid(format!(
                    "unexpected character '{c}' at offset {offset}"
                )));
            }
        };
        tokens.push(token);
    }

    Ok(tokens)
}

/// Parse `int_part.frac_part` into an exact rational.
fn parse_decimal(int_part: &str, frac_part: &str) -> Result<BigRational, SolverError> {
    if int_part.len() + frac_part.len() > MAX_NUMBER_DIGITS {
        return Err(invalid(format!(
            "numeric literal exceeds {MAX_NUMBER_DIGITS} digits"
        )));
    }
    let digits = format!("{int_part}{frac_part}");
    let numer: BigInt = digits
        .parse()
        .map_err(|_| invalid(format!("malformed number '{int_part}.{frac_part}'")))?;
    let denom = num_traits::pow(BigInt::from(10u8), frac_part.len());
    Ok(BigRational::new(numer, denom))
}

/// Parse an optionally signed decimal (`-12`, `3.25`) into an exact rational.
#[must_use]
pub fn parse_number(text: &str) -> Option<BigRational> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    let well_formed = !int_part.is_empty()
        && int_part.chars().all(|c| c.is_ascii_digit())
        && frac_part.chars().all(|c| c.is_ascii_digit())
        && !(digits.contains('.') && frac_part.is_empty());
    if !well_formed {
        return None;
    }
    let value = parse_decimal(int_part, frac_part).ok()?;
    Some(if negative { -value } else { value })
}

// =============================================================================
// PARSER
// =============================================================================

/// A parsed item: either a declaration or an assertion formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Declaration { name: String, sort: String },
    Assertion(Expr),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn enter(&mut self) -> Result<(), SolverError> {
        self.depth += 1;
        if self.depth > MAX_EXPRESSION_DEPTH {
            return Err(invalid(format!(
                "expression nested deeper than {MAX_EXPRESSION_DEPTH} levels"
            )));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn formula(&mut self) -> Result<Expr, SolverError> {
        self.enter()?;
        let lhs = self.disjunction()?;
        let result = if self.eat(&Token::Implies) {
            let rhs = self.formula()?;
            Expr::Implies(Box::new(lhs), Box::new(rhs))
        } else {
            lhs
        };
        self.leave();
        Ok(result)
    }

    fn disjunction(&mut self) -> Result<Expr, SolverError> {
        let mut parts = vec![self.conjunction()?];
        while self.eat(&Token::Or) {
            parts.push(self.conjunction()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Expr::Or(parts)
        })
    }

    fn conjunction(&mut self) -> Result<Expr, SolverError> {
        let mut parts = vec![self.negation()?];
        while self.eat(&Token::And) {
            parts.push(self.negation()?);
        }
        Ok(if parts.len() == 1 {
            parts.remove(0)
        } else {
            Expr::And(parts)
        })
    }

    fn negation(&mut self) -> Result<Expr, SolverError> {
        if self.eat(&Token::Not) {
            self.enter()?;
            let inner = self.negation()?;
            self.leave();
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, SolverError> {
        let lhs = self.sum()?;
        if let Some(Token::Cmp(op)) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.sum()?;
            if let Some(Token::Cmp(next)) = self.peek() {
                return Err(invalid(format!(
                    "chained comparison '{}' is not supported",
                    next.symbol()
                )));
            }
            return Ok(Expr::Cmp(op, Box::new(lhs), Box::new(rhs)));
        }
        Ok(lhs)
    }

    fn sum(&mut self) -> Result<Expr, SolverError> {
        let mut acc = self.product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => ArithOp::Add,
                Some(Token::Minus) => ArithOp::Sub,
                _ => return Ok(acc),
            };
            self.pos += 1;
            let rhs = self.product()?;
            acc = Expr::Arith(op, Box::new(acc), Box::new(rhs));
        }
    }

    fn product(&mut self) -> Result<Expr, SolverError> {
        let mut acc = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => ArithOp::Mul,
                Some(Token::Slash) => ArithOp::Div,
                _ => return Ok(acc),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            if op == ArithOp::Div {
                match rhs.constant() {
                    Some(k) if k.is_zero() => return Err(invalid("division by zero")),
                    Some(_) => {}
                    None => return Err(invalid("division is only allowed by a constant")),
                }
            }
            acc = Expr::Arith(op, Box::new(acc), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, SolverError> {
        if self.eat(&Token::Minus) {
            self.enter()?;
            let inner = self.unary()?;
            self.leave();
            // Fold literal negation so `-3` is the number -3.
            return Ok(match inner {
                Expr::Num(n) => Expr::Num(-n),
                other => Expr::Neg(Box::new(other)),
            });
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<Expr, SolverError> {
        match self.advance() {
            Some(Token::Num(n)) => Ok(Expr::Num(n)),
            Some(Token::Ident(name)) => Ok(Expr::Var(name)),
            Some(Token::True) => Ok(Expr::Bool(true)),
            Some(Token::False) => Ok(Expr::Bool(false)),
            Some(Token::LParen) => {
                let inner = self.formula()?;
                if !self.eat(&Token::RParen) {
                    return Err(invalid("missing closing ')'"));
                }
                Ok(inner)
            }
            Some(other) => Err(invalid(format!("unexpected '{other}'"))),
            None => Err(invalid("unexpected end of expression")),
        }
    }
}

/// Parse the source text of an item.
///
/// Returns the raw parse; sort names and sort consistency are checked by the caller.
pub fn parse_item(source: &str) -> Result<Parsed, SolverError> {
    let tokens = lex(source)?;
    if tokens.is_empty() {
        return Err(invalid("empty constraint"));
    }

    if let [Token::Ident(name), Token::Colon, Token::Ident(sort)] = tokens.as_slice() {
        return Ok(Parsed::Declaration {
            name: name.clone(),
            sort: sort.clone(),
        });
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.formula()?;
    if let Some(extra) = parser.peek() {
        return Err(invalid(format!("unexpected '{extra}' after expression")));
    }
    Ok(Parsed::Assertion(expr))
}

/// Parse a formula (never a declaration).
pub fn parse_formula(source: &str) -> Result<Expr, SolverError> {
    match parse_item(source)? {
        Parsed::Assertion(expr) => Ok(expr),
        Parsed::Declaration { .. } => Err(invalid(
            "expected a formula but found a declaration",
        )),
    }
}

// =============================================================================
// TESTS
// =============================================================================
