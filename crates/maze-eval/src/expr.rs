//! The `?` predicate language.
//!
//! Expressions are parsed once into an [`Expr`] tree and then interpreted
//! against each state's [`StateFacts`]. Names that can appear:
//!
//! - `open` / `open_count`: number of open doors
//! - `closed` / `closed_count`: number of closed doors
//! - `path` / `path_length`: number of cells on the recorded path
//! - `A`, `A.open`: whether door `A` is open; `A.closed` is the negation
//!
//! Operators follow the usual precedence: `or`, `and`, `not`, chained
//! comparisons, `+ -`, `*`, unary `-`. `&&`, `||` and `!` are accepted as
//! spellings of the boolean operators.

use std::fmt;

use crate::error::PredicateError;
use crate::layout::{DoorLetter, LetterSet};

/// Per-state values a predicate can read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateFacts {
    pub open_count: i64,
    pub closed_count: i64,
    pub path_length: i64,
    pub open_doors: LetterSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Var {
    OpenCount,
    ClosedCount,
    PathLength,
    DoorOpen(DoorLetter),
    DoorClosed(DoorLetter),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn apply(self, lhs: i64, rhs: i64) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ge => lhs >= rhs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Int(i64),
    Bool(bool),
    Var(Var),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Arith(ArithOp, Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    /// `a < b <= c` is `Compare(a, [(Lt, b), (Le, c)])`.
    Compare(Box<Expr>, Vec<(CmpOp, Expr)>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Value {
    Int(i64),
    Bool(bool),
}

impl Value {
    fn as_int(self) -> i64 {
        match self {
            Value::Int(i) => i,
            Value::Bool(b) => i64::from(b),
        }
    }

    fn truthy(self) -> bool {
        match self {
            Value::Int(i) => i != 0,
            Value::Bool(b) => b,
        }
    }
}

impl Expr {
    fn eval(&self, facts: &StateFacts) -> Value {
        match self {
            Expr::Int(i) => Value::Int(*i),
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Var(var) => match *var {
                Var::OpenCount => Value::Int(facts.open_count),
                Var::ClosedCount => Value::Int(facts.closed_count),
                Var::PathLength => Value::Int(facts.path_length),
                Var::DoorOpen(letter) => Value::Bool(facts.open_doors.contains(letter)),
                Var::DoorClosed(letter) => Value::Bool(!facts.open_doors.contains(letter)),
            },
            Expr::Not(inner) => Value::Bool(!inner.eval(facts).truthy()),
            Expr::Neg(inner) => Value::Int(inner.eval(facts).as_int().wrapping_neg()),
            Expr::Arith(op, lhs, rhs) => {
                let (a, b) = (lhs.eval(facts).as_int(), rhs.eval(facts).as_int());
                Value::Int(match op {
                    ArithOp::Add => a.wrapping_add(b),
                    ArithOp::Sub => a.wrapping_sub(b),
                    ArithOp::Mul => a.wrapping_mul(b),
                })
            }
            Expr::And(lhs, rhs) => {
                Value::Bool(lhs.eval(facts).truthy() && rhs.eval(facts).truthy())
            }
            Expr::Or(lhs, rhs) => Value::Bool(lhs.eval(facts).truthy() || rhs.eval(facts).truthy()),
            Expr::Compare(first, rest) => {
                let mut lhs = first.eval(facts).as_int();
                for (op, operand) in rest {
                    let rhs = operand.eval(facts).as_int();
                    if !op.apply(lhs, rhs) {
                        return Value::Bool(false);
                    }
                    lhs = rhs;
                }
                Value::Bool(true)
            }
        }
    }

    fn collect_doors(&self, doors: &mut LetterSet) {
        match self {
            Expr::Int(_) | Expr::Bool(_) => {}
            Expr::Var(Var::DoorOpen(letter) | Var::DoorClosed(letter)) => doors.insert(*letter),
            Expr::Var(_) => {}
            Expr::Not(inner) | Expr::Neg(inner) => inner.collect_doors(doors),
            Expr::Arith(_, lhs, rhs) | Expr::And(lhs, rhs) | Expr::Or(lhs, rhs) => {
                lhs.collect_doors(doors);
                rhs.collect_doors(doors);
            }
            Expr::Compare(first, rest) => {
                first.collect_doors(doors);
                for (_, operand) in rest {
                    operand.collect_doors(doors);
                }
            }
        }
    }
}

/// A compiled `?` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    source: String,
    expr: Expr,
}

impl Predicate {
    pub fn parse(source: &str) -> Result<Self, PredicateError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            source,
            tokens,
            pos: 0,
        };
        let expr = parser.parse_or()?;
        match parser.peek() {
            None => Ok(Self {
                source: source.to_string(),
                expr,
            }),
            Some((offset, tok)) => Err(PredicateError::UnexpectedToken {
                expr: source.to_string(),
                offset,
                found: tok.to_string(),
            }),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Evaluate against one state; non-zero integers count as true.
    pub fn eval(&self, facts: &StateFacts) -> bool {
        self.expr.eval(facts).truthy()
    }

    /// Every door letter the expression reads.
    pub fn doors(&self) -> LetterSet {
        let mut doors = LetterSet::new();
        self.expr.collect_doors(&mut doors);
        doors
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tok<'a> {
    Int(i64),
    Ident(&'a str),
    LParen,
    RParen,
    Dot,
    Plus,
    Minus,
    Star,
    Cmp(CmpOp),
    And,
    Or,
    Not,
    True,
    False,
}

impl fmt::Display for Tok<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tok::Int(i) => write!(f, "integer {i}"),
            Tok::Ident(name) => write!(f, "name '{name}'"),
            Tok::LParen => f.write_str("'('"),
            Tok::RParen => f.write_str("')'"),
            Tok::Dot => f.write_str("'.'"),
            Tok::Plus => f.write_str("'+'"),
            Tok::Minus => f.write_str("'-'"),
            Tok::Star => f.write_str("'*'"),
            Tok::Cmp(op) => {
                let s = match op {
                    CmpOp::Eq => "==",
                    CmpOp::Ne => "!=",
                    CmpOp::Lt => "<",
                    CmpOp::Le => "<=",
                    CmpOp::Gt => ">",
                    CmpOp::Ge => ">=",
                };
                write!(f, "'{s}'")
            }
            Tok::And => f.write_str("'and'"),
            Tok::Or => f.write_str("'or'"),
            Tok::Not => f.write_str("'not'"),
            Tok::True => f.write_str("'True'"),
            Tok::False => f.write_str("'False'"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<(usize, Tok<'_>)>, PredicateError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let start = i;
        let c = bytes[i];

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let value = source[start..i]
                .parse::<i64>()
                .map_err(|_| PredicateError::IntegerOverflow {
                    expr: source.to_string(),
                    offset: start,
                })?;
            tokens.push((start, Tok::Int(value)));
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let tok = match &source[start..i] {
                "and" => Tok::And,
                "or" => Tok::Or,
                "not" => Tok::Not,
                "True" => Tok::True,
                "False" => Tok::False,
                word => Tok::Ident(word),
            };
            tokens.push((start, tok));
            continue;
        }

        let next = bytes.get(i + 1).copied();
        let (tok, len) = match (c, next) {
            (b'=', Some(b'=')) => (Tok::Cmp(CmpOp::Eq), 2),
            (b'!', Some(b'=')) => (Tok::Cmp(CmpOp::Ne), 2),
            (b'<', Some(b'=')) => (Tok::Cmp(CmpOp::Le), 2),
            (b'>', Some(b'=')) => (Tok::Cmp(CmpOp::Ge), 2),
            (b'&', Some(b'&')) => (Tok::And, 2),
            (b'|', Some(b'|')) => (Tok::Or, 2),
            (b'<', _) => (Tok::Cmp(CmpOp::Lt), 1),
            (b'>', _) => (Tok::Cmp(CmpOp::Gt), 1),
            (b'!', _) => (Tok::Not, 1),
            (b'(', _) => (Tok::LParen, 1),
            (b')', _) => (Tok::RParen, 1),
            (b'.', _) => (Tok::Dot, 1),
            (b'+', _) => (Tok::Plus, 1),
            (b'-', _) => (Tok::Minus, 1),
            (b'*', _) => (Tok::Star, 1),
            _ => {
                let found = source[start..].chars().next().unwrap_or('?');
                return Err(PredicateError::UnexpectedChar {
                    expr: source.to_string(),
                    offset: start,
                    found,
                });
            }
        };
        tokens.push((start, tok));
        i += len;
    }

    Ok(tokens)
}

/// Recursive-descent parser, one method per precedence level.
struct Parser<'a> {
    source: &'a str,
    tokens: Vec<(usize, Tok<'a>)>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<(usize, Tok<'a>)> {
        self.tokens.get(self.pos).copied()
    }

    fn eat(&mut self, wanted: Tok<'a>) -> bool {
        if self.peek().map(|(_, tok)| tok) == Some(wanted) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn next(&mut self) -> Result<(usize, Tok<'a>), PredicateError> {
        let item = self.peek().ok_or_else(|| PredicateError::UnexpectedEnd {
            expr: self.source.to_string(),
        })?;
        self.pos += 1;
        Ok(item)
    }

    fn unexpected(&self, offset: usize, tok: Tok<'_>) -> PredicateError {
        PredicateError::UnexpectedToken {
            expr: self.source.to_string(),
            offset,
            found: tok.to_string(),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, PredicateError> {
        let mut lhs = self.parse_and()?;
        while self.eat(Tok::Or) {
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, PredicateError> {
        let mut lhs = self.parse_not()?;
        while self.eat(Tok::And) {
            let rhs = self.parse_not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, PredicateError> {
        if self.eat(Tok::Not) {
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, PredicateError> {
        let first = self.parse_sum()?;
        let mut rest = Vec::new();
        while let Some((_, Tok::Cmp(op))) = self.peek() {
            self.pos += 1;
            rest.push((op, self.parse_sum()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare(Box::new(first), rest))
        }
    }

    fn parse_sum(&mut self) -> Result<Expr, PredicateError> {
        let mut lhs = self.parse_product()?;
        loop {
            let op = match self.peek() {
                Some((_, Tok::Plus)) => ArithOp::Add,
                Some((_, Tok::Minus)) => ArithOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_product()?;
            lhs = Expr::Arith(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_product(&mut self) -> Result<Expr, PredicateError> {
        let mut lhs = self.parse_unary()?;
        while self.eat(Tok::Star) {
            let rhs = self.parse_unary()?;
            lhs = Expr::Arith(ArithOp::Mul, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, PredicateError> {
        if self.eat(Tok::Minus) {
            let inner = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expr, PredicateError> {
        let (offset, tok) = self.next()?;
        match tok {
            Tok::Int(i) => Ok(Expr::Int(i)),
            Tok::True => Ok(Expr::Bool(true)),
            Tok::False => Ok(Expr::Bool(false)),
            Tok::LParen => {
                let inner = self.parse_or()?;
                let (close_offset, close) = self.next()?;
                if close != Tok::RParen {
                    return Err(self.unexpected(close_offset, close));
                }
                Ok(inner)
            }
            Tok::Ident(name) => self.parse_name(name),
            other => Err(self.unexpected(offset, other)),
        }
    }

    fn parse_name(&mut self, name: &str) -> Result<Expr, PredicateError> {
        let var = match name {
            "open" | "open_count" => Var::OpenCount,
            "closed" | "closed_count" => Var::ClosedCount,
            "path" | "path_length" => Var::PathLength,
            _ => {
                let letter = single_letter(name).ok_or_else(|| PredicateError::UnknownName {
                    expr: self.source.to_string(),
                    name: name.to_string(),
                })?;
                return self.parse_door(letter);
            }
        };
        Ok(Expr::Var(var))
    }

    fn parse_door(&mut self, letter: DoorLetter) -> Result<Expr, PredicateError> {
        if !self.eat(Tok::Dot) {
            return Ok(Expr::Var(Var::DoorOpen(letter)));
        }
        let (offset, tok) = self.next()?;
        match tok {
            Tok::Ident("open") => Ok(Expr::Var(Var::DoorOpen(letter))),
            Tok::Ident("closed") => Ok(Expr::Var(Var::DoorClosed(letter))),
            Tok::Ident(attribute) => Err(PredicateError::UnknownAttribute {
                expr: self.source.to_string(),
                door: letter.as_char(),
                attribute: attribute.to_string(),
            }),
            other => Err(self.unexpected(offset, other)),
        }
    }
}

fn single_letter(name: &str) -> Option<DoorLetter> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => DoorLetter::from_char(c),
        _ => None,
    }
}
