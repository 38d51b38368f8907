//! # Arithmetic expressions
//!
//! A small recursive-descent parser and evaluator for calculator input.
//! Only numbers, the usual operators, parentheses and a fixed set of
//! functions exist; there is no way to reach anything else.
//!
//! ```text
//! expr    := term (("+" | "-") term)*
//! term    := unary (("*" | "/" | "//" | "%") unary)*
//! unary   := ("+" | "-") unary | power
//! power   := primary ("**" unary)?
//! primary := NUMBER | IDENT "(" [expr ("," expr)*] ")" | "(" expr ")"
//! ```
//!
//! Numbers follow the integer/float split of a typical calculator language:
//! integer arithmetic stays exact, `/` always produces a float, and mixing an
//! integer with a float produces a float.

use smolagent_error::{Error, Result};
use std::cmp::Ordering;
use std::fmt;

/// Maximum nesting of parentheses and unary operators
pub const MAX_DEPTH: usize = 64;

/// Maximum number of binary operators in one expression
pub const MAX_OPERATORS: usize = 256;

/// Functions callable from an expression
pub const FUNCTIONS: &[&str] = &["abs", "round", "min", "max", "pow"];

fn invalid(reason: impl fmt::Display) -> Error {
    Error::invalid_argument(format!("Invalid expression: {}", reason))
}

// ============================================================================
// Numbers
// ============================================================================

/// Result of evaluating an expression
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Read a JSON number, keeping integers exact where they fit
    pub fn from_json(value: &serde_json::Value) -> Option<Number> {
        let serde_json::Value::Number(n) = value else {
            return None;
        };
        if let Some(i) = n.as_i64() {
            Some(Number::Int(i))
        } else {
            n.as_f64().map(Number::Float)
        }
    }

    pub fn to_json(self) -> Result<serde_json::Value> {
        match self {
            Number::Int(i) => Ok(serde_json::Value::from(i)),
            Number::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .ok_or_else(|| invalid("numeric result out of range")),
        }
    }

    fn compare(self, other: Number) -> Ordering {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.cmp(&b),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()).unwrap_or(Ordering::Equal),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{}", i),
            Number::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e16 => {
                write!(f, "{:.1}", x)
            }
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

fn finite(value: f64) -> Result<Number> {
    if value.is_finite() {
        Ok(Number::Float(value))
    } else {
        Err(invalid("numeric result out of range"))
    }
}

fn overflow() -> Error {
    invalid("integer overflow")
}

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Number),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    DoubleStar,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Num(n) => write!(f, "{}", n),
            Token::Ident(name) => write!(f, "{}", name),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::DoubleSlash => f.write_str("//"),
            Token::Percent => f.write_str("%"),
            Token::DoubleStar => f.write_str("**"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        let starts_number =
            c.is_ascii_digit() || (c == '.' && chars.get(pos + 1).is_some_and(|d| d.is_ascii_digit()));
        if starts_number {
            let (token, next) = scan_number(&chars, pos)?;
            tokens.push(token);
            pos = next;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                pos += 1;
            }
            tokens.push(Token::Ident(chars[start..pos].iter().collect()));
            continue;
        }

        let next = chars.get(pos + 1).copied();
        let (token, width) = match (c, next) {
            ('*', Some('*')) => (Token::DoubleStar, 2),
            ('/', Some('/')) => (Token::DoubleSlash, 2),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            (',', _) => (Token::Comma, 1),
            _ => {
                return Err(invalid(format!(
                    "unexpected character '{}' at position {}",
                    c, pos
                )))
            }
        };
        tokens.push(token);
        pos += width;
    }

    Ok(tokens)
}

fn scan_number(chars: &[char], start: usize) -> Result<(Token, usize)> {
    let mut pos = start;
    let mut is_float = false;

    while pos < chars.len() && chars[pos].is_ascii_digit() {
        pos += 1;
    }
    if pos < chars.len() && chars[pos] == '.' {
        is_float = true;
        pos += 1;
        while pos < chars.len() && chars[pos].is_ascii_digit() {
            pos += 1;
        }
    }
    if pos < chars.len() && (chars[pos] == 'e' || chars[pos] == 'E') {
        let mut lookahead = pos + 1;
        if lookahead < chars.len() && (chars[lookahead] == '+' || chars[lookahead] == '-') {
            lookahead += 1;
        }
        if lookahead < chars.len() && chars[lookahead].is_ascii_digit() {
            is_float = true;
            pos = lookahead;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
        }
    }

    let text: String = chars[start..pos].iter().collect();
    let number = if is_float {
        let value: f64 = text
            .parse()
            .map_err(|_| invalid(format!("bad number literal '{}'", text)))?;
        finite(value)?
    } else {
        Number::Int(
            text.parse()
                .map_err(|_| invalid(format!("integer literal '{}' is too large", text)))?,
        )
    };
    Ok((Token::Num(number), pos))
}

// ============================================================================
// Syntax tree
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

/// Parsed expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(Number),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

/// Parse `input` into an expression tree
pub fn parse(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(invalid("empty expression"));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        operators: 0,
    };
    let expr = parser.expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(invalid(format!("unexpected '{}'", token))),
    }
}

/// Parse and evaluate in one go
pub fn evaluate(input: &str) -> Result<Number> {
    parse(input)?.eval()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    operators: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
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

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(ref token) if *token == expected => Ok(()),
            Some(token) => Err(invalid(format!("expected '{}', found '{}'", expected, token))),
            None => Err(invalid(format!("expected '{}' but input ended", expected))),
        }
    }

    fn descend(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(invalid("expression nested too deeply"));
        }
        Ok(())
    }

    /// Operator chains grow the tree as deep as they are long
    fn count_operator(&mut self) -> Result<()> {
        self.operators += 1;
        if self.operators > MAX_OPERATORS {
            return Err(invalid(format!(
                "too many operators (limit {})",
                MAX_OPERATORS
            )));
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Expr> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            self.count_operator()?;
            let rhs = self.term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn term(&mut self) -> Result<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::DoubleSlash) => BinaryOp::FloorDiv,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            self.count_operator()?;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.eat(&Token::Minus) {
            self.descend()?;
            let operand = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Neg(Box::new(operand)));
        }
        if self.eat(&Token::Plus) {
            self.descend()?;
            let operand = self.unary()?;
            self.depth -= 1;
            return Ok(operand);
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr> {
        let base = self.primary()?;
        if self.eat(&Token::DoubleStar) {
            self.count_operator()?;
            self.descend()?;
            let exponent = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Num(n)) => Ok(Expr::Num(n)),
            Some(Token::LParen) => {
                self.descend()?;
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                self.depth -= 1;
                Ok(inner)
            }
            Some(Token::Ident(name)) => {
                if !self.eat(&Token::LParen) {
                    return Err(invalid(format!("name '{}' is not defined", name)));
                }
                self.descend()?;
                let mut args = Vec::new();
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.expr()?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        self.expect(Token::RParen)?;
                        break;
                    }
                }
                self.depth -= 1;
                Ok(Expr::Call { name, args })
            }
            Some(token) => Err(invalid(format!("unexpected '{}'", token))),
            None => Err(invalid("unexpected end of input")),
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

impl Expr {
    pub fn eval(&self) -> Result<Number> {
        match self {
            Expr::Num(n) => Ok(*n),
            Expr::Neg(inner) => match inner.eval()? {
                Number::Int(i) => i.checked_neg().map(Number::Int).ok_or_else(overflow),
                Number::Float(f) => Ok(Number::Float(-f)),
            },
            Expr::Binary { op, lhs, rhs } => apply(*op, lhs.eval()?, rhs.eval()?),
            Expr::Call { name, args } => {
                let values = args.iter().map(Expr::eval).collect::<Result<Vec<_>>>()?;
                call(name, &values)
            }
        }
    }
}

fn apply(op: BinaryOp, lhs: Number, rhs: Number) -> Result<Number> {
    use Number::Int;

    match op {
        BinaryOp::Add => match (lhs, rhs) {
            (Int(a), Int(b)) => a.checked_add(b).map(Int).ok_or_else(overflow),
            (a, b) => finite(a.as_f64() + b.as_f64()),
        },
        BinaryOp::Sub => match (lhs, rhs) {
            (Int(a), Int(b)) => a.checked_sub(b).map(Int).ok_or_else(overflow),
            (a, b) => finite(a.as_f64() - b.as_f64()),
        },
        BinaryOp::Mul => match (lhs, rhs) {
            (Int(a), Int(b)) => a.checked_mul(b).map(Int).ok_or_else(overflow),
            (a, b) => finite(a.as_f64() * b.as_f64()),
        },
        BinaryOp::Div => {
            if rhs.as_f64() == 0.0 {
                return Err(invalid("division by zero"));
            }
            finite(lhs.as_f64() / rhs.as_f64())
        }
        BinaryOp::FloorDiv => match (lhs, rhs) {
            (Int(_), Int(0)) => Err(invalid("integer division by zero")),
            (Int(a), Int(b)) => {
                let q = a.checked_div(b).ok_or_else(overflow)?;
                if a % b != 0 && ((a < 0) != (b < 0)) {
                    Ok(Int(q - 1))
                } else {
                    Ok(Int(q))
                }
            }
            (a, b) => {
                if b.as_f64() == 0.0 {
                    return Err(invalid("float floor division by zero"));
                }
                finite((a.as_f64() / b.as_f64()).floor())
            }
        },
        BinaryOp::Mod => match (lhs, rhs) {
            (Int(_), Int(0)) => Err(invalid("integer modulo by zero")),
            (Int(a), Int(b)) => {
                let r = a.checked_rem(b).ok_or_else(overflow)?;
                if r != 0 && ((r < 0) != (b < 0)) {
                    Ok(Int(r + b))
                } else {
                    Ok(Int(r))
                }
            }
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                if b == 0.0 {
                    return Err(invalid("float modulo by zero"));
                }
                let mut r = a % b;
                if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                    r += b;
                }
                finite(r)
            }
        },
        BinaryOp::Pow => power(lhs, rhs),
    }
}

fn power(base: Number, exponent: Number) -> Result<Number> {
    match (base, exponent) {
        (Number::Int(b), Number::Int(e)) if e >= 0 => match b {
            0 => Ok(Number::Int(if e == 0 { 1 } else { 0 })),
            1 => Ok(Number::Int(1)),
            -1 => Ok(Number::Int(if e % 2 == 0 { 1 } else { -1 })),
            _ => {
                let e = u32::try_from(e).map_err(|_| overflow())?;
                b.checked_pow(e).map(Number::Int).ok_or_else(overflow)
            }
        },
        (b, e) => {
            if b.as_f64() == 0.0 && e.as_f64() < 0.0 {
                return Err(invalid("zero cannot be raised to a negative power"));
            }
            finite(b.as_f64().powf(e.as_f64()))
        }
    }
}

fn call(name: &str, args: &[Number]) -> Result<Number> {
    let arity = |expected: &str, ok: bool| -> Result<()> {
        if ok {
            Ok(())
        } else {
            Err(invalid(format!(
                "{}() takes {} argument(s), got {}",
                name,
                expected,
                args.len()
            )))
        }
    };

    match name {
        "abs" => {
            arity("1", args.len() == 1)?;
            match args[0] {
                Number::Int(i) => i.checked_abs().map(Number::Int).ok_or_else(overflow),
                Number::Float(f) => Ok(Number::Float(f.abs())),
            }
        }
        "round" => {
            arity("1 or 2", args.len() == 1 || args.len() == 2)?;
            round(args[0], args.get(1).copied())
        }
        "min" | "max" => {
            arity("at least 1", !args.is_empty())?;
            let wanted = if name == "min" {
                Ordering::Less
            } else {
                Ordering::Greater
            };
            let mut best = args[0];
            for &candidate in &args[1..] {
                if candidate.compare(best) == wanted {
                    best = candidate;
                }
            }
            Ok(best)
        }
        "pow" => {
            arity("2", args.len() == 2)?;
            power(args[0], args[1])
        }
        other => Err(invalid(format!("name '{}' is not defined", other))),
    }
}

/// Round half to even, optionally to `digits` decimal places
fn round(value: Number, digits: Option<Number>) -> Result<Number> {
    let digits = match digits {
        None => None,
        Some(Number::Int(d)) => Some(d),
        Some(Number::Float(_)) => return Err(invalid("round() digits must be an integer")),
    };

    match (value, digits) {
        (Number::Int(i), None) => Ok(Number::Int(i)),
        (Number::Float(f), None) => {
            let rounded = f.round_ties_even();
            if rounded.abs() >= i64::MAX as f64 {
                return Err(overflow());
            }
            Ok(Number::Int(rounded as i64))
        }
        (Number::Int(i), Some(d)) if d >= 0 => Ok(Number::Int(i)),
        (Number::Int(i), Some(d)) => {
            // Past 10^38 the scale leaves i128 and every i64 rounds to zero
            let Some(scale) = u32::try_from(d.unsigned_abs())
                .ok()
                .and_then(|k| 10i128.checked_pow(k))
            else {
                return Ok(Number::Int(0));
            };
            let value = i128::from(i);
            let mut quotient = value.div_euclid(scale);
            let rest = value.rem_euclid(scale);
            match rest.cmp(&(scale - rest)) {
                Ordering::Greater => quotient += 1,
                Ordering::Equal if quotient % 2 != 0 => quotient += 1,
                _ => {}
            }
            i64::try_from(quotient * scale)
                .map(Number::Int)
                .map_err(|_| overflow())
        }
        (Number::Float(f), Some(d)) => {
            let d = i32::try_from(d.clamp(-308, 308)).map_err(|_| overflow())?;
            let scale = 10f64.powi(d);
            let scaled = f * scale;
            if !scaled.is_finite() {
                return Ok(Number::Float(f));
            }
            finite(scaled.round_ties_even() / scale)
        }
    }
}
