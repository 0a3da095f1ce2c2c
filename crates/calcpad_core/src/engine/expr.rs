//! Generic arithmetic expression evaluator over decimal values.
//!
//! # Responsibility
//! - Evaluate a fully normalized expression string to a decimal number.
//! - Support `+ - * / ^`, parentheses, unary minus, named functions and
//!   the `pi`/`e` constants.
//!
//! # Invariants
//! - All arithmetic is decimal and checked; nothing panics on user input.
//! - Division by zero short-circuits to signed infinity, not an error.
//! - Transcendental functions without a decimal implementation round-trip
//!   through `f64`; everything else stays exact.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, MathematicalOps};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ExprResult<T> = Result<T, ExprError>;

/// Evaluation failure for one expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    Empty,
    InvalidNumber(String),
    UnsupportedSymbol(char),
    UnknownIdentifier(String),
    MismatchedParens,
    Malformed,
    Domain(&'static str),
    Overflow,
}

impl Display for ExprError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty expression"),
            Self::InvalidNumber(text) => write!(f, "invalid number: {text}"),
            Self::UnsupportedSymbol(ch) => write!(f, "unsupported symbol: {ch}"),
            Self::UnknownIdentifier(name) => write!(f, "unknown identifier: {name}"),
            Self::MismatchedParens => write!(f, "mismatched parentheses"),
            Self::Malformed => write!(f, "malformed expression"),
            Self::Domain(function) => write!(f, "{function}: argument out of domain"),
            Self::Overflow => write!(f, "numeric overflow"),
        }
    }
}

impl Error for ExprError {}

/// Outcome of an evaluation: a finite decimal, or the signed infinity
/// produced by division by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluated {
    Finite(Decimal),
    Infinity { negative: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    Sqrt,
    Cbrt,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Log,
    Floor,
    Ceil,
    Round,
    Abs,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "sqrt" => Some(Self::Sqrt),
            "cbrt" => Some(Self::Cbrt),
            "sin" => Some(Self::Sin),
            "cos" => Some(Self::Cos),
            "tan" => Some(Self::Tan),
            "asin" => Some(Self::Asin),
            "acos" => Some(Self::Acos),
            "atan" => Some(Self::Atan),
            "log" => Some(Self::Log),
            "floor" => Some(Self::Floor),
            "ceil" => Some(Self::Ceil),
            "round" => Some(Self::Round),
            "abs" => Some(Self::Abs),
            _ => None,
        }
    }

    fn apply(self, arg: Decimal) -> ExprResult<Decimal> {
        match self {
            Self::Sqrt => arg.sqrt().ok_or(ExprError::Domain("sqrt")),
            Self::Cbrt => through_f64(arg, f64::cbrt, "cbrt"),
            Self::Sin => Ok(arg.sin()),
            Self::Cos => Ok(arg.cos()),
            Self::Tan => Ok(arg.tan()),
            Self::Asin => through_f64(arg, f64::asin, "asin"),
            Self::Acos => through_f64(arg, f64::acos, "acos"),
            Self::Atan => through_f64(arg, f64::atan, "atan"),
            Self::Log => arg.checked_log10().ok_or(ExprError::Domain("log")),
            Self::Floor => Ok(arg.floor()),
            Self::Ceil => Ok(arg.ceil()),
            Self::Round => Ok(arg.round()),
            Self::Abs => Ok(arg.abs()),
        }
    }
}

/// Routes an argument through `f64` for functions without a decimal
/// implementation.
fn through_f64(arg: Decimal, f: fn(f64) -> f64, name: &'static str) -> ExprResult<Decimal> {
    let input = arg.to_f64().ok_or(ExprError::Overflow)?;
    let output = f(input);
    if output.is_nan() {
        return Err(ExprError::Domain(name));
    }
    Decimal::from_f64(output).ok_or(ExprError::Overflow)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(Decimal),
    Op(char),
    Neg,
    Func(Function),
    LParen,
    RParen,
}

/// Evaluates a normalized arithmetic expression.
pub fn evaluate(expression: &str) -> ExprResult<Evaluated> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(ExprError::Empty);
    }
    let rpn = to_rpn(&tokens)?;
    match eval_rpn(&rpn) {
        Ok(value) => Ok(Evaluated::Finite(value)),
        Err(RpnError::DivisionByZero { negative }) => Ok(Evaluated::Infinity { negative }),
        Err(RpnError::Expr(err)) => Err(err),
    }
}

fn tokenize(expression: &str) -> ExprResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            '0'..='9' | '.' => {
                let mut buffer = String::new();
                while let Some(&digit) = chars.peek() {
                    if digit.is_ascii_digit() || digit == '.' {
                        buffer.push(digit);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = buffer
                    .parse::<Decimal>()
                    .map_err(|_| ExprError::InvalidNumber(buffer.clone()))?;
                tokens.push(Token::Num(value));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let mut name = String::new();
                while let Some(&letter) = chars.peek() {
                    if letter.is_ascii_alphanumeric() || letter == '_' {
                        name.push(letter.to_ascii_lowercase());
                        chars.next();
                    } else {
                        break;
                    }
                }
                match name.as_str() {
                    "pi" => tokens.push(Token::Num(Decimal::PI)),
                    "e" => tokens.push(Token::Num(Decimal::E)),
                    _ => match Function::from_name(&name) {
                        Some(function) => tokens.push(Token::Func(function)),
                        None => return Err(ExprError::UnknownIdentifier(name)),
                    },
                }
            }
            '+' | '-' => {
                chars.next();
                if unary_position(tokens.last()) {
                    if ch == '-' {
                        tokens.push(Token::Neg);
                    }
                    // A unary plus is a no-op and is dropped.
                } else {
                    tokens.push(Token::Op(ch));
                }
            }
            '*' | '/' | '^' => {
                chars.next();
                tokens.push(Token::Op(ch));
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            other => return Err(ExprError::UnsupportedSymbol(other)),
        }
    }

    Ok(tokens)
}

fn unary_position(previous: Option<&Token>) -> bool {
    !matches!(
        previous,
        Some(Token::Num(_)) | Some(Token::RParen)
    )
}

fn precedence(token: &Token) -> u8 {
    match token {
        Token::Op('+') | Token::Op('-') => 1,
        Token::Op('*') | Token::Op('/') => 2,
        Token::Neg => 3,
        Token::Op('^') => 4,
        _ => 0,
    }
}

fn right_associative(token: &Token) -> bool {
    matches!(token, Token::Op('^') | Token::Neg)
}

fn to_rpn(tokens: &[Token]) -> ExprResult<Vec<Token>> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Token> = Vec::new();

    for token in tokens {
        match token {
            Token::Num(_) => output.push(token.clone()),
            Token::Func(_) => stack.push(token.clone()),
            Token::Op(_) | Token::Neg => {
                while let Some(top) = stack.last() {
                    let pops = match top {
                        Token::Op(_) | Token::Neg => {
                            precedence(top) > precedence(token)
                                || (precedence(top) == precedence(token)
                                    && !right_associative(token))
                        }
                        _ => false,
                    };
                    if pops {
                        output.push(stack.pop().expect("stack top checked"));
                    } else {
                        break;
                    }
                }
                stack.push(token.clone());
            }
            Token::LParen => stack.push(Token::LParen),
            Token::RParen => {
                loop {
                    match stack.pop() {
                        Some(Token::LParen) => break,
                        Some(inner) => output.push(inner),
                        None => return Err(ExprError::MismatchedParens),
                    }
                }
                if matches!(stack.last(), Some(Token::Func(_))) {
                    output.push(stack.pop().expect("function top checked"));
                }
            }
        }
    }

    while let Some(token) = stack.pop() {
        if matches!(token, Token::LParen) {
            return Err(ExprError::MismatchedParens);
        }
        output.push(token);
    }

    Ok(output)
}

enum RpnError {
    DivisionByZero { negative: bool },
    Expr(ExprError),
}

impl From<ExprError> for RpnError {
    fn from(value: ExprError) -> Self {
        Self::Expr(value)
    }
}

fn eval_rpn(rpn: &[Token]) -> Result<Decimal, RpnError> {
    let mut stack: Vec<Decimal> = Vec::new();

    for token in rpn {
        match token {
            Token::Num(value) => stack.push(*value),
            Token::Neg => {
                let value = stack.pop().ok_or(ExprError::Malformed)?;
                stack.push(-value);
            }
            Token::Func(function) => {
                let arg = stack.pop().ok_or(ExprError::Malformed)?;
                stack.push(function.apply(arg)?);
            }
            Token::Op(op) => {
                let rhs = stack.pop().ok_or(ExprError::Malformed)?;
                let lhs = stack.pop().ok_or(ExprError::Malformed)?;
                let value = match op {
                    '+' => lhs.checked_add(rhs).ok_or(ExprError::Overflow)?,
                    '-' => lhs.checked_sub(rhs).ok_or(ExprError::Overflow)?,
                    '*' => lhs.checked_mul(rhs).ok_or(ExprError::Overflow)?,
                    '/' => {
                        if rhs.is_zero() {
                            return Err(RpnError::DivisionByZero {
                                negative: lhs.is_sign_negative() && !lhs.is_zero(),
                            });
                        }
                        lhs.checked_div(rhs).ok_or(ExprError::Overflow)?
                    }
                    '^' => lhs.checked_powd(rhs).ok_or(ExprError::Overflow)?,
                    _ => return Err(ExprError::Malformed.into()),
                };
                stack.push(value);
            }
            Token::LParen | Token::RParen => return Err(ExprError::Malformed.into()),
        }
    }

    if stack.len() == 1 {
        Ok(stack[0])
    } else {
        Err(ExprError::Malformed.into())
    }
}
