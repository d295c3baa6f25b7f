//! Core simulation types
//!
//! Identifiers, operand selectors and the integer operator semantics.
//! These types are populated from already-parsed construction requests.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Unique identifier for a signal
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(pub String);

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SignalId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SignalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unique identifier for a wire
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireName(pub String);

impl fmt::Display for WireName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WireName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for WireName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// An operand as delivered by the external frontend
///
/// Which variants are valid depends on the slot: right operands are
/// never wildcards, arithmetic combinators only accept `each`. Invalid
/// combinations are rejected when the combinator is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// Literal integer
    Constant(i64),
    /// Plain signal name
    Signal(SignalId),
    /// Every signal present in the input, one at a time
    Each,
    /// Any one signal present in the input
    Anything,
    /// All signals present in the input, as a group
    Everything,
}

impl From<&str> for Operand {
    /// Integer tokens become constants, the wildcard keywords map to
    /// their selectors, anything else is a signal name.
    fn from(s: &str) -> Self {
        if let Ok(value) = s.parse::<i64>() {
            return Operand::Constant(value);
        }
        match s {
            "each" => Operand::Each,
            "anything" => Operand::Anything,
            "everything" => Operand::Everything,
            _ => Operand::Signal(SignalId::from(s)),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Constant(v) => write!(f, "{v}"),
            Operand::Signal(s) => write!(f, "{s}"),
            Operand::Each => write!(f, "each"),
            Operand::Anything => write!(f, "anything"),
            Operand::Everything => write!(f, "everything"),
        }
    }
}

/// Comparison operator of a decider combinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeciderOp {
    Gt,
    Ge,
    Eq,
    Ne,
    Le,
    Lt,
}

impl DeciderOp {
    /// Evaluate the comparison
    pub fn eval(self, left: i64, right: i64) -> bool {
        match self {
            DeciderOp::Gt => left > right,
            DeciderOp::Ge => left >= right,
            DeciderOp::Eq => left == right,
            DeciderOp::Ne => left != right,
            DeciderOp::Le => left <= right,
            DeciderOp::Lt => left < right,
        }
    }

    fn token(self) -> &'static str {
        match self {
            DeciderOp::Gt => ">",
            DeciderOp::Ge => ">=",
            DeciderOp::Eq => "=",
            DeciderOp::Ne => "!=",
            DeciderOp::Le => "<=",
            DeciderOp::Lt => "<",
        }
    }
}

impl FromStr for DeciderOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            ">" => Ok(DeciderOp::Gt),
            ">=" => Ok(DeciderOp::Ge),
            "=" => Ok(DeciderOp::Eq),
            "!=" => Ok(DeciderOp::Ne),
            "<=" => Ok(DeciderOp::Le),
            "<" => Ok(DeciderOp::Lt),
            _ => Err(Error::UnknownOperator(s.to_string())),
        }
    }
}

impl fmt::Display for DeciderOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Binary operator of an arithmetic combinator
///
/// All operations are on `i64` with wrapping overflow. Division is
/// floor division and modulo takes the sign of the divisor; both are 0
/// when the divisor is 0. Exponentiation with a negative exponent is 0.
/// Shift amounts are masked to the low 6 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Shl,
    Shr,
    And,
    Or,
    Xor,
}

impl ArithmeticOp {
    /// Evaluate the operation
    pub fn eval(self, left: i64, right: i64) -> i64 {
        match self {
            ArithmeticOp::Add => left.wrapping_add(right),
            ArithmeticOp::Sub => left.wrapping_sub(right),
            ArithmeticOp::Mul => left.wrapping_mul(right),
            ArithmeticOp::Div => floor_div(left, right),
            ArithmeticOp::Mod => floor_mod(left, right),
            ArithmeticOp::Pow => {
                if right < 0 {
                    0
                } else {
                    left.wrapping_pow(right as u32)
                }
            }
            ArithmeticOp::Shl => left.wrapping_shl(right as u32),
            ArithmeticOp::Shr => left.wrapping_shr(right as u32),
            ArithmeticOp::And => left & right,
            ArithmeticOp::Or => left | right,
            ArithmeticOp::Xor => left ^ right,
        }
    }

    fn token(self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
            ArithmeticOp::Mod => "%",
            ArithmeticOp::Pow => "**",
            ArithmeticOp::Shl => "<<",
            ArithmeticOp::Shr => ">>",
            ArithmeticOp::And => "&",
            ArithmeticOp::Or => "|",
            ArithmeticOp::Xor => "^",
        }
    }
}

impl FromStr for ArithmeticOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "+" => Ok(ArithmeticOp::Add),
            "-" => Ok(ArithmeticOp::Sub),
            "*" => Ok(ArithmeticOp::Mul),
            "/" => Ok(ArithmeticOp::Div),
            "%" => Ok(ArithmeticOp::Mod),
            "**" => Ok(ArithmeticOp::Pow),
            "<<" => Ok(ArithmeticOp::Shl),
            ">>" => Ok(ArithmeticOp::Shr),
            "&" => Ok(ArithmeticOp::And),
            "|" => Ok(ArithmeticOp::Or),
            "^" => Ok(ArithmeticOp::Xor),
            _ => Err(Error::UnknownOperator(s.to_string())),
        }
    }
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// What a decider emits for an iterated signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// The signal's current input value
    #[default]
    PassThrough,
    /// The literal value 1
    One,
}

/// Floor division, 0 when the divisor is 0
fn floor_div(a: i64, b: i64) -> i64 {
    if b == 0 {
        return 0;
    }
    let q = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) { q - 1 } else { q }
}

/// Floor modulo (sign of the divisor), 0 when the divisor is 0
fn floor_mod(a: i64, b: i64) -> i64 {
    if b == 0 {
        return 0;
    }
    let r = a.wrapping_rem(b);
    if r != 0 && (r < 0) != (b < 0) { r.wrapping_add(b) } else { r }
}
