//! Runtime errors

use std::fmt;

use thiserror::Error;

use crate::types::{SignalId, WireName};

/// Runtime result type
pub type Result<T> = std::result::Result<T, Error>;

/// Runtime errors
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    #[error("invalid {slot} operand: {operand}")]
    InvalidOperand {
        slot: &'static str,
        operand: String,
    },

    #[error("wire not found: {0}")]
    WireNotFound(WireName),

    #[error("scenario ticks out of order: tick {tick} after tick {last}")]
    OutOfOrderTick { tick: u64, last: u64 },

    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

/// A single failed signal expectation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalMismatch {
    pub wire: WireName,
    pub signal: SignalId,
    pub expected: i64,
    pub actual: i64,
}

impl fmt::Display for SignalMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]: expected {}, actual {}",
            self.wire, self.signal, self.expected, self.actual
        )
    }
}

/// Raised when a scenario tick's expectations do not hold
///
/// Carries every mismatch found in the failing tick, not just the
/// first one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioError {
    pub scenario: String,
    pub tick: u64,
    pub mismatches: Vec<SignalMismatch>,
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unexpected signals in {}:{}:", self.scenario, self.tick)?;
        for mismatch in &self.mismatches {
            write!(f, "\n\t{mismatch}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ScenarioError {}
