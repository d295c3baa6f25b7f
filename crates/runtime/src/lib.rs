//! Combinator circuit runtime
//!
//! Simulates synchronous combinator networks tick by tick and runs
//! declarative test scenarios against them.

pub mod builder;
pub mod circuit;
pub mod combinator;
pub mod error;
pub mod frame;
pub mod scenario;
pub mod types;

pub use builder::CircuitBuilder;
pub use circuit::Circuit;
pub use error::{Error, Result, ScenarioError, SignalMismatch};
pub use frame::SignalFrame;
pub use scenario::{Scenario, TickRecord};
pub use types::*;
