//! Circuit construction
//!
//! Consumes well-formed construction requests from an external
//! frontend (a parser walking a circuit description) and assembles the
//! immutable wire/combinator graph. Operand combinations are validated
//! here, at build time; simulation never re-checks them.

use indexmap::IndexMap;
use tracing::debug;

use crate::circuit::{Circuit, Combinator, Wire};
use crate::combinator::{
    ArithmeticCombinator, CombinatorKind, ConstantCombinator, DeciderCombinator,
};
use crate::error::Result;
use crate::frame::SignalFrame;
use crate::types::{ArithmeticOp, DeciderOp, Operand, OutputMode, WireName};

/// Incrementally builds a [`Circuit`]
#[derive(Debug, Default)]
pub struct CircuitBuilder {
    wires: IndexMap<WireName, Wire>,
    combinators: Vec<Combinator>,
}

impl CircuitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or lazily create the wire with this name, returning its
    /// index. Identical names resolve to the identical wire.
    pub fn wire(&mut self, name: &str) -> usize {
        let name = WireName::from(name);
        if let Some(index) = self.wires.get_index_of(&name) {
            return index;
        }
        debug!(wire = %name, "wire created");
        let index = self.wires.len();
        self.wires.insert(name.clone(), Wire::new(name));
        index
    }

    fn wire_indices(&mut self, names: &[&str]) -> Vec<usize> {
        names.iter().map(|name| self.wire(name)).collect()
    }

    /// Add a decider combinator, returning its index
    pub fn decider(
        &mut self,
        inputs: &[&str],
        left: Operand,
        op: DeciderOp,
        right: Operand,
        output: Operand,
        mode: OutputMode,
        outputs: &[&str],
    ) -> Result<usize> {
        debug!(%left, %op, %right, %output, "decider registered");
        let kind = CombinatorKind::Decider(DeciderCombinator::new(left, op, right, output, mode)?);
        let input_wires = self.wire_indices(inputs);
        Ok(self.register(kind, input_wires, outputs))
    }

    /// Add an arithmetic combinator, returning its index
    pub fn arithmetic(
        &mut self,
        inputs: &[&str],
        left: Operand,
        op: ArithmeticOp,
        right: Operand,
        output: Operand,
        outputs: &[&str],
    ) -> Result<usize> {
        debug!(%left, %op, %right, %output, "arithmetic registered");
        let kind =
            CombinatorKind::Arithmetic(ArithmeticCombinator::new(left, op, right, output)?);
        let input_wires = self.wire_indices(inputs);
        Ok(self.register(kind, input_wires, outputs))
    }

    /// Add a constant combinator, returning its index
    ///
    /// Constant combinators read nothing, so they take no input wires.
    pub fn constant(&mut self, signals: SignalFrame, outputs: &[&str]) -> Result<usize> {
        debug!(signals = %signals, "constant registered");
        let kind = CombinatorKind::Constant(ConstantCombinator::new(signals));
        Ok(self.register(kind, Vec::new(), outputs))
    }

    fn register(
        &mut self,
        kind: CombinatorKind,
        input_wires: Vec<usize>,
        outputs: &[&str],
    ) -> usize {
        let output_wires = self.wire_indices(outputs);
        let index = self.combinators.len();
        for &wire in &input_wires {
            self.wires[wire].readers.push(index);
        }
        for &wire in &output_wires {
            self.wires[wire].writers.push(index);
        }
        self.combinators.push(Combinator {
            kind,
            input: SignalFrame::new(),
            input_wires,
            output_wires,
        });
        index
    }

    /// Produce the finished circuit
    pub fn finish(self) -> Circuit {
        debug!(
            wires = self.wires.len(),
            combinators = self.combinators.len(),
            "circuit finished"
        );
        Circuit::new(self.wires, self.combinators)
    }
}
