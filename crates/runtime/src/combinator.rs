//! Combinators
//!
//! The three combinator kinds and their per-tick evaluation rules. Each
//! kind exposes `process`, a pure function from the accumulated input
//! frame to the output frame for this tick.
//!
//! The decider's wildcard handling follows the game's rules: the left
//! selector picks the candidate set and the aggregate mode, the output
//! selector picks the signals walked to build the output and the
//! per-signal emission rule.

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::frame::SignalFrame;
use crate::types::{ArithmeticOp, DeciderOp, Operand, OutputMode, SignalId};

/// Right-hand operand: a constant or a plain signal, never a wildcard
#[derive(Debug, Clone, PartialEq, Eq)]
enum RightOperand {
    Constant(i64),
    Signal(SignalId),
}

impl RightOperand {
    fn from_operand(operand: Operand, slot: &'static str) -> Result<Self> {
        match operand {
            Operand::Constant(v) => Ok(RightOperand::Constant(v)),
            Operand::Signal(s) => Ok(RightOperand::Signal(s)),
            other => Err(Error::InvalidOperand {
                slot,
                operand: other.to_string(),
            }),
        }
    }

    /// Resolve against the current input frame
    fn resolve(&self, input: &SignalFrame) -> i64 {
        match self {
            RightOperand::Constant(v) => *v,
            RightOperand::Signal(s) => input.get(s),
        }
    }

    fn excludes(&self, id: &SignalId) -> bool {
        matches!(self, RightOperand::Signal(s) if s == id)
    }
}

/// Left selector of a decider
#[derive(Debug, Clone, PartialEq, Eq)]
enum DeciderLeft {
    Signal(SignalId),
    Each,
    Anything,
    Everything,
}

/// Output selector of a decider
#[derive(Debug, Clone, PartialEq, Eq)]
enum DeciderOutput {
    Signal(SignalId),
    Each,
    Anything,
    Everything,
}

/// How per-signal comparisons combine into the overall pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Aggregate {
    /// All candidates must pass; fails fast on the first miss
    And,
    /// At least one candidate must pass
    Or,
    /// No aggregate gating; each candidate only gates its own entry
    All,
}

/// Comparison combinator with wildcard selectors
#[derive(Debug, Clone)]
pub struct DeciderCombinator {
    left: DeciderLeft,
    op: DeciderOp,
    right: RightOperand,
    output: DeciderOutput,
    mode: OutputMode,
    aggregate: Aggregate,
}

impl DeciderCombinator {
    /// Validate the operand combination and build the combinator
    pub fn new(
        left: Operand,
        op: DeciderOp,
        right: Operand,
        output: Operand,
        mode: OutputMode,
    ) -> Result<Self> {
        let left = match left {
            Operand::Signal(s) => DeciderLeft::Signal(s),
            Operand::Each => DeciderLeft::Each,
            Operand::Anything => DeciderLeft::Anything,
            Operand::Everything => DeciderLeft::Everything,
            other => {
                return Err(Error::InvalidOperand {
                    slot: "decider left",
                    operand: other.to_string(),
                });
            }
        };
        let right = RightOperand::from_operand(right, "decider right")?;
        let output = match output {
            Operand::Signal(s) => DeciderOutput::Signal(s),
            Operand::Each => DeciderOutput::Each,
            Operand::Anything => DeciderOutput::Anything,
            Operand::Everything => DeciderOutput::Everything,
            other => {
                return Err(Error::InvalidOperand {
                    slot: "decider output",
                    operand: other.to_string(),
                });
            }
        };
        let aggregate = match left {
            DeciderLeft::Signal(_) | DeciderLeft::Everything => Aggregate::And,
            DeciderLeft::Anything => Aggregate::Or,
            DeciderLeft::Each => Aggregate::All,
        };
        Ok(Self {
            left,
            op,
            right,
            output,
            mode,
            aggregate,
        })
    }

    /// Signals actually compared against the right operand
    fn candidates(&self, input: &SignalFrame) -> IndexMap<SignalId, i64> {
        match &self.left {
            DeciderLeft::Signal(s) => IndexMap::from([(s.clone(), input.get(s))]),
            DeciderLeft::Each => input.iter().map(|(id, v)| (id.clone(), v)).collect(),
            // The signal named by the right operand compares against
            // itself trivially, so it is not a candidate here.
            DeciderLeft::Anything | DeciderLeft::Everything => input
                .iter()
                .filter(|(id, _)| !self.right.excludes(id))
                .map(|(id, v)| (id.clone(), v))
                .collect(),
        }
    }

    /// Signals walked to build the output, in a defined order
    fn domain(
        &self,
        input: &SignalFrame,
        candidates: &IndexMap<SignalId, i64>,
    ) -> Vec<(SignalId, i64)> {
        match &self.output {
            DeciderOutput::Each | DeciderOutput::Anything => {
                candidates.iter().map(|(id, v)| (id.clone(), *v)).collect()
            }
            DeciderOutput::Everything => input.iter().map(|(id, v)| (id.clone(), v)).collect(),
            DeciderOutput::Signal(name) => {
                let mut domain: Vec<(SignalId, i64)> =
                    candidates.iter().map(|(id, v)| (id.clone(), *v)).collect();
                // The named output signal is always walked, even when
                // it is not compared.
                if !candidates.contains_key(name) {
                    domain.push((name.clone(), input.get(name)));
                }
                domain
            }
        }
    }

    /// Per-signal emission rule, keyed by the output selector
    fn accumulate(&self, output: &mut SignalFrame, stype: &SignalId, rval: i64, cmp: bool) {
        match &self.output {
            DeciderOutput::Each | DeciderOutput::Anything => {
                if cmp {
                    output.add(stype.clone(), rval);
                }
            }
            DeciderOutput::Everything => output.add(stype.clone(), rval),
            DeciderOutput::Signal(name) => {
                if matches!(self.left, DeciderLeft::Each) {
                    // Multiple candidates may target the same fixed
                    // name; their values accumulate.
                    if cmp {
                        output.add(name.clone(), rval);
                    }
                } else if stype == name {
                    output.add(stype.clone(), rval);
                }
            }
        }
    }

    /// Evaluate one tick's worth of input
    pub fn process(&self, input: &SignalFrame) -> SignalFrame {
        let right = self.right.resolve(input);
        let candidates = self.candidates(input);
        let domain = self.domain(input, &candidates);

        let mut output = SignalFrame::new();
        let mut passes = !matches!(self.aggregate, Aggregate::Or);
        for (stype, value) in &domain {
            let cmp = if candidates.contains_key(stype) {
                let cmp = self.op.eval(*value, right);
                match self.aggregate {
                    Aggregate::And => {
                        passes = passes && cmp;
                        if !passes {
                            break;
                        }
                    }
                    Aggregate::Or => passes = passes || cmp,
                    Aggregate::All => {}
                }
                cmp
            } else {
                // Pulled in only by `everything` or the forced output
                // name; never gates the aggregate.
                true
            };
            let rval = match self.mode {
                OutputMode::PassThrough => *value,
                OutputMode::One => 1,
            };
            self.accumulate(&mut output, stype, rval, cmp);
            if matches!(self.output, DeciderOutput::Anything) && cmp {
                break;
            }
        }

        // An `anything` decider with nothing to compare never passes.
        if matches!(self.aggregate, Aggregate::Or) && candidates.is_empty() {
            passes = false;
        }

        if passes { output } else { SignalFrame::new() }
    }
}

/// Valid operand combinations of an arithmetic combinator
#[derive(Debug, Clone, PartialEq, Eq)]
enum ArithmeticMode {
    /// Plain left signal computed into a plain output signal
    Single { left: SignalId, output: SignalId },
    /// `each` left mapped per signal onto `each` output
    EachToEach,
    /// `each` left, per-signal results summed into one output signal
    EachToSum { output: SignalId },
}

/// Binary-operation combinator
#[derive(Debug, Clone)]
pub struct ArithmeticCombinator {
    mode: ArithmeticMode,
    op: ArithmeticOp,
    right: RightOperand,
}

impl ArithmeticCombinator {
    /// Validate the operand combination and build the combinator
    pub fn new(left: Operand, op: ArithmeticOp, right: Operand, output: Operand) -> Result<Self> {
        let right = RightOperand::from_operand(right, "arithmetic right")?;
        let mode = match (left, output) {
            (Operand::Signal(left), Operand::Signal(output)) => {
                ArithmeticMode::Single { left, output }
            }
            (Operand::Each, Operand::Each) => ArithmeticMode::EachToEach,
            (Operand::Each, Operand::Signal(output)) => ArithmeticMode::EachToSum { output },
            (Operand::Signal(_), other) | (Operand::Each, other) => {
                return Err(Error::InvalidOperand {
                    slot: "arithmetic output",
                    operand: other.to_string(),
                });
            }
            (other, _) => {
                return Err(Error::InvalidOperand {
                    slot: "arithmetic left",
                    operand: other.to_string(),
                });
            }
        };
        Ok(Self { mode, op, right })
    }

    /// Evaluate one tick's worth of input
    ///
    /// The right operand is resolved once, before iterating.
    pub fn process(&self, input: &SignalFrame) -> SignalFrame {
        let right = self.right.resolve(input);
        match &self.mode {
            ArithmeticMode::Single { left, output } => {
                let value = self.op.eval(input.get(left), right);
                SignalFrame::from_iter([(output.clone(), value)])
            }
            ArithmeticMode::EachToEach => input
                .iter()
                .map(|(id, v)| (id.clone(), self.op.eval(v, right)))
                .collect(),
            ArithmeticMode::EachToSum { output } => {
                let sum = input
                    .iter()
                    .map(|(_, v)| self.op.eval(v, right))
                    .fold(0i64, i64::wrapping_add);
                SignalFrame::from_iter([(output.clone(), sum)])
            }
        }
    }
}

/// Fixed-emission combinator
///
/// Ignores its input and emits a copy of its configured frame every
/// tick.
#[derive(Debug, Clone)]
pub struct ConstantCombinator {
    signals: SignalFrame,
}

impl ConstantCombinator {
    pub fn new(signals: SignalFrame) -> Self {
        Self { signals }
    }

    pub fn process(&self) -> SignalFrame {
        self.signals.clone()
    }
}

/// Closed set of combinator kinds
///
/// Only these three variants exist, so the dispatch is a plain enum
/// rather than trait objects.
#[derive(Debug, Clone)]
pub enum CombinatorKind {
    Decider(DeciderCombinator),
    Arithmetic(ArithmeticCombinator),
    Constant(ConstantCombinator),
}

impl CombinatorKind {
    /// Compute this tick's output frame from the accumulated input
    pub fn process(&self, input: &SignalFrame) -> SignalFrame {
        match self {
            CombinatorKind::Decider(c) => c.process(input),
            CombinatorKind::Arithmetic(c) => c.process(input),
            CombinatorKind::Constant(c) => c.process(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decider(left: &str, op: &str, right: &str, output: &str, mode: OutputMode) -> DeciderCombinator {
        DeciderCombinator::new(
            Operand::from(left),
            op.parse().unwrap(),
            Operand::from(right),
            Operand::from(output),
            mode,
        )
        .unwrap()
    }

    fn arithmetic(left: &str, op: &str, right: &str, output: &str) -> ArithmeticCombinator {
        ArithmeticCombinator::new(
            Operand::from(left),
            op.parse().unwrap(),
            Operand::from(right),
            Operand::from(output),
        )
        .unwrap()
    }

    fn abc() -> SignalFrame {
        SignalFrame::from_iter([("a", 1), ("b", 2), ("c", 3)])
    }

    // ── Decider: plain-name barrier ───────────────────────────────

    #[test]
    fn test_decider_barrier_passes() {
        let d = decider("x", ">", "0", "x", OutputMode::PassThrough);
        let input = SignalFrame::from_iter([("x", 3)]);
        assert_eq!(d.process(&input), SignalFrame::from_iter([("x", 3)]));
    }

    #[test]
    fn test_decider_barrier_empty_input() {
        let d = decider("x", ">", "0", "x", OutputMode::PassThrough);
        assert_eq!(d.process(&SignalFrame::new()), SignalFrame::new());
    }

    #[test]
    fn test_decider_barrier_blocks_negative() {
        let d = decider("x", ">", "0", "x", OutputMode::PassThrough);
        let input = SignalFrame::from_iter([("x", -3)]);
        assert_eq!(d.process(&input), SignalFrame::new());
    }

    #[test]
    fn test_decider_condition_signal_output_other() {
        // y > 2 : x, condition on y, emit x's value.
        let d = decider("y", ">", "2", "x", OutputMode::PassThrough);
        let input = SignalFrame::from_iter([("y", 5), ("x", 7)]);
        assert_eq!(d.process(&input), SignalFrame::from_iter([("x", 7)]));

        let input = SignalFrame::from_iter([("y", 1), ("x", 7)]);
        assert_eq!(d.process(&input), SignalFrame::new());
    }

    #[test]
    fn test_decider_signal_right_operand() {
        let d = decider("x", "<", "y", "x", OutputMode::PassThrough);
        let input = SignalFrame::from_iter([("x", 2), ("y", 5)]);
        assert_eq!(d.process(&input), SignalFrame::from_iter([("x", 2)]));
    }

    // ── Decider: wildcard table on {a:1, b:2, c:3} ────────────────

    #[test]
    fn test_each_to_each_fixed_one() {
        let d = decider("each", ">", "1", "each", OutputMode::One);
        let out = d.process(&abc());
        assert_eq!(out, SignalFrame::from_iter([("b", 1), ("c", 1)]));
        assert!(!out.contains(&"a".into()));
    }

    #[test]
    fn test_each_to_each_passthrough() {
        let d = decider("each", ">", "1", "each", OutputMode::PassThrough);
        assert_eq!(
            d.process(&abc()),
            SignalFrame::from_iter([("b", 2), ("c", 3)])
        );
    }

    #[test]
    fn test_everything_to_everything_fixed_one() {
        let d = decider("everything", ">", "-1", "everything", OutputMode::One);
        assert_eq!(
            d.process(&abc()),
            SignalFrame::from_iter([("a", 1), ("b", 1), ("c", 1)])
        );
    }

    #[test]
    fn test_everything_to_everything_passthrough() {
        let d = decider("everything", ">", "-1", "everything", OutputMode::PassThrough);
        assert_eq!(d.process(&abc()), abc());
    }

    #[test]
    fn test_everything_fails_when_any_candidate_fails() {
        let d = decider("everything", ">", "1", "everything", OutputMode::PassThrough);
        assert_eq!(d.process(&abc()), SignalFrame::new());
    }

    #[test]
    fn test_everything_passes_on_empty_input() {
        // No candidates means nothing can fail the AND.
        let d = decider("everything", ">", "0", "everything", OutputMode::PassThrough);
        assert_eq!(d.process(&SignalFrame::new()), SignalFrame::new());

        let d = decider("everything", ">", "0", "x", OutputMode::One);
        assert_eq!(
            d.process(&SignalFrame::new()),
            SignalFrame::from_iter([("x", 1)])
        );
    }

    #[test]
    fn test_anything_gates_everything_output() {
        let d = decider("anything", ">", "1", "everything", OutputMode::One);
        assert_eq!(
            d.process(&abc()),
            SignalFrame::from_iter([("a", 1), ("b", 1), ("c", 1)])
        );
    }

    #[test]
    fn test_anything_to_anything_first_match() {
        let d = decider("anything", ">", "1", "anything", OutputMode::PassThrough);
        // First match in insertion order is b.
        assert_eq!(d.process(&abc()), SignalFrame::from_iter([("b", 2)]));
    }

    #[test]
    fn test_anything_fails_when_no_candidate_matches() {
        let d = decider("anything", ">", "5", "everything", OutputMode::One);
        assert_eq!(d.process(&abc()), SignalFrame::new());
    }

    #[test]
    fn test_anything_empty_input_never_passes() {
        let d = decider("anything", ">", "-100", "x", OutputMode::One);
        assert_eq!(d.process(&SignalFrame::new()), SignalFrame::new());
    }

    #[test]
    fn test_wildcard_candidates_exclude_right_signal() {
        // `anything > limit` must not compare limit against itself.
        let d = decider("anything", ">", "limit", "anything", OutputMode::PassThrough);
        let input = SignalFrame::from_iter([("limit", 2), ("a", 1), ("b", 5)]);
        assert_eq!(d.process(&input), SignalFrame::from_iter([("b", 5)]));
    }

    #[test]
    fn test_each_to_fixed_name_accumulates() {
        // each > 1 : x, matching candidates sum into x. The forced
        // output name x is walked too, with its comparison defaulting
        // to true: worth 0 in pass-through, worth 1 in fixed mode.
        let d = decider("each", ">", "1", "x", OutputMode::PassThrough);
        assert_eq!(d.process(&abc()), SignalFrame::from_iter([("x", 5)]));

        let d = decider("each", ">", "1", "x", OutputMode::One);
        assert_eq!(d.process(&abc()), SignalFrame::from_iter([("x", 3)]));
    }

    #[test]
    fn test_each_no_aggregate_gating() {
        // A failing candidate only drops its own entry.
        let d = decider("each", "=", "2", "each", OutputMode::PassThrough);
        assert_eq!(d.process(&abc()), SignalFrame::from_iter([("b", 2)]));
    }

    // ── Decider: construction rejections ──────────────────────────

    #[test]
    fn test_decider_rejects_constant_left() {
        let result = DeciderCombinator::new(
            Operand::Constant(1),
            DeciderOp::Gt,
            Operand::Constant(0),
            Operand::from("x"),
            OutputMode::One,
        );
        assert!(matches!(result, Err(Error::InvalidOperand { .. })));
    }

    #[test]
    fn test_decider_rejects_wildcard_right() {
        let result = DeciderCombinator::new(
            Operand::from("x"),
            DeciderOp::Gt,
            Operand::Each,
            Operand::from("x"),
            OutputMode::One,
        );
        assert!(matches!(result, Err(Error::InvalidOperand { .. })));
    }

    #[test]
    fn test_decider_rejects_constant_output() {
        let result = DeciderCombinator::new(
            Operand::from("x"),
            DeciderOp::Gt,
            Operand::Constant(0),
            Operand::Constant(1),
            OutputMode::One,
        );
        assert!(matches!(result, Err(Error::InvalidOperand { .. })));
    }

    // ── Arithmetic ────────────────────────────────────────────────

    #[test]
    fn test_arithmetic_single() {
        let a = arithmetic("x", "+", "1", "y");
        let input = SignalFrame::from_iter([("x", 41)]);
        assert_eq!(a.process(&input), SignalFrame::from_iter([("y", 42)]));
    }

    #[test]
    fn test_arithmetic_single_missing_left_reads_zero() {
        let a = arithmetic("x", "+", "5", "y");
        assert_eq!(
            a.process(&SignalFrame::new()),
            SignalFrame::from_iter([("y", 5)])
        );
    }

    #[test]
    fn test_arithmetic_signal_right() {
        let a = arithmetic("x", "*", "y", "z");
        let input = SignalFrame::from_iter([("x", 6), ("y", 7)]);
        assert_eq!(a.process(&input), SignalFrame::from_iter([("z", 42)]));
    }

    #[test]
    fn test_arithmetic_each_to_sum() {
        let a = arithmetic("each", "*", "1", "x");
        let out = a.process(&abc());
        assert_eq!(out, SignalFrame::from_iter([("x", 6)]));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_arithmetic_each_to_each() {
        let a = arithmetic("each", "*", "2", "each");
        let out = a.process(&abc());
        assert_eq!(out, SignalFrame::from_iter([("a", 2), ("b", 4), ("c", 6)]));
        assert!(!out.contains(&"x".into()));
    }

    #[test]
    fn test_arithmetic_each_to_sum_empty_input() {
        let a = arithmetic("each", "*", "1", "x");
        assert_eq!(
            a.process(&SignalFrame::new()),
            SignalFrame::from_iter([("x", 0)])
        );
    }

    #[test]
    fn test_arithmetic_rejects_invalid_operands() {
        assert!(matches!(
            ArithmeticCombinator::new(
                Operand::Anything,
                ArithmeticOp::Add,
                Operand::Constant(1),
                Operand::from("x"),
            ),
            Err(Error::InvalidOperand { .. })
        ));
        // each output needs an each left.
        assert!(matches!(
            ArithmeticCombinator::new(
                Operand::from("x"),
                ArithmeticOp::Add,
                Operand::Constant(1),
                Operand::Each,
            ),
            Err(Error::InvalidOperand { .. })
        ));
        assert!(matches!(
            ArithmeticCombinator::new(
                Operand::Each,
                ArithmeticOp::Add,
                Operand::Everything,
                Operand::Each,
            ),
            Err(Error::InvalidOperand { .. })
        ));
    }

    // ── Constant ──────────────────────────────────────────────────

    #[test]
    fn test_constant_emits_copy() {
        let frame = SignalFrame::from_iter([("signal-a", 4), ("signal-b", 5)]);
        let c = ConstantCombinator::new(frame.clone());
        assert_eq!(c.process(), frame);
        // Stable across repeated calls.
        assert_eq!(c.process(), frame);
    }

    #[test]
    fn test_constant_empty() {
        let c = ConstantCombinator::new(SignalFrame::new());
        assert!(c.process().is_empty());
    }
}
