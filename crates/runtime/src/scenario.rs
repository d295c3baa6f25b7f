//! Scenario scheduler
//!
//! Declarative test scripts for circuits: per-tick signal injection and
//! expectation checks, with multi-tick holds repeating a statement's
//! operations across implicit gap ticks.

use indexmap::IndexMap;
use tracing::{debug, error, info, instrument, trace};

use crate::circuit::Circuit;
use crate::error::{Error, Result, ScenarioError, SignalMismatch};
use crate::frame::SignalFrame;
use crate::types::WireName;

/// Set or expect operations, one frame per wire
type WireOps = Vec<(WireName, SignalFrame)>;

/// One scheduled tick of a scenario
///
/// Immutable once built. `hold` > 0 repeats the tick's operations for
/// that many ticks in total, the declaring tick included.
#[derive(Debug, Clone)]
pub struct TickRecord {
    tick: u64,
    expects: WireOps,
    sets: WireOps,
    hold: u32,
}

impl TickRecord {
    /// Build a tick record. Operations targeting the same wire are
    /// merged additively.
    pub fn new(
        tick: u64,
        expects: impl IntoIterator<Item = (WireName, SignalFrame)>,
        sets: impl IntoIterator<Item = (WireName, SignalFrame)>,
        hold: u32,
    ) -> Self {
        Self {
            tick,
            expects: merge_ops(expects),
            sets: merge_ops(sets),
            hold,
        }
    }

    /// Absolute tick index this record executes at
    pub fn tick(&self) -> u64 {
        self.tick
    }
}

/// An active hold: operations still owed to upcoming ticks
#[derive(Debug)]
struct Hold {
    remaining: u32,
    expects: WireOps,
    sets: WireOps,
}

/// A test run against a circuit
///
/// Built once after circuit construction, run once.
#[derive(Debug)]
pub struct Scenario {
    name: String,
    ticks: Vec<TickRecord>,
}

impl Scenario {
    /// Build a scenario. Tick records must be in strictly increasing
    /// tick order.
    pub fn new(name: impl Into<String>, ticks: Vec<TickRecord>) -> Result<Self> {
        for pair in ticks.windows(2) {
            if pair[1].tick <= pair[0].tick {
                return Err(Error::OutOfOrderTick {
                    tick: pair[1].tick,
                    last: pair[0].tick,
                });
            }
        }
        Ok(Self {
            name: name.into(),
            ticks,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the scenario against a circuit
    ///
    /// Every wire frame is reset first. Each executed tick evaluates
    /// all of its expectations before the verdict; on any mismatch the
    /// run aborts with the full mismatch list and that tick's set
    /// operations are not applied.
    #[instrument(skip(self, circuit), fields(scenario = %self.name))]
    pub fn run(&self, circuit: &mut Circuit) -> Result<()> {
        info!(ticks = self.ticks.len(), "scenario start");
        for wire in circuit.wires_mut() {
            wire.signals.clear();
        }

        // `elapsed` tracks how far the circuit has been advanced,
        // `last` the previous record's tick index.
        let mut elapsed = 0u64;
        let mut last = 0u64;
        let mut holds: Vec<Hold> = Vec::new();

        for record in &self.ticks {
            // Materialize one tick per integer in the gap while holds
            // are still owed.
            for gap in (last + 1)..record.tick {
                if holds.is_empty() {
                    break;
                }
                let (expects, sets) = drain_holds(&mut holds);
                circuit.tick(gap - elapsed);
                elapsed = gap;
                trace!(tick = gap, "synthetic hold tick");
                self.execute(circuit, gap, &expects, &sets)?;
            }

            circuit.tick(record.tick - elapsed);
            elapsed = record.tick;

            // Holds spanning this record merge into its operations.
            let (expects, sets) = if holds.is_empty() {
                (record.expects.clone(), record.sets.clone())
            } else {
                let (held_expects, held_sets) = drain_holds(&mut holds);
                (
                    merge_ops(record.expects.iter().cloned().chain(held_expects)),
                    merge_ops(record.sets.iter().cloned().chain(held_sets)),
                )
            };
            trace!(tick = record.tick, "scenario tick");
            self.execute(circuit, record.tick, &expects, &sets)?;

            // The record itself was the hold's first occurrence.
            if record.hold > 1 {
                debug!(
                    tick = record.tick,
                    remaining = record.hold - 1,
                    "hold registered"
                );
                holds.push(Hold {
                    remaining: record.hold - 1,
                    expects: record.expects.clone(),
                    sets: record.sets.clone(),
                });
            }
            last = record.tick;
        }

        info!("scenario complete");
        Ok(())
    }

    fn execute(
        &self,
        circuit: &mut Circuit,
        tick: u64,
        expects: &WireOps,
        sets: &WireOps,
    ) -> Result<()> {
        let mut mismatches = Vec::new();
        for (wire_name, expected) in expects {
            let wire = circuit
                .wire(wire_name)
                .ok_or_else(|| Error::WireNotFound(wire_name.clone()))?;
            for (signal, expected) in expected.iter() {
                let actual = wire.signals.get(signal);
                if actual != expected {
                    mismatches.push(SignalMismatch {
                        wire: wire_name.clone(),
                        signal: signal.clone(),
                        expected,
                        actual,
                    });
                }
            }
        }
        if !mismatches.is_empty() {
            error!(tick, count = mismatches.len(), "expectations failed");
            return Err(ScenarioError {
                scenario: self.name.clone(),
                tick,
                mismatches,
            }
            .into());
        }

        for (wire_name, values) in sets {
            let wire = circuit
                .wire_mut(wire_name)
                .ok_or_else(|| Error::WireNotFound(wire_name.clone()))?;
            wire.signals.merge_add(values);
        }
        Ok(())
    }
}

/// Merge operations targeting the same wire additively, preserving
/// first-occurrence order.
fn merge_ops(ops: impl IntoIterator<Item = (WireName, SignalFrame)>) -> WireOps {
    let mut merged: IndexMap<WireName, SignalFrame> = IndexMap::new();
    for (wire, frame) in ops {
        merged.entry(wire).or_default().merge_add(&frame);
    }
    merged.into_iter().collect()
}

/// Collect one tick's operations from every active hold, decrementing
/// each and retiring the exhausted ones.
fn drain_holds(holds: &mut Vec<Hold>) -> (WireOps, WireOps) {
    let mut expects: Vec<(WireName, SignalFrame)> = Vec::new();
    let mut sets: Vec<(WireName, SignalFrame)> = Vec::new();
    for hold in holds.iter_mut() {
        expects.extend(hold.expects.iter().cloned());
        sets.extend(hold.sets.iter().cloned());
        hold.remaining -= 1;
    }
    holds.retain(|hold| hold.remaining > 0);
    (merge_ops(expects), merge_ops(sets))
}
