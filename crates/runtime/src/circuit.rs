//! Circuit graph and the two-phase tick
//!
//! The `Circuit` owns every wire and combinator in arena storage; graph
//! edges are plain indices into those arenas, so feedback loops need no
//! owning pointers between nodes.

use indexmap::IndexMap;
use tracing::{instrument, trace};

use crate::combinator::CombinatorKind;
use crate::frame::SignalFrame;
use crate::types::WireName;

/// A wire connecting combinators
///
/// Holds the frame produced in the previous tick. `readers` are the
/// combinators consuming this wire, `writers` the combinators feeding
/// it (kept for graph inspection).
#[derive(Debug)]
pub struct Wire {
    name: WireName,
    /// Signals written by this wire's writers (or injected externally)
    /// in the last tick
    pub signals: SignalFrame,
    pub(crate) readers: Vec<usize>,
    pub(crate) writers: Vec<usize>,
}

impl Wire {
    pub(crate) fn new(name: WireName) -> Self {
        Self {
            name,
            signals: SignalFrame::new(),
            readers: Vec::new(),
            writers: Vec::new(),
        }
    }

    pub fn name(&self) -> &WireName {
        &self.name
    }

    /// Indices of the combinators reading this wire
    pub fn readers(&self) -> &[usize] {
        &self.readers
    }

    /// Indices of the combinators writing this wire
    pub fn writers(&self) -> &[usize] {
        &self.writers
    }
}

/// A combinator instance in the circuit arena
#[derive(Debug)]
pub struct Combinator {
    pub(crate) kind: CombinatorKind,
    /// Accumulated input for the current tick; always empty at the
    /// start of a tick's combinator phase
    pub(crate) input: SignalFrame,
    pub(crate) input_wires: Vec<usize>,
    pub(crate) output_wires: Vec<usize>,
}

impl Combinator {
    pub fn kind(&self) -> &CombinatorKind {
        &self.kind
    }

    pub fn input_wires(&self) -> &[usize] {
        &self.input_wires
    }

    pub fn output_wires(&self) -> &[usize] {
        &self.output_wires
    }
}

/// A fixed combinator network
///
/// The wire set and combinator list do not change after construction;
/// only the signal frames mutate as the simulation advances.
#[derive(Debug, Default)]
pub struct Circuit {
    wires: IndexMap<WireName, Wire>,
    combinators: Vec<Combinator>,
    tick: u64,
}

impl Circuit {
    pub(crate) fn new(wires: IndexMap<WireName, Wire>, combinators: Vec<Combinator>) -> Self {
        Self {
            wires,
            combinators,
            tick: 0,
        }
    }

    /// Advance the simulation by `n` ticks
    #[instrument(skip(self), fields(from = self.tick))]
    pub fn tick(&mut self, n: u64) {
        for _ in 0..n {
            self.tick_once();
        }
    }

    /// One synchronous step: wire phase, then combinator phase.
    ///
    /// The split enforces a one-tick propagation delay: a combinator
    /// only ever sees frames its input wires held at the start of the
    /// tick, never output produced within the same tick.
    fn tick_once(&mut self) {
        trace!(tick = self.tick, "wire phase");
        for i in 0..self.wires.len() {
            let frame = std::mem::take(&mut self.wires[i].signals);
            for j in 0..self.wires[i].readers.len() {
                let combinator = self.wires[i].readers[j];
                self.combinators[combinator].input.merge_add(&frame);
            }
        }

        trace!(tick = self.tick, "combinator phase");
        for c in 0..self.combinators.len() {
            let output = {
                let combinator = &self.combinators[c];
                combinator.kind.process(&combinator.input)
            };
            self.combinators[c].input.clear();
            for j in 0..self.combinators[c].output_wires.len() {
                let wire = self.combinators[c].output_wires[j];
                // Outputs of multiple writers merge additively.
                self.wires[wire].signals.merge_add(&output);
            }
        }

        self.tick += 1;
    }

    /// Number of ticks simulated so far
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Look up a wire by name
    pub fn wire(&self, name: &WireName) -> Option<&Wire> {
        self.wires.get(name)
    }

    /// Look up a wire by name, mutably (external signal injection)
    pub fn wire_mut(&mut self, name: &WireName) -> Option<&mut Wire> {
        self.wires.get_mut(name)
    }

    /// Iterate all wires in creation order
    pub fn wires(&self) -> impl Iterator<Item = &Wire> {
        self.wires.values()
    }

    pub(crate) fn wires_mut(&mut self) -> impl Iterator<Item = &mut Wire> {
        self.wires.values_mut()
    }

    /// Iterate all combinators in creation order
    pub fn combinators(&self) -> impl Iterator<Item = &Combinator> {
        self.combinators.iter()
    }
}
