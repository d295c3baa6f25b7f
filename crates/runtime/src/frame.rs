//! Signal frames
//!
//! The additive, default-zero signal multiset carried by wires and
//! accumulated by combinator inputs.

use std::fmt;

use indexmap::IndexMap;

use crate::types::SignalId;

/// A frame of signals: everything present on a wire in a single tick.
///
/// Missing keys read as 0. Entries are never removed implicitly, so a
/// stored 0 stays in the frame until `clear`. Iteration follows
/// first-insertion order; this is the deterministic order used wherever
/// emission order is observable (the `anything` selector's first match
/// and `everything`'s emission order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignalFrame {
    signals: IndexMap<SignalId, i64>,
}

impl SignalFrame {
    /// Create an empty frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a signal's count, 0 if absent
    pub fn get(&self, id: &SignalId) -> i64 {
        self.signals.get(id).copied().unwrap_or(0)
    }

    /// Check whether a signal is present (a stored 0 counts as present)
    pub fn contains(&self, id: &SignalId) -> bool {
        self.signals.contains_key(id)
    }

    /// Overwrite a signal's count, creating the entry if absent
    pub fn set(&mut self, id: SignalId, value: i64) {
        self.signals.insert(id, value);
    }

    /// Add into a signal's count, creating the entry if absent
    pub fn add(&mut self, id: SignalId, value: i64) {
        let entry = self.signals.entry(id).or_insert(0);
        *entry = entry.wrapping_add(value);
    }

    /// Add every entry of `other` into this frame
    pub fn merge_add(&mut self, other: &SignalFrame) {
        for (id, value) in &other.signals {
            self.add(id.clone(), *value);
        }
    }

    /// Remove all entries
    pub fn clear(&mut self) {
        self.signals.clear();
    }

    /// Number of entries, zero-valued ones included
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Check if the frame has no entries
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&SignalId, i64)> {
        self.signals.iter().map(|(id, value)| (id, *value))
    }
}

impl<S: Into<SignalId>> FromIterator<(S, i64)> for SignalFrame {
    fn from_iter<T: IntoIterator<Item = (S, i64)>>(iter: T) -> Self {
        let mut frame = SignalFrame::new();
        for (id, value) in iter {
            frame.add(id.into(), value);
        }
        frame
    }
}

impl fmt::Display for SignalFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (id, value)) in self.signals.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{id}: {value}")?;
        }
        write!(f, "}}")
    }
}
