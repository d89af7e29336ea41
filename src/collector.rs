//! Ordered, deduplicating collection of terminal packing states.

use std::collections::BTreeSet;

use crate::model::PackedState;

/// Collects the terminal states reached by the search.
///
/// States are kept in ascending (price, weight) order and deduplicated by
/// that pair: the first state inserted for a pair is kept, later ones with
/// the same totals are dropped even when their grids differ.
#[derive(Clone, Debug, Default)]
pub struct SolutionCollector {
    states: BTreeSet<PackedState>,
}

impl SolutionCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a state. Returns `true` if its (price, weight) pair was new.
    pub fn insert(&mut self, state: PackedState) -> bool {
        self.states.insert(state)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Iterates over the states in ascending (price, weight) order.
    pub fn iter(&self) -> impl Iterator<Item = &PackedState> + '_ {
        self.states.iter()
    }

    /// All states in ascending (price, weight) order.
    pub fn to_ascending_sequence(&self) -> Vec<PackedState> {
        self.states.iter().cloned().collect()
    }
}
