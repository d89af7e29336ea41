//! Policy answers derived from the collected solution set.
//!
//! All functions take the ascending (price, weight) sequence produced by the
//! [`SolutionCollector`] and are pure: the same sequence and capacity always
//! give the same answers.

use crate::collector::SolutionCollector;
use crate::model::PackedState;

/// Every distinct (price, weight) pair, in ascending order.
pub fn all_unique(solutions: &[PackedState]) -> Vec<PackedState> {
    solutions.to_vec()
}

/// Highest-price states whose weight stays within `capacity`.
///
/// Locates the last state that fits the capacity; its price is the best one
/// achievable under the weight limit. Returns every fitting state with that
/// price, lightest first. Empty when nothing fits.
pub fn max_value_under_capacity(solutions: &[PackedState], capacity: u64) -> Vec<PackedState> {
    let Some(best) = solutions.iter().rev().find(|s| s.weight <= capacity) else {
        return Vec::new();
    };
    solutions
        .iter()
        .filter(|s| s.price == best.price && s.weight <= capacity)
        .cloned()
        .collect()
}

/// The lightest state among those with the overall maximum price.
///
/// Because the sequence is sorted by weight within each price, this is the
/// first entry of the maximum-price run at the tail.
pub fn max_value_min_weight(solutions: &[PackedState]) -> Option<PackedState> {
    let max_price = solutions.last()?.price;
    solutions.iter().find(|s| s.price == max_price).cloned()
}

/// The most densely packed states among [`max_value_under_capacity`].
///
/// Returns every candidate with the smallest number of free cells left.
pub fn max_value_max_fill(solutions: &[PackedState], capacity: u64) -> Vec<PackedState> {
    let candidates = max_value_under_capacity(solutions, capacity);
    let Some(min_free) = candidates.iter().map(PackedState::free_cells).min() else {
        return Vec::new();
    };
    candidates
        .into_iter()
        .filter(|s| s.free_cells() == min_free)
        .collect()
}

/// All policy answers for one solution set.
#[derive(Clone, Debug)]
pub struct Analysis {
    pub capacity: u64,
    pub all_unique: Vec<PackedState>,
    pub max_value_under_capacity: Vec<PackedState>,
    pub max_value_min_weight: Option<PackedState>,
    pub max_value_max_fill: Vec<PackedState>,
}

impl Analysis {
    /// Derives every answer from the collected solutions.
    pub fn from_collector(collector: &SolutionCollector, capacity: u64) -> Self {
        Self::from_sequence(&collector.to_ascending_sequence(), capacity)
    }

    /// Derives every answer from an ascending (price, weight) sequence.
    pub fn from_sequence(solutions: &[PackedState], capacity: u64) -> Self {
        Self {
            capacity,
            all_unique: all_unique(solutions),
            max_value_under_capacity: max_value_under_capacity(solutions, capacity),
            max_value_min_weight: max_value_min_weight(solutions),
            max_value_max_fill: max_value_max_fill(solutions, capacity),
        }
    }

    /// Best price achievable within the capacity, if any state fits.
    pub fn best_price(&self) -> Option<u64> {
        self.max_value_under_capacity.first().map(|s| s.price)
    }
}
