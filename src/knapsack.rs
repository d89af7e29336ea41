//! Classic 0/1 knapsack where item shapes are ignored.
//!
//! Only weight and price matter here: the best price whose total weight stays
//! within the capacity is found by dynamic programming over the capacity.
//! The table holds `(items + 1) * (capacity + 1)` entries.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{Priced, Weighted};

/// Weight and price of an item without a shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct ClassicItem {
    pub weight: u64,
    pub price: u64,
}

impl Weighted for ClassicItem {
    fn weight(&self) -> u64 {
        self.weight
    }
}

impl Priced for ClassicItem {
    fn price(&self) -> u64 {
        self.price
    }
}

/// Best selection for a classic knapsack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct ClassicSolution {
    pub best_price: u64,
    pub total_weight: u64,
    /// Indices of the chosen items in ascending order.
    pub chosen: Vec<usize>,
}

/// Errors of the classic solver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KnapsackError {
    #[error("total price overflows when adding item {item}")]
    PriceOverflow { item: usize },
}

/// Maximum total price of items whose total weight is at most `capacity`.
pub fn max_price<T: Weighted + Priced>(capacity: usize, items: &[T]) -> Result<u64, KnapsackError> {
    Ok(solve_classic(capacity, items)?.best_price)
}

/// Solves the 0/1 knapsack and reconstructs the chosen items.
///
/// # Examples
/// ```
/// use knapsack2d::knapsack::{ClassicItem, solve_classic};
///
/// let items = [
///     ClassicItem { weight: 1, price: 1 },
///     ClassicItem { weight: 3, price: 4 },
///     ClassicItem { weight: 4, price: 5 },
///     ClassicItem { weight: 5, price: 7 },
/// ];
/// let solution = solve_classic(7, &items).unwrap();
/// assert_eq!(solution.best_price, 9);
/// assert_eq!(solution.chosen, vec![1, 2]);
/// ```
pub fn solve_classic<T: Weighted + Priced>(
    capacity: usize,
    items: &[T],
) -> Result<ClassicSolution, KnapsackError> {
    let width = capacity + 1;
    // best[i * width + w]: best price using the first i items within weight w
    let mut best = vec![0u64; (items.len() + 1) * width];

    for (i, item) in items.iter().enumerate() {
        let (prev, next) = best.split_at_mut((i + 1) * width);
        let prev = &prev[i * width..];
        let next = &mut next[..width];
        for w in 0..width {
            next[w] = prev[w];
            if let Ok(item_weight) = usize::try_from(item.weight()) {
                if item_weight <= w {
                    let with_item = prev[w - item_weight]
                        .checked_add(item.price())
                        .ok_or(KnapsackError::PriceOverflow { item: i })?;
                    next[w] = next[w].max(with_item);
                }
            }
        }
    }

    let mut chosen = Vec::new();
    let mut w = capacity;
    for i in (0..items.len()).rev() {
        if best[(i + 1) * width + w] != best[i * width + w] {
            chosen.push(i);
            // the row differs only when the item fit, so the weight is in range
            w -= items[i].weight() as usize;
        }
    }
    chosen.reverse();

    Ok(ClassicSolution {
        best_price: best[items.len() * width + capacity],
        // chosen weights sum to at most `capacity`
        total_weight: chosen.iter().map(|&i| items[i].weight()).sum(),
        chosen,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Item;
    use crate::types::ShapeGrid;

    fn items(pairs: &[(u64, u64)]) -> Vec<ClassicItem> {
        pairs
            .iter()
            .map(|&(weight, price)| ClassicItem { weight, price })
            .collect()
    }

    #[test]
    fn picks_best_combination() {
        let items = items(&[(5, 10), (4, 40), (6, 30), (3, 50)]);
        let solution = solve_classic(10, &items).unwrap();
        assert_eq!(solution.best_price, 90);
        assert_eq!(solution.chosen, vec![1, 3]);
        assert_eq!(solution.total_weight, 7);
    }

    #[test]
    fn zero_capacity_takes_only_weightless_items() {
        let items = items(&[(0, 3), (1, 10)]);
        let solution = solve_classic(0, &items).unwrap();
        assert_eq!(solution.best_price, 3);
        assert_eq!(solution.chosen, vec![0]);
    }

    #[test]
    fn items_heavier_than_capacity_are_skipped() {
        let items = items(&[(100, 1000), (2, 1)]);
        assert_eq!(max_price(10, &items), Ok(1));
    }

    #[test]
    fn no_items_gives_zero() {
        let solution = solve_classic::<ClassicItem>(10, &[]).unwrap();
        assert_eq!(solution.best_price, 0);
        assert!(solution.chosen.is_empty());
    }

    #[test]
    fn shaped_items_can_be_solved_ignoring_shape() {
        let shaped = vec![
            Item::new(2, 3, ShapeGrid::shape_from_lines(&["@@"])).unwrap(),
            Item::new(3, 4, ShapeGrid::shape_from_lines(&["@"])).unwrap(),
            Item::new(4, 8, ShapeGrid::shape_from_lines(&["@@@"])).unwrap(),
        ];
        let solution = solve_classic(6, &shaped).unwrap();
        assert_eq!(solution.best_price, 11);
        assert_eq!(solution.chosen, vec![0, 2]);
    }

    #[test]
    fn overflowing_price_sum_is_an_error() {
        let items = items(&[(1, u64::MAX), (1, 1)]);
        assert_eq!(
            solve_classic(2, &items),
            Err(KnapsackError::PriceOverflow { item: 1 })
        );
    }

    #[test]
    fn max_price_alone_does_not_overflow() {
        let items = items(&[(1, u64::MAX), (2, 1)]);
        assert_eq!(max_price(2, &items), Ok(u64::MAX));
    }
}
