//! Data models for the shaped knapsack.
//!
//! This module defines the fundamental data structures of the packing search:
//! - `Item`: an object with weight, price and a cell shape
//! - `Container`: the grid items are packed into, with a weight capacity
//! - `PackedState`: a container snapshot with the totals of everything in it
//!
//! The weight and price accessors come from the traits in the `types` module.

use std::cmp::Ordering;

use thiserror::Error;

use crate::types::{ContainerGrid, Priced, ShapeGrid, Weighted};

/// Validation error for item and container data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid shape: {0}")]
    InvalidShape(String),
    #[error("Invalid container: {0}")]
    InvalidContainer(String),
}

/// An object that can be packed.
///
/// Items are identified by their position in the item list; that index is
/// what the search tracks and what tags the item's cells in a container.
///
/// # Fields
/// * `weight` - Weight of the item
/// * `price` - Value of the item
/// * `shape` - Occupied cells in the item's bounding box
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub weight: u64,
    pub price: u64,
    pub shape: ShapeGrid,
}

impl Item {
    /// Creates a new item after checking that its shape occupies at least one cell.
    ///
    /// # Examples
    /// ```
    /// use knapsack2d::model::Item;
    /// use knapsack2d::types::ShapeGrid;
    ///
    /// let item = Item::new(3, 10, ShapeGrid::shape_from_lines(&["@@"]));
    /// assert!(item.is_ok());
    ///
    /// let hollow = Item::new(3, 10, ShapeGrid::shape_from_lines(&["  "]));
    /// assert!(hollow.is_err());
    /// ```
    pub fn new(weight: u64, price: u64, shape: ShapeGrid) -> Result<Self, ValidationError> {
        if shape.occupied_count() == 0 {
            return Err(ValidationError::InvalidShape(
                "item shape must occupy at least one cell".to_string(),
            ));
        }
        Ok(Self {
            weight,
            price,
            shape,
        })
    }

    /// Number of cells the item covers.
    pub fn area(&self) -> usize {
        self.shape.occupied_count()
    }
}

impl Weighted for Item {
    fn weight(&self) -> u64 {
        self.weight
    }
}

impl Priced for Item {
    fn price(&self) -> u64 {
        self.price
    }
}

/// The container items are packed into.
///
/// # Fields
/// * `grid` - Free and blocked cells of the empty container
/// * `capacity` - Maximum total weight the policy answers respect
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Container {
    pub grid: ContainerGrid,
    pub capacity: u64,
}

impl Container {
    /// Creates a container after checking that it has at least one cell.
    pub fn new(grid: ContainerGrid, capacity: u64) -> Result<Self, ValidationError> {
        if grid.is_empty() {
            return Err(ValidationError::InvalidContainer(
                "container must have at least one row and one column".to_string(),
            ));
        }
        Ok(Self { grid, capacity })
    }

    /// Number of cells in the bounding rectangle.
    pub fn cell_count(&self) -> usize {
        self.grid.rows() * self.grid.cols()
    }

    /// Packed state of the empty container.
    pub fn empty_state(&self) -> PackedState {
        PackedState::new(self.grid.clone(), 0, 0)
    }
}

/// A parsed problem: a container and the ordered list of items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Problem {
    pub container: Container,
    pub items: Vec<Item>,
}

/// A container snapshot together with the total weight and price of its contents.
///
/// `PackedState` is ordered by price, then weight. Two states with the same
/// price and weight compare equal even if their grids differ, so the
/// solution set keeps one representative per (price, weight) pair.
#[derive(Clone, Debug)]
pub struct PackedState {
    pub grid: ContainerGrid,
    pub weight: u64,
    pub price: u64,
}

impl PackedState {
    pub fn new(grid: ContainerGrid, weight: u64, price: u64) -> Self {
        Self {
            grid,
            weight,
            price,
        }
    }

    /// State after adding `item`, whose cells are already stamped into `grid`.
    ///
    /// Returns `None` if the total weight or price no longer fits in a `u64`.
    pub fn with_item(&self, grid: ContainerGrid, item: &Item) -> Option<Self> {
        Some(Self {
            grid,
            weight: self.weight.checked_add(item.weight)?,
            price: self.price.checked_add(item.price)?,
        })
    }

    /// Number of cells that are still free (lower means denser packing).
    pub fn free_cells(&self) -> usize {
        self.grid.free_count()
    }
}

impl Weighted for PackedState {
    fn weight(&self) -> u64 {
        self.weight
    }
}

impl Priced for PackedState {
    fn price(&self) -> u64 {
        self.price
    }
}

impl PartialEq for PackedState {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PackedState {}

impl PartialOrd for PackedState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PackedState {
    fn cmp(&self, other: &Self) -> Ordering {
        self.price
            .cmp(&other.price)
            .then_with(|| self.weight.cmp(&other.weight))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;

    fn grid(lines: &[&str]) -> ContainerGrid {
        ContainerGrid::container_from_lines(lines)
    }

    #[test]
    fn states_order_by_price_then_weight() {
        let a = PackedState::new(grid(&["_"]), 5, 10);
        let b = PackedState::new(grid(&["_"]), 2, 12);
        let c = PackedState::new(grid(&["_"]), 7, 10);
        assert!(a < b);
        assert!(a < c);
        assert!(c < b);
    }

    #[test]
    fn states_with_same_totals_are_equal_regardless_of_grid() {
        let a = PackedState::new(grid(&["__"]), 3, 4);
        let b = PackedState::new(grid(&["##"]), 3, 4);
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn with_item_adds_totals() {
        let item = Item::new(2, 7, ShapeGrid::shape_from_lines(&["@"])).unwrap();
        let base = PackedState::new(grid(&["__"]), 1, 1);
        let mut stamped = grid(&["__"]);
        stamped.set(0, 0, Cell::Occupied(0));
        let next = base.with_item(stamped, &item).expect("totals fit");
        assert_eq!(next.weight, 3);
        assert_eq!(next.price, 8);
        assert_eq!(next.free_cells(), 1);
    }

    #[test]
    fn with_item_reports_overflowing_totals() {
        let heavy = Item::new(u64::MAX, 1, ShapeGrid::shape_from_lines(&["@"])).unwrap();
        let base = PackedState::new(grid(&["__"]), 1, 0);
        assert!(base.with_item(grid(&["__"]), &heavy).is_none());

        let pricey = Item::new(0, u64::MAX, ShapeGrid::shape_from_lines(&["@"])).unwrap();
        let base = PackedState::new(grid(&["__"]), 0, 1);
        assert!(base.with_item(grid(&["__"]), &pricey).is_none());
    }

    #[test]
    fn rejects_item_without_cells() {
        let err = Item::new(1, 1, ShapeGrid::shape_from_lines(&[" ", ""])).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidShape(_)));
    }

    #[test]
    fn rejects_empty_container() {
        let empty: [&str; 0] = [];
        let err = Container::new(grid(&empty), 10).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidContainer(_)));
        assert!(Container::new(grid(&[""]), 10).is_err());
    }

    #[test]
    fn empty_state_has_zero_totals() {
        let container = Container::new(grid(&["_#", "__"]), 4).unwrap();
        let state = container.empty_state();
        assert_eq!((state.weight, state.price), (0, 0));
        assert_eq!(state.free_cells(), 3);
        assert_eq!(container.cell_count(), 4);
    }
}
