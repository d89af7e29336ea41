//! Common grid types and traits for 2D packing.
//!
//! This module defines the rectangular cell grid shared by item shapes and
//! containers, the cell states a container can hold and the small trait
//! abstractions used across the model.

use std::fmt;

/// Character marking a free container cell in the text representation.
pub const FREE_CHAR: char = '_';

/// Character used when rendering a blocked container cell.
pub const BLOCKED_CHAR: char = '#';

/// Character marking an occupied cell of an item shape.
pub const SHAPE_CHAR: char = '@';

/// Character used when rendering an empty cell of an item shape.
pub const EMPTY_SHAPE_CHAR: char = ' ';

/// Symbols used to tag the cells of placed items, by item index.
const ITEM_SYMBOLS: &[u8] = b"123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Returns the symbol that marks cells of the item with the given index.
///
/// Indices beyond the symbol table are rendered as `*`.
///
/// # Examples
/// ```
/// use knapsack2d::types::item_symbol;
///
/// assert_eq!(item_symbol(0), '1');
/// assert_eq!(item_symbol(9), 'A');
/// ```
pub fn item_symbol(index: usize) -> char {
    ITEM_SYMBOLS.get(index).map(|&b| b as char).unwrap_or('*')
}

/// State of a single container cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cell {
    /// Usable and not yet taken.
    Free,
    /// Permanently unusable, part of the container outline.
    Blocked,
    /// Taken by the item with this index.
    Occupied(usize),
}

impl Cell {
    /// Parses a container character: `_` is free, everything else is blocked.
    #[inline]
    pub fn from_char(c: char) -> Self {
        if c == FREE_CHAR {
            Cell::Free
        } else {
            Cell::Blocked
        }
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        matches!(self, Cell::Free)
    }

    /// Character used when rendering this cell.
    pub fn symbol(&self) -> char {
        match self {
            Cell::Free => FREE_CHAR,
            Cell::Blocked => BLOCKED_CHAR,
            Cell::Occupied(index) => item_symbol(*index),
        }
    }
}

/// A rectangular grid of cells stored in row-major order.
///
/// Item shapes use `Grid<bool>` (`true` = occupied), containers use
/// `Grid<Cell>`. Equality and ordering are structural: dimensions first, then
/// cell contents, which makes grids usable as keys of ordered sets.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    cells: Vec<T>,
}

/// Grid describing the occupied cells of an item shape.
pub type ShapeGrid = Grid<bool>;

/// Grid describing a container and everything stamped onto it.
pub type ContainerGrid = Grid<Cell>;

impl<T: Clone> Grid<T> {
    /// Creates a grid of the given size with every cell set to `fill`.
    pub fn filled(rows: usize, cols: usize, fill: T) -> Self {
        Self {
            rows,
            cols,
            cells: vec![fill; rows * cols],
        }
    }

    /// Builds a grid from rows of possibly unequal length.
    ///
    /// The bounding rectangle is as wide as the longest row; missing cells of
    /// shorter rows are set to `pad`.
    pub fn from_ragged_rows(rows: Vec<Vec<T>>, pad: T) -> Self {
        let height = rows.len();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut cells = Vec::with_capacity(height * width);
        for mut row in rows {
            row.resize(width, pad.clone());
            cells.extend(row);
        }
        Self {
            rows: height,
            cols: width,
            cells,
        }
    }
}

impl<T> Grid<T> {
    /// Number of rows (height).
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (width).
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns the cell at (`row`, `col`), or `None` when out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row < self.rows && col < self.cols {
            self.cells.get(row * self.cols + col)
        } else {
            None
        }
    }

    /// Overwrites the cell at (`row`, `col`). Returns `false` when out of bounds.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: T) -> bool {
        if row < self.rows && col < self.cols {
            self.cells[row * self.cols + col] = value;
            true
        } else {
            false
        }
    }

    /// Iterates over all cells with their coordinates in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> + '_ {
        let cols = self.cols.max(1);
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (i / cols, i % cols, cell))
    }

    /// Iterates over the rows as slices.
    pub fn row_slices(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.cells.chunks(self.cols.max(1))
    }
}

impl ShapeGrid {
    /// Parses shape rows: `@` is an occupied cell, everything else is empty.
    pub fn shape_from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let rows = lines
            .iter()
            .map(|line| line.as_ref().chars().map(|c| c == SHAPE_CHAR).collect())
            .collect();
        Grid::from_ragged_rows(rows, false)
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Coordinates of the occupied cells in row-major order.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.iter().filter(|&(_, _, &c)| c).map(|(r, c, _)| (r, c))
    }

    /// Renders the shape back into its text rows.
    pub fn to_lines(&self) -> Vec<String> {
        self.row_slices()
            .map(|row| {
                row.iter()
                    .map(|&c| if c { SHAPE_CHAR } else { EMPTY_SHAPE_CHAR })
                    .collect()
            })
            .collect()
    }
}

impl ContainerGrid {
    /// Parses container rows: `_` is free, every other character is blocked.
    ///
    /// Short rows are padded with blocked cells.
    pub fn container_from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let rows = lines
            .iter()
            .map(|line| line.as_ref().chars().map(Cell::from_char).collect())
            .collect();
        Grid::from_ragged_rows(rows, Cell::Blocked)
    }

    /// Number of cells that are still free.
    pub fn free_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_free()).count()
    }

    /// Renders the container into text rows using item symbols.
    pub fn to_lines(&self) -> Vec<String> {
        self.row_slices()
            .map(|row| row.iter().map(Cell::symbol).collect())
            .collect()
    }
}

impl fmt::Display for ContainerGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.to_lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Trait for objects with a weight.
pub trait Weighted {
    /// Returns the weight.
    fn weight(&self) -> u64;
}

/// Trait for objects with a price (value).
pub trait Priced {
    /// Returns the price.
    fn price(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_rows_are_padded_to_bounding_box() {
        let grid = ShapeGrid::shape_from_lines(&[" @", "@@@@", " @ @@@"]);
        assert_eq!(grid.rows(), 3);
        assert_eq!(grid.cols(), 6);
        assert_eq!(grid.get(0, 5), Some(&false));
        assert_eq!(grid.get(2, 5), Some(&true));
        assert_eq!(grid.occupied_count(), 9);
    }

    #[test]
    fn container_short_rows_are_blocked() {
        let grid = ContainerGrid::container_from_lines(&["___", "_"]);
        assert_eq!(grid.cols(), 3);
        assert_eq!(grid.get(1, 1), Some(&Cell::Blocked));
        assert_eq!(grid.free_count(), 4);
    }

    #[test]
    fn out_of_bounds_access_returns_none() {
        let mut grid = ContainerGrid::container_from_lines(&["__"]);
        assert_eq!(grid.get(0, 2), None);
        assert_eq!(grid.get(1, 0), None);
        assert!(!grid.set(3, 3, Cell::Occupied(0)));
        assert_eq!(grid.free_count(), 2);
    }

    #[test]
    fn rendering_uses_item_symbols() {
        let mut grid = ContainerGrid::container_from_lines(&["_#_"]);
        grid.set(0, 2, Cell::Occupied(10));
        assert_eq!(grid.to_lines(), vec!["_#B".to_string()]);
        assert_eq!(format!("{}", grid), "_#B\n");
    }

    #[test]
    fn item_symbols_cover_table_and_overflow() {
        assert_eq!(item_symbol(8), '9');
        assert_eq!(item_symbol(35), 'a');
        assert_eq!(item_symbol(500), '*');
    }

    #[test]
    fn shape_lines_roundtrip_keeps_layout() {
        let grid = ShapeGrid::shape_from_lines(&["@", "@@@@"]);
        assert_eq!(grid.to_lines(), vec!["@   ".to_string(), "@@@@".to_string()]);
    }
}
