//! Stamping oriented item shapes onto container grids.
//!
//! Placement is copy-on-write: the container passed in is never modified.
//! All target cells are checked first, and only a fully valid placement
//! produces a new grid.

use crate::types::{Cell, ContainerGrid, ShapeGrid};

/// Checks whether `shape` fits onto `container` with its top left corner at
/// (`row_offset`, `col_offset`).
///
/// Every occupied shape cell must land inside the container on a free cell.
pub fn can_place(
    shape: &ShapeGrid,
    container: &ContainerGrid,
    row_offset: usize,
    col_offset: usize,
) -> bool {
    shape.occupied_cells().all(|(r, c)| {
        matches!(
            container.get(row_offset + r, col_offset + c),
            Some(Cell::Free)
        )
    })
}

/// Tries to place `shape` onto `container` at the given offset.
///
/// # Returns
/// `Some(grid)` with the shape's cells tagged as `Cell::Occupied(item)`, or
/// `None` if any cell falls outside the container or onto a non-free cell.
/// The input grid is left untouched in both cases.
pub fn try_place(
    shape: &ShapeGrid,
    container: &ContainerGrid,
    row_offset: usize,
    col_offset: usize,
    item: usize,
) -> Option<ContainerGrid> {
    if !can_place(shape, container, row_offset, col_offset) {
        return None;
    }

    let mut placed = container.clone();
    for (r, c) in shape.occupied_cells() {
        placed.set(row_offset + r, col_offset + c, Cell::Occupied(item));
    }
    Some(placed)
}
