//! Orientation handling for item shapes.
//!
//! Every item may be rotated by quarter turns and mirrored before it is
//! placed. This module produces the distinct orientations of a shape so the
//! search only tries each physically different layout once.

use std::collections::BTreeSet;

use crate::types::{Grid, ShapeGrid};

/// Rotates a shape a quarter turn clockwise.
///
/// The result has the width and height of the input swapped. Cell
/// (`r`, `c`) of the result is cell (`height - 1 - c`, `r`) of the input.
pub fn rotate_clockwise(shape: &ShapeGrid) -> ShapeGrid {
    let (height, width) = (shape.rows(), shape.cols());
    let mut rotated = Grid::filled(width, height, false);
    for (r, c) in shape.occupied_cells() {
        rotated.set(c, height - 1 - r, true);
    }
    rotated
}

/// Mirrors a shape horizontally (flips its columns).
pub fn mirror(shape: &ShapeGrid) -> ShapeGrid {
    let width = shape.cols();
    let mut mirrored = Grid::filled(shape.rows(), width, false);
    for (r, c) in shape.occupied_cells() {
        mirrored.set(r, width - 1 - c, true);
    }
    mirrored
}

/// Generates all structurally distinct orientations of a shape.
///
/// Starts from the shape and its mirror image and rotates both three more
/// times, collecting every result in an ordered set. The set order is the
/// structural order of the grids, so iteration is deterministic.
///
/// A square yields 1 orientation, a filled rectangle 2, and a shape
/// without any symmetry 8.
///
/// # Examples
/// ```
/// use knapsack2d::geometry::canonical_orientations;
/// use knapsack2d::types::ShapeGrid;
///
/// let hook = ShapeGrid::shape_from_lines(&["@", "@@@@"]);
/// assert_eq!(canonical_orientations(&hook).len(), 8);
/// ```
pub fn canonical_orientations(shape: &ShapeGrid) -> BTreeSet<ShapeGrid> {
    let mut orientations = BTreeSet::new();

    let mut rotated = shape.clone();
    let mut mirrored = mirror(shape);
    orientations.insert(rotated.clone());
    orientations.insert(mirrored.clone());

    for _ in 0..3 {
        rotated = rotate_clockwise(&rotated);
        mirrored = rotate_clockwise(&mirrored);
        orientations.insert(rotated.clone());
        orientations.insert(mirrored.clone());
    }

    orientations
}
