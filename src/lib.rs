//! Exhaustive search for the two-dimensional shaped knapsack.
//!
//! Items carry a weight, a price and a 2D shape. They are placed on a grid
//! container in every orientation and position, the complete tree of
//! packings is built and the distinct terminal outcomes are handed to the
//! [`analyzer`] for the final answers.
//!
//! ```
//! use knapsack2d::analyzer::Analysis;
//! use knapsack2d::model::{Container, Item};
//! use knapsack2d::optimizer::SolutionTree;
//! use knapsack2d::types::{ContainerGrid, ShapeGrid};
//!
//! let container = Container::new(ContainerGrid::container_from_lines(&["__"]), 2).unwrap();
//! let items = vec![
//!     Item::new(1, 5, ShapeGrid::shape_from_lines(&["@"])).unwrap(),
//!     Item::new(1, 3, ShapeGrid::shape_from_lines(&["@"])).unwrap(),
//! ];
//! let tree = SolutionTree::solve(&container, &items).unwrap();
//! let analysis = Analysis::from_collector(tree.solutions(), container.capacity);
//! assert_eq!(analysis.best_price(), Some(8));
//! ```

pub mod analyzer;
pub mod api;
pub mod collector;
pub mod config;
pub mod geometry;
pub mod knapsack;
pub mod loader;
pub mod model;
pub mod optimizer;
pub mod placement;
pub mod types;
