//! Exhaustive search over all placement sequences.
//!
//! Starting from the empty container, every remaining item is tried in every
//! orientation at every cell. Each successful placement becomes a child node
//! and is expanded recursively, so the resulting tree holds every reachable
//! packing. Nodes without children are terminal: either every item is packed
//! or nothing else fits (a dead end). Terminal states are collected into a
//! [`SolutionCollector`] while the tree is built.

use std::ops::ControlFlow;

use thiserror::Error;

use crate::collector::SolutionCollector;
use crate::geometry::canonical_orientations;
use crate::model::{Container, Item, PackedState};
use crate::placement::try_place;
use crate::types::ShapeGrid;

/// Index of a node inside the [`SolutionTree`] arena.
pub type NodeId = usize;

/// A [`SearchEvent::Progress`] is emitted every this many nodes.
pub const PROGRESS_INTERVAL: usize = 4096;

/// Configuration for the tree search.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// Sort each node's children by (price, weight) once expanded.
    ///
    /// With sorted children, [`SolutionTree::search`] stops scanning a
    /// sibling group as soon as a child's price exceeds the target.
    pub ordered_children: bool,
}

impl SearchConfig {
    pub const DEFAULT_ORDERED_CHILDREN: bool = false;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> SearchConfigBuilder {
        SearchConfigBuilder::default()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            ordered_children: Self::DEFAULT_ORDERED_CHILDREN,
        }
    }
}

/// Builder for [`SearchConfig`].
#[derive(Clone, Debug, Default)]
pub struct SearchConfigBuilder {
    config: SearchConfig,
}

impl SearchConfigBuilder {
    /// Enables or disables price-sorted children.
    pub fn ordered_children(mut self, ordered: bool) -> Self {
        self.config.ordered_children = ordered;
        self
    }

    pub fn build(self) -> SearchConfig {
        self.config
    }
}

/// Errors that abort a search run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The set of included item indices lost its strict ordering.
    #[error("internal invariant violated: included items {included:?} are not strictly increasing")]
    InvariantViolation { included: Vec<usize> },

    /// Adding an item pushed the total weight or price past `u64::MAX`.
    #[error("total weight or price overflows when adding item {item} to items {included:?}")]
    TotalsOverflow { item: usize, included: Vec<usize> },

    /// The progress callback asked to stop.
    #[error("search cancelled")]
    Cancelled,
}

/// Events emitted while the tree is built, suitable for live progress (SSE).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type")]
pub enum SearchEvent {
    /// The search is about to expand the root.
    Started {
        items: usize,
        rows: usize,
        cols: usize,
        orientations: usize,
    },
    /// A terminal state with a new (price, weight) pair was recorded.
    SolutionRecorded {
        price: u64,
        weight: u64,
        free_cells: usize,
        complete: bool,
    },
    /// Periodic heartbeat while the tree grows.
    Progress {
        nodes: usize,
        terminals: usize,
        distinct: usize,
    },
    /// The tree is complete.
    Finished {
        nodes: usize,
        terminals: usize,
        distinct: usize,
    },
}

/// A node of the search tree.
///
/// `included` holds the indices of the packed items in strictly increasing
/// order.
#[derive(Clone, Debug)]
pub struct SearchNode {
    pub state: PackedState,
    pub parent: Option<NodeId>,
    pub included: Vec<usize>,
    pub children: Vec<NodeId>,
    pub terminal: bool,
}

/// A node found by [`SolutionTree::search`].
#[derive(Clone, Debug)]
pub struct SearchHit {
    pub node: NodeId,
    pub state: PackedState,
    pub terminal: bool,
}

/// The complete search tree together with the collected terminal states.
#[derive(Clone, Debug)]
pub struct SolutionTree {
    nodes: Vec<SearchNode>,
    solutions: SolutionCollector,
    config: SearchConfig,
    terminal_count: usize,
}

impl SolutionTree {
    /// Builds the tree with the default configuration.
    pub fn solve(container: &Container, items: &[Item]) -> Result<Self, SearchError> {
        Self::solve_with_config(container, items, SearchConfig::default())
    }

    /// Builds the tree with a custom configuration.
    pub fn solve_with_config(
        container: &Container,
        items: &[Item],
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        Self::solve_with_progress(container, items, config, |_| ControlFlow::Continue(()))
    }

    /// Builds the tree and reports progress through `on_event`.
    ///
    /// Returning [`ControlFlow::Break`] from `on_event` stops the search with
    /// [`SearchError::Cancelled`].
    pub fn solve_with_progress(
        container: &Container,
        items: &[Item],
        config: SearchConfig,
        on_event: impl FnMut(&SearchEvent) -> ControlFlow<()>,
    ) -> Result<Self, SearchError> {
        let orientations: Vec<Vec<ShapeGrid>> = items
            .iter()
            .map(|item| canonical_orientations(&item.shape).into_iter().collect())
            .collect();

        let mut builder = TreeBuilder {
            items,
            orientations: &orientations,
            config,
            nodes: Vec::new(),
            solutions: SolutionCollector::new(),
            terminal_count: 0,
            on_event,
        };

        builder.emit(&SearchEvent::Started {
            items: items.len(),
            rows: container.grid.rows(),
            cols: container.grid.cols(),
            orientations: orientations.iter().map(Vec::len).sum(),
        })?;
        tracing::debug!(
            items = items.len(),
            rows = container.grid.rows(),
            cols = container.grid.cols(),
            "starting solution tree search"
        );

        let root = builder.push_node(container.empty_state(), None, Vec::new());
        if items.is_empty() {
            builder.mark_terminal(root)?;
        } else {
            builder.expand(root)?;
        }

        builder.emit(&SearchEvent::Finished {
            nodes: builder.nodes.len(),
            terminals: builder.terminal_count,
            distinct: builder.solutions.len(),
        })?;
        tracing::debug!(
            nodes = builder.nodes.len(),
            terminals = builder.terminal_count,
            distinct = builder.solutions.len(),
            "solution tree complete"
        );

        Ok(Self {
            nodes: builder.nodes,
            solutions: builder.solutions,
            config,
            terminal_count: builder.terminal_count,
        })
    }

    /// Id of the root node (the empty container).
    pub const fn root(&self) -> NodeId {
        0
    }

    pub fn node(&self, id: NodeId) -> Option<&SearchNode> {
        self.nodes.get(id)
    }

    /// Total number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of terminal nodes (before deduplication).
    pub fn terminal_count(&self) -> usize {
        self.terminal_count
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SearchNode)> + '_ {
        self.nodes.iter().enumerate()
    }

    /// The deduplicated terminal states.
    pub fn solutions(&self) -> &SolutionCollector {
        &self.solutions
    }

    /// Path from the root to `id`, both inclusive. Empty for unknown ids.
    pub fn ancestry(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.nodes.get(id).map(|_| id);
        while let Some(node_id) = current {
            path.push(node_id);
            current = self.nodes[node_id].parent;
        }
        path.reverse();
        path
    }

    /// Collects every node whose price equals `target_price`, depth first.
    ///
    /// The whole tree is traversed unless children are price-sorted
    /// ([`SearchConfig::ordered_children`]); then a sibling group is left as
    /// soon as a child's price exceeds the target, since neither later
    /// siblings nor descendants can match.
    pub fn search(&self, target_price: u64) -> Vec<SearchHit> {
        let mut hits = Vec::new();
        if let Some(root) = self.nodes.first() {
            if root.state.price == target_price {
                hits.push(self.hit(self.root()));
            }
            self.search_children(self.root(), target_price, &mut hits);
        }
        hits
    }

    fn search_children(&self, id: NodeId, target_price: u64, hits: &mut Vec<SearchHit>) {
        for &child in &self.nodes[id].children {
            let price = self.nodes[child].state.price;
            if price == target_price {
                hits.push(self.hit(child));
            }
            if price > target_price && self.config.ordered_children {
                break;
            }
            self.search_children(child, target_price, hits);
        }
    }

    fn hit(&self, id: NodeId) -> SearchHit {
        let node = &self.nodes[id];
        SearchHit {
            node: id,
            state: node.state.clone(),
            terminal: node.terminal,
        }
    }
}

struct TreeBuilder<'a, F> {
    items: &'a [Item],
    orientations: &'a [Vec<ShapeGrid>],
    config: SearchConfig,
    nodes: Vec<SearchNode>,
    solutions: SolutionCollector,
    terminal_count: usize,
    on_event: F,
}

impl<F: FnMut(&SearchEvent) -> ControlFlow<()>> TreeBuilder<'_, F> {
    fn emit(&mut self, event: &SearchEvent) -> Result<(), SearchError> {
        match (self.on_event)(event) {
            ControlFlow::Continue(()) => Ok(()),
            ControlFlow::Break(()) => Err(SearchError::Cancelled),
        }
    }

    fn push_node(
        &mut self,
        state: PackedState,
        parent: Option<NodeId>,
        included: Vec<usize>,
    ) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(SearchNode {
            state,
            parent,
            included,
            children: Vec::new(),
            terminal: false,
        });
        id
    }

    fn mark_terminal(&mut self, id: NodeId) -> Result<(), SearchError> {
        let node = &mut self.nodes[id];
        node.terminal = true;
        self.terminal_count += 1;

        let complete = node.included.len() == self.items.len();
        let state = node.state.clone();
        let (price, weight, free_cells) = (state.price, state.weight, state.free_cells());
        if self.solutions.insert(state) {
            self.emit(&SearchEvent::SolutionRecorded {
                price,
                weight,
                free_cells,
                complete,
            })?;
        }
        Ok(())
    }

    fn expand(&mut self, id: NodeId) -> Result<(), SearchError> {
        let items = self.items;
        let orientations = self.orientations;
        let state = self.nodes[id].state.clone();
        let included = self.nodes[id].included.clone();
        let (rows, cols) = (state.grid.rows(), state.grid.cols());

        let mut skip = included.iter().peekable();
        for (index, item) in items.iter().enumerate() {
            if skip.next_if(|&&packed| packed == index).is_some() {
                continue;
            }

            for shape in &orientations[index] {
                for row in 0..rows {
                    for col in 0..cols {
                        let Some(grid) = try_place(shape, &state.grid, row, col, index) else {
                            continue;
                        };

                        let Some(child_state) = state.with_item(grid, item) else {
                            return Err(SearchError::TotalsOverflow {
                                item: index,
                                included: included.clone(),
                            });
                        };
                        let child_included = insert_sorted(&included, index)?;
                        let complete = child_included.len() == items.len();
                        let child = self.push_node(child_state, Some(id), child_included);
                        self.nodes[id].children.push(child);

                        if self.nodes.len() % PROGRESS_INTERVAL == 0 {
                            self.emit(&SearchEvent::Progress {
                                nodes: self.nodes.len(),
                                terminals: self.terminal_count,
                                distinct: self.solutions.len(),
                            })?;
                        }

                        if complete {
                            self.mark_terminal(child)?;
                        } else {
                            self.expand(child)?;
                        }
                    }
                }
            }
        }

        if self.nodes[id].children.is_empty() {
            self.mark_terminal(id)?;
        } else if self.config.ordered_children {
            let mut children = std::mem::take(&mut self.nodes[id].children);
            children.sort_by(|&a, &b| self.nodes[a].state.cmp(&self.nodes[b].state));
            self.nodes[id].children = children;
        }
        Ok(())
    }
}

/// Returns `included` with `index` inserted at its sorted position.
///
/// Fails if the result is not strictly increasing, which means `index` was
/// already present.
fn insert_sorted(included: &[usize], index: usize) -> Result<Vec<usize>, SearchError> {
    let mut next = Vec::with_capacity(included.len() + 1);
    let pos = included.partition_point(|&packed| packed < index);
    next.extend_from_slice(&included[..pos]);
    next.push(index);
    next.extend_from_slice(&included[pos..]);

    if next.windows(2).all(|pair| pair[0] < pair[1]) {
        Ok(next)
    } else {
        Err(SearchError::InvariantViolation { included: next })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::types::{Cell, ContainerGrid};

    fn container(lines: &[&str], capacity: u64) -> Container {
        Container::new(ContainerGrid::container_from_lines(lines), capacity).unwrap()
    }

    fn item(weight: u64, price: u64, lines: &[&str]) -> Item {
        Item::new(weight, price, ShapeGrid::shape_from_lines(lines)).unwrap()
    }

    fn totals(tree: &SolutionTree) -> Vec<(u64, u64)> {
        tree.solutions()
            .iter()
            .map(|s| (s.price, s.weight))
            .collect()
    }

    fn two_cell_tree() -> SolutionTree {
        let items = vec![item(1, 5, &["@"]), item(1, 3, &["@"])];
        SolutionTree::solve(&container(&["__"], 2), &items).unwrap()
    }

    #[test]
    fn two_free_cells_pack_both_items() {
        let tree = two_cell_tree();
        assert_eq!(totals(&tree), vec![(8, 2)]);
        // root, four single placements, four full packings
        assert_eq!(tree.node_count(), 9);
        assert_eq!(tree.terminal_count(), 4);
        assert!(!tree.node(tree.root()).unwrap().terminal);
    }

    #[test]
    fn single_free_cell_records_dead_ends() {
        let items = vec![item(1, 5, &["@"]), item(1, 3, &["@"])];
        let tree = SolutionTree::solve(&container(&["_#"], 2), &items).unwrap();
        assert_eq!(totals(&tree), vec![(3, 1), (5, 1)]);
        for (_, node) in tree.nodes().filter(|(_, n)| n.terminal) {
            assert_eq!(node.included.len(), 1);
        }
    }

    #[test]
    fn root_is_terminal_when_nothing_fits() {
        let items = vec![item(4, 9, &["@@@"])];
        let tree = SolutionTree::solve(&container(&["__", "__"], 10), &items).unwrap();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(totals(&tree), vec![(0, 0)]);
        assert!(tree.node(tree.root()).unwrap().terminal);
    }

    #[test]
    fn no_items_yields_empty_packing() {
        let tree = SolutionTree::solve(&container(&["_"], 1), &[]).unwrap();
        assert_eq!(totals(&tree), vec![(0, 0)]);
        assert_eq!(tree.terminal_count(), 1);
    }

    #[test]
    fn terminal_if_and_only_if_childless() {
        let items = vec![item(2, 4, &["@", "@@"]), item(1, 2, &["@@"]), item(1, 1, &["@"])];
        let tree = SolutionTree::solve(&container(&["___", "__#"], 5), &items).unwrap();
        for (_, node) in tree.nodes() {
            assert_eq!(node.terminal, node.children.is_empty());
        }
    }

    #[test]
    fn terminal_grids_match_included_items() {
        let items = vec![
            item(2, 4, &["@", "@@"]),
            item(1, 2, &["@@"]),
            item(3, 7, &["@"]),
        ];
        let tree = SolutionTree::solve(&container(&["___", "_#_", "___"], 6), &items).unwrap();

        for (_, node) in tree.nodes().filter(|(_, n)| n.terminal) {
            let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
            for (_, _, cell) in node.state.grid.iter() {
                if let Cell::Occupied(index) = cell {
                    *counts.entry(*index).or_default() += 1;
                }
            }
            let tagged: Vec<usize> = counts.keys().copied().collect();
            assert_eq!(tagged, node.included);
            for (index, count) in counts {
                assert_eq!(count, items[index].area());
            }

            let weight: u64 = node.included.iter().map(|&i| items[i].weight).sum();
            let price: u64 = node.included.iter().map(|&i| items[i].price).sum();
            assert_eq!(node.state.weight, weight);
            assert_eq!(node.state.price, price);
            assert_eq!(node.state.grid.get(1, 1), Some(&Cell::Blocked));
        }
    }

    #[test]
    fn included_sets_are_strictly_increasing() {
        let items = vec![item(1, 1, &["@"]), item(1, 2, &["@"]), item(1, 3, &["@"])];
        let tree = SolutionTree::solve(&container(&["___"], 3), &items).unwrap();
        for (id, node) in tree.nodes() {
            assert!(node.included.windows(2).all(|p| p[0] < p[1]));
            assert_eq!(node.included.len(), tree.ancestry(id).len() - 1);
        }
    }

    #[test]
    fn ancestry_walks_back_to_root() {
        let tree = two_cell_tree();
        let (full, _) = tree
            .nodes()
            .find(|(_, n)| n.included.len() == 2)
            .expect("a full packing exists");
        let path = tree.ancestry(full);
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], tree.root());
        assert_eq!(*path.last().unwrap(), full);
        assert_eq!(tree.node(path[1]).unwrap().parent, Some(tree.root()));
        assert!(tree.ancestry(1000).is_empty());
    }

    #[test]
    fn search_finds_intermediate_and_terminal_nodes() {
        let tree = two_cell_tree();

        let fives = tree.search(5);
        assert_eq!(fives.len(), 2);
        assert!(fives.iter().all(|hit| !hit.terminal));

        let eights = tree.search(8);
        assert_eq!(eights.len(), 4);
        assert!(eights.iter().all(|hit| hit.terminal && hit.state.weight == 2));

        let roots = tree.search(0);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].node, tree.root());

        assert!(tree.search(4).is_empty());
    }

    #[test]
    fn ordered_children_search_matches_exhaustive_search() {
        let items = vec![
            item(1, 2, &["@"]),
            item(2, 9, &["@@"]),
            item(1, 1, &["@", "@"]),
        ];
        let grid = container(&["___", "__#"], 4);
        let exhaustive = SolutionTree::solve(&grid, &items).unwrap();
        let ordered = SolutionTree::solve_with_config(
            &grid,
            &items,
            SearchConfig::builder().ordered_children(true).build(),
        )
        .unwrap();

        assert_eq!(totals(&exhaustive), totals(&ordered));
        for (_, node) in ordered.nodes() {
            let prices: Vec<u64> = node
                .children
                .iter()
                .map(|&c| ordered.node(c).unwrap().state.price)
                .collect();
            assert!(prices.windows(2).all(|p| p[0] <= p[1]));
        }
        for target in [0, 1, 2, 3, 9, 10, 11, 12] {
            assert_eq!(
                exhaustive.search(target).len(),
                ordered.search(target).len(),
                "hit count differs for price {}",
                target
            );
        }
    }

    #[test]
    fn progress_events_bracket_the_search() {
        let items = vec![item(1, 5, &["@"]), item(1, 3, &["@"])];
        let mut events = Vec::new();
        let tree = SolutionTree::solve_with_progress(
            &container(&["_#"], 2),
            &items,
            SearchConfig::default(),
            |evt| {
                events.push(evt.clone());
                ControlFlow::Continue(())
            },
        )
        .unwrap();

        assert!(matches!(events.first(), Some(SearchEvent::Started { items: 2, .. })));
        let recorded = events
            .iter()
            .filter(|e| matches!(e, SearchEvent::SolutionRecorded { .. }))
            .count();
        assert_eq!(recorded, tree.solutions().len());
        assert_eq!(
            events.last(),
            Some(&SearchEvent::Finished {
                nodes: tree.node_count(),
                terminals: 2,
                distinct: 2,
            })
        );
    }

    #[test]
    fn breaking_from_callback_cancels_search() {
        let items = vec![item(1, 5, &["@"]), item(1, 3, &["@"])];
        let mut recorded = 0;
        let result = SolutionTree::solve_with_progress(
            &container(&["__"], 2),
            &items,
            SearchConfig::default(),
            |evt| {
                if matches!(evt, SearchEvent::SolutionRecorded { .. }) {
                    recorded += 1;
                    return ControlFlow::Break(());
                }
                ControlFlow::Continue(())
            },
        );

        assert_eq!(result.unwrap_err(), SearchError::Cancelled);
        assert_eq!(recorded, 1);
    }

    #[test]
    fn overflowing_totals_abort_the_search() {
        let items = vec![item(u64::MAX, 1, &["@"]), item(1, 1, &["@"])];
        let err = SolutionTree::solve(&container(&["__"], 2), &items).unwrap_err();
        assert!(matches!(err, SearchError::TotalsOverflow { .. }));

        let items = vec![item(0, u64::MAX, &["@"]), item(0, 1, &["@"])];
        let err = SolutionTree::solve(&container(&["__"], 2), &items).unwrap_err();
        assert!(matches!(err, SearchError::TotalsOverflow { .. }));
    }

    #[test]
    fn large_trees_report_progress() {
        // 5 unit items on 5 cells: 32826 nodes
        let items: Vec<Item> = (0..5).map(|p| item(1, p, &["@"])).collect();
        let mut heartbeats = Vec::new();
        let tree = SolutionTree::solve_with_progress(
            &container(&["_____"], 5),
            &items,
            SearchConfig::default(),
            |evt| {
                if let SearchEvent::Progress { nodes, .. } = evt {
                    heartbeats.push(*nodes);
                }
                ControlFlow::Continue(())
            },
        )
        .unwrap();

        assert_eq!(tree.node_count(), 32826);
        assert_eq!(heartbeats.len(), tree.node_count() / PROGRESS_INTERVAL);
        assert!(heartbeats.iter().all(|n| n % PROGRESS_INTERVAL == 0));
    }

    #[test]
    fn insert_sorted_keeps_order() {
        assert_eq!(insert_sorted(&[0, 3], 1).unwrap(), vec![0, 1, 3]);
        assert_eq!(insert_sorted(&[], 4).unwrap(), vec![4]);
        assert_eq!(insert_sorted(&[1, 2], 5).unwrap(), vec![1, 2, 5]);
    }

    #[test]
    fn insert_sorted_rejects_duplicates() {
        let err = insert_sorted(&[0, 2], 2).unwrap_err();
        assert_eq!(
            err,
            SearchError::InvariantViolation {
                included: vec![0, 2, 2]
            }
        );
    }
}
