//! Symmetric adjacency over nodes `0..N`.
//!
//! # Representation
//!
//! Each node owns a sorted, deduplicated neighbor list. Symmetry is an
//! invariant: `v ∈ neighbors(u)` iff `u ∈ neighbors(v)`. The diagonal is
//! always empty, so self-loops in the input are dropped on construction.
//!
//! Sorted lists give `O(log d)` edge lookups and let heuristic indices
//! intersect neighborhoods with a two-pointer merge.

use std::collections::HashSet;

use nalgebra::DMatrix;
use tracing::debug;

use crate::edge::{Edge, EdgeIndex};
use crate::error::{BenchError, Result};

/// Largest graph accepted from untrusted input. Predictors materialize
/// `N × N` score matrices, so anything bigger could never be benchmarked.
pub const MAX_NODES: usize = 1 << 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjacency {
    neighbors: Vec<Vec<usize>>,
    edge_count: usize,
}

impl Adjacency {
    /// A graph with `node_count` isolated nodes.
    #[must_use]
    pub fn empty(node_count: usize) -> Self {
        Self {
            neighbors: vec![Vec::new(); node_count],
            edge_count: 0,
        }
    }

    /// Build from an iterator of node pairs.
    ///
    /// Pairs may appear in either orientation and more than once; the result
    /// holds each unordered edge once. Self-loops are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::InvalidAdjacency`] if `node_count` exceeds
    /// [`MAX_NODES`] or a node id is `>= node_count`.
    pub fn from_edges<I>(node_count: usize, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        if node_count > MAX_NODES {
            return Err(BenchError::adjacency(format!(
                "{node_count} nodes exceeds the limit of {MAX_NODES}"
            )));
        }

        let mut neighbors = vec![Vec::new(); node_count];
        let mut self_loops = 0usize;

        for (a, b) in pairs {
            if a >= node_count || b >= node_count {
                return Err(BenchError::adjacency(format!(
                    "pair ({a}, {b}) references a node outside 0..{node_count}"
                )));
            }
            if a == b {
                self_loops += 1;
                continue;
            }
            neighbors[a].push(b);
            neighbors[b].push(a);
        }

        if self_loops > 0 {
            debug!(self_loops, "dropped self-loops from adjacency input");
        }

        Ok(Self::from_neighbor_lists(neighbors))
    }

    /// Build from a dense square matrix where any non-zero entry is an edge.
    ///
    /// The diagonal is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::InvalidAdjacency`] if the matrix is not square or
    /// its non-zero pattern is not symmetric.
    pub fn from_dense(matrix: &DMatrix<f64>) -> Result<Self> {
        if !matrix.is_square() {
            return Err(BenchError::adjacency(format!(
                "matrix is {}x{}, expected square",
                matrix.nrows(),
                matrix.ncols()
            )));
        }

        let n = matrix.nrows();
        let mut pairs = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let forward = matrix[(i, j)] != 0.0;
                let backward = matrix[(j, i)] != 0.0;
                if forward != backward {
                    return Err(BenchError::adjacency(format!(
                        "matrix is not symmetric at ({i}, {j})"
                    )));
                }
                if forward {
                    pairs.push((i, j));
                }
            }
        }

        Self::from_edges(n, pairs)
    }

    fn from_neighbor_lists(mut neighbors: Vec<Vec<usize>>) -> Self {
        let mut degree_sum = 0usize;
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
            degree_sum += list.len();
        }

        Self {
            neighbors,
            edge_count: degree_sum / 2,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Number of unordered edges.
    #[must_use]
    pub const fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Number of unordered node pairs that are not edges.
    #[must_use]
    pub fn non_edge_count(&self) -> usize {
        let n = self.node_count();
        (n * n.saturating_sub(1) / 2).saturating_sub(self.edge_count)
    }

    /// Sorted neighbors of `node`. Empty for out-of-range ids.
    #[must_use]
    pub fn neighbors(&self, node: usize) -> &[usize] {
        self.neighbors.get(node).map_or(&[][..], Vec::as_slice)
    }

    #[must_use]
    pub fn degree(&self, node: usize) -> usize {
        self.neighbors(node).len()
    }

    #[must_use]
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        a != b && self.neighbors(a).binary_search(&b).is_ok()
    }

    /// Upper-triangle enumeration: each unordered edge once, in `(u, v)` order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.neighbors.iter().enumerate().flat_map(|(u, list)| {
            let start = list.partition_point(|&v| v <= u);
            list[start..].iter().filter_map(move |&v| Edge::new(u, v))
        })
    }

    /// Hash index of every edge, for O(1) membership checks.
    #[must_use]
    pub fn edge_index(&self) -> EdgeIndex {
        let mut index = EdgeIndex::with_capacity(self.edge_count);
        index.extend(self.edges());
        index
    }

    /// Copy of this graph with `removed` edges deleted in both directions.
    ///
    /// Edges in `removed` that are not present are ignored.
    #[must_use]
    pub fn without_edges(&self, removed: &[Edge]) -> Self {
        let removed: HashSet<Edge> = removed.iter().copied().collect();
        let neighbors = self
            .neighbors
            .iter()
            .enumerate()
            .map(|(u, list)| {
                list.iter()
                    .copied()
                    .filter(|&v| Edge::new(u, v).is_none_or(|edge| !removed.contains(&edge)))
                    .collect()
            })
            .collect();

        Self::from_neighbor_lists(neighbors)
    }

    /// Dense 0/1 matrix with a zero diagonal.
    #[must_use]
    pub fn to_dense(&self) -> DMatrix<f64> {
        let n = self.node_count();
        let mut matrix = DMatrix::zeros(n, n);
        for (u, list) in self.neighbors.iter().enumerate() {
            for &v in list {
                matrix[(u, v)] = 1.0;
            }
        }
        matrix
    }
}
