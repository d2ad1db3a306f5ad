#![allow(dead_code)]

use linkbench_core::Adjacency;
use proptest::prelude::*;

/// Random simple graph with 4..40 nodes and at most a quarter of all pairs as edges.
pub fn arb_graph() -> impl Strategy<Value = Adjacency> {
    (4usize..40).prop_flat_map(|n| {
        let max_pairs = (n * (n - 1) / 8).clamp(1, 120);
        prop::collection::vec((0..n, 0..n), 1..=max_pairs).prop_map(move |pairs| {
            Adjacency::from_edges(n, pairs).expect("generated ids are in range")
        })
    })
}

/// Sparse graph with at least one edge that always leaves room for negatives.
pub fn arb_sparse_graph() -> impl Strategy<Value = Adjacency> {
    arb_graph().prop_filter("needs edges and spare non-edges", |g| {
        g.edge_count() > 0 && g.non_edge_count() >= 2 * g.edge_count()
    })
}

/// `(test_fraction, val_fraction)` with a positive remainder for training.
pub fn arb_fractions() -> impl Strategy<Value = (f64, f64)> {
    (0.0f64..0.6, 0.0f64..0.3)
}

pub fn ring(n: usize) -> Adjacency {
    Adjacency::from_edges(n, (0..n).map(|i| (i, (i + 1) % n))).expect("valid ring")
}
