use std::collections::HashSet;

use linkbench_core::{Edge, SplitConfig, split_edges_seeded};
use proptest::prelude::*;

#[path = "generators.rs"]
mod generators;
use generators::*;

fn config(test_fraction: f64, val_fraction: f64) -> SplitConfig {
    SplitConfig {
        test_fraction,
        val_fraction,
        ..SplitConfig::default()
    }
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn positives_partition_the_original_edges(
        g in arb_sparse_graph(),
        (tf, vf) in arb_fractions(),
        seed in any::<u64>(),
    ) {
        let split = split_edges_seeded(&g, &config(tf, vf), seed).expect("valid split");

        let all: Vec<Edge> = split
            .train_pos
            .iter()
            .chain(&split.val_pos)
            .chain(&split.test_pos)
            .copied()
            .collect();
        let unique: HashSet<Edge> = all.iter().copied().collect();
        let original: HashSet<Edge> = g.edges().collect();

        prop_assert_eq!(all.len(), g.edge_count());
        prop_assert_eq!(unique, original);
    }

    #[test]
    fn held_out_edges_are_absent_from_training_graph(
        g in arb_sparse_graph(),
        (tf, vf) in arb_fractions(),
        seed in any::<u64>(),
    ) {
        let split = split_edges_seeded(&g, &config(tf, vf), seed).expect("valid split");
        let train = &split.train_adjacency;

        for edge in split.test_pos.iter().chain(&split.val_pos) {
            prop_assert!(!train.has_edge(edge.u(), edge.v()));
            prop_assert!(!train.has_edge(edge.v(), edge.u()));
        }
        prop_assert_eq!(train.edge_count(), split.train_pos.len());
        prop_assert_eq!(train.to_dense(), train.to_dense().transpose());
    }

    #[test]
    fn negatives_are_disjoint_non_edges(
        g in arb_sparse_graph(),
        (tf, vf) in arb_fractions(),
        seed in any::<u64>(),
    ) {
        let split = split_edges_seeded(&g, &config(tf, vf), seed).expect("valid split");

        let mut seen = HashSet::new();
        for edge in split.test_neg.iter().chain(&split.val_neg).chain(&split.train_neg) {
            prop_assert!(edge.u() < edge.v());
            prop_assert!(!g.has_edge(edge.u(), edge.v()));
            prop_assert!(seen.insert(*edge));
        }

        prop_assert_eq!(split.test_neg.len(), split.test_pos.len());
        prop_assert_eq!(split.val_neg.len(), split.val_pos.len());
        prop_assert_eq!(split.train_neg.len(), split.train_pos.len());
    }

    #[test]
    fn split_is_reproducible_for_a_seed(
        g in arb_sparse_graph(),
        (tf, vf) in arb_fractions(),
        seed in any::<u64>(),
    ) {
        let a = split_edges_seeded(&g, &config(tf, vf), seed).expect("valid split");
        let b = split_edges_seeded(&g, &config(tf, vf), seed).expect("valid split");
        prop_assert_eq!(a, b);
    }

    #[test]
    fn held_out_counts_use_floor(
        g in arb_sparse_graph(),
        (tf, vf) in arb_fractions(),
        seed in any::<u64>(),
    ) {
        let split = split_edges_seeded(&g, &config(tf, vf), seed).expect("valid split");
        let (test, val) = config(tf, vf).held_out_counts(g.edge_count()).expect("valid");
        prop_assert_eq!(split.test_pos.len(), test);
        prop_assert_eq!(split.val_pos.len(), val);
        prop_assert!(!split.train_pos.is_empty());
    }
}

// ---------------------------------------------------------------------------
// Fixed scenarios
// ---------------------------------------------------------------------------

#[test]
fn ring_of_ten_matches_expected_counts() {
    let split = split_edges_seeded(&ring(10), &config(0.2, 0.1), 2024).expect("valid split");
    let summary = split.summary();
    assert_eq!((summary.test_pos, summary.val_pos, summary.train_pos), (2, 1, 7));
    assert_eq!((summary.test_neg, summary.val_neg, summary.train_neg), (2, 1, 7));
    assert_eq!(summary.nodes, 10);
    assert_eq!(summary.edges, 10);
}

#[test]
fn connectivity_guard_keeps_every_component_intact() {
    use petgraph::algo::connected_components;
    use petgraph::graph::UnGraph;

    let g = ring(16);
    let extra = [(0, 8), (4, 12), (2, 10)];
    let g = linkbench_core::Adjacency::from_edges(
        16,
        g.edges().map(Edge::endpoints).chain(extra),
    )
    .expect("valid");

    let cfg = SplitConfig {
        prevent_disconnect: true,
        ..config(0.3, 0.1)
    };
    for seed in 0..16 {
        let split = split_edges_seeded(&g, &cfg, seed).expect("valid split");
        let train = UnGraph::<(), ()>::from_edges(
            split.train_adjacency.edges().map(|e| (e.u() as u32, e.v() as u32)),
        );
        assert_eq!(connected_components(&train), 1, "seed {seed} disconnected the graph");
    }
}
