use linkbench_core::{Adjacency, BenchError};
use linkbench_predict::heuristics::{HeuristicIndex, heuristic_matrix};
use proptest::prelude::*;

fn arb_graph() -> impl Strategy<Value = Adjacency> {
    (3usize..16).prop_flat_map(|n| {
        proptest::collection::vec((0..n, 0..n), 1..40).prop_map(move |pairs| {
            let pairs = pairs.into_iter().filter(|(a, b)| a != b);
            Adjacency::from_edges(n, pairs).expect("ids in range")
        })
    })
}

fn arb_index() -> impl Strategy<Value = HeuristicIndex> {
    prop_oneof![
        Just(HeuristicIndex::AdamicAdar),
        Just(HeuristicIndex::Jaccard),
        Just(HeuristicIndex::PreferentialAttachment),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn normalized_matrix_is_symmetric_and_peaks_at_one(graph in arb_graph(), index in arb_index()) {
        match heuristic_matrix(&graph, index) {
            Ok(m) => {
                let n = graph.node_count();
                let mut max = 0.0_f64;
                for u in 0..n {
                    prop_assert_eq!(m[(u, u)], 0.0);
                    for v in 0..n {
                        prop_assert_eq!(m[(u, v)], m[(v, u)]);
                        prop_assert!((0.0..=1.0).contains(&m[(u, v)]));
                        if graph.has_edge(u, v) {
                            prop_assert_eq!(m[(u, v)], 0.0);
                        }
                        max = max.max(m[(u, v)]);
                    }
                }
                prop_assert!((max - 1.0).abs() < 1e-12);
            }
            Err(err) => {
                let is_degenerate = matches!(err, BenchError::DegenerateMetricInput { .. });
                prop_assert!(is_degenerate);
            }
        }
    }
}
