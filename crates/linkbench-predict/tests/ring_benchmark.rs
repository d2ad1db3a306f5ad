//! End-to-end benchmark runs on small graphs.

use linkbench_core::config::{GenerativeConfig, RandomWalkConfig};
use linkbench_core::{Adjacency, BenchConfig, BenchError, PredictorKind, SplitConfig, Verbosity};
use linkbench_predict::heuristics::{HeuristicIndex, heuristic_matrix};
use linkbench_predict::run_benchmark;

fn ring(n: usize) -> Adjacency {
    Adjacency::from_edges(n, (0..n).map(|i| (i, (i + 1) % n))).expect("valid ring")
}

fn small_config(seed: u64) -> BenchConfig {
    BenchConfig {
        seed,
        verbosity: Verbosity::Silent,
        split: SplitConfig {
            test_fraction: 0.2,
            val_fraction: 0.1,
            ..SplitConfig::default()
        },
        random_walk: RandomWalkConfig {
            num_walks: 4,
            walk_length: 10,
            window_size: 3,
            dimensions: 8,
            workers: 2,
            ..RandomWalkConfig::default()
        },
        generative: GenerativeConfig {
            epochs: 20,
            hidden1_dim: 8,
            hidden2_dim: 4,
            ..GenerativeConfig::default()
        },
        ..BenchConfig::default()
    }
}

#[test]
fn ring_of_ten_scores_every_predictor() {
    let report = run_benchmark(&ring(10), None, &small_config(0)).expect("ring benchmark runs");

    assert_eq!(report.split.test_pos, 2);
    assert_eq!(report.split.val_pos, 1);
    assert_eq!(report.split.train_pos, 7);
    assert_eq!(report.split.test_neg, 2);
    assert_eq!(report.split.val_neg, 1);
    assert_eq!(report.split.train_neg, 7);

    assert_eq!(report.scores.len(), PredictorKind::ALL.len());
    for kind in PredictorKind::ALL {
        let scores = report.get(kind).unwrap_or_else(|| panic!("{kind} missing"));
        assert!(
            scores.test_roc.is_finite() && (0.0..=1.0).contains(&scores.test_roc),
            "{kind} test_roc = {}",
            scores.test_roc
        );
        assert!(
            scores.test_ap.is_finite() && (0.0..=1.0).contains(&scores.test_ap),
            "{kind} test_ap = {}",
            scores.test_ap
        );
        assert_eq!(scores.val_roc.is_some(), kind.uses_validation(), "{kind} validation");
    }

    let history = report
        .get(PredictorKind::Generative)
        .and_then(|s| s.val_roc_history.as_ref())
        .expect("generative records a trajectory");
    assert_eq!(history.len(), 20);
}

#[test]
fn same_seed_gives_identical_reports() {
    let graph = ring(12);
    let first = run_benchmark(&graph, None, &small_config(7)).expect("runs");
    let second = run_benchmark(&graph, None, &small_config(7)).expect("runs");
    assert_eq!(
        serde_json::to_string(&first).expect("serializes"),
        serde_json::to_string(&second).expect("serializes")
    );
}

#[test]
fn zero_edge_graph_is_an_invalid_split() {
    let err = run_benchmark(&Adjacency::empty(5), None, &small_config(0)).expect_err("no edges");
    assert!(matches!(err, BenchError::InvalidSplitConfiguration { .. }), "{err}");
}

#[test]
fn heuristic_matrices_peak_at_one() {
    let graph = ring(10);
    for index in [
        HeuristicIndex::AdamicAdar,
        HeuristicIndex::Jaccard,
        HeuristicIndex::PreferentialAttachment,
    ] {
        let scores = heuristic_matrix(&graph, index).expect("ring has two-hop pairs");
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        assert!((max - 1.0).abs() < 1e-12, "{index:?} max = {max}");
    }
}
