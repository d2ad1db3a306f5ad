//! One benchmark run: split once, then score every selected predictor on it.
//!
//! A single `StdRng` seeded from [`BenchConfig::seed`] drives the split and
//! then each predictor in the fixed order of [`PredictorKind::ALL`]. Two runs
//! with the same graph and config therefore produce identical reports.
//! Deselecting a predictor shifts the random stream seen by the ones after it.

use linkbench_core::timing::timed;
use linkbench_core::{
    Adjacency, BenchConfig, BenchError, BenchReport, PredictorKind, PredictorScores, Result,
    Verbosity, split_edges,
};
use nalgebra::DMatrix;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, instrument};

use crate::generative::GenerativePredictor;
use crate::heuristics::{HeuristicIndex, HeuristicPredictor};
use crate::predictor::{Predictor, RunContext};
use crate::spectral::SpectralPredictor;
use crate::walk::RandomWalkPredictor;

/// Instantiate the predictor for `kind` with its section of `config`.
#[must_use]
pub fn build_predictor(kind: PredictorKind, config: &BenchConfig) -> Box<dyn Predictor> {
    match kind {
        PredictorKind::AdamicAdar => Box::new(HeuristicPredictor::new(HeuristicIndex::AdamicAdar)),
        PredictorKind::Jaccard => Box::new(HeuristicPredictor::new(HeuristicIndex::Jaccard)),
        PredictorKind::PreferentialAttachment => {
            Box::new(HeuristicPredictor::new(HeuristicIndex::PreferentialAttachment))
        }
        PredictorKind::Spectral => Box::new(SpectralPredictor::new(config.spectral.clone())),
        PredictorKind::RandomWalk => Box::new(RandomWalkPredictor::new(config.random_walk.clone())),
        PredictorKind::Generative => Box::new(GenerativePredictor::new(config.generative.clone())),
    }
}

/// Split `adjacency` and run every predictor selected in `config`.
///
/// # Errors
///
/// Returns the error from [`BenchConfig::validate`],
/// [`BenchError::InvalidFeatures`] if `features` does not have one row per
/// node, any error from [`split_edges`], and the first predictor error. A
/// failing predictor aborts the run.
#[instrument(
    skip_all,
    fields(nodes = adjacency.node_count(), edges = adjacency.edge_count(), seed = config.seed)
)]
pub fn run_benchmark(
    adjacency: &Adjacency,
    features: Option<&DMatrix<f64>>,
    config: &BenchConfig,
) -> Result<BenchReport> {
    config.validate()?;

    let n = adjacency.node_count();
    if let Some(rows) = features.map(DMatrix::nrows).filter(|&rows| rows != n) {
        return Err(BenchError::InvalidFeatures {
            reason: format!("found {rows} feature rows for {n} nodes"),
        });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let split = timed("split", || split_edges(adjacency, &config.split, &mut rng))?;
    let summary = split.summary();
    if config.verbosity.reports_metrics() {
        info!(?summary, "edge split ready");
    } else {
        debug!(?summary, "edge split ready");
    }

    let ctx = RunContext {
        split: &split,
        features,
        verbosity: config.verbosity,
    };

    let mut report = BenchReport::new(config.seed, summary);
    for kind in PredictorKind::ALL {
        if !config.predictors.contains(&kind) {
            continue;
        }
        let predictor = build_predictor(kind, config);
        let scores = timed(kind.code(), || predictor.run(&ctx, &mut rng))?;
        log_scores(kind, &scores, config.verbosity);
        report.scores.insert(kind, scores);
    }

    Ok(report)
}

fn log_scores(kind: PredictorKind, scores: &PredictorScores, verbosity: Verbosity) {
    if verbosity.reports_metrics() {
        info!(
            predictor = kind.code(),
            test_roc = scores.test_roc,
            test_ap = scores.test_ap,
            val_roc = scores.val_roc,
            val_ap = scores.val_ap,
            "predictor scored"
        );
    } else {
        debug!(
            predictor = kind.code(),
            test_roc = scores.test_roc,
            test_ap = scores.test_ap,
            "predictor scored"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(n: usize) -> Adjacency {
        Adjacency::from_edges(n, (0..n).map(|i| (i, (i + 1) % n))).expect("valid ring")
    }

    fn heuristics_only() -> BenchConfig {
        let mut config = BenchConfig::default();
        config.predictors = vec![PredictorKind::Jaccard, PredictorKind::AdamicAdar];
        config.split.test_fraction = 0.2;
        config.split.val_fraction = 0.1;
        config.verbosity = Verbosity::Silent;
        config
    }

    #[test]
    fn build_predictor_reports_requested_kind() {
        let config = BenchConfig::default();
        for kind in PredictorKind::ALL {
            assert_eq!(build_predictor(kind, &config).kind(), kind);
        }
    }

    #[test]
    fn only_selected_predictors_are_reported() {
        let report = run_benchmark(&ring(10), None, &heuristics_only()).expect("ring splits");
        let kinds: Vec<_> = report.scores.keys().copied().collect();
        assert_eq!(kinds, vec![PredictorKind::AdamicAdar, PredictorKind::Jaccard]);
        assert!(report.scores.values().all(|s| s.val_roc.is_none()));
    }

    #[test]
    fn mismatched_features_are_rejected_before_splitting() {
        let features = DMatrix::zeros(3, 2);
        let err = run_benchmark(&ring(10), Some(&features), &heuristics_only())
            .expect_err("3 rows for 10 nodes");
        assert!(matches!(err, BenchError::InvalidFeatures { .. }));
    }

    #[test]
    fn zero_walk_bias_is_rejected_before_walking() {
        let mut config = heuristics_only();
        config.predictors = vec![PredictorKind::RandomWalk];
        config.random_walk.p = 0.0;
        config.random_walk.q = 0.0;

        let err = run_benchmark(&ring(10), None, &config).expect_err("p = q = 0");
        assert!(matches!(err, BenchError::InvalidPredictorConfig { .. }), "{err}");
        assert_eq!(err.code().code(), "E4001");
    }

    #[test]
    fn nan_dropout_is_rejected_before_training() {
        let mut config = heuristics_only();
        config.predictors = vec![PredictorKind::Generative];
        config.generative.dropout = f64::NAN;

        let err = run_benchmark(&ring(10), None, &config).expect_err("NaN dropout");
        assert!(matches!(err, BenchError::InvalidPredictorConfig { .. }), "{err}");
    }
}
