//! Graph autoencoder link prediction.
//!
//! A [`GraphAutoencoder`] is trained for a fixed number of epochs on the
//! training graph. After every epoch the latent means are scored against the
//! validation set, giving a per-epoch ROC trajectory. The final latent means
//! score pairs by raw inner product.
//!
//! There is no early stopping. A model that diverges still runs its full
//! epoch budget; only unusable final scores surface as an error.

pub mod vgae;

use std::time::Instant;

use linkbench_core::config::GenerativeConfig;
use linkbench_core::metrics::evaluate;
use linkbench_core::{
    Adjacency, BenchError, EdgeSplit, InnerProductScores, PredictorKind, PredictorScores, Result,
    Verbosity,
};
use nalgebra::DMatrix;
use rand::RngCore;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::predictor::{Predictor, RunContext};
pub use vgae::Vgae;

/// Training diagnostics for one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochStats {
    /// Weighted reconstruction loss minus the KL term.
    pub loss: f64,
    /// Fraction of adjacency entries reconstructed on the right side of 0.5.
    pub accuracy: f64,
}

/// A trainable model that yields one embedding row per node.
pub trait GraphAutoencoder {
    /// One full-batch optimizer step.
    fn train_epoch(&mut self, rng: &mut dyn RngCore) -> EpochStats;

    /// Deterministic `N × d` embedding (no dropout, no sampling).
    fn latent_mean(&self) -> DMatrix<f64>;
}

/// One-hot node features.
#[must_use]
pub fn identity_features(node_count: usize) -> DMatrix<f64> {
    DMatrix::identity(node_count, node_count)
}

/// `D^{-1/2} (A + I) D^{-1/2}`, the propagation matrix of a graph convolution.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn normalize_adjacency(adjacency: &Adjacency) -> DMatrix<f64> {
    let n = adjacency.node_count();
    let inv_sqrt: Vec<f64> = (0..n)
        .map(|u| 1.0 / ((adjacency.degree(u) + 1) as f64).sqrt())
        .collect();

    let mut normalized = DMatrix::zeros(n, n);
    for u in 0..n {
        normalized[(u, u)] = inv_sqrt[u] * inv_sqrt[u];
        for &v in adjacency.neighbors(u) {
            normalized[(u, v)] = inv_sqrt[u] * inv_sqrt[v];
        }
    }
    normalized
}

/// Train `model` for `epochs` epochs, returning the validation ROC after each.
///
/// Epochs whose embedding cannot be ranked (for instance NaN scores) record
/// `NaN` and training continues.
pub fn train_with_validation<M: GraphAutoencoder + ?Sized>(
    model: &mut M,
    split: &EdgeSplit,
    epochs: usize,
    verbosity: Verbosity,
    rng: &mut dyn RngCore,
) -> Vec<f64> {
    let track_val = !split.val_pos.is_empty();
    let mut history = Vec::with_capacity(if track_val { epochs } else { 0 });
    let mut warned = false;

    for epoch in 1..=epochs {
        let started = Instant::now();
        let stats = model.train_epoch(rng);

        let (val_roc, val_ap) = if track_val {
            let scores = InnerProductScores::new(model.latent_mean());
            match evaluate(&split.val_pos, &split.val_neg, &scores, false) {
                Ok(metrics) => (metrics.roc_auc, metrics.average_precision),
                Err(err) => {
                    if !warned {
                        warn!(epoch, error = %err, "validation scoring failed; recording NaN");
                        warned = true;
                    }
                    (f64::NAN, f64::NAN)
                }
            }
        } else {
            (f64::NAN, f64::NAN)
        };
        if track_val {
            history.push(val_roc);
        }

        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
        if verbosity.reports_progress() {
            info!(
                epoch,
                train_loss = stats.loss,
                train_acc = stats.accuracy,
                val_roc,
                val_ap,
                elapsed_ms,
                "generative epoch"
            );
        } else {
            debug!(
                epoch,
                train_loss = stats.loss,
                train_acc = stats.accuracy,
                val_roc,
                "generative epoch"
            );
        }
    }

    if verbosity.reports_progress() {
        info!(epochs, "optimization finished");
    }
    history
}

#[derive(Debug, Clone)]
pub struct GenerativePredictor {
    config: GenerativeConfig,
}

impl GenerativePredictor {
    #[must_use]
    pub const fn new(config: GenerativeConfig) -> Self {
        Self { config }
    }
}

impl Predictor for GenerativePredictor {
    fn kind(&self) -> PredictorKind {
        PredictorKind::Generative
    }

    #[instrument(skip_all, fields(epochs = self.config.epochs))]
    fn run(&self, ctx: &RunContext<'_>, rng: &mut dyn RngCore) -> Result<PredictorScores> {
        let split = ctx.split;
        let n = split.node_count();

        let features = match ctx.features {
            Some(features) if features.nrows() != n => {
                return Err(BenchError::InvalidFeatures {
                    reason: format!("found {} feature rows for {n} nodes", features.nrows()),
                });
            }
            Some(features) => features.clone(),
            None => identity_features(n),
        };

        let mut model = Vgae::new(&split.train_adjacency, features, &self.config, rng);
        let history =
            train_with_validation(&mut model, split, self.config.epochs, ctx.verbosity, rng);

        let scores = InnerProductScores::new(model.latent_mean());
        let test = evaluate(&split.test_pos, &split.test_neg, &scores, false)?;
        let val = if split.val_pos.is_empty() {
            None
        } else {
            Some(evaluate(&split.val_pos, &split.val_neg, &scores, false)?)
        };

        Ok(PredictorScores::with_validation(test, val).with_history(history))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkbench_core::split_edges_seeded;
    use linkbench_core::SplitConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Returns a fixed embedding and counts epochs.
    struct Fixed {
        embedding: DMatrix<f64>,
        epochs: usize,
    }

    impl GraphAutoencoder for Fixed {
        fn train_epoch(&mut self, _rng: &mut dyn RngCore) -> EpochStats {
            self.epochs += 1;
            EpochStats { loss: 0.0, accuracy: 1.0 }
        }

        fn latent_mean(&self) -> DMatrix<f64> {
            self.embedding.clone()
        }
    }

    #[test]
    fn normalized_adjacency_is_symmetric_with_self_loops() {
        let g = Adjacency::from_edges(3, [(0, 1), (1, 2)]).expect("valid");
        let a = normalize_adjacency(&g);
        assert_eq!(a, a.transpose());
        assert!((a[(0, 0)] - 0.5).abs() < 1e-12);
        assert!((a[(0, 1)] - 1.0 / 6.0_f64.sqrt()).abs() < 1e-12);
        assert_eq!(a[(0, 2)], 0.0);
    }

    #[test]
    fn history_has_one_entry_per_epoch() {
        let g = Adjacency::from_edges(10, (0..10).map(|i| (i, (i + 1) % 10))).expect("valid");
        let config = SplitConfig {
            test_fraction: 0.2,
            val_fraction: 0.1,
            ..SplitConfig::default()
        };
        let split = split_edges_seeded(&g, &config, 0).expect("valid split");
        let mut model = Fixed {
            embedding: DMatrix::from_fn(10, 2, |i, j| (i + j) as f64),
            epochs: 0,
        };

        let mut rng = StdRng::seed_from_u64(0);
        let history = train_with_validation(&mut model, &split, 7, Verbosity::Silent, &mut rng);
        assert_eq!(model.epochs, 7);
        assert_eq!(history.len(), 7);
        assert!(history.iter().all(|roc| (0.0..=1.0).contains(roc)));
    }

    #[test]
    fn nan_embedding_is_recorded_not_fatal() {
        let g = Adjacency::from_edges(10, (0..10).map(|i| (i, (i + 1) % 10))).expect("valid");
        let config = SplitConfig {
            test_fraction: 0.2,
            val_fraction: 0.1,
            ..SplitConfig::default()
        };
        let split = split_edges_seeded(&g, &config, 1).expect("valid split");
        let mut model = Fixed {
            embedding: DMatrix::from_element(10, 2, f64::NAN),
            epochs: 0,
        };

        let mut rng = StdRng::seed_from_u64(0);
        let history = train_with_validation(&mut model, &split, 3, Verbosity::Silent, &mut rng);
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|roc| roc.is_nan()));
    }
}
