//! node2vec link prediction.
//!
//! Biased walks on the training graph feed a skip-gram model; the learned
//! node vectors are combined per edge by Hadamard product and a logistic
//! regression is fit on the train positives versus train negatives. An
//! edge's score is the classifier's positive-class probability.

pub mod classifier;
pub mod node2vec;
pub mod skipgram;

use linkbench_core::config::RandomWalkConfig;
use linkbench_core::{PredictorKind, PredictorScores, Result};
use rand::RngCore;
use tracing::{debug, instrument};

use crate::predictor::{Predictor, RunContext, score_test_and_val};
use classifier::{EmbeddingEdgeScorer, LogisticRegression, edge_features};
use node2vec::{WalkParams, simulate_walks};
use skipgram::{SkipGramParams, train_skipgram};

/// Inverse L2 strength of the edge classifier.
pub const CLASSIFIER_C: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct RandomWalkPredictor {
    config: RandomWalkConfig,
}

impl RandomWalkPredictor {
    #[must_use]
    pub const fn new(config: RandomWalkConfig) -> Self {
        Self { config }
    }
}

impl Predictor for RandomWalkPredictor {
    fn kind(&self) -> PredictorKind {
        PredictorKind::RandomWalk
    }

    #[instrument(skip_all, fields(p = self.config.p, q = self.config.q))]
    fn run(&self, ctx: &RunContext<'_>, rng: &mut dyn RngCore) -> Result<PredictorScores> {
        let split = ctx.split;
        let train = &split.train_adjacency;

        let walks = simulate_walks(train, &WalkParams::from(&self.config), ctx.verbosity, rng);
        debug!(walks = walks.len(), "walk corpus ready");

        let skipgram = SkipGramParams::from(&self.config);
        let embedding = train_skipgram(&walks, train.node_count(), &skipgram, rng);

        let (features, labels) = edge_features(&embedding, &split.train_pos, &split.train_neg);
        let classifier = LogisticRegression::fit(&features, &labels, CLASSIFIER_C)?;

        score_test_and_val(split, &EmbeddingEdgeScorer::new(embedding, classifier))
    }
}
