//! L2-regularized logistic regression on Hadamard edge features.
//!
//! Minimizes `½‖w‖² + C · Σ logloss` with an unpenalized intercept, using
//! Newton steps solved by Cholesky. A step whose Hessian is not positive
//! definite falls back to a small gradient step.

use linkbench_core::{BenchError, Edge, EdgeScorer, Result, sigmoid};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

const MAX_NEWTON_STEPS: usize = 100;
const TOLERANCE: f64 = 1e-8;
const GRADIENT_STEP: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    weights: DVector<f64>,
    intercept: f64,
}

impl LogisticRegression {
    /// Fit on the rows of `features` with boolean `labels`.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::DegenerateMetricInput`] if the shapes disagree or
    /// either class is missing.
    pub fn fit(features: &DMatrix<f64>, labels: &[bool], c: f64) -> Result<Self> {
        let (rows, dim) = features.shape();
        if rows != labels.len() {
            return Err(BenchError::DegenerateMetricInput {
                reason: format!("{rows} feature rows for {} labels", labels.len()),
            });
        }
        let positives = labels.iter().filter(|&&l| l).count();
        if positives == 0 || positives == rows {
            return Err(BenchError::DegenerateMetricInput {
                reason: format!(
                    "edge classifier needs both classes, got {positives} of {rows} positive"
                ),
            });
        }

        // Last column is the intercept.
        let design =
            DMatrix::from_fn(rows, dim + 1, |i, j| if j == dim { 1.0 } else { features[(i, j)] });
        let targets =
            DVector::from_iterator(rows, labels.iter().map(|&l| if l { 1.0 } else { 0.0 }));
        let penalty = 1.0 / c;

        let mut theta = DVector::zeros(dim + 1);
        let mut steps = 0;
        while steps < MAX_NEWTON_STEPS {
            steps += 1;
            let probs = (&design * &theta).map(sigmoid);

            let mut gradient = design.transpose() * (&probs - &targets);
            for j in 0..dim {
                gradient[j] += penalty * theta[j];
            }

            let curvature = probs.map(|p| (p * (1.0 - p)).max(1e-12));
            let weighted = DMatrix::from_fn(rows, dim + 1, |i, j| design[(i, j)] * curvature[i]);
            let mut hessian = design.transpose() * weighted;
            for j in 0..dim {
                hessian[(j, j)] += penalty;
            }
            hessian[(dim, dim)] += 1e-10;

            let step = hessian
                .cholesky()
                .map_or_else(|| &gradient * GRADIENT_STEP, |factor| factor.solve(&gradient));
            theta -= &step;

            if step.amax() < TOLERANCE {
                break;
            }
        }
        debug!(steps, "logistic regression converged");

        Ok(Self {
            weights: theta.rows(0, dim).into_owned(),
            intercept: theta[dim],
        })
    }

    /// Probability of the positive class for one feature row.
    #[must_use]
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        let z: f64 = self.weights.iter().zip(features).map(|(w, x)| w * x).sum();
        sigmoid(z + self.intercept)
    }

    #[must_use]
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }
}

/// Elementwise product of the endpoint embeddings.
#[must_use]
pub fn hadamard(embedding: &DMatrix<f64>, edge: Edge) -> Vec<f64> {
    embedding
        .row(edge.u())
        .iter()
        .zip(embedding.row(edge.v()).iter())
        .map(|(a, b)| a * b)
        .collect()
}

/// Stack Hadamard features for `pos` then `neg` with matching labels.
#[must_use]
pub fn edge_features(
    embedding: &DMatrix<f64>,
    pos: &[Edge],
    neg: &[Edge],
) -> (DMatrix<f64>, Vec<bool>) {
    let dim = embedding.ncols();
    let rows: Vec<f64> = pos
        .iter()
        .chain(neg)
        .flat_map(|&edge| hadamard(embedding, edge))
        .collect();
    let labels = std::iter::repeat_n(true, pos.len())
        .chain(std::iter::repeat_n(false, neg.len()))
        .collect();
    (DMatrix::from_row_slice(pos.len() + neg.len(), dim, &rows), labels)
}

/// Scores an edge as the classifier's probability that it exists.
#[derive(Debug, Clone)]
pub struct EmbeddingEdgeScorer {
    embedding: DMatrix<f64>,
    classifier: LogisticRegression,
}

impl EmbeddingEdgeScorer {
    #[must_use]
    pub const fn new(embedding: DMatrix<f64>, classifier: LogisticRegression) -> Self {
        Self { embedding, classifier }
    }
}

impl EdgeScorer for EmbeddingEdgeScorer {
    fn node_count(&self) -> usize {
        self.embedding.nrows()
    }

    fn score_edge(&self, edge: Edge) -> f64 {
        self.classifier.predict_proba(&hadamard(&self.embedding, edge))
    }
}
