//! Laplacian eigenmap embedding.
//!
//! # Algorithm
//!
//! 1. `L = I − D^{-1/2} A D^{-1/2}`. Isolated nodes use `d = 1` and a zero
//!    diagonal entry.
//! 2. Take the eigenvectors of the `k + 1` smallest eigenvalues and drop the
//!    first (the trivial one), with `k = min(dimensions, N − 1)`.
//! 3. Rescale each row by `1 / sqrt(d)` and flip each component so its
//!    largest-magnitude entry is positive. The flip makes the embedding
//!    independent of the eigensolver's sign choice.
//!
//! Pairs are scored as `sigmoid(⟨zᵤ, zᵥ⟩)`.

use linkbench_core::config::SpectralConfig;
use linkbench_core::{
    Adjacency, InnerProductScores, MatrixScorer, PredictorKind, PredictorScores, Result,
};
use nalgebra::{DMatrix, SymmetricEigen};
use rand::RngCore;
use tracing::{debug, instrument};

use crate::predictor::{Predictor, RunContext, score_test_and_val};

#[allow(clippy::cast_precision_loss)]
fn sqrt_degrees(adjacency: &Adjacency) -> Vec<f64> {
    (0..adjacency.node_count())
        .map(|u| match adjacency.degree(u) {
            0 => 1.0,
            d => (d as f64).sqrt(),
        })
        .collect()
}

/// Symmetric normalized Laplacian of `adjacency`.
#[must_use]
pub fn normalized_laplacian(adjacency: &Adjacency) -> DMatrix<f64> {
    let n = adjacency.node_count();
    let dd = sqrt_degrees(adjacency);

    let mut laplacian = DMatrix::zeros(n, n);
    for u in 0..n {
        if adjacency.degree(u) > 0 {
            laplacian[(u, u)] = 1.0;
        }
        for &v in adjacency.neighbors(u) {
            laplacian[(u, v)] = -1.0 / (dd[u] * dd[v]);
        }
    }
    laplacian
}

/// `N × k` spectral embedding of `adjacency`.
#[must_use]
#[instrument(skip(adjacency), fields(nodes = adjacency.node_count()))]
pub fn spectral_embedding(adjacency: &Adjacency, dimensions: usize) -> DMatrix<f64> {
    let n = adjacency.node_count();
    let k = dimensions.min(n.saturating_sub(1));
    if k == 0 {
        return DMatrix::zeros(n, 0);
    }

    let eigen = SymmetricEigen::new(normalized_laplacian(adjacency));
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
    debug!(
        smallest = eigen.eigenvalues[order[0]],
        kept = k,
        "laplacian eigendecomposition"
    );

    let dd = sqrt_degrees(adjacency);
    let mut embedding = DMatrix::zeros(n, k);
    for (component, &source) in order[1..=k].iter().enumerate() {
        let vector = eigen.eigenvectors.column(source);
        let pivot = vector
            .iter()
            .copied()
            .fold(0.0_f64, |best, x| if x.abs() > best.abs() { x } else { best });
        let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
        for row in 0..n {
            embedding[(row, component)] = sign * vector[row] / dd[row];
        }
    }
    embedding
}

#[derive(Debug, Clone)]
pub struct SpectralPredictor {
    config: SpectralConfig,
}

impl SpectralPredictor {
    #[must_use]
    pub const fn new(config: SpectralConfig) -> Self {
        Self { config }
    }
}

impl Predictor for SpectralPredictor {
    fn kind(&self) -> PredictorKind {
        PredictorKind::Spectral
    }

    fn run(&self, ctx: &RunContext<'_>, _rng: &mut dyn RngCore) -> Result<PredictorScores> {
        let embedding = spectral_embedding(&ctx.split.train_adjacency, self.config.dimensions);
        let scores = InnerProductScores::new(embedding);
        score_test_and_val(ctx.split, &MatrixScorer::new(&scores, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(n: usize) -> Adjacency {
        Adjacency::from_edges(n, (0..n).map(|i| (i, (i + 1) % n))).expect("valid ring")
    }

    #[test]
    fn laplacian_rows_of_regular_graph_sum_to_zero() {
        let l = normalized_laplacian(&ring(6));
        for row in l.row_iter() {
            assert!(row.sum().abs() < 1e-12);
        }
        assert_eq!(l, l.transpose());
    }

    #[test]
    fn isolated_node_has_zero_laplacian_row() {
        let g = Adjacency::from_edges(3, [(0, 1)]).expect("valid");
        let l = normalized_laplacian(&g);
        assert!(l.row(2).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn embedding_width_is_capped_by_node_count() {
        assert_eq!(spectral_embedding(&ring(10), 16).shape(), (10, 9));
        assert_eq!(spectral_embedding(&ring(40), 16).shape(), (40, 16));
        assert_eq!(spectral_embedding(&Adjacency::empty(1), 16).shape(), (1, 0));
    }

    #[test]
    fn components_have_positive_pivot() {
        let z = spectral_embedding(&ring(12), 4);
        for column in z.column_iter() {
            let pivot = column
                .iter()
                .copied()
                .fold(0.0_f64, |best, x| if x.abs() > best.abs() { x } else { best });
            assert!(pivot > 0.0);
        }
    }

    #[test]
    fn neighbors_embed_closer_than_opposites() {
        let z = spectral_embedding(&ring(20), 2);
        let dot = |a: usize, b: usize| z.row(a).dot(&z.row(b));
        assert!(dot(0, 1) > dot(0, 10));
    }
}
