//! Pairwise score sources and edge scoring.
//!
//! A predictor hands the evaluator either a dense `N × N` matrix, a lazy
//! inner-product view over an embedding, or a custom [`EdgeScorer`] (the
//! random-walk classifier). Scores are read by `(u, v)` index; symmetry is
//! not assumed.

use nalgebra::DMatrix;

use crate::edge::Edge;
use crate::error::{BenchError, Result};

/// Node-pair score lookup.
pub trait ScoreMatrix {
    fn node_count(&self) -> usize;

    /// Score for the ordered pair `(u, v)`. Callers guarantee `u, v < node_count()`.
    fn score(&self, u: usize, v: usize) -> f64;
}

impl ScoreMatrix for DMatrix<f64> {
    fn node_count(&self) -> usize {
        self.nrows().min(self.ncols())
    }

    fn score(&self, u: usize, v: usize) -> f64 {
        self[(u, v)]
    }
}

/// `Z · Zᵀ` computed one entry at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct InnerProductScores {
    embedding: DMatrix<f64>,
}

impl InnerProductScores {
    /// Wrap an `N × d` embedding.
    #[must_use]
    pub const fn new(embedding: DMatrix<f64>) -> Self {
        Self { embedding }
    }

    /// Materialize the full `N × N` product.
    #[must_use]
    pub fn to_dense(&self) -> DMatrix<f64> {
        &self.embedding * self.embedding.transpose()
    }
}

impl ScoreMatrix for InnerProductScores {
    fn node_count(&self) -> usize {
        self.embedding.nrows()
    }

    fn score(&self, u: usize, v: usize) -> f64 {
        self.embedding.row(u).dot(&self.embedding.row(v))
    }
}

/// Logistic function, stable for large `|x|`.
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Anything that assigns a real score to a candidate edge.
pub trait EdgeScorer {
    fn node_count(&self) -> usize;

    fn score_edge(&self, edge: Edge) -> f64;
}

/// Adapts a [`ScoreMatrix`] to [`EdgeScorer`], optionally squashing through [`sigmoid`].
#[derive(Debug, Clone, Copy)]
pub struct MatrixScorer<'a, M: ?Sized> {
    matrix: &'a M,
    apply_sigmoid: bool,
}

impl<'a, M: ScoreMatrix + ?Sized> MatrixScorer<'a, M> {
    #[must_use]
    pub const fn new(matrix: &'a M, apply_sigmoid: bool) -> Self {
        Self {
            matrix,
            apply_sigmoid,
        }
    }
}

impl<M: ScoreMatrix + ?Sized> EdgeScorer for MatrixScorer<'_, M> {
    fn node_count(&self) -> usize {
        self.matrix.node_count()
    }

    fn score_edge(&self, edge: Edge) -> f64 {
        let raw = self.matrix.score(edge.u(), edge.v());
        if self.apply_sigmoid { sigmoid(raw) } else { raw }
    }
}

/// Score every edge through `scorer`.
///
/// # Errors
///
/// Returns [`BenchError::DegenerateMetricInput`] if an edge endpoint is
/// outside the scorer's node range.
pub fn score_edges_with<S: EdgeScorer + ?Sized>(edges: &[Edge], scorer: &S) -> Result<Vec<f64>> {
    let n = scorer.node_count();
    edges
        .iter()
        .map(|&edge| {
            if edge.v() >= n {
                return Err(BenchError::degenerate(format!(
                    "edge {edge} is outside a score source over {n} nodes"
                )));
            }
            Ok(scorer.score_edge(edge))
        })
        .collect()
}

/// Score every edge by matrix lookup.
///
/// # Errors
///
/// Same as [`score_edges_with`].
pub fn score_edges<M: ScoreMatrix + ?Sized>(
    edges: &[Edge],
    matrix: &M,
    apply_sigmoid: bool,
) -> Result<Vec<f64>> {
    score_edges_with(edges, &MatrixScorer::new(matrix, apply_sigmoid))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(a: usize, b: usize) -> Edge {
        Edge::new(a, b).expect("distinct endpoints")
    }

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(-800.0).is_finite());
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn inner_product_matches_dense_product() {
        let z = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.5, 2.0, -1.0, 1.0]);
        let lazy = InnerProductScores::new(z);
        let dense = lazy.to_dense();
        for u in 0..3 {
            for v in 0..3 {
                assert!((lazy.score(u, v) - dense[(u, v)]).abs() < 1e-12);
            }
        }
        assert!((lazy.score(1, 2) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn score_edges_reads_u_v_entry() {
        let mut m = DMatrix::zeros(3, 3);
        m[(0, 2)] = 4.0;
        m[(2, 0)] = -4.0;
        let scores = score_edges(&[edge(2, 0)], &m, false).expect("in range");
        assert_eq!(scores, vec![4.0]);
    }

    #[test]
    fn sigmoid_flag_squashes_scores() {
        let m = DMatrix::from_element(2, 2, 0.0);
        let scores = score_edges(&[edge(0, 1)], &m, true).expect("in range");
        assert!((scores[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_edge_is_degenerate() {
        let m = DMatrix::<f64>::zeros(2, 2);
        let err = score_edges(&[edge(0, 5)], &m, false).expect_err("node 5 out of range");
        assert!(matches!(err, BenchError::DegenerateMetricInput { .. }));
    }
}
