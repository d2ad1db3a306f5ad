//! Neighborhood-overlap link indices.
//!
//! Each index scores every non-edge `(u, v)` of the training graph:
//!
//! - **Adamic–Adar**: `Σ_{w ∈ N(u) ∩ N(v)} 1 / ln |N(w)|`
//! - **Jaccard**: `|N(u) ∩ N(v)| / |N(u) ∪ N(v)|`
//! - **Preferential attachment**: `|N(u)| · |N(v)|`
//!
//! Training edges keep a score of zero; they are never evaluated. The
//! resulting symmetric matrix is divided by its maximum so the best pair
//! scores exactly 1.0. Intersections walk both sorted neighbor lists with
//! two pointers.

use std::cmp::Ordering;

use linkbench_core::metrics::evaluate;
use linkbench_core::{Adjacency, BenchError, PredictorKind, PredictorScores, Result};
use nalgebra::DMatrix;
use rand::RngCore;
use tracing::{debug, instrument};

use crate::predictor::{Predictor, RunContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicIndex {
    AdamicAdar,
    Jaccard,
    PreferentialAttachment,
}

impl HeuristicIndex {
    #[must_use]
    pub const fn kind(self) -> PredictorKind {
        match self {
            Self::AdamicAdar => PredictorKind::AdamicAdar,
            Self::Jaccard => PredictorKind::Jaccard,
            Self::PreferentialAttachment => PredictorKind::PreferentialAttachment,
        }
    }

    /// Raw (unnormalized) index for the pair `(u, v)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn pair_score(self, adjacency: &Adjacency, u: usize, v: usize) -> f64 {
        let nu = adjacency.neighbors(u);
        let nv = adjacency.neighbors(v);
        match self {
            Self::AdamicAdar => {
                let mut total = 0.0;
                for_each_common(nu, nv, |w| {
                    let degree = adjacency.degree(w);
                    if degree > 1 {
                        total += 1.0 / (degree as f64).ln();
                    }
                });
                total
            }
            Self::Jaccard => {
                let common = common_neighbor_count(nu, nv);
                let union = nu.len() + nv.len() - common;
                if union == 0 {
                    0.0
                } else {
                    common as f64 / union as f64
                }
            }
            Self::PreferentialAttachment => (nu.len() * nv.len()) as f64,
        }
    }
}

/// Call `f` for every element present in both sorted slices.
fn for_each_common(a: &[usize], b: &[usize], mut f: impl FnMut(usize)) {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                f(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
}

#[must_use]
pub fn common_neighbor_count(a: &[usize], b: &[usize]) -> usize {
    let mut count = 0;
    for_each_common(a, b, |_| count += 1);
    count
}

/// Max-normalized `N × N` index matrix over the non-edges of `adjacency`.
///
/// # Errors
///
/// Returns [`BenchError::DegenerateMetricInput`] if every non-edge scores
/// zero, since the normalization would divide by zero.
#[instrument(skip(adjacency), fields(nodes = adjacency.node_count()))]
pub fn heuristic_matrix(adjacency: &Adjacency, index: HeuristicIndex) -> Result<DMatrix<f64>> {
    let n = adjacency.node_count();
    let mut matrix = DMatrix::zeros(n, n);
    let mut max = 0.0_f64;

    for u in 0..n {
        for v in (u + 1)..n {
            if adjacency.has_edge(u, v) {
                continue;
            }
            let score = index.pair_score(adjacency, u, v);
            matrix[(u, v)] = score;
            matrix[(v, u)] = score;
            max = max.max(score);
        }
    }

    if max <= 0.0 {
        return Err(BenchError::DegenerateMetricInput {
            reason: format!("{} scores are zero for every non-edge", index.kind()),
        });
    }

    matrix /= max;
    debug!(max, "normalized heuristic scores");
    Ok(matrix)
}

#[derive(Debug, Clone, Copy)]
pub struct HeuristicPredictor {
    index: HeuristicIndex,
}

impl HeuristicPredictor {
    #[must_use]
    pub const fn new(index: HeuristicIndex) -> Self {
        Self { index }
    }
}

impl Predictor for HeuristicPredictor {
    fn kind(&self) -> PredictorKind {
        self.index.kind()
    }

    fn run(&self, ctx: &RunContext<'_>, _rng: &mut dyn RngCore) -> Result<PredictorScores> {
        let split = ctx.split;
        let matrix = heuristic_matrix(&split.train_adjacency, self.index)?;
        let test = evaluate(&split.test_pos, &split.test_neg, &matrix, false)?;
        Ok(PredictorScores::test_only(test))
    }
}
