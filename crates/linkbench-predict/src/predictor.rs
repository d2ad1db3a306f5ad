//! The strategy seam every link predictor plugs into.

use linkbench_core::metrics::evaluate_scorer;
use linkbench_core::{EdgeScorer, EdgeSplit, PredictorKind, PredictorScores, Result, Verbosity};
use nalgebra::DMatrix;
use rand::RngCore;

/// Read-only inputs shared by every predictor in a run.
#[derive(Debug, Clone, Copy)]
pub struct RunContext<'a> {
    pub split: &'a EdgeSplit,
    /// Optional `N × F` node attributes. `None` means one-hot identity features.
    pub features: Option<&'a DMatrix<f64>>,
    pub verbosity: Verbosity,
}

pub trait Predictor {
    fn kind(&self) -> PredictorKind;

    /// Fit on `ctx.split.train_adjacency` and score the held-out sets.
    ///
    /// # Errors
    ///
    /// Returns an error when the held-out sets cannot be ranked.
    fn run(&self, ctx: &RunContext<'_>, rng: &mut dyn RngCore) -> Result<PredictorScores>;
}

/// Test metrics plus validation metrics when the split has a validation set.
///
/// # Errors
///
/// Propagates [`linkbench_core::BenchError::DegenerateMetricInput`] from the evaluator.
pub fn score_test_and_val<S: EdgeScorer + ?Sized>(
    split: &EdgeSplit,
    scorer: &S,
) -> Result<PredictorScores> {
    let test = evaluate_scorer(&split.test_pos, &split.test_neg, scorer)?;
    let val = if split.val_pos.is_empty() {
        None
    } else {
        Some(evaluate_scorer(&split.val_pos, &split.val_neg, scorer)?)
    };
    Ok(PredictorScores::with_validation(test, val))
}
