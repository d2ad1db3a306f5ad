//! ROC-AUC and average precision over scored positive/negative edges.
//!
//! Labels are laid out positives first, then negatives. ROC-AUC is the
//! Mann–Whitney statistic with average ranks for tied scores, so a tie
//! between a positive and a negative earns half credit. Average precision
//! uses the step definition: `Σ (Rₖ − Rₖ₋₁) · Pₖ` over distinct score
//! thresholds taken in descending order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::error::{BenchError, Result};
use crate::scoring::{EdgeScorer, MatrixScorer, ScoreMatrix, score_edges_with};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankingMetrics {
    pub roc_auc: f64,
    pub average_precision: f64,
}

fn check_inputs(labels: &[bool], scores: &[f64]) -> Result<(usize, usize)> {
    if labels.len() != scores.len() {
        return Err(BenchError::degenerate(format!(
            "{} labels for {} scores",
            labels.len(),
            scores.len()
        )));
    }
    if let Some(index) = scores.iter().position(|s| s.is_nan()) {
        return Err(BenchError::degenerate(format!("score {index} is NaN")));
    }

    let positives = labels.iter().filter(|&&l| l).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return Err(BenchError::degenerate(format!(
            "need both classes, got {positives} positives and {negatives} negatives"
        )));
    }
    Ok((positives, negatives))
}

fn order_by_score(scores: &[f64], descending: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        let ord = scores[a].total_cmp(&scores[b]);
        if descending { ord.reverse() } else { ord }
    });
    order
}

/// Length of the run of equal scores starting at `order[start]`.
fn tie_run(order: &[usize], scores: &[f64], start: usize) -> usize {
    let value = scores[order[start]];
    order[start..]
        .iter()
        .take_while(|&&i| scores[i].total_cmp(&value) == Ordering::Equal)
        .count()
}

/// Area under the ROC curve.
///
/// # Errors
///
/// Returns [`BenchError::DegenerateMetricInput`] if the lengths differ, a
/// score is NaN, or either class is absent.
#[allow(clippy::cast_precision_loss)]
pub fn roc_auc(labels: &[bool], scores: &[f64]) -> Result<f64> {
    let (positives, negatives) = check_inputs(labels, scores)?;
    let order = order_by_score(scores, false);

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let run = tie_run(&order, scores, start);
        // 1-based ranks start+1 ..= start+run share their mean.
        let mean_rank = (2 * start + run + 1) as f64 / 2.0;
        let tied_positives = order[start..start + run].iter().filter(|&&i| labels[i]).count();
        positive_rank_sum += mean_rank * tied_positives as f64;
        start += run;
    }

    let p = positives as f64;
    let u = positive_rank_sum - p * (p + 1.0) / 2.0;
    Ok(u / (p * negatives as f64))
}

/// Step-function average precision.
///
/// # Errors
///
/// Same as [`roc_auc`].
#[allow(clippy::cast_precision_loss)]
pub fn average_precision(labels: &[bool], scores: &[f64]) -> Result<f64> {
    let (positives, _) = check_inputs(labels, scores)?;
    let order = order_by_score(scores, true);

    let mut ap = 0.0;
    let mut true_pos = 0usize;
    let mut seen = 0usize;
    let mut previous_recall = 0.0;
    let mut start = 0;
    while start < order.len() {
        let run = tie_run(&order, scores, start);
        true_pos += order[start..start + run].iter().filter(|&&i| labels[i]).count();
        seen += run;
        start += run;

        let recall = true_pos as f64 / positives as f64;
        let precision = true_pos as f64 / seen as f64;
        ap += (recall - previous_recall) * precision;
        previous_recall = recall;
    }

    Ok(ap)
}

/// Both metrics for already-computed positive and negative scores.
///
/// # Errors
///
/// Returns [`BenchError::DegenerateMetricInput`] if either side is empty or
/// contains NaN.
pub fn evaluate_predictions(positive: &[f64], negative: &[f64]) -> Result<RankingMetrics> {
    if positive.is_empty() || negative.is_empty() {
        return Err(BenchError::degenerate(format!(
            "cannot rank {} positive against {} negative edges",
            positive.len(),
            negative.len()
        )));
    }

    let labels: Vec<bool> = std::iter::repeat_n(true, positive.len())
        .chain(std::iter::repeat_n(false, negative.len()))
        .collect();
    let scores: Vec<f64> = positive.iter().chain(negative).copied().collect();

    Ok(RankingMetrics {
        roc_auc: roc_auc(&labels, &scores)?,
        average_precision: average_precision(&labels, &scores)?,
    })
}

/// Score `pos` and `neg` through `scorer` and rank them.
///
/// # Errors
///
/// Returns [`BenchError::DegenerateMetricInput`] for empty edge sets,
/// out-of-range endpoints, or NaN scores.
pub fn evaluate_scorer<S: EdgeScorer + ?Sized>(
    pos: &[Edge],
    neg: &[Edge],
    scorer: &S,
) -> Result<RankingMetrics> {
    let positive = score_edges_with(pos, scorer)?;
    let negative = score_edges_with(neg, scorer)?;
    evaluate_predictions(&positive, &negative)
}

/// Rank `pos` against `neg` by their entries in `matrix`.
///
/// # Errors
///
/// Same as [`evaluate_scorer`].
pub fn evaluate<M: ScoreMatrix + ?Sized>(
    pos: &[Edge],
    neg: &[Edge],
    matrix: &M,
    apply_sigmoid: bool,
) -> Result<RankingMetrics> {
    evaluate_scorer(pos, neg, &MatrixScorer::new(matrix, apply_sigmoid))
}
