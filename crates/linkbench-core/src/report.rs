//! Per-predictor results and the aggregated benchmark report.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::metrics::RankingMetrics;
use crate::split::SplitSummary;

/// Short codes for the six predictor strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PredictorKind {
    #[serde(rename = "heuristic-AA")]
    AdamicAdar,
    #[serde(rename = "heuristic-JC")]
    Jaccard,
    #[serde(rename = "heuristic-PA")]
    PreferentialAttachment,
    #[serde(rename = "spectral")]
    Spectral,
    #[serde(rename = "randomwalk")]
    RandomWalk,
    #[serde(rename = "generative")]
    Generative,
}

impl PredictorKind {
    pub const ALL: [Self; 6] = [
        Self::AdamicAdar,
        Self::Jaccard,
        Self::PreferentialAttachment,
        Self::Spectral,
        Self::RandomWalk,
        Self::Generative,
    ];

    #[must_use]
    pub fn all() -> Vec<Self> {
        Self::ALL.to_vec()
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::AdamicAdar => "heuristic-AA",
            Self::Jaccard => "heuristic-JC",
            Self::PreferentialAttachment => "heuristic-PA",
            Self::Spectral => "spectral",
            Self::RandomWalk => "randomwalk",
            Self::Generative => "generative",
        }
    }

    /// Whether this predictor reports validation metrics.
    #[must_use]
    pub const fn uses_validation(self) -> bool {
        matches!(self, Self::Spectral | Self::RandomWalk | Self::Generative)
    }
}

impl fmt::Display for PredictorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PredictorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|k| k.code()).collect();
                format!("unknown predictor {s:?}; expected one of {}", known.join(", "))
            })
    }
}

/// Metrics record for one predictor run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorScores {
    pub test_roc: f64,
    pub test_ap: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val_roc: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val_ap: Option<f64>,
    /// Validation ROC-AUC after each training epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val_roc_history: Option<Vec<f64>>,
}

impl PredictorScores {
    #[must_use]
    pub const fn test_only(test: RankingMetrics) -> Self {
        Self {
            test_roc: test.roc_auc,
            test_ap: test.average_precision,
            val_roc: None,
            val_ap: None,
            val_roc_history: None,
        }
    }

    #[must_use]
    pub fn with_validation(test: RankingMetrics, val: Option<RankingMetrics>) -> Self {
        let mut scores = Self::test_only(test);
        if let Some(val) = val {
            scores.val_roc = Some(val.roc_auc);
            scores.val_ap = Some(val.average_precision);
        }
        scores
    }

    #[must_use]
    pub fn with_history(mut self, history: Vec<f64>) -> Self {
        self.val_roc_history = Some(history);
        self
    }
}

/// Split statistics plus one [`PredictorScores`] per predictor that ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchReport {
    pub seed: u64,
    pub split: SplitSummary,
    pub scores: BTreeMap<PredictorKind, PredictorScores>,
}

impl BenchReport {
    #[must_use]
    pub const fn new(seed: u64, split: SplitSummary) -> Self {
        Self {
            seed,
            split,
            scores: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, kind: PredictorKind) -> Option<&PredictorScores> {
        self.scores.get(&kind)
    }
}
