use std::fmt;

use crate::split::Partition;

/// Convenience alias for results produced by the benchmark core.
pub type Result<T, E = BenchError> = std::result::Result<T, E>;

/// Errors raised by splitting, scoring, and input parsing.
///
/// All variants are fatal for a benchmark run. They carry enough context
/// (fractions, counts, line numbers) for the caller to adjust its input.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    /// The requested fractions cannot produce a usable train/val/test split.
    #[error(
        "invalid split configuration: {reason} \
         (test_fraction={test_fraction}, val_fraction={val_fraction}, edges={edge_count})"
    )]
    InvalidSplitConfiguration {
        reason: String,
        test_fraction: f64,
        val_fraction: f64,
        edge_count: usize,
    },

    /// Not enough non-edges could be found to fill a negative set.
    #[error(
        "negative sampling exhausted for the {partition} split: \
         found {found} of {requested} non-edges after {attempts} attempts"
    )]
    NegativeSamplingExhausted {
        partition: Partition,
        requested: usize,
        found: usize,
        attempts: usize,
    },

    /// Scores or edge sets that make a metric undefined.
    #[error("degenerate metric input: {reason}")]
    DegenerateMetricInput { reason: String },

    /// The adjacency structure is malformed (not square, asymmetric, out of range).
    #[error("invalid adjacency: {reason}")]
    InvalidAdjacency { reason: String },

    /// The node feature matrix does not match the graph.
    #[error("invalid feature matrix: {reason}")]
    InvalidFeatures { reason: String },

    /// A predictor hyperparameter is outside the range it can run with.
    #[error("invalid predictor configuration: {reason}")]
    InvalidPredictorConfig { reason: String },

    /// A line of an edge list or feature file could not be parsed.
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BenchError {
    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        Self::DegenerateMetricInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn adjacency(reason: impl Into<String>) -> Self {
        Self::InvalidAdjacency {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidSplitConfiguration { .. } => ErrorCode::InvalidSplitConfiguration,
            Self::NegativeSamplingExhausted { .. } => ErrorCode::NegativeSamplingExhausted,
            Self::DegenerateMetricInput { .. } => ErrorCode::DegenerateMetricInput,
            Self::InvalidAdjacency { .. } => ErrorCode::InvalidAdjacency,
            Self::InvalidFeatures { .. } => ErrorCode::InvalidFeatures,
            Self::InvalidPredictorConfig { .. } => ErrorCode::InvalidPredictorConfig,
            Self::Parse { .. } => ErrorCode::ParseError,
            Self::Io(_) => ErrorCode::IoFailure,
        }
    }
}

/// Machine-readable error codes for scripted benchmark drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidSplitConfiguration,
    NegativeSamplingExhausted,
    DegenerateMetricInput,
    InvalidAdjacency,
    InvalidFeatures,
    ParseError,
    InvalidPredictorConfig,
    IoFailure,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidSplitConfiguration => "E1001",
            Self::NegativeSamplingExhausted => "E1002",
            Self::DegenerateMetricInput => "E2001",
            Self::InvalidAdjacency => "E3001",
            Self::InvalidFeatures => "E3002",
            Self::ParseError => "E3003",
            Self::InvalidPredictorConfig => "E4001",
            Self::IoFailure => "E5001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::InvalidSplitConfiguration => "Invalid split configuration",
            Self::NegativeSamplingExhausted => "Negative sampling exhausted",
            Self::DegenerateMetricInput => "Degenerate metric input",
            Self::InvalidAdjacency => "Invalid adjacency",
            Self::InvalidFeatures => "Invalid feature matrix",
            Self::ParseError => "Input parse error",
            Self::InvalidPredictorConfig => "Invalid predictor configuration",
            Self::IoFailure => "I/O failure",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::InvalidSplitConfiguration => {
                Some("Lower --test-frac/--val-frac so that some edges remain for training.")
            }
            Self::NegativeSamplingExhausted => {
                Some("The graph is too dense; lower the fractions or the train negative ratio.")
            }
            Self::DegenerateMetricInput => {
                Some("Check that the held-out sets are non-empty and the scores are not all zero.")
            }
            Self::InvalidAdjacency => {
                Some("Node ids must be in 0..N and the matrix must be symmetric.")
            }
            Self::InvalidFeatures => {
                Some("Provide exactly one feature row per node, all of equal width.")
            }
            Self::ParseError => {
                Some("Edge lists use one `u v` pair per line; `#` starts a comment.")
            }
            Self::InvalidPredictorConfig => {
                Some("Fix the named knob in linkbench.toml or on the command line.")
            }
            Self::IoFailure => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
