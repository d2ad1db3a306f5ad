#![forbid(unsafe_code)]
//! linkbench-core library.
//!
//! Graph representation, leakage-free edge splitting, and the scoring
//! harness shared by every link predictor.
//!
//! # Conventions
//!
//! - **Errors**: Library operations return [`error::Result`] carrying a
//!   [`BenchError`]; configuration loading uses `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).
//! - **Randomness**: Every stochastic routine takes an explicit `&mut impl Rng`.
//!   Nothing in this crate touches a process-wide seed.

pub mod adjacency;
pub mod config;
pub mod edge;
pub mod error;
pub mod metrics;
pub mod parse;
pub mod report;
pub mod scoring;
pub mod split;
pub mod timing;

pub use adjacency::Adjacency;
pub use config::{BenchConfig, Verbosity};
pub use edge::{Edge, EdgeIndex};
pub use error::{BenchError, ErrorCode, Result};
pub use metrics::{RankingMetrics, evaluate, evaluate_scorer};
pub use report::{BenchReport, PredictorKind, PredictorScores};
pub use scoring::{EdgeScorer, InnerProductScores, MatrixScorer, ScoreMatrix, sigmoid};
pub use split::{EdgeSplit, Partition, SplitConfig, SplitSummary, split_edges, split_edges_seeded};
