#![forbid(unsafe_code)]
//! linkbench-predict library.
//!
//! The six link predictors and the runner that scores them on one shared
//! edge split.
//!
//! # Conventions
//!
//! - **Errors**: Use [`linkbench_core::Result`]. Numerical trouble inside a
//!   model is not an error; only unusable inputs are.
//! - **Logging**: Use `tracing` macros. Progress goes to `info!` only when
//!   [`linkbench_core::Verbosity::reports_progress`] is set.
//! - **Randomness**: Each predictor draws from the `&mut dyn RngCore` it is
//!   handed. Worker threads derive their own seeds from it.

pub mod benchmark;
pub mod generative;
pub mod heuristics;
pub mod predictor;
pub mod spectral;
pub mod walk;

pub use benchmark::{build_predictor, run_benchmark};
pub use predictor::{Predictor, RunContext};
