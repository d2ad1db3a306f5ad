use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::BenchError;
use crate::report::PredictorKind;
use crate::split::SplitConfig;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "linkbench.toml";

/// How much the benchmark reports while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Verbosity {
    /// Nothing above `debug`.
    Silent,
    /// Split statistics and final metrics.
    #[default]
    Summary,
    /// Also per-epoch and per-walk-iteration progress.
    Progress,
}

impl Verbosity {
    #[must_use]
    pub const fn reports_metrics(self) -> bool {
        matches!(self, Self::Summary | Self::Progress)
    }

    #[must_use]
    pub const fn reports_progress(self) -> bool {
        matches!(self, Self::Progress)
    }

    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Silent => 0,
            Self::Summary => 1,
            Self::Progress => 2,
        }
    }
}

impl TryFrom<u8> for Verbosity {
    type Error = String;

    fn try_from(level: u8) -> std::result::Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::Silent),
            1 => Ok(Self::Summary),
            2 => Ok(Self::Progress),
            other => Err(format!("verbosity must be 0, 1, or 2, got {other}")),
        }
    }
}

impl From<Verbosity> for u8 {
    fn from(verbosity: Verbosity) -> Self {
        verbosity.level()
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Seeds the single RNG shared by the split and every predictor.
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub verbosity: Verbosity,
    #[serde(default = "default_predictors")]
    pub predictors: Vec<PredictorKind>,
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub spectral: SpectralConfig,
    #[serde(default)]
    pub random_walk: RandomWalkConfig,
    #[serde(default)]
    pub generative: GenerativeConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            verbosity: Verbosity::default(),
            predictors: default_predictors(),
            split: SplitConfig::default(),
            spectral: SpectralConfig::default(),
            random_walk: RandomWalkConfig::default(),
            generative: GenerativeConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpectralConfig {
    #[serde(default = "default_spectral_dimensions")]
    pub dimensions: usize,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            dimensions: default_spectral_dimensions(),
        }
    }
}

/// node2vec walk bias and skip-gram training knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomWalkConfig {
    /// Return parameter. Large values discourage revisiting the previous node.
    #[serde(default = "default_one")]
    pub p: f64,
    /// In-out parameter. Large values keep walks local.
    #[serde(default = "default_one")]
    pub q: f64,
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_num_walks")]
    pub num_walks: usize,
    #[serde(default = "default_walk_length")]
    pub walk_length: usize,
    #[serde(default = "default_walk_dimensions")]
    pub dimensions: usize,
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Skip-gram passes over the walk corpus.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default = "default_negative_samples")]
    pub negative_samples: usize,
    #[serde(default = "default_walk_learning_rate")]
    pub learning_rate: f64,
}

impl Default for RandomWalkConfig {
    fn default() -> Self {
        Self {
            p: default_one(),
            q: default_one(),
            window_size: default_window_size(),
            num_walks: default_num_walks(),
            walk_length: default_walk_length(),
            dimensions: default_walk_dimensions(),
            workers: default_workers(),
            iterations: default_iterations(),
            negative_samples: default_negative_samples(),
            learning_rate: default_walk_learning_rate(),
        }
    }
}

/// Variational graph autoencoder knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerativeConfig {
    #[serde(default = "default_generative_learning_rate")]
    pub learning_rate: f64,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_hidden1_dim")]
    pub hidden1_dim: usize,
    #[serde(default = "default_hidden2_dim")]
    pub hidden2_dim: usize,
    /// Probability of dropping an encoder input unit.
    #[serde(default = "default_dropout")]
    pub dropout: f64,
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_generative_learning_rate(),
            epochs: default_epochs(),
            hidden1_dim: default_hidden1_dim(),
            hidden2_dim: default_hidden2_dim(),
            dropout: default_dropout(),
        }
    }
}

impl BenchConfig {
    /// Reject knobs no predictor can run with.
    ///
    /// # Errors
    ///
    /// Returns the split error from [`SplitConfig::validate`], or
    /// [`BenchError::InvalidPredictorConfig`] naming the offending knob.
    pub fn validate(&self) -> crate::error::Result<()> {
        self.split.validate(0)?;

        if self.predictors.is_empty() {
            return Err(invalid_knob("no predictors selected"));
        }
        if self.spectral.dimensions == 0 {
            return Err(invalid_knob("spectral.dimensions must be at least 1"));
        }

        let walk = &self.random_walk;
        if !(is_positive(walk.p) && is_positive(walk.q)) {
            return Err(invalid_knob(format!(
                "random_walk.p and random_walk.q must be positive (p={}, q={})",
                walk.p, walk.q
            )));
        }
        for (name, value) in [
            ("window_size", walk.window_size),
            ("num_walks", walk.num_walks),
            ("walk_length", walk.walk_length),
            ("dimensions", walk.dimensions),
            ("workers", walk.workers),
            ("iterations", walk.iterations),
        ] {
            if value == 0 {
                return Err(invalid_knob(format!("random_walk.{name} must be at least 1")));
            }
        }
        if !is_positive(walk.learning_rate) {
            return Err(invalid_knob(format!(
                "random_walk.learning_rate must be positive, got {}",
                walk.learning_rate
            )));
        }

        let generative = &self.generative;
        if !is_positive(generative.learning_rate) {
            return Err(invalid_knob(format!(
                "generative.learning_rate must be positive, got {}",
                generative.learning_rate
            )));
        }
        if generative.hidden1_dim == 0 || generative.hidden2_dim == 0 {
            return Err(invalid_knob("generative hidden dimensions must be at least 1"));
        }
        if !(0.0..1.0).contains(&generative.dropout) {
            return Err(invalid_knob(format!(
                "generative.dropout must be in [0, 1), got {}",
                generative.dropout
            )));
        }

        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn invalid_knob(reason: impl Into<String>) -> BenchError {
    BenchError::InvalidPredictorConfig {
        reason: reason.into(),
    }
}

/// Load a config file. A missing file yields defaults.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(path: &Path) -> Result<BenchConfig> {
    if !path.exists() {
        return Ok(BenchConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<BenchConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// First existing config among `./linkbench.toml` and the user config dir.
#[must_use]
pub fn discover_config(cwd: &Path) -> Option<PathBuf> {
    let local = cwd.join(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    let user = dirs::config_dir()?.join("linkbench/config.toml");
    user.exists().then_some(user)
}

/// Resolve and load the effective config: `explicit`, else discovery, else defaults.
///
/// # Errors
///
/// Returns an error if an explicit path does not exist or any chosen file
/// fails to parse.
pub fn resolve_config(explicit: Option<&Path>, cwd: &Path) -> Result<BenchConfig> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            load_config(path)
        }
        None => {
            discover_config(cwd).map_or_else(|| Ok(BenchConfig::default()), |p| load_config(&p))
        }
    }
}

fn default_predictors() -> Vec<PredictorKind> {
    PredictorKind::all()
}

const fn default_spectral_dimensions() -> usize {
    16
}

const fn default_one() -> f64 {
    1.0
}

const fn default_window_size() -> usize {
    10
}

const fn default_num_walks() -> usize {
    10
}

const fn default_walk_length() -> usize {
    80
}

const fn default_walk_dimensions() -> usize {
    128
}

const fn default_workers() -> usize {
    8
}

const fn default_iterations() -> usize {
    1
}

const fn default_negative_samples() -> usize {
    5
}

const fn default_walk_learning_rate() -> f64 {
    0.025
}

const fn default_generative_learning_rate() -> f64 {
    0.005
}

const fn default_epochs() -> usize {
    300
}

const fn default_hidden1_dim() -> usize {
    32
}

const fn default_hidden2_dim() -> usize {
    16
}

const fn default_dropout() -> f64 {
    0.1
}
