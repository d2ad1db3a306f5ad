//! Graph, feature, and config arguments shared by `lpb run` and `lpb split`.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use linkbench_core::config::resolve_config;
use linkbench_core::parse::{parse_edge_list, parse_feature_matrix};
use linkbench_core::{Adjacency, BenchConfig, Verbosity};
use nalgebra::DMatrix;
use tracing::debug;

#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Edge list: one `u v` pair per line, `#` comments.
    #[arg(long, short = 'e')]
    pub edges: PathBuf,

    /// Node count. Defaults to one more than the largest node id.
    #[arg(long)]
    pub nodes: Option<usize>,

    /// Node feature file, one row of floats per node.
    #[arg(long)]
    pub features: Option<PathBuf>,

    /// Config file (default: ./linkbench.toml, then the user config dir).
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Fraction of edges held out for testing.
    #[arg(long)]
    pub test_frac: Option<f64>,

    /// Fraction of edges held out for validation.
    #[arg(long)]
    pub val_frac: Option<f64>,

    /// Seed for the split and every predictor.
    #[arg(long)]
    pub seed: Option<u64>,

    /// 0 silent, 1 final metrics, 2 per-epoch progress.
    #[arg(long, short = 'v', value_parser = clap::value_parser!(u8).range(0..=2))]
    pub verbosity: Option<u8>,

    /// Only hold out edges whose removal keeps their endpoints connected.
    #[arg(long)]
    pub prevent_disconnect: bool,
}

impl InputArgs {
    /// Resolve the config file and apply flag overrides on top of it.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded or the result is invalid.
    pub fn config(&self, cwd: &Path) -> Result<BenchConfig> {
        let mut config = resolve_config(self.config.as_deref(), cwd)?;
        self.apply_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut BenchConfig) -> Result<()> {
        if let Some(test_frac) = self.test_frac {
            config.split.test_fraction = test_frac;
        }
        if let Some(val_frac) = self.val_frac {
            config.split.val_fraction = val_frac;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(level) = self.verbosity {
            config.verbosity = Verbosity::try_from(level).map_err(anyhow::Error::msg)?;
        }
        if self.prevent_disconnect {
            config.split.prevent_disconnect = true;
        }
        Ok(())
    }

    /// Read the edge list.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsed.
    pub fn load_graph(&self) -> Result<Adjacency> {
        let file = File::open(&self.edges)
            .with_context(|| format!("Failed to open edge list {}", self.edges.display()))?;
        let graph = parse_edge_list(BufReader::new(file), self.nodes)
            .with_context(|| format!("Failed to parse edge list {}", self.edges.display()))?;
        debug!(nodes = graph.node_count(), edges = graph.edge_count(), "edge list loaded");
        Ok(graph)
    }

    /// Read the feature matrix, if one was given.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsed, or its row
    /// count differs from `node_count`.
    pub fn load_features(&self, node_count: usize) -> Result<Option<DMatrix<f64>>> {
        let Some(path) = &self.features else {
            return Ok(None);
        };
        let file = File::open(path)
            .with_context(|| format!("Failed to open feature file {}", path.display()))?;
        let features = parse_feature_matrix(BufReader::new(file), node_count)
            .with_context(|| format!("Failed to parse feature file {}", path.display()))?;
        Ok(Some(features))
    }
}
