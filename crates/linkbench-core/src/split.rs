//! Train/validation/test edge masking.
//!
//! # Overview
//!
//! [`split_edges`] hides a fraction of a graph's edges and pairs every
//! held-out (and training) positive set with an equally sized set of sampled
//! non-edges. Predictors only ever see [`EdgeSplit::train_adjacency`].
//!
//! # Algorithm
//!
//! 1. Enumerate each unordered edge once (upper triangle).
//! 2. Shuffle with the caller's RNG.
//! 3. Take `floor(test_fraction * E)` test edges, then
//!    `floor(val_fraction * E)` validation edges; the rest train. With
//!    [`SplitConfig::prevent_disconnect`], an edge is only held out when its
//!    endpoints stay connected without it.
//! 4. Remove held-out edges from the adjacency in both directions.
//! 5. Sample negatives for test, then validation, then train. A candidate is
//!    rejected if it is a self-pair, an edge of the ORIGINAL graph, or already
//!    taken by any negative set.
//!
//! # Guarantees
//!
//! - Positive sets partition the original edge set.
//! - Negative sets are pairwise disjoint and never contain an original edge.
//! - Identical input, config, and RNG state give an identical split.
//!
//! Random sampling is bounded by
//! `max(MIN_SAMPLING_ATTEMPTS, target * max_sampling_attempts_factor)` draws.
//! When that budget runs out, the remaining free pairs are enumerated and
//! sampled directly, so a dense graph only fails when it truly lacks
//! non-edges.

use std::collections::HashMap;
use std::fmt;

use petgraph::algo::has_path_connecting;
use petgraph::stable_graph::{EdgeIndex as GraphEdge, NodeIndex, StableUnGraph};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::adjacency::Adjacency;
use crate::edge::{Edge, EdgeIndex};
use crate::error::{BenchError, Result};

/// Floor for the random-draw budget of a single negative set.
pub const MIN_SAMPLING_ATTEMPTS: usize = 1_000;

/// Largest pair space the enumeration fallback will materialize.
const ENUMERATION_LIMIT: usize = 25_000_000;

/// One of the three evaluation partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Train,
    Val,
    Test,
}

impl Partition {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Val => "val",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Knobs for [`split_edges`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of edges held out for testing.
    pub test_fraction: f64,
    /// Fraction of edges held out for validation.
    pub val_fraction: f64,
    /// Train negatives per train positive.
    pub train_negative_ratio: f64,
    /// Only hold out edges whose removal keeps their endpoints connected.
    pub prevent_disconnect: bool,
    /// Random draws allowed per requested negative before enumeration.
    pub max_sampling_attempts_factor: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.3,
            val_fraction: 0.1,
            train_negative_ratio: 1.0,
            prevent_disconnect: false,
            max_sampling_attempts_factor: 50,
        }
    }
}

impl SplitConfig {
    fn invalid(&self, reason: impl Into<String>, edge_count: usize) -> BenchError {
        BenchError::InvalidSplitConfiguration {
            reason: reason.into(),
            test_fraction: self.test_fraction,
            val_fraction: self.val_fraction,
            edge_count,
        }
    }

    /// Check the fractions and ratio without looking at a graph.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::InvalidSplitConfiguration`] if a fraction is
    /// outside `[0, 1)`, the fractions sum to 1 or more, or the negative
    /// ratio is negative or not finite.
    pub fn validate(&self, edge_count: usize) -> Result<()> {
        for (name, fraction) in [
            ("test_fraction", self.test_fraction),
            ("val_fraction", self.val_fraction),
        ] {
            if !fraction.is_finite() || !(0.0..1.0).contains(&fraction) {
                return Err(self.invalid(format!("{name} must be in [0, 1)"), edge_count));
            }
        }

        if self.test_fraction + self.val_fraction >= 1.0 {
            return Err(self.invalid(
                "test_fraction + val_fraction leaves no training edges",
                edge_count,
            ));
        }

        if !self.train_negative_ratio.is_finite() || self.train_negative_ratio < 0.0 {
            return Err(self.invalid(
                format!(
                    "train_negative_ratio must be a non-negative number, got {}",
                    self.train_negative_ratio
                ),
                edge_count,
            ));
        }

        Ok(())
    }

    /// Number of `(test, val)` positives requested for a graph with `edge_count` edges.
    ///
    /// # Errors
    ///
    /// Returns [`BenchError::InvalidSplitConfiguration`] if the config is
    /// invalid, the graph has no edges, or the held-out sets would consume
    /// every edge.
    pub fn held_out_counts(&self, edge_count: usize) -> Result<(usize, usize)> {
        self.validate(edge_count)?;

        if edge_count == 0 {
            return Err(self.invalid("graph has no edges", edge_count));
        }

        let test = fraction_of(self.test_fraction, edge_count);
        let val = fraction_of(self.val_fraction, edge_count);
        if test + val >= edge_count {
            return Err(self.invalid(
                format!("{test} test + {val} validation edges leave no training edges"),
                edge_count,
            ));
        }

        Ok((test, val))
    }
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn fraction_of(fraction: f64, total: usize) -> usize {
    (fraction * total as f64).floor() as usize
}

/// The output of [`split_edges`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSplit {
    /// Original graph minus every test and validation positive.
    pub train_adjacency: Adjacency,
    pub train_pos: Vec<Edge>,
    pub train_neg: Vec<Edge>,
    pub val_pos: Vec<Edge>,
    pub val_neg: Vec<Edge>,
    pub test_pos: Vec<Edge>,
    pub test_neg: Vec<Edge>,
}

impl EdgeSplit {
    #[must_use]
    pub fn positives(&self, partition: Partition) -> &[Edge] {
        match partition {
            Partition::Train => &self.train_pos,
            Partition::Val => &self.val_pos,
            Partition::Test => &self.test_pos,
        }
    }

    #[must_use]
    pub fn negatives(&self, partition: Partition) -> &[Edge] {
        match partition {
            Partition::Train => &self.train_neg,
            Partition::Val => &self.val_neg,
            Partition::Test => &self.test_neg,
        }
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.train_adjacency.node_count()
    }

    #[must_use]
    pub fn summary(&self) -> SplitSummary {
        SplitSummary {
            nodes: self.node_count(),
            edges: self.train_pos.len() + self.val_pos.len() + self.test_pos.len(),
            train_pos: self.train_pos.len(),
            train_neg: self.train_neg.len(),
            val_pos: self.val_pos.len(),
            val_neg: self.val_neg.len(),
            test_pos: self.test_pos.len(),
            test_neg: self.test_neg.len(),
        }
    }
}

/// Set sizes of an [`EdgeSplit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSummary {
    pub nodes: usize,
    pub edges: usize,
    pub train_pos: usize,
    pub train_neg: usize,
    pub val_pos: usize,
    pub val_neg: usize,
    pub test_pos: usize,
    pub test_neg: usize,
}

/// Split `adjacency` into train/validation/test positives and negatives.
///
/// # Errors
///
/// - [`BenchError::InvalidSplitConfiguration`] for bad fractions, a graph
///   without edges, or held-out sets that leave no training edges.
/// - [`BenchError::NegativeSamplingExhausted`] if the graph lacks enough
///   non-edges for the test or validation negatives.
#[instrument(
    skip(adjacency, rng),
    fields(nodes = adjacency.node_count(), edges = adjacency.edge_count())
)]
pub fn split_edges<R: Rng + ?Sized>(
    adjacency: &Adjacency,
    config: &SplitConfig,
    rng: &mut R,
) -> Result<EdgeSplit> {
    let (test_count, val_count) = config.held_out_counts(adjacency.edge_count())?;

    let mut edges: Vec<Edge> = adjacency.edges().collect();
    edges.shuffle(rng);

    let held = if config.prevent_disconnect {
        hold_out_connected(adjacency.node_count(), &edges, test_count, val_count)
    } else {
        hold_out_prefix(&edges, test_count, val_count)
    };

    if held.test.len() < test_count || held.val.len() < val_count {
        warn!(
            requested_test = test_count,
            held_test = held.test.len(),
            requested_val = val_count,
            held_val = held.val.len(),
            "not enough removable edges to hold out without disconnecting the graph"
        );
    }

    let mut removed = Vec::with_capacity(held.test.len() + held.val.len());
    removed.extend_from_slice(&held.test);
    removed.extend_from_slice(&held.val);
    let train_adjacency = adjacency.without_edges(&removed);

    let positives = adjacency.edge_index();
    let mut sampler =
        NegativeSampler::new(adjacency, &positives, config.max_sampling_attempts_factor);

    let test_neg = sampler.draw(Partition::Test, held.test.len(), rng)?;
    let val_neg = sampler.draw(Partition::Val, held.val.len(), rng)?;

    let requested_train = scaled_count(config.train_negative_ratio, held.train.len());
    let train_target = requested_train.min(sampler.available());
    if train_target < requested_train {
        warn!(
            requested = requested_train,
            available = train_target,
            "graph is too dense for the requested train negatives; using every remaining non-edge"
        );
    }
    let train_neg = sampler.draw(Partition::Train, train_target, rng)?;

    let split = EdgeSplit {
        train_adjacency,
        train_pos: held.train,
        train_neg,
        val_pos: held.val,
        val_neg,
        test_pos: held.test,
        test_neg,
    };

    debug!(summary = ?split.summary(), "edge split complete");
    Ok(split)
}

/// [`split_edges`] driven by a fresh `StdRng` seeded with `seed`.
///
/// # Errors
///
/// Same as [`split_edges`].
pub fn split_edges_seeded(
    adjacency: &Adjacency,
    config: &SplitConfig,
    seed: u64,
) -> Result<EdgeSplit> {
    let mut rng = StdRng::seed_from_u64(seed);
    split_edges(adjacency, config, &mut rng)
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn scaled_count(ratio: f64, count: usize) -> usize {
    (ratio * count as f64).round() as usize
}

struct HeldOut {
    test: Vec<Edge>,
    val: Vec<Edge>,
    train: Vec<Edge>,
}

fn hold_out_prefix(shuffled: &[Edge], test_count: usize, val_count: usize) -> HeldOut {
    let (test, rest) = shuffled.split_at(test_count);
    let (val, train) = rest.split_at(val_count);
    HeldOut {
        test: test.to_vec(),
        val: val.to_vec(),
        train: train.to_vec(),
    }
}

fn hold_out_connected(
    node_count: usize,
    shuffled: &[Edge],
    test_count: usize,
    val_count: usize,
) -> HeldOut {
    let mut guard = ConnectivityGuard::new(node_count, shuffled);
    let mut held = HeldOut {
        test: Vec::with_capacity(test_count),
        val: Vec::with_capacity(val_count),
        train: Vec::with_capacity(shuffled.len()),
    };

    for &edge in shuffled {
        let wants_more = held.test.len() < test_count || held.val.len() < val_count;
        if !wants_more || !guard.try_remove(edge) {
            held.train.push(edge);
        } else if held.test.len() < test_count {
            held.test.push(edge);
        } else {
            held.val.push(edge);
        }
    }

    held
}

/// Live copy of the graph used to refuse removals that would split a component.
struct ConnectivityGuard {
    graph: StableUnGraph<(), ()>,
    handles: HashMap<Edge, GraphEdge>,
}

impl ConnectivityGuard {
    fn new(node_count: usize, edges: &[Edge]) -> Self {
        let mut graph = StableUnGraph::with_capacity(node_count, edges.len());
        for _ in 0..node_count {
            graph.add_node(());
        }

        let handles = edges
            .iter()
            .map(|&edge| {
                let handle = graph.add_edge(NodeIndex::new(edge.u()), NodeIndex::new(edge.v()), ());
                (edge, handle)
            })
            .collect();

        Self { graph, handles }
    }

    /// Remove `edge` if its endpoints remain connected without it.
    fn try_remove(&mut self, edge: Edge) -> bool {
        let Some(handle) = self.handles.remove(&edge) else {
            return false;
        };
        self.graph.remove_edge(handle);

        let a = NodeIndex::new(edge.u());
        let b = NodeIndex::new(edge.v());
        if has_path_connecting(&self.graph, a, b, None) {
            return true;
        }

        let handle = self.graph.add_edge(a, b, ());
        self.handles.insert(edge, handle);
        false
    }
}

/// Rejection sampler over non-edges with cross-split exclusivity.
struct NegativeSampler<'a> {
    node_count: usize,
    positives: &'a EdgeIndex,
    taken: EdgeIndex,
    attempts_factor: usize,
    non_edge_total: usize,
}

impl<'a> NegativeSampler<'a> {
    fn new(adjacency: &Adjacency, positives: &'a EdgeIndex, attempts_factor: usize) -> Self {
        Self {
            node_count: adjacency.node_count(),
            positives,
            taken: EdgeIndex::new(),
            attempts_factor,
            non_edge_total: adjacency.non_edge_count(),
        }
    }

    /// Non-edges not yet claimed by any negative set.
    fn available(&self) -> usize {
        self.non_edge_total.saturating_sub(self.taken.len())
    }

    fn is_free(&self, edge: Edge) -> bool {
        !self.positives.contains(edge) && !self.taken.contains(edge)
    }

    fn draw<R: Rng + ?Sized>(
        &mut self,
        partition: Partition,
        target: usize,
        rng: &mut R,
    ) -> Result<Vec<Edge>> {
        if target == 0 {
            return Ok(Vec::new());
        }

        let available = self.available();
        if target > available {
            return Err(BenchError::NegativeSamplingExhausted {
                partition,
                requested: target,
                found: available,
                attempts: 0,
            });
        }

        let budget = target
            .saturating_mul(self.attempts_factor)
            .max(MIN_SAMPLING_ATTEMPTS);
        let mut out = Vec::with_capacity(target);
        let mut attempts = 0usize;

        while out.len() < target && attempts < budget {
            attempts += 1;
            let a = rng.gen_range(0..self.node_count);
            let b = rng.gen_range(0..self.node_count);
            let Some(edge) = Edge::new(a, b) else {
                continue;
            };
            if self.is_free(edge) {
                self.taken.insert(edge);
                out.push(edge);
            }
        }

        if out.len() < target {
            debug!(
                partition = %partition,
                found = out.len(),
                target,
                attempts,
                "random draw budget spent; enumerating remaining non-edges"
            );
            self.fill_by_enumeration(partition, target, attempts, &mut out, rng)?;
        }

        Ok(out)
    }

    fn fill_by_enumeration<R: Rng + ?Sized>(
        &mut self,
        partition: Partition,
        target: usize,
        attempts: usize,
        out: &mut Vec<Edge>,
        rng: &mut R,
    ) -> Result<()> {
        let n = self.node_count;
        let exhausted = |found: usize| BenchError::NegativeSamplingExhausted {
            partition,
            requested: target,
            found,
            attempts,
        };

        if n * n.saturating_sub(1) / 2 > ENUMERATION_LIMIT {
            return Err(exhausted(out.len()));
        }

        let mut free: Vec<Edge> = (0..n)
            .flat_map(|u| ((u + 1)..n).filter_map(move |v| Edge::new(u, v)))
            .filter(|&edge| self.is_free(edge))
            .collect();

        let missing = target - out.len();
        if free.len() < missing {
            return Err(exhausted(out.len() + free.len()));
        }

        let (chosen, _) = free.partial_shuffle(rng, missing);
        for &edge in chosen.iter() {
            self.taken.insert(edge);
            out.push(edge);
        }

        Ok(())
    }
}
