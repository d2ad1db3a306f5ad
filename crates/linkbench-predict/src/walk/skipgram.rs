//! Skip-gram with negative sampling over node walks.
//!
//! Nodes are the vocabulary. For each center node a window
//! `1..=window_size` is drawn, and every context node in it is trained as a
//! positive against `negative_samples` noise nodes drawn from the unigram
//! distribution raised to 0.75. The learning rate decays linearly to
//! `1e-4 · learning_rate` over the whole corpus.

use linkbench_core::config::RandomWalkConfig;
use linkbench_core::sigmoid;
use nalgebra::DMatrix;
use rand::{Rng, RngCore};
use tracing::debug;

const UNIGRAM_POWER: f64 = 0.75;
const MIN_ALPHA_FRACTION: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkipGramParams {
    pub dimensions: usize,
    pub window_size: usize,
    pub negative_samples: usize,
    pub iterations: usize,
    pub learning_rate: f64,
}

impl From<&RandomWalkConfig> for SkipGramParams {
    fn from(config: &RandomWalkConfig) -> Self {
        Self {
            dimensions: config.dimensions,
            window_size: config.window_size,
            negative_samples: config.negative_samples,
            iterations: config.iterations,
            learning_rate: config.learning_rate,
        }
    }
}

/// Cumulative noise distribution over nodes.
struct NoiseTable {
    cdf: Vec<f64>,
}

impl NoiseTable {
    #[allow(clippy::cast_precision_loss)]
    fn new(counts: &[usize]) -> Self {
        let mut total = 0.0;
        let cdf = counts
            .iter()
            .map(|&count| {
                total += (count as f64).powf(UNIGRAM_POWER);
                total
            })
            .collect();
        Self { cdf }
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        let total = *self.cdf.last()?;
        if total <= 0.0 {
            return None;
        }
        let target = rng.gen_range(0.0..total);
        Some(self.cdf.partition_point(|&c| c <= target).min(self.cdf.len() - 1))
    }
}

/// Row-major `node_count × dimensions` input vectors learned from `walks`.
#[allow(clippy::cast_precision_loss)]
pub fn train_skipgram(
    walks: &[Vec<usize>],
    node_count: usize,
    params: &SkipGramParams,
    rng: &mut dyn RngCore,
) -> DMatrix<f64> {
    let dim = params.dimensions;
    let window = params.window_size.max(1);

    let mut counts = vec![0usize; node_count];
    for &node in walks.iter().flatten() {
        counts[node] += 1;
    }
    let noise = NoiseTable::new(&counts);

    let scale = 1.0 / dim.max(1) as f64;
    let mut syn0: Vec<f64> = (0..node_count * dim)
        .map(|_| (rng.gen_range(0.0..1.0) - 0.5) * scale)
        .collect();
    let mut syn1 = vec![0.0; node_count * dim];
    let mut grad = vec![0.0; dim];

    let corpus_len: usize = walks.iter().map(Vec::len).sum();
    let total_words = (corpus_len * params.iterations).max(1) as f64;
    let min_alpha = params.learning_rate * MIN_ALPHA_FRACTION;
    let mut processed = 0usize;

    for iteration in 0..params.iterations {
        for walk in walks {
            let progress = processed as f64 / total_words;
            let alpha = (params.learning_rate * (1.0 - progress)).max(min_alpha);
            processed += walk.len();

            for (pos, &center) in walk.iter().enumerate() {
                let reach = rng.gen_range(1..=window);
                let lo = pos.saturating_sub(reach);
                let hi = (pos + reach + 1).min(walk.len());

                for (ctx_pos, &context) in walk.iter().enumerate().take(hi).skip(lo) {
                    if ctx_pos == pos {
                        continue;
                    }

                    grad.iter_mut().for_each(|g| *g = 0.0);
                    let input = center * dim..(center + 1) * dim;

                    update_pair(&syn0[input.clone()], &mut syn1, context, 1.0, alpha, &mut grad);
                    for _ in 0..params.negative_samples {
                        let Some(noise_node) = noise.sample(rng) else { break };
                        if noise_node == context {
                            continue;
                        }
                        let center_vec = &syn0[input.clone()];
                        update_pair(center_vec, &mut syn1, noise_node, 0.0, alpha, &mut grad);
                    }

                    for (w, g) in syn0[input].iter_mut().zip(&grad) {
                        *w += g;
                    }
                }
            }
        }
        debug!(iteration = iteration + 1, "skip-gram pass complete");
    }

    DMatrix::from_row_slice(node_count, dim, &syn0)
}

/// One logistic step for `(input, target)` with `label` 1 or 0.
///
/// Updates the target's output vector in place and accumulates the input gradient.
fn update_pair(
    input: &[f64],
    syn1: &mut [f64],
    target: usize,
    label: f64,
    alpha: f64,
    grad: &mut [f64],
) {
    let dim = input.len();
    let output = &mut syn1[target * dim..(target + 1) * dim];
    let dot: f64 = input.iter().zip(output.iter()).map(|(a, b)| a * b).sum();
    let g = alpha * (label - sigmoid(dot));

    for ((acc, out), &x) in grad.iter_mut().zip(output.iter_mut()).zip(input) {
        *acc += g * *out;
        *out += g * x;
    }
}
