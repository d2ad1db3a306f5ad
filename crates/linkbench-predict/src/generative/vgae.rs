//! Variational graph autoencoder with full-batch gradients.
//!
//! Encoder: `H = relu(Â X W0)`, `μ = Â H Wμ`, `log σ = Â H Wσ`, with
//! dropout on the inputs of each layer. Decoder: `sigmoid(Z Zᵀ)` for
//! `Z = μ + ε ∘ σ`, `ε ~ N(0, 1)`.
//!
//! The reconstruction target is `A + I` of the training graph. Positive
//! entries are up-weighted by `pos_weight = (N² − 2E) / 2E` and the loss is
//! scaled by `norm = N² / (2 (N² − 2E))`. The KL term
//! `0.5 / N² · Σ (1 + 2 log σ − μ² − σ²)` is subtracted.

use linkbench_core::Adjacency;
use linkbench_core::config::GenerativeConfig;
use nalgebra::DMatrix;
use rand::{Rng, RngCore};
use rand_distr::StandardNormal;

use super::{EpochStats, GraphAutoencoder, normalize_adjacency};

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-8;

/// Adam state for one weight matrix.
#[derive(Debug, Clone)]
struct Adam {
    learning_rate: f64,
    m: DMatrix<f64>,
    v: DMatrix<f64>,
    t: i32,
}

impl Adam {
    fn new(learning_rate: f64, shape: (usize, usize)) -> Self {
        Self {
            learning_rate,
            m: DMatrix::zeros(shape.0, shape.1),
            v: DMatrix::zeros(shape.0, shape.1),
            t: 0,
        }
    }

    fn step(&mut self, weights: &mut DMatrix<f64>, grad: &DMatrix<f64>) {
        self.t = self.t.saturating_add(1);
        let bias1 = 1.0 - BETA1.powi(self.t);
        let bias2 = 1.0 - BETA2.powi(self.t);

        for ((w, &g), (m, v)) in weights
            .iter_mut()
            .zip(grad.iter())
            .zip(self.m.iter_mut().zip(self.v.iter_mut()))
        {
            *m = BETA1.mul_add(*m, (1.0 - BETA1) * g);
            *v = BETA2.mul_add(*v, (1.0 - BETA2) * g * g);
            let m_hat = *m / bias1;
            let v_hat = *v / bias2;
            *w -= self.learning_rate * m_hat / (v_hat.sqrt() + EPSILON);
        }
    }
}

/// Gradients of the loss with respect to each weight matrix.
#[derive(Debug, Clone)]
struct Gradients {
    hidden: DMatrix<f64>,
    mean: DMatrix<f64>,
    log_std: DMatrix<f64>,
}

/// Sampled randomness for one epoch. `None` masks mean "keep everything".
struct EpochNoise {
    input_mask: Option<DMatrix<f64>>,
    hidden_mask: Option<DMatrix<f64>>,
    epsilon: DMatrix<f64>,
}

#[derive(Debug, Clone)]
pub struct Vgae {
    propagation: DMatrix<f64>,
    features: DMatrix<f64>,
    labels: DMatrix<f64>,
    pos_weight: f64,
    norm: f64,
    keep: f64,
    w_hidden: DMatrix<f64>,
    w_mean: DMatrix<f64>,
    w_log_std: DMatrix<f64>,
    adam: [Adam; 3],
}

/// Glorot-uniform `rows × cols` weights.
#[allow(clippy::cast_precision_loss)]
fn glorot<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> DMatrix<f64> {
    let range = (6.0 / (rows + cols).max(1) as f64).sqrt();
    DMatrix::from_fn(rows, cols, |_, _| rng.gen_range(-range..=range))
}

/// Inverted dropout mask with entries `0` or `1 / keep`.
fn dropout_mask<R: Rng + ?Sized>(
    rows: usize,
    cols: usize,
    keep: f64,
    rng: &mut R,
) -> Option<DMatrix<f64>> {
    if keep >= 1.0 {
        return None;
    }
    let scale = 1.0 / keep;
    Some(DMatrix::from_fn(rows, cols, |_, _| {
        if rng.gen_bool(keep) { scale } else { 0.0 }
    }))
}

/// Numerically stable `ln(1 + eˣ)`.
fn softplus(x: f64) -> f64 {
    x.max(0.0) + (-x.abs()).exp().ln_1p()
}

/// `(pos_weight, norm)` for a graph with `node_count` nodes and `edge_count` edges.
#[allow(clippy::cast_precision_loss)]
pub fn reconstruction_weights(node_count: usize, edge_count: usize) -> (f64, f64) {
    let cells = (node_count * node_count) as f64;
    let positives = (2 * edge_count) as f64;
    let negatives = cells - positives;
    let pos_weight = if positives > 0.0 { negatives / positives } else { 1.0 };
    let norm = if negatives > 0.0 { cells / (negatives * 2.0) } else { 1.0 };
    (pos_weight, norm)
}

impl Vgae {
    /// Initialize a model for `adjacency` with one row of `features` per node.
    pub fn new(
        adjacency: &Adjacency,
        features: DMatrix<f64>,
        config: &GenerativeConfig,
        rng: &mut dyn RngCore,
    ) -> Self {
        let n = adjacency.node_count();
        let (pos_weight, norm) = reconstruction_weights(n, adjacency.edge_count());
        let labels = adjacency.to_dense() + DMatrix::identity(n, n);

        let input_dim = features.ncols();
        let w_hidden = glorot(input_dim, config.hidden1_dim, rng);
        let w_mean = glorot(config.hidden1_dim, config.hidden2_dim, rng);
        let w_log_std = glorot(config.hidden1_dim, config.hidden2_dim, rng);
        let adam = [
            Adam::new(config.learning_rate, w_hidden.shape()),
            Adam::new(config.learning_rate, w_mean.shape()),
            Adam::new(config.learning_rate, w_log_std.shape()),
        ];

        Self {
            propagation: normalize_adjacency(adjacency),
            features,
            labels,
            pos_weight,
            norm,
            keep: (1.0 - config.dropout).clamp(f64::EPSILON, 1.0),
            w_hidden,
            w_mean,
            w_log_std,
            adam,
        }
    }

    fn sample_noise(&self, rng: &mut dyn RngCore) -> EpochNoise {
        let n = self.features.nrows();
        EpochNoise {
            input_mask: dropout_mask(n, self.features.ncols(), self.keep, rng),
            hidden_mask: dropout_mask(n, self.w_hidden.ncols(), self.keep, rng),
            epsilon: DMatrix::from_fn(n, self.w_mean.ncols(), |_, _| rng.sample(StandardNormal)),
        }
    }

    /// Loss, accuracy, and weight gradients under fixed `noise`.
    #[allow(clippy::cast_precision_loss)]
    fn forward_backward(&self, noise: &EpochNoise) -> (EpochStats, Gradients) {
        let n = self.features.nrows();
        let cells = (n * n).max(1) as f64;

        let dropped_input = match &noise.input_mask {
            Some(mask) => self.features.component_mul(mask),
            None => self.features.clone(),
        };
        let propagated_input = &self.propagation * dropped_input;
        let pre_hidden = &propagated_input * &self.w_hidden;
        let hidden = pre_hidden.map(|x| x.max(0.0));
        let dropped_hidden = match &noise.hidden_mask {
            Some(mask) => hidden.component_mul(mask),
            None => hidden,
        };
        let propagated_hidden = &self.propagation * dropped_hidden;

        let mean = &propagated_hidden * &self.w_mean;
        let log_std = &propagated_hidden * &self.w_log_std;
        let std = log_std.map(f64::exp);
        let spread = noise.epsilon.component_mul(&std);
        let z = &mean + &spread;
        let logits = &z * z.transpose();

        // Reconstruction loss and its gradient with respect to the logits.
        let mut recon = 0.0;
        let mut correct = 0usize;
        let mut logit_grad = DMatrix::zeros(n, n);
        for j in 0..n {
            for i in 0..n {
                let x = logits[(i, j)];
                let y = self.labels[(i, j)];
                recon += self.pos_weight * y * softplus(-x) + (1.0 - y) * softplus(x);
                let p = linkbench_core::sigmoid(x);
                logit_grad[(i, j)] =
                    self.norm / cells * ((1.0 - y) * p - self.pos_weight * y * (1.0 - p));
                if (p >= 0.5) == (y > 0.5) {
                    correct += 1;
                }
            }
        }
        let cost = self.norm * recon / cells;

        let kl_sum: f64 = mean
            .iter()
            .zip(log_std.iter())
            .map(|(&mu, &s)| 1.0 + 2.0 * s - mu * mu - (2.0 * s).exp())
            .sum();
        let kl = 0.5 / cells * kl_sum;

        let z_grad = (&logit_grad + logit_grad.transpose()) * &z;
        let mean_grad = &z_grad + &mean / cells;
        let log_std_grad = z_grad.component_mul(&spread)
            + log_std.map(|s| ((2.0 * s).exp() - 1.0) / cells);

        let grad_mean_w = propagated_hidden.tr_mul(&mean_grad);
        let grad_log_std_w = propagated_hidden.tr_mul(&log_std_grad);

        let propagated_hidden_grad = &mean_grad * self.w_mean.transpose()
            + &log_std_grad * self.w_log_std.transpose();
        let mut hidden_grad = &self.propagation * propagated_hidden_grad;
        if let Some(mask) = &noise.hidden_mask {
            hidden_grad.component_mul_assign(mask);
        }
        let pre_hidden_grad =
            hidden_grad.zip_map(&pre_hidden, |g, x| if x > 0.0 { g } else { 0.0 });
        let grad_hidden_w = propagated_input.tr_mul(&pre_hidden_grad);

        let stats = EpochStats {
            loss: cost - kl,
            accuracy: correct as f64 / cells,
        };
        let grads = Gradients {
            hidden: grad_hidden_w,
            mean: grad_mean_w,
            log_std: grad_log_std_w,
        };
        (stats, grads)
    }
}

impl GraphAutoencoder for Vgae {
    fn train_epoch(&mut self, rng: &mut dyn RngCore) -> EpochStats {
        let noise = self.sample_noise(rng);
        let (stats, grads) = self.forward_backward(&noise);

        let [hidden, mean, log_std] = &mut self.adam;
        hidden.step(&mut self.w_hidden, &grads.hidden);
        mean.step(&mut self.w_mean, &grads.mean);
        log_std.step(&mut self.w_log_std, &grads.log_std);

        stats
    }

    fn latent_mean(&self) -> DMatrix<f64> {
        let hidden = (&self.propagation * &self.features * &self.w_hidden).map(|x| x.max(0.0));
        &self.propagation * hidden * &self.w_mean
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generative::identity_features;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn two_cliques() -> Adjacency {
        let mut pairs = Vec::new();
        for offset in [0, 5] {
            for a in 0..5 {
                for b in (a + 1)..5 {
                    pairs.push((offset + a, offset + b));
                }
            }
        }
        pairs.push((4, 5));
        Adjacency::from_edges(10, pairs).expect("valid")
    }

    fn config(dropout: f64) -> GenerativeConfig {
        GenerativeConfig {
            learning_rate: 0.01,
            epochs: 200,
            hidden1_dim: 16,
            hidden2_dim: 8,
            dropout,
        }
    }

    fn weight_mut(model: &mut Vgae, which: usize) -> &mut DMatrix<f64> {
        match which {
            0 => &mut model.w_hidden,
            1 => &mut model.w_mean,
            _ => &mut model.w_log_std,
        }
    }

    #[test]
    fn reconstruction_weights_balance_classes() {
        // 4 nodes, 2 edges: 4 positive cells out of 16.
        let (pos_weight, norm) = reconstruction_weights(4, 2);
        assert!((pos_weight - 3.0).abs() < 1e-12);
        assert!((norm - 16.0 / 24.0).abs() < 1e-12);
        assert_eq!(reconstruction_weights(3, 0).0, 1.0);
    }

    #[test]
    fn analytic_gradients_match_finite_differences() {
        let g = two_cliques();
        let mut rng = StdRng::seed_from_u64(11);
        let mut model = Vgae::new(&g, identity_features(10), &config(0.0), &mut rng);
        let noise = model.sample_noise(&mut rng);
        assert!(noise.input_mask.is_none() && noise.hidden_mask.is_none());

        let (_, grads) = model.forward_backward(&noise);
        let h = 1e-6;
        let checks: [(usize, usize, usize); 6] =
            [(0, 0, 0), (0, 3, 7), (1, 2, 1), (1, 9, 4), (2, 0, 5), (2, 15, 2)];
        for (which, row, col) in checks {
            let analytic = match which {
                0 => grads.hidden[(row, col)],
                1 => grads.mean[(row, col)],
                _ => grads.log_std[(row, col)],
            };
            let original = weight_mut(&mut model, which)[(row, col)];
            weight_mut(&mut model, which)[(row, col)] = original + h;
            let (up, _) = model.forward_backward(&noise);
            weight_mut(&mut model, which)[(row, col)] = original - h;
            let (down, _) = model.forward_backward(&noise);
            weight_mut(&mut model, which)[(row, col)] = original;

            let numeric = (up.loss - down.loss) / (2.0 * h);
            let scale = analytic.abs().max(numeric.abs());
            assert!(
                (analytic - numeric).abs() < 1e-6 + 1e-3 * scale,
                "weight {which} ({row}, {col}): analytic {analytic}, numeric {numeric}"
            );
        }
    }

    #[test]
    fn training_reduces_loss() {
        let g = two_cliques();
        let mut rng = StdRng::seed_from_u64(3);
        let mut model = Vgae::new(&g, identity_features(10), &config(0.0), &mut rng);
        let first = model.train_epoch(&mut rng);
        let mut last = first;
        for _ in 0..199 {
            last = model.train_epoch(&mut rng);
        }
        assert!(last.loss < first.loss, "loss went from {} to {}", first.loss, last.loss);
        assert!(last.accuracy > 0.5);
    }

    #[test]
    fn latent_mean_is_deterministic_and_shaped() {
        let g = two_cliques();
        let mut rng = StdRng::seed_from_u64(5);
        let mut model = Vgae::new(&g, identity_features(10), &config(0.3), &mut rng);
        model.train_epoch(&mut rng);
        let a = model.latent_mean();
        assert_eq!(a.shape(), (10, 8));
        assert_eq!(a, model.latent_mean());
        assert!(a.iter().all(|x| x.is_finite()));
    }
}
