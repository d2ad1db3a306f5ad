//! Second-order biased random walks.
//!
//! The first step from a start node is uniform over its neighbors. After
//! that, stepping from `cur` (having arrived from `prev`) to neighbor `x` has
//! unnormalized weight:
//!
//! - `1 / p` if `x == prev`
//! - `1` if `x` is also a neighbor of `prev`
//! - `1 / q` otherwise
//!
//! Walks stop early at isolated nodes. Each round shuffles the start order,
//! then fans the starts out over up to `workers` scoped threads. Every walk
//! gets its own RNG seeded from `(round key, start node)`, so the corpus is
//! identical for any worker count.

use linkbench_core::config::RandomWalkConfig;
use linkbench_core::{Adjacency, Verbosity};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use tracing::{debug, info, instrument};

/// Walk bias and corpus shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkParams {
    pub p: f64,
    pub q: f64,
    pub num_walks: usize,
    pub walk_length: usize,
    pub workers: usize,
}

impl From<&RandomWalkConfig> for WalkParams {
    fn from(config: &RandomWalkConfig) -> Self {
        Self {
            p: config.p,
            q: config.q,
            num_walks: config.num_walks,
            walk_length: config.walk_length,
            workers: config.workers,
        }
    }
}

/// `num_walks` rounds of one walk per node.
#[instrument(skip(adjacency, rng), fields(nodes = adjacency.node_count()))]
pub fn simulate_walks(
    adjacency: &Adjacency,
    params: &WalkParams,
    verbosity: Verbosity,
    rng: &mut dyn RngCore,
) -> Vec<Vec<usize>> {
    let n = adjacency.node_count();
    let workers = params.workers.max(1);
    let chunk = n.div_ceil(workers).max(1);

    let mut starts: Vec<usize> = (0..n).collect();
    let mut walks = Vec::with_capacity(n * params.num_walks);

    for round in 0..params.num_walks {
        if verbosity.reports_progress() {
            info!(iteration = round + 1, of = params.num_walks, "walk iteration");
        } else {
            debug!(iteration = round + 1, of = params.num_walks, "walk iteration");
        }

        starts.shuffle(rng);
        let round_key = rng.next_u64();

        std::thread::scope(|scope| {
            let handles: Vec<_> = starts
                .chunks(chunk)
                .map(|batch| {
                    scope.spawn(move || {
                        batch
                            .iter()
                            .map(|&start| {
                                let seed = walk_seed(round_key, start);
                                let mut walk_rng = StdRng::seed_from_u64(seed);
                                walk_from(adjacency, start, params, &mut walk_rng)
                            })
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            for handle in handles {
                let batch = handle
                    .join()
                    .unwrap_or_else(|payload| std::panic::resume_unwind(payload));
                walks.extend(batch);
            }
        });
    }

    walks
}

/// splitmix64 over the round key and start node.
fn walk_seed(round_key: u64, start: usize) -> u64 {
    let mut z = round_key ^ (start as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// One walk of at most `walk_length` nodes starting at `start`.
pub fn walk_from<R: Rng + ?Sized>(
    adjacency: &Adjacency,
    start: usize,
    params: &WalkParams,
    rng: &mut R,
) -> Vec<usize> {
    let mut walk = Vec::with_capacity(params.walk_length.max(1));
    walk.push(start);
    let mut weights = Vec::new();

    while walk.len() < params.walk_length {
        let cur = walk[walk.len() - 1];
        let neighbors = adjacency.neighbors(cur);
        if neighbors.is_empty() {
            break;
        }

        let next = if walk.len() == 1 {
            neighbors[rng.gen_range(0..neighbors.len())]
        } else {
            let prev = walk[walk.len() - 2];
            weights.clear();
            weights.extend(neighbors.iter().map(|&x| {
                if x == prev {
                    1.0 / params.p
                } else if adjacency.has_edge(x, prev) {
                    1.0
                } else {
                    1.0 / params.q
                }
            }));
            sample_cdf(neighbors, &weights, rng)
        };
        walk.push(next);
    }

    walk
}

fn sample_cdf<R: Rng + ?Sized>(items: &[usize], weights: &[f64], rng: &mut R) -> usize {
    let total: f64 = weights.iter().sum();
    let mut target = rng.gen_range(0.0..total);
    for (&item, &weight) in items.iter().zip(weights) {
        if target < weight {
            return item;
        }
        target -= weight;
    }
    items[items.len() - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(n: usize) -> Adjacency {
        Adjacency::from_edges(n, (0..n).map(|i| (i, (i + 1) % n))).expect("valid ring")
    }

    fn params(workers: usize) -> WalkParams {
        WalkParams {
            p: 1.0,
            q: 1.0,
            num_walks: 3,
            walk_length: 12,
            workers,
        }
    }

    #[test]
    fn walks_follow_edges() {
        let g = ring(8);
        let mut rng = StdRng::seed_from_u64(1);
        let walks = simulate_walks(&g, &params(2), Verbosity::Silent, &mut rng);
        assert_eq!(walks.len(), 24);
        for walk in &walks {
            assert_eq!(walk.len(), 12);
            for pair in walk.windows(2) {
                assert!(g.has_edge(pair[0], pair[1]));
            }
        }
    }

    #[test]
    fn corpus_is_independent_of_worker_count() {
        let g = ring(15);
        let mut first = StdRng::seed_from_u64(9);
        let mut second = StdRng::seed_from_u64(9);
        let single = simulate_walks(&g, &params(1), Verbosity::Silent, &mut first);
        let many = simulate_walks(&g, &params(4), Verbosity::Silent, &mut second);
        assert_eq!(single, many);
    }

    #[test]
    fn every_node_starts_one_walk_per_round() {
        let g = ring(6);
        let mut rng = StdRng::seed_from_u64(4);
        let walks = simulate_walks(&g, &params(3), Verbosity::Silent, &mut rng);
        for round in walks.chunks(6) {
            let mut starts: Vec<usize> = round.iter().map(|w| w[0]).collect();
            starts.sort_unstable();
            assert_eq!(starts, (0..6).collect::<Vec<_>>());
        }
    }

    #[test]
    fn isolated_start_yields_single_node_walk() {
        let g = Adjacency::from_edges(3, [(0, 1)]).expect("valid");
        let walk = walk_from(&g, 2, &params(1), &mut StdRng::seed_from_u64(0));
        assert_eq!(walk, vec![2]);
    }

    #[test]
    fn large_p_discourages_backtracking() {
        // On a path the interior walker can only go back or forward.
        let g = Adjacency::from_edges(50, (0..49).map(|i| (i, i + 1))).expect("valid");
        let sticky = WalkParams {
            p: 1_000.0,
            q: 1.0,
            num_walks: 1,
            walk_length: 40,
            workers: 1,
        };
        let mut rng = StdRng::seed_from_u64(3);
        let walk = walk_from(&g, 5, &sticky, &mut rng);
        let backtracks = walk
            .windows(3)
            .filter(|w| w[0] == w[2] && w[1] != 0 && w[1] != 49)
            .count();
        assert!(backtracks <= 1, "{backtracks} backtracks");
    }
}
