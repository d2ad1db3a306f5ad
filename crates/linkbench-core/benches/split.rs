use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use linkbench_core::{Adjacency, SplitConfig, split_edges_seeded};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Sparse random graph with about `avg_degree * n / 2` edges.
fn random_graph(n: usize, avg_degree: usize, seed: u64) -> Adjacency {
    let mut rng = StdRng::seed_from_u64(seed);
    let pairs: Vec<(usize, usize)> = (0..n * avg_degree / 2)
        .map(|_| (rng.gen_range(0..n), rng.gen_range(0..n)))
        .collect();
    Adjacency::from_edges(n, pairs).expect("ids are in range")
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split.edges");

    for &n in &[500usize, 5_000, 20_000] {
        let graph = random_graph(n, 8, 0x11_AB + n as u64);
        group.throughput(Throughput::Elements(graph.edge_count() as u64));

        group.bench_with_input(BenchmarkId::new("default", n), &graph, |b, g| {
            b.iter(|| black_box(split_edges_seeded(g, &SplitConfig::default(), 7)))
        });

        if n <= 5_000 {
            let guarded = SplitConfig {
                prevent_disconnect: true,
                ..SplitConfig::default()
            };
            group.bench_with_input(BenchmarkId::new("prevent_disconnect", n), &graph, |b, g| {
                b.iter(|| black_box(split_edges_seeded(g, &guarded, 7)))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_split);
criterion_main!(benches);
