use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode};
use rand::prelude::*;

use nodelet_bfs::bfs::{Algorithm, Bfs};
use nodelet_bfs::graph::build;
use nodelet_bfs::input::DistributedEdgeList;
use nodelet_bfs::nodelets::Nodelets;
use nodelet_bfs::region_timer::RegionTimings;

fn gen_edge_list(node_count: usize, edge_count: usize) -> DistributedEdgeList<usize> {
    let mut rng = StdRng::seed_from_u64(7);
    let mut src = Vec::with_capacity(edge_count);
    let mut dst = Vec::with_capacity(edge_count);
    for _ in 0..edge_count {
        src.push(rng.gen_range(0..node_count));
        dst.push(rng.gen_range(0..node_count));
    }
    DistributedEdgeList {
        num_vertices: node_count,
        num_edges: edge_count,
        src,
        dst,
    }
}

fn bfs(c: &mut Criterion) {
    let mut group = c.benchmark_group("bfs");
    group.sampling_mode(SamplingMode::Flat);

    let nodelets = Nodelets::new(num_cpus::get_physical().max(1));
    let el = gen_edge_list(10_000, 100_000);
    let timings = RegionTimings::new();
    let graph = build::<usize>(&el, 256, nodelets, &timings).unwrap();

    for algorithm in [
        Algorithm::RemoteWrites,
        Algorithm::MigratingThreads,
        Algorithm::RemoteWritesHybrid,
        Algorithm::BeamerHybrid,
    ] {
        let label = format!("{:?}", algorithm);
        group.bench_with_input(BenchmarkId::from_parameter(label), &algorithm, |b, &algorithm| {
            b.iter_batched(
                || Bfs::new(&graph),
                |mut bfs| {
                    bfs.run(&graph, 0, algorithm, 15, 18, &timings).unwrap();
                    black_box(bfs.count_traversed_edges(&graph))
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bfs);
criterion_main!(benches);
