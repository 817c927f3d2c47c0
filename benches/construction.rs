use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, SamplingMode};
use rand::prelude::*;

use nodelet_bfs::graph::build;
use nodelet_bfs::input::DistributedEdgeList;
use nodelet_bfs::nodelets::Nodelets;
use nodelet_bfs::region_timer::RegionTimings;

#[derive(Clone, Copy)]
struct Input {
    name: &'static str,
    node_count: usize,
    edge_count: usize,
}

const SMALL: Input = Input {
    name: "small",
    node_count: 1_000,
    edge_count: 10_000,
};

const MEDIUM: Input = Input {
    name: "medium",
    node_count: 10_000,
    edge_count: 100_000,
};

fn gen_edge_list(input: Input) -> DistributedEdgeList<usize> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut src = Vec::with_capacity(input.edge_count);
    let mut dst = Vec::with_capacity(input.edge_count);
    for _ in 0..input.edge_count {
        src.push(rng.gen_range(0..input.node_count));
        dst.push(rng.gen_range(0..input.node_count));
    }
    DistributedEdgeList {
        num_vertices: input.node_count,
        num_edges: input.edge_count,
        src,
        dst,
    }
}

fn construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");
    group.sampling_mode(SamplingMode::Flat);

    for input in [SMALL, MEDIUM] {
        group.bench_with_input(BenchmarkId::from_parameter(input.name), &input, |b, &input| {
            let el = gen_edge_list(input);
            let nodelets = Nodelets::new(num_cpus::get_physical().max(1));
            b.iter_batched(
                RegionTimings::new,
                |timings| black_box(build::<usize>(&el, usize::MAX, nodelets, &timings).unwrap()),
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, construction);
criterion_main!(benches);
