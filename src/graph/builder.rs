//! Five-pass graph construction from a distributed edge list.

use std::sync::atomic::{AtomicUsize, Ordering};

use log::info;
use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::index::Idx;
use crate::input::DistributedEdgeList;
use crate::nodelets::Nodelets;
use crate::region_timer::RegionTimings;
use crate::runtime::{apply_striped, grain_for, NEIGHBOR_SCAN_MIN_GRAIN};

use super::adjacency::{classify, Adjacency, NodeletArena};
use super::Graph;

/// Builds a [`Graph`] from a loaded edge list, classifying each vertex as
/// heavy or light exactly once and carving per-nodelet arenas to hold the
/// resulting adjacency storage.
pub fn build<Node: Idx>(
    el: &DistributedEdgeList<Node>,
    heavy_threshold: usize,
    nodelets: Nodelets,
    timings: &RegionTimings,
) -> Result<Graph<Node>> {
    let nv = el.num_vertices;
    let ne = el.num_edges;
    let p = nodelets.count();
    let grain = grain_for(ne, NEIGHBOR_SCAN_MIN_GRAIN);

    // Pass 1: degree count (symmetrized).
    let region = timings.start("calculate_degrees");
    let degree_atomic: Vec<AtomicUsize> = (0..nv).map(|_| AtomicUsize::new(0)).collect();
    apply_striped(ne, nodelets, grain, |i| {
        let s = el.src[i].index();
        let d = el.dst[i].index();
        degree_atomic[s].fetch_add(1, Ordering::SeqCst);
        degree_atomic[d].fetch_add(1, Ordering::SeqCst);
    });
    let degree: Vec<usize> = degree_atomic.iter().map(|a| a.load(Ordering::SeqCst)).collect();
    region.end();

    // Heaviness is decided exactly once and consulted by every later pass.
    let is_heavy: Vec<bool> = degree.iter().map(|&d| classify(d, heavy_threshold)).collect();

    // Pass 2: allocate per-nodelet counters for every heavy vertex's edge blocks.
    let region = timings.start("allocate_edge_blocks");
    let heavy_block_counts: Vec<Option<Box<[AtomicUsize]>>> = is_heavy
        .iter()
        .map(|&heavy| {
            if heavy {
                Some((0..p).map(|_| AtomicUsize::new(0)).collect::<Vec<_>>().into_boxed_slice())
            } else {
                None
            }
        })
        .collect();
    region.end();

    // Pass 3: size heavy blocks by counting, per edge endpoint, how many
    // neighbors land on each nodelet.
    let region = timings.start("compute_edge_block_sizes");
    apply_striped(ne, nodelets, grain, |i| {
        let s = el.src[i].index();
        let d = el.dst[i].index();
        if is_heavy[s] {
            heavy_block_counts[s].as_ref().unwrap()[nodelets.owner_of(d)]
                .fetch_add(1, Ordering::SeqCst);
        }
        if is_heavy[d] {
            heavy_block_counts[d].as_ref().unwrap()[nodelets.owner_of(s)]
                .fetch_add(1, Ordering::SeqCst);
        }
    });
    region.end();

    // Pass 4: count local edges per nodelet so we know how large each
    // nodelet's arena must be.
    let region = timings.start("count_local_edges");
    let arena_size: Vec<AtomicUsize> = (0..p).map(|_| AtomicUsize::new(0)).collect();
    apply_striped(nv, nodelets, grain_for(nv, NEIGHBOR_SCAN_MIN_GRAIN), |v| {
        if is_heavy[v] {
            let counts = heavy_block_counts[v].as_ref().unwrap();
            for (nodelet, count) in counts.iter().enumerate() {
                let c = count.load(Ordering::SeqCst);
                if c > 0 {
                    arena_size[nodelet].fetch_add(c, Ordering::SeqCst);
                }
            }
        } else {
            let owner = nodelets.owner_of(v);
            arena_size[owner].fetch_add(degree[v], Ordering::SeqCst);
        }
    });
    let total_local_edges: usize = arena_size.iter().map(|a| a.load(Ordering::SeqCst)).sum();
    if total_local_edges != 2 * ne {
        return Err(Error::invariant(format!(
            "sum of per-nodelet local edge counts ({}) does not equal 2*num_edges ({})",
            total_local_edges,
            2 * ne
        )));
    }
    region.end();

    // Pass 5: carve per-nodelet arenas and fill them.
    let region = timings.start("carve_edge_storage");
    let arenas: Vec<NodeletArena<Node>> = arena_size
        .iter()
        .map(|a| NodeletArena::with_capacity(a.load(Ordering::SeqCst)))
        .collect();
    let carve_cursor: Vec<AtomicUsize> = (0..p).map(|_| AtomicUsize::new(0)).collect();

    let adjacency: Vec<Adjacency> = (0..nv)
        .into_par_iter()
        .map(|v| {
            if is_heavy[v] {
                let counts = heavy_block_counts[v].as_ref().unwrap();
                let bases_and_lens: Vec<(usize, usize)> = (0..p)
                    .map(|nodelet| {
                        let len = counts[nodelet].load(Ordering::SeqCst);
                        let base = if len > 0 {
                            carve_cursor[nodelet].fetch_add(len, Ordering::SeqCst)
                        } else {
                            0
                        };
                        (base, len)
                    })
                    .collect();
                Adjacency::heavy(bases_and_lens.into_iter())
            } else {
                let owner = nodelets.owner_of(v);
                let len = degree[v];
                let base = if len > 0 {
                    carve_cursor[owner].fetch_add(len, Ordering::SeqCst)
                } else {
                    0
                };
                Adjacency::light(owner, base, len)
            }
        })
        .collect();
    region.end();

    let region = timings.start("fill_edge_blocks");
    (0..ne).into_par_iter().for_each(|i| {
        let s = el.src[i];
        let d = el.dst[i];
        insert_neighbor(&adjacency[s.index()], &arenas, nodelets, d);
        insert_neighbor(&adjacency[d.index()], &arenas, nodelets, s);
    });
    region.end();

    info!(
        "constructed graph: {} vertices, {} edges, {} heavy vertices ({:.2}%)",
        nv,
        ne,
        is_heavy.iter().filter(|&&h| h).count(),
        100.0 * is_heavy.iter().filter(|&&h| h).count() as f64 / nv.max(1) as f64
    );

    Ok(Graph {
        nodelets,
        heavy_threshold,
        num_vertices: nv,
        num_edges: ne,
        degree,
        adjacency,
        arenas,
    })
}

fn insert_neighbor<Node: Idx>(
    adjacency: &Adjacency,
    arenas: &[NodeletArena<Node>],
    nodelets: Nodelets,
    neighbor: Node,
) {
    match adjacency {
        Adjacency::Light { nodelet, range } => {
            let slot = range.claim_slot();
            arenas[*nodelet].write(slot, neighbor);
        }
        Adjacency::Heavy { blocks } => {
            let target = nodelets.owner_of(neighbor.index());
            let slot = blocks[target].claim_slot();
            arenas[target].write(slot, neighbor);
        }
    }
}

/// Logs the fraction of heavy vertices and the per-nodelet arena sizes.
/// Cheap enough to run unconditionally after every build.
pub fn log_distribution<Node: Idx>(graph: &Graph<Node>) {
    let heavy_count = (0..graph.num_vertices())
        .filter(|&v| graph.is_heavy(v))
        .count();
    info!(
        "graph distribution: {}/{} vertices heavy ({:.2}%), heavy_threshold={}",
        heavy_count,
        graph.num_vertices(),
        100.0 * heavy_count as f64 / graph.num_vertices().max(1) as f64,
        graph.heavy_threshold()
    );
    for (nodelet, arena) in graph.arenas.iter().enumerate() {
        info!("  nodelet {}: {} local edge slots", nodelet, arena.len());
    }
}

/// Slow O(E) validator: for every input edge, confirms both directions are
/// present in the constructed adjacency. Intended for `--check_graph`, not
/// the hot path.
pub fn check_graph<Node: Idx>(
    graph: &Graph<Node>,
    el: &DistributedEdgeList<Node>,
) -> Result<()> {
    for i in 0..el.num_edges {
        let s = el.src[i];
        let d = el.dst[i];
        if !neighbor_present(graph, s.index(), d) {
            return Err(Error::invariant(format!(
                "vertex {} is missing neighbor {} from adjacency",
                s.index(),
                d.index()
            )));
        }
        if !neighbor_present(graph, d.index(), s) {
            return Err(Error::invariant(format!(
                "vertex {} is missing neighbor {} from adjacency",
                d.index(),
                s.index()
            )));
        }
    }
    Ok(())
}

fn neighbor_present<Node: Idx>(graph: &Graph<Node>, v: usize, needle: Node) -> bool {
    for nodelet in 0..graph.nodelets().count() {
        if graph.neighbors_on(v, nodelet).contains(&needle) {
            return true;
        }
    }
    false
}

/// Prints every vertex's adjacency, split out by which nodelet holds which
/// part. Debug-only (`--dump_graph`), never on the hot path.
pub fn dump_graph<Node: Idx>(graph: &Graph<Node>) {
    for v in 0..graph.num_vertices() {
        print!("{} ({}):", v, if graph.is_heavy(v) { "heavy" } else { "light" });
        for nodelet in 0..graph.nodelets().count() {
            let neighbors = graph.neighbors_on(v, nodelet);
            if !neighbors.is_empty() {
                print!(" [n{}:{:?}]", nodelet, neighbors);
            }
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge_list(pairs: &[(usize, usize)], nv: usize) -> DistributedEdgeList<usize> {
        DistributedEdgeList {
            num_vertices: nv,
            num_edges: pairs.len(),
            src: pairs.iter().map(|(s, _)| *s).collect(),
            dst: pairs.iter().map(|(_, d)| *d).collect(),
        }
    }

    #[test]
    fn triangle_builds_with_symmetric_degree_three() {
        let el = edge_list(&[(0, 1), (1, 2), (0, 2)], 3);
        let timings = RegionTimings::new();
        let g = build::<usize>(&el, usize::MAX, Nodelets::new(2), &timings).unwrap();
        assert_eq!(g.num_vertices(), 3);
        assert_eq!(g.num_edges(), 3);
        for v in 0..3 {
            assert_eq!(g.degree(v), 2);
        }
        check_graph(&g, &el).unwrap();
    }

    #[test]
    fn star_with_low_threshold_makes_center_heavy() {
        let pairs: Vec<(usize, usize)> = (1..9).map(|leaf| (0usize, leaf)).collect();
        let el = edge_list(&pairs, 9);
        let timings = RegionTimings::new();
        let g = build::<usize>(&el, 4, Nodelets::new(4), &timings).unwrap();
        assert!(g.is_heavy(0));
        for leaf in 1..9 {
            assert!(!g.is_heavy(leaf));
        }
        assert_eq!(g.degree(0), 8);
        check_graph(&g, &el).unwrap();
    }

    #[test]
    fn disconnected_components_each_have_correct_degree() {
        let el = edge_list(&[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)], 6);
        let timings = RegionTimings::new();
        let g = build::<usize>(&el, usize::MAX, Nodelets::new(3), &timings).unwrap();
        for v in 0..6 {
            assert_eq!(g.degree(v), 2);
        }
        check_graph(&g, &el).unwrap();
    }
}
