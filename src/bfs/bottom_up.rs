//! Bottom-up frontier expansion: every unvisited vertex scans its own
//! neighbors for a frontier member, instead of the frontier scanning
//! outward. Cheaper than top-down once the frontier is dense.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use crate::bitmap::{Bitmap, ReplicatedBitmap};
use crate::graph::Graph;
use crate::index::Idx;
use crate::nodelets::Nodelets;
use crate::runtime::{apply_striped, grain_for, NEIGHBOR_SCAN_MIN_GRAIN};

/// One bottom-up step. For every vertex not yet in the tree, scans its
/// adjacency for a neighbor present in `frontier`; on a hit, claims that
/// neighbor as parent and marks the vertex in `next_frontier`. Returns the
/// number of vertices newly claimed this step (`awake_count`), incremented
/// at most once per vertex regardless of how many of its neighbors matched.
pub fn step<Node: Idx>(
    graph: &Graph<Node>,
    parent: &[AtomicI64],
    frontier: &ReplicatedBitmap,
    next_frontier: &ReplicatedBitmap,
    nodelets: Nodelets,
) -> usize {
    let nv = graph.num_vertices();
    let awake_count = AtomicUsize::new(0);

    apply_striped(nv, nodelets, grain_for(nv, NEIGHBOR_SCAN_MIN_GRAIN), |v| {
        if parent[v].load(Ordering::SeqCst) < 0 {
            let owner = nodelets.owner_of(v);
            let local_frontier = frontier.view(owner);
            if let Some(found_parent) = scan_for_parent(graph, v, local_frontier) {
                parent[v].store(found_parent as i64, Ordering::SeqCst);
                next_frontier.view(owner).set_bit(v);
                awake_count.fetch_add(1, Ordering::SeqCst);
            }
        }
    });

    awake_count.load(Ordering::SeqCst)
}

fn scan_for_parent<Node: Idx>(graph: &Graph<Node>, v: usize, frontier: &Bitmap) -> Option<usize> {
    for nodelet in 0..graph.nodelets().count() {
        for &u in graph.neighbors_on(v, nodelet) {
            if frontier.get_bit(u.index()) {
                return Some(u.index());
            }
        }
    }
    None
}
