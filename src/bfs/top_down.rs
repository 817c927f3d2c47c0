//! Top-down frontier expansion: two interchangeable strategies for claiming
//! unvisited neighbors of the current frontier.

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use crate::graph::Graph;
use crate::index::Idx;
use crate::nodelets::{atomic_cas, Nodelets};
use crate::runtime::{grain_for, NEIGHBOR_SCAN_MIN_GRAIN};
use crate::sliding_queue::ReplicatedQueue;

/// Fire-and-forget remote writes into `new_parent`, followed by a fence and
/// a sweep that claims every vertex `new_parent` reached this step. Returns
/// the sum of scout weights (original degrees) of newly claimed vertices.
pub fn step_remote_writes<Node: Idx>(
    graph: &Graph<Node>,
    parent: &[AtomicI64],
    new_parent: &[AtomicI64],
    queue: &ReplicatedQueue<Node>,
    nodelets: Nodelets,
) -> usize {
    let p = nodelets.count();

    // Scan phase: every neighbor of the current frontier gets a fire-and-
    // forget store. Acks are conceptually disabled for the duration of this
    // scatter; the fence below stands in for `reenable_acks`' barrier.
    rayon::scope(|s| {
        for nodelet in 0..p {
            for &src in queue.view(nodelet).window() {
                let src_idx = src.index();
                s.spawn(move |_| {
                    graph.scan_neighbors_parallel(src_idx, |dst| {
                        new_parent[dst.index()].store(src_idx as i64, Ordering::SeqCst);
                    });
                });
            }
        }
    });
    std::sync::atomic::fence(Ordering::SeqCst);

    // Sweep phase: claim every vertex whose `new_parent` arrived this step.
    let scout_total = AtomicUsize::new(0);
    let nv = graph.num_vertices();
    crate::runtime::apply_striped(nv, nodelets, grain_for(nv, NEIGHBOR_SCAN_MIN_GRAIN), |v| {
        let prior = parent[v].load(Ordering::SeqCst);
        if prior < 0 {
            let candidate_parent = new_parent[v].load(Ordering::SeqCst);
            if candidate_parent >= 0 {
                parent[v].store(candidate_parent, Ordering::SeqCst);
                scout_total.fetch_add(prior.unsigned_abs() as usize, Ordering::SeqCst);
                queue.view(nodelets.owner_of(v)).push_back(Node::new(v));
            }
        }
    });
    scout_total.load(Ordering::SeqCst)
}

/// CAS-based claim directly on `parent`, with immediate push to the
/// destination nodelet's queue on success. Returns the sum of scout weights
/// of newly claimed vertices.
pub fn step_migrating_threads<Node: Idx>(
    graph: &Graph<Node>,
    parent: &[AtomicI64],
    queue: &ReplicatedQueue<Node>,
    nodelets: Nodelets,
) -> usize {
    let p = nodelets.count();
    let scout_total = AtomicUsize::new(0);

    rayon::scope(|s| {
        for nodelet in 0..p {
            for &src in queue.view(nodelet).window() {
                let src_idx = src.index();
                let scout_total = &scout_total;
                s.spawn(move |_| {
                    graph.scan_neighbors_parallel(src_idx, |dst| {
                        claim(parent, queue, nodelets, src_idx, dst.index(), scout_total);
                    });
                });
            }
        }
    });
    scout_total.load(Ordering::SeqCst)
}

/// Attempts to claim `dst` with parent `src`, retrying the CAS against
/// whatever value a concurrent winner left behind until either this thread
/// wins or `dst` is already claimed.
fn claim<Node: Idx>(
    parent: &[AtomicI64],
    queue: &ReplicatedQueue<Node>,
    nodelets: Nodelets,
    src: usize,
    dst: usize,
    scout_total: &AtomicUsize,
) {
    loop {
        let observed = parent[dst].load(Ordering::SeqCst);
        if observed >= 0 {
            return;
        }
        let prior = atomic_cas(&parent[dst], src as i64, observed);
        if prior == observed {
            scout_total.fetch_add(prior.unsigned_abs() as usize, Ordering::SeqCst);
            queue.view(nodelets.owner_of(dst)).push_back(Node::new(dst));
            return;
        }
        // another thread raced us; prior holds whatever it left -- retry
        // unless it already succeeded.
        if prior >= 0 {
            return;
        }
    }
}
