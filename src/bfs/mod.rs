pub mod bottom_up;
pub mod top_down;

use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use log::info;

use crate::bitmap::{self, ReplicatedBitmap};
use crate::error::{Error, Result};
use crate::graph::Graph;
use crate::index::Idx;
use crate::nodelets::Nodelets;
use crate::region_timer::RegionTimings;
use crate::runtime::{apply_striped, grain_for, NEIGHBOR_SCAN_MIN_GRAIN};
use crate::sliding_queue::{self, ReplicatedQueue};

/// Selects which top-down strategy (and whether to direction-optimize at
/// all) a BFS run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Pure top-down, remote-write variant. Never switches to bottom-up.
    RemoteWrites,
    /// Pure top-down, migrating-threads variant. Never switches to bottom-up.
    MigratingThreads,
    /// Direction-optimizing, using the remote-write top-down variant.
    RemoteWritesHybrid,
    /// Direction-optimizing, using the migrating-threads top-down variant
    /// (the classic Beamer hybrid).
    BeamerHybrid,
}

impl Algorithm {
    fn is_direction_optimizing(self) -> bool {
        matches!(self, Algorithm::RemoteWritesHybrid | Algorithm::BeamerHybrid)
    }
}

/// Owns the per-run mutable state of a direction-optimizing BFS: the two
/// parent arrays, the double-buffered frontier bitmap, and the sliding
/// queue. Reused across trials via [`Bfs::clear`].
pub struct Bfs<Node: Idx> {
    nodelets: Nodelets,
    parent: Vec<AtomicI64>,
    new_parent: Vec<AtomicI64>,
    frontier: ReplicatedBitmap,
    next_frontier: ReplicatedBitmap,
    queue: ReplicatedQueue<Node>,
}

impl<Node: Idx> Bfs<Node> {
    pub fn new(graph: &Graph<Node>) -> Self {
        let nodelets = graph.nodelets();
        let nv = graph.num_vertices();
        Self {
            nodelets,
            parent: (0..nv).map(|_| AtomicI64::new(-1)).collect(),
            new_parent: (0..nv).map(|_| AtomicI64::new(-1)).collect(),
            frontier: crate::nodelets::Replicated::from_fn(nodelets, |_| {
                crate::bitmap::Bitmap::new(nv)
            }),
            next_frontier: crate::nodelets::Replicated::from_fn(nodelets, |_| {
                crate::bitmap::Bitmap::new(nv)
            }),
            queue: sliding_queue::new_replicated(nodelets, nv),
        }
    }

    /// Resets all state for a fresh trial against the same graph.
    pub fn clear(&mut self) {
        bitmap::clear_all(&self.frontier);
        bitmap::clear_all(&self.next_frontier);
        sliding_queue::reset_all(&mut self.queue);
        for p in &self.parent {
            p.store(-1, Ordering::SeqCst);
        }
        for p in &self.new_parent {
            p.store(-1, Ordering::SeqCst);
        }
    }

    fn init_run(&mut self, graph: &Graph<Node>, source: usize) {
        let nv = graph.num_vertices();
        apply_striped(nv, self.nodelets, grain_for(nv, NEIGHBOR_SCAN_MIN_GRAIN), |v| {
            let degree = graph.degree(v) as i64;
            self.parent[v].store(if degree > 0 { -degree } else { -1 }, Ordering::SeqCst);
            self.new_parent[v].store(-1, Ordering::SeqCst);
        });
        bitmap::clear_all(&self.frontier);
        bitmap::clear_all(&self.next_frontier);
        sliding_queue::reset_all(&mut self.queue);

        self.queue
            .view(self.nodelets.owner_of(source))
            .push_back(Node::new(source));
        sliding_queue::slide_all_windows(&mut self.queue);
        self.parent[source].store(source as i64, Ordering::SeqCst);
    }

    /// Runs one BFS trial from `source`, direction-optimizing per
    /// `algorithm` with the given heuristic thresholds.
    pub fn run(
        &mut self,
        graph: &Graph<Node>,
        source: usize,
        algorithm: Algorithm,
        alpha: usize,
        beta: usize,
        timings: &RegionTimings,
    ) -> Result<()> {
        if source >= graph.num_vertices() {
            return Err(Error::usage(format!(
                "source vertex {} is out of range (num_vertices = {})",
                source,
                graph.num_vertices()
            )));
        }

        self.init_run(graph, source);

        let mut edges_to_check = graph.num_edges().max(1);
        let mut scout_count = graph.degree(source);

        while !sliding_queue::all_empty(&self.queue) {
            let use_bottom_up = algorithm.is_direction_optimizing()
                && alpha > 0
                && scout_count > edges_to_check / alpha;

            if use_bottom_up {
                let region = timings.start("queue_to_bitmap");
                self.queue_to_bitmap(graph);
                region.end();
                // Seeded from the frontier this phase starts from, so the
                // first step's terminating test compares against how many
                // vertices were already awake, not zero.
                let mut old_awake_count = sliding_queue::combined_size(&self.queue);
                loop {
                    let region = timings.start("bottom_up_step");
                    let awake_count = bottom_up::step(
                        graph,
                        &self.parent,
                        &self.frontier,
                        &self.next_frontier,
                        self.nodelets,
                    );
                    bitmap::sync(&self.next_frontier);
                    std::mem::swap(&mut self.frontier, &mut self.next_frontier);
                    bitmap::clear_all(&self.next_frontier);
                    region.end();

                    let continue_bottom_up = awake_count > 0
                        && (awake_count >= old_awake_count
                            || (beta > 0 && awake_count > graph.num_vertices() / beta));
                    old_awake_count = awake_count;
                    if !continue_bottom_up {
                        break;
                    }
                }
                let region = timings.start("bitmap_to_queue");
                self.bitmap_to_queue(graph);
                region.end();
                sliding_queue::slide_all_windows(&mut self.queue);
                scout_count = 1;
            } else {
                let region = timings.start("top_down_step");
                let found_scout = match algorithm {
                    Algorithm::RemoteWrites | Algorithm::RemoteWritesHybrid => {
                        top_down::step_remote_writes(
                            graph,
                            &self.parent,
                            &self.new_parent,
                            &self.queue,
                            self.nodelets,
                        )
                    }
                    Algorithm::MigratingThreads | Algorithm::BeamerHybrid => {
                        top_down::step_migrating_threads(
                            graph,
                            &self.parent,
                            &self.queue,
                            self.nodelets,
                        )
                    }
                };
                region.end();
                sliding_queue::slide_all_windows(&mut self.queue);
                edges_to_check = edges_to_check.saturating_sub(scout_count).max(1);
                scout_count = found_scout;
            }
        }

        Ok(())
    }

    fn queue_to_bitmap(&self, graph: &Graph<Node>) {
        bitmap::clear_all(&self.frontier);
        for nodelet in 0..self.nodelets.count() {
            let replica = self.queue.view(nodelet);
            let bitmap = self.frontier.view(nodelet);
            for &v in replica.window() {
                bitmap.set_bit(v.index());
            }
        }
        bitmap::sync(&self.frontier);
    }

    fn bitmap_to_queue(&self, graph: &Graph<Node>) {
        let p = self.nodelets.count();
        for nodelet in 0..p {
            let bitmap = self.frontier.view(nodelet);
            let replica = self.queue.view(nodelet);
            for v in (nodelet..graph.num_vertices()).step_by(p) {
                if bitmap.get_bit(v) {
                    replica.push_back(Node::new(v));
                }
            }
        }
    }

    /// Sum of degrees over every vertex reached by the most recent run.
    pub fn count_traversed_edges(&self, graph: &Graph<Node>) -> usize {
        let total = AtomicUsize::new(0);
        let nv = graph.num_vertices();
        apply_striped(nv, self.nodelets, grain_for(nv, NEIGHBOR_SCAN_MIN_GRAIN), |v| {
            if self.parent[v].load(Ordering::SeqCst) >= 0 {
                total.fetch_add(graph.degree(v), Ordering::SeqCst);
            }
        });
        total.load(Ordering::SeqCst)
    }

    /// Validates tree consistency: the source parents itself, every reached
    /// non-root vertex's parent is a reached neighbor, and no unreached
    /// vertex has a reached neighbor.
    pub fn check(&self, graph: &Graph<Node>, source: usize) -> Result<()> {
        if self.parent[source].load(Ordering::SeqCst) != source as i64 {
            return Err(Error::invariant(format!(
                "source {} does not parent itself",
                source
            )));
        }

        for v in 0..graph.num_vertices() {
            let parent_v = self.parent[v].load(Ordering::SeqCst);
            if v == source {
                continue;
            }
            if parent_v >= 0 {
                let parent_v = parent_v as usize;
                let mut is_neighbor = false;
                graph.for_each_neighbor(v, |u| {
                    if u.index() == parent_v {
                        is_neighbor = true;
                    }
                });
                if !is_neighbor {
                    return Err(Error::invariant(format!(
                        "vertex {} claims parent {} which is not a neighbor",
                        v, parent_v
                    )));
                }
                if self.parent[parent_v].load(Ordering::SeqCst) < 0 {
                    return Err(Error::invariant(format!(
                        "vertex {}'s parent {} was never reached",
                        v, parent_v
                    )));
                }
            } else {
                let mut has_reached_neighbor = false;
                graph.for_each_neighbor(v, |u| {
                    if self.parent[u.index()].load(Ordering::SeqCst) >= 0 {
                        has_reached_neighbor = true;
                    }
                });
                if has_reached_neighbor {
                    return Err(Error::invariant(format!(
                        "unreached vertex {} has a reached neighbor",
                        v
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn is_reached(&self, v: usize) -> bool {
        self.parent[v].load(Ordering::SeqCst) >= 0
    }

    pub fn parent_of(&self, v: usize) -> Option<usize> {
        let p = self.parent[v].load(Ordering::SeqCst);
        if p >= 0 {
            Some(p as usize)
        } else {
            None
        }
    }

    pub fn reached_count(&self) -> usize {
        self.parent
            .iter()
            .filter(|p| p.load(Ordering::SeqCst) >= 0)
            .count()
    }

    /// Debug dump of the BFS tree (`--dump_graph`-adjacent tooling).
    pub fn print_tree(&self) {
        info!("bfs tree:");
        for (v, p) in self.parent.iter().enumerate() {
            let p = p.load(Ordering::SeqCst);
            if p >= 0 {
                info!("  {} <- {}", v, p);
            }
        }
    }
}
