pub mod adjacency;
pub mod builder;

use crate::index::Idx;
use crate::nodelets::Nodelets;

use adjacency::{Adjacency, NodeletArena};

pub use builder::{build, check_graph, dump_graph, log_distribution};

/// A heavy/light partitioned undirected graph distributed across the
/// nodelets it was built with.
pub struct Graph<Node: Idx> {
    nodelets: Nodelets,
    heavy_threshold: usize,
    num_vertices: usize,
    num_edges: usize,
    degree: Vec<usize>,
    adjacency: Vec<Adjacency>,
    arenas: Vec<NodeletArena<Node>>,
}

impl<Node: Idx> Graph<Node> {
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    #[inline]
    pub fn nodelets(&self) -> Nodelets {
        self.nodelets
    }

    #[inline]
    pub fn heavy_threshold(&self) -> usize {
        self.heavy_threshold
    }

    #[inline]
    pub fn degree(&self, v: usize) -> usize {
        self.degree[v]
    }

    #[inline]
    pub fn is_heavy(&self, v: usize) -> bool {
        self.adjacency[v].is_heavy()
    }

    #[inline]
    pub fn owner_of(&self, v: usize) -> usize {
        self.nodelets.owner_of(v)
    }

    /// Neighbors of `v` stored on `nodelet`. For a light vertex this is
    /// either all of its neighbors (if `nodelet` is its home) or empty.
    #[inline]
    pub fn neighbors_on(&self, v: usize, nodelet: usize) -> &[Node] {
        self.adjacency[v].neighbors_on(nodelet, &self.arenas)
    }

    pub fn for_each_neighbor(&self, v: usize, mut f: impl FnMut(Node)) {
        for nodelet in 0..self.nodelets.count() {
            for &u in self.neighbors_on(v, nodelet) {
                f(u);
            }
        }
    }

    /// Visits every neighbor of `v`, dispatching one task per remote edge
    /// block for a heavy vertex so each block's scan runs at its own
    /// nodelet; a light vertex is scanned inline since all its neighbors
    /// already live on one nodelet.
    pub fn scan_neighbors_parallel(&self, v: usize, f: impl Fn(Node) + Sync) {
        if self.is_heavy(v) {
            rayon::scope(|s| {
                for nodelet in 0..self.nodelets.count() {
                    let neighbors = self.neighbors_on(v, nodelet);
                    if !neighbors.is_empty() {
                        let f = &f;
                        s.spawn(move |_| {
                            for &u in neighbors {
                                f(u);
                            }
                        });
                    }
                }
            });
        } else {
            let owner = self.owner_of(v);
            for &u in self.neighbors_on(v, owner) {
                f(u);
            }
        }
    }
}
