//! Heavy/light partitioned adjacency storage.
//!
//! A light vertex's neighbors sit in one contiguous slice on the nodelet
//! that owns the vertex. A heavy vertex's neighbors are split into one edge
//! block per nodelet, each holding only the neighbors that live there. The
//! heavy/light tag is derived once, right after degree counting, and never
//! recomputed. Every later pass and the BFS engine consult the same cached
//! tag, so there is exactly one place classification can disagree with
//! itself.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::index::Idx;
use crate::nodelets::Nodelets;

/// Per-nodelet bump-carved backing storage for adjacency data. One arena per
/// nodelet; every light array and every heavy edge block is a disjoint slice
/// carved out of its owning nodelet's arena.
pub struct NodeletArena<Node: Idx> {
    data: UnsafeCell<Box<[Node]>>,
}

// SAFETY: during the fill pass, every write targets a slot obtained from a
// disjoint (base, cursor) pair -- bases come from non-overlapping carves
// (`ATOMIC_ADDMS`), cursors are unique per block via atomic fetch-add. No two
// concurrent writers ever target the same slot.
unsafe impl<Node: Idx> Sync for NodeletArena<Node> {}

impl<Node: Idx> NodeletArena<Node> {
    pub fn with_capacity(len: usize) -> Self {
        Self {
            data: UnsafeCell::new(vec![Node::zero(); len].into_boxed_slice()),
        }
    }

    pub fn len(&self) -> usize {
        unsafe { (*self.data.get()).len() }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes `value` at `at`. Caller must guarantee no other write targets
    /// the same index concurrently.
    pub fn write(&self, at: usize, value: Node) {
        debug_assert!(at < self.len());
        unsafe {
            (*self.data.get())[at] = value;
        }
    }

    pub fn slice(&self, start: usize, len: usize) -> &[Node] {
        let data = unsafe { &*self.data.get() };
        &data[start..start + len]
    }
}

/// A carved, disjoint range within one nodelet's arena. `cursor` starts at
/// `base` and is bumped by one for every neighbor inserted during the fill
/// pass; once construction completes, `cursor - base == len`.
pub struct CarvedRange {
    base: usize,
    len: usize,
    cursor: AtomicUsize,
}

impl CarvedRange {
    fn new(base: usize, len: usize) -> Self {
        Self {
            base,
            len,
            cursor: AtomicUsize::new(base),
        }
    }

    /// Claims the next free slot in this range and returns its absolute
    /// arena offset.
    pub fn claim_slot(&self) -> usize {
        let slot = self.cursor.fetch_add(1, Ordering::SeqCst);
        debug_assert!(slot < self.base + self.len, "edge block overflow");
        slot
    }

    pub fn base(&self) -> usize {
        self.base
    }

    pub fn len(&self) -> usize {
        self.len
    }
}

/// Per-vertex adjacency: either one local range (light) or one range per
/// nodelet (heavy).
pub enum Adjacency {
    Light {
        nodelet: usize,
        range: CarvedRange,
    },
    Heavy {
        /// One range per nodelet, indexed by nodelet id. A nodelet with no
        /// neighbors of this vertex has a zero-length range.
        blocks: Box<[CarvedRange]>,
    },
}

impl Adjacency {
    pub fn is_heavy(&self) -> bool {
        matches!(self, Adjacency::Heavy { .. })
    }

    pub fn light(nodelet: usize, base: usize, len: usize) -> Self {
        Adjacency::Light {
            nodelet,
            range: CarvedRange::new(base, len),
        }
    }

    pub fn heavy(bases_and_lens: impl Iterator<Item = (usize, usize)>) -> Self {
        let blocks: Vec<CarvedRange> = bases_and_lens
            .map(|(base, len)| CarvedRange::new(base, len))
            .collect();
        Adjacency::Heavy {
            blocks: blocks.into_boxed_slice(),
        }
    }

    /// Total degree across all storage for this vertex.
    pub fn degree(&self) -> usize {
        match self {
            Adjacency::Light { range, .. } => range.len(),
            Adjacency::Heavy { blocks } => blocks.iter().map(CarvedRange::len).sum(),
        }
    }

    /// Neighbors stored on a specific nodelet. For a light vertex this is
    /// either the whole adjacency (if `nodelet` matches its home) or empty.
    pub fn neighbors_on<'a, Node: Idx>(
        &self,
        nodelet: usize,
        arenas: &'a [NodeletArena<Node>],
    ) -> &'a [Node] {
        match self {
            Adjacency::Light {
                nodelet: home,
                range,
            } => {
                if *home == nodelet {
                    arenas[nodelet].slice(range.base(), range.len())
                } else {
                    &[]
                }
            }
            Adjacency::Heavy { blocks } => {
                let block = &blocks[nodelet];
                arenas[nodelet].slice(block.base(), block.len())
            }
        }
    }

    pub fn range_on(&self, nodelet: usize) -> Option<&CarvedRange> {
        match self {
            Adjacency::Light { nodelet: home, range } if *home == nodelet => Some(range),
            Adjacency::Heavy { blocks } => Some(&blocks[nodelet]),
            _ => None,
        }
    }
}

/// Given the final degree, decide whether a vertex is heavy. The single
/// decision point every pass and the BFS engine must consult.
#[inline]
pub fn classify(degree: usize, heavy_threshold: usize) -> bool {
    degree >= heavy_threshold
}

#[inline]
pub fn owner_nodelet(vertex: usize, nodelets: Nodelets) -> usize {
    nodelets.owner_of(vertex)
}
