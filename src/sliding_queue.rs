//! Per-nodelet append-only frontier queue with explicit window checkpoints.
//!
//! This is not a general FIFO. Producers only ever append; a window is
//! published by [`SlidingQueue::slide_window`], which must run with no
//! concurrent writers (the BFS step's join barrier guarantees this).
//! Ordering within a window is unspecified and irrelevant to correctness.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::index::Idx;
use crate::nodelets::{Nodelets, Replicated};

pub struct SlidingQueue<Node: Idx> {
    buffer: UnsafeCell<Box<[Node]>>,
    next: AtomicUsize,
    start: usize,
    end: usize,
    window: usize,
    heads: Vec<usize>,
}

// SAFETY: concurrent `push_back` calls write to disjoint slots (each claims
// a unique index via `next.fetch_add`); everything else requires `&mut self`
// and therefore exclusive access.
unsafe impl<Node: Idx> Sync for SlidingQueue<Node> {}

impl<Node: Idx> SlidingQueue<Node> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: UnsafeCell::new(vec![Node::zero(); capacity].into_boxed_slice()),
            next: AtomicUsize::new(0),
            start: 0,
            end: 0,
            window: 0,
            heads: Vec::new(),
        }
    }

    /// Appends `v`. Safe under concurrent calls: the write cursor hands out
    /// a distinct slot to every caller.
    pub fn push_back(&self, v: Node) {
        let pos = self.next.fetch_add(1, Ordering::SeqCst);
        debug_assert!(pos < unsafe { (*self.buffer.get()).len() }, "queue overflow");
        // SAFETY: `pos` is unique for this call; no other call can observe
        // or write the same slot concurrently.
        unsafe {
            (*self.buffer.get())[pos] = v;
        }
    }

    /// Publishes everything written since the last slide as the current
    /// window. Must not race with concurrent `push_back`.
    pub fn slide_window(&mut self) {
        self.start = self.end;
        self.end = self.next.load(Ordering::SeqCst);
        self.heads.push(self.end);
        self.window += 1;
    }

    /// The current frontier slice, `[start, end)`.
    pub fn window(&self) -> &[Node] {
        let slice = unsafe { &*self.buffer.get() };
        &slice[self.start..self.end]
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn window_count(&self) -> usize {
        self.window
    }

    /// Clears the queue for reuse across BFS trials.
    pub fn reset(&mut self) {
        self.next.store(0, Ordering::SeqCst);
        self.start = 0;
        self.end = 0;
        self.window = 0;
        self.heads.clear();
    }
}

pub type ReplicatedQueue<Node> = Replicated<SlidingQueue<Node>>;

pub fn new_replicated<Node: Idx>(nodelets: Nodelets, capacity_per_replica: usize) -> ReplicatedQueue<Node> {
    Replicated::from_fn(nodelets, |_| SlidingQueue::with_capacity(capacity_per_replica))
}

pub fn all_empty<Node: Idx>(q: &ReplicatedQueue<Node>) -> bool {
    q.iter().all(SlidingQueue::is_empty)
}

pub fn combined_size<Node: Idx>(q: &ReplicatedQueue<Node>) -> usize {
    q.iter().map(SlidingQueue::size).sum()
}

pub fn slide_all_windows<Node: Idx>(q: &mut ReplicatedQueue<Node>) {
    for replica in q.iter_mut() {
        replica.slide_window();
    }
}

pub fn reset_all<Node: Idx>(q: &mut ReplicatedQueue<Node>) {
    for replica in q.iter_mut() {
        replica.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_window_collects_pushed_items() {
        let mut q: SlidingQueue<usize> = SlidingQueue::with_capacity(8);
        q.push_back(3);
        q.push_back(7);
        q.slide_window();
        let mut window = q.window().to_vec();
        window.sort_unstable();
        assert_eq!(window, vec![3, 7]);
    }

    #[test]
    fn successive_slides_only_see_new_items() {
        let mut q: SlidingQueue<usize> = SlidingQueue::with_capacity(8);
        q.push_back(1);
        q.slide_window();
        assert_eq!(q.window(), &[1]);
        q.push_back(2);
        q.push_back(3);
        q.slide_window();
        let mut window = q.window().to_vec();
        window.sort_unstable();
        assert_eq!(window, vec![2, 3]);
        assert_eq!(q.window_count(), 2);
    }

    #[test]
    fn reset_clears_state_for_reuse() {
        let mut q: SlidingQueue<usize> = SlidingQueue::with_capacity(8);
        q.push_back(1);
        q.slide_window();
        q.reset();
        assert!(q.is_empty());
        assert_eq!(q.window_count(), 0);
        q.push_back(9);
        q.slide_window();
        assert_eq!(q.window(), &[9]);
    }

    #[test]
    fn all_empty_and_combined_size_across_replicas() {
        let nodelets = Nodelets::new(3);
        let mut q: ReplicatedQueue<usize> = new_replicated(nodelets, 4);
        assert!(all_empty(&q));
        q.view(1).push_back(5);
        slide_all_windows(&mut q);
        assert!(!all_empty(&q));
        assert_eq!(combined_size(&q), 1);
    }
}
