//! Parallel iteration primitives shared by graph construction and BFS.
//!
//! Every parallel stage in this crate bottoms out in [`parallel_chunks`] or
//! [`apply_striped`]; both join all spawned work before returning, which is
//! the fence every caller relies on between BFS steps and between
//! construction passes.

use rayon::Scope;

use crate::nodelets::Nodelets;

/// Minimum chunk size for neighbor-scanning work (BFS steps, edge-block
/// sizing). Small enough to keep light vertices from spawning pointless
/// tasks, large enough to amortize spawn overhead.
pub const NEIGHBOR_SCAN_MIN_GRAIN: usize = 128;

/// Minimum chunk size for iterating a sliding-queue window.
pub const QUEUE_ITER_MIN_GRAIN: usize = 8;

/// `grain = max(min_grain, ceil(len / 64))`: scales with input size so that
/// large frontiers still produce on the order of 64 tasks.
#[inline]
pub fn grain_for(len: usize, min_grain: usize) -> usize {
    min_grain.max((len + 63) / 64)
}

/// Partition `[begin, end)` into `grain`-sized chunks and run `f` on each,
/// spawning one task per chunk when the range exceeds a single grain.
/// Executes inline with no spawn when the whole range already fits in one
/// chunk.
pub fn parallel_chunks(begin: usize, end: usize, grain: usize, f: impl Fn(usize, usize) + Sync) {
    if end <= begin {
        return;
    }
    let grain = grain.max(1);
    if end - begin <= grain {
        f(begin, end);
        return;
    }
    rayon::scope(|s: &Scope| {
        let mut start = begin;
        while start < end {
            let chunk_end = (start + grain).min(end);
            let f = &f;
            s.spawn(move |_| f(start, chunk_end));
            start = chunk_end;
        }
    });
}

/// Single-nodelet parallel-for: calls `f(i)` for every `i` in `[begin, end)`,
/// partitioned into tasks of size `grain`.
pub fn local_for(begin: usize, end: usize, grain: usize, f: impl Fn(usize) + Sync) {
    parallel_chunks(begin, end, grain, |lo, hi| {
        for i in lo..hi {
            f(i);
        }
    });
}

/// Striped dispatch: spawns one top-level task per nodelet, each of which
/// walks its stripe `n, n+P, n+2P, ...` up to `count` (exclusive), chunked by
/// `grain`. Joins all nodelets' work before returning.
pub fn apply_striped(count: usize, nodelets: Nodelets, grain: usize, f: impl Fn(usize) + Sync) {
    let p = nodelets.count();
    rayon::scope(|s: &Scope| {
        for nodelet in 0..p {
            let f = &f;
            s.spawn(move |_| {
                let stripe_len = if count > nodelet {
                    (count - nodelet - 1) / p + 1
                } else {
                    0
                };
                parallel_chunks(0, stripe_len, grain, |lo, hi| {
                    for k in lo..hi {
                        f(nodelet + k * p);
                    }
                });
            });
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn parallel_chunks_visits_every_index_exactly_once() {
        let seen: Vec<AtomicUsize> = (0..200).map(|_| AtomicUsize::new(0)).collect();
        parallel_chunks(0, 200, 7, |lo, hi| {
            for i in lo..hi {
                seen[i].fetch_add(1, Ordering::SeqCst);
            }
        });
        assert!(seen.iter().all(|c| c.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn apply_striped_visits_every_index_exactly_once() {
        let n = Nodelets::new(5);
        let seen: Vec<AtomicUsize> = (0..123).map(|_| AtomicUsize::new(0)).collect();
        apply_striped(123, n, 3, |i| {
            seen[i].fetch_add(1, Ordering::SeqCst);
        });
        assert!(seen.iter().all(|c| c.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn grain_for_respects_floor_and_scaling() {
        assert_eq!(grain_for(10, 128), 128);
        assert_eq!(grain_for(640, 128), 128);
        assert_eq!(grain_for(6400, 128), 128.max(100));
    }
}
