//! Emulation of a many-nodelet memory substrate on top of ordinary
//! shared-memory hardware.
//!
//! A "nodelet" is modeled as a logical partition index `0..P` of a single
//! address space rather than a physically separate memory. `Replicated<T>`
//! holds one value per partition; striped arrays are plain `Vec`s addressed
//! with `index % P`. Cross-partition atomics are just `std::sync::atomic`
//! operations dispatched through `rayon` so independent partitions still run
//! on distinct worker threads.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Number of logical nodelets to emulate. Defaults to the physical core
/// count, mirroring how the rest of this codebase sizes its parallel work.
#[derive(Debug, Clone, Copy)]
pub struct Nodelets {
    count: usize,
}

impl Nodelets {
    pub fn new(count: usize) -> Self {
        assert!(count > 0, "nodelet count must be positive");
        Self { count }
    }

    pub fn physical() -> Self {
        Self::new(num_cpus::get_physical().max(1))
    }

    #[inline]
    pub fn count(self) -> usize {
        self.count
    }

    /// Nodelet that owns striped-array index `i`.
    #[inline]
    pub fn owner_of(self, i: usize) -> usize {
        i % self.count
    }
}

/// A value replicated once per nodelet. Writes to one replica never
/// propagate to the others; synchronization is always explicit (see
/// [`crate::bitmap::ReplicatedBitmap::sync`]).
#[derive(Debug)]
pub struct Replicated<T> {
    replicas: Box<[T]>,
}

impl<T> Replicated<T> {
    pub fn from_fn(nodelets: Nodelets, mut init: impl FnMut(usize) -> T) -> Self {
        let replicas = (0..nodelets.count()).map(&mut init).collect::<Vec<_>>();
        Self {
            replicas: replicas.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    #[inline]
    pub fn view(&self, nodelet: usize) -> &T {
        &self.replicas[nodelet]
    }

    #[inline]
    pub fn view_mut(&mut self, nodelet: usize) -> &mut T {
        &mut self.replicas[nodelet]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.replicas.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.replicas.iter_mut()
    }
}

impl<T: Clone> Replicated<T> {
    pub fn splat(nodelets: Nodelets, value: T) -> Self {
        Self::from_fn(nodelets, |_| value.clone())
    }
}

impl<T: Default> Replicated<T> {
    pub fn default_per_replica(nodelets: Nodelets) -> Self {
        Self::from_fn(nodelets, |_| T::default())
    }
}

/// Given a striped array index, return the view of `obj` living on the same
/// nodelet as that index.
#[inline]
pub fn colocated<T>(obj: &Replicated<T>, nodelets: Nodelets, addr: usize) -> &T {
    obj.view(nodelets.owner_of(addr))
}

/// Atomic fetch-add, as if issued at the nodelet owning `target`.
#[inline]
pub fn remote_add(target: &AtomicI64, x: i64) -> i64 {
    target.fetch_add(x, Ordering::SeqCst)
}

/// Atomic fetch-or, as if issued at the nodelet owning `target`.
#[inline]
pub fn remote_or(target: &AtomicU64, x: u64) -> u64 {
    target.fetch_or(x, Ordering::SeqCst)
}

/// Compare-and-swap: if `target` currently holds `expected`, replace it with
/// `new`. Returns the value observed in `target` before the attempt, whether
/// or not the swap succeeded (matching the reference semantics this is
/// ported from: "set to `new` if previously `expected`, returning prior
/// value").
#[inline]
pub fn atomic_cas(target: &AtomicI64, new: i64, expected: i64) -> i64 {
    match target.compare_exchange(expected, new, Ordering::SeqCst, Ordering::SeqCst) {
        Ok(prior) => prior,
        Err(prior) => prior,
    }
}

/// Local atomic fetch-add returning the prior value. Distinct from
/// [`remote_add`] only in intent: this is used to carve a monotonically
/// growing cursor out of a local arena, not to combine a result across
/// nodelets.
#[inline]
pub fn atomic_addms(target: &AtomicI64, delta: i64) -> i64 {
    target.fetch_add(delta, Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_of_stripes_round_robin() {
        let n = Nodelets::new(4);
        assert_eq!(n.owner_of(0), 0);
        assert_eq!(n.owner_of(5), 1);
        assert_eq!(n.owner_of(11), 3);
    }

    #[test]
    fn replicated_from_fn_initializes_each_copy() {
        let n = Nodelets::new(3);
        let r = Replicated::from_fn(n, |i| i * 10);
        assert_eq!(*r.view(0), 0);
        assert_eq!(*r.view(1), 10);
        assert_eq!(*r.view(2), 20);
    }

    #[test]
    fn cas_returns_prior_value_on_success_and_failure() {
        let cell = AtomicI64::new(-5);
        assert_eq!(atomic_cas(&cell, 7, -5), -5);
        assert_eq!(cell.load(Ordering::SeqCst), 7);
        // second attempt expects the old value and fails
        assert_eq!(atomic_cas(&cell, 9, -5), 7);
        assert_eq!(cell.load(Ordering::SeqCst), 7);
    }
}
