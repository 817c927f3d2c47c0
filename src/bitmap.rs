//! Distributed bitmap with OR-merge synchronization.
//!
//! Each replica independently accumulates `set_bit` calls; [`sync`] merges
//! every replica's words into every other replica via bitwise OR, which is
//! commutative and associative, so partial concurrent results can never
//! corrupt the final merge.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::nodelets::{remote_or, Replicated};

pub struct Bitmap {
    words: Vec<AtomicU64>,
}

impl Bitmap {
    pub fn new(num_bits: usize) -> Self {
        let n_words = (num_bits + 63) / 64;
        Self {
            words: (0..n_words.max(1)).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    /// Word index owning bit `pos`. Canonical: divide by 64 (a 64-bit word).
    #[inline]
    fn word_offset(pos: usize) -> usize {
        pos >> 6
    }

    #[inline]
    fn bit_mask(pos: usize) -> u64 {
        1u64 << (pos & 63)
    }

    pub fn set_bit(&self, pos: usize) {
        remote_or(&self.words[Self::word_offset(pos)], Self::bit_mask(pos));
    }

    pub fn get_bit(&self, pos: usize) -> bool {
        let word = self.words[Self::word_offset(pos)].load(Ordering::SeqCst);
        (word & Self::bit_mask(pos)) != 0
    }

    pub fn clear(&self) {
        for word in &self.words {
            word.store(0, Ordering::SeqCst);
        }
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    fn word(&self, i: usize) -> &AtomicU64 {
        &self.words[i]
    }
}

pub type ReplicatedBitmap = Replicated<Bitmap>;

/// OR-merges every replica's words into every other replica. After this
/// call, every replica holds the bitwise OR of all prior replica contents.
pub fn sync(bitmaps: &ReplicatedBitmap) {
    if bitmaps.is_empty() {
        return;
    }
    let n_words = bitmaps.view(0).word_count();
    for w in 0..n_words {
        let mut merged = 0u64;
        for replica in bitmaps.iter() {
            merged |= replica.word(w).load(Ordering::SeqCst);
        }
        if merged != 0 {
            for replica in bitmaps.iter() {
                remote_or(replica.word(w), merged);
            }
        }
    }
}

pub fn clear_all(bitmaps: &ReplicatedBitmap) {
    for replica in bitmaps.iter() {
        replica.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodelets::Nodelets;

    #[test]
    fn word_offset_divides_by_64() {
        assert_eq!(Bitmap::word_offset(0), 0);
        assert_eq!(Bitmap::word_offset(63), 0);
        assert_eq!(Bitmap::word_offset(64), 1);
        assert_eq!(Bitmap::word_offset(200), 3);
    }

    #[test]
    fn set_and_get_roundtrip() {
        let b = Bitmap::new(200);
        b.set_bit(5);
        b.set_bit(130);
        assert!(b.get_bit(5));
        assert!(b.get_bit(130));
        assert!(!b.get_bit(6));
    }

    #[test]
    fn sync_ors_all_replicas_together() {
        let nodelets = Nodelets::new(3);
        let bitmaps: ReplicatedBitmap = Replicated::from_fn(nodelets, |_| Bitmap::new(128));
        bitmaps.view(0).set_bit(1);
        bitmaps.view(1).set_bit(70);
        bitmaps.view(2).set_bit(1);
        sync(&bitmaps);
        for replica in bitmaps.iter() {
            assert!(replica.get_bit(1));
            assert!(replica.get_bit(70));
            assert!(!replica.get_bit(2));
        }
    }

    #[test]
    fn clear_all_zeroes_every_replica() {
        let nodelets = Nodelets::new(2);
        let bitmaps: ReplicatedBitmap = Replicated::from_fn(nodelets, |_| Bitmap::new(64));
        bitmaps.view(0).set_bit(3);
        clear_all(&bitmaps);
        assert!(!bitmaps.view(0).get_bit(3));
    }
}
