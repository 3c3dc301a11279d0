//! Two-way set-associative transposition table.
//!
//! Each bucket holds a depth-preferred slot and an always-replace slot. Entries
//! carry the full 64-bit key, so an index collision reads as a miss.

use chess_core::Move;
use tracing::debug;

use crate::search::MATE_BOUND;

/// Upper limit of the table size in megabytes.
pub const MAX_HASH_MB: usize = 1024;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Bound {
    #[default]
    None,
    /// Fail-low: the true score is at most the stored one.
    Upper,
    /// Fail-high: the true score is at least the stored one.
    Lower,
    Exact,
}

#[derive(Clone, Copy, Debug, Default)]
struct TtEntry {
    key: u64,
    mv: Move,
    score: i16,
    depth: u8,
    bound: Bound,
    pv: bool,
    age: u8,
}

impl TtEntry {
    #[inline(always)]
    fn is_empty(&self) -> bool {
        self.bound == Bound::None
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Bucket {
    depth_preferred: TtEntry,
    always: TtEntry,
}

/// What a successful probe returns. The score is already relative to the probing ply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TtHit {
    pub mv: Move,
    pub score: i32,
    pub depth: u8,
    pub bound: Bound,
    pub pv: bool,
}

pub struct TranspositionTable {
    buckets: Vec<Bucket>,
    age: u8,
}

impl TranspositionTable {
    pub fn new(mb: usize) -> Self {
        let mut tt = Self {
            buckets: Vec::new(),
            age: 0,
        };
        tt.resize(mb);
        tt
    }

    /// Reallocates for `mb` megabytes (clamped to 1..=1024), dropping every entry.
    pub fn resize(&mut self, mb: usize) {
        let mb = mb.clamp(1, MAX_HASH_MB);
        let count = (mb * 1024 * 1024 / std::mem::size_of::<Bucket>()).max(1);
        self.buckets = vec![Bucket::default(); count];
        self.age = 0;
        debug!(mb, buckets = count, "allocated transposition table");
    }

    /// Zeroes every entry, keeping the capacity.
    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(|b| *b = Bucket::default());
        self.age = 0;
    }

    /// Starts a new search generation; older entries become replaceable.
    pub fn new_search(&mut self) {
        self.age = self.age.wrapping_add(1);
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    #[inline(always)]
    fn index(&self, key: u64) -> usize {
        ((u128::from(key) * self.buckets.len() as u128) >> 64) as usize
    }

    /// Hint the CPU to pull the bucket for `key` into cache.
    #[inline(always)]
    pub fn prefetch(&self, key: u64) {
        // SAFETY: `index` is below `len`, and a prefetch never faults.
        #[cfg(target_arch = "x86_64")]
        unsafe {
            use std::arch::x86_64::{_mm_prefetch, _MM_HINT_T0};
            let ptr = self.buckets.as_ptr().add(self.index(key));
            _mm_prefetch::<_MM_HINT_T0>(ptr as *const i8);
        }
        #[cfg(not(target_arch = "x86_64"))]
        let _ = key;
    }

    pub fn probe(&self, key: u64, ply: usize) -> Option<TtHit> {
        let bucket = &self.buckets[self.index(key)];
        [bucket.depth_preferred, bucket.always]
            .into_iter()
            .find(|e| !e.is_empty() && e.key == key)
            .map(|e| TtHit {
                mv: e.mv,
                score: score_from_tt(i32::from(e.score), ply),
                depth: e.depth,
                bound: e.bound,
                pv: e.pv,
            })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn store(
        &mut self,
        key: u64,
        mv: Move,
        score: i32,
        depth: u8,
        bound: Bound,
        pv: bool,
        ply: usize,
    ) {
        let age = self.age;
        let idx = self.index(key);
        let bucket = &mut self.buckets[idx];

        let preferred = &bucket.depth_preferred;
        let slot = if preferred.is_empty() || preferred.age != age || depth >= preferred.depth {
            &mut bucket.depth_preferred
        } else {
            &mut bucket.always
        };

        // Keep a known best move when the new result has none.
        let mv = if mv.is_null() && slot.key == key {
            slot.mv
        } else {
            mv
        };
        *slot = TtEntry {
            key,
            mv,
            score: score_to_tt(score, ply) as i16,
            depth,
            bound,
            pv,
            age,
        };
    }

    /// Permille of the first thousand slots written during the current search.
    pub fn hashfull(&self) -> u32 {
        let sample = &self.buckets[..self.buckets.len().min(500)];
        let used: usize = sample
            .iter()
            .map(|b| {
                [b.depth_preferred, b.always]
                    .iter()
                    .filter(|e| !e.is_empty() && e.age == self.age)
                    .count()
            })
            .sum();
        (used * 1000 / (sample.len() * 2).max(1)) as u32
    }
}

/// Mate scores are stored relative to the node, not the root.
#[inline]
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_BOUND {
        score + ply as i32
    } else if score <= -MATE_BOUND {
        score - ply as i32
    } else {
        score
    }
}

#[inline]
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    if score >= MATE_BOUND {
        score - ply as i32
    } else if score <= -MATE_BOUND {
        score + ply as i32
    } else {
        score
    }
}

#[cfg(test)]
#[path = "tt_tests.rs"]
mod tt_tests;
