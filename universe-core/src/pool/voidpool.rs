//! ABA-safe slot allocator (spec §4.B).
//!
//! Reference scheduling model: single-threaded cooperative, guarded by a
//! plain mutex around the free ring. Every cell additionally carries a
//! monotonically increasing 64-bit generation stamp so a late `release` for
//! a slot that has already been reacquired is rejected rather than silently
//! freeing a slot still in use — the shape is deliberately the same one a
//! lock-free MPMC ring (CAS'd `{seq, slot}` cells) would use, so swapping
//! the free-list mutex for atomics later does not change the public API.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// `seq == 0` means "in pool"; any nonzero value is the generation stamp of
/// the outstanding allocation.
const VOID_READY: u64 = 0;

fn next_pow2(n: usize) -> usize {
    if n <= 1 {
        return 1;
    }
    n.next_power_of_two()
}

pub struct VoidPool {
    capacity: usize,
    free_ring: Mutex<Vec<u32>>,
    slot_seq: Vec<AtomicU64>,
    next_seq: AtomicU64,
}

impl VoidPool {
    /// Create an empty pool with the given capacity (rounded up to the next
    /// power of two). Call [`VoidPool::prime`] to populate the free ring.
    pub fn new(capacity: usize) -> Self {
        let cap = next_pow2(capacity.max(1));
        Self {
            capacity: cap,
            free_ring: Mutex::new(Vec::with_capacity(cap)),
            slot_seq: (0..cap).map(|_| AtomicU64::new(VOID_READY)).collect(),
            next_seq: AtomicU64::new(1),
        }
    }

    /// One-time fill with slots `0..n`. `n` must not exceed capacity.
    pub fn prime(&self, n: usize) {
        let n = n.min(self.capacity);
        let mut ring = self.free_ring.lock().unwrap();
        ring.clear();
        ring.extend((0..n as u32).rev());
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn free_count(&self) -> usize {
        self.free_ring.lock().unwrap().len()
    }

    /// Pop a free slot and stamp it with a fresh, never-zero generation.
    /// Returns `None` when the pool is exhausted (`POOL_EXHAUSTED`).
    pub fn acquire(&self) -> Option<(u32, u64)> {
        let slot = self.free_ring.lock().unwrap().pop()?;
        let mut seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        if seq == VOID_READY {
            seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        }
        self.slot_seq[slot as usize].store(seq, Ordering::SeqCst);
        Some((slot, seq))
    }

    /// Release `slot` back to the pool iff `seq` matches the slot's current
    /// stamp. A duplicate or stale release (I-SLOT) returns `false` and the
    /// pool is left untouched.
    pub fn release(&self, slot: u32, seq: u64) -> bool {
        let idx = slot as usize;
        if idx >= self.slot_seq.len() {
            return false;
        }
        let current = self.slot_seq[idx].load(Ordering::SeqCst);
        if current == VOID_READY || current != seq {
            return false;
        }
        if self.slot_seq[idx]
            .compare_exchange(seq, VOID_READY, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        self.free_ring.lock().unwrap().push(slot);
        true
    }
}
