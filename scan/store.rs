// ========================================================================================
//                                The partial-sum store
// ========================================================================================
//
// Interior node values live here, never in the caller's buffers. The store has two
// phases. While the up-sweep runs it is a `PendingSums`: atomic slots that sibling
// tasks fill concurrently, each slot exactly once. Afterwards it is frozen into a
// `PartialSums`, a plain read-only buffer that the down-sweep shares freely.

use std::sync::atomic::{AtomicI64, Ordering};

/// Interior slots under construction.
///
/// Relaxed ordering is enough: a parent only reads a child's slot after joining the
/// task that wrote it, and the join itself provides the happens-before edge.
pub struct PendingSums {
    slots: Box<[AtomicI64]>,
}

impl PendingSums {
    /// Allocates `len` zeroed slots.
    pub fn zeroed(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| AtomicI64::new(0)).collect(),
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Panics if `node` is not an interior slot.
    #[inline(always)]
    pub fn read(&self, node: usize) -> i64 {
        self.slots[node].load(Ordering::Relaxed)
    }

    /// Panics if `node` is not an interior slot.
    #[inline(always)]
    pub fn write(&self, node: usize, value: i64) {
        self.slots[node].store(value, Ordering::Relaxed);
    }

    /// Ends the construction phase. Taking `self` by value guarantees no writer
    /// survives the transition.
    pub fn freeze(self) -> PartialSums {
        let slots = self
            .slots
            .into_vec()
            .into_iter()
            .map(AtomicI64::into_inner)
            .collect();
        PartialSums { slots }
    }
}

/// The completed, read-only interior of a sum heap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialSums {
    slots: Box<[i64]>,
}

impl PartialSums {
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Panics if `node` is not an interior slot.
    #[inline(always)]
    pub fn get(&self, node: usize) -> i64 {
        self.slots[node]
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.slots
    }
}
