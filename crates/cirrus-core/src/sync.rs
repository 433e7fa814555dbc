//! Single-slot lock used to keep at most one operation in flight.

use std::sync::atomic::{AtomicBool, Ordering};

/// A non-blocking lock with exactly one slot.
///
/// `try_acquire` either hands out the slot or returns `None` immediately;
/// there is no waiting. The slot is released when the returned guard drops,
/// so every exit path (success, error, panic, cancellation of the owning
/// future) frees it.
#[derive(Debug, Default)]
pub struct SingleSlot {
    held: AtomicBool,
}

impl SingleSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the slot if it is free.
    pub fn try_acquire(&self) -> Option<SlotGuard<'_>> {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SlotGuard { slot: self })
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

/// Releases its [`SingleSlot`] on drop.
#[derive(Debug)]
pub struct SlotGuard<'a> {
    slot: &'a SingleSlot,
}

impl Drop for SlotGuard<'_> {
    fn drop(&mut self) {
        self.slot.held.store(false, Ordering::Release);
    }
}
