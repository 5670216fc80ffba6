//! Non-blocking re-entrancy guard.
//!
//! At most one pass runs at a time. A second caller does not wait; it gets
//! `None` and is expected to skip its pass entirely.

use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct PassGuard {
    running: AtomicBool,
}

impl PassGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the guard. Released when the returned permit is dropped,
    /// including on unwind.
    pub fn try_acquire(&self) -> Option<PassPermit<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassPermit { guard: self })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct PassPermit<'a> {
    guard: &'a PassGuard,
}

impl Drop for PassPermit<'_> {
    fn drop(&mut self) {
        self.guard.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let g = PassGuard::new();
        let permit = g.try_acquire().expect("first acquire");
        assert!(g.is_running());
        assert!(g.try_acquire().is_none());
        drop(permit);
        assert!(!g.is_running());
        assert!(g.try_acquire().is_some());
    }
}
