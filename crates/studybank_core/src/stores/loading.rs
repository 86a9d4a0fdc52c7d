//! crates/studybank_core/src/stores/loading.rs
//!
//! Re-entrant loading indicator. Overlapping actions each hold a guard;
//! the store reads as loading until the last guard is dropped.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct LoadingCounter {
    in_flight: AtomicUsize,
}

impl LoadingCounter {
    /// Marks one action as started. The action ends when the guard drops,
    /// on success, failure, or early return alike.
    pub fn begin(&self) -> LoadingGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        LoadingGuard { counter: self }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight() > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[must_use = "the action stops counting as in flight once the guard is dropped"]
pub struct LoadingGuard<'a> {
    counter: &'a LoadingCounter,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.counter.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_loading_until_every_guard_drops() {
        let counter = LoadingCounter::default();
        assert!(!counter.is_loading());

        let first = counter.begin();
        let second = counter.begin();
        drop(first);
        assert!(counter.is_loading());

        drop(second);
        assert!(!counter.is_loading());
    }
}
