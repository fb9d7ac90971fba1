//! Single-assignment result cell.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Holds the outcome of an invocation, written at most once.
///
/// Every trigger (natural exit, timeout, cancellation, spawn failure) calls
/// [`Completion::resolve`]; only the first call stores its value, the others
/// are reported as rejected.
#[derive(Debug)]
pub struct Completion<T> {
    value: OnceLock<T>,
    rejected: AtomicUsize,
}

impl<T> Completion<T> {
    pub fn new() -> Self {
        Self {
            value: OnceLock::new(),
            rejected: AtomicUsize::new(0),
        }
    }

    /// Stores `value` if nothing was stored yet. Returns whether it was stored.
    pub fn resolve(&self, value: T) -> bool {
        let stored = self.value.set(value).is_ok();
        if !stored {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }
        stored
    }

    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.value.get().is_some()
    }

    /// Number of resolve attempts that lost the race.
    pub fn rejected(&self) -> usize {
        self.rejected.load(Ordering::Relaxed)
    }
}

impl<T> Default for Completion<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn first_resolution_wins() {
        let cell = Completion::new();
        assert!(!cell.is_resolved());
        assert!(cell.resolve("exit"));
        assert!(!cell.resolve("timeout"));
        assert!(!cell.resolve("cancel"));
        assert_eq!(cell.get(), Some(&"exit"));
        assert_eq!(cell.rejected(), 2);
    }

    #[test]
    fn concurrent_resolvers_store_exactly_one_value() {
        let cell = Arc::new(Completion::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || cell.resolve(i))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(cell.rejected(), 15);
        assert!(cell.get().is_some());
    }
}
