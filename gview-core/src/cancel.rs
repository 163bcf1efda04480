//! Cooperative cancellation primitive shared by all streaming query paths.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cheaply cloneable, cooperative cancellation flag.
///
/// Workers check [`CancellationToken::is_cancelled`] at every iteration of
/// their inner loop (per record, per chunk, per container) and exit cleanly
/// without committing partial results as final. Cancellation never aborts
/// mid-read; the in-flight record or block is always finished first.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new, unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the token as cancelled. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether the token has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_observed_by_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
