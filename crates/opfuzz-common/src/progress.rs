//! Process-wide iteration counter used purely for progress logging.
//!
//! The counter is never read by decoding or invocation logic.

use std::sync::atomic::{AtomicU64, Ordering};

static ITERATIONS: AtomicU64 = AtomicU64::new(0);

/// Count one harness iteration and log every `interval` iterations.
///
/// Returns the updated count.
pub fn record_iteration(op: &str, interval: u64) -> u64 {
    let count = ITERATIONS.fetch_add(1, Ordering::Relaxed) + 1;
    if interval > 0 && count % interval == 0 {
        tracing::info!(op, iterations = count, "progress");
    }
    count
}

/// Current iteration count.
pub fn iterations() -> u64 {
    ITERATIONS.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_is_monotonic() {
        let before = iterations();
        let a = record_iteration("test", 0);
        let b = record_iteration("test", 1);
        assert!(a > before);
        assert!(b > a);
        assert!(iterations() >= b);
    }
}
