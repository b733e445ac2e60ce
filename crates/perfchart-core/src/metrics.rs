//! Global atomic counters for perfchart observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. when a protocol session ends).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters — no allocations, no locking.
pub struct Metrics {
    messages_processed: AtomicU64,
    messages_ignored: AtomicU64,
    cases_evaluated: AtomicU64,
    extrapolations: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            messages_processed: AtomicU64::new(0),
            messages_ignored: AtomicU64::new(0),
            cases_evaluated: AtomicU64::new(0),
            extrapolations: AtomicU64::new(0),
        }
    }

    /// Increment the messages-processed counter by one.
    pub fn inc_messages_processed(&self) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "messages_processed", "counter incremented");
    }

    /// Increment the messages-ignored counter by one.
    pub fn inc_messages_ignored(&self) {
        self.messages_ignored.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "messages_ignored", "counter incremented");
    }

    /// Add `n` to the cases-evaluated counter.
    pub fn add_cases_evaluated(&self, n: u64) {
        self.cases_evaluated.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "cases_evaluated", n, "counter incremented");
    }

    /// Increment the extrapolations counter by one.
    pub fn inc_extrapolations(&self) {
        self.extrapolations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "extrapolations", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            messages_processed = self.messages_processed(),
            messages_ignored = self.messages_ignored(),
            cases_evaluated = self.cases_evaluated(),
            extrapolations = self.extrapolations(),
        );
    }

    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::Relaxed)
    }

    pub fn messages_ignored(&self) -> u64 {
        self.messages_ignored.load(Ordering::Relaxed)
    }

    pub fn cases_evaluated(&self) -> u64 {
        self.cases_evaluated.load(Ordering::Relaxed)
    }

    pub fn extrapolations(&self) -> u64 {
        self.extrapolations.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.messages_processed.store(0, Ordering::Relaxed);
        self.messages_ignored.store(0, Ordering::Relaxed);
        self.cases_evaluated.store(0, Ordering::Relaxed);
        self.extrapolations.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let m = Metrics::new();
        assert_eq!(m.messages_processed(), 0);
        m.inc_messages_processed();
        m.inc_messages_processed();
        assert_eq!(m.messages_processed(), 2);

        m.inc_messages_ignored();
        assert_eq!(m.messages_ignored(), 1);

        m.add_cases_evaluated(5);
        assert_eq!(m.cases_evaluated(), 5);

        m.inc_extrapolations();
        assert_eq!(m.extrapolations(), 1);
    }

    #[test]
    fn reset_zeroes_all() {
        let m = Metrics::new();
        m.inc_messages_processed();
        m.inc_messages_ignored();
        m.add_cases_evaluated(3);
        m.inc_extrapolations();
        m.reset();
        assert_eq!(m.messages_processed(), 0);
        assert_eq!(m.messages_ignored(), 0);
        assert_eq!(m.cases_evaluated(), 0);
        assert_eq!(m.extrapolations(), 0);
    }
}
