//! Global atomic counters for explorer activity.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. before a CLI command exits).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    runs_listed: AtomicU64,
    documents_skipped: AtomicU64,
    runs_loaded: AtomicU64,
    annotations_written: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            runs_listed: AtomicU64::new(0),
            documents_skipped: AtomicU64::new(0),
            runs_loaded: AtomicU64::new(0),
            annotations_written: AtomicU64::new(0),
        }
    }

    /// Add `n` runs to the listed counter.
    pub fn add_runs_listed(&self, n: u64) {
        self.runs_listed.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "runs_listed", n, "counter incremented");
    }

    pub fn inc_documents_skipped(&self) {
        self.documents_skipped.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "documents_skipped", "counter incremented");
    }

    pub fn inc_runs_loaded(&self) {
        self.runs_loaded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "runs_loaded", "counter incremented");
    }

    pub fn inc_annotations_written(&self) {
        self.annotations_written.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "annotations_written", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            runs_listed = self.runs_listed(),
            documents_skipped = self.documents_skipped(),
            runs_loaded = self.runs_loaded(),
            annotations_written = self.annotations_written(),
        );
    }

    pub fn runs_listed(&self) -> u64 {
        self.runs_listed.load(Ordering::Relaxed)
    }

    pub fn documents_skipped(&self) -> u64 {
        self.documents_skipped.load(Ordering::Relaxed)
    }

    pub fn runs_loaded(&self) -> u64 {
        self.runs_loaded.load(Ordering::Relaxed)
    }

    pub fn annotations_written(&self) -> u64 {
        self.annotations_written.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.runs_listed.store(0, Ordering::Relaxed);
        self.documents_skipped.store(0, Ordering::Relaxed);
        self.runs_loaded.store(0, Ordering::Relaxed);
        self.annotations_written.store(0, Ordering::Relaxed);
    }
}
