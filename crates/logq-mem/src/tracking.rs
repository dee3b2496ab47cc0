//! Lightweight peak-usage tracking hooks.
//!
//! Keep this optional and cheap. Downstream can wire the peak into whatever
//! observability stack surrounds the pipeline.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct PeakTracker {
    peak_bytes: AtomicUsize,
}

impl PeakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new "used bytes" observation; updates the peak if higher.
    pub fn record_used(&self, used_bytes: usize) {
        self.peak_bytes.fetch_max(used_bytes, Ordering::AcqRel);
        #[cfg(feature = "tracing")]
        tracing::trace!(
            used_bytes,
            peak = self.peak_bytes.load(Ordering::Relaxed),
            "state size"
        );
    }

    pub fn peak(&self) -> usize {
        self.peak_bytes.load(Ordering::Acquire)
    }
}
