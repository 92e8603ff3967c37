use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion activity.
#[derive(Default)]
pub struct IngestMetrics {
    documents_submitted: AtomicU64,
    batches_submitted: AtomicU64,
    raw_bytes_uploaded: AtomicU64,
    failed_submissions: AtomicU64,
}

impl IngestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted request carrying `documents` decoded documents.
    pub fn record_batch(&self, documents: u64) {
        self.batches_submitted.fetch_add(1, Ordering::Relaxed);
        self.documents_submitted
            .fetch_add(documents, Ordering::Relaxed);
    }

    /// Record an accepted raw-file upload of `bytes` bytes.
    pub fn record_raw_upload(&self, bytes: u64) {
        self.batches_submitted.fetch_add(1, Ordering::Relaxed);
        self.raw_bytes_uploaded.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a submission the engine or transport rejected.
    pub fn record_failure(&self) {
        self.failed_submissions.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_submitted: self.documents_submitted.load(Ordering::Relaxed),
            batches_submitted: self.batches_submitted.load(Ordering::Relaxed),
            raw_bytes_uploaded: self.raw_bytes_uploaded.load(Ordering::Relaxed),
            failed_submissions: self.failed_submissions.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Decoded documents accepted by the engine.
    pub documents_submitted: u64,
    /// Requests accepted by the engine, raw uploads included.
    pub batches_submitted: u64,
    /// Bytes sent through raw-file passthrough.
    pub raw_bytes_uploaded: u64,
    /// Submissions that failed after being sent.
    pub failed_submissions: u64,
}
