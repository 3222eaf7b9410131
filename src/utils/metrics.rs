//! Observability and Metrics
//!
//! Counters for packet encoding/decoding, framing failures and metadata
//! coercion, plus sequence assignment.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Global metrics collector for packet operations
#[derive(Debug)]
pub struct Metrics {
    /// Packets successfully encoded
    pub packets_encoded: AtomicU64,
    /// Packets successfully decoded
    pub packets_decoded: AtomicU64,
    /// Bytes written by the encoder (prefixes included)
    pub bytes_encoded: AtomicU64,
    /// Bytes consumed by the decoder (prefixes included)
    pub bytes_decoded: AtomicU64,
    /// Truncated or oversized frames
    pub malformed_frames: AtomicU64,
    /// Header encode/decode failures
    pub header_errors: AtomicU64,
    /// Body encode/decode failures
    pub body_errors: AtomicU64,
    /// Lenient metadata reads that fell back to a zero value
    pub meta_coercion_failures: AtomicU64,
    /// Sequences drawn from a generator by the header builder
    pub sequences_assigned: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            packets_encoded: AtomicU64::new(0),
            packets_decoded: AtomicU64::new(0),
            bytes_encoded: AtomicU64::new(0),
            bytes_decoded: AtomicU64::new(0),
            malformed_frames: AtomicU64::new(0),
            header_errors: AtomicU64::new(0),
            body_errors: AtomicU64::new(0),
            meta_coercion_failures: AtomicU64::new(0),
            sequences_assigned: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record an encoded packet
    pub fn packet_encoded(&self, byte_count: u64) {
        self.packets_encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_encoded.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a decoded packet
    pub fn packet_decoded(&self, byte_count: u64) {
        self.packets_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_decoded.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a truncated or oversized frame
    pub fn malformed_frame(&self) {
        self.malformed_frames.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a header serialization failure
    pub fn header_error(&self) {
        self.header_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a body serialization failure
    pub fn body_error(&self) {
        self.body_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lenient metadata coercion failure
    pub fn meta_coercion_failure(&self) {
        self.meta_coercion_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a generator-assigned sequence
    pub fn sequence_assigned(&self) {
        self.sequences_assigned.fetch_add(1, Ordering::Relaxed);
    }

    /// Classify and record a codec error
    pub fn codec_error(&self, err: &crate::error::ProtocolError) {
        use crate::error::ProtocolError;

        match err {
            ProtocolError::MalformedFrame(_) | ProtocolError::OversizedFrame(_) => {
                self.malformed_frame()
            }
            ProtocolError::HeaderEncode(_) | ProtocolError::HeaderDecode(_) => self.header_error(),
            ProtocolError::BodyEncode(_) | ProtocolError::BodyDecode(_) => self.body_error(),
            _ => {}
        }
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            packets_encoded: self.packets_encoded.load(Ordering::Relaxed),
            packets_decoded: self.packets_decoded.load(Ordering::Relaxed),
            bytes_encoded: self.bytes_encoded.load(Ordering::Relaxed),
            bytes_decoded: self.bytes_decoded.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            header_errors: self.header_errors.load(Ordering::Relaxed),
            body_errors: self.body_errors.load(Ordering::Relaxed),
            meta_coercion_failures: self.meta_coercion_failures.load(Ordering::Relaxed),
            sequences_assigned: self.sequences_assigned.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            packets_encoded = snapshot.packets_encoded,
            packets_decoded = snapshot.packets_decoded,
            bytes_encoded = snapshot.bytes_encoded,
            bytes_decoded = snapshot.bytes_decoded,
            malformed_frames = snapshot.malformed_frames,
            header_errors = snapshot.header_errors,
            body_errors = snapshot.body_errors,
            meta_coercion_failures = snapshot.meta_coercion_failures,
            sequences_assigned = snapshot.sequences_assigned,
            uptime_seconds = snapshot.uptime_seconds,
            "Packet metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub packets_encoded: u64,
    pub packets_decoded: u64,
    pub bytes_encoded: u64,
    pub bytes_decoded: u64,
    pub malformed_frames: u64,
    pub header_errors: u64,
    pub body_errors: u64,
    pub meta_coercion_failures: u64,
    pub sequences_assigned: u64,
    pub uptime_seconds: u64,
}

static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(Metrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static Metrics {
    &METRICS
}
