use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use parking_lot::Mutex;

use crate::error::Error;

/// Codec metrics collector
#[derive(Debug)]
pub struct CodecMetrics {
    // Operation counts
    /// Number of documents encoded
    documents_encoded: AtomicUsize,
    /// Number of documents decoded successfully
    documents_decoded: AtomicUsize,
    /// Number of decodes that failed
    decode_faults: AtomicUsize,

    // Data metrics
    /// Total bytes produced by encode
    bytes_encoded: AtomicUsize,
    /// Total bytes consumed by successful decodes
    bytes_decoded: AtomicUsize,
    /// Number of unknown fields skipped while decoding
    unknown_fields_skipped: AtomicUsize,

    // Timing metrics
    /// Total encode duration in nanoseconds
    encode_duration_ns: AtomicU64,
    /// Total decode duration in nanoseconds
    decode_duration_ns: AtomicU64,

    /// Description of the most recent decode fault
    last_fault: Mutex<Option<String>>,

    /// Start time of the metrics collector
    start_time: Instant,
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            documents_encoded: AtomicUsize::new(0),
            documents_decoded: AtomicUsize::new(0),
            decode_faults: AtomicUsize::new(0),

            bytes_encoded: AtomicUsize::new(0),
            bytes_decoded: AtomicUsize::new(0),
            unknown_fields_skipped: AtomicUsize::new(0),

            encode_duration_ns: AtomicU64::new(0),
            decode_duration_ns: AtomicU64::new(0),

            last_fault: Mutex::new(None),

            start_time: Instant::now(),
        }
    }

    /// Record a finished encode
    pub fn record_encode(&self, bytes: usize, duration: Duration) {
        self.documents_encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_encoded.fetch_add(bytes, Ordering::Relaxed);
        self.encode_duration_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Record a successful decode
    pub fn record_decode(&self, bytes: usize, skipped_fields: usize, duration: Duration) {
        self.documents_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_decoded.fetch_add(bytes, Ordering::Relaxed);
        self.unknown_fields_skipped
            .fetch_add(skipped_fields, Ordering::Relaxed);
        self.decode_duration_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Record a failed decode
    pub fn record_fault(&self, err: &Error) {
        self.decode_faults.fetch_add(1, Ordering::Relaxed);
        *self.last_fault.lock() = Some(err.to_string());
    }

    /// Number of documents encoded
    pub fn documents_encoded(&self) -> usize {
        self.documents_encoded.load(Ordering::Relaxed)
    }

    /// Number of documents decoded successfully
    pub fn documents_decoded(&self) -> usize {
        self.documents_decoded.load(Ordering::Relaxed)
    }

    /// Number of failed decodes
    pub fn decode_faults(&self) -> usize {
        self.decode_faults.load(Ordering::Relaxed)
    }

    /// Total bytes produced by encode
    pub fn bytes_encoded(&self) -> usize {
        self.bytes_encoded.load(Ordering::Relaxed)
    }

    /// Total bytes consumed by successful decodes
    pub fn bytes_decoded(&self) -> usize {
        self.bytes_decoded.load(Ordering::Relaxed)
    }

    /// Number of unknown fields skipped
    pub fn unknown_fields_skipped(&self) -> usize {
        self.unknown_fields_skipped.load(Ordering::Relaxed)
    }

    /// Description of the most recent decode fault
    pub fn last_fault(&self) -> Option<String> {
        self.last_fault.lock().clone()
    }

    /// Average encode time
    pub fn avg_encode_duration(&self) -> Duration {
        let count = self.documents_encoded() as u64;
        if count == 0 {
            return Duration::from_nanos(0);
        }
        Duration::from_nanos(self.encode_duration_ns.load(Ordering::Relaxed) / count)
    }

    /// Average decode time over successful decodes
    pub fn avg_decode_duration(&self) -> Duration {
        let count = self.documents_decoded() as u64;
        if count == 0 {
            return Duration::from_nanos(0);
        }
        Duration::from_nanos(self.decode_duration_ns.load(Ordering::Relaxed) / count)
    }

    /// Time since the collector was created
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.documents_encoded.store(0, Ordering::Relaxed);
        self.documents_decoded.store(0, Ordering::Relaxed);
        self.decode_faults.store(0, Ordering::Relaxed);
        self.bytes_encoded.store(0, Ordering::Relaxed);
        self.bytes_decoded.store(0, Ordering::Relaxed);
        self.unknown_fields_skipped.store(0, Ordering::Relaxed);
        self.encode_duration_ns.store(0, Ordering::Relaxed);
        self.decode_duration_ns.store(0, Ordering::Relaxed);
        *self.last_fault.lock() = None;
    }

    /// Create a human-readable report of the metrics
    pub fn report(&self) -> String {
        let mut result = String::new();

        result.push_str("=== Codec Metrics ===\n\n");
        result.push_str(&format!("Documents Encoded: {}\n", self.documents_encoded()));
        result.push_str(&format!("Documents Decoded: {}\n", self.documents_decoded()));
        result.push_str(&format!("Decode Faults: {}\n", self.decode_faults()));
        result.push_str(&format!("Bytes Encoded: {}\n", self.bytes_encoded()));
        result.push_str(&format!("Bytes Decoded: {}\n", self.bytes_decoded()));
        result.push_str(&format!("Unknown Fields Skipped: {}\n", self.unknown_fields_skipped()));
        result.push_str(&format!("Avg. Encode Time: {:?}\n", self.avg_encode_duration()));
        result.push_str(&format!("Avg. Decode Time: {:?}\n", self.avg_decode_duration()));
        if let Some(fault) = self.last_fault() {
            result.push_str(&format!("Last Fault: {}\n", fault));
        }

        result
    }
}
