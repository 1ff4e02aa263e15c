//! Hooks into a running scan

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Why a record contributed nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The CSV record itself could not be parsed (e.g. invalid UTF-8)
    MalformedRecord(String),
    /// The record has no payload column
    MissingPayload,
    /// The payload did not decode to a document with rounds
    InvalidPayload(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MalformedRecord(e) => write!(f, "malformed record: {}", e),
            SkipReason::MissingPayload => write!(f, "missing payload field"),
            SkipReason::InvalidPayload(e) => write!(f, "invalid payload: {}", e),
        }
    }
}

/// Callbacks invoked by the scan loop
///
/// Every method has a no-op default. Record indices are 1-based positions in
/// the data rows (the header is not counted).
pub trait ScanObserver {
    /// A record was read from the input
    fn on_record(&mut self, _index: u64) {}

    /// A record's payload decoded successfully
    fn on_payload_decoded(&mut self, _index: u64) {}

    /// A record was skipped
    fn on_record_skipped(&mut self, _index: u64, _reason: &SkipReason) {}

    /// A key reached its quota while processing record `index`
    fn on_key_filled(&mut self, _key: &str, _index: u64) {}

    /// Checked once before each record; returning true ends the scan
    fn should_stop(&self) -> bool {
        false
    }
}

/// Observer that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Logs progress every `interval` records and honours a cancellation flag
#[derive(Debug)]
pub struct ProgressObserver {
    interval: u64,
    started: Instant,
    skipped: u64,
    cancel: Option<Arc<AtomicBool>>,
}

impl ProgressObserver {
    /// Log every `interval` records; 0 disables progress lines
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            started: Instant::now(),
            skipped: 0,
            cancel: None,
        }
    }

    /// Stop the scan once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Records skipped so far
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl ScanObserver for ProgressObserver {
    fn on_record(&mut self, index: u64) {
        if self.interval > 0 && index % self.interval == 0 {
            let secs = self.started.elapsed().as_secs_f64().max(f64::EPSILON);
            info!(
                "Processed {} records ({} skipped, {:.0} records/s)",
                index,
                self.skipped,
                index as f64 / secs
            );
        }
    }

    fn on_record_skipped(&mut self, _index: u64, _reason: &SkipReason) {
        self.skipped += 1;
    }

    fn on_key_filled(&mut self, key: &str, index: u64) {
        info!("Quota for '{}' filled at record {}", key, index);
    }

    fn should_stop(&self) -> bool {
        self.cancel
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_counts_skips() {
        let mut observer = ProgressObserver::new(0);
        observer.on_record(1);
        observer.on_record_skipped(1, &SkipReason::MissingPayload);
        assert_eq!(observer.skipped(), 1);
        assert!(!observer.should_stop());
    }

    #[test]
    fn test_cancel_flag() {
        let flag = Arc::new(AtomicBool::new(false));
        let observer = ProgressObserver::new(10).with_cancel_flag(Arc::clone(&flag));
        assert!(!observer.should_stop());
        flag.store(true, Ordering::Relaxed);
        assert!(observer.should_stop());
    }

    #[test]
    fn test_skip_reason_display() {
        let reason = SkipReason::InvalidPayload("'rounds' is not an array".to_string());
        assert_eq!(reason.to_string(), "invalid payload: 'rounds' is not an array");
    }
}
