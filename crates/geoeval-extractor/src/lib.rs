//! geoeval Extractor
//!
//! Bounded streaming extraction of per-key samples from large game-record
//! CSV exports.
//!
//! # Overview
//!
//! Each input record carries a JSON document in one of its columns. The
//! document holds a list of rounds; every round that names a key of interest
//! becomes a candidate row. The extractor keeps at most `quota` rows per key
//! and stops reading the moment every key is full, so a multi-gigabyte export
//! is only read as far as needed and never held in memory.
//!
//! # Architecture
//!
//! ```text
//! CSV → record → PayloadDocument → RoundSelector → rounds
//!     → CandidateExtractor → QuotaTracker → OutputTable → CSV
//! ```
//!
//! Records with malformed payloads are skipped and reported to the
//! `ScanObserver`; only I/O failures on the input or output abort a scan.
//!
//! # Example Usage
//!
//! ```no_run
//! use geoeval_extractor::{ExtractorConfig, ProgressObserver, StreamingExtractor};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExtractorConfig::panoids_with_coords(
//!     "tuxun_combined.csv",
//!     "panoids_with_coords.csv",
//!     vec!["Canada".to_string(), "Japan".to_string()],
//! );
//!
//! let extractor = StreamingExtractor::from_config(&config)?;
//! let mut observer = ProgressObserver::new(config.progress_interval);
//! let outcome = extractor.run(&config, &mut observer)?;
//!
//! println!("Collected {} rows", outcome.table.len());
//! println!("Unfilled keys: {:?}", outcome.stats.unfilled_keys);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod config;
mod types;
mod payload;
mod candidate;
mod observer;
mod extractor;
mod preview;


pub use error::ExtractorError;
pub use config::{ExtractorConfig, ValueField};
pub use types::{OutputTable, ScanOutcome, ScanStats};
pub use payload::{PayloadDocument, RoundSelector, RoundVariant, RoundsField};
pub use candidate::{render_cell, CandidateExtractor, FieldExtractor};
pub use observer::{NoopObserver, ProgressObserver, ScanObserver, SkipReason};
pub use extractor::StreamingExtractor;
pub use preview::{preview, preview_path, DEFAULT_PREVIEW_ROWS};
