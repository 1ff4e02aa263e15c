//! Core Extractor implementation

use crate::candidate::{CandidateExtractor, FieldExtractor};
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::observer::{ScanObserver, SkipReason};
use crate::payload::{PayloadDocument, RoundSelector, RoundVariant, RoundsField};
use crate::types::{OutputTable, ScanOutcome, ScanStats};
use geoeval_domain::{Candidate, Offer, QuotaTracker};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Scans a CSV stream once, collecting up to `quota` candidates per key of
/// interest and stopping as soon as every key is full
pub struct StreamingExtractor<S = RoundsField, E = FieldExtractor>
where
    S: RoundSelector,
    E: CandidateExtractor,
{
    keys_of_interest: Vec<String>,
    quota: usize,
    payload_column: String,
    headers: Vec<String>,
    selector: S,
    extractor: E,
}

impl StreamingExtractor<RoundsField, FieldExtractor> {
    /// Build the field-based extractor described by `config`
    pub fn from_config(config: &ExtractorConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;

        let selector = RoundsField::new(&config.rounds_field);
        let extractor = FieldExtractor::new(
            config.key_field.clone(),
            config.value_fields.iter().map(|f| f.field.clone()),
        );

        Ok(StreamingExtractor::new(
            config.keys_of_interest.clone(),
            config.quota,
            selector,
            extractor,
        )
        .with_payload_column(config.payload_column.clone())
        .with_headers(config.headers()))
    }
}

impl<S, E> StreamingExtractor<S, E>
where
    S: RoundSelector,
    E: CandidateExtractor,
{
    /// Create a new extractor reading payloads from the `data` column
    pub fn new(keys_of_interest: Vec<String>, quota: usize, selector: S, extractor: E) -> Self {
        Self {
            keys_of_interest,
            quota,
            payload_column: "data".to_string(),
            headers: vec!["key".to_string()],
            selector,
            extractor,
        }
    }

    /// Read payloads from a different column
    pub fn with_payload_column(mut self, column: impl Into<String>) -> Self {
        self.payload_column = column.into();
        self
    }

    /// Set the output table headers
    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.headers = headers;
        self
    }

    /// Scan the CSV file at `path`
    ///
    /// The file is closed on every exit path, including early termination.
    pub fn scan_path<P, O>(&self, path: P, observer: &mut O) -> Result<ScanOutcome, ExtractorError>
    where
        P: AsRef<Path>,
        O: ScanObserver + ?Sized,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            ExtractorError::OpenInput(path.display().to_string(), e.to_string())
        })?;
        info!("Scanning {}", path.display());
        self.scan(file, observer)
    }

    /// Scan a CSV stream with a header row
    pub fn scan<R, O>(&self, reader: R, observer: &mut O) -> Result<ScanOutcome, ExtractorError>
    where
        R: Read,
        O: ScanObserver + ?Sized,
    {
        let start = Instant::now();
        let mut stats = ScanStats::default();
        let mut tracker: QuotaTracker<Candidate> =
            QuotaTracker::new(self.keys_of_interest.iter().cloned(), self.quota);

        if tracker.is_satisfied() {
            info!("No keys to collect, skipping scan");
            return Ok(self.finish(tracker, stats, start));
        }

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let payload_index = csv_reader
            .headers()?
            .iter()
            .position(|h| h == self.payload_column);
        if payload_index.is_none() {
            warn!(
                "Input has no '{}' column; every record will be skipped",
                self.payload_column
            );
        }

        info!(
            "Collecting up to {} items for {} keys",
            self.quota,
            self.keys_of_interest.len()
        );

        let mut record = csv::StringRecord::new();
        'records: loop {
            if observer.should_stop() {
                info!("Scan cancelled after {} records", stats.records_read);
                stats.cancelled = true;
                break;
            }

            match csv_reader.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => {
                    stats.records_read += 1;
                    let index = stats.records_read;
                    observer.on_record(index);
                    self.skip(&mut stats, observer, index, SkipReason::MalformedRecord(e.to_string()));
                    continue;
                }
            }

            stats.records_read += 1;
            let index = stats.records_read;
            observer.on_record(index);

            let raw = match payload_index.and_then(|i| record.get(i)) {
                Some(raw) => raw,
                None => {
                    self.skip(&mut stats, observer, index, SkipReason::MissingPayload);
                    continue;
                }
            };

            let rounds = match PayloadDocument::decode(raw, &self.selector) {
                PayloadDocument::Document { rounds } => rounds,
                PayloadDocument::Invalid(reason) => {
                    self.skip(&mut stats, observer, index, SkipReason::InvalidPayload(reason));
                    continue;
                }
            };
            stats.payloads_decoded += 1;
            observer.on_payload_decoded(index);

            for round in rounds {
                stats.rounds_seen += 1;

                let candidate = match round {
                    RoundVariant::Mapping(map) => match self.extractor.extract(&map) {
                        Some(candidate) => candidate,
                        None => continue,
                    },
                    RoundVariant::NotAMapping => continue,
                };

                let key = candidate.key.clone();
                let first_match = (tracker.total() == 0).then(|| candidate.to_string());

                let offer = tracker.offer(&key, candidate);
                if let Some(summary) = first_match.filter(|_| offer.is_retained()) {
                    info!("First match at record {}: {}", index, summary);
                }
                if offer == Offer::Filled {
                    info!("Collected {} items for '{}'", self.quota, key);
                    observer.on_key_filled(&key, index);
                }

                if tracker.is_satisfied() {
                    stats.stopped_early = true;
                    info!("All quotas filled at record {}, stopping", index);
                    break 'records;
                }
            }
        }

        Ok(self.finish(tracker, stats, start))
    }

    /// Scan `config.input_path` and write the table to `config.output_path`
    pub fn run<O>(&self, config: &ExtractorConfig, observer: &mut O) -> Result<ScanOutcome, ExtractorError>
    where
        O: ScanObserver + ?Sized,
    {
        let outcome = self.scan_path(&config.input_path, observer)?;
        outcome.table.write_path(&config.output_path)?;
        info!(
            "Wrote {} rows to {}",
            outcome.table.len(),
            config.output_path.display()
        );
        Ok(outcome)
    }

    fn skip<O>(&self, stats: &mut ScanStats, observer: &mut O, index: u64, reason: SkipReason)
    where
        O: ScanObserver + ?Sized,
    {
        debug!("Skipping record {}: {}", index, reason);
        stats.records_skipped += 1;
        observer.on_record_skipped(index, &reason);
    }

    fn finish(&self, tracker: QuotaTracker<Candidate>, mut stats: ScanStats, start: Instant) -> ScanOutcome {
        stats.unfilled_keys = tracker.pending().into_iter().map(str::to_string).collect();
        stats.candidates_retained = tracker.total();
        stats.elapsed_ms = start.elapsed().as_millis() as u64;

        let mut table = OutputTable::new(self.headers.clone());
        for (_, candidates) in tracker.into_groups() {
            table.rows.extend(candidates.into_iter().map(Candidate::into_row));
        }

        info!(
            "Scan complete: {} records read, {} skipped, {} rows collected",
            stats.records_read,
            stats.records_skipped,
            table.len()
        );

        ScanOutcome { table, stats }
    }
}
