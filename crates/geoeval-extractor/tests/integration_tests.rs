//! Integration tests for geoeval-extractor
//!
//! These tests drive both collector presets through real files on disk.

use geoeval_extractor::{ExtractorConfig, NoopObserver, ProgressObserver, StreamingExtractor};
use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn write_games(path: &Path, payloads: &[&str]) {
    let mut writer = csv::Writer::from_path(path).unwrap();
    writer.write_record(["gameId", "data"]).unwrap();
    for (i, payload) in payloads.iter().enumerate() {
        writer.write_record([i.to_string().as_str(), payload]).unwrap();
    }
    writer.flush().unwrap();
}

fn games() -> Vec<&'static str> {
    vec![
        r#"{"rounds":[{"nation":"Japan","panoId":"j1","lat":35.0,"lng":139.0},{"nation":"Brazil","panoId":"b1","lat":-23.5,"lng":-46.6}]}"#,
        "not json",
        r#"{"rounds":[{"nation":"Japan","panoId":"j2","lat":34.7,"lng":135.5}]}"#,
        r#"{"rounds":[{"nation":"Canada","panoId":"c1","lat":45.5,"lng":-73.5},{"nation":"Japan","panoId":"j3","lat":43.0,"lng":141.3}]}"#,
        r#"{"rounds":[{"nation":"Canada","panoId":"c2","lat":49.2,"lng":-123.1}]}"#,
    ]
}

#[test]
fn test_panoid_preset_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tuxun_combined.csv");
    let output = dir.path().join("panoids.csv");
    write_games(&input, &games());

    let mut config = ExtractorConfig::panoids(&input, &output, vec!["Japan".into(), "Canada".into()]);
    config.quota = 2;

    let extractor = StreamingExtractor::from_config(&config).unwrap();
    let outcome = extractor.run(&config, &mut NoopObserver).unwrap();

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written, "nation,panoID\nJapan,j1\nJapan,j2\nCanada,c1\nCanada,c2\n");
    assert!(outcome.stats.stopped_early);
    assert_eq!(outcome.stats.records_read, 5);
    assert_eq!(outcome.stats.records_skipped, 1);
    assert!(outcome.stats.unfilled_keys.is_empty());
}

#[test]
fn test_coords_preset_reports_unfilled_keys() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("tuxun_combined.csv");
    let output = dir.path().join("panoids_with_coords.csv");
    write_games(&input, &games());

    let mut config =
        ExtractorConfig::panoids_with_coords(&input, &output, vec!["Brazil".into(), "France".into()]);
    config.quota = 3;

    let extractor = StreamingExtractor::from_config(&config).unwrap();
    let mut observer = ProgressObserver::new(2).with_cancel_flag(Arc::new(AtomicBool::new(false)));
    let outcome = extractor.run(&config, &mut observer).unwrap();

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written, "nation,panoID,lat,lng\nBrazil,b1,-23.5,-46.6\n");
    assert!(!outcome.stats.stopped_early);
    assert_eq!(outcome.stats.unfilled_keys, vec!["Brazil", "France"]);
    assert_eq!(observer.skipped(), 1);
}

#[test]
fn test_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("collect.toml");
    let config = ExtractorConfig::panoids_with_coords("in.csv", "out.csv", vec!["Kenya".into()]);
    fs::write(&path, config.to_toml().unwrap()).unwrap();

    let loaded = ExtractorConfig::from_file(&path).unwrap();
    assert_eq!(loaded.headers(), config.headers());
    assert_eq!(loaded.keys_of_interest, vec!["Kenya"]);
}

#[test]
fn test_missing_input_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = ExtractorConfig::panoids(
        dir.path().join("absent.csv"),
        dir.path().join("out.csv"),
        vec!["Japan".into()],
    );
    let extractor = StreamingExtractor::from_config(&config).unwrap();
    assert!(extractor.run(&config, &mut NoopObserver).is_err());
    assert!(!dir.path().join("out.csv").exists());
}
