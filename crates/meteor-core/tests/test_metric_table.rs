#[allow(dead_code)]
mod common;

use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

use meteor_core::detect::{analyze, DetectionConfig};
use meteor_core::error::MeteorError;
use meteor_core::io::{read_metric_table, write_metric_table};
use meteor_core::series::MetricSeries;

fn write_gz(path: &Path, text: &str) {
    let file = std::fs::File::create(path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

#[test]
fn test_round_trip_is_exact() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("data.csv.gz");
    let series = MetricSeries::from_values(vec![
        Some(0.1),
        None,
        Some(1.0 / 3.0),
        Some(123456.789e-7),
        Some(f64::MIN_POSITIVE),
        None,
    ]);

    write_metric_table(&path, &series).unwrap();
    let loaded = read_metric_table(&path).unwrap();
    assert_eq!(loaded.len(), series.len());
    for (a, b) in loaded.values().iter().zip(series.values()) {
        assert_eq!(a.map(f64::to_bits), b.map(f64::to_bits));
    }
}

#[test]
fn test_detection_from_table_matches_in_memory() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("data.csv.gz");
    let mut values: Vec<Option<f64>> = common::spike_series(9000, 3005..3035, 10.0)
        .values()
        .iter()
        .enumerate()
        .map(|(i, v)| v.map(|v| v + (i % 13) as f64 * 0.01))
        .collect();
    values[42] = None;
    let series = MetricSeries::from_values(values);

    write_metric_table(&path, &series).unwrap();
    let loaded = read_metric_table(&path).unwrap();

    let config = DetectionConfig::default();
    assert_eq!(
        analyze(&series, &config).unwrap(),
        analyze(&loaded, &config).unwrap()
    );
}

#[test]
fn test_table_is_gzip_csv() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("data.csv.gz");
    write_metric_table(&path, &MetricSeries::from_values(vec![Some(2.5), None])).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[..2], &[0x1f, 0x8b]);

    let mut text = String::new();
    std::io::Read::read_to_string(&mut flate2::read::GzDecoder::new(&bytes[..]), &mut text)
        .unwrap();
    assert_eq!(text, "frame,metric\n0,2.5\n1,\n");
}

#[test]
fn test_reads_table_with_index_column() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("legacy.csv.gz");
    write_gz(&path, ",0\n0,1.5\n1,\n2,nan\n3,2.25e-3\n");

    let series = read_metric_table(&path).unwrap();
    assert_eq!(
        series.values(),
        &[Some(1.5), None, None, Some(0.00225)]
    );
}

#[test]
fn test_header_only_table_is_empty() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("empty.csv.gz");
    write_gz(&path, "frame,metric\n");
    assert!(read_metric_table(&path).unwrap().is_empty());
}

#[test]
fn test_rejects_malformed_rows() {
    let tmp = TempDir::new().unwrap();
    let cases = [
        ("missing_column", "frame,metric\n0\n"),
        ("bad_index", "frame,metric\nzero,1.0\n"),
        ("out_of_order", "frame,metric\n0,1.0\n2,1.0\n"),
        ("bad_value", "frame,metric\n0,fast\n"),
    ];
    for (name, text) in cases {
        let path = tmp.path().join(format!("{name}.csv.gz"));
        write_gz(&path, text);
        assert!(
            matches!(read_metric_table(&path), Err(MeteorError::MetricTable(_))),
            "{name} should be rejected"
        );
    }
}

#[test]
fn test_missing_table() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nope.csv.gz");
    assert!(matches!(
        read_metric_table(&path),
        Err(MeteorError::InputNotFound(_))
    ));
}
