//! Gzip-compressed CSV persistence of a [`MetricSeries`].
//!
//! Layout: a header line, then one `frame,metric` row per frame in order. An
//! undefined metric is an empty cell. Floats use Rust's shortest round-trip
//! formatting, so a reloaded series is bit-identical to the one written.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::info;

use crate::error::{MeteorError, Result};
use crate::series::MetricSeries;

const HEADER: &str = "frame,metric";

/// Write `series` to `path` as gzip CSV.
pub fn write_metric_table(path: &Path, series: &MetricSeries) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(GzEncoder::new(file, Compression::default()));

    writeln!(writer, "{HEADER}")?;
    for (index, value) in series.values().iter().enumerate() {
        match value {
            Some(v) => writeln!(writer, "{index},{v}")?,
            None => writeln!(writer, "{index},")?,
        }
    }

    let encoder = writer
        .into_inner()
        .map_err(|e| MeteorError::Io(e.into_error()))?;
    encoder.finish()?.sync_all()?;

    info!(path = %path.display(), rows = series.len(), "Metric table written");
    Ok(())
}

/// Load a series written by [`write_metric_table`].
///
/// Any two-column table whose first column is the 0-based frame number is
/// accepted, which includes pandas `to_csv` output with an unnamed index.
pub fn read_metric_table(path: &Path) -> Result<MetricSeries> {
    if !path.is_file() {
        return Err(MeteorError::InputNotFound(path.to_path_buf()));
    }
    let reader = BufReader::new(GzDecoder::new(File::open(path)?));
    let mut series = MetricSeries::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line_no == 0 {
            continue;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let row = line_no - 1;
        let (index, value) = line.split_once(',').ok_or_else(|| {
            MeteorError::MetricTable(format!("line {}: expected two columns", line_no + 1))
        })?;
        let index: usize = index.trim().parse().map_err(|_| {
            MeteorError::MetricTable(format!("line {}: bad frame number {index:?}", line_no + 1))
        })?;
        if index != row {
            return Err(MeteorError::MetricTable(format!(
                "line {}: frame {index} out of order, expected {row}",
                line_no + 1
            )));
        }
        series.insert(index, parse_metric(value, line_no + 1)?);
    }

    info!(path = %path.display(), rows = series.len(), "Metric table loaded");
    Ok(series)
}

fn parse_metric(cell: &str, line: usize) -> Result<Option<f64>> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    let value: f64 = cell
        .parse()
        .map_err(|_| MeteorError::MetricTable(format!("line {line}: bad metric {cell:?}")))?;
    Ok(value.is_finite().then_some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metric_cells() {
        assert_eq!(parse_metric("", 2).unwrap(), None);
        assert_eq!(parse_metric("nan", 2).unwrap(), None);
        assert_eq!(parse_metric(" 1.5 ", 2).unwrap(), Some(1.5));
        assert!(parse_metric("abc", 2).is_err());
    }
}
