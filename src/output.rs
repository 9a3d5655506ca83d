//! Output formatting and persistence for normalized datasets and summaries.
//!
//! Supports writing the combined CSV artifact, a text rendering of the
//! labelled summary, and JSON serialization of reports.

use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::types::SummaryReport;
use crate::normalizer::schema::{Field, SIGNAL_QUALITY_HEADER, TIMESTAMP_HEADER};
use crate::normalizer::{Dataset, Reading};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Column layout of a written artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Append the derived `Signal_Quality` column.
    pub with_quality: bool,
}

/// Header row for `dataset`: canonical fields, `Timestamp` when any source had
/// one, pass-through columns, then `Signal_Quality` if requested.
pub fn artifact_headers(dataset: &Dataset, options: WriteOptions) -> Vec<String> {
    let mut headers: Vec<String> = Field::ALL.iter().map(|f| f.header().to_string()).collect();
    if dataset.has_timestamp() {
        headers.push(TIMESTAMP_HEADER.to_string());
    }
    headers.extend(dataset.extra_columns().iter().cloned());
    if options.with_quality {
        headers.push(SIGNAL_QUALITY_HEADER.to_string());
    }
    headers
}

fn record(reading: &Reading, dataset: &Dataset, options: WriteOptions) -> Vec<String> {
    let mut row = vec![
        reading.location.clone(),
        reading.signal_dbm.to_string(),
        reading.download_mbps.to_string(),
        reading.upload_mbps.to_string(),
        reading.latency_ms.to_string(),
        reading.network_type.clone(),
    ];
    if dataset.has_timestamp() {
        row.push(
            reading
                .timestamp
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
        );
    }
    for column in dataset.extra_columns() {
        row.push(reading.extras.get(column).cloned().unwrap_or_default());
    }
    if options.with_quality {
        row.push(reading.signal_quality().label().to_string());
    }
    row
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Writes `dataset` as a comma-separated file with a header row.
///
/// The content is staged next to `path` and renamed into place, so the
/// target is either the previous file or the complete new one.
pub fn write_dataset(path: &Path, dataset: &Dataset, options: WriteOptions) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path(path);
    debug!(path = %path.display(), staging = %staging.display(), "Writing dataset");

    let written = (|| -> Result<()> {
        let file = File::create(&staging)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(artifact_headers(dataset, options))?;
        for reading in dataset {
            writer.write_record(record(reading, dataset, options))?;
        }
        writer.flush()?;
        Ok(())
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }

    fs::rename(&staging, path)?;
    info!(path = %path.display(), rows = dataset.len(), "Dataset written");
    Ok(())
}

/// Renders the labelled summary one `key: value` line per field.
pub fn render_summary(report: &SummaryReport) -> String {
    let value = |v: Option<f64>| v.map_or_else(|| "n/a".to_string(), |v| v.to_string());
    let distribution = report
        .quality_distribution
        .iter()
        .map(|(quality, count)| format!("{quality}: {count}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut out = String::new();
    let _ = writeln!(out, "Average Signal (dBm): {}", value(report.avg_signal));
    let _ = writeln!(out, "Average Download Speed (Mbps): {}", value(report.avg_download));
    let _ = writeln!(out, "Average Upload Speed (Mbps): {}", value(report.avg_upload));
    let _ = writeln!(out, "Average Latency (ms): {}", value(report.avg_latency));
    let _ = writeln!(out, "Signal Quality Distribution: {{{distribution}}}");
    let _ = writeln!(out, "Best Location: {}", report.best_location);
    let _ = writeln!(out, "Worst Location: {}", report.worst_location);
    out
}

/// Serializes any report as pretty-printed JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
