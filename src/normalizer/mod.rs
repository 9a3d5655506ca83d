//! Schema reconciliation and concatenation of raw measurement tables.
//!
//! A raw table goes through three deterministic steps: alias headers are
//! renamed to canonical names, absent base columns are injected with the
//! profile default, and the result is converted into typed [`Reading`]s.
//! Columns outside the schema pass through untouched.

pub mod dataset;
pub mod schema;
pub mod table;

pub use dataset::{Dataset, NormalizedTable, Reading};
pub use schema::{DefaultValue, Field, Profile};
pub use table::RawTable;

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use schema::{SIGNAL_QUALITY_HEADER, TIMESTAMP_HEADER};

/// Formats tried in order when parsing a `Timestamp` cell without an offset.
static DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Applies one [`Profile`]'s alias and default tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    profile: Profile,
}

impl Normalizer {
    pub fn new(profile: Profile) -> Self {
        Self { profile }
    }

    /// Normalizer used when merging raw device exports.
    pub fn collection() -> Self {
        Self::new(Profile::Collection)
    }

    /// Normalizer used when re-reading a table for reporting.
    pub fn analysis() -> Self {
        Self::new(Profile::Analysis)
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Renames aliases and injects missing base columns.
    ///
    /// An alias is renamed only when its canonical column is not already
    /// present, so the result never holds duplicate canonical columns and an
    /// already-canonical table comes back unchanged.
    pub fn reconcile(&self, mut table: RawTable) -> RawTable {
        for index in 0..table.headers.len() {
            let Some(field) = self.profile.alias_target(&table.headers[index]) else {
                continue;
            };
            if table.has_column(field.header()) {
                debug!(
                    source = %table.source,
                    alias = %table.headers[index],
                    canonical = field.header(),
                    "Alias left in place, canonical column already present"
                );
                continue;
            }
            debug!(
                source = %table.source,
                alias = %table.headers[index],
                canonical = field.header(),
                "Renaming alias column"
            );
            table.rename_column(index, field.header());
        }

        for field in Field::ALL {
            if table.has_column(field.header()) {
                continue;
            }
            let default = self.profile.default_for(field);
            debug!(
                event = "MissingColumnDefaulted",
                source = %table.source,
                column = field.header(),
                default = %default.to_cell(),
                profile = %self.profile,
                "Missing column filled with default"
            );
            table.push_constant_column(field.header(), &default.to_cell());
        }

        table
    }

    /// Reconciles a raw table and converts each row into a [`Reading`].
    pub fn normalize_one(&self, table: RawTable) -> NormalizedTable {
        let table = self.reconcile(table);

        let base: Vec<(Field, usize)> = Field::ALL
            .iter()
            .filter_map(|&field| table.column_index(field.header()).map(|i| (field, i)))
            .collect();
        let timestamp_index = table.column_index(TIMESTAMP_HEADER);

        let extra_indices: Vec<usize> = (0..table.headers.len())
            .filter(|&i| {
                let header = table.headers[i].as_str();
                !base.iter().any(|&(_, b)| b == i)
                    && header != TIMESTAMP_HEADER
                    && header != SIGNAL_QUALITY_HEADER
            })
            .collect();
        let extra_columns: Vec<String> = extra_indices
            .iter()
            .map(|&i| table.headers[i].clone())
            .collect();

        let mut defaulted_cells = 0usize;
        let readings: Vec<Reading> = table
            .rows
            .iter()
            .map(|row| {
                let cell_at = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
                let mut reading = Reading {
                    location: String::new(),
                    signal_dbm: 0.0,
                    download_mbps: 0.0,
                    upload_mbps: 0.0,
                    latency_ms: 0.0,
                    network_type: String::new(),
                    timestamp: timestamp_index.and_then(|i| parse_timestamp(cell_at(i))),
                    extras: BTreeMap::new(),
                };

                for &(field, index) in &base {
                    let cell = cell_at(index).trim();
                    let default = self.profile.default_for(field);
                    if field.is_numeric() {
                        let value = match parse_number(cell) {
                            Some(v) => v,
                            None => {
                                defaulted_cells += 1;
                                default.as_number()
                            }
                        };
                        match field {
                            Field::SignalDbm => reading.signal_dbm = value,
                            Field::DownloadMbps => reading.download_mbps = value,
                            Field::UploadMbps => reading.upload_mbps = value,
                            Field::LatencyMs => reading.latency_ms = value,
                            Field::Location | Field::NetworkType => {}
                        }
                    } else {
                        let value = if cell.is_empty() {
                            defaulted_cells += 1;
                            default.as_text().to_string()
                        } else {
                            cell.to_string()
                        };
                        match field {
                            Field::Location => reading.location = value,
                            Field::NetworkType => reading.network_type = value,
                            _ => {}
                        }
                    }
                }

                for (&index, name) in extra_indices.iter().zip(&extra_columns) {
                    reading.extras.insert(name.clone(), cell_at(index).to_string());
                }

                reading
            })
            .collect();

        if defaulted_cells > 0 {
            debug!(
                source = %table.source,
                defaulted_cells,
                "Empty or unparsable cells filled with defaults"
            );
        }

        NormalizedTable {
            source: table.source,
            readings,
            extra_columns,
            has_timestamp: timestamp_index.is_some(),
        }
    }

    /// Normalizes every table and concatenates them in order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoInput`] when `tables` is empty.
    pub fn combine(&self, tables: Vec<RawTable>) -> Result<Dataset> {
        if tables.is_empty() {
            return Err(PipelineError::NoInput("the supplied table set".to_string()));
        }

        let table_count = tables.len();
        let mut dataset = Dataset::new();
        for table in tables {
            dataset.push_table(self.normalize_one(table));
        }

        info!(
            tables = table_count,
            rows = dataset.len(),
            profile = %self.profile,
            "Tables combined"
        );
        Ok(dataset)
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a timestamp cell; anything unrecognized is treated as absent.
///
/// Values with an explicit offset are converted to UTC.
pub fn parse_timestamp(cell: &str) -> Option<NaiveDateTime> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(cell) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cell, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(cell, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            "test.csv",
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn canonical_headers() -> Vec<&'static str> {
        Field::ALL.iter().map(|f| f.header()).collect()
    }

    #[test]
    fn test_reconcile_renames_collection_aliases() {
        let table = raw(&["Location", "dBm", "NetworkType"], &[&["A", "-80", "4G"]]);
        let out = Normalizer::collection().reconcile(table);

        assert!(out.has_column("Signal_dBm"));
        assert!(out.has_column("Network_Type"));
        assert!(!out.has_column("dBm"));
        assert!(!out.has_column("NetworkType"));
    }

    #[test]
    fn test_collection_ignores_short_aliases() {
        let table = raw(&["Location", "Signal"], &[&["A", "-80"]]);
        let out = Normalizer::collection().normalize_one(table);

        assert_eq!(out.readings[0].signal_dbm, -100.0);
        assert_eq!(out.extra_columns, vec!["Signal"]);
        assert_eq!(out.readings[0].extras["Signal"], "-80");
    }

    #[test]
    fn test_analysis_renames_short_aliases() {
        let table = raw(
            &["Location", "Signal", "Download", "Upload", "Latency"],
            &[&["A", "-80", "10", "2", "35"]],
        );
        let out = Normalizer::analysis().normalize_one(table);
        let r = &out.readings[0];

        assert_eq!(r.signal_dbm, -80.0);
        assert_eq!(r.download_mbps, 10.0);
        assert_eq!(r.upload_mbps, 2.0);
        assert_eq!(r.latency_ms, 35.0);
        assert!(out.extra_columns.is_empty());
    }

    #[test]
    fn test_alias_never_duplicates_canonical() {
        let table = raw(&["Signal_dBm", "dBm"], &[&["-70", "-99"]]);
        let out = Normalizer::collection().reconcile(table);

        let signal_columns = out.headers.iter().filter(|h| *h == "Signal_dBm").count();
        assert_eq!(signal_columns, 1);
        assert!(out.has_column("dBm"));
    }

    #[test]
    fn test_two_aliases_first_wins() {
        let table = raw(&["Signal", "dBm"], &[&["-70", "-99"]]);
        let out = Normalizer::analysis().normalize_one(table);

        assert_eq!(out.readings[0].signal_dbm, -70.0);
        assert_eq!(out.extra_columns, vec!["dBm"]);
    }

    #[test]
    fn test_reconcile_canonical_table_is_noop() {
        let headers = canonical_headers();
        let table = raw(&headers, &[&["A", "-80", "10", "2", "30", "4G"]]);

        for normalizer in [Normalizer::collection(), Normalizer::analysis()] {
            assert_eq!(normalizer.reconcile(table.clone()), table);
        }
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let table = raw(&["dBm", "Extra"], &[&["-80", "x"]]);
        let normalizer = Normalizer::collection();
        let once = normalizer.reconcile(table);
        let twice = normalizer.reconcile(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_columns_get_profile_defaults() {
        let table = raw(&["Location", "Signal_dBm"], &[&["A", "-80"]]);
        let collected = Normalizer::collection().normalize_one(table.clone());
        let r = &collected.readings[0];
        assert_eq!(r.download_mbps, 0.0);
        assert_eq!(r.upload_mbps, 0.0);
        assert_eq!(r.latency_ms, 0.0);
        assert_eq!(r.network_type, "Unknown");

        let no_signal = raw(&["Location"], &[&["A"]]);
        assert_eq!(
            Normalizer::collection().normalize_one(no_signal.clone()).readings[0].signal_dbm,
            -100.0
        );
        assert_eq!(
            Normalizer::analysis().normalize_one(no_signal).readings[0].signal_dbm,
            -120.0
        );
    }

    #[test]
    fn test_empty_and_bad_cells_default() {
        let table = raw(
            &["Location", "Signal_dBm", "Download_Mbps", "Network_Type"],
            &[&["", "", "fast", ""], &["B", "NaN", "inf", "5G"]],
        );
        let out = Normalizer::collection().normalize_one(table);

        assert_eq!(out.readings.len(), 2);
        assert_eq!(out.readings[0].location, "Unknown");
        assert_eq!(out.readings[0].signal_dbm, -100.0);
        assert_eq!(out.readings[0].download_mbps, 0.0);
        assert_eq!(out.readings[0].network_type, "Unknown");
        assert_eq!(out.readings[1].signal_dbm, -100.0);
        assert_eq!(out.readings[1].download_mbps, 0.0);
    }

    #[test]
    fn test_source_signal_quality_is_not_copied() {
        let table = raw(&["Signal_dBm", "Signal_Quality"], &[&["-80", "Poor"]]);
        let out = Normalizer::collection().normalize_one(table);

        assert!(out.extra_columns.is_empty());
        assert!(out.readings[0].extras.is_empty());
        assert_eq!(out.readings[0].signal_quality().label(), "Excellent");
    }

    #[test]
    fn test_timestamps_parsed_or_absent() {
        let table = raw(
            &["Signal_dBm", "Timestamp"],
            &[
                &["-80", "2024-03-01 10:15:00"],
                &["-80", "2024-03-01T10:15:00+02:00"],
                &["-80", "yesterday"],
                &["-80", ""],
            ],
        );
        let out = Normalizer::collection().normalize_one(table);
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(10, 15, 0)
            .unwrap();

        assert!(out.has_timestamp);
        assert_eq!(out.readings[0].timestamp, Some(expected));
        assert_eq!(
            out.readings[1].timestamp,
            Some(expected - chrono::Duration::hours(2))
        );
        assert_eq!(out.readings[2].timestamp, None);
        assert_eq!(out.readings[3].timestamp, None);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-03-01").is_some());
        assert!(parse_timestamp("2024/03/01 08:00:00").is_some());
        assert!(parse_timestamp("2024-03-01 08:00:00.250").is_some());
        assert!(parse_timestamp("31/12/2024 23:59:59").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }

    #[test]
    fn test_combine_conserves_rows() {
        let t1 = raw(&["Location", "Signal_dBm"], &[&["A", "-80"], &["B", "-90"]]);
        let t2 = raw(&["Location", "dBm"], &[&["C", "-100"]]);
        let dataset = Normalizer::collection().combine(vec![t1, t2]).unwrap();

        assert_eq!(dataset.len(), 3);
        let locations: Vec<_> = dataset.iter().map(|r| r.location.as_str()).collect();
        assert_eq!(locations, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_combine_keeps_all_null_rows() {
        let table = raw(
            &["Location", "Signal_dBm", "Download_Mbps"],
            &[&["", "", ""], &["A", "-80", "5"]],
        );
        let dataset = Normalizer::collection().combine(vec![table]).unwrap();
        assert_eq!(dataset.len(), 2);
    }

    #[test]
    fn test_combine_empty_is_no_input() {
        let err = Normalizer::collection().combine(vec![]).unwrap_err();
        assert!(matches!(err, PipelineError::NoInput(_)));
    }

    #[test]
    fn test_extra_columns_pass_through() {
        let table = raw(&["Location", "Cell_ID"], &[&["A", "310-260-1"]]);
        let out = Normalizer::collection().normalize_one(table);
        assert_eq!(out.readings[0].extras["Cell_ID"], "310-260-1");
    }
}
