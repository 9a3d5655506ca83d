//! Canonical readings and the ordered dataset built from them.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::analyzers::quality::SignalQuality;

/// One normalized measurement with every base field populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub location: String,
    pub signal_dbm: f64,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub latency_ms: f64,
    pub network_type: String,
    pub timestamp: Option<NaiveDateTime>,
    /// Source columns outside the canonical schema, passed through verbatim.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
}

impl Reading {
    /// Derived from `signal_dbm` on every call; never stored.
    pub fn signal_quality(&self) -> SignalQuality {
        SignalQuality::classify(self.signal_dbm)
    }
}

/// Rows produced from a single source table.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    pub source: String,
    pub readings: Vec<Reading>,
    pub extra_columns: Vec<String>,
    pub has_timestamp: bool,
}

/// Ordered readings from one or more sources.
///
/// Source order and row order are preserved; duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    readings: Vec<Reading>,
    extra_columns: Vec<String>,
    sources: Vec<String>,
    has_timestamp: bool,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a table's rows after everything already present.
    pub fn push_table(&mut self, table: NormalizedTable) {
        for column in table.extra_columns {
            if !self.extra_columns.contains(&column) {
                self.extra_columns.push(column);
            }
        }
        self.has_timestamp |= table.has_timestamp;
        self.sources.push(table.source);
        self.readings.extend(table.readings);
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reading> {
        self.readings.iter()
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Union of pass-through column names in first-appearance order.
    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    /// Whether any source carried a `Timestamp` column.
    pub fn has_timestamp(&self) -> bool {
        self.has_timestamp
    }

    /// Distinct network types in first-appearance order.
    pub fn network_types(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for reading in &self.readings {
            if !seen.contains(&reading.network_type.as_str()) {
                seen.push(&reading.network_type);
            }
        }
        seen
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Reading;
    type IntoIter = std::slice::Iter<'a, Reading>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.iter()
    }
}
