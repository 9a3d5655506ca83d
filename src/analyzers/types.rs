//! Data types produced by the analysis pipeline.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::analyzers::quality::SignalQuality;
use crate::analyzers::utility::{fraction, round_to};

/// Location reported when no reading has a usable signal value.
pub const NO_DATA: &str = "No Data";

/// Aggregate statistics over a selection of readings.
///
/// Means are `None` for an empty selection. Only qualities that occur appear
/// in `quality_distribution`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub readings: usize,
    pub avg_signal_dbm: Option<f64>,
    pub avg_download_mbps: Option<f64>,
    pub avg_upload_mbps: Option<f64>,
    pub avg_latency_ms: Option<f64>,
    pub quality_distribution: BTreeMap<SignalQuality, usize>,
    pub best_location: String,
    pub worst_location: String,
}

impl Summary {
    /// Summary of zero readings.
    pub fn empty() -> Self {
        Self {
            readings: 0,
            avg_signal_dbm: None,
            avg_download_mbps: None,
            avg_upload_mbps: None,
            avg_latency_ms: None,
            quality_distribution: BTreeMap::new(),
            best_location: NO_DATA.to_string(),
            worst_location: NO_DATA.to_string(),
        }
    }

    pub fn quality_count(&self, quality: SignalQuality) -> usize {
        self.quality_distribution.get(&quality).copied().unwrap_or(0)
    }

    /// Weighted share of qualities: 100 for all-Excellent, 20 for all-Poor.
    pub fn health_score(&self) -> Option<f64> {
        if self.readings == 0 {
            return None;
        }
        Some(
            self.quality_distribution
                .iter()
                .map(|(quality, count)| quality.health_weight() * fraction(*count, self.readings))
                .sum(),
        )
    }

    /// Standalone report form: means rounded to two decimals, labelled keys.
    pub fn report(&self) -> SummaryReport {
        let round = |v: Option<f64>| v.map(|v| round_to(v, 2));
        SummaryReport {
            avg_signal: round(self.avg_signal_dbm),
            avg_download: round(self.avg_download_mbps),
            avg_upload: round(self.avg_upload_mbps),
            avg_latency: round(self.avg_latency_ms),
            quality_distribution: self.quality_distribution.clone(),
            best_location: self.best_location.clone(),
            worst_location: self.worst_location.clone(),
        }
    }
}

/// Human-labelled summary handed to reporting collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    #[serde(rename = "Average Signal (dBm)")]
    pub avg_signal: Option<f64>,
    #[serde(rename = "Average Download Speed (Mbps)")]
    pub avg_download: Option<f64>,
    #[serde(rename = "Average Upload Speed (Mbps)")]
    pub avg_upload: Option<f64>,
    #[serde(rename = "Average Latency (ms)")]
    pub avg_latency: Option<f64>,
    #[serde(rename = "Signal Quality Distribution")]
    pub quality_distribution: BTreeMap<SignalQuality, usize>,
    #[serde(rename = "Best Location")]
    pub best_location: String,
    #[serde(rename = "Worst Location")]
    pub worst_location: String,
}

/// Per-network-type signal statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkBreakdown {
    pub network_type: String,
    pub readings: usize,
    pub avg_signal_dbm: f64,
}

/// Earliest and latest timestamp in a selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// One equal-width bucket of the signal histogram, `[lower, upper)`; the last bucket is closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// A single timestamped point of the signal timeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub timestamp: NaiveDateTime,
    pub signal_dbm: f64,
    pub network_type: String,
    pub location: String,
}

/// Everything a dashboard needs for one filtered view, at full precision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub total_readings: usize,
    pub network_types: Vec<String>,
    pub selected_network_types: Vec<String>,
    pub summary: Summary,
    pub health_score: Option<f64>,
    pub time_range: Option<TimeRange>,
    pub by_network_type: Vec<NetworkBreakdown>,
    pub signal_histogram: Vec<HistogramBin>,
    pub timeline: Vec<TimelinePoint>,
}
