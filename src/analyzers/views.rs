//! Derived views over a selection of readings: per-network statistics,
//! time range, signal histogram and timeline.

use std::collections::BTreeMap;

use crate::analyzers::types::{HistogramBin, NetworkBreakdown, TimeRange, TimelinePoint};
use crate::normalizer::Reading;

pub const DEFAULT_HISTOGRAM_BINS: usize = 20;
pub const MAX_HISTOGRAM_BINS: usize = 1000;

/// Count and mean signal per network type, sorted by network type.
pub fn network_breakdown(readings: &[&Reading]) -> Vec<NetworkBreakdown> {
    let mut groups: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for reading in readings {
        let entry = groups.entry(reading.network_type.as_str()).or_default();
        entry.0 += 1;
        entry.1 += reading.signal_dbm;
    }

    groups
        .into_iter()
        .map(|(network_type, (count, total))| NetworkBreakdown {
            network_type: network_type.to_string(),
            readings: count,
            avg_signal_dbm: total / count as f64,
        })
        .collect()
}

pub fn time_range(readings: &[&Reading]) -> Option<TimeRange> {
    let mut timestamps = readings.iter().filter_map(|r| r.timestamp);
    let first = timestamps.next()?;
    let (start, end) = timestamps.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t)));
    Some(TimeRange { start, end })
}

/// Equal-width histogram of finite signal values.
///
/// Bins span `[min, max]`; when every value is equal the span is widened by
/// half a unit on each side. Returns no bins for an empty selection. At most
/// [`MAX_HISTOGRAM_BINS`] bins are produced.
pub fn signal_histogram(readings: &[&Reading], bins: usize) -> Vec<HistogramBin> {
    let bins = bins.min(MAX_HISTOGRAM_BINS);
    let values: Vec<f64> = readings
        .iter()
        .map(|r| r.signal_dbm)
        .filter(|v| v.is_finite())
        .collect();
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }
    let width = (max - min) / bins as f64;

    let mut histogram: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for value in values {
        let index = (((value - min) / width) as usize).min(bins - 1);
        histogram[index].count += 1;
    }

    histogram
}

/// Timestamped readings in time order; equal timestamps keep dataset order.
pub fn timeline(readings: &[&Reading]) -> Vec<TimelinePoint> {
    let mut points: Vec<TimelinePoint> = readings
        .iter()
        .filter_map(|r| {
            r.timestamp.map(|timestamp| TimelinePoint {
                timestamp,
                signal_dbm: r.signal_dbm,
                network_type: r.network_type.clone(),
                location: r.location.clone(),
            })
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);
    points
}
