use tracing::debug;

use crate::analyzers::aggregate::summarize_readings;
use crate::analyzers::types::{DashboardReport, Summary};
use crate::analyzers::views::{network_breakdown, signal_histogram, time_range, timeline};
use crate::normalizer::{Dataset, Reading};

/// Restricts a view to a set of network types; an empty set selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadingFilter {
    pub network_types: Vec<String>,
}

impl ReadingFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn network_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            network_types: types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, reading: &Reading) -> bool {
        self.network_types.is_empty() || self.network_types.contains(&reading.network_type)
    }
}

/// Single entry point for every statistic derived from a [`Dataset`].
///
/// Filtered and unfiltered views go through the same code, so dashboards
/// never recompute means, qualities or extrema on their own.
#[derive(Debug, Clone, Copy)]
pub struct Analyzer {
    histogram_bins: usize,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            histogram_bins: crate::analyzers::views::DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = bins;
        self
    }

    /// Summary over every reading.
    pub fn summarize(&self, dataset: &Dataset) -> Summary {
        summarize_readings(dataset)
    }

    /// Summary over the readings accepted by `predicate`.
    pub fn summarize_where<P>(&self, dataset: &Dataset, predicate: P) -> Summary
    where
        P: Fn(&Reading) -> bool,
    {
        summarize_readings(dataset.iter().filter(|&r| predicate(r)))
    }

    /// Full dashboard payload for the readings selected by `filter`.
    pub fn report(&self, dataset: &Dataset, filter: &ReadingFilter) -> DashboardReport {
        let selection: Vec<&Reading> = dataset.iter().filter(|r| filter.matches(r)).collect();
        debug!(
            total = dataset.len(),
            selected = selection.len(),
            filter = ?filter.network_types,
            "Building dashboard report"
        );

        let summary = summarize_readings(selection.iter().copied());
        DashboardReport {
            total_readings: dataset.len(),
            network_types: dataset
                .network_types()
                .into_iter()
                .map(str::to_string)
                .collect(),
            selected_network_types: filter.network_types.clone(),
            health_score: summary.health_score(),
            summary,
            time_range: time_range(&selection),
            by_network_type: network_breakdown(&selection),
            signal_histogram: signal_histogram(&selection, self.histogram_bins),
            timeline: timeline(&selection),
        }
    }
}
