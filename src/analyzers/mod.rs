//! Signal-quality classification and summary statistics.
//!
//! This module classifies each reading's signal strength, aggregates means
//! and extrema over a dataset (optionally narrowed by a filter), and derives
//! the per-network, histogram and timeline views consumed by dashboards.

pub mod aggregate;
pub mod analyzer;
pub mod quality;
pub mod types;
pub mod utility;
pub mod views;
