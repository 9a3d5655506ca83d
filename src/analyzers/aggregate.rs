use crate::analyzers::types::{NO_DATA, Summary};
use crate::analyzers::utility::mean;
use crate::normalizer::Reading;

/// Aggregates a selection of readings into a [`Summary`].
///
/// Every reading counts towards the means, including ones whose fields were
/// all filled from defaults. Best and worst location use a stable
/// argmax/argmin: on ties the first reading in order wins. Readings with a
/// non-finite signal are ignored for best/worst.
pub fn summarize_readings<'a, I>(readings: I) -> Summary
where
    I: IntoIterator<Item = &'a Reading>,
{
    let mut signal = Vec::new();
    let mut download = Vec::new();
    let mut upload = Vec::new();
    let mut latency = Vec::new();
    let mut summary = Summary::empty();

    let mut best: Option<&Reading> = None;
    let mut worst: Option<&Reading> = None;

    for reading in readings {
        signal.push(reading.signal_dbm);
        download.push(reading.download_mbps);
        upload.push(reading.upload_mbps);
        latency.push(reading.latency_ms);

        *summary
            .quality_distribution
            .entry(reading.signal_quality())
            .or_default() += 1;

        if !reading.signal_dbm.is_finite() {
            continue;
        }
        if best.is_none_or(|b| reading.signal_dbm > b.signal_dbm) {
            best = Some(reading);
        }
        if worst.is_none_or(|w| reading.signal_dbm < w.signal_dbm) {
            worst = Some(reading);
        }
    }

    summary.readings = signal.len();
    summary.avg_signal_dbm = mean(&signal);
    summary.avg_download_mbps = mean(&download);
    summary.avg_upload_mbps = mean(&upload);
    summary.avg_latency_ms = mean(&latency);
    summary.best_location = best.map_or_else(|| NO_DATA.to_string(), |r| r.location.clone());
    summary.worst_location = worst.map_or_else(|| NO_DATA.to_string(), |r| r.location.clone());

    summary
}
