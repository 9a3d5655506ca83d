use serde::Serialize;
use std::fmt;

/// Readings strictly above this are `Excellent`.
pub const EXCELLENT_ABOVE_DBM: f64 = -85.0;
/// Readings strictly above this (and not `Excellent`) are `Good`.
pub const GOOD_ABOVE_DBM: f64 = -95.0;

/// Three-way classification of signal strength.
///
/// | Range                 | Quality   |
/// |-----------------------|-----------|
/// | > -85 dBm             | Excellent |
/// | > -95 and <= -85 dBm  | Good      |
/// | <= -95 dBm            | Poor      |
///
/// Anything that is not above -95, including NaN, falls through to `Poor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SignalQuality {
    Excellent,
    Good,
    Poor,
}

impl SignalQuality {
    pub const ALL: [SignalQuality; 3] = [
        SignalQuality::Excellent,
        SignalQuality::Good,
        SignalQuality::Poor,
    ];

    pub fn classify(signal_dbm: f64) -> Self {
        match signal_dbm {
            s if s > EXCELLENT_ABOVE_DBM => SignalQuality::Excellent,
            s if s > GOOD_ABOVE_DBM => SignalQuality::Good,
            _ => SignalQuality::Poor,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SignalQuality::Excellent => "Excellent",
            SignalQuality::Good => "Good",
            SignalQuality::Poor => "Poor",
        }
    }

    /// Contribution of one reading of this quality to the health score, in percent.
    pub fn health_weight(self) -> f64 {
        match self {
            SignalQuality::Excellent => 100.0,
            SignalQuality::Good => 60.0,
            SignalQuality::Poor => 20.0,
        }
    }
}

impl fmt::Display for SignalQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
