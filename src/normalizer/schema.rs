//! Fixed schema tables: canonical fields, alias names and default values.
//!
//! Two profiles exist. `Collection` is used when raw device exports are merged
//! into the combined artifact; `Analysis` is used when a table is re-read for
//! reporting and recognizes the short header aliases as well. Their signal
//! defaults differ (-100 vs -120 dBm) and are kept apart on purpose.

use serde::Serialize;
use std::fmt;

pub const TIMESTAMP_HEADER: &str = "Timestamp";
pub const SIGNAL_QUALITY_HEADER: &str = "Signal_Quality";

/// One of the six base fields every reading carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Field {
    Location,
    SignalDbm,
    DownloadMbps,
    UploadMbps,
    LatencyMs,
    NetworkType,
}

impl Field {
    /// Base fields in artifact column order.
    pub const ALL: [Field; 6] = [
        Field::Location,
        Field::SignalDbm,
        Field::DownloadMbps,
        Field::UploadMbps,
        Field::LatencyMs,
        Field::NetworkType,
    ];

    /// Canonical header name.
    pub fn header(self) -> &'static str {
        match self {
            Field::Location => "Location",
            Field::SignalDbm => "Signal_dBm",
            Field::DownloadMbps => "Download_Mbps",
            Field::UploadMbps => "Upload_Mbps",
            Field::LatencyMs => "Latency_ms",
            Field::NetworkType => "Network_Type",
        }
    }

    pub fn is_numeric(self) -> bool {
        !matches!(self, Field::Location | Field::NetworkType)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// Value injected for a missing column or cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Text(&'static str),
    Number(f64),
}

impl DefaultValue {
    /// Cell text used when the default fills an injected column.
    pub fn to_cell(self) -> String {
        match self {
            DefaultValue::Text(s) => s.to_string(),
            DefaultValue::Number(n) => n.to_string(),
        }
    }

    pub fn as_number(self) -> f64 {
        match self {
            DefaultValue::Number(n) => n,
            DefaultValue::Text(_) => f64::NAN,
        }
    }

    pub fn as_text(self) -> &'static str {
        match self {
            DefaultValue::Text(s) => s,
            DefaultValue::Number(_) => "",
        }
    }
}

static COLLECTION_ALIASES: &[(&str, Field)] = &[
    ("dBm", Field::SignalDbm),
    ("NetworkType", Field::NetworkType),
];

static ANALYSIS_ALIASES: &[(&str, Field)] = &[
    ("dBm", Field::SignalDbm),
    ("Signal", Field::SignalDbm),
    ("NetworkType", Field::NetworkType),
    ("Download", Field::DownloadMbps),
    ("Upload", Field::UploadMbps),
    ("Latency", Field::LatencyMs),
];

static COLLECTION_DEFAULTS: &[(Field, DefaultValue)] = &[
    (Field::Location, DefaultValue::Text("Unknown")),
    (Field::SignalDbm, DefaultValue::Number(-100.0)),
    (Field::DownloadMbps, DefaultValue::Number(0.0)),
    (Field::UploadMbps, DefaultValue::Number(0.0)),
    (Field::LatencyMs, DefaultValue::Number(0.0)),
    (Field::NetworkType, DefaultValue::Text("Unknown")),
];

static ANALYSIS_DEFAULTS: &[(Field, DefaultValue)] = &[
    (Field::Location, DefaultValue::Text("Unknown")),
    (Field::SignalDbm, DefaultValue::Number(-120.0)),
    (Field::DownloadMbps, DefaultValue::Number(0.0)),
    (Field::UploadMbps, DefaultValue::Number(0.0)),
    (Field::LatencyMs, DefaultValue::Number(0.0)),
    (Field::NetworkType, DefaultValue::Text("Unknown")),
];

/// Which alias/default tables a normalization pass applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Profile {
    #[default]
    Collection,
    Analysis,
}

impl Profile {
    pub fn aliases(self) -> &'static [(&'static str, Field)] {
        match self {
            Profile::Collection => COLLECTION_ALIASES,
            Profile::Analysis => ANALYSIS_ALIASES,
        }
    }

    pub fn defaults(self) -> &'static [(Field, DefaultValue)] {
        match self {
            Profile::Collection => COLLECTION_DEFAULTS,
            Profile::Analysis => ANALYSIS_DEFAULTS,
        }
    }

    /// Canonical field an alias header maps to, if any.
    pub fn alias_target(self, header: &str) -> Option<Field> {
        self.aliases()
            .iter()
            .find(|(alias, _)| *alias == header)
            .map(|(_, field)| *field)
    }

    pub fn default_for(self, field: Field) -> DefaultValue {
        self.defaults()
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, value)| *value)
            // Both tables list every field.
            .unwrap_or(DefaultValue::Text(""))
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Profile::Collection => f.write_str("collection"),
            Profile::Analysis => f.write_str("analysis"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_profile_defaults_every_field() {
        for profile in [Profile::Collection, Profile::Analysis] {
            for field in Field::ALL {
                assert!(
                    profile.defaults().iter().any(|(f, _)| *f == field),
                    "{profile} has no default for {field}"
                );
            }
        }
    }

    #[test]
    fn test_signal_defaults_differ_by_profile() {
        assert_eq!(
            Profile::Collection.default_for(Field::SignalDbm),
            DefaultValue::Number(-100.0)
        );
        assert_eq!(
            Profile::Analysis.default_for(Field::SignalDbm),
            DefaultValue::Number(-120.0)
        );
    }

    #[test]
    fn test_short_aliases_only_in_analysis() {
        assert_eq!(Profile::Collection.alias_target("Signal"), None);
        assert_eq!(Profile::Analysis.alias_target("Signal"), Some(Field::SignalDbm));
        assert_eq!(Profile::Collection.alias_target("dBm"), Some(Field::SignalDbm));
        assert_eq!(
            Profile::Collection.alias_target("NetworkType"),
            Some(Field::NetworkType)
        );
    }

    #[test]
    fn test_canonical_headers_are_not_aliases() {
        for profile in [Profile::Collection, Profile::Analysis] {
            for field in Field::ALL {
                assert_eq!(profile.alias_target(field.header()), None);
            }
        }
    }

    #[test]
    fn test_default_cells() {
        assert_eq!(DefaultValue::Number(-100.0).to_cell(), "-100");
        assert_eq!(DefaultValue::Number(0.0).to_cell(), "0");
        assert_eq!(DefaultValue::Text("Unknown").to_cell(), "Unknown");
    }
}
