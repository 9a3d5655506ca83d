//! Runtime configuration for the QoS pipeline.
//!
//! Values come from the environment (optionally seeded from a `.env` file by
//! the caller) and fall back to the defaults below. CLI flags override them in
//! `main`.

use std::env;
use std::path::PathBuf;

use anyhow::{Result, anyhow};

use crate::input::InputLimits;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_OUTPUT_FILE: &str = "data/network_data_output.csv";
pub const DEFAULT_MAX_INPUT_FILES: usize = 1000;
pub const DEFAULT_MAX_FILE_BYTES: u64 = 256 * 1024 * 1024;

/// Parse an optional numeric variable, keeping `$default` when unset.
macro_rules! parse_var {
    ($lookup:expr, $var_name:expr, $ty:ty, $default:expr) => {
        $lookup($var_name)
            .map(|v| v.trim().parse::<$ty>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Effective settings for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Directory scanned for raw measurement files.
    pub data_dir: PathBuf,

    /// Combined artifact written by `collect`.
    pub output_file: PathBuf,

    /// Upper bound on files considered per run.
    pub max_input_files: usize,

    /// Upper bound on the (decompressed) size of any single input.
    pub max_file_bytes: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            max_input_files: DEFAULT_MAX_INPUT_FILES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from process environment variables.
    ///
    /// Optional:
    /// - `QOS_DATA_DIR` – input directory (default: `data`)
    /// - `QOS_OUTPUT_FILE` – combined CSV path (default: `data/network_data_output.csv`)
    /// - `QOS_MAX_INPUT_FILES` – file count limit (default: 1000)
    /// - `QOS_MAX_FILE_BYTES` – per-file size limit (default: 256 MiB)
    pub fn load_from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`load_from_env`](Self::load_from_env) with an injectable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir = lookup("QOS_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let output_file = lookup("QOS_OUTPUT_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));
        let max_input_files = parse_var!(
            lookup,
            "QOS_MAX_INPUT_FILES",
            usize,
            DEFAULT_MAX_INPUT_FILES
        );
        let max_file_bytes = parse_var!(lookup, "QOS_MAX_FILE_BYTES", u64, DEFAULT_MAX_FILE_BYTES);

        if max_input_files == 0 {
            return Err(anyhow!("QOS_MAX_INPUT_FILES must be at least 1"));
        }

        Ok(Self {
            data_dir,
            output_file,
            max_input_files,
            max_file_bytes,
        })
    }

    pub fn limits(&self) -> InputLimits {
        InputLimits {
            max_files: self.max_input_files,
            max_file_bytes: self.max_file_bytes,
        }
    }

    /// Log the loaded configuration.
    pub fn log_config(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  QOS_DATA_DIR        : {}", self.data_dir.display());
        tracing::info!("  QOS_OUTPUT_FILE     : {}", self.output_file.display());
        tracing::info!("  QOS_MAX_INPUT_FILES : {}", self.max_input_files);
        tracing::info!("  QOS_MAX_FILE_BYTES  : {}", self.max_file_bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = PipelineConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_overrides_from_env() {
        let config = PipelineConfig::from_lookup(lookup_from(&[
            ("QOS_DATA_DIR", "/tmp/in"),
            ("QOS_OUTPUT_FILE", "/tmp/out.csv"),
            ("QOS_MAX_INPUT_FILES", "12"),
            ("QOS_MAX_FILE_BYTES", " 4096 "),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/in"));
        assert_eq!(config.output_file, PathBuf::from("/tmp/out.csv"));
        assert_eq!(config.max_input_files, 12);
        assert_eq!(config.limits().max_file_bytes, 4096);
    }

    #[test]
    fn test_invalid_number_is_error() {
        let err = PipelineConfig::from_lookup(lookup_from(&[("QOS_MAX_INPUT_FILES", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("QOS_MAX_INPUT_FILES"));
    }

    #[test]
    fn test_zero_file_limit_rejected() {
        assert!(PipelineConfig::from_lookup(lookup_from(&[("QOS_MAX_INPUT_FILES", "0")])).is_err());
    }
}
