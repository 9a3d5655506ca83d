//! Discovery and bounded loading of raw measurement files.
//!
//! Plain `.csv` files and gzip-compressed `.csv.gz` files are recognized.

use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::normalizer::RawTable;

/// Guards against runaway input sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLimits {
    pub max_files: usize,
    pub max_file_bytes: u64,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_files: crate::config::DEFAULT_MAX_INPUT_FILES,
            max_file_bytes: crate::config::DEFAULT_MAX_FILE_BYTES,
        }
    }
}

/// Tables that loaded cleanly plus the inputs that were skipped.
#[derive(Debug, Default)]
pub struct LoadOutcome {
    pub tables: Vec<RawTable>,
    pub skipped: Vec<PipelineError>,
}

fn is_gzip(path: &Path) -> bool {
    path.to_str()
        .is_some_and(|p| p.to_ascii_lowercase().ends_with(".csv.gz"))
}

fn is_input_file(path: &Path) -> bool {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    is_csv || is_gzip(path)
}

/// Lists input files in `dir`, sorted by file name.
///
/// `exclude` (typically the combined output artifact) is never returned.
///
/// # Errors
///
/// [`PipelineError::NoInput`] when nothing matches, [`PipelineError::TooManyInputs`]
/// when more than `limits.max_files` match.
pub fn discover(dir: &Path, exclude: Option<&Path>, limits: &InputLimits) -> Result<Vec<PathBuf>> {
    let dir_label = dir.display().to_string();
    if !dir.is_dir() {
        return Err(PipelineError::NoInput(dir_label));
    }

    let excluded = exclude.and_then(|p| fs::canonicalize(p).ok());

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type()?.is_file() || !is_input_file(&path) {
            continue;
        }
        if excluded.is_some() && fs::canonicalize(&path).ok() == excluded {
            debug!(path = %path.display(), "Skipping output artifact during discovery");
            continue;
        }
        files.push(path);
    }

    if files.is_empty() {
        return Err(PipelineError::NoInput(dir_label));
    }
    if files.len() > limits.max_files {
        return Err(PipelineError::TooManyInputs {
            dir: dir_label,
            found: files.len(),
            limit: limits.max_files,
        });
    }

    files.sort();
    debug!(dir = %dir_label, count = files.len(), "Input files discovered");
    Ok(files)
}

/// Picks the most recently modified file; ties go to the later name.
pub fn latest(paths: &[PathBuf]) -> Result<PathBuf> {
    let mut newest: Option<(std::time::SystemTime, &PathBuf)> = None;
    for path in paths {
        let modified = fs::metadata(path)?.modified()?;
        if newest.is_none_or(|(t, _)| modified >= t) {
            newest = Some((modified, path));
        }
    }
    newest
        .map(|(_, p)| p.clone())
        .ok_or_else(|| PipelineError::NoInput("the supplied file list".to_string()))
}

/// Reads one file into a [`RawTable`], decompressing `.csv.gz`.
///
/// # Errors
///
/// [`PipelineError::InputTooLarge`] if the (decompressed) content exceeds
/// `limits.max_file_bytes`; [`PipelineError::MalformedInput`] if the file cannot
/// be opened, decoded or parsed as a header-first table.
pub fn read_table(path: &Path, limits: &InputLimits) -> Result<RawTable> {
    let label = path.display().to_string();

    let file = File::open(path).map_err(|e| PipelineError::malformed(&label, e))?;
    let size = file
        .metadata()
        .map_err(|e| PipelineError::malformed(&label, e))?
        .len();
    if size > limits.max_file_bytes {
        return Err(PipelineError::InputTooLarge {
            path: label,
            limit: limits.max_file_bytes,
        });
    }

    let reader: Box<dyn Read> = if is_gzip(path) {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let mut bytes = Vec::new();
    reader
        .take(limits.max_file_bytes.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|e| PipelineError::malformed(&label, e))?;
    if bytes.len() as u64 > limits.max_file_bytes {
        return Err(PipelineError::InputTooLarge {
            path: label,
            limit: limits.max_file_bytes,
        });
    }

    RawTable::from_reader(&label, bytes.as_slice())
}

/// Reads every path, skipping malformed files with a warning.
///
/// Size-limit violations and other non-malformed errors abort the load.
#[tracing::instrument(skip(paths, limits), fields(files = paths.len()))]
pub fn load_tables(paths: &[PathBuf], limits: &InputLimits) -> Result<LoadOutcome> {
    let mut outcome = LoadOutcome::default();

    for path in paths {
        match read_table(path, limits) {
            Ok(table) => {
                debug!(
                    path = %path.display(),
                    rows = table.len(),
                    columns = table.headers.len(),
                    "Input table read"
                );
                outcome.tables.push(table);
            }
            Err(e @ PipelineError::MalformedInput { .. }) => {
                warn!(error = %e, "Skipping malformed input");
                outcome.skipped.push(e);
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        loaded = outcome.tables.len(),
        skipped = outcome.skipped.len(),
        "Input tables loaded"
    );
    Ok(outcome)
}
