//! File-level orchestration: raw files → combined artifact → analysis dataset.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::input::{InputLimits, discover, latest, load_tables, read_table};
use crate::normalizer::{Dataset, Normalizer};
use crate::output::{WriteOptions, write_dataset};

/// Result of a successful collection run.
#[derive(Debug)]
pub struct CollectOutcome {
    pub dataset: Dataset,
    pub output: PathBuf,
    pub sources: Vec<PathBuf>,
    pub skipped: Vec<PipelineError>,
}

/// Merges the raw files in `config.data_dir` into `config.output_file`.
///
/// With `latest_only`, only the most recently modified file is used. Nothing is
/// written when no usable input exists; the returned error is then a
/// [`PipelineError::NoInput`].
#[tracing::instrument(skip(config), fields(data_dir = %config.data_dir.display()))]
pub fn collect(
    config: &PipelineConfig,
    latest_only: bool,
    options: WriteOptions,
) -> Result<CollectOutcome> {
    let limits = config.limits();
    let mut sources = discover(&config.data_dir, Some(&config.output_file), &limits)?;
    if latest_only {
        let newest = latest(&sources)?;
        info!(path = %newest.display(), "Using latest input file");
        sources = vec![newest];
    }

    let loaded = load_tables(&sources, &limits)?;
    if loaded.tables.is_empty() {
        warn!(
            skipped = loaded.skipped.len(),
            "Every input file was malformed"
        );
        return Err(PipelineError::NoInput(config.data_dir.display().to_string()).into());
    }

    let dataset = Normalizer::collection().combine(loaded.tables)?;
    write_dataset(&config.output_file, &dataset, options)?;

    Ok(CollectOutcome {
        dataset,
        output: config.output_file.clone(),
        sources,
        skipped: loaded.skipped,
    })
}

/// Reads a combined table back and normalizes it with the analysis profile.
#[tracing::instrument(skip(path, limits), fields(path = %path.display()))]
pub fn load_for_analysis(path: &Path, limits: &InputLimits) -> Result<Dataset> {
    let table = read_table(path, limits)?;
    let dataset = Normalizer::analysis().combine(vec![table])?;
    info!(rows = dataset.len(), "Dataset loaded for analysis");
    Ok(dataset)
}

/// True when `err` is the reportable "nothing to process" condition.
pub fn is_no_input(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::NoInput(_))
    )
}
