//! Input orchestration
//!
//! Routes a file or a directory tree through detection, parsing and the
//! monthly merge. Without an output directory the parsed table is only
//! previewed in the log.

use crate::config::Config;
use crate::core::merge::MonthlyMergeEngine;
use crate::dialects::FormatDetector;
use crate::io::write_transactions_csv;
use crate::types::{DirectoryReport, MergeSummary, NormalizerError, ProcessingResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Rows shown in preview mode
pub const PREVIEW_ROWS: usize = 5;

pub struct Pipeline<'a> {
    config: &'a Config,
    detector: FormatDetector<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Self {
        Pipeline {
            config,
            detector: FormatDetector::new(config),
        }
    }

    /// Process `input`, a file or a directory
    ///
    /// # Errors
    ///
    /// `FileNotFound` when `input` is neither a file nor a directory. For a
    /// single file every error is returned; for a directory only errors that
    /// are not tied to one file are.
    pub fn run(&self, input: &Path, output_dir: Option<&Path>) -> Result<(), NormalizerError> {
        if input.is_file() {
            self.process_single_file(input, output_dir)?;
            Ok(())
        } else if input.is_dir() {
            self.process_directory(input, output_dir)?;
            Ok(())
        } else {
            Err(NormalizerError::FileNotFound {
                path: input.display().to_string(),
            })
        }
    }

    /// Detect, parse and merge (or preview) one file
    ///
    /// Returns the merge summary, or `None` in preview mode.
    pub fn process_single_file(
        &self,
        path: &Path,
        output_dir: Option<&Path>,
    ) -> Result<Option<MergeSummary>, NormalizerError> {
        tracing::info!("Processing {}...", path.display());

        let parser = self.detector.detect(path)?;
        tracing::debug!("Selected dialect {} for {}", parser.name(), path.display());
        let result = parser.process(path)?;

        match output_dir {
            Some(output_dir) => {
                let engine = MonthlyMergeEngine::from_config(self.config)?;
                let summary = engine.partition_and_merge(
                    &result.transactions,
                    output_dir,
                    &result.output_prefix,
                )?;
                Ok(Some(summary))
            }
            None => {
                preview(&result)?;
                Ok(None)
            }
        }
    }

    /// Process every file below `directory`, skipping files that are not
    /// recognized or not valid for their dialect
    ///
    /// Files are visited in file-name order. Any other error aborts the walk.
    pub fn process_directory(
        &self,
        directory: &Path,
        output_dir: Option<&Path>,
    ) -> Result<DirectoryReport, NormalizerError> {
        tracing::info!("Processing directory: {}", directory.display());

        let files: Vec<PathBuf> = WalkDir::new(directory)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!("Cannot read directory entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .collect();

        let mut report = DirectoryReport::default();
        for path in files {
            match self.process_single_file(&path, output_dir) {
                Ok(_) => report.files_processed += 1,
                Err(e) if e.is_per_file() => {
                    tracing::warn!("Skipping {}: {}", path.display(), e);
                    report.files_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!("Directory processing complete:");
        tracing::info!("Files processed: {}", report.files_processed);
        tracing::info!("Files skipped: {}", report.files_skipped);

        Ok(report)
    }
}

fn preview(result: &ProcessingResult) -> Result<(), NormalizerError> {
    let rows = result.head(PREVIEW_ROWS);

    let mut table = Vec::new();
    write_transactions_csv(rows, &mut table)?;

    tracing::info!("Preview of {} transactions:", result.len());
    tracing::info!("\n{}", String::from_utf8_lossy(&table));
    tracing::info!("Showing {} of {} transactions", rows.len(), result.len());
    Ok(())
}
