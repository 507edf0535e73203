//! Monthly merge engine
//!
//! This module provides the MonthlyMergeEngine that persists a normalized
//! table as one CSV file per calendar month and account.
//!
//! The engine enforces the idempotence rules of the output directory:
//! - Each transaction lands in exactly one `{key}_{prefix}.csv` file
//! - Rows already present in a file (exact match on all five fields) are not
//!   written again
//! - Files stay sorted by transaction date; rows sharing a date keep their
//!   existing-then-incoming order

use crate::config::{validate_date_format, Config};
use crate::io::{read_partition_file, write_partition_file};
use crate::types::{
    MergeSummary, NormalizedTransaction, NormalizerError, PartitionCounts, PartitionOutcome,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Configuration key of the partition key pattern
pub const DATE_FORMAT_KEY: &str = "output.date_format";

/// Splits transactions into monthly partition files and merges them with
/// what is already on disk
#[derive(Debug, Clone)]
pub struct MonthlyMergeEngine {
    date_format: String,
}

impl MonthlyMergeEngine {
    /// Create a new MonthlyMergeEngine
    ///
    /// # Arguments
    ///
    /// * `date_format` - strftime pattern producing the partition key, `%Y-%m`
    ///   for calendar months
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the pattern contains an invalid specifier.
    pub fn new(date_format: impl Into<String>) -> Result<Self, NormalizerError> {
        let date_format = date_format.into();
        validate_date_format(DATE_FORMAT_KEY, &date_format)?;
        Ok(MonthlyMergeEngine { date_format })
    }

    /// Create the engine from `output.date_format`
    ///
    /// # Errors
    ///
    /// Returns `MissingConfigKey` if the key is absent, `InvalidConfig` if it
    /// is not a valid pattern.
    pub fn from_config(config: &Config) -> Result<Self, NormalizerError> {
        Self::new(config.get_str(DATE_FORMAT_KEY)?)
    }

    /// Partition key of a transaction date
    pub fn partition_key(&self, date: NaiveDate) -> String {
        date.format(&self.date_format).to_string()
    }

    /// Partition a table by month and merge every partition into its file
    ///
    /// For each partition the target is `{output_dir}/{key}_{output_prefix}.csv`:
    /// - absent: the partition is sorted by date and written
    /// - present: incoming rows equal to an existing row are dropped, the rest
    ///   are appended, the whole file is re-sorted and overwritten; if no row
    ///   is left the file is not touched
    ///
    /// Duplicates within `transactions` are only checked against the file
    /// contents, never against each other.
    ///
    /// # Arguments
    ///
    /// * `transactions` - Normalized rows from one source file
    /// * `output_dir` - Existing directory holding the partition files
    /// * `output_prefix` - Account fragment of the file names
    ///
    /// # Returns
    ///
    /// A [`MergeSummary`] with created and updated file names and per-month
    /// counts
    ///
    /// # Errors
    ///
    /// Returns an error if an existing partition file cannot be read or
    /// parsed, or if writing a partition file fails.
    pub fn partition_and_merge(
        &self,
        transactions: &[NormalizedTransaction],
        output_dir: &Path,
        output_prefix: &str,
    ) -> Result<MergeSummary, NormalizerError> {
        let mut partitions: BTreeMap<String, Vec<NormalizedTransaction>> = BTreeMap::new();
        for transaction in transactions {
            partitions
                .entry(self.partition_key(transaction.transaction_date))
                .or_default()
                .push(transaction.clone());
        }

        let mut summary = MergeSummary::default();
        for (key, incoming) in partitions {
            let file_name = format!("{}_{}.csv", key, output_prefix);
            let counts = merge_partition(&output_dir.join(&file_name), &file_name, incoming)?;
            summary.record(key, file_name, counts);
        }

        summary.log();
        Ok(summary)
    }
}

/// Merge one partition into its file
fn merge_partition(
    path: &Path,
    file_name: &str,
    mut incoming: Vec<NormalizedTransaction>,
) -> Result<PartitionCounts, NormalizerError> {
    if !path.exists() {
        sort_by_date(&mut incoming);
        write_partition_file(path, &incoming)?;
        tracing::info!("Created new file {} with {} transactions", file_name, incoming.len());

        return Ok(PartitionCounts {
            outcome: PartitionOutcome::Created,
            total: incoming.len(),
            new: incoming.len(),
        });
    }

    let mut merged = read_partition_file(path)?;
    let new_rows = anti_join(incoming, &merged);

    if new_rows.is_empty() {
        tracing::info!("No new transactions for {}", file_name);
        return Ok(PartitionCounts {
            outcome: PartitionOutcome::Unchanged,
            total: merged.len(),
            new: 0,
        });
    }

    let new = new_rows.len();
    merged.extend(new_rows);
    sort_by_date(&mut merged);
    write_partition_file(path, &merged)?;
    tracing::info!(
        "Added {} new transactions to {} (total: {})",
        new,
        file_name,
        merged.len()
    );

    Ok(PartitionCounts {
        outcome: PartitionOutcome::Updated,
        total: merged.len(),
        new,
    })
}

/// Incoming rows that match no existing row on all five fields
fn anti_join(
    incoming: Vec<NormalizedTransaction>,
    existing: &[NormalizedTransaction],
) -> Vec<NormalizedTransaction> {
    let existing: HashSet<&NormalizedTransaction> = existing.iter().collect();
    incoming
        .into_iter()
        .filter(|transaction| !existing.contains(transaction))
        .collect()
}

// Stable: equal dates keep their relative order
fn sort_by_date(transactions: &mut [NormalizedTransaction]) {
    transactions.sort_by_key(|t| t.transaction_date);
}
