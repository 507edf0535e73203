//! Reporting types for merge and directory runs
//!
//! These carry the counts that form the audit trail of a run: which partition
//! files were created or updated and how many transactions each one holds.

use std::collections::BTreeMap;

/// What happened to a single monthly partition file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionOutcome {
    /// The file did not exist and was written from scratch
    Created,
    /// The file existed and new rows were merged into it
    Updated,
    /// The file existed and every incoming row was already present
    Unchanged,
}

/// Counts for one partition after a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionCounts {
    pub outcome: PartitionOutcome,
    /// Rows in the file after the merge
    pub total: usize,
    /// Rows this run contributed
    pub new: usize,
}

/// Aggregate result of [`crate::core::MonthlyMergeEngine::partition_and_merge`]
///
/// Partitions are keyed by their year-month key; `BTreeMap` keeps the report
/// in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub files_created: Vec<String>,
    pub files_updated: Vec<String>,
    pub partitions: BTreeMap<String, PartitionCounts>,
}

impl MergeSummary {
    pub fn record(&mut self, key: String, file_name: String, counts: PartitionCounts) {
        match counts.outcome {
            PartitionOutcome::Created => self.files_created.push(file_name),
            PartitionOutcome::Updated => self.files_updated.push(file_name),
            PartitionOutcome::Unchanged => {}
        }
        self.partitions.insert(key, counts);
    }

    pub fn total_transactions(&self) -> usize {
        self.partitions.values().map(|p| p.total).sum()
    }

    pub fn total_new(&self) -> usize {
        self.partitions.values().map(|p| p.new).sum()
    }

    /// Log the run summary: created and updated files, per-month counts, totals
    pub fn log(&self) {
        tracing::info!("Processing summary:");
        if !self.files_created.is_empty() {
            tracing::info!("New files created: {}", self.files_created.len());
            let mut names = self.files_created.clone();
            names.sort();
            for name in names {
                tracing::info!("  - {}", name);
            }
        }

        if !self.files_updated.is_empty() {
            tracing::info!("Existing files updated: {}", self.files_updated.len());
            let mut names = self.files_updated.clone();
            names.sort();
            for name in names {
                tracing::info!("  - {}", name);
            }
        }

        tracing::info!("Transactions by month:");
        for (key, counts) in &self.partitions {
            if counts.new > 0 {
                tracing::info!("  {}: {} transactions ({} new)", key, counts.total, counts.new);
            } else {
                tracing::info!("  {}: {} transactions (no changes)", key, counts.total);
            }
        }

        tracing::info!("Total transactions across all files: {}", self.total_transactions());
        tracing::info!("Total new transactions added: {}", self.total_new());
    }
}

/// Outcome of walking an input directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectoryReport {
    pub files_processed: usize,
    pub files_skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_routes_file_names_by_outcome() {
        let mut summary = MergeSummary::default();
        summary.record(
            "2024-01".into(),
            "2024-01_ubs_main.csv".into(),
            PartitionCounts {
                outcome: PartitionOutcome::Created,
                total: 3,
                new: 3,
            },
        );
        summary.record(
            "2024-02".into(),
            "2024-02_ubs_main.csv".into(),
            PartitionCounts {
                outcome: PartitionOutcome::Updated,
                total: 5,
                new: 2,
            },
        );
        summary.record(
            "2024-03".into(),
            "2024-03_ubs_main.csv".into(),
            PartitionCounts {
                outcome: PartitionOutcome::Unchanged,
                total: 4,
                new: 0,
            },
        );

        assert_eq!(summary.files_created, vec!["2024-01_ubs_main.csv"]);
        assert_eq!(summary.files_updated, vec!["2024-02_ubs_main.csv"]);
        assert_eq!(summary.total_transactions(), 12);
        assert_eq!(summary.total_new(), 5);
    }
}
