//! Types module
//!
//! Contains core data structures used throughout the application:
//! - `transaction`: the normalized schema and per-file processing result
//! - `summary`: merge and directory run reports
//! - `error`: error types for the normalizer

pub mod error;
pub mod summary;
pub mod transaction;

pub use error::NormalizerError;
pub use summary::{DirectoryReport, MergeSummary, PartitionCounts, PartitionOutcome};
pub use transaction::{NormalizedTransaction, ProcessingResult, NORMALIZED_COLUMNS};
