//! Bank CSV Normalizer Library
//! # Overview
//!
//! This library turns heterogeneous bank and card CSV exports into one
//! normalized schema (`transaction_date, payee, notes, debit, credit`) and
//! persists the result as one CSV file per month and account. Re-running it
//! over the same exports never duplicates rows.
//!
//! # Architecture
//!
//! - [`types`] - Normalized transaction, merge summaries and errors
//! - [`config`] - TOML configuration store
//! - [`io`] - Encodings, source file access and the normalized CSV format
//! - [`dialects`] - Format detection and the per-vendor parsers:
//!   - [`dialects::ubs_account`] - UBS bank account exports
//!   - [`dialects::ubs_cards`] - UBS credit card exports
//! - [`core`] - Processing components:
//!   - [`core::merge`] - Monthly partitioning and the idempotent merge
//!   - [`core::pipeline`] - File and directory orchestration
//! - [`cli`] - CLI arguments parsing
//!
//! # Output
//!
//! Files are named `{key}_{prefix}.csv` where `key` is the transaction date
//! formatted with `output.date_format` and `prefix` identifies the account,
//! e.g. `2024-01_ubs_main.csv` or `2024-01_ubs_cards_card_1234.csv`.

// Module declarations
pub mod cli;
pub mod config;
pub mod core;
pub mod dialects;
pub mod io;
pub mod types;

pub use config::Config;
pub use core::{MonthlyMergeEngine, Pipeline};
pub use dialects::{get_processor_for_file, DialectParser, FormatDetector};
pub use types::{
    DirectoryReport, MergeSummary, NormalizedTransaction, NormalizerError, PartitionCounts,
    PartitionOutcome, ProcessingResult,
};
