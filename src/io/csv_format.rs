//! CSV format handling for normalized transactions
//!
//! This module centralizes the normalized-file concerns:
//! - Cell parsing shared by all dialects (amounts, dates)
//! - Reading an existing monthly partition file back into memory
//! - Serializing transactions with the `transaction_date,payee,notes,debit,credit` header
//!
//! Dates are written as ISO-8601 (`YYYY-MM-DD`) and amounts as plain
//! normalized decimals (`12.5`, `0`).

use crate::types::{NormalizedTransaction, NormalizerError, NORMALIZED_COLUMNS};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

const ISO_DATE: &str = "%Y-%m-%d";
const ISO_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// Row of a monthly partition file, before conversion
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PartitionRecord {
    pub transaction_date: String,
    pub payee: String,
    #[serde(default)]
    pub notes: String,
    pub debit: String,
    pub credit: String,
}

/// Parse a monetary cell
///
/// Swiss exports group thousands with apostrophes (`1'234.50`); those and any
/// whitespace are removed. An empty cell is zero. The sign is preserved.
pub fn parse_amount(raw: &str) -> Result<Decimal, NormalizerError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '\'' | '’') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Ok(Decimal::ZERO);
    }

    Decimal::from_str(&cleaned).map_err(|_| NormalizerError::invalid_amount(raw))
}

/// Parse a date cell with an explicit strftime pattern
///
/// Patterns that carry a time component are accepted; the time is dropped.
pub fn parse_date(raw: &str, format: &str) -> Result<NaiveDate, NormalizerError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, format)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, format).map(|dt| dt.date()))
        .map_err(|_| NormalizerError::invalid_date(raw, format))
}

/// Render an amount the way partition files store it
pub fn format_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// Convert a PartitionRecord to a NormalizedTransaction
///
/// Partition files written with a time component (`YYYY-MM-DD HH:MM:SS`) are
/// read back as plain dates.
pub fn convert_partition_record(
    record: PartitionRecord,
) -> Result<NormalizedTransaction, NormalizerError> {
    let transaction_date = parse_date(&record.transaction_date, ISO_DATE)
        .or_else(|_| parse_date(&record.transaction_date, ISO_DATETIME))?;

    Ok(NormalizedTransaction {
        transaction_date,
        payee: record.payee,
        notes: record.notes,
        debit: parse_amount(&record.debit)?,
        credit: parse_amount(&record.credit)?,
    })
}

/// Load every row of an existing partition file
pub fn read_partition_file(path: &Path) -> Result<Vec<NormalizedTransaction>, NormalizerError> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(file);

    let mut transactions = Vec::new();
    for (index, result) in reader.deserialize::<PartitionRecord>().enumerate() {
        let record = result?;
        let transaction = convert_partition_record(record).map_err(|e| NormalizerError::ParseError {
            line: Some(index as u64 + 2),
            message: format!("{}: {}", path.display(), e),
        })?;
        transactions.push(transaction);
    }

    Ok(transactions)
}

/// Write transactions in the normalized CSV format
///
/// Rows are written in the order given; sorting is the caller's concern.
pub fn write_transactions_csv(
    transactions: &[NormalizedTransaction],
    output: &mut dyn Write,
) -> Result<(), NormalizerError> {
    let mut writer = Writer::from_writer(output);

    writer.write_record(NORMALIZED_COLUMNS)?;

    for transaction in transactions {
        writer.write_record(&[
            transaction.transaction_date.format(ISO_DATE).to_string(),
            transaction.payee.clone(),
            transaction.notes.clone(),
            format_amount(transaction.debit),
            format_amount(transaction.credit),
        ])?;
    }

    writer.flush()?;

    Ok(())
}

/// Overwrite `path` with the given transactions
pub fn write_partition_file(
    path: &Path,
    transactions: &[NormalizedTransaction],
) -> Result<(), NormalizerError> {
    let mut file = BufWriter::new(File::create(path)?);
    write_transactions_csv(transactions, &mut file)?;
    file.flush()?;
    Ok(())
}
