//! Transaction-related types for the normalizer
//!
//! Every supported dialect is mapped into [`NormalizedTransaction`], the
//! five-column schema that monthly partition files are written in.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Column names of the normalized schema, in output order
pub const NORMALIZED_COLUMNS: [&str; 5] = ["transaction_date", "payee", "notes", "debit", "credit"];

/// A single transaction in the common schema
///
/// Equality and hashing cover all five fields. Two rows are the same
/// transaction only if every field matches exactly; the merge engine relies on
/// this for its anti-join. `Decimal` compares numerically, so `12.5` and
/// `12.50` are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedTransaction {
    /// Calendar date of the transaction (no time component)
    pub transaction_date: NaiveDate,

    /// Counterparty or booking text
    pub payee: String,

    /// Free text; may be empty or a space-joined concatenation of source fields
    pub notes: String,

    /// Amount leaving the account, zero when the row is not a debit
    pub debit: Decimal,

    /// Amount entering the account, zero when the row is not a credit
    pub credit: Decimal,
}

impl NormalizedTransaction {
    pub fn new(
        transaction_date: NaiveDate,
        payee: impl Into<String>,
        notes: impl Into<String>,
        debit: Decimal,
        credit: Decimal,
    ) -> Self {
        NormalizedTransaction {
            transaction_date,
            payee: payee.into(),
            notes: notes.into(),
            debit,
            credit,
        }
    }
}

/// Result of parsing one input file
///
/// Pairs the normalized table with the prefix used to name the destination
/// file family (typically derived from an account identifier).
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingResult {
    pub transactions: Vec<NormalizedTransaction>,
    pub output_prefix: String,
}

impl ProcessingResult {
    pub fn new(transactions: Vec<NormalizedTransaction>, output_prefix: impl Into<String>) -> Self {
        ProcessingResult {
            transactions,
            output_prefix: output_prefix.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// First `n` rows, used by preview mode
    pub fn head(&self, n: usize) -> &[NormalizedTransaction] {
        &self.transactions[..n.min(self.transactions.len())]
    }
}
