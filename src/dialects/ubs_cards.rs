//! UBS credit card CSV export
//!
//! ```text
//! sep=;
//! Numéro de compte;Numéro de carte;Titulaire;Date d'achat;Texte comptable;Secteur;...;Débit;Crédit;...
//! 0000 1234;5500 00XX XXXX 1234;MUSTER HANS;05.01.2024;MIGROS BASEL;Grocery stores;...;45.20;;...
//! ;;;;;;;;Total;1234.50;...
//! ```
//!
//! Columns are located by header name. Footer rows carry no purchase date
//! and are dropped.

use crate::config::{separator_byte, Config};
use crate::dialects::{open_for_probe, probe_to_bool, DialectParser, Probe};
use crate::io::{parse_amount, parse_date, SourceFile, TextEncoding};
use crate::types::{NormalizedTransaction, NormalizerError, ProcessingResult};
use csv::StringRecord;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Configuration name, `processors.ubs_cards`
pub const NAME: &str = "ubs_cards";

const DATE_COLUMN: &str = "Date d'achat";
const PAYEE_COLUMN: &str = "Texte comptable";
const NOTES_COLUMN: &str = "Secteur";
const DEBIT_COLUMN: &str = "Débit";
const CREDIT_COLUMN: &str = "Crédit";
const CARD_COLUMN: &str = "Numéro de carte";

#[derive(Debug, Clone, Deserialize)]
pub struct CsvSettings {
    pub encoding: String,
    pub separator: String,
    /// 1-based line number of the column header
    pub header_row: usize,
    pub marker_line: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UbsCardsSettings {
    pub csv_settings: CsvSettings,
    pub expected_columns: Vec<String>,
    pub date_format: String,
}

#[derive(Debug, Clone)]
pub struct UbsCardsParser {
    settings: UbsCardsSettings,
    encoding: TextEncoding,
    separator: u8,
    marker_line: String,
    account_names: HashMap<String, String>,
}

/// Positions of the mapped columns within the header
struct ColumnIndex {
    date: usize,
    payee: usize,
    notes: usize,
    debit: usize,
    credit: usize,
    card: usize,
}

impl ColumnIndex {
    fn from_header(header: &StringRecord) -> Result<Self, String> {
        let find = |name: &str| {
            header
                .iter()
                .position(|field| field.trim() == name)
                .ok_or_else(|| format!("column '{}' is missing", name))
        };

        Ok(ColumnIndex {
            date: find(DATE_COLUMN)?,
            payee: find(PAYEE_COLUMN)?,
            notes: find(NOTES_COLUMN)?,
            debit: find(DEBIT_COLUMN)?,
            credit: find(CREDIT_COLUMN)?,
            card: find(CARD_COLUMN)?,
        })
    }
}

impl UbsCardsParser {
    pub fn from_config(config: &Config) -> Result<Self, NormalizerError> {
        let settings: UbsCardsSettings = config.section(&format!("processors.{}", NAME))?;
        let csv_settings = &settings.csv_settings;

        if csv_settings.header_row == 0 {
            return Err(NormalizerError::invalid_config(
                &format!("processors.{}.csv_settings.header_row", NAME),
                "header_row is 1-based and must be at least 1",
            ));
        }

        let encoding: TextEncoding = csv_settings.encoding.parse()?;
        let separator = separator_byte(
            &format!("processors.{}.csv_settings.separator", NAME),
            &csv_settings.separator,
        )?;
        let marker_line = csv_settings
            .marker_line
            .clone()
            .unwrap_or_else(|| format!("sep={}", csv_settings.separator));

        Ok(UbsCardsParser {
            encoding,
            separator,
            marker_line,
            account_names: config.account_names(NAME)?,
            settings,
        })
    }

    /// Lines before the column header
    fn lines_before_header(&self) -> usize {
        self.settings.csv_settings.header_row - 1
    }

    fn probe(&self, path: &Path) -> Probe {
        // Marker line through column header
        let source = open_for_probe(path, self.encoding, self.settings.csv_settings.header_row)?;
        self.check_structure(&source)
    }

    /// Validate the marker line and the presence of the expected columns
    fn check_structure(&self, source: &SourceFile) -> Probe {
        let first_line = source.first_line().unwrap_or_default().trim();
        if first_line != self.marker_line {
            return Err(format!(
                "first line is '{}', expected marker '{}'",
                first_line, self.marker_line
            ));
        }

        let header = source
            .records_limited(self.separator, self.lines_before_header(), 1)
            .map_err(|e| e.to_string())?
            .into_iter()
            .next()
            .ok_or_else(|| "column header is missing".to_string())?;

        let missing: Vec<&str> = self
            .settings
            .expected_columns
            .iter()
            .map(String::as_str)
            .filter(|expected| !header.iter().any(|field| field.trim() == *expected))
            .collect();
        if !missing.is_empty() {
            return Err(format!("missing expected columns {:?}", missing));
        }

        Ok(())
    }

    fn convert_row(
        &self,
        columns: &ColumnIndex,
        record: &StringRecord,
    ) -> Result<NormalizedTransaction, NormalizerError> {
        let cell = |index: usize| record.get(index).unwrap_or_default();

        Ok(NormalizedTransaction {
            transaction_date: parse_date(cell(columns.date), &self.settings.date_format)?,
            payee: cell(columns.payee).to_string(),
            notes: cell(columns.notes).to_string(),
            debit: parse_amount(cell(columns.debit))?.abs(),
            credit: parse_amount(cell(columns.credit))?.abs(),
        })
    }

    fn output_prefix(&self, card_number: &str) -> String {
        let name = match self.account_names.get(card_number).filter(|name| !name.is_empty()) {
            Some(friendly) => {
                tracing::debug!("Found friendly name '{}' for card {}", friendly, card_number);
                friendly.clone()
            }
            None => {
                tracing::debug!("No friendly name found for card {}", card_number);
                format!("card_{}", card_number)
            }
        };

        format!("ubs_cards_{}", name.to_lowercase().replace(' ', "_"))
    }
}

impl DialectParser for UbsCardsParser {
    fn name(&self) -> &'static str {
        NAME
    }

    fn can_process(&self, path: &Path) -> bool {
        probe_to_bool(NAME, path, self.probe(path))
    }

    fn process(&self, path: &Path) -> Result<ProcessingResult, NormalizerError> {
        tracing::debug!("Processing UBS cards CSV file: {}", path.display());

        let source = SourceFile::open(path, self.encoding).map_err(|e| {
            NormalizerError::invalid_format_caused(path, "failed to read the file", e)
        })?;
        self.check_structure(&source)
            .map_err(|reason| NormalizerError::invalid_format(path, &reason))?;

        let records = source
            .records(self.separator, self.lines_before_header())
            .map_err(|e| {
                NormalizerError::invalid_format_caused(path, "failed to read transactions", e)
            })?;
        let (header, rows) = records
            .split_first()
            .ok_or_else(|| NormalizerError::invalid_format(path, "column header is missing"))?;
        let columns = ColumnIndex::from_header(header)
            .map_err(|reason| NormalizerError::invalid_format(path, &reason))?;

        let mut transactions = Vec::new();
        let mut card_number = None;
        for (index, record) in rows.iter().enumerate() {
            if record.get(columns.date).unwrap_or_default().is_empty() {
                tracing::debug!("Skipping footer row {} of {}", index + 1, path.display());
                continue;
            }

            let transaction = self.convert_row(&columns, record).map_err(|e| {
                let reason = format!("transaction row {}", index + 1);
                NormalizerError::invalid_format_caused(path, &reason, e)
            })?;
            card_number
                .get_or_insert_with(|| record.get(columns.card).unwrap_or_default().to_string());
            transactions.push(transaction);
        }

        let card_number = card_number
            .ok_or_else(|| NormalizerError::invalid_format(path, "no transactions found"))?;
        let output_prefix = self.output_prefix(&card_number);
        tracing::debug!("Using output prefix: {}", output_prefix);

        Ok(ProcessingResult::new(transactions, output_prefix))
    }
}
