//! UBS bank account CSV export
//!
//! The export starts with a block of `label;value` rows (account number,
//! IBAN, period, balances), optionally followed by a blank line, then the
//! transaction table:
//!
//! ```text
//! Numéro de compte:;0234 00103914.40;
//! IBAN:;CH93 0076 2011 6238 5295 7;
//! ...
//!
//! Date de transaction;Heure de transaction;...;Description3;Notes de bas de page;
//! 2024-01-05;10:21:33;2024-01-05;2024-01-05;CHF;-45.20;;;1954.80;99301;Coop-1234 Basel;...
//! ```
//!
//! Transaction columns are positional. Description 2, description 3,
//! footnotes and the trailing info column are joined into `notes`.

use crate::config::{account_name, separator_byte, Config};
use crate::dialects::{open_for_probe, probe_to_bool, DialectParser, Probe};
use crate::io::{parse_amount, parse_date, SourceFile, TextEncoding};
use crate::types::{NormalizedTransaction, NormalizerError, ProcessingResult};
use csv::StringRecord;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Configuration name, `processors.ubs_csv`
pub const NAME: &str = "ubs_csv";

const ACCOUNT_NUMBER_ROW: usize = 0;
const IBAN_ROW: usize = 1;

const DATE_COLUMN: usize = 0;
const DEBIT_COLUMN: usize = 5;
const CREDIT_COLUMN: usize = 6;
const PAYEE_COLUMN: usize = 10;
/// Description 2, description 3, footnotes, other info
const NOTES_COLUMNS: [usize; 4] = [11, 12, 13, 14];

#[derive(Debug, Clone, Deserialize)]
pub struct CsvSettings {
    pub encoding: String,
    pub separator: String,
    /// Physical lines before the transaction header, blank lines included
    pub header_rows: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UbsAccountSettings {
    pub csv_settings: CsvSettings,
    /// First-column labels of the leading block, in order
    pub expected_header_labels: Vec<String>,
    /// Exact transaction header
    pub expected_transaction_labels: Vec<String>,
    pub date_format: String,
}

#[derive(Debug, Clone)]
pub struct UbsAccountParser {
    settings: UbsAccountSettings,
    encoding: TextEncoding,
    separator: u8,
    account_names: HashMap<String, String>,
}

impl UbsAccountParser {
    pub fn from_config(config: &Config) -> Result<Self, NormalizerError> {
        let settings: UbsAccountSettings = config.section(&format!("processors.{}", NAME))?;
        let encoding: TextEncoding = settings.csv_settings.encoding.parse()?;
        let separator = separator_byte(
            &format!("processors.{}.csv_settings.separator", NAME),
            &settings.csv_settings.separator,
        )?;

        Ok(UbsAccountParser {
            settings,
            encoding,
            separator,
            account_names: config.account_names(NAME)?,
        })
    }

    fn header_rows(&self) -> usize {
        self.settings.csv_settings.header_rows
    }

    fn probe(&self, path: &Path) -> Probe {
        let has_csv_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if !has_csv_extension {
            return Err("file has no .csv extension".to_string());
        }

        // Label block plus the transaction header
        let source = open_for_probe(path, self.encoding, self.header_rows() + 1)?;
        self.check_structure(&source)
    }

    /// Validate the label block and the transaction header
    fn check_structure(&self, source: &SourceFile) -> Probe {
        let labels = self.label_block(source).map_err(|e| e.to_string())?;

        let required_rows = self.settings.expected_header_labels.len().max(IBAN_ROW + 1);
        if labels.len() < required_rows || labels[..required_rows].iter().any(|row| row.len() < 2) {
            return Err(format!(
                "file lacks the expected {} header rows with 2 columns each",
                required_rows
            ));
        }

        for (index, expected) in self.settings.expected_header_labels.iter().enumerate() {
            let actual = labels[index].get(0).unwrap_or_default();
            if actual != expected {
                return Err(format!(
                    "header label mismatch at row {} (expected '{}', found '{}')",
                    index + 1,
                    expected,
                    actual
                ));
            }
        }

        let header = source
            .records_limited(self.separator, self.header_rows(), 1)
            .map_err(|e| e.to_string())?
            .into_iter()
            .next()
            .ok_or_else(|| "transaction header is missing".to_string())?;

        let columns = header_columns(&header);
        if columns != self.settings.expected_transaction_labels {
            return Err(format!(
                "transaction section columns mismatch, expected {:?}, found {:?}",
                self.settings.expected_transaction_labels, columns
            ));
        }

        Ok(())
    }

    fn label_block(&self, source: &SourceFile) -> Result<Vec<StringRecord>, NormalizerError> {
        source.leading_records(self.separator, self.header_rows())
    }

    fn convert_row(&self, record: &StringRecord) -> Result<NormalizedTransaction, NormalizerError> {
        let cell = |index: usize| record.get(index).unwrap_or_default();

        let notes = NOTES_COLUMNS
            .iter()
            .map(|&index| cell(index))
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(NormalizedTransaction {
            transaction_date: parse_date(cell(DATE_COLUMN), &self.settings.date_format)?,
            payee: cell(PAYEE_COLUMN).to_string(),
            notes,
            debit: parse_amount(cell(DEBIT_COLUMN))?.abs(),
            credit: parse_amount(cell(CREDIT_COLUMN))?.abs(),
        })
    }
}

/// Trimmed header cells without the empty cells a trailing separator leaves
fn header_columns(header: &StringRecord) -> Vec<String> {
    let mut columns: Vec<String> = header.iter().map(|c| c.trim().to_string()).collect();
    while columns.last().is_some_and(|c| c.is_empty()) {
        columns.pop();
    }
    columns
}

impl DialectParser for UbsAccountParser {
    fn name(&self) -> &'static str {
        NAME
    }

    fn can_process(&self, path: &Path) -> bool {
        probe_to_bool(NAME, path, self.probe(path))
    }

    fn process(&self, path: &Path) -> Result<ProcessingResult, NormalizerError> {
        tracing::debug!("Processing UBS CSV file: {}", path.display());

        let source = SourceFile::open(path, self.encoding).map_err(|e| {
            NormalizerError::invalid_format_caused(path, "failed to read the file", e)
        })?;
        self.check_structure(&source)
            .map_err(|reason| NormalizerError::invalid_format(path, &reason))?;

        let labels = self.label_block(&source).map_err(|e| {
            NormalizerError::invalid_format_caused(path, "failed to read header rows", e)
        })?;
        let label_value = |row: usize| labels.get(row).and_then(|r| r.get(1)).unwrap_or_default();
        let account_number = label_value(ACCOUNT_NUMBER_ROW);
        let iban = label_value(IBAN_ROW);
        tracing::debug!("Processing account {} (IBAN: {})", account_number, iban);

        let records = source
            .records(self.separator, self.header_rows())
            .map_err(|e| {
                NormalizerError::invalid_format_caused(path, "failed to read transactions", e)
            })?;

        let mut transactions = Vec::new();
        for (index, record) in records.iter().enumerate().skip(1) {
            if record.get(DATE_COLUMN).unwrap_or_default().is_empty() {
                tracing::debug!(
                    "Skipping row {} of {}: no transaction date",
                    index,
                    path.display()
                );
                continue;
            }

            let transaction = self.convert_row(record).map_err(|e| {
                let reason = format!("transaction row {}", index);
                NormalizerError::invalid_format_caused(path, &reason, e)
            })?;
            transactions.push(transaction);
        }

        let output_prefix = format!("ubs_{}", account_name(&self.account_names, iban));
        tracing::debug!("Using output prefix: {}", output_prefix);

        Ok(ProcessingResult::new(transactions, output_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    const CONFIG: &str = r#"
[processors.ubs_csv]
date_format = "%Y-%m-%d"
expected_header_labels = ["Numéro de compte:", "IBAN:", "Du:", "Au:"]
expected_transaction_labels = [
    "Date de transaction", "Heure de transaction", "Date de comptabilisation",
    "Date de valeur", "Monnaie", "Débit", "Crédit", "Sous-montant", "Solde",
    "N° de transaction", "Description1", "Description2", "Description3",
    "Notes de bas de page",
]

[processors.ubs_csv.csv_settings]
encoding = "utf-8"
separator = ";"
header_rows = 5

[processors.ubs_csv.account_names]
CH9300762011623852957 = "main"
"#;

    const IBAN: &str = "CH93 0076 2011 6238 5295 7";

    const HEADER: &str = "Date de transaction;Heure de transaction;Date de comptabilisation;\
                          Date de valeur;Monnaie;Débit;Crédit;Sous-montant;Solde;N° de transaction;\
                          Description1;Description2;Description3;Notes de bas de page;";

    fn export(iban: &str, header: &str, rows: &[&str]) -> String {
        let mut text = format!(
            "Numéro de compte:;0234 00103914.40;\n\
             IBAN:;{};\n\
             Du:;2024-01-01;\n\
             Au:;2024-02-29;\n\n{}\n",
            iban, header
        );
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        text
    }

    fn create_temp_file(suffix: &str, content: &[u8]) -> NamedTempFile {
        let mut file = Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("Failed to create temp file");
        file.write_all(content).expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn parser() -> UbsAccountParser {
        UbsAccountParser::from_config(&Config::from_toml_str(CONFIG).unwrap()).unwrap()
    }

    const ROWS: [&str; 3] = [
        "2024-01-05;10:21:33;2024-01-05;2024-01-05;CHF;-45.20;;;1954.80;9930105TO1;\
         Coop-1234 Basel;Paiement carte de débit;No de transaction: 123;;",
        "2024-01-25;;2024-01-25;2024-01-25;CHF;;5000.00;;6954.80;9930125TI2;\
         Acme AG;Salaire janvier;;;",
        "2024-02-03;;2024-02-03;2024-02-03;CHF;-1'200.00;;;5754.80;9930203TO3;\
         Immo Verwaltung;Loyer;Février 2024;Ordre permanent;",
    ];

    #[test]
    fn test_can_process_valid_export() {
        let file = create_temp_file(".csv", export(IBAN, HEADER, &ROWS).as_bytes());
        assert!(parser().can_process(file.path()));
    }

    #[test]
    fn test_can_process_accepts_uppercase_extension() {
        let file = create_temp_file(".CSV", export(IBAN, HEADER, &ROWS).as_bytes());
        assert!(parser().can_process(file.path()));
    }

    #[test]
    fn test_can_process_invalid_extension() {
        let file = create_temp_file(".txt", export(IBAN, HEADER, &ROWS).as_bytes());
        assert!(!parser().can_process(file.path()));
    }

    #[test]
    fn test_can_process_invalid_header() {
        let text = export("CH93", HEADER, &ROWS).replace("IBAN:", "BIC:");
        let file = create_temp_file(".csv", text.as_bytes());
        assert!(!parser().can_process(file.path()));
    }

    #[test]
    fn test_can_process_invalid_transaction_columns() {
        let header = HEADER.replace("Solde;", "Balance;");
        let file = create_temp_file(".csv", export("CH93", &header, &ROWS).as_bytes());
        assert!(!parser().can_process(file.path()));
    }

    #[test]
    fn test_can_process_invalid_encoding() {
        let latin1: Vec<u8> = export("CH93", HEADER, &ROWS).chars().map(|c| c as u8).collect();
        let file = create_temp_file(".csv", &latin1);
        assert!(!parser().can_process(file.path()));
    }

    #[rstest]
    #[case::missing_file(b"" as &[u8], false)]
    #[case::binary(&[0u8, 159, 146, 150, 0xff, 0xfe], true)]
    #[case::too_short(b"Num\xc3\xa9ro de compte:;0234;\n", true)]
    fn test_can_process_never_fails(#[case] content: &[u8], #[case] create: bool) {
        if create {
            let file = create_temp_file(".csv", content);
            assert!(!parser().can_process(file.path()));
        } else {
            assert!(!parser().can_process(Path::new("does/not/exist.csv")));
        }
    }

    #[test]
    fn test_can_process_ignores_rows_after_header() {
        let mut content = export("CH93", HEADER, &[]).into_bytes();
        content.extend_from_slice(
            b"2024-01-05;;2024-01-05;2024-01-05;CHF;-1.00;;;0;1;Caf\xe9;;;;\n",
        );
        let file = create_temp_file(".csv", &content);
        let parser = parser();

        assert!(parser.can_process(file.path()));
        match parser.process(file.path()).unwrap_err() {
            NormalizerError::InvalidFormat { cause: Some(cause), .. } => {
                assert!(matches!(*cause, NormalizerError::Decode { .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_process_maps_columns() {
        let file = create_temp_file(".csv", export(IBAN, HEADER, &ROWS).as_bytes());
        let result = parser().process(file.path()).unwrap();

        assert_eq!(result.output_prefix, "ubs_main");
        assert_eq!(result.len(), 3);

        let first = &result.transactions[0];
        assert_eq!(first.transaction_date.to_string(), "2024-01-05");
        assert_eq!(first.payee, "Coop-1234 Basel");
        assert_eq!(first.notes, "Paiement carte de débit No de transaction: 123");
        assert_eq!(first.debit, Decimal::new(4520, 2));
        assert_eq!(first.credit, Decimal::ZERO);

        let salary = &result.transactions[1];
        assert_eq!(salary.notes, "Salaire janvier");
        assert_eq!(salary.debit, Decimal::ZERO);
        assert_eq!(salary.credit, Decimal::new(5000, 0));

        let rent = &result.transactions[2];
        assert_eq!(rent.notes, "Loyer Février 2024 Ordre permanent");
        assert_eq!(rent.debit, Decimal::new(1200, 0));
    }

    #[test]
    fn test_process_falls_back_to_clean_iban() {
        let file = create_temp_file(".csv", export("CH12 3456 7890", HEADER, &ROWS).as_bytes());
        let result = parser().process(file.path()).unwrap();
        assert_eq!(result.output_prefix, "ubs_CH1234567890");
    }

    #[test]
    fn test_process_revalidates_structure() {
        let header = HEADER.replace("Solde;", "Balance;");
        let file = create_temp_file(".csv", export("CH93", &header, &ROWS).as_bytes());

        let err = parser().process(file.path()).unwrap_err();
        assert!(matches!(err, NormalizerError::InvalidFormat { cause: None, .. }));
    }

    #[test]
    fn test_process_wraps_bad_date_with_cause() {
        let row = ROWS[0].replacen("2024-01-05", "05.01.2024", 1);
        let file = create_temp_file(".csv", export("CH93", HEADER, &[row.as_str()]).as_bytes());

        match parser().process(file.path()).unwrap_err() {
            NormalizerError::InvalidFormat { cause: Some(cause), .. } => {
                assert!(matches!(*cause, NormalizerError::InvalidDate { .. }));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_from_config_requires_section() {
        let err = UbsAccountParser::from_config(&Config::empty()).unwrap_err();
        assert_eq!(err, NormalizerError::missing_config_key("processors.ubs_csv"));
    }
}
