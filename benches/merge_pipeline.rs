//! Benchmarks for parsing and the monthly merge
//!
//! # Running Benchmarks
//!
//! ```bash
//! cargo bench
//! ```
//!
//! Card exports of 100, 1,000 and 10,000 rows spread over twelve months are
//! generated into a temporary directory. Each benchmark measures one stage:
//! - parsing the export into the normalized table
//! - merging the table into an empty output directory
//! - merging the same table again, where every row is a duplicate

use bank_csv_normalizer::config::Config;
use bank_csv_normalizer::dialects::{DialectParser, UbsCardsParser};
use bank_csv_normalizer::MonthlyMergeEngine;
use divan::Bencher;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SIZES: &[usize] = &[100, 1_000, 10_000];

const CONFIG: &str = r#"
[output]
date_format = "%Y-%m"

[processors.ubs_cards]
date_format = "%d.%m.%Y"
expected_columns = ["Numéro de carte", "Texte comptable", "Secteur", "Débit", "Crédit", "Date d'achat"]

[processors.ubs_cards.csv_settings]
encoding = "utf-8"
separator = ";"
header_row = 2
"#;

fn main() {
    divan::main();
}

fn config() -> Config {
    Config::from_toml_str(CONFIG).expect("Invalid bench config")
}

/// Write a card export with `rows` purchases into `dir`
fn generate_export(dir: &Path, rows: usize) -> PathBuf {
    let mut text =
        String::from("sep=;\nNuméro de carte;Texte comptable;Secteur;Débit;Crédit;Date d'achat\n");
    for i in 0..rows {
        let day = i % 28 + 1;
        let month = i % 12 + 1;
        writeln!(
            text,
            "1234;Merchant {};Sector {};{}.{:02};;{:02}.{:02}.2024",
            i,
            i % 7,
            i % 500,
            i % 100,
            day,
            month
        )
        .expect("String write failed");
    }

    let path = dir.join(format!("cards_{}.csv", rows));
    std::fs::write(&path, text).expect("Failed to write bench export");
    path
}

#[divan::bench(args = SIZES)]
fn parse_cards_export(bencher: Bencher, rows: usize) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = generate_export(dir.path(), rows);
    let parser = UbsCardsParser::from_config(&config()).expect("Invalid parser config");

    bencher.bench_local(|| parser.process(&path).expect("Processing failed"));
}

#[divan::bench(args = SIZES)]
fn merge_into_empty_directory(bencher: Bencher, rows: usize) {
    let input = TempDir::new().expect("Failed to create temp dir");
    let path = generate_export(input.path(), rows);
    let config = config();
    let result = UbsCardsParser::from_config(&config)
        .and_then(|parser| parser.process(&path))
        .expect("Processing failed");
    let engine = MonthlyMergeEngine::from_config(&config).expect("Invalid output config");

    bencher
        .with_inputs(|| TempDir::new().expect("Failed to create temp dir"))
        .bench_local_values(|output| {
            engine
                .partition_and_merge(&result.transactions, output.path(), &result.output_prefix)
                .expect("Merge failed");
            output
        });
}

#[divan::bench(args = SIZES)]
fn merge_duplicates(bencher: Bencher, rows: usize) {
    let input = TempDir::new().expect("Failed to create temp dir");
    let output = TempDir::new().expect("Failed to create temp dir");
    let path = generate_export(input.path(), rows);
    let config = config();
    let result = UbsCardsParser::from_config(&config)
        .and_then(|parser| parser.process(&path))
        .expect("Processing failed");
    let engine = MonthlyMergeEngine::from_config(&config).expect("Invalid output config");
    engine
        .partition_and_merge(&result.transactions, output.path(), &result.output_prefix)
        .expect("Merge failed");

    bencher.bench_local(|| {
        engine
            .partition_and_merge(&result.transactions, output.path(), &result.output_prefix)
            .expect("Merge failed")
    });
}
