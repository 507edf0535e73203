use clap::Parser;
use std::path::PathBuf;

/// Normalize bank CSV exports into monthly transaction files
#[derive(Parser, Debug)]
#[command(name = "bank-csv-normalizer")]
#[command(about = "Normalize bank CSV exports into monthly transaction files", long_about = None)]
pub struct CliArgs {
    /// Input file or directory to process
    #[arg(
        short = 'f',
        long = "file",
        value_name = "PATH",
        help = "Path to input file or directory to process"
    )]
    pub file: PathBuf,

    /// Output directory for the monthly files; previews the parsed rows when absent
    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        help = "Output directory for processed files (optional)"
    )]
    pub output: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long = "verbose", help = "Enable verbose logging")]
    pub verbose: bool,

    /// Configuration file, overriding BANK_CSV_NORMALIZER_CONFIG
    #[arg(
        short = 'c',
        long = "config",
        value_name = "PATH",
        help = "Path to the configuration file (optional)"
    )]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    /// Default tracing filter directive for the chosen verbosity
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "bank_csv_normalizer=debug"
        } else {
            "bank_csv_normalizer=info"
        }
    }
}
