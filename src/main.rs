//! Bank CSV normalizer CLI
//!
//! Command-line interface for turning bank CSV exports into monthly
//! normalized transaction files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- -f statement.csv                      # preview the parsed rows
//! cargo run -- -f exports/ -o monthly/               # process a directory
//! cargo run -- -f statement.csv -o monthly/ -c config.toml -v
//! ```
//!
//! The configuration path comes from `--config` or the
//! `BANK_CSV_NORMALIZER_CONFIG` environment variable. `RUST_LOG` overrides
//! the log filter.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (invalid input path, unreadable configuration, write failure, etc.)

use bank_csv_normalizer::cli;
use bank_csv_normalizer::config::Config;
use bank_csv_normalizer::core::Pipeline;
use bank_csv_normalizer::NormalizerError;
use std::process;

fn main() {
    // Parse command-line arguments using clap
    let args = cli::parse_args();

    // Initialize tracing; RUST_LOG takes precedence over --verbose
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| args.log_directive().into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Run the pipeline and exit with status 1 on any error
    if let Err(e) = run(&args) {
        tracing::error!("Processing failed: {}", e);
        process::exit(1);
    }
}

fn run(args: &cli::CliArgs) -> Result<(), NormalizerError> {
    // Load configuration from --config or the environment
    let config = Config::load(args.config.as_deref())?;

    // Create the output directory if needed
    if let Some(output) = &args.output {
        std::fs::create_dir_all(output)?;
    }

    // Process the input file or directory
    Pipeline::new(&config).run(&args.file, args.output.as_deref())
}
