//! I/O module
//!
//! Handles reading bank exports and reading/writing normalized CSV.
//!
//! # Components
//!
//! - `encoding` - Configured text encodings (UTF-8, ISO-8859-1)
//! - `source` - Decoded bank export with record access from any line
//! - `csv_format` - Cell parsing and the normalized partition file format

pub mod csv_format;
pub mod encoding;
pub mod source;

pub use csv_format::{
    format_amount, parse_amount, parse_date, read_partition_file, write_partition_file,
    write_transactions_csv,
};
pub use encoding::TextEncoding;
pub use source::SourceFile;
