//! Error types for the normalizer
//!
//! This module defines every error that can occur while detecting, parsing and
//! merging bank exports. Messages are meant to be read directly in CLI logs.
//!
//! # Error Categories
//!
//! - **Detection**: no registered dialect accepts a file
//! - **Format**: a file was selected but cannot be normalized
//! - **Configuration**: missing or malformed settings
//! - **I/O and CSV**: file system and tabular structure failures
//! - **Values**: dates and amounts that do not parse

use thiserror::Error;

/// Main error type for the normalizer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizerError {
    /// No registered dialect accepted the file
    ///
    /// Skippable: in directory mode the file is logged and skipped.
    #[error("No processor found for file: {path}")]
    NoMatchingDialect {
        /// The rejected input
        path: String,
    },

    /// The file was selected for a dialect but failed validation or parsing
    ///
    /// Fatal for that file only. When the failure stems from a lower-level
    /// error (decode, CSV, date, amount) it is kept as the error source.
    #[error("Invalid file format for {path}: {reason}")]
    InvalidFormat {
        /// The input being processed
        path: String,
        /// What failed, including the cause's message when there is one
        reason: String,
        #[source]
        cause: Option<Box<NormalizerError>>,
    },

    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// CSV structure error
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },

    /// A required configuration key is absent
    #[error("Missing configuration key: {key}")]
    MissingConfigKey {
        /// Dotted key path, e.g. `output.date_format`
        key: String,
    },

    /// A configuration value exists but has the wrong shape
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig {
        /// Dotted key path of the offending value
        key: String,
        message: String,
    },

    /// The configuration file could not be parsed
    #[error("Failed to parse config file {path}: {message}")]
    ConfigParse {
        path: String,
        /// Parser message, with position
        message: String,
    },

    /// The configured encoding name is not supported
    #[error("Unsupported encoding '{encoding}'")]
    UnsupportedEncoding {
        encoding: String,
    },

    /// Bytes could not be decoded with the configured encoding
    #[error("Failed to decode as {encoding}: {message}")]
    Decode {
        encoding: String,
        message: String,
    },

    /// A date cell did not match the configured format
    #[error("Invalid date '{value}' (expected format '{format}')")]
    InvalidDate {
        /// The cell as found in the file
        value: String,
        /// The configured strftime pattern
        format: String,
    },

    /// An amount cell is not a decimal number
    #[error("Invalid amount '{value}'")]
    InvalidAmount {
        value: String,
    },
}

impl From<std::io::Error> for NormalizerError {
    fn from(error: std::io::Error) -> Self {
        NormalizerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for NormalizerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        NormalizerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl NormalizerError {
    /// Create a NoMatchingDialect error
    pub fn no_matching_dialect(path: &std::path::Path) -> Self {
        NormalizerError::NoMatchingDialect {
            path: path.display().to_string(),
        }
    }

    /// Create an InvalidFormat error without an underlying cause
    pub fn invalid_format(path: &std::path::Path, reason: &str) -> Self {
        NormalizerError::InvalidFormat {
            path: path.display().to_string(),
            reason: reason.to_string(),
            cause: None,
        }
    }

    /// Wrap a lower-level error into InvalidFormat, keeping it as the source
    pub fn invalid_format_caused(
        path: &std::path::Path,
        reason: &str,
        cause: NormalizerError,
    ) -> Self {
        NormalizerError::InvalidFormat {
            path: path.display().to_string(),
            reason: format!("{}: {}", reason, cause),
            cause: Some(Box::new(cause)),
        }
    }

    /// Create a MissingConfigKey error
    pub fn missing_config_key(key: &str) -> Self {
        NormalizerError::MissingConfigKey {
            key: key.to_string(),
        }
    }

    /// Create an InvalidConfig error
    pub fn invalid_config(key: &str, message: impl std::fmt::Display) -> Self {
        NormalizerError::InvalidConfig {
            key: key.to_string(),
            message: message.to_string(),
        }
    }

    /// Create an InvalidDate error
    pub fn invalid_date(value: &str, format: &str) -> Self {
        NormalizerError::InvalidDate {
            value: value.to_string(),
            format: format.to_string(),
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(value: &str) -> Self {
        NormalizerError::InvalidAmount {
            value: value.to_string(),
        }
    }

    /// Whether a directory run may skip the file and carry on
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            NormalizerError::NoMatchingDialect { .. } | NormalizerError::InvalidFormat { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::error::Error as _;
    use std::path::Path;

    #[rstest]
    #[case::no_matching_dialect(
        NormalizerError::NoMatchingDialect {
            path: "notes.txt".to_string(),
        },
        "No processor found for file: notes.txt"
    )]
    #[case::file_not_found(
        NormalizerError::FileNotFound {
            path: "in.csv".to_string(),
        },
        "File not found: in.csv"
    )]
    #[case::parse_error_with_line(
        NormalizerError::ParseError {
            line: Some(7),
            message: "found record with 3 fields".to_string(),
        },
        "CSV parse error at line 7: found record with 3 fields"
    )]
    #[case::parse_error_without_line(
        NormalizerError::ParseError {
            line: None,
            message: "unexpected EOF".to_string(),
        },
        "CSV parse error: unexpected EOF"
    )]
    #[case::missing_config_key(
        NormalizerError::MissingConfigKey {
            key: "output.date_format".to_string(),
        },
        "Missing configuration key: output.date_format"
    )]
    #[case::invalid_date(
        NormalizerError::InvalidDate {
            value: "31/02".to_string(),
            format: "%d.%m.%Y".to_string(),
        },
        "Invalid date '31/02' (expected format '%d.%m.%Y')"
    )]
    #[case::unsupported_encoding(
        NormalizerError::UnsupportedEncoding {
            encoding: "ebcdic".to_string(),
        },
        "Unsupported encoding 'ebcdic'"
    )]
    fn test_error_display(#[case] error: NormalizerError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }

    #[test]
    fn test_invalid_format_keeps_cause_as_source() {
        let cause = NormalizerError::invalid_amount("12,x");
        let error =
            NormalizerError::invalid_format_caused(Path::new("a.csv"), "bad row", cause.clone());

        assert_eq!(
            error.to_string(),
            "Invalid file format for a.csv: bad row: Invalid amount '12,x'"
        );
        let source = error.source().expect("cause should be exposed as source");
        assert_eq!(source.to_string(), cause.to_string());
    }

    #[rstest]
    #[case::no_match(NormalizerError::no_matching_dialect(Path::new("x.txt")), true)]
    #[case::invalid_format(NormalizerError::invalid_format(Path::new("x.csv"), "headers"), true)]
    #[case::io(
        NormalizerError::IoError {
            message: "disk full".to_string(),
        },
        false
    )]
    #[case::config(NormalizerError::missing_config_key("output"), false)]
    fn test_is_per_file(#[case] error: NormalizerError, #[case] expected: bool) {
        assert_eq!(error.is_per_file(), expected);
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "Permission denied");
        let error: NormalizerError = io_error.into();
        assert!(matches!(error, NormalizerError::IoError { .. }));
        assert_eq!(error.to_string(), "I/O error: Permission denied");
    }
}
