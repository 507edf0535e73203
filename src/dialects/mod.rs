//! Dialect registry and format detection
//!
//! Each supported vendor export implements [`DialectParser`]. Dialects are
//! listed in [`DIALECTS`] in a fixed priority order; detection instantiates
//! them from the configuration in that order and picks the first one whose
//! `can_process` accepts the file. The order breaks ties between dialects
//! that could structurally overlap, so it is part of the contract.
//!
//! # Adding a dialect
//!
//! Implement [`DialectParser`], add a `build_*` function and append a
//! [`DialectDescriptor`] to [`DIALECTS`].

use crate::config::Config;
use crate::io::{SourceFile, TextEncoding};
use crate::types::{NormalizerError, ProcessingResult};
use std::path::Path;

pub mod ubs_account;
pub mod ubs_cards;

pub use ubs_account::UbsAccountParser;
pub use ubs_cards::UbsCardsParser;

/// Capability shared by every vendor dialect
pub trait DialectParser: std::fmt::Debug {
    /// Configuration name of the dialect (`processors.<name>`)
    fn name(&self) -> &'static str;

    /// Cheap structural check; never fails and never panics
    ///
    /// Any read, decode or parse problem means "not this dialect".
    fn can_process(&self, path: &Path) -> bool;

    /// Parse the file into the normalized schema
    ///
    /// # Errors
    ///
    /// Returns `InvalidFormat` if the structural validation fails again, or if
    /// reading, decoding or parsing fails; the underlying error is kept as the
    /// source.
    fn process(&self, path: &Path) -> Result<ProcessingResult, NormalizerError>;
}

/// Outcome of a structural probe: `Err` carries the rejection reason
pub type Probe = Result<(), String>;

/// Collapse a probe into the boolean `can_process` answer, logging rejections
pub(crate) fn probe_to_bool(dialect: &str, path: &Path, probe: Probe) -> bool {
    match probe {
        Ok(()) => {
            tracing::debug!("{} accepted as {} file", path.display(), dialect);
            true
        }
        Err(reason) => {
            tracing::debug!("Rejected {} for {}: {}", path.display(), dialect, reason);
            false
        }
    }
}

/// Read the first `lines` lines of a file for probing, turning every failure
/// into a rejection reason
pub(crate) fn open_for_probe(
    path: &Path,
    encoding: TextEncoding,
    lines: usize,
) -> Result<SourceFile, String> {
    SourceFile::open_prefix(path, encoding, lines)
        .map_err(|e| format!("failed to read file: {}", e))
}

/// A registered dialect: its name and how to build it from the configuration
pub struct DialectDescriptor {
    pub name: &'static str,
    pub build: fn(&Config) -> Result<Box<dyn DialectParser>, NormalizerError>,
}

fn build_ubs_account(config: &Config) -> Result<Box<dyn DialectParser>, NormalizerError> {
    Ok(Box::new(UbsAccountParser::from_config(config)?))
}

fn build_ubs_cards(config: &Config) -> Result<Box<dyn DialectParser>, NormalizerError> {
    Ok(Box::new(UbsCardsParser::from_config(config)?))
}

/// Registered dialects in detection priority order
pub const DIALECTS: &[DialectDescriptor] = &[
    DialectDescriptor {
        name: ubs_account::NAME,
        build: build_ubs_account,
    },
    DialectDescriptor {
        name: ubs_cards::NAME,
        build: build_ubs_cards,
    },
];

/// Names of the registered dialects in priority order
pub fn registered_dialects() -> Vec<&'static str> {
    DIALECTS.iter().map(|d| d.name).collect()
}

/// Selects the dialect parser for a file
pub struct FormatDetector<'a> {
    config: &'a Config,
    dialects: &'a [DialectDescriptor],
}

impl<'a> FormatDetector<'a> {
    /// Detector over the registered [`DIALECTS`]
    pub fn new(config: &'a Config) -> Self {
        Self::with_dialects(config, DIALECTS)
    }

    /// Detector over an explicit, ordered list of dialects
    pub fn with_dialects(config: &'a Config, dialects: &'a [DialectDescriptor]) -> Self {
        FormatDetector { config, dialects }
    }

    /// Return the first dialect parser accepting `path`
    ///
    /// A dialect whose configuration is missing or invalid is skipped as if
    /// it had rejected the file.
    ///
    /// # Errors
    ///
    /// `NoMatchingDialect` when no dialect accepts the file.
    pub fn detect(&self, path: &Path) -> Result<Box<dyn DialectParser>, NormalizerError> {
        for descriptor in self.dialects {
            let parser = match (descriptor.build)(self.config) {
                Ok(parser) => parser,
                Err(e) => {
                    tracing::debug!("Dialect {} unavailable: {}", descriptor.name, e);
                    continue;
                }
            };

            if parser.can_process(path) {
                return Ok(parser);
            }
        }

        Err(NormalizerError::no_matching_dialect(path))
    }
}

/// Return the first registered dialect parser accepting `path`
pub fn get_processor_for_file(
    config: &Config,
    path: &Path,
) -> Result<Box<dyn DialectParser>, NormalizerError> {
    FormatDetector::new(config).detect(path)
}
