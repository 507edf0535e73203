//! Configuration store
//!
//! A hierarchical TOML document read once at startup and passed by reference
//! to every component that needs settings. Dialects read their own
//! `processors.<name>` section into a typed struct with [`Config::section`];
//! scalar lookups go through [`Config::get`] with a dotted key path.
//!
//! Reloading means constructing a new `Config`; nothing is cached globally.

use crate::types::NormalizerError;
use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Environment variable consulted when no `--config` flag is given
pub const CONFIG_PATH_ENV: &str = "BANK_CSV_NORMALIZER_CONFIG";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    root: toml::Table,
}

impl Default for Config {
    fn default() -> Self {
        Self::empty()
    }
}

impl Config {
    /// The base configuration: empty `processors` and `output` tables
    pub fn empty() -> Self {
        let mut root = toml::Table::new();
        root.insert("processors".into(), toml::Value::Table(toml::Table::new()));
        root.insert("output".into(), toml::Value::Table(toml::Table::new()));
        Config { root }
    }

    /// Load the configuration from the override path, falling back to
    /// [`CONFIG_PATH_ENV`]
    ///
    /// A missing path or a path that does not exist yields the empty base
    /// configuration with a warning. A file that exists but does not parse is
    /// an error.
    pub fn load(path_override: Option<&Path>) -> Result<Self, NormalizerError> {
        let path = path_override
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let Some(path) = path else {
            tracing::warn!(
                "Configuration file not specified via argument or {} environment variable. \
                 Using default settings. Copy config.template.toml to create your configuration.",
                CONFIG_PATH_ENV
            );
            return Ok(Self::empty());
        };

        if !path.exists() {
            tracing::warn!("Config file not found at {}. Using default settings.", path.display());
            return Ok(Self::empty());
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| NormalizerError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml_str(&contents).map_err(|e| match e {
            NormalizerError::ConfigParse { message, .. } => NormalizerError::ConfigParse {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })?;

        tracing::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse a configuration document, layering it over the base configuration
    pub fn from_toml_str(contents: &str) -> Result<Self, NormalizerError> {
        let loaded: toml::Table =
            toml::from_str(contents).map_err(|e| NormalizerError::ConfigParse {
                path: "<inline>".to_string(),
                message: e.to_string(),
            })?;

        let mut config = Self::empty();
        config.root.extend(loaded);
        Ok(config)
    }

    /// Look up a value by dotted key path, e.g. `output.date_format`
    pub fn get(&self, key_path: &str) -> Result<&toml::Value, NormalizerError> {
        let mut segments = key_path.split('.');
        let first = segments.next().unwrap_or_default();
        let mut current = self
            .root
            .get(first)
            .ok_or_else(|| NormalizerError::missing_config_key(key_path))?;

        for segment in segments {
            current = current
                .as_table()
                .and_then(|table| table.get(segment))
                .ok_or_else(|| NormalizerError::missing_config_key(key_path))?;
        }

        Ok(current)
    }

    pub fn get_str(&self, key_path: &str) -> Result<&str, NormalizerError> {
        self.get(key_path)?
            .as_str()
            .ok_or_else(|| NormalizerError::invalid_config(key_path, "expected a string"))
    }

    /// Deserialize the table at `key_path` into a typed settings struct
    ///
    /// Missing fields inside the table surface as `InvalidConfig` naming the
    /// section.
    pub fn section<T: DeserializeOwned>(&self, key_path: &str) -> Result<T, NormalizerError> {
        self.get(key_path)?
            .clone()
            .try_into()
            .map_err(|e: toml::de::Error| NormalizerError::invalid_config(key_path, e.message()))
    }

    /// Friendly account names configured for a dialect
    ///
    /// An absent table is not an error: every lookup then falls back to the
    /// raw identifier.
    pub fn account_names(&self, dialect: &str) -> Result<HashMap<String, String>, NormalizerError> {
        let key = format!("processors.{}.account_names", dialect);
        match self.get(&key) {
            Ok(_) => self.section(&key),
            Err(NormalizerError::MissingConfigKey { .. }) => Ok(HashMap::new()),
            Err(e) => Err(e),
        }
    }
}

/// Resolve an IBAN-like identifier to its friendly name
///
/// Spaces are removed before lookup; the cleaned identifier is returned when
/// no friendly name is configured.
pub fn account_name(names: &HashMap<String, String>, identifier: &str) -> String {
    let clean: String = identifier.chars().filter(|c| !c.is_whitespace()).collect();

    match names.get(&clean).filter(|name| !name.is_empty()) {
        Some(friendly) => {
            tracing::debug!("Found friendly name '{}' for {}", friendly, identifier);
            friendly.clone()
        }
        None => {
            tracing::debug!("No friendly name found for {}", identifier);
            clean
        }
    }
}

/// Check that a strftime pattern can format a plain date
///
/// chrono panics when a `Display` of an invalid pattern is turned into a
/// `String`. That covers unknown specifiers and specifiers a `NaiveDate`
/// cannot fill (`%H`, `%M`, `%z`), so patterns used for output are checked
/// up front by formatting a sample date.
pub fn validate_date_format(key: &str, format: &str) -> Result<(), NormalizerError> {
    let invalid = || {
        NormalizerError::invalid_config(key, format!("'{}' is not a valid date format", format))
    };

    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(invalid());
    }

    let mut rendered = String::new();
    write!(rendered, "{}", NaiveDate::MIN.format(format)).map_err(|_| invalid())?;
    Ok(())
}

/// Convert a configured separator string into the single byte csv expects
pub fn separator_byte(key: &str, separator: &str) -> Result<u8, NormalizerError> {
    match separator.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(NormalizerError::invalid_config(
            key,
            format!("separator must be a single ASCII character, got '{}'", separator),
        )),
    }
}
