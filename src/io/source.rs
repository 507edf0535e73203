//! Decoded view of a bank export
//!
//! A [`SourceFile`] holds decoded text and hands out CSV records from any
//! line offset. [`SourceFile::open`] reads the whole file for the full parse;
//! [`SourceFile::open_prefix`] reads only the leading lines, which is all a
//! structural probe looks at.
//!
//! # Error Handling
//!
//! - A missing file is `FileNotFound`, other read failures are `IoError`
//! - Bytes that do not match the configured encoding are `Decode`
//! - Malformed CSV structure is `ParseError`

use crate::io::encoding::TextEncoding;
use crate::types::NormalizerError;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

/// Upper bound on the bytes [`SourceFile::open_prefix`] reads
pub const PREFIX_BYTE_LIMIT: u64 = 64 * 1024;

#[derive(Debug, Clone)]
pub struct SourceFile {
    path: PathBuf,
    text: String,
}

impl SourceFile {
    /// Read and decode a file
    pub fn open(path: &Path, encoding: TextEncoding) -> Result<Self, NormalizerError> {
        let bytes = std::fs::read(path).map_err(|e| open_error(path, e))?;

        Ok(SourceFile {
            path: path.to_path_buf(),
            text: encoding.decode(&bytes)?,
        })
    }

    /// Read and decode at most the first `lines` lines of a file
    ///
    /// Reading also stops after [`PREFIX_BYTE_LIMIT`] bytes, so a file without
    /// line breaks is never read in full. A line cut by that limit is kept
    /// as read; a multi-byte character cut with it fails to decode.
    pub fn open_prefix(
        path: &Path,
        encoding: TextEncoding,
        lines: usize,
    ) -> Result<Self, NormalizerError> {
        let file = File::open(path).map_err(|e| open_error(path, e))?;
        let mut reader = BufReader::new(file.take(PREFIX_BYTE_LIMIT));

        let mut bytes = Vec::new();
        for _ in 0..lines {
            if reader.read_until(b'\n', &mut bytes)? == 0 {
                break;
            }
        }

        Ok(SourceFile {
            path: path.to_path_buf(),
            text: encoding.decode(&bytes)?,
        })
    }

    /// Build a source from already decoded text
    pub fn from_text(path: &Path, text: impl Into<String>) -> Self {
        SourceFile {
            path: path.to_path_buf(),
            text: text.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// First physical line without its line terminator
    pub fn first_line(&self) -> Option<&str> {
        self.text.lines().next()
    }

    /// Parse CSV records starting after `skip_lines` physical lines
    ///
    /// No header handling is done here; callers decide which record is the
    /// header. Records may have differing field counts and every field is
    /// trimmed. Blank lines are skipped by the csv reader.
    pub fn records(
        &self,
        separator: u8,
        skip_lines: usize,
    ) -> Result<Vec<StringRecord>, NormalizerError> {
        self.records_limited(separator, skip_lines, usize::MAX)
    }

    /// Like [`SourceFile::records`] but stops after `limit` records
    pub fn records_limited(
        &self,
        separator: u8,
        skip_lines: usize,
        limit: usize,
    ) -> Result<Vec<StringRecord>, NormalizerError> {
        let start = line_offset(&self.text, skip_lines);
        parse_records(&self.text[start..], separator, limit)
    }

    /// Parse only the first `lines` physical lines
    ///
    /// Used for label blocks that precede the real table. Blank lines inside
    /// the block produce no record.
    pub fn leading_records(
        &self,
        separator: u8,
        lines: usize,
    ) -> Result<Vec<StringRecord>, NormalizerError> {
        let end = line_offset(&self.text, lines);
        parse_records(&self.text[..end], separator, usize::MAX)
    }
}

fn open_error(path: &Path, error: std::io::Error) -> NormalizerError {
    match error.kind() {
        std::io::ErrorKind::NotFound => NormalizerError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => NormalizerError::from(error),
    }
}

fn parse_records(
    text: &str,
    separator: u8,
    limit: usize,
) -> Result<Vec<StringRecord>, NormalizerError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .delimiter(separator)
        .from_reader(text.as_bytes());

    reader
        .records()
        .take(limit)
        .map(|record| record.map_err(NormalizerError::from))
        .collect()
}

/// Byte offset of the start of line `skip` (0-based), or the text length when
/// the text has fewer lines
fn line_offset(text: &str, skip: usize) -> usize {
    if skip == 0 {
        return 0;
    }
    text.match_indices('\n')
        .nth(skip - 1)
        .map(|(index, _)| index + 1)
        .unwrap_or(text.len())
}
