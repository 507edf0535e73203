//! Text encodings used by bank exports
//!
//! Exports come either as UTF-8 (sometimes with a byte order mark) or as
//! ISO-8859-1. Decoding never guesses: the dialect's configured encoding is
//! applied and a mismatch is an error.

use crate::types::NormalizerError;
use std::str::FromStr;

const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    /// UTF-8 with an optional leading byte order mark
    Utf8Sig,
    /// ISO-8859-1; every byte maps to the code point of the same value
    Latin1,
}

impl FromStr for TextEncoding {
    type Err = NormalizerError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "utf-8-sig" | "utf8-sig" => Ok(TextEncoding::Utf8Sig),
            "iso-8859-1" | "iso8859-1" | "latin-1" | "latin1" => Ok(TextEncoding::Latin1),
            _ => Err(NormalizerError::UnsupportedEncoding {
                encoding: name.to_string(),
            }),
        }
    }
}

impl TextEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Latin1 => "iso-8859-1",
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<String, NormalizerError> {
        match self {
            TextEncoding::Utf8 | TextEncoding::Utf8Sig => {
                let text = std::str::from_utf8(bytes).map_err(|e| NormalizerError::Decode {
                    encoding: self.name().to_string(),
                    message: e.to_string(),
                })?;
                Ok(text.strip_prefix(UTF8_BOM).unwrap_or(text).to_string())
            }
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("utf-8", TextEncoding::Utf8)]
    #[case("UTF8", TextEncoding::Utf8)]
    #[case("utf_8_sig", TextEncoding::Utf8Sig)]
    #[case("ISO-8859-1", TextEncoding::Latin1)]
    #[case("latin1", TextEncoding::Latin1)]
    fn test_from_str(#[case] name: &str, #[case] expected: TextEncoding) {
        assert_eq!(name.parse::<TextEncoding>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_encoding() {
        assert!(matches!(
            "shift-jis".parse::<TextEncoding>(),
            Err(NormalizerError::UnsupportedEncoding { .. })
        ));
    }

    #[test]
    fn test_latin1_decodes_accented_bytes() {
        let bytes = b"Num\xe9ro de carte;D\xe9bit";
        assert_eq!(TextEncoding::Latin1.decode(bytes).unwrap(), "Numéro de carte;Débit");
    }

    #[test]
    fn test_utf8_rejects_latin1_bytes() {
        let err = TextEncoding::Utf8.decode(b"D\xe9bit").unwrap_err();
        assert!(matches!(err, NormalizerError::Decode { .. }));
    }

    #[rstest]
    #[case(TextEncoding::Utf8)]
    #[case(TextEncoding::Utf8Sig)]
    fn test_utf8_strips_bom(#[case] encoding: TextEncoding) {
        assert_eq!(encoding.decode("\u{feff}sep=;".as_bytes()).unwrap(), "sep=;");
    }
}
