use std::fmt;

use crate::error::{Error, Result};

/// Byte signature where `None` matches any byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern(Vec<Option<u8>>);

impl Pattern {
    pub fn new(bytes: Vec<Option<u8>>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::InvalidPattern("Signature pattern is empty".to_string()));
        }
        Ok(Self(bytes))
    }

    /// Parse the hex text form, e.g. `"48 8B ?? 05"`.
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut bytes = Vec::new();
        for token in pattern.split_whitespace() {
            if token == "??" || token == "?" {
                bytes.push(None);
                continue;
            }

            let value = u8::from_str_radix(token, 16).map_err(|e| {
                Error::InvalidPattern(format!("Invalid signature token '{}': {}", token, e))
            })?;
            bytes.push(Some(value));
        }

        Self::new(bytes)
    }

    /// Build from the decimal form stored in version files, where `-1` is a wildcard.
    ///
    /// Any value outside `-1..=255` rejects the whole pattern.
    pub fn from_decimal(values: &[i64]) -> Result<Self> {
        let bytes = values
            .iter()
            .map(|&value| match value {
                -1 => Ok(None),
                0..=255 => Ok(Some(value as u8)),
                _ => Err(Error::InvalidPattern(format!(
                    "Invalid pattern byte value: {}",
                    value
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(bytes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bytes(&self) -> &[Option<u8>] {
        &self.0
    }

    pub fn has_wildcards(&self) -> bool {
        self.0.iter().any(Option::is_none)
    }

    /// Check the pattern against a window of exactly `len()` bytes.
    pub fn matches(&self, window: &[u8]) -> bool {
        window.len() == self.0.len()
            && self
                .0
                .iter()
                .zip(window)
                .all(|(expected, actual)| expected.is_none_or(|b| b == *actual))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .0
            .iter()
            .map(|b| match b {
                Some(value) => format!("{:02X}", value),
                None => "??".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pattern_with_wildcards() {
        let pattern = Pattern::parse("48 8D 0D ?? ?? ?? ??").unwrap();
        assert_eq!(pattern.len(), 7);
        assert_eq!(pattern.bytes()[0], Some(0x48));
        assert_eq!(pattern.bytes()[1], Some(0x8D));
        assert_eq!(pattern.bytes()[2], Some(0x0D));
        assert_eq!(pattern.bytes()[3], None);
        assert!(pattern.has_wildcards());
    }

    #[test]
    fn test_format_pattern_roundtrip() {
        let pattern = Pattern::new(vec![Some(0x48), Some(0x8D), Some(0x0D), None, Some(0xFF)])
            .unwrap();
        let formatted = pattern.to_string();
        assert_eq!(formatted, "48 8D 0D ?? FF");
        assert_eq!(Pattern::parse(&formatted).unwrap(), pattern);
    }

    #[test]
    fn test_parse_rejects_bad_token() {
        let err = Pattern::parse("48 ZZ").unwrap_err();
        assert!(err.to_string().contains("ZZ"));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(Pattern::parse("   ").is_err());
        assert!(Pattern::from_decimal(&[]).is_err());
    }

    #[test]
    fn test_from_decimal_wildcards() {
        let pattern = Pattern::from_decimal(&[17, -1, 34]).unwrap();
        assert_eq!(pattern.bytes(), &[Some(0x11), None, Some(0x22)]);
    }

    #[test]
    fn test_from_decimal_rejects_out_of_range() {
        assert!(Pattern::from_decimal(&[1, 256]).is_err());
        assert!(Pattern::from_decimal(&[-2, 4]).is_err());
    }

    #[test]
    fn test_matches_window() {
        let pattern = Pattern::from_decimal(&[0x11, -1, 0x22]).unwrap();
        assert!(pattern.matches(&[0x11, 0x99, 0x22]));
        assert!(!pattern.matches(&[0x11, 0x99, 0x23]));
        assert!(!pattern.matches(&[0x11, 0x99]));
    }
}
