//! Shared domain value types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Normalised BCP 47 language tag (`en`, `pt-br`, `zh-hans`).
///
/// Tags are stored lowercase so that lookups against translation rows are
/// exact string comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = raw.trim().replace('_', "-").to_ascii_lowercase();
        let mut parts = normalized.split('-');

        let primary = parts.next().unwrap_or_default();
        if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(DomainError::validation(format!(
                "`{raw}` is not a valid language code"
            )));
        }

        for subtag in parts {
            if subtag.is_empty()
                || subtag.len() > 8
                || !subtag.chars().all(|c| c.is_ascii_alphanumeric())
            {
                return Err(DomainError::validation(format!(
                    "`{raw}` is not a valid language code"
                )));
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary language subtag, e.g. `pt` for `pt-br`.
    pub fn primary(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for LanguageCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LanguageCode> for String {
    fn from(value: LanguageCode) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_separator() {
        let code = LanguageCode::parse("pt_BR").expect("valid code");
        assert_eq!(code.as_str(), "pt-br");
        assert_eq!(code.primary(), "pt");
    }

    #[test]
    fn rejects_malformed_tags() {
        assert!(LanguageCode::parse("").is_err());
        assert!(LanguageCode::parse("english").is_err());
        assert!(LanguageCode::parse("en-").is_err());
        assert!(LanguageCode::parse("e1").is_err());
    }
}
