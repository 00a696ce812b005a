//! Active-language negotiation.

use crate::domain::types::LanguageCode;

/// Languages the blog serves, in preference order, plus the fallback.
#[derive(Debug, Clone)]
pub struct LanguagePolicy {
    default: LanguageCode,
    supported: Vec<LanguageCode>,
}

impl LanguagePolicy {
    /// The default language is always supported, even when omitted from
    /// `supported`.
    pub fn new(default: LanguageCode, supported: Vec<LanguageCode>) -> Self {
        let mut languages = Vec::with_capacity(supported.len() + 1);
        for code in std::iter::once(default.clone()).chain(supported) {
            if !languages.contains(&code) {
                languages.push(code);
            }
        }
        Self {
            default,
            supported: languages,
        }
    }

    pub fn default_language(&self) -> &LanguageCode {
        &self.default
    }

    pub fn supported(&self) -> &[LanguageCode] {
        &self.supported
    }

    /// Pick the active language from an `Accept-Language` header value.
    ///
    /// Ranges are tried by descending quality; a range matches a supported
    /// language exactly or by primary subtag (`de-AT` selects `de`). Nothing
    /// usable falls back to the default.
    pub fn negotiate(&self, accept_language: Option<&str>) -> LanguageCode {
        let Some(header) = accept_language else {
            return self.default.clone();
        };

        for range in parse_accept_language(header) {
            if let Some(found) = self.supported.iter().find(|code| **code == range) {
                return found.clone();
            }
            if let Some(found) = self
                .supported
                .iter()
                .find(|code| code.primary() == range.primary())
            {
                return found.clone();
            }
        }

        self.default.clone()
    }
}

fn parse_accept_language(header: &str) -> Vec<LanguageCode> {
    let mut ranges: Vec<(u16, usize, LanguageCode)> = header
        .split(',')
        .enumerate()
        .filter_map(|(position, entry)| {
            let mut parts = entry.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let quality = parts
                .find_map(|param| param.trim().strip_prefix("q="))
                .map(parse_quality)
                .unwrap_or(1000);
            if quality == 0 {
                return None;
            }
            let code = LanguageCode::parse(tag).ok()?;
            Some((quality, position, code))
        })
        .collect();

    ranges.sort_by(|left, right| right.0.cmp(&left.0).then(left.1.cmp(&right.1)));
    ranges.into_iter().map(|(_, _, code)| code).collect()
}

/// Quality values scaled to thousandths; malformed values count as zero.
fn parse_quality(raw: &str) -> u16 {
    raw.trim()
        .parse::<f32>()
        .ok()
        .filter(|value| (0.0..=1.0).contains(value))
        .map(|value| (value * 1000.0).round() as u16)
        .unwrap_or(0)
}
