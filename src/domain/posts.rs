use time::{Date, Month, format_description::FormatItem, macros::format_description};

use crate::domain::error::DomainError;

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");
pub const MONTH_LABEL_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [year]");
pub const ISO_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month padding:zero]-[day padding:zero]");

const TRUNCATION_MARKER: &str = "…";

/// Year and optional month taken from an archive URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArchivePeriod {
    year: Option<i32>,
    month: Option<Month>,
}

impl ArchivePeriod {
    /// Parse raw path segments. Either segment may be absent; a present
    /// segment must be numeric and, together with the other, form a real
    /// calendar date.
    pub fn parse(year: Option<&str>, month: Option<&str>) -> Result<Self, DomainError> {
        let year = year
            .map(|raw| {
                raw.trim().parse::<i32>().map_err(|err| {
                    DomainError::validation(format!("year `{raw}` is not a number: {err}"))
                })
            })
            .transpose()?;

        let month = month
            .map(|raw| {
                let number = raw.trim().parse::<u8>().map_err(|err| {
                    DomainError::validation(format!("month `{raw}` is not a number: {err}"))
                })?;
                Month::try_from(number).map_err(|_| {
                    DomainError::validation(format!("month `{raw}` is outside 1..=12"))
                })
            })
            .transpose()?;

        let period = Self { year, month };
        if year.is_some() && period.archive_date().is_none() {
            return Err(DomainError::validation(format!(
                "year `{}` is outside the supported calendar range",
                year.unwrap_or_default()
            )));
        }

        Ok(period)
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn month(&self) -> Option<u8> {
        self.month.map(u8::from)
    }

    /// First day of the archived month, or of the year when no month is set.
    pub fn archive_date(&self) -> Option<Date> {
        let year = self.year?;
        Date::from_calendar_date(year, self.month.unwrap_or(Month::January), 1).ok()
    }

    pub fn contains(&self, date: Date) -> bool {
        self.year.is_none_or(|year| date.year() == year)
            && self.month.is_none_or(|month| date.month() == month)
    }

    /// Human label such as `May 2024` or `2024`.
    pub fn label(&self) -> Option<String> {
        let date = self.archive_date()?;
        if self.month.is_some() {
            date.format(MONTH_LABEL_FORMAT).ok()
        } else {
            Some(date.year().to_string())
        }
    }
}

pub fn format_human_date(date: Date) -> String {
    date.format(HUMAN_DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

pub fn format_iso_date(date: Date) -> String {
    date.format(ISO_DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

/// Keep the first `count` whitespace-separated words of `text`, appending an
/// ellipsis when anything was cut.
pub fn truncate_words(text: &str, count: usize) -> String {
    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(count).collect();

    if words.next().is_none() {
        return kept.join(" ");
    }

    if kept.is_empty() {
        TRUNCATION_MARKER.to_string()
    } else {
        format!("{} {TRUNCATION_MARKER}", kept.join(" "))
    }
}
