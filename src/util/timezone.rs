use chrono::{DateTime, Datelike, TimeZone, Utc};
use chrono_tz::Tz;
use time::{Date, Month, OffsetDateTime};

/// Calendar date of `instant` as observed on a wall clock in `tz`.
///
/// Archive filters and permalinks must agree on this date.
pub fn local_date(instant: OffsetDateTime, tz: Tz) -> Date {
    let seconds = instant.unix_timestamp();
    let nanos = instant.nanosecond();
    let Some(utc) = DateTime::<Utc>::from_timestamp(seconds, nanos) else {
        return instant.date();
    };
    let localized = tz.from_utc_datetime(&utc.naive_utc());

    Month::try_from(localized.month() as u8)
        .ok()
        .and_then(|month| {
            Date::from_calendar_date(localized.year(), month, localized.day() as u8).ok()
        })
        .unwrap_or_else(|| instant.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn utc_date_is_unchanged() {
        let instant = datetime!(2024-05-31 23:30 UTC);
        assert_eq!(local_date(instant, Tz::UTC), date!(2024 - 05 - 31));
    }

    #[test]
    fn eastern_offset_rolls_into_next_month() {
        let instant = datetime!(2024-05-31 23:30 UTC);
        assert_eq!(local_date(instant, Tz::Europe__Berlin), date!(2024 - 06 - 01));
    }

    #[test]
    fn western_offset_stays_on_previous_day() {
        let instant = datetime!(2024-06-01 02:00 UTC);
        assert_eq!(
            local_date(instant, Tz::America__New_York),
            date!(2024 - 05 - 31)
        );
    }
}
