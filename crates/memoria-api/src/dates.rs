use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use tracing::warn;

/// SQLite stores timestamps as `YYYY-MM-DD HH:MM:SS` without a timezone.
/// Parse as naive UTC and convert; RFC 3339 inputs are also accepted.
pub fn parse_db_datetime(s: &str) -> DateTime<Utc> {
    s.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", s, e);
            DateTime::default()
        })
}

/// Completed years between two `YYYY-MM-DD` dates: the year difference,
/// minus one when the death month/day falls before the birth month/day.
/// Not leap-second-exact, but stable and consistent.
pub fn age_in_years(birth_date: &str, death_date: &str) -> Option<i64> {
    let birth = NaiveDate::parse_from_str(birth_date, "%Y-%m-%d").ok()?;
    let death = NaiveDate::parse_from_str(death_date, "%Y-%m-%d").ok()?;

    let mut age = i64::from(death.year()) - i64::from(birth.year());
    if (death.month(), death.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    Some(age)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_sqlite_and_rfc3339_timestamps() {
        let dt = parse_db_datetime("2024-01-20 15:30:00");
        assert_eq!(dt.hour(), 15);

        let dt = parse_db_datetime("2024-01-20T15:30:00Z");
        assert_eq!(dt.hour(), 15);

        // Corrupt input falls back to the epoch default instead of panicking.
        assert_eq!(parse_db_datetime("garbage"), DateTime::<Utc>::default());
    }

    #[test]
    fn completed_years_subtracts_before_birthday() {
        // Death month/day (01-20) precedes birth month/day (03-15).
        assert_eq!(age_in_years("1950-03-15", "2024-01-20"), Some(73));
    }

    #[test]
    fn completed_years_on_and_after_birthday() {
        assert_eq!(age_in_years("1950-03-15", "2024-03-15"), Some(74));
        assert_eq!(age_in_years("1950-03-15", "2024-11-02"), Some(74));
    }

    #[test]
    fn unparseable_dates_yield_none() {
        assert_eq!(age_in_years("1950", "2024-01-20"), None);
        assert_eq!(age_in_years("1950-03-15", ""), None);
    }
}
