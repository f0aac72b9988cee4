//! Fetch window and calendar day boundaries.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::ValidationError;

/// Inclusive range of calendar dates to fetch mail for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    /// First day.
    pub after: NaiveDate,
    /// Last day.
    pub before: NaiveDate,
}

impl FetchWindow {
    /// Creates a window.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidWindow`] if `after` is later than `before`.
    pub fn new(after: NaiveDate, before: NaiveDate) -> Result<Self, ValidationError> {
        let window = Self { after, before };
        window.validate()?;
        Ok(window)
    }

    /// Yesterday through tomorrow relative to `today`.
    ///
    /// Mail that arrived late yesterday or carries a skewed date is still
    /// picked up.
    #[must_use]
    pub fn around(today: NaiveDate) -> Self {
        Self {
            after: today.pred_opt().unwrap_or(today),
            before: today.succ_opt().unwrap_or(today),
        }
    }

    /// [`FetchWindow::around`] the server's local date.
    #[must_use]
    pub fn around_now() -> Self {
        Self::around(Local::now().date_naive())
    }

    /// Checks the window is not inverted.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidWindow`] if `after` is later than `before`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.after > self.before {
            return Err(ValidationError::InvalidWindow);
        }
        Ok(())
    }
}

/// Parses an IANA zone name, falling back to UTC.
#[must_use]
pub fn resolve_timezone(name: &str) -> Tz {
    name.trim().parse::<Tz>().unwrap_or_else(|_| {
        tracing::warn!(timezone = name, "Unknown timezone, using UTC");
        Tz::UTC
    })
}

/// `[start of day, start of day + 24h)` for `day` in `tz`.
///
/// The start is local midnight. When midnight does not exist (a DST gap at
/// 00:00) it is the first whole local hour that does. `None` at the edges of
/// the representable range.
#[must_use]
pub fn day_bounds(day: NaiveDate, tz: Tz) -> Option<(DateTime<Tz>, DateTime<Tz>)> {
    let start = (0..24)
        .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
        .find_map(|time| tz.from_local_datetime(&day.and_time(time)).earliest())?;
    let end = start.checked_add_signed(Duration::hours(24))?;
    Some((start, end))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_is_yesterday_to_tomorrow() {
        let window = FetchWindow::around(date(2025, 7, 29));
        assert_eq!(window.after, date(2025, 7, 28));
        assert_eq!(window.before, date(2025, 7, 30));
    }

    #[test]
    fn test_window_crosses_year() {
        let window = FetchWindow::around(date(2025, 1, 1));
        assert_eq!(window.after, date(2024, 12, 31));
        assert_eq!(window.before, date(2025, 1, 2));
    }

    #[test]
    fn test_inverted_window_rejected() {
        assert_eq!(
            FetchWindow::new(date(2025, 7, 30), date(2025, 7, 28)).unwrap_err(),
            ValidationError::InvalidWindow
        );
        assert!(FetchWindow::new(date(2025, 7, 29), date(2025, 7, 29)).is_ok());
    }

    #[test]
    fn test_resolve_timezone() {
        assert_eq!(resolve_timezone("Australia/Sydney"), Tz::Australia__Sydney);
        assert_eq!(resolve_timezone("Mars/Olympus"), Tz::UTC);
        assert_eq!(resolve_timezone(""), Tz::UTC);
    }

    #[test]
    fn test_day_bounds_local_midnight() {
        let (start, end) = day_bounds(date(2025, 8, 28), Tz::Australia__Sydney).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-08-28T00:00:00+10:00");
        assert_eq!(end.to_rfc3339(), "2025-08-29T00:00:00+10:00");
    }

    #[test]
    fn test_day_bounds_when_midnight_is_skipped() {
        // Santiago springs forward at 00:00, so 00:00-00:59 does not exist.
        let (start, end) = day_bounds(date(2024, 9, 8), Tz::America__Santiago).unwrap();
        assert_eq!(start.to_rfc3339(), "2024-09-08T01:00:00-03:00");
        assert_eq!(end - start, Duration::hours(24));
    }

    #[test]
    fn test_day_bounds_at_range_edges() {
        assert!(day_bounds(NaiveDate::MAX, Tz::UTC).is_none());
    }
}
