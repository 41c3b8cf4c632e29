//! Calendar month selectors and their local-time windows.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// Years outside this range are rejected so month arithmetic never leaves
/// chrono's supported calendar.
const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// A calendar month (year + month 1-12), written `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    first: NaiveDate,
    next: NaiveDate,
}

impl YearMonth {
    /// Creates a month selector, validating the range.
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidMonth {
            value: format!("{year:04}-{month:02}"),
        };
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(invalid());
        }
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(invalid)?;
        Ok(Self { first, next })
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Result<Self, ValidationError> {
        Self::new(date.year(), date.month())
    }

    /// The current month in local time.
    pub fn current() -> Result<Self, ValidationError> {
        Self::containing(Local::now().date_naive())
    }

    pub fn year(self) -> i32 {
        self.first.year()
    }

    pub fn month(self) -> u32 {
        self.first.month()
    }

    /// First calendar day of the month.
    pub const fn first_day(self) -> NaiveDate {
        self.first
    }

    /// Last calendar day of the month.
    pub fn last_day(self) -> NaiveDate {
        self.next - Duration::days(1)
    }

    /// Number of days in the month.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn day_count(self) -> u32 {
        (self.next - self.first).num_days() as u32
    }

    /// Every date of the month, in order.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        let next = self.next;
        self.first.iter_days().take_while(move |day| *day < next)
    }

    /// Moves `months` forward (or backward when negative).
    pub fn offset(self, months: i32) -> Result<Self, ValidationError> {
        let index = i64::from(self.year()) * 12 + i64::from(self.month()) - 1 + i64::from(months);
        let year = i32::try_from(index.div_euclid(12)).map_err(|_| ValidationError::InvalidMonth {
            value: format!("{self}{months:+}"),
        })?;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let month = index.rem_euclid(12) as u32 + 1;
        Self::new(year, month)
    }

    /// Inclusive window `[first instant, last instant]` of the month in `tz`.
    ///
    /// The end is one millisecond before the next month starts, i.e.
    /// 23:59:59.999 on the last day.
    pub fn window_in<Tz: TimeZone>(self, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = local_midnight_to_utc(tz, self.first);
        let end = local_midnight_to_utc(tz, self.next) - Duration::milliseconds(1);
        (start, end)
    }
}

/// Converts a local date at midnight to UTC.
///
/// Ambiguous midnights resolve to the earlier instant. A midnight that falls
/// in a gap moves forward to the first local time that exists, tried in
/// half-hour steps for up to a day.
fn local_midnight_to_utc<Tz: TimeZone>(tz: &Tz, local_date: NaiveDate) -> DateTime<Utc> {
    let midnight = local_date.and_time(NaiveTime::MIN);
    if let Some(dt) = tz.from_local_datetime(&midnight).earliest() {
        return dt.with_timezone(&Utc);
    }

    let first_valid = (1..=48)
        .map(|step| midnight + Duration::minutes(30 * step))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest());
    if let Some(dt) = first_valid {
        return dt.with_timezone(&Utc);
    }

    tracing::warn!(%local_date, "no valid local time within a day of midnight; reading midnight as UTC");
    midnight.and_utc()
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for YearMonth {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidMonth {
            value: s.to_string(),
        };
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for YearMonth {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(month: YearMonth) -> Self {
        month.to_string()
    }
}
