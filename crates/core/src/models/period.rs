use chrono::{DateTime, Datelike, Days, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Reporting granularity of the graph view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    /// One calendar day split into 24 hourly buckets
    Daily,
    /// Monday..Sunday split into 7 daily buckets
    Weekly,
    /// A calendar month split into one bucket per day
    Monthly,
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interval::Daily => write!(f, "daily"),
            Interval::Weekly => write!(f, "weekly"),
            Interval::Monthly => write!(f, "monthly"),
        }
    }
}

impl std::str::FromStr for Interval {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Interval::Daily),
            "weekly" => Ok(Interval::Weekly),
            "monthly" => Ok(Interval::Monthly),
            other => Err(CoreError::ValidationError(format!(
                "Unknown interval '{other}': expected daily, weekly or monthly"
            ))),
        }
    }
}

/// Calendar reference point that resolves an [`Interval`] to a concrete period.
///
/// Wraps a valid [`NaiveDate`], so an anchor can never name a day that does
/// not exist. Months are exposed 0-based (January = 0) to match the
/// dashboard's date pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Anchor(NaiveDate);

impl Anchor {
    /// Strict constructor: rejects dates that do not exist.
    pub fn from_ymd(year: i32, month0: u32, day: u32) -> Result<Self, CoreError> {
        month0
            .checked_add(1)
            .and_then(|m| NaiveDate::from_ymd_opt(year, m, day))
            .map(Anchor)
            .ok_or(CoreError::InvalidAnchor {
                year,
                month: month0,
                day,
            })
    }

    /// Calendar-rollover constructor.
    ///
    /// Out-of-range months and days carry into the neighbouring unit:
    /// `(2024, 3, 31)` is 1 May 2024, `(2024, 2, 0)` is 29 February 2024 and
    /// `(2023, 12, 1)` is 1 January 2024. Fails only when the result is
    /// outside the representable calendar.
    pub fn normalized(year: i32, month0: i32, day: i32) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidAnchor {
            year,
            month: month0.max(0) as u32,
            day: day.max(0) as u32,
        };

        let total_months = i64::from(year) * 12 + i64::from(month0);
        let y = i32::try_from(total_months.div_euclid(12)).map_err(|_| invalid())?;
        let m = total_months.rem_euclid(12) as u32 + 1;
        let first = NaiveDate::from_ymd_opt(y, m, 1).ok_or_else(invalid)?;

        let offset = i64::from(day) - 1;
        let date = if offset >= 0 {
            first.checked_add_days(Days::new(offset as u64))
        } else {
            first.checked_sub_days(Days::new(offset.unsigned_abs()))
        };
        date.map(Anchor).ok_or_else(invalid)
    }

    /// Today's date in the given time zone.
    pub fn today<Tz: TimeZone>(tz: &Tz) -> Self {
        Anchor(chrono::Utc::now().with_timezone(tz).date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// 0-based month (January = 0).
    pub fn month0(&self) -> u32 {
        self.0.month0()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Number of days in the anchor's month (28–31).
    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.0.year(), self.0.month())
    }

    /// Same day-of-month `months` later (or earlier when negative),
    /// clamped to the last day of the target month.
    pub fn add_months(&self, months: i32) -> Option<Self> {
        let shifted = if months >= 0 {
            self.0.checked_add_months(Months::new(months as u32))
        } else {
            self.0.checked_sub_months(Months::new(months.unsigned_abs()))
        };
        shifted.map(Anchor)
    }

    pub fn add_days(&self, days: i64) -> Option<Self> {
        let shifted = if days >= 0 {
            self.0.checked_add_days(Days::new(days as u64))
        } else {
            self.0.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        shifted.map(Anchor)
    }
}

impl From<NaiveDate> for Anchor {
    fn from(date: NaiveDate) -> Self {
        Anchor(date)
    }
}

impl std::fmt::Display for Anchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Days in a month (`month` is 1-based), leap years included.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(31)
}

/// A resolved reporting period.
///
/// `start` is the first instant (00:00:00.000 local), `end` the last
/// instant (23:59:59.999 local) of the period, both inclusive.
#[derive(Debug, Clone, PartialEq)]
pub struct Period<Tz: TimeZone> {
    pub interval: Interval,
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl<Tz: TimeZone> Period<Tz> {
    pub fn start_ms(&self) -> i64 {
        self.start.timestamp_millis()
    }

    /// Last millisecond of the period (inclusive).
    pub fn end_ms(&self) -> i64 {
        self.end.timestamp_millis()
    }

    pub fn contains(&self, timestamp_ms: i64) -> bool {
        self.start_ms() <= timestamp_ms && timestamp_ms <= self.end_ms()
    }

    /// The `startTime`/`endTime` pair sent to the backend.
    pub fn time_range(&self) -> TimeRange {
        TimeRange {
            start_time: self.start_ms(),
            end_time: self.end_ms(),
        }
    }
}

/// Inclusive epoch-millisecond range for backend queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start_time: i64,
    pub end_time: i64,
}

/// One slot of a reporting period: `[start, end)` in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub label: String,
    pub start: i64,
    pub end: i64,
}

impl Bucket {
    pub fn contains(&self, timestamp_ms: i64) -> bool {
        self.start <= timestamp_ms && timestamp_ms < self.end
    }
}
