//! Time-window aggregation: resolve a reporting period, split it into
//! buckets, and sum time-stamped records into those buckets.
//!
//! Every function here is pure. Boundaries are wall-clock times in the
//! caller's time zone; a wall-clock time skipped by a DST transition
//! resolves to the first valid instant after the gap, and a repeated one
//! resolves to its earliest instant.

use chrono::{
    DateTime, Datelike, Days, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
};
use serde::{Deserialize, Serialize};

use crate::models::period::{days_in_month, Anchor, Bucket, Interval, Period};
use crate::models::query::CategoryFilter;
use crate::models::record::{AmountError, TimedAmount};

/// Per-bucket sums plus how many in-range records were dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Same length and order as the buckets
    pub values: Vec<f64>,

    /// In-range records whose value could not be parsed
    pub skipped: usize,
}

impl Aggregation {
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

/// Anchors this close to either end of the calendar are pulled inward so
/// every boundary of their period stays representable.
const CALENDAR_MARGIN_DAYS: u64 = 64;

/// Resolve `interval` around `anchor` to its first and last instant.
///
/// - Daily: the anchor day.
/// - Weekly: Monday..Sunday of the week containing the anchor.
/// - Monthly: the whole calendar month.
pub fn resolve_period<Tz: TimeZone>(interval: Interval, anchor: Anchor, tz: &Tz) -> Period<Tz> {
    let date = representable(anchor.date());
    let (first_day, day_count) = match interval {
        Interval::Daily => (date, 1),
        Interval::Weekly => {
            let offset = date.weekday().num_days_from_monday();
            (date.checked_sub_days(Days::new(u64::from(offset))).unwrap_or(date), 7)
        }
        Interval::Monthly => {
            let first = date.with_day(1).unwrap_or(date);
            (first, days_in_month(first.year(), first.month()))
        }
    };

    let start_wall = first_day.and_time(NaiveTime::MIN);
    let after_wall = start_wall
        .checked_add_days(Days::new(u64::from(day_count)))
        .unwrap_or(start_wall);

    let start = to_instant(tz, start_wall);
    let after = to_instant(tz, after_wall);
    let end = after.clone().checked_sub_signed(Duration::milliseconds(1)).unwrap_or(after);

    Period { interval, start, end }
}

/// Split the period starting at `period_start` into ordered buckets.
///
/// - Daily: 24 hourly buckets labelled `HH:MM`.
/// - Weekly: 7 daily buckets labelled `M/D`.
/// - Monthly: one bucket per remaining day of the month, labelled with
///   the day-of-month (`1`, `2`, ...).
///
/// The wall-clock grid starts at local midnight of `period_start`'s date,
/// even when midnight itself was skipped by DST and the period starts
/// later; the first bucket is then empty. Buckets are contiguous: each
/// bucket's `end` is the next one's `start`.
pub fn build_buckets<Tz: TimeZone>(interval: Interval, period_start: &DateTime<Tz>) -> Vec<Bucket> {
    let tz = period_start.timezone();
    let date = period_start.date_naive();
    let start_wall = date.and_time(NaiveTime::MIN);

    let (count, step, label_format) = match interval {
        Interval::Daily => (24, Duration::hours(1), "%H:%M"),
        Interval::Weekly => (7, Duration::days(1), "%-m/%-d"),
        Interval::Monthly => {
            let remaining = days_in_month(date.year(), date.month()) - date.day() + 1;
            (remaining as i32, Duration::days(1), "%-d")
        }
    };

    let walls: Vec<NaiveDateTime> = (0..=count)
        .map_while(|i| start_wall.checked_add_signed(step * i))
        .collect();

    let start_ms = period_start.timestamp_millis();
    let mut boundaries = Vec::with_capacity(walls.len());
    boundaries.push(start_ms);
    boundaries.extend(
        walls
            .iter()
            .skip(1)
            .map(|w| to_instant(&tz, *w).timestamp_millis().max(start_ms)),
    );

    walls
        .iter()
        .zip(boundaries.windows(2))
        .map(|(wall, bounds)| Bucket {
            label: wall.format(label_format).to_string(),
            start: bounds[0],
            end: bounds[1],
        })
        .collect()
}

/// Sum `value_selector(record)` into the bucket whose `[start, end)`
/// range contains the record's timestamp.
///
/// Records outside every bucket are ignored. Records inside a bucket whose
/// value fails to parse are skipped and counted in
/// [`Aggregation::skipped`]; they never poison a sum. `buckets` must be
/// sorted and non-overlapping, which [`build_buckets`] guarantees.
pub fn aggregate<I, F>(records: I, buckets: &[Bucket], value_selector: F) -> Aggregation
where
    I: IntoIterator,
    I::Item: TimedAmount,
    F: Fn(&I::Item) -> Result<f64, AmountError>,
{
    let mut values = vec![0.0; buckets.len()];
    let mut skipped = 0;

    for record in records {
        let ts = record.timestamp_ms();
        let Some(idx) = bucket_index(buckets, ts) else {
            continue;
        };
        match value_selector(&record) {
            Ok(value) => values[idx] += value,
            Err(e) => {
                tracing::debug!(timestamp = ts, error = %e, "skipping record with malformed amount");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, "records with malformed amounts were left out of the aggregation");
    }

    Aggregation { values, skipped }
}

/// [`aggregate`] using each record's own amount.
pub fn aggregate_amounts<I>(records: I, buckets: &[Bucket]) -> Aggregation
where
    I: IntoIterator,
    I::Item: TimedAmount,
{
    aggregate(records, buckets, |r| r.amount().parse())
}

/// Running prefix sum: `out[i] = series[0] + ... + series[i]`.
pub fn accumulate(series: &[f64]) -> Vec<f64> {
    series
        .iter()
        .scan(0.0, |running, value| {
            *running += value;
            Some(*running)
        })
        .collect()
}

/// Keep the records the filter admits, in their original order.
pub fn filter_by_category<'a, R: TimedAmount>(records: &'a [R], filter: &CategoryFilter) -> Vec<&'a R> {
    records.iter().filter(|r| filter.matches(r.category())).collect()
}

fn bucket_index(buckets: &[Bucket], ts: i64) -> Option<usize> {
    let idx = buckets.partition_point(|b| b.end <= ts);
    buckets.get(idx).filter(|b| b.contains(ts)).map(|_| idx)
}

fn representable(date: NaiveDate) -> NaiveDate {
    let margin = Days::new(CALENDAR_MARGIN_DAYS);
    let earliest = NaiveDate::MIN.checked_add_days(margin).unwrap_or(NaiveDate::MIN);
    let latest = NaiveDate::MAX.checked_sub_days(margin).unwrap_or(NaiveDate::MAX);
    date.clamp(earliest, latest)
}

/// Map a wall-clock time to an instant in `tz`.
fn to_instant<Tz: TimeZone>(tz: &Tz, wall: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&wall) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // DST gaps are at most a few hours and minute-aligned.
            for minutes in 1..=(4 * 60) {
                let Some(later) = wall.checked_add_signed(Duration::minutes(minutes)) else {
                    break;
                };
                if let Some(dt) = tz.from_local_datetime(&later).earliest() {
                    return dt;
                }
            }
            tz.from_utc_datetime(&wall)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn bucket(start: i64, end: i64) -> Bucket {
        Bucket {
            label: String::new(),
            start,
            end,
        }
    }

    #[test]
    fn bucket_index_respects_half_open_ranges() {
        let buckets = vec![bucket(0, 10), bucket(10, 20), bucket(20, 30)];
        assert_eq!(bucket_index(&buckets, 0), Some(0));
        assert_eq!(bucket_index(&buckets, 9), Some(0));
        assert_eq!(bucket_index(&buckets, 10), Some(1));
        assert_eq!(bucket_index(&buckets, 29), Some(2));
        assert_eq!(bucket_index(&buckets, 30), None);
        assert_eq!(bucket_index(&buckets, -1), None);
    }

    #[test]
    fn bucket_index_with_gap_between_buckets() {
        let buckets = vec![bucket(0, 10), bucket(20, 30)];
        assert_eq!(bucket_index(&buckets, 15), None);
        assert_eq!(bucket_index(&buckets, 25), Some(1));
    }

    #[test]
    fn representable_pulls_in_calendar_extremes() {
        assert!(representable(NaiveDate::MAX) < NaiveDate::MAX);
        assert!(representable(NaiveDate::MIN) > NaiveDate::MIN);
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(representable(today), today);
    }

    #[test]
    fn to_instant_is_identity_in_utc() {
        let wall = chrono::NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(to_instant(&Utc, wall).naive_utc(), wall);
    }
}
