use chrono::{Datelike, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use super::period::{Anchor, Interval, Period};
use crate::services::aggregation_service;

/// Sentinel category that disables filtering.
pub const ALL_CATEGORIES: &str = "ALL";

/// Which records a view should include.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryFilter {
    /// No filtering (`"ALL"`)
    #[default]
    All,
    /// Only records whose category equals this value exactly
    Only(String),
}

impl CategoryFilter {
    pub fn matches(&self, category: Option<&str>) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => category == Some(wanted.as_str()),
        }
    }
}

impl From<&str> for CategoryFilter {
    fn from(value: &str) -> Self {
        if value == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(value.to_string())
        }
    }
}

impl From<String> for CategoryFilter {
    fn from(value: String) -> Self {
        if value == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(value)
        }
    }
}

impl From<CategoryFilter> for String {
    fn from(value: CategoryFilter) -> Self {
        match value {
            CategoryFilter::All => ALL_CATEGORIES.to_string(),
            CategoryFilter::Only(category) => category,
        }
    }
}

impl std::fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "{ALL_CATEGORIES}"),
            CategoryFilter::Only(category) => write!(f, "{category}"),
        }
    }
}

/// Immutable description of what the graph view shows.
///
/// Navigation returns a new descriptor; whoever owns the current one
/// swaps it and re-runs the fetch/aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeriodQuery {
    pub interval: Interval,
    pub anchor: Anchor,
    #[serde(default)]
    pub category: CategoryFilter,
}

impl PeriodQuery {
    pub fn new(interval: Interval, anchor: Anchor) -> Self {
        Self {
            interval,
            anchor,
            category: CategoryFilter::All,
        }
    }

    #[must_use]
    pub fn with_interval(&self, interval: Interval) -> Self {
        Self {
            interval,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_anchor(&self, anchor: Anchor) -> Self {
        Self {
            anchor,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_category(&self, category: impl Into<CategoryFilter>) -> Self {
        Self {
            category: category.into(),
            ..self.clone()
        }
    }

    /// Resolve the descriptor to concrete boundaries in `tz`.
    pub fn period<Tz: TimeZone>(&self, tz: &Tz) -> Period<Tz> {
        aggregation_service::resolve_period(self.interval, self.anchor, tz)
    }

    /// The period immediately before this one.
    ///
    /// Weekly steps land on the previous Monday; monthly steps keep the
    /// day-of-month, clamped to the target month's length.
    #[must_use]
    pub fn previous(&self) -> Option<Self> {
        let anchor = match self.interval {
            Interval::Daily => self.anchor.add_days(-1)?,
            Interval::Weekly => week_start(self.anchor).add_days(-7)?,
            Interval::Monthly => self.anchor.add_months(-1)?,
        };
        Some(self.with_anchor(anchor))
    }

    /// The period immediately after this one, or `None` if it would
    /// start after `today`.
    #[must_use]
    pub fn next(&self, today: NaiveDate) -> Option<Self> {
        let anchor = match self.interval {
            Interval::Daily => self.anchor.add_days(1)?,
            Interval::Weekly => week_start(self.anchor).add_days(7)?,
            Interval::Monthly => {
                let current = (self.anchor.year(), self.anchor.month0());
                if current >= (today.year(), today.month0()) {
                    return None;
                }
                self.anchor.add_months(1)?
            }
        };
        if anchor.date() > today && self.interval != Interval::Monthly {
            return None;
        }
        Some(self.with_anchor(anchor))
    }

    /// Short display title, e.g. `2024-03-15`, `2024-03 week 3`, `2024-03`.
    ///
    /// Weekly titles name the week's Monday, so every anchor inside one
    /// Monday..Sunday period gets the same title.
    pub fn title(&self) -> String {
        let date = self.anchor.date();
        match self.interval {
            Interval::Daily => date.format("%Y-%m-%d").to_string(),
            Interval::Weekly => {
                let monday = week_start(self.anchor).date();
                format!("{} week {}", monday.format("%Y-%m"), week_of_month(monday))
            }
            Interval::Monthly => date.format("%Y-%m").to_string(),
        }
    }
}

fn week_start(anchor: Anchor) -> Anchor {
    let offset = anchor.date().weekday().num_days_from_monday();
    anchor.add_days(-i64::from(offset)).unwrap_or(anchor)
}

/// Week-of-month number with Sunday-start weeks: week 1 runs from the
/// 1st through the first Saturday.
pub fn week_of_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    let first_week_days = 7 - first.weekday().num_days_from_sunday();
    let day = date.day();
    if day <= first_week_days {
        1
    } else {
        (day - first_week_days).div_ceil(7) + 1
    }
}

/// Number of Sunday-start weeks touched by a month.
pub fn weeks_in_month(year: i32, month: u32) -> u32 {
    let last_day = super::period::days_in_month(year, month);
    NaiveDate::from_ymd_opt(year, month, last_day)
        .map(week_of_month)
        .unwrap_or(5)
}
