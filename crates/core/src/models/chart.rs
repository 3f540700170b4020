use serde::{Deserialize, Serialize};

use super::income::IncomeRecord;
use super::period::Bucket;
use super::query::PeriodQuery;

/// A bucket paired with its aggregated value, ready to plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub label: String,
    pub start: i64,
    pub end: i64,
    pub value: f64,
}

/// Everything the graph view renders for one [`PeriodQuery`].
///
/// The core computes all the numbers; the frontend only draws them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
    /// Descriptor this view was computed for
    pub query: PeriodQuery,

    /// First millisecond of the period
    pub period_start: i64,

    /// Last millisecond of the period (inclusive)
    pub period_end: i64,

    pub buckets: Vec<Bucket>,

    /// Income summed per bucket
    pub income: Vec<f64>,

    /// Running total of `income`
    pub accumulated: Vec<f64>,

    /// `current_balance + income[i]` per bucket
    pub balance: Vec<f64>,

    /// Current wallet balance of the quote asset (USDT)
    pub current_balance: f64,

    /// Records dropped because their amount did not parse
    pub skipped: usize,
}

impl GraphView {
    pub fn labels(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.label.as_str()).collect()
    }

    /// Pair each bucket with one of the computed series.
    pub fn points(&self, series: &[f64]) -> Vec<SeriesPoint> {
        self.buckets
            .iter()
            .zip(series)
            .map(|(bucket, value)| SeriesPoint {
                label: bucket.label.clone(),
                start: bucket.start,
                end: bucket.end,
                value: *value,
            })
            .collect()
    }

    /// Total income over the whole period.
    pub fn total_income(&self) -> f64 {
        self.accumulated.last().copied().unwrap_or(0.0)
    }
}

/// One point of the income history chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomePoint {
    /// Event time in epoch milliseconds
    pub time: i64,
    pub income: f64,
    pub accumulated: f64,
}

/// Income history: a time-ordered chart plus a newest-first table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeView {
    /// Oldest first
    pub chart: Vec<IncomePoint>,

    /// Newest first
    pub rows: Vec<IncomeRecord>,

    pub skipped: usize,
}
