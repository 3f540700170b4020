use chrono::TimeZone;

use crate::models::balance::BalanceRecord;
use crate::models::chart::{GraphView, IncomePoint, IncomeView};
use crate::models::contract::ContractRecord;
use crate::models::income::IncomeRecord;
use crate::models::query::PeriodQuery;
use crate::models::record::TimedAmount;
use crate::services::aggregation_service::{
    accumulate, aggregate_amounts, build_buckets, filter_by_category,
};

/// Asset the graph view reports balances in.
pub const QUOTE_ASSET: &str = "USDT";

/// Builds view models from backend records.
///
/// The core computes all the numbers; the frontend only renders.
/// - Graph: per-bucket income, its running total, and balance per bucket
/// - Income: time-ordered chart with accumulation plus a newest-first table
/// - Balance / contracts: newest-first rows
pub struct ChartService;

impl ChartService {
    pub fn new() -> Self {
        Self
    }

    /// Aggregate `income` into the buckets of `query`'s period.
    ///
    /// Income is filtered by the query's category first. The balance
    /// series adds each bucket's income to the current quote-asset balance,
    /// which is what the dashboard plots as "Total Balance".
    pub fn graph_view<Tz: TimeZone>(
        &self,
        query: &PeriodQuery,
        income: &[IncomeRecord],
        balances: &[BalanceRecord],
        tz: &Tz,
    ) -> GraphView {
        let period = query.period(tz);
        let buckets = build_buckets(query.interval, &period.start);

        let filtered = filter_by_category(income, &query.category);
        let aggregation = aggregate_amounts(filtered, &buckets);
        let accumulated = accumulate(&aggregation.values);

        let (current_balance, balance_skipped) = self.current_balance(balances, QUOTE_ASSET);
        let balance = aggregation
            .values
            .iter()
            .map(|income| current_balance + income)
            .collect();

        tracing::debug!(
            interval = %query.interval,
            anchor = %query.anchor,
            buckets = buckets.len(),
            total_income = aggregation.total(),
            "graph view computed"
        );

        GraphView {
            query: query.clone(),
            period_start: period.start_ms(),
            period_end: period.end_ms(),
            buckets,
            income: aggregation.values,
            accumulated,
            balance,
            current_balance,
            skipped: aggregation.skipped + balance_skipped,
        }
    }

    /// Sum of `balance` over the rows for `asset`, plus how many rows had
    /// an unparseable balance.
    pub fn current_balance(&self, balances: &[BalanceRecord], asset: &str) -> (f64, usize) {
        let mut total = 0.0;
        let mut skipped = 0;
        for row in balances.iter().filter(|b| b.asset == asset) {
            match row.balance.parse() {
                Ok(value) => total += value,
                Err(e) => {
                    tracing::warn!(asset, error = %e, "ignoring malformed balance");
                    skipped += 1;
                }
            }
        }
        (total, skipped)
    }

    /// Income history: chart points oldest-first with a running total,
    /// table rows newest-first. Malformed amounts are left out of the
    /// chart but still listed in the table.
    pub fn income_view(&self, income: &[IncomeRecord]) -> IncomeView {
        let mut ascending: Vec<&IncomeRecord> = income.iter().collect();
        ascending.sort_by_key(|r| r.time);

        let mut chart = Vec::with_capacity(ascending.len());
        let mut accumulated = 0.0;
        let mut skipped = 0;
        for record in ascending {
            match record.income.parse() {
                Ok(value) => {
                    accumulated += value;
                    chart.push(IncomePoint {
                        time: record.time,
                        income: value,
                        accumulated,
                    });
                }
                Err(_) => skipped += 1,
            }
        }

        IncomeView {
            chart,
            rows: newest_first(income),
            skipped,
        }
    }

    /// Balance rows, most recently updated first.
    pub fn balance_rows(&self, balances: &[BalanceRecord]) -> Vec<BalanceRecord> {
        newest_first(balances)
    }

    /// Trades, most recent first.
    pub fn contract_rows(&self, contracts: &[ContractRecord]) -> Vec<ContractRecord> {
        newest_first(contracts)
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first<R: TimedAmount + Clone>(records: &[R]) -> Vec<R> {
    let mut rows = records.to_vec();
    // Stable sort: equal timestamps keep their backend order.
    rows.sort_by_key(|r| std::cmp::Reverse(r.timestamp_ms()));
    rows
}
