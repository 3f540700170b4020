use serde::{Deserialize, Serialize};

use super::record::{Amount, Identifier, TimedAmount};

/// One futures income event (realized PnL, funding fee, commission, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecord {
    /// Trading pair, empty for account-level transfers
    #[serde(default)]
    pub symbol: Option<String>,

    /// Income category as reported by the exchange, e.g. `REALIZED_PNL`
    pub income_type: String,

    /// Signed income amount
    pub income: Amount,

    /// Asset the income is denominated in (usually `USDT`)
    #[serde(default)]
    pub asset: String,

    #[serde(default)]
    pub info: String,

    /// Event time in epoch milliseconds
    pub time: i64,

    #[serde(default)]
    pub tran_id: Option<Identifier>,

    #[serde(default)]
    pub trade_id: Option<Identifier>,
}

impl TimedAmount for IncomeRecord {
    fn timestamp_ms(&self) -> i64 {
        self.time
    }

    fn amount(&self) -> &Amount {
        &self.income
    }

    fn category(&self) -> Option<&str> {
        Some(&self.income_type)
    }
}
