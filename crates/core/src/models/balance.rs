use serde::{Deserialize, Serialize};

use super::record::{Amount, TimedAmount};

/// A futures wallet balance snapshot for a single asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRecord {
    pub asset: String,

    pub balance: Amount,

    #[serde(default)]
    pub available_balance: Amount,

    #[serde(default)]
    pub max_withdraw_amount: Amount,

    /// Unrealized PnL of cross positions
    #[serde(default)]
    pub cross_un_pnl: Amount,

    /// Last update in epoch milliseconds; `0` when the exchange never touched it
    #[serde(default)]
    pub update_time: i64,
}

impl TimedAmount for BalanceRecord {
    fn timestamp_ms(&self) -> i64 {
        self.update_time
    }

    fn amount(&self) -> &Amount {
        &self.balance
    }

    fn category(&self) -> Option<&str> {
        Some(&self.asset)
    }
}
