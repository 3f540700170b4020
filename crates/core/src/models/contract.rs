use serde::{Deserialize, Serialize};

use super::record::{Amount, Identifier, TimedAmount};

/// Side of an executed trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "BUY"),
            TradeSide::Sell => write!(f, "SELL"),
        }
    }
}

/// One executed futures trade (a "contract" in the dashboard).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractRecord {
    pub id: Identifier,
    pub symbol: String,
    pub side: TradeSide,
    pub price: Amount,
    pub qty: Amount,
    /// Notional value (`price × qty`) in the quote asset
    pub quote_qty: Amount,
    pub realized_pnl: Amount,
    pub commission: Amount,
    #[serde(default)]
    pub commission_asset: String,
    /// Execution time in epoch milliseconds
    pub time: i64,
    /// `true` when the order provided liquidity
    #[serde(default)]
    pub maker: bool,
}

impl ContractRecord {
    pub fn liquidity_label(&self) -> &'static str {
        if self.maker {
            "MAKER"
        } else {
            "TAKER"
        }
    }
}

impl TimedAmount for ContractRecord {
    fn timestamp_ms(&self) -> i64 {
        self.time
    }

    fn amount(&self) -> &Amount {
        &self.realized_pnl
    }

    fn category(&self) -> Option<&str> {
        Some(&self.symbol)
    }
}
