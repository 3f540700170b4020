use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A monetary value as the backend sends it.
///
/// Exchange payloads carry decimals as strings (`"12.50000000"`), while some
/// fields arrive as plain JSON numbers. Both are accepted; arithmetic only
/// happens after an explicit [`Amount::parse`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

/// Raised when an [`Amount`] cannot be turned into a finite `f64`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{raw}' is not a finite number")]
pub struct AmountError {
    pub raw: String,
}

impl Amount {
    /// Parse to a finite float. Surrounding whitespace is ignored;
    /// empty strings, trailing garbage, NaN and infinities are rejected.
    pub fn parse(&self) -> Result<f64, AmountError> {
        let value = match self {
            Amount::Number(n) => *n,
            Amount::Text(s) => s.trim().parse::<f64>().map_err(|_| AmountError { raw: s.clone() })?,
        };
        if value.is_finite() {
            Ok(value)
        } else {
            Err(AmountError {
                raw: self.to_string(),
            })
        }
    }
}

impl Default for Amount {
    fn default() -> Self {
        Amount::Number(0.0)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Amount::Number(n) => write!(f, "{n}"),
            Amount::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        Amount::Number(value)
    }
}

impl From<&str> for Amount {
    fn from(value: &str) -> Self {
        Amount::Text(value.to_string())
    }
}

/// Anything the aggregator can bucket: a timestamp, a value and an
/// optional category used for filtering.
pub trait TimedAmount {
    /// Milliseconds since the Unix epoch.
    fn timestamp_ms(&self) -> i64;

    fn amount(&self) -> &Amount;

    fn category(&self) -> Option<&str> {
        None
    }
}

impl<T: TimedAmount + ?Sized> TimedAmount for &T {
    fn timestamp_ms(&self) -> i64 {
        (**self).timestamp_ms()
    }

    fn amount(&self) -> &Amount {
        (**self).amount()
    }

    fn category(&self) -> Option<&str> {
        (**self).category()
    }
}

/// A generic time-stamped financial data point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: i64,
    pub amount: Amount,
    #[serde(default)]
    pub category: Option<String>,
}

impl Record {
    pub fn new(timestamp: i64, amount: impl Into<Amount>) -> Self {
        Self {
            timestamp,
            amount: amount.into(),
            category: None,
        }
    }

    pub fn with_category(timestamp: i64, amount: impl Into<Amount>, category: impl Into<String>) -> Self {
        Self {
            timestamp,
            amount: amount.into(),
            category: Some(category.into()),
        }
    }
}

impl TimedAmount for Record {
    fn timestamp_ms(&self) -> i64 {
        self.timestamp
    }

    fn amount(&self) -> &Amount {
        &self.amount
    }

    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// Envelope used by every list-returning content request: `{ "data": [...] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// Exchange identifiers arrive as numbers or strings depending on the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identifier::Number(n) => write!(f, "{n}"),
            Identifier::Text(s) => write!(f, "{s}"),
        }
    }
}
