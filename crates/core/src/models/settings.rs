use serde::{de, Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use crate::errors::CoreError;

/// Order type used by the trading bot when it opens positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

impl FromStr for OrderType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MARKET" => Ok(OrderType::Market),
            "LIMIT" => Ok(OrderType::Limit),
            other => Err(CoreError::ValidationError(format!(
                "Unknown order type '{other}': expected MARKET or LIMIT"
            ))),
        }
    }
}

/// Leverage choices offered by the settings form.
pub const LEVERAGE_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

/// Stop-loss / take-profit percentage choices.
pub const PERCENT_RANGE: std::ops::RangeInclusive<u32> = 1..=100;

/// Position-size ratios (percent of available balance).
pub const RATIO_CHOICES: [u32; 4] = [25, 50, 75, 100];

/// Stored user settings as returned by `getSetting` (`{ "user": { ... } }`).
///
/// Every field is optional: a freshly registered account has no exchange
/// or Slack configuration yet.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "blank_as_none")]
    pub order_type: Option<OrderType>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub leverage: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub sl: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub tp: Option<u32>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub ratio: Option<u32>,

    #[serde(default)]
    pub slack_channel: Option<String>,
    #[serde(default)]
    pub slack_token: Option<String>,
    #[serde(default)]
    pub slack_user: Option<String>,
}

impl std::fmt::Debug for UserSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserSettings")
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("api_key", &redact(&self.api_key))
            .field("secret_key", &redact(&self.secret_key))
            .field("order_type", &self.order_type)
            .field("leverage", &self.leverage)
            .field("sl", &self.sl)
            .field("tp", &self.tp)
            .field("ratio", &self.ratio)
            .field("slack_channel", &self.slack_channel)
            .field("slack_token", &redact(&self.slack_token))
            .field("slack_user", &self.slack_user)
            .finish()
    }
}

/// Trading choices the user never picked are stored as `""`, and numbers
/// sometimes come back as strings (`"10"`). Both map onto `Option<T>`.
fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: std::fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stored<T> {
        Value(T),
        Text(String),
    }

    match Option::<Stored<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Stored::Value(value)) => Ok(Some(value)),
        Some(Stored::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Stored::Text(text)) => text.trim().parse().map(Some).map_err(de::Error::custom),
    }
}

fn redact(secret: &Option<String>) -> &'static str {
    match secret {
        Some(s) if !s.is_empty() => "<redacted>",
        _ => "<unset>",
    }
}

/// Wire envelope for `getSetting`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsEnvelope {
    pub user: UserSettings,
}

/// Payload of an `updateSetting` request.
///
/// The backend replaces the whole record, so the update always carries
/// every section, not just the one being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub name: String,
    pub email: String,
    pub api_key: String,
    pub secret_key: String,
    #[serde(rename = "type")]
    pub order_type: Option<OrderType>,
    pub leverage: Option<u32>,
    pub sl: Option<u32>,
    pub tp: Option<u32>,
    pub ratio: Option<u32>,
    pub slack_channel: String,
    pub slack_token: String,
    pub slack_user: String,
}

impl SettingsUpdate {
    /// Start an update from the currently stored settings.
    pub fn from_settings(settings: &UserSettings) -> Self {
        Self {
            name: settings.name.clone().unwrap_or_default(),
            email: settings.email.clone().unwrap_or_default(),
            api_key: settings.api_key.clone().unwrap_or_default(),
            secret_key: settings.secret_key.clone().unwrap_or_default(),
            order_type: settings.order_type,
            leverage: settings.leverage,
            sl: settings.sl,
            tp: settings.tp,
            ratio: settings.ratio,
            slack_channel: settings.slack_channel.clone().unwrap_or_default(),
            slack_token: settings.slack_token.clone().unwrap_or_default(),
            slack_user: settings.slack_user.clone().unwrap_or_default(),
        }
    }

    /// Check the trading parameters against the choices the form offers.
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(leverage) = self.leverage {
            if !LEVERAGE_RANGE.contains(&leverage) {
                return Err(CoreError::ValidationError(format!(
                    "Leverage {leverage} is outside {}..={}",
                    LEVERAGE_RANGE.start(),
                    LEVERAGE_RANGE.end()
                )));
            }
        }
        for (label, value) in [("SL", self.sl), ("TP", self.tp)] {
            if let Some(pct) = value {
                if !PERCENT_RANGE.contains(&pct) {
                    return Err(CoreError::ValidationError(format!(
                        "{label} {pct}% is outside {}..={}%",
                        PERCENT_RANGE.start(),
                        PERCENT_RANGE.end()
                    )));
                }
            }
        }
        if let Some(ratio) = self.ratio {
            if !RATIO_CHOICES.contains(&ratio) {
                return Err(CoreError::ValidationError(format!(
                    "Ratio {ratio}% must be one of {RATIO_CHOICES:?}"
                )));
            }
        }
        if !self.email.is_empty() && !self.email.contains('@') {
            return Err(CoreError::ValidationError(format!(
                "'{}' is not an email address",
                self.email
            )));
        }
        Ok(())
    }
}
