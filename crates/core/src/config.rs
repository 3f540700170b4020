use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

pub const ENV_CONTENT_URL: &str = "OPTIQUANT_CONTENT_URL";
pub const ENV_LOGIN_URL: &str = "OPTIQUANT_LOGIN_URL";
pub const ENV_REGISTER_URL: &str = "OPTIQUANT_REGISTER_URL";
pub const ENV_VERIFY_TOKEN_URL: &str = "OPTIQUANT_VERIFY_TOKEN_URL";
pub const ENV_API_KEY: &str = "OPTIQUANT_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "OPTIQUANT_TIMEOUT_SECS";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Backend endpoints and credentials for the HTTP client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Endpoint for all `type`-dispatched content requests
    pub content_url: String,
    pub login_url: String,
    pub register_url: String,
    pub verify_token_url: String,

    /// Value of the `x-api-key` header
    pub api_key: String,

    /// Per-request timeout (ignored on wasm32)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("content_url", &self.content_url)
            .field("login_url", &self.login_url)
            .field("register_url", &self.register_url)
            .field("verify_token_url", &self.verify_token_url)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    /// Point every endpoint at `{base_url}/{content,login,register,verify}`.
    pub fn with_base_url(base_url: &str, api_key: impl Into<String>) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            content_url: format!("{base}/content"),
            login_url: format!("{base}/login"),
            register_url: format!("{base}/register"),
            verify_token_url: format!("{base}/verify"),
            api_key: api_key.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read the configuration from `OPTIQUANT_*` environment variables,
    /// loading a `.env` file first when one exists.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_env() -> Result<Self, CoreError> {
        // A missing .env file is normal in production.
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(CoreError::Config(format!("Failed to read .env: {e}")));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any key lookup (environment, map, ...).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| CoreError::Config(format!("{key} is not set")))
        };

        let timeout_secs = match lookup(ENV_TIMEOUT_SECS) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                CoreError::Config(format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got '{raw}'"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            content_url: required(ENV_CONTENT_URL)?,
            login_url: required(ENV_LOGIN_URL)?,
            register_url: required(ENV_REGISTER_URL)?,
            verify_token_url: required(ENV_VERIFY_TOKEN_URL)?,
            api_key: required(ENV_API_KEY)?,
            timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Every URL must be http(s) and the API key must be present.
    pub fn validate(&self) -> Result<(), CoreError> {
        let urls = [
            ("content_url", &self.content_url),
            ("login_url", &self.login_url),
            ("register_url", &self.register_url),
            ("verify_token_url", &self.verify_token_url),
        ];
        for (name, url) in urls {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(CoreError::Config(format!(
                    "{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }
        if self.api_key.trim().is_empty() {
            return Err(CoreError::Config("api_key must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(CoreError::Config("timeout_secs must be positive".into()));
        }
        Ok(())
    }
}
