use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::balance::BalanceRecord;
use crate::models::contract::ContractRecord;
use crate::models::income::IncomeRecord;
use crate::models::period::TimeRange;
use crate::models::session::{Credentials, Registration, Session};
use crate::models::settings::{SettingsUpdate, UserSettings};

/// Everything the dashboard needs from the OptiQuant backend.
///
/// `HttpContentProvider` talks to the real service; tests plug in
/// in-memory implementations.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait ContentProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Exchange credentials for a session. 401/403 surface as `CoreError::Auth`.
    async fn login(&self, credentials: &Credentials) -> Result<Session, CoreError>;

    async fn register(&self, registration: &Registration) -> Result<(), CoreError>;

    /// Refresh a stored session. Any error means the session is no longer valid.
    async fn verify_token(&self, session: &Session) -> Result<Session, CoreError>;

    /// Income events, optionally limited to an inclusive time range.
    async fn fetch_income(
        &self,
        session: &Session,
        range: Option<TimeRange>,
    ) -> Result<Vec<IncomeRecord>, CoreError>;

    async fn fetch_future_balance(&self, session: &Session) -> Result<Vec<BalanceRecord>, CoreError>;

    async fn fetch_contract_list(&self, session: &Session) -> Result<Vec<ContractRecord>, CoreError>;

    async fn get_setting(&self, session: &Session) -> Result<UserSettings, CoreError>;

    async fn update_setting(&self, session: &Session, update: &SettingsUpdate) -> Result<(), CoreError>;
}
