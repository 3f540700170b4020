use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use super::traits::ContentProvider;
use crate::config::ClientConfig;
use crate::errors::CoreError;
use crate::models::balance::BalanceRecord;
use crate::models::contract::ContractRecord;
use crate::models::income::IncomeRecord;
use crate::models::period::TimeRange;
use crate::models::record::DataEnvelope;
use crate::models::session::{Credentials, ErrorBody, Registration, Session, User};
use crate::models::settings::{SettingsEnvelope, SettingsUpdate, UserSettings};

const API_KEY_HEADER: &str = "x-api-key";

/// OptiQuant backend over HTTPS.
///
/// - **Auth**: login / register / verify endpoints return `{ user, token }`.
/// - **Content**: one endpoint, dispatched on the `type` field of the body.
/// - **Key**: every request carries the configured `x-api-key` header.
pub struct HttpContentProvider {
    client: Client,
    config: ClientConfig,
}

impl HttpContentProvider {
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        let client = builder
            .build()
            .map_err(|e| CoreError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn send<B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<Response, CoreError> {
        let resp = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let text = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|b| b.message)
            .unwrap_or_else(|_| {
                if text.trim().is_empty() {
                    status.canonical_reason().unwrap_or("request failed").to_string()
                } else {
                    text
                }
            });

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::warn!(status = status.as_u16(), %message, "backend rejected credentials");
                Err(CoreError::Auth {
                    status: status.as_u16(),
                    message,
                })
            }
            _ => {
                tracing::warn!(status = status.as_u16(), %message, "backend request failed");
                Err(CoreError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T, CoreError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let text = self.send(url, body).await?.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            CoreError::Deserialization(format!("Unexpected response from {url}: {e}"))
        })
    }

    async fn content<T: DeserializeOwned>(
        &self,
        session: &Session,
        kind: ContentType,
        range: Option<TimeRange>,
    ) -> Result<T, CoreError> {
        tracing::debug!(kind = ?kind, user = %session.user.user_id, "content request");
        let body = ContentRequest {
            user_id: &session.user.user_id,
            token: &session.token,
            kind,
            start_time: range.map(|r| r.start_time),
            end_time: range.map(|r| r.end_time),
            data: None,
        };
        self.post_json(&self.config.content_url, &body).await
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
enum ContentType {
    Income,
    FutureBalance,
    ContractList,
    GetSetting,
    UpdateSetting,
}

#[derive(Serialize)]
struct ContentRequest<'a> {
    user_id: &'a str,
    token: &'a str,
    #[serde(rename = "type")]
    kind: ContentType,
    #[serde(rename = "startTime", skip_serializing_if = "Option::is_none")]
    start_time: Option<i64>,
    #[serde(rename = "endTime", skip_serializing_if = "Option::is_none")]
    end_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a SettingsUpdate>,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    user: &'a User,
    token: &'a str,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl ContentProvider for HttpContentProvider {
    fn name(&self) -> &str {
        "OptiQuant"
    }

    async fn login(&self, credentials: &Credentials) -> Result<Session, CoreError> {
        credentials.validate()?;
        let session: Session = self.post_json(&self.config.login_url, credentials).await?;
        tracing::info!(user = %session.user.user_id, "signed in");
        Ok(session)
    }

    async fn register(&self, registration: &Registration) -> Result<(), CoreError> {
        registration.validate()?;
        self.send(&self.config.register_url, registration).await?;
        tracing::info!(user = %registration.user_id, "registered");
        Ok(())
    }

    async fn verify_token(&self, session: &Session) -> Result<Session, CoreError> {
        let body = VerifyRequest {
            user: &session.user,
            token: &session.token,
        };
        self.post_json(&self.config.verify_token_url, &body).await
    }

    async fn fetch_income(
        &self,
        session: &Session,
        range: Option<TimeRange>,
    ) -> Result<Vec<IncomeRecord>, CoreError> {
        let envelope: DataEnvelope<IncomeRecord> =
            self.content(session, ContentType::Income, range).await?;
        Ok(envelope.data)
    }

    async fn fetch_future_balance(&self, session: &Session) -> Result<Vec<BalanceRecord>, CoreError> {
        let envelope: DataEnvelope<BalanceRecord> =
            self.content(session, ContentType::FutureBalance, None).await?;
        Ok(envelope.data)
    }

    async fn fetch_contract_list(&self, session: &Session) -> Result<Vec<ContractRecord>, CoreError> {
        let envelope: DataEnvelope<ContractRecord> =
            self.content(session, ContentType::ContractList, None).await?;
        Ok(envelope.data)
    }

    async fn get_setting(&self, session: &Session) -> Result<UserSettings, CoreError> {
        let envelope: SettingsEnvelope = self.content(session, ContentType::GetSetting, None).await?;
        Ok(envelope.user)
    }

    async fn update_setting(&self, session: &Session, update: &SettingsUpdate) -> Result<(), CoreError> {
        update.validate()?;
        let body = ContentRequest {
            user_id: &session.user.user_id,
            token: &session.token,
            kind: ContentType::UpdateSetting,
            start_time: None,
            end_time: None,
            data: Some(update),
        };
        self.send(&self.config.content_url, &body).await?;
        tracing::info!(user = %session.user.user_id, "settings updated");
        Ok(())
    }
}
