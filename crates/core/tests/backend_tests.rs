// ═══════════════════════════════════════════════════════════════════
// Backend Tests: HTTP content provider against a mock server
// ═══════════════════════════════════════════════════════════════════

use httpmock::prelude::*;
use serde_json::json;

use optiquant_core::backend::http::HttpContentProvider;
use optiquant_core::backend::traits::ContentProvider;
use optiquant_core::config::{
    ClientConfig, ENV_API_KEY, ENV_CONTENT_URL, ENV_LOGIN_URL, ENV_REGISTER_URL, ENV_TIMEOUT_SECS,
    ENV_VERIFY_TOKEN_URL,
};
use optiquant_core::errors::CoreError;
use optiquant_core::models::period::TimeRange;
use optiquant_core::models::session::{Credentials, Registration, Session, User};
use optiquant_core::models::settings::{OrderType, SettingsUpdate, UserSettings};

const API_KEY: &str = "test-api-key";

fn provider(server: &MockServer) -> HttpContentProvider {
    HttpContentProvider::new(ClientConfig::with_base_url(&server.base_url(), API_KEY)).unwrap()
}

fn session() -> Session {
    Session {
        user: User {
            user_id: "trader1".into(),
            name: "Trader".into(),
            email: None,
        },
        token: "tok-123".into(),
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Config
// ═══════════════════════════════════════════════════════════════════

mod config {
    use super::*;
    use std::collections::HashMap;

    fn vars() -> HashMap<&'static str, String> {
        HashMap::from([
            (ENV_CONTENT_URL, "https://api.example.com/content".to_string()),
            (ENV_LOGIN_URL, "https://api.example.com/login".to_string()),
            (ENV_REGISTER_URL, "https://api.example.com/register".to_string()),
            (ENV_VERIFY_TOKEN_URL, "https://api.example.com/verify".to_string()),
            (ENV_API_KEY, "key".to_string()),
        ])
    }

    #[test]
    fn from_lookup_reads_all_endpoints() {
        let vars = vars();
        let config = ClientConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.login_url, "https://api.example.com/login");
        assert_eq!(config.api_key, "key");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn from_lookup_reports_missing_key() {
        let mut vars = vars();
        vars.remove(ENV_API_KEY);
        let err = ClientConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: OPTIQUANT_API_KEY is not set");
    }

    #[test]
    fn from_lookup_parses_timeout() {
        let mut vars = vars();
        vars.insert(ENV_TIMEOUT_SECS, "5".into());
        let config = ClientConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.timeout_secs, 5);

        vars.insert(ENV_TIMEOUT_SECS, "soon".into());
        assert!(matches!(
            ClientConfig::from_lookup(|k| vars.get(k).cloned()),
            Err(CoreError::Config(_))
        ));
    }

    #[test]
    fn validate_rejects_non_http_urls() {
        let mut config = ClientConfig::with_base_url("https://api.example.com/", "key");
        assert_eq!(config.content_url, "https://api.example.com/content");
        assert!(config.validate().is_ok());
        config.verify_token_url = "ftp://api.example.com/verify".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout_and_empty_key() {
        let mut config = ClientConfig::with_base_url("http://localhost", " ");
        assert!(config.validate().is_err());
        config.api_key = "key".into();
        config.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_hides_api_key() {
        let config = ClientConfig::with_base_url("http://localhost", "super-secret");
        assert!(!format!("{config:?}").contains("super-secret"));
    }

    #[test]
    fn provider_rejects_invalid_config() {
        let config = ClientConfig::with_base_url("localhost", "key");
        assert!(matches!(HttpContentProvider::new(config), Err(CoreError::Config(_))));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Auth endpoints
// ═══════════════════════════════════════════════════════════════════

mod auth {
    use super::*;

    #[tokio::test]
    async fn login_returns_session() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/login")
                    .header("x-api-key", API_KEY)
                    .json_body(json!({ "user_id": "trader1", "password": "pw" }));
                then.status(200).json_body(json!({
                    "user": { "user_id": "trader1", "name": "Trader" },
                    "token": "tok-123"
                }));
            })
            .await;

        let session = provider(&server)
            .login(&Credentials::new("trader1", "pw"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(session, super::session());
    }

    #[tokio::test]
    async fn login_rejected_maps_to_auth_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/login");
                then.status(401).json_body(json!({ "message": "Invalid ID or password" }));
            })
            .await;

        let err = provider(&server)
            .login(&Credentials::new("trader1", "wrong"))
            .await
            .unwrap_err();

        match err {
            CoreError::Auth { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid ID or password");
            }
            other => panic!("expected Auth, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_validates_before_sending() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/login");
                then.status(200);
            })
            .await;

        let err = provider(&server)
            .login(&Credentials::new("", "pw"))
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::ValidationError(_)));
        assert_eq!(mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn register_posts_all_fields() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/register").json_body(json!({
                    "user_id": "trader1",
                    "email": "t@example.com",
                    "name": "Trader",
                    "password": "pw"
                }));
                then.status(201).json_body(json!({ "message": "created" }));
            })
            .await;

        provider(&server)
            .register(&Registration {
                user_id: "trader1".into(),
                email: "t@example.com".into(),
                name: "Trader".into(),
                password: "pw".into(),
            })
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn verify_token_sends_user_and_token() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/verify").json_body_partial(
                    r#"{ "user": { "user_id": "trader1" }, "token": "tok-123" }"#,
                );
                then.status(200).json_body(json!({
                    "user": { "user_id": "trader1", "name": "Trader" },
                    "token": "tok-456"
                }));
            })
            .await;

        let refreshed = provider(&server).verify_token(&session()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(refreshed.token, "tok-456");
    }

    #[tokio::test]
    async fn expired_token_is_forbidden() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/verify");
                then.status(403).body("");
            })
            .await;

        let err = provider(&server).verify_token(&session()).await.unwrap_err();
        assert!(matches!(err, CoreError::Auth { status: 403, ref message } if message == "Forbidden"));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Content endpoint
// ═══════════════════════════════════════════════════════════════════

mod content {
    use super::*;

    #[tokio::test]
    async fn income_sends_type_and_range() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/content")
                    .header("x-api-key", API_KEY)
                    .json_body(json!({
                        "user_id": "trader1",
                        "token": "tok-123",
                        "type": "income",
                        "startTime": 1710460800000_i64,
                        "endTime": 1710547199999_i64
                    }));
                then.status(200).json_body(json!({
                    "data": [
                        { "incomeType": "REALIZED_PNL", "income": "10", "asset": "USDT", "time": 1710473400000_i64 },
                        { "incomeType": "COMMISSION", "income": "-0.5", "asset": "USDT", "time": 1710474300000_i64 }
                    ]
                }));
            })
            .await;

        let range = TimeRange {
            start_time: 1_710_460_800_000,
            end_time: 1_710_547_199_999,
        };
        let income = provider(&server)
            .fetch_income(&session(), Some(range))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(income.len(), 2);
        assert_eq!(income[0].income_type, "REALIZED_PNL");
        assert_eq!(income[1].income.parse().unwrap(), -0.5);
    }

    #[tokio::test]
    async fn income_without_range_omits_times() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/content").json_body(json!({
                    "user_id": "trader1",
                    "token": "tok-123",
                    "type": "income"
                }));
                then.status(200).json_body(json!({ "data": [] }));
            })
            .await;

        let income = provider(&server).fetch_income(&session(), None).await.unwrap();
        mock.assert_async().await;
        assert!(income.is_empty());
    }

    #[tokio::test]
    async fn future_balance_and_contract_list() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/content")
                    .json_body_partial(r#"{ "type": "futureBalance" }"#);
                then.status(200).json_body(json!({
                    "data": [{ "asset": "USDT", "balance": "122.5", "updateTime": 1 }]
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/content")
                    .json_body_partial(r#"{ "type": "contractList" }"#);
                then.status(200).json_body(json!({
                    "data": [{
                        "id": 1, "symbol": "BTCUSDT", "side": "BUY", "price": "65000",
                        "qty": "0.01", "quoteQty": "650", "realizedPnl": "0",
                        "commission": "0.26", "commissionAsset": "USDT",
                        "time": 1710000000000_i64, "maker": false
                    }]
                }));
            })
            .await;

        let provider = provider(&server);
        let balances = provider.fetch_future_balance(&session()).await.unwrap();
        let contracts = provider.fetch_contract_list(&session()).await.unwrap();

        assert_eq!(balances[0].balance.parse().unwrap(), 122.5);
        assert_eq!(contracts[0].symbol, "BTCUSDT");
        assert_eq!(contracts[0].liquidity_label(), "TAKER");
    }

    #[tokio::test]
    async fn get_setting_unwraps_user() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/content")
                    .json_body_partial(r#"{ "type": "getSetting" }"#);
                then.status(200).json_body(json!({
                    "user": { "user_id": "trader1", "type": "MARKET", "leverage": 3, "ratio": 25 }
                }));
            })
            .await;

        let settings = provider(&server).get_setting(&session()).await.unwrap();
        assert_eq!(settings.order_type, Some(OrderType::Market));
        assert_eq!(settings.leverage, Some(3));
    }

    #[tokio::test]
    async fn update_setting_sends_data() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/content").json_body_partial(
                    r#"{ "type": "updateSetting", "data": { "leverage": 7, "type": "LIMIT" } }"#,
                );
                then.status(200).json_body(json!({ "message": "ok" }));
            })
            .await;

        let mut update = SettingsUpdate::from_settings(&UserSettings::default());
        update.leverage = Some(7);
        update.order_type = Some(OrderType::Limit);
        provider(&server).update_setting(&session(), &update).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn update_setting_rejects_invalid_locally() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/content");
                then.status(200);
            })
            .await;

        let mut update = SettingsUpdate::from_settings(&UserSettings::default());
        update.ratio = Some(33);
        let err = provider(&server).update_setting(&session(), &update).await.unwrap_err();

        assert!(matches!(err, CoreError::ValidationError(_)));
        assert_eq!(mock.hits_async().await, 0);
    }

    #[tokio::test]
    async fn server_error_maps_to_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/content");
                then.status(500).body("database unavailable");
            })
            .await;

        let err = provider(&server).fetch_income(&session(), None).await.unwrap_err();
        match err {
            CoreError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "database unavailable");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_payload_maps_to_deserialization() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/content");
                then.status(200).body("<html>not json</html>");
            })
            .await;

        let err = provider(&server).fetch_contract_list(&session()).await.unwrap_err();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }
}
