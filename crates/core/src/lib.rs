pub mod backend;
pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod services;

use std::sync::{Mutex, MutexGuard};

use backend::http::HttpContentProvider;
use backend::traits::ContentProvider;
use chrono::{Local, TimeZone};
use config::ClientConfig;
use errors::CoreError;
use models::{
    balance::BalanceRecord,
    chart::{GraphView, IncomeView},
    contract::ContractRecord,
    period::{Anchor, Interval},
    query::PeriodQuery,
    session::{Credentials, Registration, Session},
    settings::{SettingsUpdate, UserSettings},
};
use services::{
    chart_service::ChartService,
    fetch_service::{FetchCoordinator, FetchOutcome},
};

/// Mutable dashboard state. Only ever replaced wholesale per field,
/// never held across an await.
#[derive(Debug)]
struct ViewState {
    session: Option<Session>,
    query: PeriodQuery,
    graph: Option<GraphView>,
}

/// Main entry point for the OptiQuant core library.
///
/// Holds the session, the current [`PeriodQuery`], and the last applied
/// graph. All methods take `&self` so a UI can fire overlapping refreshes;
/// the newest one wins and older results are discarded.
#[must_use]
pub struct Dashboard<Tz: TimeZone = Local> {
    provider: Box<dyn ContentProvider>,
    chart_service: ChartService,
    fetches: FetchCoordinator,
    state: Mutex<ViewState>,
    tz: Tz,
}

impl<Tz: TimeZone> std::fmt::Debug for Dashboard<Tz> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Dashboard")
            .field("provider", &self.provider.name())
            .field("signed_in", &state.session.is_some())
            .field("query", &state.query)
            .field("generation", &self.fetches.generation())
            .finish()
    }
}

impl Dashboard<Local> {
    /// Dashboard against the real backend, bucketing in the local time zone.
    pub fn from_config(config: ClientConfig) -> Result<Self, CoreError> {
        let provider = HttpContentProvider::new(config)?;
        Ok(Self::new(Box::new(provider)))
    }

    pub fn new(provider: Box<dyn ContentProvider>) -> Self {
        Self::with_timezone(provider, Local)
    }
}

impl<Tz: TimeZone> Dashboard<Tz> {
    /// Dashboard that resolves periods in `tz`. The initial query is the
    /// daily view of today.
    pub fn with_timezone(provider: Box<dyn ContentProvider>, tz: Tz) -> Self {
        let query = PeriodQuery::new(Interval::Daily, Anchor::today(&tz));
        Self {
            provider,
            chart_service: ChartService::new(),
            fetches: FetchCoordinator::new(),
            state: Mutex::new(ViewState {
                session: None,
                query,
                graph: None,
            }),
            tz,
        }
    }

    // ── Session ─────────────────────────────────────────────────────

    /// Sign in and keep the returned session.
    pub async fn login(&self, user_id: &str, password: &str) -> Result<Session, CoreError> {
        let credentials = Credentials::new(user_id, password);
        credentials.validate()?;
        let session = self.provider.login(&credentials).await?;
        self.state().session = Some(session.clone());
        Ok(session)
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, registration: &Registration) -> Result<(), CoreError> {
        registration.validate()?;
        self.provider.register(registration).await
    }

    /// Re-validate a session persisted by the embedding app.
    ///
    /// On success the refreshed session replaces it; on any failure the
    /// dashboard is signed out and the error is returned.
    pub async fn restore_session(&self, session: Session) -> Result<Session, CoreError> {
        match self.provider.verify_token(&session).await {
            Ok(refreshed) => {
                self.state().session = Some(refreshed.clone());
                Ok(refreshed)
            }
            Err(e) => {
                tracing::info!(error = %e, "stored session rejected; signing out");
                self.logout();
                Err(e)
            }
        }
    }

    /// Forget the session and any loaded view; cancels in-flight fetches.
    pub fn logout(&self) {
        self.fetches.cancel();
        let mut state = self.state();
        state.session = None;
        state.graph = None;
    }

    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.state().session.clone()
    }

    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.state().session.is_some()
    }

    // ── Graph ───────────────────────────────────────────────────────

    #[must_use]
    pub fn query(&self) -> PeriodQuery {
        self.state().query.clone()
    }

    /// Last applied graph, if any.
    #[must_use]
    pub fn graph(&self) -> Option<GraphView> {
        self.state().graph.clone()
    }

    /// Switch to `query` and load its graph.
    pub async fn set_query(&self, query: PeriodQuery) -> Result<FetchOutcome<GraphView>, CoreError> {
        self.state().query = query.clone();
        self.load_graph(query).await
    }

    /// Reload the graph for the current query.
    pub async fn refresh_graph(&self) -> Result<FetchOutcome<GraphView>, CoreError> {
        let query = self.query();
        self.load_graph(query).await
    }

    /// Step back one period and load it.
    pub async fn previous_period(&self) -> Result<FetchOutcome<GraphView>, CoreError> {
        let current = self.query();
        let previous = current.previous().ok_or_else(|| {
            CoreError::ValidationError(format!("No period before {}", current.title()))
        })?;
        self.set_query(previous).await
    }

    /// Step forward one period and load it. Returns `Ok(None)` when the
    /// current period already contains today.
    pub async fn next_period(&self) -> Result<Option<FetchOutcome<GraphView>>, CoreError> {
        let today = Anchor::today(&self.tz).date();
        match self.query().next(today) {
            Some(next) => self.set_query(next).await.map(Some),
            None => Ok(None),
        }
    }

    async fn load_graph(&self, query: PeriodQuery) -> Result<FetchOutcome<GraphView>, CoreError> {
        let session = self.require_session()?;
        let range = query.period(&self.tz).time_range();

        let fetch = async {
            tokio::try_join!(
                self.provider.fetch_income(&session, Some(range)),
                self.provider.fetch_future_balance(&session),
            )
        };

        match self.fetches.run(fetch).await {
            FetchOutcome::Superseded => Ok(FetchOutcome::Superseded),
            FetchOutcome::Applied(result) => {
                let (income, balances) = result?;
                let view = self.chart_service.graph_view(&query, &income, &balances, &self.tz);
                self.state().graph = Some(view.clone());
                Ok(FetchOutcome::Applied(view))
            }
        }
    }

    // ── Lists & Settings ────────────────────────────────────────────

    /// Full income history with its accumulation chart.
    pub async fn income_view(&self) -> Result<IncomeView, CoreError> {
        let session = self.require_session()?;
        let income = self.provider.fetch_income(&session, None).await?;
        Ok(self.chart_service.income_view(&income))
    }

    /// Wallet balances, most recently updated first.
    pub async fn balances(&self) -> Result<Vec<BalanceRecord>, CoreError> {
        let session = self.require_session()?;
        let balances = self.provider.fetch_future_balance(&session).await?;
        Ok(self.chart_service.balance_rows(&balances))
    }

    /// Executed trades, newest first.
    pub async fn contracts(&self) -> Result<Vec<ContractRecord>, CoreError> {
        let session = self.require_session()?;
        let contracts = self.provider.fetch_contract_list(&session).await?;
        Ok(self.chart_service.contract_rows(&contracts))
    }

    pub async fn settings(&self) -> Result<UserSettings, CoreError> {
        let session = self.require_session()?;
        self.provider.get_setting(&session).await
    }

    /// Validate and store new settings.
    pub async fn update_settings(&self, update: &SettingsUpdate) -> Result<(), CoreError> {
        update.validate()?;
        let session = self.require_session()?;
        self.provider.update_setting(&session, update).await
    }

    // ── Internal ────────────────────────────────────────────────────

    fn require_session(&self) -> Result<Session, CoreError> {
        self.state().session.clone().ok_or(CoreError::NotAuthenticated)
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        // State is replaced field-by-field, so a panic elsewhere cannot
        // leave it half-written.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
