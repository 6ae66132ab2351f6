pub mod backend;
pub mod errors;
pub mod format;
pub mod i18n;
pub mod models;
pub mod router;
pub mod services;
pub mod state;
pub mod storage;
pub mod views;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use backend::http::HttpBackend;
use backend::traits::BalanceBackend;
use errors::CoreError;
use models::exchange::{ApiMessage, HealthStatus};
use models::history::Period;
use models::preferences::Preference;
use models::settings::ClientSettings;
use services::enrichment_service::{EnrichmentReport, EnrichmentService};
use state::handle::StoreHandle;
use state::store::{ActiveModalRef, AppStore};
use storage::manager::PreferenceStorage;
use views::balances::{render_balances, BalancesView};
use views::dashboard::{render_dashboard, DashboardView};
use views::exchanges::{render_exchanges, ExchangesView};
use views::history::{render_history, HistoryView};
use views::settings::{render_settings, SettingsView};
use views::token_modal::{render_token_modal, TokenModalView};
use views::{ViewKind, ViewSink};

/// Result of a refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed,
    /// Another refresh was still running; nothing was requested
    AlreadyRunning,
}

/// Main entry point of the dashboard core.
///
/// Owns the backend client, the shared store and the presentation sink.
/// Every load claims a snapshot generation before its first request, so
/// overlapping loads and in-flight enrichment never clobber newer data.
#[must_use]
pub struct ExchangeDashboard {
    settings: ClientSettings,
    backend: Arc<dyn BalanceBackend>,
    store: StoreHandle,
    sink: Arc<dyn ViewSink>,
    enrichment: EnrichmentService,
    refreshing: AtomicBool,
}

impl std::fmt::Debug for ExchangeDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExchangeDashboard")
            .field("base_url", &self.settings.base_url)
            .field("user_id", &self.user_id())
            .field("refreshing", &self.refreshing.load(Ordering::Relaxed))
            .finish()
    }
}

/// Clears the refresh flag when the refresh ends, however it ends.
struct RefreshGuard<'a>(&'a AtomicBool);

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ExchangeDashboard {
    /// Build a dashboard over any backend.
    ///
    /// Preferences are read from `storage`; a persisted user id overrides
    /// `settings.user_id`.
    pub fn new(
        settings: ClientSettings,
        backend: Arc<dyn BalanceBackend>,
        storage: Arc<dyn PreferenceStorage>,
        sink: Arc<dyn ViewSink>,
    ) -> Result<Self, CoreError> {
        settings.validate()?;
        let store = AppStore::open(storage);
        if let Some(user_id) = &store.preferences().user_id {
            backend.set_user_id(user_id);
        }
        let enrichment = EnrichmentService::from_settings(Arc::clone(&backend), &settings);
        Ok(Self {
            settings,
            backend,
            store: StoreHandle::new(store),
            sink,
            enrichment,
            refreshing: AtomicBool::new(false),
        })
    }

    /// Build a dashboard talking to the REST backend at `settings.base_url`.
    pub fn connect(
        settings: ClientSettings,
        storage: Arc<dyn PreferenceStorage>,
        sink: Arc<dyn ViewSink>,
    ) -> Result<Self, CoreError> {
        let backend = Arc::new(HttpBackend::new(&settings)?);
        Self::new(settings, backend, storage, sink)
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// The user requests are made for: the persisted override, else the configured id.
    pub fn user_id(&self) -> String {
        self.store
            .read(|s| s.preferences().user_id.clone())
            .unwrap_or_else(|| self.settings.user_id.clone())
    }

    pub async fn health(&self) -> Result<HealthStatus, CoreError> {
        self.backend.health().await
    }

    // ── Rendering ───────────────────────────────────────────────────

    pub fn render_dashboard(&self) -> DashboardView {
        self.store.read(render_dashboard)
    }

    pub fn render_balances(&self) -> BalancesView {
        self.store.read(render_balances)
    }

    pub fn render_history(&self) -> HistoryView {
        self.store.read(render_history)
    }

    pub fn render_exchanges(&self) -> ExchangesView {
        self.store.read(render_exchanges)
    }

    pub fn render_settings(&self) -> SettingsView {
        let user_id = self.user_id();
        self.store.read(|s| render_settings(s, &user_id))
    }

    pub fn render_token_modal(&self) -> Option<TokenModalView> {
        self.store.read(render_token_modal)
    }

    fn publish(&self, view: ViewKind) {
        match view {
            ViewKind::Dashboard => self.sink.dashboard(&self.render_dashboard()),
            ViewKind::Balances => self.sink.balances(&self.render_balances()),
            ViewKind::History => self.sink.history(&self.render_history()),
            ViewKind::Exchanges => self.sink.exchanges(&self.render_exchanges()),
            ViewKind::Settings => self.sink.settings(&self.render_settings()),
        }
    }

    fn publish_modal(&self) {
        if let Some(view) = self.render_token_modal() {
            self.sink.token_modal(&view);
        }
    }

    /// Record a failed strict load and show it inline. Prior data stays.
    fn fail(&self, view: ViewKind, error: &CoreError) {
        log::warn!("Loading {view:?} failed: {error}");
        self.store
            .update(|s| s.set_view_error(view, error.to_string()));
        self.publish(view);
    }

    // ── Loads ───────────────────────────────────────────────────────

    /// Full dashboard load: linked exchanges and balances, first paint,
    /// then ticker enrichment of the exchanges on screen.
    pub async fn load_dashboard(&self) -> Result<EnrichmentReport, CoreError> {
        let generation = self.store.update(|s| s.claim_generation());

        let fetched = async {
            let links = self.backend.get_linked_exchanges().await?;
            let snapshot = self.backend.get_balances(false).await?;
            Ok::<_, CoreError>((links, snapshot))
        }
        .await;
        let (links, snapshot) = match fetched {
            Ok(data) => data,
            Err(e) => {
                self.fail(ViewKind::Dashboard, &e);
                return Err(e);
            }
        };

        let installed = self.store.update(|s| {
            if !s.install_portfolio(generation, snapshot) {
                return false;
            }
            s.set_linked_exchanges(links);
            s.clear_view_error(ViewKind::Dashboard);
            s.auto_expand();
            s.reset_progress();
            true
        });
        if !installed {
            log::warn!("Dashboard load {generation} superseded by a newer one");
            return Ok(EnrichmentReport::default());
        }

        let dashboard = self.render_dashboard();
        self.sink.dashboard(&dashboard);

        let visible: Vec<String> = dashboard
            .exchanges
            .iter()
            .map(|card| card.exchange_id.clone())
            .collect();
        let report = self
            .enrichment
            .enrich_exchanges(&self.store, self.sink.as_ref(), generation, &visible)
            .await;

        self.publish(ViewKind::Dashboard);
        log::info!(
            "Dashboard loaded: {} exchanges, {}/{} tokens enriched",
            visible.len(),
            report.enriched,
            report.requested
        );
        Ok(report)
    }

    /// Reload the balances table. `force_refresh` bypasses the backend cache.
    ///
    /// No enrichment runs here; enrichment already fetched is carried over.
    pub async fn load_balances(&self, force_refresh: bool) -> Result<(), CoreError> {
        let generation = self.store.update(|s| s.claim_generation());
        let snapshot = match self.backend.get_balances(force_refresh).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.fail(ViewKind::Balances, &e);
                return Err(e);
            }
        };

        let installed = self.store.update(|s| {
            let installed = s.install_portfolio(generation, snapshot);
            if installed {
                s.clear_view_error(ViewKind::Balances);
            }
            installed
        });
        if installed {
            self.publish(ViewKind::Balances);
            log::info!("Balances loaded (force_refresh={force_refresh})");
        }
        Ok(())
    }

    /// Fetch the evolution series for `period` and show it.
    ///
    /// On failure the previously selected period and its series stay.
    pub async fn load_history(&self, period: Period) -> Result<(), CoreError> {
        match self.backend.get_portfolio_evolution(period).await {
            Ok(series) => {
                self.store.update(|s| {
                    s.set_evolution(series);
                    s.clear_view_error(ViewKind::History);
                });
                self.publish(ViewKind::History);
                log::info!("History loaded for {}", period.as_str());
                Ok(())
            }
            Err(e) => {
                self.fail(ViewKind::History, &e);
                Err(e)
            }
        }
    }

    pub async fn load_exchanges(&self) -> Result<(), CoreError> {
        let fetched = async {
            let available = self.backend.get_available_exchanges().await?;
            let linked = self.backend.get_linked_exchanges().await?;
            Ok::<_, CoreError>((available, linked))
        }
        .await;

        match fetched {
            Ok((available, linked)) => {
                self.store.update(|s| {
                    s.set_available_exchanges(available);
                    s.set_linked_exchanges(linked);
                    s.clear_view_error(ViewKind::Exchanges);
                });
                self.publish(ViewKind::Exchanges);
                Ok(())
            }
            Err(e) => {
                self.fail(ViewKind::Exchanges, &e);
                Err(e)
            }
        }
    }

    pub fn load_settings(&self) {
        self.publish(ViewKind::Settings);
    }

    // ── Exchange accounts ───────────────────────────────────────────

    /// Link an exchange account, then reload the exchanges list and the dashboard.
    pub async fn link_exchange(
        &self,
        exchange_id: &str,
        api_key: &str,
        api_secret: &str,
    ) -> Result<ApiMessage, CoreError> {
        if [exchange_id, api_key, api_secret]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(CoreError::Validation(
                "exchange, API key and API secret are required".into(),
            ));
        }

        let message = self
            .backend
            .link_exchange(exchange_id, api_key.trim(), api_secret.trim())
            .await?;
        self.reload_after_account_change().await;
        Ok(message)
    }

    pub async fn unlink_exchange(&self, exchange_id: &str) -> Result<ApiMessage, CoreError> {
        let message = self.backend.unlink_exchange(exchange_id).await?;
        self.store.update(|s| s.remove_linked_exchange(exchange_id));
        self.reload_after_account_change().await;
        Ok(message)
    }

    async fn reload_after_account_change(&self) {
        if let Err(e) = self.load_exchanges().await {
            log::warn!("Exchanges reload after account change failed: {e}");
        }
        if let Err(e) = self.load_dashboard().await {
            log::warn!("Dashboard reload after account change failed: {e}");
        }
    }

    /// Drop the backend's balance cache and reload balances from the exchanges.
    pub async fn clear_cache(&self) -> Result<ApiMessage, CoreError> {
        let message = self.backend.clear_cache().await?;
        self.load_balances(true).await?;
        Ok(message)
    }

    /// Exchange metadata, fetched once and cached. `None` when the backend has none.
    pub async fn exchange_details(&self, exchange_id: &str) -> Option<serde_json::Value> {
        if let Some(cached) = self.store.read(|s| s.exchange_details(exchange_id).cloned()) {
            return Some(cached);
        }
        let details = self.backend.get_exchange_details(exchange_id).await?;
        self.store
            .update(|s| s.cache_exchange_details(exchange_id, details.clone()));
        Some(details)
    }

    // ── Preferences ─────────────────────────────────────────────────

    /// Persist a preference and re-render what it affects.
    ///
    /// Currency and language changes re-render every data view from the
    /// store without refetching balances or enrichment.
    pub async fn update_preference(&self, preference: Preference) -> Result<Preference, CoreError> {
        let applied = self.store.update(|s| s.set_preference(preference))?;

        match &applied {
            Preference::UserId(id) => {
                let user_id = id.clone().unwrap_or_else(|| self.settings.user_id.clone());
                self.backend.set_user_id(&user_id);
            }
            Preference::HideZeroBalances(_) => {
                self.publish(ViewKind::Dashboard);
                self.publish(ViewKind::Balances);
            }
            _ => {}
        }
        if applied.affects_rendering() {
            self.refresh_currency_sensitive_views().await;
        }
        self.publish(ViewKind::Settings);
        Ok(applied)
    }

    /// Re-render every amount-bearing view from cached data. The open token
    /// modal is re-rendered too, and only refetched when it has no ticker.
    pub async fn refresh_currency_sensitive_views(&self) {
        self.publish(ViewKind::Dashboard);
        self.publish(ViewKind::Balances);
        self.publish(ViewKind::History);

        let (modal, cached) = self.store.read(|s| {
            (
                s.active_modal().cloned(),
                s.cached_modal_ticker().is_some(),
            )
        });
        match modal {
            Some(_) if cached => self.publish_modal(),
            Some(modal) => {
                self.show_token_modal(&modal.exchange_id, &modal.symbol).await;
            }
            None => {}
        }
    }

    // ── Interactions ────────────────────────────────────────────────

    /// Expand or collapse an exchange card and return the new state.
    pub fn toggle_exchange(&self, exchange_id: &str) -> bool {
        let expanded = self.store.update(|s| s.toggle_expanded(exchange_id));
        self.publish(ViewKind::Dashboard);
        expanded
    }

    /// Open the token overlay: a loading render first, then the ticker
    /// render once the fetch settles. A missing ticker still resolves the
    /// overlay, with the data already in the store.
    pub async fn show_token_modal(&self, exchange_id: &str, symbol: &str) -> Option<TokenModalView> {
        let symbol = symbol.trim().to_uppercase();
        let opened = self.store.update(|s| {
            let exchange_name = s
                .portfolio()
                .and_then(|p| p.exchange(exchange_id))
                .filter(|ex| ex.tokens.contains_key(&symbol))
                .map(|ex| ex.name.clone())?;
            s.open_modal(ActiveModalRef::loading(&symbol, exchange_id, exchange_name));
            Some(())
        });
        if opened.is_none() {
            log::warn!("Token {symbol} not found on {exchange_id}");
            return None;
        }
        self.publish_modal();

        let ticker = self.backend.get_token_ticker(exchange_id, &symbol).await;
        let resolved = self
            .store
            .update(|s| s.resolve_modal(exchange_id, &symbol, ticker));
        if !resolved {
            log::debug!("Token modal for {symbol} closed before its ticker arrived");
            return None;
        }

        let view = self.render_token_modal()?;
        self.sink.token_modal(&view);
        Some(view)
    }

    pub fn close_token_modal(&self) {
        self.store.update(|s| s.close_modal());
    }

    // ── Refresh ─────────────────────────────────────────────────────

    /// Reload the current view, forcing a backend refresh of balances.
    ///
    /// A refresh requested while another one runs is skipped.
    pub async fn refresh(&self) -> Result<RefreshOutcome, CoreError> {
        self.refresh_current(true).await
    }

    async fn refresh_current(&self, force: bool) -> Result<RefreshOutcome, CoreError> {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::debug!("Refresh skipped, another one is running");
            return Ok(RefreshOutcome::AlreadyRunning);
        }
        let _guard = RefreshGuard(&self.refreshing);

        let view = self.store.read(|s| s.current_view());
        self.load_view(view, force).await?;
        Ok(RefreshOutcome::Completed)
    }

    /// Run the load behind `view`.
    pub(crate) async fn load_view(&self, view: ViewKind, force: bool) -> Result<(), CoreError> {
        match view {
            ViewKind::Dashboard => self.load_dashboard().await.map(|_| ()),
            ViewKind::Balances => self.load_balances(force).await,
            ViewKind::History => {
                let period = self.store.read(|s| s.selected_period());
                self.load_history(period).await
            }
            ViewKind::Exchanges => self.load_exchanges().await,
            ViewKind::Settings => {
                self.load_settings();
                Ok(())
            }
        }
    }

    /// Reload the dashboard or balances view every `auto_refresh_secs`.
    ///
    /// Shares the refresh guard with [`refresh`](Self::refresh); a tick that
    /// lands during a running refresh is skipped. Abort the handle to stop.
    pub fn start_auto_refresh(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let app = Arc::clone(self);
        let period = self.settings.auto_refresh_period();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let view = app.store.read(|s| s.current_view());
                if !matches!(view, ViewKind::Dashboard | ViewKind::Balances) {
                    continue;
                }
                log::info!("Auto-refresh of {view:?}");
                match app.refresh_current(false).await {
                    Ok(RefreshOutcome::Completed) => {}
                    Ok(RefreshOutcome::AlreadyRunning) => {
                        log::debug!("Auto-refresh skipped, a refresh is running")
                    }
                    Err(e) => log::warn!("Auto-refresh failed: {e}"),
                }
            }
        })
    }
}
