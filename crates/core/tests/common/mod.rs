// ═══════════════════════════════════════════════════════════════════
// Shared fixtures — mock backend, recording sink, snapshot builders
// ═══════════════════════════════════════════════════════════════════

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use exchange_dashboard_core::backend::traits::BalanceBackend;
use exchange_dashboard_core::errors::CoreError;
use exchange_dashboard_core::models::balance::{
    ExchangeBalanceSnapshot, PortfolioSnapshot, PortfolioSummary, TokenBalance,
};
use exchange_dashboard_core::models::exchange::{
    ApiMessage, AvailableExchange, ExchangeLink, HealthStatus,
};
use exchange_dashboard_core::models::history::{
    EvolutionPoint, EvolutionSeries, EvolutionSummary, Period,
};
use exchange_dashboard_core::models::progress::EnrichmentProgress;
use exchange_dashboard_core::models::settings::ClientSettings;
use exchange_dashboard_core::models::ticker::{
    ChangeWindows, TickerPayload, TickerPrice, TickerVolume,
};
use exchange_dashboard_core::storage::manager::MemoryStorage;
use exchange_dashboard_core::views::balances::BalancesView;
use exchange_dashboard_core::views::dashboard::DashboardView;
use exchange_dashboard_core::views::exchanges::ExchangesView;
use exchange_dashboard_core::views::history::HistoryView;
use exchange_dashboard_core::views::settings::SettingsView;
use exchange_dashboard_core::views::token_modal::TokenModalView;
use exchange_dashboard_core::views::{TokenRowView, ViewSink};
use exchange_dashboard_core::ExchangeDashboard;

// ── Builders ────────────────────────────────────────────────────────

pub fn link(exchange_id: &str, name: &str) -> ExchangeLink {
    ExchangeLink {
        exchange_id: exchange_id.into(),
        display_name: name.into(),
        ccxt_id: name.to_lowercase(),
        is_active: true,
        linked_at: None,
        last_sync: None,
    }
}

pub fn token(symbol: &str, amount: f64, price_usd: f64, value_usd: f64) -> TokenBalance {
    TokenBalance::new(symbol, amount, price_usd, value_usd)
}

/// Exchange whose total is the sum of its token values.
pub fn exchange(exchange_id: &str, name: &str, tokens: Vec<TokenBalance>) -> ExchangeBalanceSnapshot {
    let total: f64 = tokens.iter().map(|t| t.value_usd).sum();
    tokens
        .into_iter()
        .fold(ExchangeBalanceSnapshot::new(exchange_id, name, total), |ex, t| {
            ex.with_token(t)
        })
}

pub fn snapshot(exchanges: Vec<ExchangeBalanceSnapshot>) -> PortfolioSnapshot {
    PortfolioSnapshot {
        summary: PortfolioSummary {
            total_usd: exchanges.iter().map(|e| e.total_usd).sum(),
        },
        exchanges,
        ..PortfolioSnapshot::default()
    }
}

pub fn ticker(symbol: &str, change_1h: f64, change_4h: f64, change_24h: f64) -> TickerPayload {
    TickerPayload {
        symbol: symbol.into(),
        price: TickerPrice {
            current: Some(60000.0),
            high_24h: Some(61000.0),
            low_24h: Some(59000.0),
        },
        change: ChangeWindows {
            change_1h: Some(change_1h),
            change_4h: Some(change_4h),
            change_24h: Some(change_24h),
        },
        volume: TickerVolume {
            base_24h: Some(10.0),
            quote_24h: Some(600000.0),
        },
    }
}

pub fn series(period: Period, values: &[f64]) -> EvolutionSeries {
    let start = chrono::DateTime::parse_from_rfc3339("2024-05-01T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    let step = match period {
        Period::OneDay => chrono::Duration::hours(1),
        Period::OneYear => chrono::Duration::days(31),
        _ => chrono::Duration::days(1),
    };
    let points = values
        .iter()
        .enumerate()
        .map(|(i, v)| EvolutionPoint {
            timestamp: Some(start + step * i as i32),
            total_usd: *v,
            total_brl: None,
        })
        .collect();
    let first = values.first().copied().unwrap_or(0.0);
    let last = values.last().copied().unwrap_or(0.0);
    EvolutionSeries {
        period,
        points,
        summary: EvolutionSummary {
            start_value: first,
            end_value: last,
            change_usd: last - first,
            change_percent: if first > 0.0 { (last - first) / first * 100.0 } else { 0.0 },
        },
    }
}

// ── Mock backend ────────────────────────────────────────────────────

/// In-memory backend. Endpoints fail on demand; ticker requests are
/// logged with their start and end instants so batching can be checked.
#[derive(Default)]
pub struct MockBackend {
    pub linked: Mutex<Vec<ExchangeLink>>,
    pub available: Mutex<Vec<AvailableExchange>>,
    pub balances: Mutex<PortfolioSnapshot>,
    pub evolution: Mutex<HashMap<Period, EvolutionSeries>>,
    pub tickers: Mutex<HashMap<(String, String), TickerPayload>>,
    pub details: Mutex<HashMap<String, serde_json::Value>>,
    pub failing: Mutex<HashSet<&'static str>>,
    pub ticker_delay: Mutex<Duration>,
    /// Overrides `ticker_delay` for single symbols
    pub symbol_delays: Mutex<HashMap<String, Duration>>,
    /// `(symbol, started, finished)` per ticker request
    pub ticker_log: Mutex<Vec<(String, tokio::time::Instant, tokio::time::Instant)>>,
    pub calls: Mutex<Vec<String>>,
    pub user_ids: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_linked(&self, links: Vec<ExchangeLink>) {
        *self.linked.lock().unwrap() = links;
    }

    pub fn set_balances(&self, snapshot: PortfolioSnapshot) {
        *self.balances.lock().unwrap() = snapshot;
    }

    pub fn set_ticker(&self, exchange_id: &str, payload: TickerPayload) {
        self.tickers
            .lock()
            .unwrap()
            .insert((exchange_id.to_string(), payload.symbol.clone()), payload);
    }

    pub fn set_evolution(&self, series: EvolutionSeries) {
        self.evolution.lock().unwrap().insert(series.period, series);
    }

    pub fn set_ticker_delay(&self, delay: Duration) {
        *self.ticker_delay.lock().unwrap() = delay;
    }

    pub fn set_symbol_delay(&self, symbol: &str, delay: Duration) {
        self.symbol_delays
            .lock()
            .unwrap()
            .insert(symbol.to_string(), delay);
    }

    pub fn fail(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().insert(endpoint);
    }

    pub fn recover(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().remove(endpoint);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn ticker_log(&self) -> Vec<(String, tokio::time::Instant, tokio::time::Instant)> {
        self.ticker_log.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn check(&self, endpoint: &'static str) -> Result<(), CoreError> {
        if self.failing.lock().unwrap().contains(endpoint) {
            return Err(CoreError::Api {
                endpoint: endpoint.into(),
                message: "backend unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BalanceBackend for MockBackend {
    async fn health(&self) -> Result<HealthStatus, CoreError> {
        self.record("health");
        self.check("health")?;
        Ok(HealthStatus {
            status: "ok".into(),
        })
    }

    async fn get_available_exchanges(&self) -> Result<Vec<AvailableExchange>, CoreError> {
        self.record("available");
        self.check("available")?;
        Ok(self.available.lock().unwrap().clone())
    }

    async fn link_exchange(
        &self,
        exchange_id: &str,
        _api_key: &str,
        _api_secret: &str,
    ) -> Result<ApiMessage, CoreError> {
        self.record(format!("link:{exchange_id}"));
        self.check("link")?;
        Ok(ApiMessage::new("Exchange linked"))
    }

    async fn get_linked_exchanges(&self) -> Result<Vec<ExchangeLink>, CoreError> {
        self.record("linked");
        self.check("linked")?;
        Ok(self.linked.lock().unwrap().clone())
    }

    async fn unlink_exchange(&self, exchange_id: &str) -> Result<ApiMessage, CoreError> {
        self.record(format!("unlink:{exchange_id}"));
        self.check("unlink")?;
        self.linked
            .lock()
            .unwrap()
            .retain(|l| l.exchange_id != exchange_id);
        Ok(ApiMessage::new("Exchange unlinked"))
    }

    async fn get_balances(&self, force_refresh: bool) -> Result<PortfolioSnapshot, CoreError> {
        self.record(format!("balances:{force_refresh}"));
        self.check("balances")?;
        Ok(self.balances.lock().unwrap().clone())
    }

    async fn clear_cache(&self) -> Result<ApiMessage, CoreError> {
        self.record("clear_cache");
        self.check("clear_cache")?;
        Ok(ApiMessage::new("Cache cleared"))
    }

    async fn get_portfolio_evolution(&self, period: Period) -> Result<EvolutionSeries, CoreError> {
        self.record(format!("evolution:{period}"));
        self.check("evolution")?;
        Ok(self
            .evolution
            .lock()
            .unwrap()
            .get(&period)
            .cloned()
            .unwrap_or_else(|| series(period, &[])))
    }

    async fn get_token_ticker(&self, exchange_id: &str, symbol: &str) -> Option<TickerPayload> {
        self.record(format!("ticker:{exchange_id}:{symbol}"));
        let started = tokio::time::Instant::now();
        let delay = self
            .symbol_delays
            .lock()
            .unwrap()
            .get(symbol)
            .copied()
            .unwrap_or_else(|| *self.ticker_delay.lock().unwrap());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.ticker_log
            .lock()
            .unwrap()
            .push((symbol.to_string(), started, tokio::time::Instant::now()));
        if self.failing.lock().unwrap().contains("ticker") {
            return None;
        }
        self.tickers
            .lock()
            .unwrap()
            .get(&(exchange_id.to_string(), symbol.to_string()))
            .cloned()
    }

    async fn get_exchange_details(&self, exchange_id: &str) -> Option<serde_json::Value> {
        self.record(format!("details:{exchange_id}"));
        self.details.lock().unwrap().get(exchange_id).cloned()
    }

    fn set_user_id(&self, user_id: &str) {
        self.user_ids.lock().unwrap().push(user_id.to_string());
    }
}

// ── Recording sink ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Dashboard(DashboardView),
    Balances(BalancesView),
    History(HistoryView),
    TokenModal(TokenModalView),
    Exchanges(ExchangesView),
    Settings(SettingsView),
    Row(String, TokenRowView),
    Progress(EnrichmentProgress),
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn rows(&self) -> Vec<(String, TokenRowView)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Row(exchange_id, row) => Some((exchange_id, row)),
                _ => None,
            })
            .collect()
    }

    pub fn dashboards(&self) -> Vec<DashboardView> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Dashboard(view) => Some(view),
                _ => None,
            })
            .collect()
    }

    pub fn balances_views(&self) -> Vec<BalancesView> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::Balances(view) => Some(view),
                _ => None,
            })
            .collect()
    }

    pub fn modals(&self) -> Vec<TokenModalView> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SinkEvent::TokenModal(view) => Some(view),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: SinkEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ViewSink for RecordingSink {
    fn dashboard(&self, view: &DashboardView) {
        self.push(SinkEvent::Dashboard(view.clone()));
    }

    fn balances(&self, view: &BalancesView) {
        self.push(SinkEvent::Balances(view.clone()));
    }

    fn history(&self, view: &HistoryView) {
        self.push(SinkEvent::History(view.clone()));
    }

    fn token_modal(&self, view: &TokenModalView) {
        self.push(SinkEvent::TokenModal(view.clone()));
    }

    fn exchanges(&self, view: &ExchangesView) {
        self.push(SinkEvent::Exchanges(view.clone()));
    }

    fn settings(&self, view: &SettingsView) {
        self.push(SinkEvent::Settings(view.clone()));
    }

    fn row_update(&self, exchange_id: &str, row: &TokenRowView) {
        self.push(SinkEvent::Row(exchange_id.to_string(), row.clone()));
    }

    fn progress(&self, progress: &EnrichmentProgress) {
        self.push(SinkEvent::Progress(progress.clone()));
    }
}

// ── App wiring ──────────────────────────────────────────────────────

pub fn test_settings() -> ClientSettings {
    ClientSettings {
        enrichment_batch_size: 5,
        enrichment_batch_delay_ms: 500,
        ..ClientSettings::default()
    }
}

pub struct Harness {
    pub app: Arc<ExchangeDashboard>,
    pub backend: Arc<MockBackend>,
    pub sink: Arc<RecordingSink>,
    pub storage: Arc<MemoryStorage>,
}

pub fn harness() -> Harness {
    harness_with_storage(Arc::new(MemoryStorage::new()))
}

pub fn harness_with_storage(storage: Arc<MemoryStorage>) -> Harness {
    let backend = MockBackend::new();
    let sink = RecordingSink::new();
    let app = ExchangeDashboard::new(
        test_settings(),
        backend.clone(),
        storage.clone(),
        sink.clone(),
    )
    .expect("valid settings");
    Harness {
        app: Arc::new(app),
        backend,
        sink,
        storage,
    }
}
