use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::balance::PortfolioSnapshot;
use crate::models::exchange::{AvailableExchange, ExchangeLink};
use crate::models::history::{EvolutionSeries, Period};
use crate::models::preferences::{Preference, UiPreferences};
use crate::models::progress::EnrichmentProgress;
use crate::models::ticker::TickerPayload;
use crate::storage::manager::PreferenceStorage;
use crate::views::ViewKind;

/// Version of the installed portfolio snapshot.
///
/// Claimed once per full load, before its first request. Enrichment writes
/// carry the generation they were started for and are dropped when it is
/// no longer the installed one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Phase of the token detail overlay.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalPhase {
    /// Placeholder shown while the ticker is fetched
    Loading,
    /// Fetch settled; `None` means the backend had no ticker
    Loaded { ticker: Option<TickerPayload> },
}

/// The token detail overlay currently open, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveModalRef {
    pub symbol: String,
    pub exchange_id: String,
    pub exchange_name: String,
    pub phase: ModalPhase,
}

impl ActiveModalRef {
    /// A freshly opened overlay, still loading.
    pub fn loading(
        symbol: impl Into<String>,
        exchange_id: impl Into<String>,
        exchange_name: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            exchange_id: exchange_id.into(),
            exchange_name: exchange_name.into(),
            phase: ModalPhase::Loading,
        }
    }

    pub fn refers_to(&self, exchange_id: &str, symbol: &str) -> bool {
        self.exchange_id == exchange_id && self.symbol == symbol
    }
}

/// Outcome of an enrichment write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentWrite {
    Applied,
    /// A newer snapshot replaced the one this write was fetched for
    StaleGeneration,
    /// The exchange or token is gone from the installed snapshot
    TokenMissing,
}

/// Single source of truth for the dashboard.
///
/// Holds at most one portfolio snapshot and one evolution series.
/// All mutation goes through the methods below; views only read.
pub struct AppStore {
    // ── Backend data ────────────────────────────────────────────────
    linked_exchanges: Vec<ExchangeLink>,
    available_exchanges: Vec<AvailableExchange>,
    portfolio: Option<PortfolioSnapshot>,
    installed_generation: Generation,
    claimed_generation: Generation,
    evolution: Option<EvolutionSeries>,
    selected_period: Period,
    exchange_details: HashMap<String, Value>,

    // ── UI state ────────────────────────────────────────────────────
    preferences: UiPreferences,
    storage: Arc<dyn PreferenceStorage>,
    expanded: BTreeSet<String>,
    active_modal: Option<ActiveModalRef>,
    progress: EnrichmentProgress,
    current_view: ViewKind,
    view_errors: BTreeMap<ViewKind, String>,
}

impl std::fmt::Debug for AppStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStore")
            .field("linked_exchanges", &self.linked_exchanges.len())
            .field("generation", &self.installed_generation)
            .field("claimed", &self.claimed_generation)
            .field(
                "tokens",
                &self.portfolio.as_ref().map(|p| p.token_count()).unwrap_or(0),
            )
            .field("current_view", &self.current_view)
            .field("preferences", &self.preferences)
            .finish()
    }
}

impl AppStore {
    /// Empty store with default preferences. Nothing is read from `storage`.
    pub fn new(storage: Arc<dyn PreferenceStorage>) -> Self {
        Self::with_preferences(storage, UiPreferences::default())
    }

    pub fn with_preferences(storage: Arc<dyn PreferenceStorage>, preferences: UiPreferences) -> Self {
        Self {
            linked_exchanges: Vec::new(),
            available_exchanges: Vec::new(),
            portfolio: None,
            installed_generation: Generation::default(),
            claimed_generation: Generation::default(),
            evolution: None,
            selected_period: Period::default(),
            exchange_details: HashMap::new(),
            preferences,
            storage,
            expanded: BTreeSet::new(),
            active_modal: None,
            progress: EnrichmentProgress::default(),
            current_view: ViewKind::default(),
            view_errors: BTreeMap::new(),
        }
    }

    /// Store seeded with the persisted preferences.
    /// An unreadable preferences file falls back to the defaults.
    pub fn open(storage: Arc<dyn PreferenceStorage>) -> Self {
        let preferences = match storage.load() {
            Ok(preferences) => preferences,
            Err(e) => {
                log::warn!("Could not load preferences, using defaults: {e}");
                UiPreferences::default()
            }
        };
        Self::with_preferences(storage, preferences)
    }

    // ── Snapshot generations ────────────────────────────────────────

    /// Reserve the generation for a new full load.
    pub fn claim_generation(&mut self) -> Generation {
        self.claimed_generation = Generation(self.claimed_generation.0 + 1);
        self.claimed_generation
    }

    /// Generation of the installed snapshot.
    pub fn generation(&self) -> Generation {
        self.installed_generation
    }

    /// Install a snapshot fetched under `generation`.
    ///
    /// Rejected (returns `false`) when a newer load already installed its
    /// snapshot. Otherwise enrichment is carried forward from the previous
    /// snapshot for every `(exchange_id, symbol)` present in both whose new
    /// enrichment is empty.
    pub fn install_portfolio(&mut self, generation: Generation, mut snapshot: PortfolioSnapshot) -> bool {
        if generation < self.installed_generation {
            log::warn!(
                "Discarding snapshot {generation}: {} is already installed",
                self.installed_generation
            );
            return false;
        }

        if let Some(previous) = self.portfolio.take() {
            let carried = carry_forward(&previous, &mut snapshot);
            if carried > 0 {
                log::debug!("Carried enrichment forward for {carried} tokens");
            }
        }

        self.portfolio = Some(snapshot);
        self.installed_generation = generation;
        if self.claimed_generation < generation {
            self.claimed_generation = generation;
        }
        true
    }

    /// Claim a generation and install `snapshot` under it.
    pub fn replace_portfolio(&mut self, snapshot: PortfolioSnapshot) -> Generation {
        let generation = self.claim_generation();
        self.install_portfolio(generation, snapshot);
        generation
    }

    /// Merge a fetched ticker into one token of the installed snapshot.
    pub fn apply_enrichment(
        &mut self,
        generation: Generation,
        exchange_id: &str,
        symbol: &str,
        ticker: TickerPayload,
    ) -> EnrichmentWrite {
        if generation != self.installed_generation {
            return EnrichmentWrite::StaleGeneration;
        }
        let Some(token) = self
            .portfolio
            .as_mut()
            .and_then(|p| p.token_mut(exchange_id, symbol))
        else {
            return EnrichmentWrite::TokenMissing;
        };

        token.enrichment.merge_ticker(ticker);
        self.progress.record_loaded(exchange_id);
        EnrichmentWrite::Applied
    }

    pub fn portfolio(&self) -> Option<&PortfolioSnapshot> {
        self.portfolio.as_ref()
    }

    // ── Exchanges ───────────────────────────────────────────────────

    pub fn linked_exchanges(&self) -> &[ExchangeLink] {
        &self.linked_exchanges
    }

    pub fn set_linked_exchanges(&mut self, links: Vec<ExchangeLink>) {
        self.linked_exchanges = links;
    }

    pub fn linked_exchange(&self, exchange_id: &str) -> Option<&ExchangeLink> {
        self.linked_exchanges
            .iter()
            .find(|l| l.exchange_id == exchange_id)
    }

    /// Forget an unlinked exchange everywhere it is referenced.
    pub fn remove_linked_exchange(&mut self, exchange_id: &str) {
        self.linked_exchanges.retain(|l| l.exchange_id != exchange_id);
        self.expanded.remove(exchange_id);
        self.exchange_details.remove(exchange_id);
        if self
            .active_modal
            .as_ref()
            .is_some_and(|m| m.exchange_id == exchange_id)
        {
            self.active_modal = None;
        }
    }

    pub fn available_exchanges(&self) -> &[AvailableExchange] {
        &self.available_exchanges
    }

    pub fn set_available_exchanges(&mut self, exchanges: Vec<AvailableExchange>) {
        self.available_exchanges = exchanges;
    }

    pub fn exchange_details(&self, exchange_id: &str) -> Option<&Value> {
        self.exchange_details.get(exchange_id)
    }

    pub fn cache_exchange_details(&mut self, exchange_id: &str, details: Value) {
        self.exchange_details.insert(exchange_id.to_string(), details);
    }

    // ── History ─────────────────────────────────────────────────────

    pub fn evolution(&self) -> Option<&EvolutionSeries> {
        self.evolution.as_ref()
    }

    pub fn set_evolution(&mut self, series: EvolutionSeries) {
        self.selected_period = series.period;
        self.evolution = Some(series);
    }

    pub fn selected_period(&self) -> Period {
        self.selected_period
    }

    pub fn select_period(&mut self, period: Period) {
        self.selected_period = period;
    }

    // ── Preferences ─────────────────────────────────────────────────

    pub fn preferences(&self) -> &UiPreferences {
        &self.preferences
    }

    /// Persist a preference change and return the value now in effect.
    ///
    /// Memory is only updated after the save succeeded. Views are not
    /// re-rendered here.
    pub fn set_preference(&mut self, preference: Preference) -> Result<Preference, CoreError> {
        let mut staged = self.preferences.clone();
        let applied = staged.apply(preference);
        self.storage.save(&staged)?;
        self.preferences = staged;
        Ok(applied)
    }

    // ── Expanded exchanges ──────────────────────────────────────────

    /// Flip an exchange's expanded state and return the new one.
    pub fn toggle_expanded(&mut self, exchange_id: &str) -> bool {
        if self.expanded.remove(exchange_id) {
            false
        } else {
            self.expanded.insert(exchange_id.to_string());
            true
        }
    }

    pub fn is_expanded(&self, exchange_id: &str) -> bool {
        self.expanded.contains(exchange_id)
    }

    /// Expand linked exchanges after a fresh load: those holding value,
    /// and zero-balance ones too when zero balances are not hidden.
    pub fn auto_expand(&mut self) {
        let hide_zero = self.preferences.hide_zero_balances;
        for link in &self.linked_exchanges {
            let total = self
                .portfolio
                .as_ref()
                .map(|p| p.exchange_total(&link.exchange_id))
                .unwrap_or(0.0);
            if total > 0.0 || !hide_zero {
                self.expanded.insert(link.exchange_id.clone());
            }
        }
    }

    // ── Views, modal, progress ──────────────────────────────────────

    pub fn current_view(&self) -> ViewKind {
        self.current_view
    }

    pub fn set_current_view(&mut self, view: ViewKind) {
        self.current_view = view;
    }

    /// Whether a token row of `exchange_id` is on screen right now.
    pub fn is_row_visible(&self, exchange_id: &str) -> bool {
        match self.current_view {
            ViewKind::Balances => true,
            ViewKind::Dashboard => self.is_expanded(exchange_id),
            _ => false,
        }
    }

    pub fn view_error(&self, view: ViewKind) -> Option<&str> {
        self.view_errors.get(&view).map(String::as_str)
    }

    pub fn set_view_error(&mut self, view: ViewKind, message: impl Into<String>) {
        self.view_errors.insert(view, message.into());
    }

    pub fn clear_view_error(&mut self, view: ViewKind) {
        self.view_errors.remove(&view);
    }

    pub fn active_modal(&self) -> Option<&ActiveModalRef> {
        self.active_modal.as_ref()
    }

    pub fn open_modal(&mut self, modal: ActiveModalRef) {
        self.active_modal = Some(modal);
    }

    /// Move the open overlay to `Loaded`. Ignored when the user closed it
    /// or opened another token meanwhile.
    pub fn resolve_modal(&mut self, exchange_id: &str, symbol: &str, ticker: Option<TickerPayload>) -> bool {
        match self.active_modal.as_mut() {
            Some(modal) if modal.refers_to(exchange_id, symbol) => {
                modal.phase = ModalPhase::Loaded { ticker };
                true
            }
            _ => false,
        }
    }

    /// Ticker the overlay can render from without a fetch.
    pub fn cached_modal_ticker(&self) -> Option<&TickerPayload> {
        let modal = self.active_modal.as_ref()?;
        if let ModalPhase::Loaded { ticker: Some(ticker) } = &modal.phase {
            return Some(ticker);
        }
        self.portfolio
            .as_ref()?
            .token(&modal.exchange_id, &modal.symbol)?
            .enrichment
            .ticker
            .as_ref()
    }

    pub fn close_modal(&mut self) {
        self.active_modal = None;
    }

    pub fn progress(&self) -> &EnrichmentProgress {
        &self.progress
    }

    pub fn reset_progress(&mut self) {
        self.progress = EnrichmentProgress::default();
    }

    pub fn register_progress(&mut self, exchange_id: &str, expected: usize) {
        self.progress.register_exchange(exchange_id, expected);
    }
}

/// Copy old enrichment into tokens of `next` that have none. Returns the count.
fn carry_forward(previous: &PortfolioSnapshot, next: &mut PortfolioSnapshot) -> usize {
    let mut carried = 0;
    for exchange in &mut next.exchanges {
        let Some(old_exchange) = previous.exchange(&exchange.exchange_id) else {
            continue;
        };
        for (symbol, token) in exchange.tokens.iter_mut() {
            if !token.enrichment.is_empty() {
                continue;
            }
            if let Some(old_token) = old_exchange.tokens.get(symbol) {
                if !old_token.enrichment.is_empty() {
                    token.enrichment = old_token.enrichment.clone();
                    carried += 1;
                }
            }
        }
    }
    carried
}
