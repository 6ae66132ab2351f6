//! View synchronizers.
//!
//! Each view is a pure function of the [`AppStore`] returning a view model.
//! Rendering twice with no store mutation in between yields equal values.
//! Interactions are declared as [`Binding`]s next to the data, so every
//! render carries exactly the listeners its output needs.

pub mod balances;
pub mod dashboard;
pub mod exchanges;
pub mod history;
pub mod settings;
pub mod token_modal;

use std::cmp::Ordering;

use crate::format;
use crate::i18n;
use crate::models::asset::AssetKind;
use crate::models::balance::{ExchangeBalanceSnapshot, TokenBalance};
use crate::models::history::Period;
use crate::models::preferences::{Preference, UiPreferences};
use crate::models::progress::EnrichmentProgress;
use crate::state::store::AppStore;

use balances::BalancesView;
use dashboard::DashboardView;
use exchanges::ExchangesView;
use history::HistoryView;
use settings::SettingsView;
use token_modal::TokenModalView;

/// Top-level screens the router switches between.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ViewKind {
    #[default]
    Dashboard,
    Balances,
    History,
    Exchanges,
    Settings,
}

impl ViewKind {
    pub const ALL: [ViewKind; 5] = [
        ViewKind::Dashboard,
        ViewKind::Balances,
        ViewKind::History,
        ViewKind::Exchanges,
        ViewKind::Settings,
    ];

    /// Translation key of the navigation label.
    pub fn label_key(self) -> &'static str {
        match self {
            ViewKind::Dashboard => "home",
            ViewKind::Balances => "tokens",
            ViewKind::History => "history",
            ViewKind::Exchanges => "exchanges",
            ViewKind::Settings => "settings",
        }
    }
}

// ── Bindings ────────────────────────────────────────────────────────

/// What a user interaction on a bound element does.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Navigate(ViewKind),
    Refresh,
    ToggleExchange(String),
    OpenToken { exchange_id: String, symbol: String },
    CloseModal,
    SelectPeriod(Period),
    LinkExchange(String),
    UnlinkExchange(String),
    ClearCache,
    SetPreference(Preference),
    Retry(ViewKind),
}

/// One listener: element id and the action it triggers.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub target: String,
    pub action: Action,
}

impl Binding {
    pub fn new(target: impl Into<String>, action: Action) -> Self {
        Self {
            target: target.into(),
            action,
        }
    }
}

// ── Shared row model ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
    /// Not fetched yet
    Unknown,
}

/// A 1h/4h/24h change badge. Unknown and 0% render differently.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeBadge {
    pub window: &'static str,
    pub text: String,
    pub trend: Trend,
}

impl ChangeBadge {
    pub fn new(window: &'static str, change: Option<f64>, decimals: usize) -> Self {
        let (text, trend) = match change {
            Some(v) if v.is_finite() && v > 0.0 => (format::format_change(v, decimals), Trend::Up),
            Some(v) if v.is_finite() && v < 0.0 => (format::format_change(v, decimals), Trend::Down),
            Some(v) if v.is_finite() => (format!("{:.*}%", decimals, 0.0), Trend::Flat),
            _ => (format::UNKNOWN.to_string(), Trend::Unknown),
        };
        Self {
            window,
            text,
            trend,
        }
    }

    pub fn is_known(&self) -> bool {
        self.trend != Trend::Unknown
    }
}

/// Fiat/stablecoin label shown instead of change badges.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetLabel {
    pub kind: AssetKind,
    pub label: String,
    pub description: String,
}

impl AssetLabel {
    pub fn for_symbol(symbol: &str, preferences: &UiPreferences) -> Option<Self> {
        let kind = AssetKind::classify(symbol);
        let (label, description) = match kind {
            AssetKind::Fiat => ("fiatCurrency", "fiatDesc"),
            AssetKind::Stablecoin => ("stablecoin", "stablecoinDesc"),
            AssetKind::Crypto => return None,
        };
        Some(Self {
            kind,
            label: i18n::t(preferences.language, label).to_string(),
            description: i18n::t(preferences.language, description).to_string(),
        })
    }
}

/// One token line, shared by the dashboard and balances views.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenRowView {
    pub symbol: String,
    pub amount: String,
    /// `None` when the backend has no price
    pub price: Option<String>,
    pub value: String,
    pub has_value: bool,
    /// Fiat/stablecoin tokens carry a label and no badges
    pub asset_label: Option<AssetLabel>,
    /// Only windows that have been fetched
    pub badges: Vec<ChangeBadge>,
}

pub fn token_row(token: &TokenBalance, preferences: &UiPreferences) -> TokenRowView {
    let currency = preferences.display_currency();
    let asset_label = AssetLabel::for_symbol(&token.symbol, preferences);
    let badges = if asset_label.is_some() {
        Vec::new()
    } else {
        let e = &token.enrichment;
        [("1h", e.change_1h), ("4h", e.change_4h), ("24h", e.change_24h)]
            .into_iter()
            .map(|(window, change)| ChangeBadge::new(window, change, 1))
            .filter(ChangeBadge::is_known)
            .collect()
    };

    TokenRowView {
        symbol: token.symbol.clone(),
        amount: format::format_compact(token.amount),
        price: (token.price_usd > 0.0).then(|| format::format_token_price(token.price_usd, currency)),
        value: format::format_currency(token.value_usd, currency),
        has_value: token.has_value(),
        asset_label,
        badges,
    }
}

/// Rows of one exchange: valued tokens by value descending, then zero-value
/// tokens unless hidden. Ties keep symbol order.
pub fn token_rows(exchange: &ExchangeBalanceSnapshot, preferences: &UiPreferences) -> Vec<TokenRowView> {
    let mut valued: Vec<&TokenBalance> = exchange.tokens.values().filter(|t| t.has_value()).collect();
    valued.sort_by(|a, b| descending(a.value_usd, b.value_usd));

    let zero = exchange
        .tokens
        .values()
        .filter(|t| !t.has_value() && !preferences.hide_zero_balances);

    valued
        .into_iter()
        .chain(zero)
        .map(|t| token_row(t, preferences))
        .collect()
}

/// Order items by total descending, dropping zero totals when `hide_zero`.
/// The sort is stable, so equal totals keep their input order.
pub fn order_by_total<T>(items: Vec<(T, f64)>, hide_zero: bool) -> Vec<(T, f64)> {
    let mut items: Vec<(T, f64)> = items
        .into_iter()
        .filter(|(_, total)| !(hide_zero && *total == 0.0))
        .collect();
    items.sort_by(|a, b| descending(a.1, b.1));
    items
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// `"3 tokens • 2 com valor"`
pub fn token_summary(exchange: Option<&ExchangeBalanceSnapshot>, preferences: &UiPreferences) -> String {
    let (count, valued) = exchange
        .map(|e| (e.tokens.len(), e.tokens_with_value()))
        .unwrap_or((0, 0));
    format!(
        "{count} {} • {valued} {}",
        i18n::t(preferences.language, "tokens").to_lowercase(),
        i18n::t(preferences.language, "withValue")
    )
}

/// Inline error of a view, prefixed with the translated heading.
pub fn inline_error(store: &AppStore, view: ViewKind) -> Option<String> {
    store.view_error(view).map(|message| {
        format!(
            "{}: {message}",
            i18n::t(store.preferences().language, "loadError")
        )
    })
}

// ── Presentation seam ───────────────────────────────────────────────

/// Receives rendered views. Every method defaults to a no-op so a host
/// implements only what it displays.
pub trait ViewSink: Send + Sync {
    fn dashboard(&self, _view: &DashboardView) {}

    fn balances(&self, _view: &BalancesView) {}

    fn history(&self, _view: &HistoryView) {}

    fn token_modal(&self, _view: &TokenModalView) {}

    fn exchanges(&self, _view: &ExchangesView) {}

    fn settings(&self, _view: &SettingsView) {}

    /// One token row changed after enrichment; no full re-render.
    fn row_update(&self, _exchange_id: &str, _row: &TokenRowView) {}

    fn progress(&self, _progress: &EnrichmentProgress) {}
}

/// Sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ViewSink for NullSink {}
