use std::cmp::Ordering;

use crate::format::{self, ALTERNATE_CURRENCY_RATE};
use crate::i18n::t;
use crate::models::preferences::{DisplayCurrency, Preference};
use crate::state::store::AppStore;

use super::{inline_error, order_by_total, token_rows, token_summary, Action, Binding, TokenRowView, ViewKind};

/// One of the four headline cards.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryCard {
    /// `total`, `brl`, `usdt` or `usdc`
    pub id: &'static str,
    pub label: String,
    pub value: String,
    /// USD equivalent, used only for ordering
    pub value_usd: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeCardView {
    pub exchange_id: String,
    pub name: String,
    pub total: String,
    pub total_usd: f64,
    pub token_summary: String,
    pub expanded: bool,
    /// Empty while collapsed
    pub tokens: Vec<TokenRowView>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub title: String,
    pub cards: Vec<SummaryCard>,
    pub exchanges: Vec<ExchangeCardView>,
    pub hide_zero: bool,
    pub empty_message: Option<String>,
    pub error: Option<String>,
    pub loading_percent: u8,
    pub bindings: Vec<Binding>,
}

/// Headline cards: value > 0 first by USD equivalent, then the zero ones.
pub fn summary_cards(store: &AppStore) -> Vec<SummaryCard> {
    let prefs = store.preferences();
    let lang = prefs.language;
    let portfolio = store.portfolio();

    let total_usd = portfolio.map(|p| p.summary.total_usd).unwrap_or(0.0);
    let amount = |symbol: &str| portfolio.map(|p| p.total_amount_of(symbol)).unwrap_or(0.0);
    let brl = amount("BRL");
    let usdt = amount("USDT");
    let usdc = amount("USDC");

    // Sub-cent BRL dust shows as zero
    let brl = if brl >= 0.01 { brl } else { 0.0 };

    let cards = vec![
        SummaryCard {
            id: "total",
            label: t(lang, "total").to_string(),
            value: format::format_currency(total_usd, prefs.display_currency()),
            value_usd: total_usd,
        },
        SummaryCard {
            id: "brl",
            label: "BRL".to_string(),
            value: format::format_native(brl, DisplayCurrency::Brl),
            value_usd: brl / ALTERNATE_CURRENCY_RATE,
        },
        SummaryCard {
            id: "usdt",
            label: "USDT".to_string(),
            value: format::format_native(usdt, DisplayCurrency::Usd),
            value_usd: usdt,
        },
        SummaryCard {
            id: "usdc",
            label: "USDC".to_string(),
            value: format::format_native(usdc, DisplayCurrency::Usd),
            value_usd: usdc,
        },
    ];

    let (mut with_value, without): (Vec<_>, Vec<_>) =
        cards.into_iter().partition(|c| c.value_usd > 0.0);
    with_value.sort_by(|a, b| b.value_usd.partial_cmp(&a.value_usd).unwrap_or(Ordering::Equal));
    with_value.into_iter().chain(without).collect()
}

/// Linked exchanges ordered by snapshot total. Exchanges missing from the
/// snapshot count as zero.
pub fn render_dashboard(store: &AppStore) -> DashboardView {
    let prefs = store.preferences();
    let lang = prefs.language;
    let currency = prefs.display_currency();
    let portfolio = store.portfolio();

    let linked: Vec<_> = store
        .linked_exchanges()
        .iter()
        .map(|link| {
            let total = portfolio.map(|p| p.exchange_total(&link.exchange_id)).unwrap_or(0.0);
            (link, total)
        })
        .collect();

    let mut bindings = vec![
        Binding::new("refresh", Action::Refresh),
        Binding::new(
            "hide-zero",
            Action::SetPreference(Preference::HideZeroBalances(!prefs.hide_zero_balances)),
        ),
    ];

    let exchanges: Vec<ExchangeCardView> = order_by_total(linked, prefs.hide_zero_balances)
        .into_iter()
        .map(|(link, total_usd)| {
            let snapshot = portfolio.and_then(|p| p.exchange(&link.exchange_id));
            let expanded = store.is_expanded(&link.exchange_id);
            let tokens = match (expanded, snapshot) {
                (true, Some(exchange)) => token_rows(exchange, prefs),
                _ => Vec::new(),
            };

            bindings.push(Binding::new(
                format!("toggle-{}", link.exchange_id),
                Action::ToggleExchange(link.exchange_id.clone()),
            ));
            for row in &tokens {
                bindings.push(Binding::new(
                    format!("token-{}-{}", link.exchange_id, row.symbol),
                    Action::OpenToken {
                        exchange_id: link.exchange_id.clone(),
                        symbol: row.symbol.clone(),
                    },
                ));
            }

            ExchangeCardView {
                exchange_id: link.exchange_id.clone(),
                name: link.display_name.clone(),
                total: format::format_currency(total_usd, currency),
                total_usd,
                token_summary: token_summary(snapshot, prefs),
                expanded,
                tokens,
                error: snapshot.and_then(|s| s.error.clone()),
            }
        })
        .collect();

    let error = inline_error(store, ViewKind::Dashboard);
    if error.is_some() {
        bindings.push(Binding::new("retry", Action::Retry(ViewKind::Dashboard)));
    }

    DashboardView {
        title: t(lang, "connectedExchanges").to_string(),
        cards: summary_cards(store),
        empty_message: exchanges
            .is_empty()
            .then(|| t(lang, "noExchanges").to_string()),
        exchanges,
        hide_zero: prefs.hide_zero_balances,
        error,
        loading_percent: store.progress().loading_percent(),
        bindings,
    }
}
