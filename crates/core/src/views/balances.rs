use crate::format;
use crate::i18n::t;
use crate::models::preferences::Preference;
use crate::state::store::AppStore;

use super::{inline_error, order_by_total, token_rows, token_summary, Action, Binding, TokenRowView, ViewKind};

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeBalanceView {
    pub exchange_id: String,
    pub name: String,
    pub total: String,
    pub total_usd: f64,
    pub token_summary: String,
    pub success: bool,
    pub error: Option<String>,
    pub rows: Vec<TokenRowView>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalancesView {
    pub title: String,
    pub total: String,
    pub token_count: usize,
    pub tokens_with_value: String,
    pub updated_at: Option<String>,
    pub cache_status: Option<String>,
    pub exchanges: Vec<ExchangeBalanceView>,
    pub empty_message: Option<String>,
    pub error: Option<String>,
    pub bindings: Vec<Binding>,
}

/// Balances table: every exchange of the snapshot, same ordering and
/// zero-balance filter as the dashboard, all rows visible.
pub fn render_balances(store: &AppStore) -> BalancesView {
    let prefs = store.preferences();
    let lang = prefs.language;
    let currency = prefs.display_currency();
    let portfolio = store.portfolio();

    let mut bindings = vec![
        Binding::new("refresh", Action::Refresh),
        Binding::new("clear-cache", Action::ClearCache),
        Binding::new(
            "hide-zero",
            Action::SetPreference(Preference::HideZeroBalances(!prefs.hide_zero_balances)),
        ),
    ];

    let snapshots: Vec<_> = portfolio
        .map(|p| p.exchanges.iter().map(|e| (e, e.total_usd)).collect())
        .unwrap_or_default();

    let exchanges: Vec<ExchangeBalanceView> = order_by_total(snapshots, prefs.hide_zero_balances)
        .into_iter()
        .map(|(exchange, total_usd)| {
            let rows = token_rows(exchange, prefs);
            for row in &rows {
                bindings.push(Binding::new(
                    format!("token-{}-{}", exchange.exchange_id, row.symbol),
                    Action::OpenToken {
                        exchange_id: exchange.exchange_id.clone(),
                        symbol: row.symbol.clone(),
                    },
                ));
            }
            ExchangeBalanceView {
                exchange_id: exchange.exchange_id.clone(),
                name: exchange.name.clone(),
                total: format::format_currency(total_usd, currency),
                total_usd,
                token_summary: token_summary(Some(exchange), prefs),
                success: exchange.success,
                error: exchange.error.clone(),
                rows,
            }
        })
        .collect();

    let error = inline_error(store, ViewKind::Balances);
    if error.is_some() {
        bindings.push(Binding::new("retry", Action::Retry(ViewKind::Balances)));
    }

    BalancesView {
        title: t(lang, "tokenList").to_string(),
        total: format::format_currency(
            portfolio.map(|p| p.summary.total_usd).unwrap_or(0.0),
            currency,
        ),
        token_count: portfolio.map(|p| p.token_count()).unwrap_or(0),
        tokens_with_value: format!(
            "{} {}",
            portfolio.map(|p| p.tokens_with_value()).unwrap_or(0),
            t(lang, "withValue")
        ),
        updated_at: portfolio
            .and_then(|p| p.timestamp.as_ref())
            .map(|ts| format::format_datetime(ts, lang)),
        cache_status: portfolio.map(|p| {
            let key = if p.meta.from_cache { "fromCache" } else { "freshData" };
            t(lang, key).to_string()
        }),
        empty_message: exchanges
            .is_empty()
            .then(|| t(lang, "noData").to_string()),
        exchanges,
        error,
        bindings,
    }
}
