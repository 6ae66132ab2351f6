use crate::format;
use crate::i18n::t;
use crate::models::balance::TokenBalance;
use crate::models::preferences::UiPreferences;
use crate::models::ticker::TickerPayload;
use crate::state::store::{AppStore, ModalPhase};

use super::{Action, AssetLabel, Binding, ChangeBadge};

#[derive(Debug, Clone, PartialEq)]
pub struct DailyStatsView {
    pub high: Option<String>,
    pub low: Option<String>,
    pub volume: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenDetailsView {
    /// Ticker price when known, else the snapshot price
    pub price: String,
    pub change_24h: Option<ChangeBadge>,
    pub value: String,
    /// `"0.5 BTC"`
    pub holding: String,
    /// Fetched windows; empty for fiat and stablecoins
    pub changes: Vec<ChangeBadge>,
    pub stats: Option<DailyStatsView>,
    /// No ticker at all for a market-traded token
    pub limited_data: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalBody {
    Loading { message: String },
    Loaded(TokenDetailsView),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenModalView {
    pub symbol: String,
    pub exchange_name: String,
    pub asset_label: Option<AssetLabel>,
    pub body: ModalBody,
    pub bindings: Vec<Binding>,
}

/// Open overlay, or `None` when nothing is open or the token left the snapshot.
///
/// `Loaded` renders the fetched ticker, falling back to the ticker cached on
/// the token by enrichment, then to the snapshot alone.
pub fn render_token_modal(store: &AppStore) -> Option<TokenModalView> {
    let modal = store.active_modal()?;
    let token = store.portfolio()?.token(&modal.exchange_id, &modal.symbol)?;
    let prefs = store.preferences();

    let body = match &modal.phase {
        ModalPhase::Loading => ModalBody::Loading {
            message: t(prefs.language, "loadingData").to_string(),
        },
        ModalPhase::Loaded { ticker } => {
            let ticker = ticker.as_ref().or(token.enrichment.ticker.as_ref());
            ModalBody::Loaded(details(token, ticker, prefs))
        }
    };

    Some(TokenModalView {
        symbol: modal.symbol.clone(),
        exchange_name: modal.exchange_name.clone(),
        asset_label: AssetLabel::for_symbol(&modal.symbol, prefs),
        body,
        bindings: bindings(),
    })
}

fn bindings() -> Vec<Binding> {
    vec![
        Binding::new("modal-close", Action::CloseModal),
        Binding::new("modal-overlay", Action::CloseModal),
    ]
}

fn details(token: &TokenBalance, ticker: Option<&TickerPayload>, prefs: &UiPreferences) -> TokenDetailsView {
    let currency = prefs.display_currency();
    let pegged = AssetLabel::for_symbol(&token.symbol, prefs).is_some();

    let price = ticker
        .and_then(|tk| tk.price.current)
        .filter(|p| *p > 0.0)
        .unwrap_or(token.price_usd);

    let (c1, c4, c24) = match ticker {
        Some(tk) => (tk.change.change_1h, tk.change.change_4h, tk.change.change_24h),
        None => (
            token.enrichment.change_1h,
            token.enrichment.change_4h,
            token.enrichment.change_24h,
        ),
    };

    let changes = if pegged {
        Vec::new()
    } else {
        [("1h", c1), ("4h", c4), ("24h", c24)]
            .into_iter()
            .map(|(window, change)| ChangeBadge::new(window, change, 2))
            .filter(ChangeBadge::is_known)
            .collect()
    };

    let stats = ticker.filter(|tk| tk.has_daily_stats()).map(|tk| DailyStatsView {
        high: tk
            .price
            .high_24h
            .filter(|v| *v > 0.0)
            .map(|v| format::format_token_price(v, currency)),
        low: tk
            .price
            .low_24h
            .filter(|v| *v > 0.0)
            .map(|v| format::format_token_price(v, currency)),
        volume: tk
            .volume
            .quote_24h
            .filter(|v| *v > 0.0)
            .map(|v| format::format_currency(v, currency)),
    });

    TokenDetailsView {
        price: format::format_token_price(price, currency),
        change_24h: Some(ChangeBadge::new("24h", c24, 2)).filter(ChangeBadge::is_known),
        value: format::format_currency(token.value_usd, currency),
        holding: format!("{} {}", format::format_compact(token.amount), token.symbol),
        changes,
        stats,
        limited_data: ticker.is_none() && !pegged,
    }
}
