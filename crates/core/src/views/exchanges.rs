use crate::i18n::t;
use crate::state::store::AppStore;

use super::{inline_error, Action, Binding, ViewKind};

#[derive(Debug, Clone, PartialEq)]
pub struct AvailableExchangeView {
    pub id: String,
    pub name: String,
    pub ccxt_id: String,
    pub description: Option<String>,
    /// Already linked by this user
    pub linked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkedExchangeView {
    pub exchange_id: String,
    pub name: String,
    pub ccxt_id: String,
    pub status: String,
    pub is_active: bool,
    pub linked_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangesView {
    pub available_title: String,
    pub linked_title: String,
    pub available: Vec<AvailableExchangeView>,
    pub linked: Vec<LinkedExchangeView>,
    pub available_empty: Option<String>,
    pub linked_empty: Option<String>,
    pub error: Option<String>,
    pub bindings: Vec<Binding>,
}

pub fn render_exchanges(store: &AppStore) -> ExchangesView {
    let lang = store.preferences().language;
    let mut bindings = Vec::new();

    let linked: Vec<LinkedExchangeView> = store
        .linked_exchanges()
        .iter()
        .map(|link| {
            bindings.push(Binding::new(
                format!("unlink-{}", link.exchange_id),
                Action::UnlinkExchange(link.exchange_id.clone()),
            ));
            LinkedExchangeView {
                exchange_id: link.exchange_id.clone(),
                name: link.display_name.clone(),
                ccxt_id: link.ccxt_id.clone(),
                status: t(lang, if link.is_active { "active" } else { "inactive" }).to_string(),
                is_active: link.is_active,
                linked_at: link
                    .linked_at
                    .map(|at| format!("{}: {}", t(lang, "linkedAt"), at.format("%d/%m/%Y"))),
            }
        })
        .collect();

    let available: Vec<AvailableExchangeView> = store
        .available_exchanges()
        .iter()
        .map(|ex| {
            let linked = store
                .linked_exchanges()
                .iter()
                .any(|l| l.ccxt_id == ex.ccxt_id || l.exchange_id == ex.id);
            bindings.push(Binding::new(
                format!("link-{}", ex.id),
                Action::LinkExchange(ex.id.clone()),
            ));
            AvailableExchangeView {
                id: ex.id.clone(),
                name: ex.name.clone(),
                ccxt_id: ex.ccxt_id.clone(),
                description: ex.description.clone(),
                linked,
            }
        })
        .collect();

    let error = inline_error(store, ViewKind::Exchanges);
    if error.is_some() {
        bindings.push(Binding::new("retry", Action::Retry(ViewKind::Exchanges)));
    }

    ExchangesView {
        available_title: t(lang, "availableExchanges").to_string(),
        linked_title: t(lang, "connectedExchanges").to_string(),
        available_empty: available
            .is_empty()
            .then(|| t(lang, "noAvailableExchanges").to_string()),
        linked_empty: linked
            .is_empty()
            .then(|| t(lang, "noLinkedExchanges").to_string()),
        available,
        linked,
        error,
        bindings,
    }
}
