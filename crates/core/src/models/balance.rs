use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ticker::TickerPayload;

/// Price-change data fetched lazily after the base snapshot.
///
/// Every field stays `None` until the enrichment pipeline fills it.
/// A fetched `Some(0.0)` is a real "no movement" value, not a placeholder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub change_1h: Option<f64>,
    pub change_4h: Option<f64>,
    pub change_24h: Option<f64>,

    /// Raw ticker kept so the token modal can re-render without a fetch.
    pub ticker: Option<TickerPayload>,
}

impl Enrichment {
    pub fn from_ticker(ticker: TickerPayload) -> Self {
        Self {
            change_1h: ticker.change.change_1h,
            change_4h: ticker.change.change_4h,
            change_24h: ticker.change.change_24h,
            ticker: Some(ticker),
        }
    }

    /// Fold a fetched ticker in. Windows the ticker lacks keep their previous value.
    pub fn merge_ticker(&mut self, ticker: TickerPayload) {
        self.change_1h = ticker.change.change_1h.or(self.change_1h);
        self.change_4h = ticker.change.change_4h.or(self.change_4h);
        self.change_24h = ticker.change.change_24h.or(self.change_24h);
        self.ticker = Some(ticker);
    }

    /// Nothing has been fetched for this token yet.
    pub fn is_empty(&self) -> bool {
        self.change_1h.is_none()
            && self.change_4h.is_none()
            && self.change_24h.is_none()
            && self.ticker.is_none()
    }
}

/// One asset holding within one exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenBalance {
    /// Uppercase symbol, unique within its exchange
    pub symbol: String,

    pub amount: f64,

    /// Zero when the backend has no price for the token
    pub price_usd: f64,

    /// As reported by the backend, never recomputed here. Always `>= 0`.
    pub value_usd: f64,

    #[serde(default)]
    pub enrichment: Enrichment,
}

impl TokenBalance {
    pub fn new(symbol: impl Into<String>, amount: f64, price_usd: f64, value_usd: f64) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            amount,
            price_usd,
            value_usd: value_usd.max(0.0),
            enrichment: Enrichment::default(),
        }
    }

    /// Only tokens with value get enriched and sorted ahead of dust.
    pub fn has_value(&self) -> bool {
        self.value_usd > 0.0
    }
}

/// One exchange's balances at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeBalanceSnapshot {
    pub exchange_id: String,
    pub name: String,
    pub total_usd: f64,
    pub tokens: BTreeMap<String, TokenBalance>,
    pub success: bool,
    pub error: Option<String>,
}

impl ExchangeBalanceSnapshot {
    pub fn new(exchange_id: impl Into<String>, name: impl Into<String>, total_usd: f64) -> Self {
        Self {
            exchange_id: exchange_id.into(),
            name: name.into(),
            total_usd: total_usd.max(0.0),
            tokens: BTreeMap::new(),
            success: true,
            error: None,
        }
    }

    /// Builder-style token insertion, keyed by uppercase symbol.
    pub fn with_token(mut self, token: TokenBalance) -> Self {
        self.tokens.insert(token.symbol.clone(), token);
        self
    }

    pub fn tokens_with_value(&self) -> usize {
        self.tokens.values().filter(|t| t.has_value()).count()
    }

    /// Amount held of `symbol`, or 0.
    pub fn amount_of(&self, symbol: &str) -> f64 {
        self.tokens.get(symbol).map(|t| t.amount).unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_usd: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    /// The backend served this snapshot from its own cache.
    pub from_cache: bool,
}

/// Top-level aggregate produced by every balances fetch.
/// Replaces the previous one wholesale; only token enrichment is carried forward.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub timestamp: Option<DateTime<Utc>>,
    pub summary: PortfolioSummary,
    pub exchanges: Vec<ExchangeBalanceSnapshot>,
    pub meta: SnapshotMeta,
}

impl PortfolioSnapshot {
    pub fn exchange(&self, exchange_id: &str) -> Option<&ExchangeBalanceSnapshot> {
        self.exchanges.iter().find(|e| e.exchange_id == exchange_id)
    }

    pub fn exchange_mut(&mut self, exchange_id: &str) -> Option<&mut ExchangeBalanceSnapshot> {
        self.exchanges.iter_mut().find(|e| e.exchange_id == exchange_id)
    }

    pub fn token(&self, exchange_id: &str, symbol: &str) -> Option<&TokenBalance> {
        self.exchange(exchange_id)?.tokens.get(symbol)
    }

    pub fn token_mut(&mut self, exchange_id: &str, symbol: &str) -> Option<&mut TokenBalance> {
        self.exchange_mut(exchange_id)?.tokens.get_mut(symbol)
    }

    /// Total USD held on one exchange; absent exchanges count as 0.
    pub fn exchange_total(&self, exchange_id: &str) -> f64 {
        self.exchange(exchange_id).map(|e| e.total_usd).unwrap_or(0.0)
    }

    pub fn token_count(&self) -> usize {
        self.exchanges.iter().map(|e| e.tokens.len()).sum()
    }

    pub fn tokens_with_value(&self) -> usize {
        self.exchanges.iter().map(|e| e.tokens_with_value()).sum()
    }

    /// Amount of `symbol` summed across all exchanges (used for BRL/USDT/USDC cards).
    pub fn total_amount_of(&self, symbol: &str) -> f64 {
        self.exchanges.iter().map(|e| e.amount_of(symbol)).sum()
    }
}
