//! Wire DTOs for the balance-aggregation API and their normalization.
//!
//! The backend is loose about shapes: numbers arrive as strings, the
//! exchange list endpoints key their array as `exchanges` on some versions,
//! and timestamps come with or without a timezone. Everything is
//! normalized here so the rest of the crate only sees the internal schema.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::errors::CoreError;
use crate::models::balance::{
    ExchangeBalanceSnapshot, PortfolioSnapshot, PortfolioSummary, SnapshotMeta, TokenBalance,
};
use crate::models::exchange::{ApiMessage, AvailableExchange, ExchangeLink, HealthStatus};
use crate::models::history::{EvolutionPoint, EvolutionSeries, EvolutionSummary, Period};
use crate::models::ticker::{ChangeWindows, TickerPayload, TickerPrice, TickerVolume};

// ── Lenient scalars ─────────────────────────────────────────────────

/// Read a finite number from a JSON number or numeric string.
pub fn number_from_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|x| x.is_finite())
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

/// Parse the timestamp formats the backend emits:
/// RFC 3339, naive ISO-8601 (assumed UTC), `YYYY-MM-DD HH:MM:SS`, or a bare date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, pattern) {
            return Some(naive.and_utc());
        }
    }
    // "2024-05" is how the 1y evolution labels months
    let padded = if raw.len() == 7 { format!("{raw}-01") } else { raw.to_string() };
    NaiveDate::parse_from_str(&padded, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => {
            let raw = n.as_i64()?;
            // Epoch milliseconds past 2001-09, seconds before
            if raw.abs() >= 1_000_000_000_000 {
                DateTime::from_timestamp_millis(raw)
            } else {
                DateTime::from_timestamp(raw, 0)
            }
        }
        _ => None,
    }
}

fn optional_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.as_deref().and_then(parse_timestamp)
}

// ── Exchanges ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawAvailableResponse {
    #[serde(default)]
    available_exchanges: Option<Vec<RawAvailableExchange>>,
    #[serde(default)]
    exchanges: Option<Vec<RawAvailableExchange>>,
}

#[derive(Deserialize)]
struct RawAvailableExchange {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    object_id: Option<String>,
    #[serde(default)]
    exchange_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    ccxt_id: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// `GET /exchanges/available`. Accepts `available_exchanges` or `exchanges`.
pub fn parse_available_exchanges(body: Value) -> Result<Vec<AvailableExchange>, CoreError> {
    let raw: RawAvailableResponse = serde_json::from_value(body)?;
    let entries = raw.available_exchanges.or(raw.exchanges).unwrap_or_default();

    Ok(entries
        .into_iter()
        .filter_map(|e| {
            let id = e.id.or(e.exchange_id).or(e.object_id).or_else(|| e.ccxt_id.clone());
            let Some(id) = id else {
                log::warn!("Skipping available exchange without an id");
                return None;
            };
            let ccxt_id = e
                .ccxt_id
                .or_else(|| e.name.as_ref().map(|n| n.to_lowercase()))
                .unwrap_or_else(|| id.clone());
            Some(AvailableExchange {
                name: e.name.unwrap_or_else(|| ccxt_id.clone()),
                id,
                ccxt_id,
                description: e.description,
            })
        })
        .collect())
}

#[derive(Deserialize)]
struct RawLinkedResponse {
    #[serde(default)]
    linked_exchanges: Option<Vec<RawLinkedExchange>>,
    #[serde(default)]
    exchanges: Option<Vec<RawBackendExchange>>,
}

/// The shape the dashboard expects.
#[derive(Deserialize)]
struct RawLinkedExchange {
    exchange_id: String,
    #[serde(default)]
    exchange_name: Option<String>,
    #[serde(default)]
    ccxt_id: Option<String>,
    #[serde(default)]
    is_active: Option<bool>,
    #[serde(default)]
    linked_at: Option<String>,
    #[serde(default)]
    last_sync: Option<String>,
}

/// The shape newer backends actually send under `exchanges`.
#[derive(Deserialize)]
struct RawBackendExchange {
    exchange_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    ccxt_id: Option<String>,
    #[serde(default)]
    linked_at: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

/// `GET /exchanges/linked`. Derives `linked_exchanges` from `exchanges` when needed;
/// that shape carries no `is_active`, so those links count as active.
pub fn parse_linked_exchanges(body: Value) -> Result<Vec<ExchangeLink>, CoreError> {
    let raw: RawLinkedResponse = serde_json::from_value(body)?;

    if let Some(linked) = raw.linked_exchanges {
        return Ok(linked
            .into_iter()
            .map(|e| {
                let ccxt_id = e.ccxt_id.unwrap_or_else(|| e.exchange_id.clone());
                ExchangeLink {
                    display_name: e.exchange_name.unwrap_or_else(|| ccxt_id.clone()),
                    ccxt_id,
                    is_active: e.is_active.unwrap_or(true),
                    linked_at: optional_timestamp(e.linked_at),
                    last_sync: optional_timestamp(e.last_sync),
                    exchange_id: e.exchange_id,
                }
            })
            .collect());
    }

    Ok(raw
        .exchanges
        .unwrap_or_default()
        .into_iter()
        .map(|e| {
            let ccxt_id = e.ccxt_id.unwrap_or_else(|| e.exchange_id.clone());
            ExchangeLink {
                display_name: e.name.unwrap_or_else(|| ccxt_id.clone()),
                ccxt_id,
                is_active: true,
                linked_at: optional_timestamp(e.linked_at),
                last_sync: optional_timestamp(e.updated_at),
                exchange_id: e.exchange_id,
            }
        })
        .collect())
}

// ── Balances ────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawBalances {
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    summary: Option<RawBalanceSummary>,
    #[serde(default)]
    exchanges: Option<Vec<RawExchangeBalance>>,
    #[serde(default)]
    meta: Option<RawMeta>,
}

#[derive(Deserialize)]
struct RawBalanceSummary {
    #[serde(default, deserialize_with = "lenient_f64")]
    total_usd: Option<f64>,
}

#[derive(Deserialize)]
struct RawMeta {
    #[serde(default)]
    from_cache: Option<bool>,
}

#[derive(Deserialize)]
struct RawExchangeBalance {
    exchange_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    total_usd: Option<f64>,
    #[serde(default)]
    tokens: Option<BTreeMap<String, RawToken>>,
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct RawToken {
    #[serde(default, deserialize_with = "lenient_f64")]
    amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    price_usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    value_usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    change_1h: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    change_4h: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    change_24h: Option<f64>,
}

fn non_negative(value: Option<f64>, what: &str) -> f64 {
    match value {
        Some(v) if v < 0.0 => {
            log::warn!("Backend reported negative {what} ({v}); clamping to 0");
            0.0
        }
        Some(v) => v,
        None => 0.0,
    }
}

/// `GET /balances`. Symbols are uppercased; negative values clamp to zero.
/// A missing summary total is rebuilt from the exchange totals.
pub fn parse_balances(body: Value) -> Result<PortfolioSnapshot, CoreError> {
    let raw: RawBalances = serde_json::from_value(body)?;

    let exchanges: Vec<ExchangeBalanceSnapshot> = raw
        .exchanges
        .unwrap_or_default()
        .into_iter()
        .map(|ex| {
            let tokens = ex
                .tokens
                .unwrap_or_default()
                .into_iter()
                .map(|(symbol, t)| {
                    let mut token = TokenBalance::new(
                        symbol,
                        t.amount.unwrap_or(0.0),
                        t.price_usd.unwrap_or(0.0),
                        non_negative(t.value_usd, "token value"),
                    );
                    token.enrichment.change_1h = t.change_1h;
                    token.enrichment.change_4h = t.change_4h;
                    token.enrichment.change_24h = t.change_24h;
                    (token.symbol.clone(), token)
                })
                .collect();

            ExchangeBalanceSnapshot {
                name: ex.name.unwrap_or_else(|| ex.exchange_id.clone()),
                total_usd: non_negative(ex.total_usd, "exchange total"),
                tokens,
                success: ex.success.unwrap_or(ex.error.is_none()),
                error: ex.error,
                exchange_id: ex.exchange_id,
            }
        })
        .collect();

    let total_usd = match raw.summary.and_then(|s| s.total_usd) {
        Some(total) => total.max(0.0),
        None => exchanges.iter().map(|e| e.total_usd).sum(),
    };

    Ok(PortfolioSnapshot {
        timestamp: optional_timestamp(raw.timestamp),
        summary: PortfolioSummary { total_usd },
        exchanges,
        meta: SnapshotMeta {
            from_cache: raw.meta.and_then(|m| m.from_cache).unwrap_or(false),
        },
    })
}

// ── History ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawEvolutionResponse {
    #[serde(default)]
    evolution: Option<RawEvolution>,
}

#[derive(Deserialize)]
struct RawEvolution {
    #[serde(default)]
    timestamps: Vec<Value>,
    #[serde(default)]
    values_usd: Vec<Value>,
    #[serde(default)]
    values_brl: Option<Vec<Value>>,
    #[serde(default)]
    summary: Option<RawEvolutionSummary>,
}

#[derive(Deserialize)]
struct RawEvolutionSummary {
    #[serde(default, deserialize_with = "lenient_f64")]
    start_value_usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    end_value_usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    change_usd: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    change_percent: Option<f64>,
}

/// `GET /balances/history/evolution`. The backend sends parallel arrays
/// (`timestamps`, `values_usd`, `values_brl`); they are zipped into points.
pub fn parse_evolution(body: Value, period: Period) -> Result<EvolutionSeries, CoreError> {
    let raw: RawEvolutionResponse = serde_json::from_value(body)?;
    let Some(evolution) = raw.evolution else {
        return Ok(EvolutionSeries {
            period,
            points: Vec::new(),
            summary: EvolutionSummary::default(),
        });
    };

    let points = evolution
        .timestamps
        .iter()
        .enumerate()
        .map(|(i, ts)| EvolutionPoint {
            timestamp: timestamp_from_value(ts),
            total_usd: evolution
                .values_usd
                .get(i)
                .and_then(number_from_value)
                .unwrap_or(0.0),
            total_brl: evolution
                .values_brl
                .as_ref()
                .and_then(|values| values.get(i))
                .and_then(number_from_value),
        })
        .collect();

    let summary = evolution
        .summary
        .map(|s| EvolutionSummary {
            start_value: s.start_value_usd.unwrap_or(0.0),
            end_value: s.end_value_usd.unwrap_or(0.0),
            change_usd: s.change_usd.unwrap_or(0.0),
            change_percent: s.change_percent.unwrap_or(0.0),
        })
        .unwrap_or_default();

    Ok(EvolutionSeries {
        period,
        points,
        summary,
    })
}

// ── Ticker ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RawTicker {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    price: Option<RawTickerPrice>,
    #[serde(default)]
    change: Option<BTreeMap<String, RawChangeWindow>>,
    #[serde(default)]
    volume: Option<RawTickerVolume>,
}

#[derive(Deserialize)]
struct RawTickerPrice {
    #[serde(default, deserialize_with = "lenient_f64")]
    current: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    last: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    high_24h: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    low_24h: Option<f64>,
}

#[derive(Deserialize)]
struct RawChangeWindow {
    #[serde(default, deserialize_with = "lenient_f64")]
    price_change_percent: Option<f64>,
}

#[derive(Deserialize)]
struct RawTickerVolume {
    #[serde(default, deserialize_with = "lenient_f64")]
    base_24h: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    quote_24h: Option<f64>,
}

/// `GET /exchanges/{id}/token/{symbol}`. A body without a symbol is "no ticker".
pub fn parse_ticker(body: Value) -> Option<TickerPayload> {
    let raw: RawTicker = match serde_json::from_value(body) {
        Ok(raw) => raw,
        Err(e) => {
            log::debug!("Unreadable ticker payload: {e}");
            return None;
        }
    };

    let symbol = raw.symbol.filter(|s| !s.trim().is_empty())?;
    let window = |key: &str| {
        raw.change
            .as_ref()
            .and_then(|c| c.get(key))
            .and_then(|w| w.price_change_percent)
    };
    let price = raw.price.as_ref();
    let volume = raw.volume.as_ref();

    Some(TickerPayload {
        symbol,
        price: TickerPrice {
            current: price.and_then(|p| p.current.or(p.last)),
            high_24h: price.and_then(|p| p.high_24h),
            low_24h: price.and_then(|p| p.low_24h),
        },
        change: ChangeWindows {
            change_1h: window("1h"),
            change_4h: window("4h"),
            change_24h: window("24h"),
        },
        volume: TickerVolume {
            base_24h: volume.and_then(|v| v.base_24h),
            quote_24h: volume.and_then(|v| v.quote_24h),
        },
    })
}

// ── Misc ────────────────────────────────────────────────────────────

pub fn parse_message(body: &Value) -> ApiMessage {
    ApiMessage::new(
        body.get("message")
            .and_then(Value::as_str)
            .unwrap_or_default(),
    )
}

pub fn parse_health(body: &Value) -> HealthStatus {
    HealthStatus {
        status: body
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("ok")
            .to_string(),
    }
}

/// Error text of a non-2xx JSON body.
pub fn error_message(body: &Value) -> Option<String> {
    body.get("error")
        .or_else(|| body.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}
