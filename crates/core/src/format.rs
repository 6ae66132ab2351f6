//! Display formatting for amounts, prices, percentages and dates.
//!
//! Every function is pure. The only input besides the value is the display
//! currency, which callers read from the current `UiPreferences`.

use chrono::{DateTime, Datelike, Utc};

use crate::i18n;
use crate::models::history::LabelGranularity;
use crate::models::preferences::{DisplayCurrency, Language};

/// Fixed, published USD → BRL rate for the alternate currency display.
/// Toggling the currency converts with this rate; it never triggers a fetch.
pub const ALTERNATE_CURRENCY_RATE: f64 = 5.07;

/// Upper bound on decimals shown for sub-unit token prices.
const MAX_PRICE_DECIMALS: usize = 10;

/// Significant digits kept after the first non-zero decimal of a small price.
const SMALL_PRICE_SIGNIFICANT: usize = 6;

/// Placeholder for a value that is unknown (not fetched, not finite).
pub const UNKNOWN: &str = "—";

/// Convert a USD amount into the display currency.
pub fn convert(value_usd: f64, currency: DisplayCurrency) -> f64 {
    match currency {
        DisplayCurrency::Usd => value_usd,
        DisplayCurrency::Brl => value_usd * ALTERNATE_CURRENCY_RATE,
    }
}

/// Format a USD amount in the display currency with 2 decimals.
///
/// `1234.5` → `$1,234.50` (USD) or `R$ 6.258,92` (BRL).
pub fn format_currency(value_usd: f64, currency: DisplayCurrency) -> String {
    format_money(convert(value_usd, currency), currency, 2, 2)
}

/// Format an amount already denominated in `currency`, without conversion.
/// Used for balances held in that currency (BRL on the exchange, USDT, USDC).
pub fn format_native(amount: f64, currency: DisplayCurrency) -> String {
    format_money(amount, currency, 2, 2)
}

/// Like [`format_currency`] but always prefixes a sign (`+$12.00`, `-$3.10`).
pub fn format_signed_currency(value_usd: f64, currency: DisplayCurrency) -> String {
    let formatted = format_currency(value_usd, currency);
    if value_usd >= 0.0 {
        format!("+{formatted}")
    } else {
        formatted
    }
}

/// Format a unit price, keeping enough decimals for sub-cent tokens.
///
/// Prices below 1 show up to six significant decimals after the leading
/// zeros, capped at ten decimals, so `0.0000003` never renders as `0.00`.
pub fn format_token_price(price_usd: f64, currency: DisplayCurrency) -> String {
    let value = convert(price_usd, currency);
    if !value.is_finite() || value == 0.0 {
        return format_money(0.0, currency, 2, 2);
    }
    format_money(value, currency, 2, price_decimals(value))
}

/// Decimals needed to show a price without collapsing it to zero.
pub fn price_decimals(value: f64) -> usize {
    let abs = value.abs();
    if abs >= 1.0 || abs == 0.0 {
        return 2;
    }
    let digits = format!("{abs:.20}");
    let fraction = digits.split('.').nth(1).unwrap_or("");
    match fraction.find(|c: char| c != '0') {
        Some(first_non_zero) => {
            (first_non_zero + SMALL_PRICE_SIGNIFICANT).clamp(2, MAX_PRICE_DECIMALS)
        }
        None => 2,
    }
}

/// `+1.23%`, `-0.40%`, `0.00%`, or `—` when unknown.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let sign = if v > 0.0 { "+" } else { "" };
            format!("{sign}{v:.2}%")
        }
        _ => UNKNOWN.to_string(),
    }
}

/// Arrow badge text for a price change: `▲1.2%` / `▼0.8%`.
pub fn format_change(value: f64, decimals: usize) -> String {
    let arrow = if value >= 0.0 { '▲' } else { '▼' };
    format!("{arrow}{:.*}%", decimals, value.abs())
}

/// Compact amount: `1.50M`, `12.30K`, or up to 8 decimals with trailing zeros dropped.
pub fn format_compact(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return "0".to_string();
    }
    if value >= 1_000_000.0 {
        return format!("{:.2}M", value / 1_000_000.0);
    }
    if value >= 1_000.0 {
        return format!("{:.2}K", value / 1_000.0);
    }
    let fixed = format!("{value:.8}");
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Full timestamp in the language's customary order.
pub fn format_datetime(timestamp: &DateTime<Utc>, language: Language) -> String {
    let pattern = match language {
        Language::Portuguese => "%d/%m/%Y %H:%M:%S",
        Language::English => "%m/%d/%Y %H:%M:%S",
    };
    timestamp.format(pattern).to_string()
}

/// Chart axis label for a history point.
pub fn format_chart_label(
    timestamp: &DateTime<Utc>,
    granularity: LabelGranularity,
    language: Language,
) -> String {
    match granularity {
        LabelGranularity::Hour => timestamp.format("%H:%M").to_string(),
        LabelGranularity::Day => timestamp.format("%d/%m").to_string(),
        LabelGranularity::Month => format!(
            "{}/{}",
            i18n::month_abbrev(language, timestamp.month()),
            timestamp.format("%y")
        ),
    }
}

// ── Internal ────────────────────────────────────────────────────────

fn format_money(value: f64, currency: DisplayCurrency, min_decimals: usize, max_decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let fixed = format!("{:.*}", max_decimals, value.abs());
    let fixed = trim_fraction(&fixed, min_decimals);

    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let (group_sep, decimal_sep) = match currency {
        DisplayCurrency::Usd => (',', '.'),
        DisplayCurrency::Brl => ('.', ','),
    };

    let mut body = group_thousands(int_part, group_sep);
    if let Some(frac) = frac_part {
        body.push(decimal_sep);
        body.push_str(frac);
    }

    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    match currency {
        DisplayCurrency::Usd => format!("{sign}${body}"),
        DisplayCurrency::Brl => format!("{sign}R$ {body}"),
    }
}

/// Drop trailing zeros from the fraction while keeping at least `min_decimals`.
fn trim_fraction(fixed: &str, min_decimals: usize) -> String {
    let Some((int_part, frac)) = fixed.split_once('.') else {
        return fixed.to_string();
    };
    let mut frac = frac.trim_end_matches('0').to_string();
    while frac.len() < min_decimals {
        frac.push('0');
    }
    if frac.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac}")
    }
}

fn group_thousands(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}
