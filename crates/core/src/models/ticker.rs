use serde::{Deserialize, Serialize};

/// Price block of a ticker, all values in the quote currency (USDT).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerPrice {
    pub current: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
}

/// Percentage price change over the three windows the backend reports.
/// `None` means the backend did not report that window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeWindows {
    pub change_1h: Option<f64>,
    pub change_4h: Option<f64>,
    pub change_24h: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerVolume {
    pub base_24h: Option<f64>,
    pub quote_24h: Option<f64>,
}

/// Normalized ticker for one `(exchange, symbol)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerPayload {
    pub symbol: String,
    pub price: TickerPrice,
    pub change: ChangeWindows,
    pub volume: TickerVolume,
}

impl TickerPayload {
    /// True when at least one of high/low/volume is a positive number.
    pub fn has_daily_stats(&self) -> bool {
        [self.price.high_24h, self.price.low_24h, self.volume.quote_24h]
            .iter()
            .any(|v| v.is_some_and(|x| x > 0.0))
    }
}
