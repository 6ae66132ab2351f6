use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Loading-bar band reserved for ticker enrichment (the first half covers the base load).
const PROGRESS_BASE_PERCENT: f64 = 50.0;
const PROGRESS_SPAN_PERCENT: f64 = 45.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeProgress {
    pub total: usize,
    pub loaded: usize,
}

/// Transient enrichment counters for one dashboard load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentProgress {
    pub total_expected: usize,
    pub total_loaded: usize,
    pub exchanges: BTreeMap<String, ExchangeProgress>,
}

impl EnrichmentProgress {
    /// Register an exchange's expected token count.
    /// Registering the same exchange twice in one load is ignored.
    pub fn register_exchange(&mut self, exchange_id: &str, expected: usize) {
        if self.exchanges.contains_key(exchange_id) {
            return;
        }
        self.exchanges.insert(
            exchange_id.to_string(),
            ExchangeProgress {
                total: expected,
                loaded: 0,
            },
        );
        self.total_expected += expected;
    }

    pub fn record_loaded(&mut self, exchange_id: &str) {
        self.total_loaded += 1;
        self.exchanges.entry(exchange_id.to_string()).or_default().loaded += 1;
    }

    pub fn fraction(&self) -> f64 {
        if self.total_expected == 0 {
            return 1.0;
        }
        (self.total_loaded as f64 / self.total_expected as f64).min(1.0)
    }

    /// Position of the loading bar, in the 50..=95 band.
    pub fn loading_percent(&self) -> u8 {
        (PROGRESS_BASE_PERCENT + self.fraction() * PROGRESS_SPAN_PERCENT).round() as u8
    }

    pub fn is_complete(&self) -> bool {
        self.total_loaded >= self.total_expected
    }
}
