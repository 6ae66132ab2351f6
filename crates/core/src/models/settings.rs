use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::CoreError;

/// Connection and pipeline settings for a dashboard instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Backend root, without the `/api/v1` prefix
    pub base_url: String,

    /// Sent as `user_id` on every request
    pub user_id: String,

    /// Quote currency for ticker lookups
    pub quote_currency: String,

    /// Sent as `currency` on balance requests when set
    pub balances_currency: Option<String>,

    /// Tickers fetched concurrently per batch
    pub enrichment_batch_size: usize,

    /// Pause between two enrichment batches
    pub enrichment_batch_delay_ms: u64,

    /// Period of the background refresh
    pub auto_refresh_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            user_id: "default_user".to_string(),
            quote_currency: "USDT".to_string(),
            balances_currency: None,
            enrichment_batch_size: 5,
            enrichment_batch_delay_ms: 500,
            auto_refresh_secs: 120,
        }
    }
}

impl ClientSettings {
    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let settings: ClientSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.base_url.trim().is_empty() {
            return Err(CoreError::Validation("base_url must not be empty".into()));
        }
        if self.user_id.trim().is_empty() {
            return Err(CoreError::Validation("user_id must not be empty".into()));
        }
        if self.enrichment_batch_size == 0 {
            return Err(CoreError::Validation(
                "enrichment_batch_size must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.enrichment_batch_delay_ms)
    }

    pub fn auto_refresh_period(&self) -> Duration {
        Duration::from_secs(self.auto_refresh_secs.max(1))
    }
}
