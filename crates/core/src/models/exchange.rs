use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A connected exchange account.
///
/// Created when a link call succeeds, dropped when unlinked, never edited
/// in between. `exchange_id` is opaque and unique per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeLink {
    pub exchange_id: String,

    /// Name shown on cards (e.g. "Binance")
    pub display_name: String,

    /// Backend driver key (e.g. "binance", "gateio")
    pub ccxt_id: String,

    pub is_active: bool,

    pub linked_at: Option<DateTime<Utc>>,

    /// Last time the backend synced this account, when reported.
    pub last_sync: Option<DateTime<Utc>>,
}

/// An exchange the backend can link to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableExchange {
    pub id: String,
    pub name: String,
    pub ccxt_id: String,
    pub description: Option<String>,
}

/// Plain `{message}` acknowledgement returned by mutating endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self.status.to_lowercase().as_str(), "ok" | "healthy" | "up")
    }
}
