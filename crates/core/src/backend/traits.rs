use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::balance::PortfolioSnapshot;
use crate::models::exchange::{ApiMessage, AvailableExchange, ExchangeLink, HealthStatus};
use crate::models::history::{EvolutionSeries, Period};
use crate::models::ticker::TickerPayload;

/// Abstraction over the balance-aggregation backend.
///
/// `HttpBackend` talks to the real REST service; tests and offline hosts
/// plug in their own implementation. Every method returns data already
/// normalized into the internal schema.
///
/// Strict calls return `Result` and propagate failures to the view load
/// that issued them. Tolerant calls (`get_token_ticker`,
/// `get_exchange_details`) return `Option` and never fail: `None` means
/// "no data available for this pair".
#[async_trait]
pub trait BalanceBackend: Send + Sync {
    async fn health(&self) -> Result<HealthStatus, CoreError>;

    async fn get_available_exchanges(&self) -> Result<Vec<AvailableExchange>, CoreError>;

    async fn link_exchange(
        &self,
        exchange_id: &str,
        api_key: &str,
        api_secret: &str,
    ) -> Result<ApiMessage, CoreError>;

    async fn get_linked_exchanges(&self) -> Result<Vec<ExchangeLink>, CoreError>;

    async fn unlink_exchange(&self, exchange_id: &str) -> Result<ApiMessage, CoreError>;

    async fn get_balances(&self, force_refresh: bool) -> Result<PortfolioSnapshot, CoreError>;

    async fn clear_cache(&self) -> Result<ApiMessage, CoreError>;

    async fn get_portfolio_evolution(&self, period: Period) -> Result<EvolutionSeries, CoreError>;

    /// Ticker for one token. Absent for some pairs; never an error.
    async fn get_token_ticker(&self, exchange_id: &str, symbol: &str) -> Option<TickerPayload>;

    /// Free-form exchange metadata (fees, markets). Tolerant like the ticker.
    async fn get_exchange_details(&self, exchange_id: &str) -> Option<serde_json::Value>;

    /// Switch the user the backend requests are made for.
    /// Implementations without a user concept ignore it.
    fn set_user_id(&self, _user_id: &str) {}
}
