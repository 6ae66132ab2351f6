use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Url};
use serde_json::{json, Value};
use std::sync::RwLock;

use crate::errors::CoreError;
use crate::models::balance::PortfolioSnapshot;
use crate::models::exchange::{ApiMessage, AvailableExchange, ExchangeLink, HealthStatus};
use crate::models::history::{EvolutionSeries, Period};
use crate::models::settings::ClientSettings;
use crate::models::ticker::TickerPayload;
use super::traits::BalanceBackend;
use super::wire;

const API_PREFIX: [&str; 2] = ["api", "v1"];

/// REST client for the multi-exchange balance service.
///
/// - **Base**: `{base_url}/api/v1`, except `/health` at the root.
/// - **Identity**: every request carries the current `user_id`
///   (query string for reads, JSON body for mutations).
/// - **Failures**: a non-JSON response means the endpoint does not exist
///   on this backend version; non-2xx JSON bodies carry an `error` field.
pub struct HttpBackend {
    client: Client,
    base_url: Url,
    user_id: RwLock<String>,
    quote_currency: String,
    balances_currency: Option<String>,
}

impl HttpBackend {
    pub fn new(settings: &ClientSettings) -> Result<Self, CoreError> {
        settings.validate()?;
        let base_url = Url::parse(settings.base_url.trim()).map_err(|e| {
            CoreError::Validation(format!("Invalid base_url '{}': {e}", settings.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(CoreError::Validation(format!(
                "base_url '{}' cannot carry a path",
                settings.base_url
            )));
        }

        Ok(Self {
            client: Client::builder().build()?,
            base_url,
            user_id: RwLock::new(settings.user_id.trim().to_string()),
            quote_currency: settings.quote_currency.to_uppercase(),
            balances_currency: settings
                .balances_currency
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_uppercase),
        })
    }

    pub fn user_id(&self) -> String {
        self.user_id.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// `{base}/[api/v1/]{segments...}`. Segments are percent-encoded,
    /// so ids and symbols are passed verbatim.
    fn path(&self, api: bool, segments: &[&str]) -> Result<Url, CoreError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| CoreError::Validation("base_url cannot carry a path".into()))?;
            path.pop_if_empty();
            if api {
                path.extend(API_PREFIX);
            }
            path.extend(segments);
        }
        Ok(url)
    }

    /// API url for a read: `user_id` first, then `query`.
    fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<Url, CoreError> {
        let mut url = self.path(true, segments)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("user_id", &self.user_id());
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Send a request and return the JSON body of a 2xx response.
    async fn request(
        &self,
        method: Method,
        url: Url,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, CoreError> {
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);
        if !is_json {
            return Err(CoreError::UnavailableEndpoint(endpoint.to_string()));
        }

        let text = response.text().await?;
        let payload: Value = serde_json::from_str(&text)?;

        if !status.is_success() {
            let message = wire::error_message(&payload).unwrap_or_else(|| {
                format!("HTTP error! status: {}", status.as_u16())
            });
            return Err(CoreError::from_status(status.as_u16(), endpoint, message));
        }
        Ok(payload)
    }

    async fn get(&self, endpoint: &str, url: Url) -> Result<Value, CoreError> {
        let result = self.request(Method::GET, url, endpoint, None).await;
        if let Err(e) = &result {
            log::error!("API error ({endpoint}): {e}");
        }
        result
    }

    /// GET that maps every failure to `None`. Failures outside the
    /// request taxonomy are still swallowed, but logged louder.
    async fn get_tolerant(&self, endpoint: &str, url: Url) -> Option<Value> {
        match self.request(Method::GET, url, endpoint, None).await {
            Ok(body) => Some(body),
            Err(e) if e.is_tolerable() => {
                log::debug!("Tolerated failure ({endpoint}): {e}");
                None
            }
            Err(e) => {
                log::warn!("Unexpected failure on tolerant fetch ({endpoint}): {e}");
                None
            }
        }
    }

    /// Mutations identify the user in the JSON body instead of the query string.
    async fn mutate(
        &self,
        method: Method,
        endpoint: &str,
        segments: &[&str],
        mut body: Value,
    ) -> Result<ApiMessage, CoreError> {
        let url = self.path(true, segments)?;
        if let Value::Object(map) = &mut body {
            map.insert("user_id".to_string(), Value::String(self.user_id()));
        }

        match self.request(method, url, endpoint, Some(body)).await {
            Ok(payload) => Ok(wire::parse_message(&payload)),
            Err(e) => {
                log::error!("API error ({endpoint}): {e}");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl BalanceBackend for HttpBackend {
    async fn health(&self) -> Result<HealthStatus, CoreError> {
        let url = self.path(false, &["health"])?;
        let body = self.get("/health", url).await?;
        Ok(wire::parse_health(&body))
    }

    async fn get_available_exchanges(&self) -> Result<Vec<AvailableExchange>, CoreError> {
        let url = self.url(&["exchanges", "available"], &[])?;
        let body = self.get("/exchanges/available", url).await?;
        wire::parse_available_exchanges(body)
    }

    async fn link_exchange(
        &self,
        exchange_id: &str,
        api_key: &str,
        api_secret: &str,
    ) -> Result<ApiMessage, CoreError> {
        let body = json!({
            "exchange_id": exchange_id,
            "api_key": api_key,
            "api_secret": api_secret,
        });
        let message = self
            .mutate(Method::POST, "/exchanges/link", &["exchanges", "link"], body)
            .await?;
        log::info!("Linked exchange {exchange_id}");
        Ok(message)
    }

    async fn get_linked_exchanges(&self) -> Result<Vec<ExchangeLink>, CoreError> {
        let url = self.url(&["exchanges", "linked"], &[])?;
        let body = self.get("/exchanges/linked", url).await?;
        wire::parse_linked_exchanges(body)
    }

    async fn unlink_exchange(&self, exchange_id: &str) -> Result<ApiMessage, CoreError> {
        let body = json!({ "exchange_id": exchange_id });
        let message = self
            .mutate(Method::DELETE, "/exchanges/unlink", &["exchanges", "unlink"], body)
            .await?;
        log::info!("Unlinked exchange {exchange_id}");
        Ok(message)
    }

    async fn get_balances(&self, force_refresh: bool) -> Result<PortfolioSnapshot, CoreError> {
        let mut query: Vec<(&str, &str)> = Vec::new();
        if force_refresh {
            query.push(("force_refresh", "true"));
        }
        if let Some(currency) = &self.balances_currency {
            query.push(("currency", currency.as_str()));
        }
        let url = self.url(&["balances"], &query)?;
        let body = self.get("/balances", url).await?;
        let snapshot = wire::parse_balances(body)?;
        log::debug!(
            "Fetched balances: {} exchanges, {} tokens (from_cache={})",
            snapshot.exchanges.len(),
            snapshot.token_count(),
            snapshot.meta.from_cache
        );
        Ok(snapshot)
    }

    async fn clear_cache(&self) -> Result<ApiMessage, CoreError> {
        self.mutate(
            Method::POST,
            "/balances/clear-cache",
            &["balances", "clear-cache"],
            json!({}),
        )
        .await
    }

    async fn get_portfolio_evolution(&self, period: Period) -> Result<EvolutionSeries, CoreError> {
        let url = self.url(
            &["balances", "history", "evolution"],
            &[("period", period.as_str())],
        )?;
        let body = self.get("/balances/history/evolution", url).await?;
        wire::parse_evolution(body, period)
    }

    async fn get_token_ticker(&self, exchange_id: &str, symbol: &str) -> Option<TickerPayload> {
        let url = match self.url(
            &["exchanges", exchange_id, "token", symbol],
            &[("quote", self.quote_currency.as_str())],
        ) {
            Ok(url) => url,
            Err(e) => {
                log::debug!("Cannot build ticker url for {symbol}@{exchange_id}: {e}");
                return None;
            }
        };
        let body = self
            .get_tolerant("/exchanges/{id}/token/{symbol}", url)
            .await?;
        wire::parse_ticker(body)
    }

    async fn get_exchange_details(&self, exchange_id: &str) -> Option<Value> {
        let url = self.url(&["exchanges", exchange_id], &[]).ok()?;
        self.get_tolerant("/exchanges/{id}", url).await
    }

    fn set_user_id(&self, user_id: &str) {
        let trimmed = user_id.trim();
        if trimmed.is_empty() {
            log::warn!("Ignoring empty user id");
            return;
        }
        *self.user_id.write().unwrap_or_else(|e| e.into_inner()) = trimmed.to_string();
    }
}
