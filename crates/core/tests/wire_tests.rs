// ═══════════════════════════════════════════════════════════════════
// Wire Tests — response normalization, lenient scalars, HttpBackend over HTTP
// ═══════════════════════════════════════════════════════════════════

use chrono::{Datelike, Timelike};
use serde_json::json;

use exchange_dashboard_core::backend::http::HttpBackend;
use exchange_dashboard_core::backend::wire;
use exchange_dashboard_core::errors::CoreError;
use exchange_dashboard_core::models::history::Period;
use exchange_dashboard_core::models::settings::ClientSettings;

// ── Lenient scalars ─────────────────────────────────────────────────

mod scalars {
    use super::*;

    #[test]
    fn numbers_and_numeric_strings() {
        assert_eq!(wire::number_from_value(&json!(12.5)), Some(12.5));
        assert_eq!(wire::number_from_value(&json!(" 3.25 ")), Some(3.25));
        assert_eq!(wire::number_from_value(&json!("abc")), None);
        assert_eq!(wire::number_from_value(&json!(null)), None);
        assert_eq!(wire::number_from_value(&json!(true)), None);
    }

    #[test]
    fn timestamps_with_and_without_zone() {
        let zoned = wire::parse_timestamp("2024-05-01T12:30:00+02:00").unwrap();
        assert_eq!(zoned.hour(), 10);

        let naive = wire::parse_timestamp("2024-05-01T12:30:00.123").unwrap();
        assert_eq!(naive.hour(), 12);

        let spaced = wire::parse_timestamp("2024-05-01 08:00:00").unwrap();
        assert_eq!(spaced.hour(), 8);
    }

    #[test]
    fn month_and_date_labels() {
        let month = wire::parse_timestamp("2024-05").unwrap();
        assert_eq!((month.year(), month.month(), month.day()), (2024, 5, 1));

        let date = wire::parse_timestamp("2024-12-31").unwrap();
        assert_eq!(date.day(), 31);

        assert!(wire::parse_timestamp("yesterday").is_none());
    }
}

// ── Exchanges ───────────────────────────────────────────────────────

mod exchanges {
    use super::*;

    #[test]
    fn available_under_either_key() {
        let a = wire::parse_available_exchanges(json!({
            "available_exchanges": [{"id": "x1", "name": "Binance", "ccxt_id": "binance"}]
        }))
        .unwrap();
        let b = wire::parse_available_exchanges(json!({
            "exchanges": [{"_id": "x1", "name": "Binance", "ccxt_id": "binance"}]
        }))
        .unwrap();

        assert_eq!(a, b);
        assert_eq!(a[0].id, "x1");
        assert_eq!(a[0].ccxt_id, "binance");
    }

    #[test]
    fn available_without_any_id_is_skipped() {
        let list = wire::parse_available_exchanges(json!({
            "exchanges": [
                {"description": "nameless"},
                {"name": "Gate.io", "ccxt_id": "gateio"}
            ]
        }))
        .unwrap();

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "gateio");
        assert_eq!(list[0].name, "Gate.io");
    }

    #[test]
    fn available_missing_list_is_empty() {
        assert!(wire::parse_available_exchanges(json!({})).unwrap().is_empty());
    }

    #[test]
    fn linked_native_shape() {
        let links = wire::parse_linked_exchanges(json!({
            "linked_exchanges": [{
                "exchange_id": "abc",
                "exchange_name": "Binance",
                "ccxt_id": "binance",
                "is_active": false,
                "linked_at": "2024-01-02T03:04:05Z"
            }]
        }))
        .unwrap();

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].display_name, "Binance");
        assert!(!links[0].is_active);
        assert!(links[0].linked_at.is_some());
    }

    #[test]
    fn linked_derived_from_exchanges_shape() {
        let links = wire::parse_linked_exchanges(json!({
            "exchanges": [{
                "exchange_id": "abc",
                "name": "MEXC",
                "ccxt_id": "mexc",
                "updated_at": "2024-03-01T00:00:00"
            }]
        }))
        .unwrap();

        assert_eq!(links[0].display_name, "MEXC");
        assert!(links[0].is_active);
        assert!(links[0].last_sync.is_some());
    }
}

// ── Balances ────────────────────────────────────────────────────────

mod balances {
    use super::*;

    fn body() -> serde_json::Value {
        json!({
            "timestamp": "2024-06-01T10:00:00Z",
            "summary": {"total_usd": "30010.5"},
            "meta": {"from_cache": true},
            "exchanges": [{
                "exchange_id": "a",
                "name": "Binance",
                "total_usd": 30010.5,
                "success": true,
                "tokens": {
                    "btc": {"amount": 0.5, "price_usd": 60000, "value_usd": 30000, "change_24h": "2.5"},
                    "DUST": {"amount": 1, "price_usd": 0, "value_usd": -3}
                }
            }]
        })
    }

    #[test]
    fn symbols_are_uppercased() {
        let snapshot = wire::parse_balances(body()).unwrap();
        let btc = snapshot.token("a", "BTC").unwrap();
        assert_eq!(btc.symbol, "BTC");
        assert_eq!(btc.value_usd, 30000.0);
        assert_eq!(btc.enrichment.change_24h, Some(2.5));
        assert_eq!(btc.enrichment.change_1h, None);
    }

    #[test]
    fn negative_values_clamp_to_zero() {
        let snapshot = wire::parse_balances(body()).unwrap();
        assert_eq!(snapshot.token("a", "DUST").unwrap().value_usd, 0.0);
    }

    #[test]
    fn summary_and_meta() {
        let snapshot = wire::parse_balances(body()).unwrap();
        assert_eq!(snapshot.summary.total_usd, 30010.5);
        assert!(snapshot.meta.from_cache);
        assert!(snapshot.timestamp.is_some());
    }

    #[test]
    fn missing_summary_sums_exchanges() {
        let snapshot = wire::parse_balances(json!({
            "exchanges": [
                {"exchange_id": "a", "total_usd": 10},
                {"exchange_id": "b", "total_usd": 5.5}
            ]
        }))
        .unwrap();
        assert_eq!(snapshot.summary.total_usd, 15.5);
        assert_eq!(snapshot.exchanges[1].name, "b");
    }

    #[test]
    fn exchange_error_marks_failure() {
        let snapshot = wire::parse_balances(json!({
            "exchanges": [{"exchange_id": "a", "error": "Invalid API key"}]
        }))
        .unwrap();
        let ex = &snapshot.exchanges[0];
        assert!(!ex.success);
        assert_eq!(ex.error.as_deref(), Some("Invalid API key"));
        assert!(ex.tokens.is_empty());
    }

    #[test]
    fn wrong_shape_is_a_deserialization_error() {
        let err = wire::parse_balances(json!({"exchanges": "nope"})).unwrap_err();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }
}

// ── History ─────────────────────────────────────────────────────────

mod history {
    use super::*;

    #[test]
    fn parallel_arrays_are_zipped() {
        let series = wire::parse_evolution(
            json!({
                "evolution": {
                    "timestamps": ["2024-05-01T00:00:00Z", "2024-05-02T00:00:00Z", 1714608000],
                    "values_usd": [100, "110.5"],
                    "values_brl": [507, 560.2, 600],
                    "summary": {
                        "start_value_usd": 100,
                        "end_value_usd": 110.5,
                        "change_usd": 10.5,
                        "change_percent": 10.5
                    }
                }
            }),
            Period::SevenDays,
        )
        .unwrap();

        assert_eq!(series.period, Period::SevenDays);
        assert_eq!(series.points.len(), 3);
        assert_eq!(series.points[1].total_usd, 110.5);
        // shorter value array pads with zero
        assert_eq!(series.points[2].total_usd, 0.0);
        assert_eq!(series.points[2].total_brl, Some(600.0));
        assert!(series.points[2].timestamp.is_some());
        assert_eq!(series.summary.delta(), 10.5);
    }

    #[test]
    fn missing_evolution_is_empty() {
        let series = wire::parse_evolution(json!({}), Period::OneYear).unwrap();
        assert!(series.points.is_empty());
        assert_eq!(series.summary.change_percent, 0.0);
    }
}

// ── Ticker ──────────────────────────────────────────────────────────

mod ticker {
    use super::*;

    #[test]
    fn full_payload() {
        let ticker = wire::parse_ticker(json!({
            "symbol": "BTC",
            "price": {"current": 60000, "high_24h": 61000, "low_24h": "59000"},
            "change": {
                "1h": {"price_change_percent": 0.1},
                "4h": {"price_change_percent": -0.4},
                "24h": {"price_change_percent": 2.5}
            },
            "volume": {"quote_24h": 1000000}
        }))
        .unwrap();

        assert_eq!(ticker.price.current, Some(60000.0));
        assert_eq!(ticker.price.low_24h, Some(59000.0));
        assert_eq!(ticker.change.change_4h, Some(-0.4));
        assert!(ticker.has_daily_stats());
    }

    #[test]
    fn current_falls_back_to_last() {
        let ticker = wire::parse_ticker(json!({
            "symbol": "ETH",
            "price": {"last": 3000}
        }))
        .unwrap();
        assert_eq!(ticker.price.current, Some(3000.0));
        assert_eq!(ticker.change.change_24h, None);
    }

    #[test]
    fn no_symbol_means_no_ticker() {
        assert!(wire::parse_ticker(json!({"error": "not found"})).is_none());
        assert!(wire::parse_ticker(json!({"symbol": "  "})).is_none());
        assert!(wire::parse_ticker(json!([1, 2, 3])).is_none());
    }
}

// ── Misc ────────────────────────────────────────────────────────────

mod misc {
    use super::*;

    #[test]
    fn message_and_error_text() {
        assert_eq!(wire::parse_message(&json!({"message": "Linked"})).message, "Linked");
        assert_eq!(wire::parse_message(&json!({})).message, "");
        assert_eq!(
            wire::error_message(&json!({"error": "bad key", "message": "ignored"})).as_deref(),
            Some("bad key")
        );
        assert_eq!(wire::error_message(&json!({"code": 3})), None);
    }

    #[test]
    fn health_defaults_to_ok() {
        assert!(wire::parse_health(&json!({})).is_healthy());
        assert!(!wire::parse_health(&json!({"status": "degraded"})).is_healthy());
    }
}

// ── HttpBackend construction ────────────────────────────────────────

mod http_backend {
    use super::*;
    use exchange_dashboard_core::backend::traits::BalanceBackend;

    #[test]
    fn accepts_default_settings() {
        let backend = HttpBackend::new(&ClientSettings::default()).unwrap();
        assert_eq!(backend.user_id(), "default_user");
    }

    #[test]
    fn rejects_unparseable_base_url() {
        let settings = ClientSettings {
            base_url: "not a url".into(),
            ..ClientSettings::default()
        };
        assert!(matches!(
            HttpBackend::new(&settings),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn rejects_base_url_without_path() {
        let settings = ClientSettings {
            base_url: "mailto:ops@example.com".into(),
            ..ClientSettings::default()
        };
        assert!(HttpBackend::new(&settings).is_err());
    }

    #[test]
    fn set_user_id_trims_and_ignores_blank() {
        let backend = HttpBackend::new(&ClientSettings::default()).unwrap();
        backend.set_user_id("  alice ");
        assert_eq!(backend.user_id(), "alice");
        backend.set_user_id("   ");
        assert_eq!(backend.user_id(), "alice");
    }
}

// ── HttpBackend against a canned local server ───────────────────────

mod stub_server {
    use std::sync::{Arc, Mutex};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Response served for an exact request path (query ignored).
    pub struct Canned {
        pub path: &'static str,
        pub status: u16,
        pub content_type: &'static str,
        pub body: String,
    }

    impl Canned {
        pub fn json(path: &'static str, status: u16, body: serde_json::Value) -> Self {
            Self {
                path,
                status,
                content_type: "application/json",
                body: body.to_string(),
            }
        }

        pub fn html(path: &'static str) -> Self {
            Self {
                path,
                status: 200,
                content_type: "text/html; charset=utf-8",
                body: "<!DOCTYPE html><html><body>Not here</body></html>".into(),
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct Recorded {
        pub method: String,
        pub target: String,
        pub body: String,
    }

    pub struct Stub {
        pub base_url: String,
        requests: Arc<Mutex<Vec<Recorded>>>,
    }

    impl Stub {
        pub fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    /// One request per connection; unknown paths get a plain-text 404.
    pub async fn serve(routes: Vec<Canned>) -> Stub {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();
        let routes = Arc::new(routes);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = routes.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    let Some(request) = read_request(&mut socket).await else {
                        return;
                    };
                    let path = request.target.split('?').next().unwrap_or("").to_string();
                    let (status, content_type, body) = match routes.iter().find(|c| c.path == path) {
                        Some(c) => (c.status, c.content_type, c.body.clone()),
                        None => (404, "text/plain", "not found".to_string()),
                    };
                    log.lock().unwrap().push(request);

                    let response = format!(
                        "HTTP/1.1 {status} Canned\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Stub {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    async fn read_request(socket: &mut TcpStream) -> Option<Recorded> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let mut request_line = head.lines().next()?.split_whitespace();
        Some(Recorded {
            method: request_line.next()?.to_string(),
            target: request_line.next()?.to_string(),
            body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
        })
    }
}

mod http_roundtrips {
    use super::stub_server::{serve, Canned};
    use super::*;
    use exchange_dashboard_core::backend::traits::BalanceBackend;

    const TICKER_PATH: &str = "/api/v1/exchanges/a/token/BTC";

    fn backend_for(base_url: &str) -> HttpBackend {
        HttpBackend::new(&ClientSettings {
            base_url: base_url.to_string(),
            ..ClientSettings::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn ticker_not_found_is_absent() {
        let stub = serve(vec![Canned::json(
            TICKER_PATH,
            404,
            json!({"error": "Token not found"}),
        )])
        .await;

        let ticker = backend_for(&stub.base_url).get_token_ticker("a", "BTC").await;

        assert!(ticker.is_none());
        assert_eq!(stub.requests().len(), 1);
    }

    #[tokio::test]
    async fn html_response_is_absent_for_tolerant_and_unavailable_for_strict() {
        let stub = serve(vec![Canned::html(TICKER_PATH), Canned::html("/api/v1/balances")]).await;
        let backend = backend_for(&stub.base_url);

        assert!(backend.get_token_ticker("a", "BTC").await.is_none());
        assert!(matches!(
            backend.get_balances(false).await,
            Err(CoreError::UnavailableEndpoint(_))
        ));
    }

    #[tokio::test]
    async fn unauthorized_with_error_body_is_auth() {
        let stub = serve(vec![Canned::json(
            "/api/v1/balances",
            401,
            json!({"error": "Invalid API key"}),
        )])
        .await;

        match backend_for(&stub.base_url).get_balances(false).await {
            Err(CoreError::Auth(message)) => assert_eq!(message, "Invalid API key"),
            other => panic!("expected Auth, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_request_is_validation_and_other_statuses_are_api() {
        let stub = serve(vec![
            Canned::json("/api/v1/exchanges/linked", 400, json!({"error": "user_id required"})),
            Canned::json("/api/v1/exchanges/available", 500, json!({})),
        ])
        .await;
        let backend = backend_for(&stub.base_url);

        assert!(matches!(
            backend.get_linked_exchanges().await,
            Err(CoreError::Validation(m)) if m == "user_id required"
        ));
        assert!(matches!(
            backend.get_available_exchanges().await,
            Err(CoreError::Api { message, .. }) if message.contains("500")
        ));
    }

    #[tokio::test]
    async fn unreachable_backend_is_absent_for_tolerant_fetches() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        let backend = backend_for(&base_url);

        assert!(backend.get_token_ticker("a", "BTC").await.is_none());
        assert!(backend.get_exchange_details("a").await.is_none());
        assert!(matches!(
            backend.get_balances(false).await,
            Err(CoreError::Network(_))
        ));
    }

    #[tokio::test]
    async fn ticker_query_carries_user_and_quote() {
        let stub = serve(vec![Canned::json(
            TICKER_PATH,
            200,
            json!({
                "symbol": "BTC",
                "price": {"current": 60000},
                "change": {"24h": {"price_change_percent": 2.5}}
            }),
        )])
        .await;

        let ticker = backend_for(&stub.base_url)
            .get_token_ticker("a", "BTC")
            .await
            .unwrap();

        assert_eq!(ticker.change.change_24h, Some(2.5));
        let request = &stub.requests()[0];
        assert_eq!(request.method, "GET");
        assert_eq!(
            request.target,
            "/api/v1/exchanges/a/token/BTC?user_id=default_user&quote=USDT"
        );
    }

    #[tokio::test]
    async fn health_lives_outside_the_api_prefix() {
        let stub = serve(vec![Canned::json("/health", 200, json!({"status": "ok"}))]).await;

        let health = backend_for(&stub.base_url).health().await.unwrap();

        assert!(health.is_healthy());
        assert_eq!(stub.requests()[0].target, "/health");
    }

    #[tokio::test]
    async fn mutations_send_user_id_in_the_body() {
        let stub = serve(vec![Canned::json(
            "/api/v1/exchanges/link",
            200,
            json!({"message": "Exchange linked"}),
        )])
        .await;
        let backend = backend_for(&stub.base_url);
        backend.set_user_id("alice");

        let message = backend.link_exchange("binance", "k", "s").await.unwrap();

        assert_eq!(message.message, "Exchange linked");
        let request = &stub.requests()[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.target, "/api/v1/exchanges/link");
        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["user_id"], json!("alice"));
        assert_eq!(body["exchange_id"], json!("binance"));
    }

    #[tokio::test]
    async fn balances_query_carries_refresh_and_currency() {
        let stub = serve(vec![Canned::json(
            "/api/v1/balances",
            200,
            json!({"summary": {"total_usd": 0}, "exchanges": []}),
        )])
        .await;
        let plain = backend_for(&stub.base_url);
        let in_brl = HttpBackend::new(&ClientSettings {
            base_url: stub.base_url.clone(),
            balances_currency: Some(" brl ".into()),
            ..ClientSettings::default()
        })
        .unwrap();

        plain.get_balances(false).await.unwrap();
        in_brl.get_balances(true).await.unwrap();

        let targets: Vec<_> = stub.requests().into_iter().map(|r| r.target).collect();
        assert_eq!(
            targets,
            vec![
                "/api/v1/balances?user_id=default_user",
                "/api/v1/balances?user_id=default_user&force_refresh=true&currency=BRL",
            ]
        );
    }
}
