//! HTTP client for the venue REST API.
//!
//! Every response carries an `{ "ok": bool, "error": string }` envelope next
//! to its payload. `classify_response` turns status code and envelope into
//! the transport/business split before the payload is decoded.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sfmm_core::{MarketQuote, OrderBook, OrderId, OrderStatus};
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};
use crate::service::{BoxFuture, MarketDataClient, NewOrder, OrderService};

/// Default REST base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.stockfighter.io/ob/api";
/// Default game-master base URL.
pub const DEFAULT_GM_URL: &str = "https://www.stockfighter.io/gm";
/// Header carrying the API key.
pub const AUTH_HEADER: &str = "X-Starfighter-Authorization";
/// Default timeout for API requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for `StockfighterClient`.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub gm_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Build a config reading the API key from `api_key_env`.
    pub fn from_env(
        base_url: impl Into<String>,
        gm_url: impl Into<String>,
        api_key_env: &str,
        timeout: Duration,
    ) -> ClientResult<Self> {
        let api_key = std::env::var(api_key_env).unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(ClientError::Config(format!("{api_key_env} not set")));
        }
        Ok(Self {
            base_url: base_url.into(),
            gm_url: gm_url.into(),
            api_key,
            timeout,
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            gm_url: DEFAULT_GM_URL.to_string(),
            api_key: String::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Symbol entry from `GET /venues/{venue}/stocks`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StockSymbol {
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Deserialize)]
struct StocksResponse {
    #[serde(default)]
    symbols: Vec<StockSymbol>,
}

#[derive(Debug, Deserialize)]
struct AccountOrdersResponse {
    #[serde(default)]
    orders: Vec<OrderStatus>,
}

/// REST client for the venue and game master.
pub struct StockfighterClient {
    /// HTTP client.
    client: Client,
    base_url: String,
    pub(crate) gm_url: String,
    api_key: String,
}

impl StockfighterClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            gm_url: config.gm_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    /// Issue a request against the venue API.
    async fn request<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        self.request_url(method, url, body).await
    }

    /// Issue a request against an absolute URL and decode the payload.
    pub(crate) async fn request_url<T, B>(
        &self,
        method: Method,
        url: String,
        body: Option<&B>,
    ) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!(%method, %url, "venue request");

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header(AUTH_HEADER, &self.api_key);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(format!("{method} {url} failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(format!("Failed to read response body: {e}")))?;

        let value = classify_response(status, &text)?;
        serde_json::from_value(value)
            .map_err(|e| ClientError::Transport(format!("Failed to decode {url}: {e}")))
    }

    /// API-wide heartbeat. Any error counts as "down".
    pub async fn heartbeat(&self) -> bool {
        self.request::<serde_json::Value, ()>(Method::GET, "/heartbeat", None)
            .await
            .map_err(|e| warn!(error = %e, "API heartbeat failed"))
            .is_ok()
    }

    /// Per-venue heartbeat. Unknown venues report `false`.
    pub async fn venue_heartbeat(&self, venue: &str) -> bool {
        self.request::<serde_json::Value, ()>(
            Method::GET,
            &format!("/venues/{venue}/heartbeat"),
            None,
        )
        .await
        .map_err(|e| warn!(venue, error = %e, "Venue heartbeat failed"))
        .is_ok()
    }

    /// List the symbols traded on a venue.
    pub async fn stocks(&self, venue: &str) -> ClientResult<Vec<StockSymbol>> {
        let response: StocksResponse = self
            .request::<_, ()>(Method::GET, &format!("/venues/{venue}/stocks"), None)
            .await?;
        Ok(response.symbols)
    }

    /// Fetch the public order book for a symbol.
    pub async fn order_book(&self, venue: &str, symbol: &str) -> ClientResult<OrderBook> {
        self.request::<_, ()>(Method::GET, &format!("/venues/{venue}/stocks/{symbol}"), None)
            .await
    }

    /// All orders of an account on a venue.
    pub async fn account_orders(&self, venue: &str, account: &str) -> ClientResult<Vec<OrderStatus>> {
        let response: AccountOrdersResponse = self
            .request::<_, ()>(
                Method::GET,
                &format!("/venues/{venue}/accounts/{account}/orders"),
                None,
            )
            .await?;
        Ok(response.orders)
    }

    /// Orders of an account on a venue, restricted to one symbol.
    pub async fn account_stock_orders(
        &self,
        venue: &str,
        account: &str,
        symbol: &str,
    ) -> ClientResult<Vec<OrderStatus>> {
        let response: AccountOrdersResponse = self
            .request::<_, ()>(
                Method::GET,
                &format!("/venues/{venue}/accounts/{account}/stocks/{symbol}/orders"),
                None,
            )
            .await?;
        Ok(response.orders)
    }

    async fn fetch_quote(&self, venue: &str, symbol: &str) -> ClientResult<MarketQuote> {
        self.request::<_, ()>(
            Method::GET,
            &format!("/venues/{venue}/stocks/{symbol}/quote"),
            None,
        )
        .await
    }

    async fn post_order(&self, order: &NewOrder) -> ClientResult<OrderStatus> {
        let status: OrderStatus = self
            .request(
                Method::POST,
                &format!("/venues/{}/stocks/{}/orders", order.venue, order.stock),
                Some(order),
            )
            .await?;
        info!(
            order_id = %status.id,
            side = %order.side,
            price = %order.price,
            qty = order.qty,
            order_type = %order.order_type,
            "Order placed"
        );
        Ok(status)
    }

    async fn fetch_order(&self, venue: &str, symbol: &str, id: OrderId) -> ClientResult<OrderStatus> {
        self.request::<_, ()>(
            Method::GET,
            &format!("/venues/{venue}/stocks/{symbol}/orders/{id}"),
            None,
        )
        .await
    }

    async fn delete_order(&self, venue: &str, symbol: &str, id: OrderId) -> ClientResult<OrderStatus> {
        let status: OrderStatus = self
            .request::<_, ()>(
                Method::DELETE,
                &format!("/venues/{venue}/stocks/{symbol}/orders/{id}"),
                None,
            )
            .await?;
        info!(order_id = %id, open = status.open, "Order cancelled");
        Ok(status)
    }
}

/// Split a raw response into payload or classified error.
///
/// - 5xx and 429 are transport faults regardless of body.
/// - An undecodable body is a transport fault.
/// - `ok: false` is a business rejection.
/// - Any other non-2xx status is a business rejection.
pub fn classify_response(status: StatusCode, body: &str) -> ClientResult<serde_json::Value> {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ClientError::Transport(format!("HTTP {status}: {body}")));
    }

    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ClientError::Transport(format!("HTTP {status}: undecodable body: {e}")))?;

    if value.get("ok").and_then(|ok| ok.as_bool()) == Some(false) {
        let message = value
            .get("error")
            .and_then(|e| e.as_str())
            .unwrap_or("response not ok")
            .to_string();
        return Err(ClientError::Business(message));
    }

    if !status.is_success() {
        return Err(ClientError::Business(format!("HTTP {status}: {body}")));
    }

    Ok(value)
}

impl MarketDataClient for StockfighterClient {
    fn quote<'a>(
        &'a self,
        venue: &'a str,
        symbol: &'a str,
    ) -> BoxFuture<'a, ClientResult<MarketQuote>> {
        Box::pin(self.fetch_quote(venue, symbol))
    }
}

impl OrderService for StockfighterClient {
    fn place_order<'a>(&'a self, order: &'a NewOrder) -> BoxFuture<'a, ClientResult<OrderStatus>> {
        Box::pin(self.post_order(order))
    }

    fn order_status<'a>(
        &'a self,
        venue: &'a str,
        symbol: &'a str,
        id: OrderId,
    ) -> BoxFuture<'a, ClientResult<OrderStatus>> {
        Box::pin(self.fetch_order(venue, symbol, id))
    }

    fn cancel_order<'a>(
        &'a self,
        venue: &'a str,
        symbol: &'a str,
        id: OrderId,
    ) -> BoxFuture<'a, ClientResult<OrderStatus>> {
        Box::pin(self.delete_order(venue, symbol, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ok_payload() {
        let value = classify_response(StatusCode::OK, r#"{"ok":true,"last":5100}"#).unwrap();
        assert_eq!(value["last"], 5100);
    }

    #[test]
    fn test_classify_business_error() {
        let err = classify_response(
            StatusCode::NOT_FOUND,
            r#"{"ok":false,"error":"No venue exists with the symbol NONVENUE"}"#,
        )
        .unwrap_err();
        assert!(err.is_business());
        assert!(err.to_string().contains("NONVENUE"));
    }

    #[test]
    fn test_classify_ok_false_on_200() {
        let err = classify_response(StatusCode::OK, r#"{"ok":false,"error":"insufficient"}"#)
            .unwrap_err();
        assert!(err.is_business());
    }

    #[test]
    fn test_classify_server_error_is_transport() {
        let err = classify_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>").unwrap_err();
        assert!(err.is_retryable());

        let err = classify_response(StatusCode::TOO_MANY_REQUESTS, r#"{"ok":false}"#).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_classify_garbage_body_is_transport() {
        let err = classify_response(StatusCode::OK, "not json").unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_client_config_requires_key() {
        let err = ClientConfig::from_env(
            DEFAULT_BASE_URL,
            DEFAULT_GM_URL,
            "SFMM_TEST_KEY_THAT_IS_NEVER_SET",
            DEFAULT_TIMEOUT,
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = StockfighterClient::new(ClientConfig {
            base_url: "http://localhost:8080/ob/api/".to_string(),
            api_key: "key".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(client.base_url, "http://localhost:8080/ob/api");
    }
}
