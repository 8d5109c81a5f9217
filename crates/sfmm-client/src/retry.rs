//! Transport retry policy applied at the service call boundary.
//!
//! Only `ClientError::Transport` is retried. Business rejections come back
//! on the first attempt since resending the same request cannot succeed.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sfmm_core::{MarketQuote, OrderId, OrderStatus};
use tracing::{debug, warn};

use crate::error::ClientResult;
use crate::service::{BoxFuture, MarketDataClient, NewOrder, OrderService};

/// Retry policy for transport faults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    4
}

fn default_base_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    2000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        backoff_delay(self.base_delay_ms, self.max_delay_ms, attempt)
    }
}

/// Exponential backoff: `min(base * 2^(attempt-1), max)` plus jitter in `[0, base)`.
pub fn backoff_delay(base_ms: u64, max_ms: u64, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let delay = base_ms.saturating_mul(1u64 << exponent).min(max_ms);
    Duration::from_millis(delay + jitter_ms(base_ms))
}

/// Clock-derived jitter in `[0, bound)`.
fn jitter_ms(bound: u64) -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    if bound == 0 {
        return 0;
    }
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    u64::from(nanos) % bound
}

/// Run `op` until it succeeds, fails with a non-transport error, or the
/// policy's attempts are exhausted.
pub async fn retry_transport<T, F, Fut>(policy: &RetryPolicy, op_name: &str, mut op: F) -> ClientResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ClientResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(op = op_name, attempt, "Recovered after retry");
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    op = op_name,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transport error, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Decorator applying a `RetryPolicy` to every call of the wrapped service.
pub struct RetryingClient<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C> RetryingClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<C: MarketDataClient> MarketDataClient for RetryingClient<C> {
    fn quote<'a>(
        &'a self,
        venue: &'a str,
        symbol: &'a str,
    ) -> BoxFuture<'a, ClientResult<MarketQuote>> {
        let inner = &self.inner;
        Box::pin(retry_transport(&self.policy, "quote", move || {
            inner.quote(venue, symbol)
        }))
    }
}

impl<C: OrderService> OrderService for RetryingClient<C> {
    fn place_order<'a>(&'a self, order: &'a NewOrder) -> BoxFuture<'a, ClientResult<OrderStatus>> {
        let inner = &self.inner;
        Box::pin(retry_transport(&self.policy, "place_order", move || {
            inner.place_order(order)
        }))
    }

    fn order_status<'a>(
        &'a self,
        venue: &'a str,
        symbol: &'a str,
        id: OrderId,
    ) -> BoxFuture<'a, ClientResult<OrderStatus>> {
        let inner = &self.inner;
        Box::pin(retry_transport(&self.policy, "order_status", move || {
            inner.order_status(venue, symbol, id)
        }))
    }

    fn cancel_order<'a>(
        &'a self,
        venue: &'a str,
        symbol: &'a str,
        id: OrderId,
    ) -> BoxFuture<'a, ClientResult<OrderStatus>> {
        let inner = &self.inner;
        Box::pin(retry_transport(&self.policy, "cancel_order", move || {
            inner.cancel_order(venue, symbol, id)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::mock::{MockCall, MockExchange, MockOp};
    use sfmm_core::{OrderSide, Price};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    #[test]
    fn test_backoff_exponential_with_cap() {
        // jitter is below base, so it never crosses into the next step
        let d1 = backoff_delay(100, 2000, 1).as_millis();
        let d2 = backoff_delay(100, 2000, 2).as_millis();
        let d3 = backoff_delay(100, 2000, 3).as_millis();
        let d9 = backoff_delay(100, 2000, 9).as_millis();
        assert!((100..200).contains(&d1));
        assert!((200..300).contains(&d2));
        assert!((400..500).contains(&d3));
        assert!((2000..2100).contains(&d9));
    }

    #[test]
    fn test_backoff_zero_base() {
        assert_eq!(backoff_delay(0, 0, 5), Duration::ZERO);
    }

    #[test]
    fn test_policy_defaults_from_empty_object() {
        let policy: RetryPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, RetryPolicy::default());
        assert_eq!(policy.max_attempts, 4);
    }

    #[tokio::test]
    async fn test_transport_errors_are_retried() {
        let mock = MockExchange::new("TESTEX", "FOOBAR");
        mock.set_last_price(Price(10000));
        mock.inject_failure(MockOp::Quote, ClientError::Transport("reset".into()));
        mock.inject_failure(MockOp::Quote, ClientError::Transport("reset".into()));

        let client = RetryingClient::new(mock, fast_policy(4));
        let quote = client.quote("TESTEX", "FOOBAR").await.unwrap();

        assert_eq!(quote.last, Price(10000));
        let quotes = client
            .inner()
            .calls()
            .into_iter()
            .filter(|c| *c == MockCall::Quote)
            .count();
        assert_eq!(quotes, 3);
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let mock = MockExchange::new("TESTEX", "FOOBAR");
        for _ in 0..5 {
            mock.inject_failure(MockOp::Quote, ClientError::Transport("down".into()));
        }

        let client = RetryingClient::new(mock, fast_policy(3));
        let err = client.quote("TESTEX", "FOOBAR").await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(client.inner().calls().len(), 3);
    }

    #[tokio::test]
    async fn test_business_errors_are_not_retried() {
        let mock = MockExchange::new("TESTEX", "FOOBAR");
        mock.inject_failure(MockOp::Place, ClientError::Business("bad account".into()));

        let client = RetryingClient::new(mock, fast_policy(4));
        let order = NewOrder::limit("EXB123456", "TESTEX", "FOOBAR", OrderSide::Buy, Price(9400), 225);
        let err = client.place_order(&order).await.unwrap_err();

        assert!(err.is_business());
        assert_eq!(client.inner().calls().len(), 1);
        assert!(client.inner().open_orders(OrderSide::Buy).is_empty());
    }
}
