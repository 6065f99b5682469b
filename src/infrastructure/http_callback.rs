use crate::domain::order_process::OrderProcess;
use crate::domain::ports::{CallbackNotifier, DeliveryReport};
use crate::error::{OrderProcessError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::{info, warn};

/// Retry budget for a single delivery round.
///
/// A round makes one initial attempt plus up to `max_retries` retries, sleeping
/// `backoff` between consecutive attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_RETRIES: u32 = 3;
    pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

    pub const fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Total attempts per round, including the first.
    pub const fn attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RETRIES, Self::DEFAULT_BACKOFF)
    }
}

/// Delivers completed order processes to callback URLs over HTTP.
///
/// Each round POSTs the process as JSON and counts as delivered only on an
/// exact `200 OK`. Anything else, including connection errors and timeouts, is
/// retried according to the [`RetryPolicy`] and then abandoned.
#[derive(Clone)]
pub struct HttpCallbackNotifier {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl HttpCallbackNotifier {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Builds a notifier whose requests each time out after `timeout`.
    pub fn new(policy: RetryPolicy, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, policy))
    }

    pub fn with_client(client: reqwest::Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Sends one POST. Any outcome other than `200 OK` is a `DeliveryFailed`.
    async fn attempt(&self, url: &str, body: &[u8]) -> Result<()> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_vec())
            .send()
            .await
            .map_err(|e| OrderProcessError::DeliveryFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if response.status() != StatusCode::OK {
            return Err(OrderProcessError::DeliveryFailed {
                url: url.to_string(),
                reason: format!("received status code {}", response.status().as_u16()),
            });
        }
        Ok(())
    }

    /// Runs one delivery round. Returns `false` if the round was abandoned.
    async fn deliver_round(&self, process: &OrderProcess, url: &str, round: u32) -> bool {
        let body = match serde_json::to_vec(process) {
            Ok(body) => body,
            Err(e) => {
                warn!(order_id = %process.order_id, round, error = %e, "unable to encode callback body, abandoning callback");
                return false;
            }
        };

        let attempts = self.policy.attempts();
        for attempt in 1..=attempts {
            match self.attempt(url, &body).await {
                Ok(()) => {
                    info!(order_id = %process.order_id, round, attempt, "successfully called back");
                    return true;
                }
                Err(e) if attempt < attempts => {
                    warn!(
                        order_id = %process.order_id,
                        round,
                        attempt,
                        error = %e,
                        "callback failed, retrying in {:?}",
                        self.policy.backoff
                    );
                    tokio::time::sleep(self.policy.backoff).await;
                }
                Err(e) => {
                    warn!(order_id = %process.order_id, round, attempt, error = %e, "callback failed");
                }
            }
        }

        warn!(order_id = %process.order_id, round, "unable to call back, abandoning callback");
        false
    }
}

#[async_trait]
impl CallbackNotifier for HttpCallbackNotifier {
    async fn deliver(
        &self,
        process: &OrderProcess,
        callback_url: Option<&str>,
        duplicates: u32,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        let Some(url) = callback_url.filter(|url| !url.is_empty()) else {
            return report;
        };

        info!(order_id = %process.order_id, duplicates, "delivering callback");

        // Rounds run one after another; an abandoned round does not stop the rest.
        for round in 0..=duplicates {
            if self.deliver_round(process, url, round).await {
                report.delivered += 1;
            } else {
                report.abandoned += 1;
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_notifier() -> HttpCallbackNotifier {
        HttpCallbackNotifier::new(
            RetryPolicy::new(3, Duration::from_millis(1)),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.backoff, Duration::from_secs(5));
        assert_eq!(policy.attempts(), 4);
    }

    #[tokio::test]
    async fn test_no_callback_url_is_noop() {
        let notifier = fast_notifier();
        let process = OrderProcess::new("order-1");

        let report = notifier.deliver(&process, None, 3).await;
        assert_eq!(report, DeliveryReport::default());

        let report = notifier.deliver(&process, Some(""), 3).await;
        assert_eq!(report.rounds(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_abandons_every_round() {
        let notifier = fast_notifier();
        let process = OrderProcess::new("order-1");

        // Port 1 on loopback refuses connections
        let report = notifier
            .deliver(&process, Some("http://127.0.0.1:1/callback"), 1)
            .await;

        assert_eq!(report.delivered, 0);
        assert_eq!(report.abandoned, 2);
    }

    #[tokio::test]
    async fn test_attempt_reports_delivery_failed() {
        let notifier = fast_notifier();
        let result = notifier.attempt("http://127.0.0.1:1/callback", b"{}").await;
        assert!(matches!(
            result,
            Err(OrderProcessError::DeliveryFailed { .. })
        ));
    }
}
