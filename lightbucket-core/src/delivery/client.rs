//! HTTP client for the Lightbucket capture API
//!
//! One report, one request. Nothing is retried or queued: a failed report
//! is surfaced to the user, logged, and dropped.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;

use super::notifier::Notifier;
use crate::error::Result;
use crate::report::ReportPayload;
use crate::settings::SessionConfig;

/// Client-side limit for a single request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How a delivery attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 2xx response
    Delivered(StatusCode),
    /// Any other response status
    Rejected(StatusCode),
    /// Connection, TLS or protocol failure, with the underlying cause
    TransportFailed(String),
    /// No response within the timeout
    TimedOut,
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered(_))
    }
}

/// HTTP client for `POST /api/image_capture_complete`
pub struct DeliveryClient {
    http_client: reqwest::Client,
    notifier: Arc<dyn Notifier>,
}

impl DeliveryClient {
    /// Create a client with the standard 30 second timeout
    pub fn new(notifier: Arc<dyn Notifier>) -> Result<Self> {
        Self::with_timeout(notifier, REQUEST_TIMEOUT)
    }

    /// Create a client with a custom timeout
    pub fn with_timeout(notifier: Arc<dyn Notifier>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lightbucket/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            notifier,
        })
    }

    /// Send one report using the credentials in `config`.
    ///
    /// Never returns an error: every failure is classified, logged and
    /// reported through the notifier.
    pub async fn deliver(&self, payload: &ReportPayload, config: &SessionConfig) -> DeliveryOutcome {
        let url = config.endpoint();

        if tracing::enabled!(tracing::Level::TRACE) {
            let body = serde_json::to_string(payload).unwrap_or_default();
            tracing::trace!(url = %url, payload = %body, "Making Lightbucket API request");
        }

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&config.username, Some(&config.api_key))
            .json(payload)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(
                    url = %url,
                    status = %response.status(),
                    target = %payload.target.name,
                    "Lightbucket API request successful"
                );
                DeliveryOutcome::Delivered(response.status())
            }
            Ok(response) => {
                let status = response.status();
                let message = format!("Lightbucket API request failed with status {}", status);
                self.notifier.warning(&message);
                tracing::warn!(url = %url, status = %status, "{}", message);
                DeliveryOutcome::Rejected(status)
            }
            Err(e) if e.is_timeout() => {
                self.notifier.error("Lightbucket request timed out!");
                tracing::warn!(url = %url, error = %e, "Lightbucket request timed out");
                DeliveryOutcome::TimedOut
            }
            Err(e) => {
                let cause = root_cause(&e);
                self.notifier.error(&format!("Lightbucket: {}", cause));
                tracing::warn!(url = %url, error = %e, cause = %cause, "Lightbucket request failed");
                DeliveryOutcome::TransportFailed(cause)
            }
        }
    }
}

/// Innermost error message, which is the useful one for connection failures
fn root_cause(error: &(dyn std::error::Error + 'static)) -> String {
    let mut current = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::NoopNotifier;
    use std::fmt;

    #[derive(Debug)]
    struct Layer(&'static str, Option<Box<Layer>>);

    impl fmt::Display for Layer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl std::error::Error for Layer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            self.1.as_deref().map(|e| e as &(dyn std::error::Error + 'static))
        }
    }

    #[test]
    fn test_root_cause_finds_innermost() {
        let error = Layer(
            "error sending request",
            Some(Box::new(Layer(
                "client error (Connect)",
                Some(Box::new(Layer("Connection refused", None))),
            ))),
        );
        assert_eq!(root_cause(&error), "Connection refused");
        assert_eq!(root_cause(&Layer("plain", None)), "plain");
    }

    #[test]
    fn test_client_builds() {
        assert!(DeliveryClient::new(Arc::new(NoopNotifier)).is_ok());
    }

    #[test]
    fn test_outcome_success() {
        assert!(DeliveryOutcome::Delivered(StatusCode::CREATED).is_success());
        assert!(!DeliveryOutcome::Rejected(StatusCode::INTERNAL_SERVER_ERROR).is_success());
        assert!(!DeliveryOutcome::TimedOut.is_success());
    }
}
