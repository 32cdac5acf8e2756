//! The shared build-and-deliver half of the pipeline.
//!
//! Both entry points ([`CaptureWatcher`](super::CaptureWatcher) and
//! [`CaptureTrigger`](super::CaptureTrigger)) qualify events their own way,
//! then hand an [`ExposureContext`] to [`Reporter::dispatch`].

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::delivery::{DeliveryClient, DeliveryOutcome};
use crate::report::{build_payload, ExposureContext};
use crate::settings::{SessionConfig, SettingsHandle};

/// Running dispatch. Resolves to `None` if the report could not be built.
pub type Dispatch = JoinHandle<Option<DeliveryOutcome>>;

/// Builds and delivers reports, one independent task per exposure
#[derive(Clone)]
pub struct Reporter {
    settings: SettingsHandle,
    client: Arc<DeliveryClient>,
}

impl Reporter {
    pub fn new(settings: SettingsHandle, client: DeliveryClient) -> Self {
        Self {
            settings,
            client: Arc::new(client),
        }
    }

    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    /// Current settings, if reporting is enabled and credentials are set.
    ///
    /// The returned snapshot is what the dispatch will use, even if the
    /// settings change while it is in flight.
    pub fn ready_config(&self) -> Option<Arc<SessionConfig>> {
        let config = self.settings.snapshot();
        if config.is_ready() {
            Some(config)
        } else {
            tracing::trace!(
                enabled = config.enabled,
                has_credentials = config.has_credentials(),
                "Lightbucket reporting not ready, skipping"
            );
            None
        }
    }

    /// Build and send the report for `context` in the background.
    ///
    /// Must be called from within a Tokio runtime; otherwise the report is
    /// dropped with an error log and `None` is returned.
    pub fn dispatch(&self, context: ExposureContext, config: Arc<SessionConfig>) -> Option<Dispatch> {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(error = %e, "No async runtime, dropping Lightbucket report");
                return None;
            }
        };

        let source = context.source;
        let target = context.target.name.clone();
        tracing::debug!(source = %source, target = %target, "Dispatching Lightbucket report");

        let client = Arc::clone(&self.client);
        Some(runtime.spawn(async move {
            // Thumbnail encoding is CPU-bound; the context (and its pixels) is dropped with the closure.
            let payload = match tokio::task::spawn_blocking(move || build_payload(&context)).await {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!(
                        source = %source,
                        target = %target,
                        error = %e,
                        "Failed to build Lightbucket report"
                    );
                    return None;
                }
            };

            Some(client.deliver(&payload, &config).await)
        }))
    }
}
