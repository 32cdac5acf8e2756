//! Reactive entry point: one call per "image saved" notification.

use crate::capture::CaptureEvent;
use crate::report::ExposureContext;

use super::reporter::{Dispatch, Reporter};

/// Reports every saved light frame that belongs to a known target
#[derive(Clone)]
pub struct CaptureWatcher {
    reporter: Reporter,
}

impl CaptureWatcher {
    pub fn new(reporter: Reporter) -> Self {
        Self { reporter }
    }

    /// Handle one saved image.
    ///
    /// Returns the running dispatch, or `None` if the event does not qualify.
    pub fn on_image_saved(&self, event: CaptureEvent) -> Option<Dispatch> {
        let config = self.reporter.ready_config()?;

        if !event.is_light() {
            tracing::trace!(image_type = %event.image_type, "Not a light frame, skipping");
            return None;
        }

        let Some(target) = event.target.resolve() else {
            tracing::info!("Image is not attached to a target with a name and coordinates. Skipping.");
            return None;
        };

        self.reporter
            .dispatch(ExposureContext::from_capture(event, target), config)
    }
}
