//! Event-to-delivery pipeline
//!
//! ```text
//! image saved  ──► CaptureWatcher ─┐
//!                                  ├─► Reporter ─► build_payload ─► DeliveryClient ─► API
//! step finished ─► CaptureTrigger ─┘
//! ```
//!
//! Each qualifying event becomes one independent background task. Tasks may
//! overlap and finish in any order. Nothing in the pipeline returns an error
//! to the host: misses are silent, failures are logged and notified.

mod reporter;
mod trigger;
mod watcher;

pub use reporter::{Dispatch, Reporter};
pub use trigger::{CaptureTrigger, ExposureStep};
pub use watcher::CaptureWatcher;
