//! Report construction
//!
//! Turns an [`ExposureContext`] into the JSON body the Lightbucket API
//! expects, including an optional JPEG thumbnail.

mod builder;
mod context;
mod payload;
pub mod thumbnail;

pub use builder::{build_payload, build_payload_at};
pub use context::{CaptureSource, ExposureContext};
pub use payload::{EquipmentPayload, ImagePayload, ReportPayload, StatisticsPayload, TargetPayload};
pub use thumbnail::encode_thumbnail;
