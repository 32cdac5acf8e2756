//! Inbound data from the imaging host
//!
//! Two kinds of notification reach the pipeline:
//! - [`CaptureEvent`]: an image was saved, with its metadata and pixels
//! - [`StepCompleted`]: the sequencer finished a step, described by the
//!   [`Sequence`] tree and the live [`EquipmentProvider`] state

mod equipment;
mod event;
mod frame;
mod host;
mod sequence;

pub use equipment::{EquipmentProvider, EquipmentSnapshot};
pub use event::{
    Binning, CameraInfo, CaptureEvent, Coordinates, DeepSkyObject, ExposureParameters,
    GuidingRms, StarStatistics, Target, LIGHT_FRAME, USE_CAMERA_DEFAULT,
};
pub use frame::{Frame, FrameSource};
pub use host::{HostEvent, StepCompleted};
pub use sequence::{Ancestors, NodeId, NodeKind, Sequence, SequenceNode, StepStatus, TakeExposure};
