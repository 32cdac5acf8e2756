//! Source-independent description of a finished exposure.

use std::fmt;

use crate::capture::{
    CameraInfo, CaptureEvent, DeepSkyObject, ExposureParameters, FrameSource, GuidingRms,
    StarStatistics,
};

/// Which entry point produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSource {
    /// Reactive watcher on "image saved" notifications
    ImageSaved,
    /// Trigger fired after a sequencer exposure step
    SequenceTrigger,
}

impl fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureSource::ImageSaved => f.write_str("image_saved"),
            CaptureSource::SequenceTrigger => f.write_str("sequence_trigger"),
        }
    }
}

/// Everything the payload builder needs, whichever path produced it
#[derive(Debug, Clone)]
pub struct ExposureContext {
    pub source: CaptureSource,
    pub target: DeepSkyObject,
    /// Camera state, used to resolve "camera default" gain and offset
    pub camera: Option<CameraInfo>,
    pub telescope_name: Option<String>,
    pub filter_name: Option<String>,
    pub exposure: ExposureParameters,
    pub guiding_rms: Option<GuidingRms>,
    pub star_statistics: Option<StarStatistics>,
    pub frame: FrameSource,
}

impl ExposureContext {
    /// Adapt a saved-image event whose target has already been resolved
    pub fn from_capture(event: CaptureEvent, target: DeepSkyObject) -> Self {
        Self {
            source: CaptureSource::ImageSaved,
            target,
            camera: event.camera,
            telescope_name: event.telescope_name,
            filter_name: event.filter_name,
            exposure: event.exposure,
            guiding_rms: event.guiding_rms,
            star_statistics: event.star_statistics,
            frame: FrameSource::from_parts(event.frame, event.image_path),
        }
    }
}
