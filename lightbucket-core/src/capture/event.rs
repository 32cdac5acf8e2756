//! "Image saved" events and the metadata they carry.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::frame::Frame;

/// Image type of a light frame. Calibration frames (FLAT, DARK, BIAS) are never reported.
pub const LIGHT_FRAME: &str = "LIGHT";

/// Gain/offset value meaning "whatever the camera is set to"
pub const USE_CAMERA_DEFAULT: i32 = -1;

/// Equatorial coordinates in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub ra_degrees: f64,
    pub dec: f64,
}

impl Coordinates {
    /// RA in [0, 360), Dec in [-90, 90], both finite
    pub fn is_valid(&self) -> bool {
        self.ra_degrees.is_finite()
            && self.dec.is_finite()
            && (0.0..360.0).contains(&self.ra_degrees)
            && (-90.0..=90.0).contains(&self.dec)
    }
}

/// Target as described by the host's image metadata. Any field may be missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub rotation: f64,
}

impl Target {
    /// The target as a deep-sky object, if it has a name and valid coordinates
    pub fn resolve(&self) -> Option<DeepSkyObject> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        let coordinates = self.coordinates.filter(Coordinates::is_valid)?;
        Some(DeepSkyObject {
            name: name.to_string(),
            coordinates,
            rotation: self.rotation,
        })
    }
}

/// A fully identified target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepSkyObject {
    pub name: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub rotation: f64,
}

/// What the camera currently reports
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CameraInfo {
    #[serde(default)]
    pub name: Option<String>,
    pub gain: i32,
    pub offset: i32,
}

/// Binning mode, rendered as `"XxY"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binning {
    pub x: u16,
    pub y: u16,
}

impl fmt::Display for Binning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

/// Serde default for gain/offset fields
pub(crate) fn camera_default() -> i32 {
    USE_CAMERA_DEFAULT
}

/// Settings the exposure was taken with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureParameters {
    /// Exposure time in seconds
    pub duration: f64,
    #[serde(default = "camera_default")]
    pub gain: i32,
    #[serde(default = "camera_default")]
    pub offset: i32,
    #[serde(default)]
    pub binning: Option<Binning>,
}

/// Guiding error recorded during the exposure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuidingRms {
    /// Total RMS in guide camera pixels
    pub total: f64,
    /// Arcseconds per pixel
    pub scale: f64,
}

impl GuidingRms {
    /// Total RMS in arcseconds, rounded to two decimals
    pub fn arcseconds(&self) -> f64 {
        (self.total * self.scale * 100.0).round() / 100.0
    }
}

/// Star detection and image statistics computed by the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StarStatistics {
    pub hfr: f64,
    pub stars: i32,
    pub mean: f64,
    pub median: f64,
}

/// An exposure the host has just written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureEvent {
    pub image_type: String,
    #[serde(default)]
    pub target: Target,
    #[serde(default)]
    pub camera: Option<CameraInfo>,
    #[serde(default)]
    pub telescope_name: Option<String>,
    #[serde(default)]
    pub filter_name: Option<String>,
    pub exposure: ExposureParameters,
    #[serde(default)]
    pub guiding_rms: Option<GuidingRms>,
    #[serde(default)]
    pub star_statistics: Option<StarStatistics>,
    /// Saved image on disk, decoded only if no frame is attached
    #[serde(default)]
    pub image_path: Option<PathBuf>,
    /// Pixel data handed over in-process by the host
    #[serde(skip)]
    pub frame: Option<Frame>,
}

impl CaptureEvent {
    pub fn is_light(&self) -> bool {
        self.image_type == LIGHT_FRAME
    }
}
