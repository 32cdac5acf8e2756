//! Request body for `POST /api/image_capture_complete`
//!
//! Field names are part of the Lightbucket API and must not change.
//! Optional measurements are omitted from the JSON when absent, never sent
//! as zero. Equipment names and the filter are sent as `null` when unknown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Complete report for one exposure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub target: TargetPayload,
    pub equipment: EquipmentPayload,
    pub image: ImagePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetPayload {
    pub name: String,
    /// Right ascension in degrees
    pub ra: f64,
    /// Declination in degrees
    pub dec: f64,
    pub rotation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentPayload {
    pub camera_name: Option<String>,
    pub telescope_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub filter_name: Option<String>,
    /// Exposure time in seconds
    pub duration: f64,
    pub gain: i32,
    pub offset: i32,
    pub binning: Option<String>,
    /// When the report was built
    pub captured_at: DateTime<Utc>,
    /// Guiding RMS in arcseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rms: Option<f64>,
    /// Base64 JPEG preview
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<StatisticsPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsPayload {
    /// Half-flux radius
    pub hfr: f64,
    pub stars: i32,
    pub mean: f64,
    pub median: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rms: Option<f64>,
}
