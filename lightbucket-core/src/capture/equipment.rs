//! Access to the host's live equipment state.

use serde::{Deserialize, Serialize};

use super::event::CameraInfo;

/// Current state of the connected equipment.
///
/// The sequence trigger has no image metadata to read from, so it asks the
/// host's camera, profile and filter wheel for the values at report time.
pub trait EquipmentProvider: Send + Sync {
    /// Connected camera, if any
    fn camera(&self) -> Option<CameraInfo>;

    /// Telescope name from the active profile
    fn telescope_name(&self) -> Option<String>;

    /// Filter currently selected in the filter wheel
    fn selected_filter(&self) -> Option<String>;
}

/// Equipment state captured at a single point in time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentSnapshot {
    #[serde(default)]
    pub camera: Option<CameraInfo>,
    #[serde(default)]
    pub telescope_name: Option<String>,
    #[serde(default)]
    pub selected_filter: Option<String>,
}

impl EquipmentProvider for EquipmentSnapshot {
    fn camera(&self) -> Option<CameraInfo> {
        self.camera.clone()
    }

    fn telescope_name(&self) -> Option<String> {
        self.telescope_name.clone()
    }

    fn selected_filter(&self) -> Option<String> {
        self.selected_filter.clone()
    }
}
