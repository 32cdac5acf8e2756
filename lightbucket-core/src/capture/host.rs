//! Wire form of events delivered by the imaging host.
//!
//! The relay reads one JSON object per line:
//!
//! ```json
//! {"event": "image_saved", "image_type": "LIGHT", "target": {...}, "exposure": {...}}
//! {"event": "step_completed", "sequence": {"nodes": [...]}, "previous": 4, "equipment": {...}}
//! ```

use serde::{Deserialize, Serialize};

use super::equipment::EquipmentSnapshot;
use super::event::CaptureEvent;
use super::sequence::{NodeId, Sequence};
use crate::error::Result;

/// One notification from the host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    /// An image was written to disk
    ImageSaved(Box<CaptureEvent>),
    /// The sequencer moved past a step
    StepCompleted(Box<StepCompleted>),
}

/// Sequencer transition: `previous` just finished, `next` is about to run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepCompleted {
    pub sequence: Sequence,
    #[serde(default)]
    pub previous: Option<NodeId>,
    #[serde(default)]
    pub next: Option<NodeId>,
    #[serde(default)]
    pub equipment: EquipmentSnapshot,
}

impl HostEvent {
    /// Parse a single JSON line
    pub fn from_json(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }
}
