//! Sequence tree as seen by the sequence trigger.
//!
//! Nodes live in a flat arena and point at their parent by [`NodeId`].
//! Containers and steps share one tagged node type; whether a node carries a
//! target is a capability query ([`SequenceNode::target`]), not a type check.

use serde::{Deserialize, Serialize};

use super::event::{camera_default, Binning, DeepSkyObject, LIGHT_FRAME};

/// Index of a node in a [`Sequence`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Lifecycle status of a sequence entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    #[default]
    Created,
    Running,
    Finished,
    Failed,
    Skipped,
    Disabled,
}

/// Parameters of an exposure-capture step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TakeExposure {
    pub image_type: String,
    /// Seconds
    pub exposure_time: f64,
    #[serde(default = "camera_default")]
    pub gain: i32,
    #[serde(default = "camera_default")]
    pub offset: i32,
    #[serde(default)]
    pub binning: Option<Binning>,
}

impl TakeExposure {
    pub fn is_light(&self) -> bool {
        self.image_type == LIGHT_FRAME
    }
}

/// What a node is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    /// Plain grouping container
    Container { name: String },
    /// Container bound to a deep-sky object
    TargetContainer { name: String, target: DeepSkyObject },
    /// Exposure-capture step
    TakeExposure(TakeExposure),
    /// Any other step (slew, focus, dither, ...)
    Instruction { name: String },
}

impl NodeKind {
    /// Short label for logs
    pub fn label(&self) -> &str {
        match self {
            NodeKind::Container { name } => name,
            NodeKind::TargetContainer { name, .. } => name,
            NodeKind::TakeExposure(_) => "take_exposure",
            NodeKind::Instruction { name } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceNode {
    #[serde(default)]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl SequenceNode {
    /// The deep-sky object this node exposes, if it is a target container
    pub fn target(&self) -> Option<&DeepSkyObject> {
        match &self.kind {
            NodeKind::TargetContainer { target, .. } => Some(target),
            _ => None,
        }
    }

    /// The exposure parameters, if this node is an exposure step
    pub fn as_exposure(&self) -> Option<&TakeExposure> {
        match &self.kind {
            NodeKind::TakeExposure(exposure) => Some(exposure),
            _ => None,
        }
    }
}

/// Arena of sequence nodes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    #[serde(default)]
    nodes: Vec<SequenceNode>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its id
    pub fn push(&mut self, parent: Option<NodeId>, status: StepStatus, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(SequenceNode {
            parent,
            status,
            kind,
        });
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&SequenceNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// `start` and every container above it, innermost first
    pub fn ancestors(&self, start: Option<NodeId>) -> Ancestors<'_> {
        Ancestors {
            sequence: self,
            next: start,
            remaining: self.nodes.len(),
        }
    }

    /// Walk up from `start` to the first container that exposes a target
    pub fn find_target(&self, start: Option<NodeId>) -> Option<&DeepSkyObject> {
        self.ancestors(start).find_map(SequenceNode::target)
    }
}

/// Iterator over a parent chain.
///
/// Stops at the root, at a dangling id, or after visiting every node once
/// (so a malformed cyclic chain still terminates).
pub struct Ancestors<'a> {
    sequence: &'a Sequence,
    next: Option<NodeId>,
    remaining: usize,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a SequenceNode;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.sequence.get(self.next?)?;
        self.remaining -= 1;
        self.next = node.parent;
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::event::{Coordinates, USE_CAMERA_DEFAULT};

    fn m42() -> DeepSkyObject {
        DeepSkyObject {
            name: "M42".to_string(),
            coordinates: Coordinates {
                ra_degrees: 83.8,
                dec: -5.4,
            },
            rotation: 0.0,
        }
    }

    fn light(exposure_time: f64) -> NodeKind {
        NodeKind::TakeExposure(TakeExposure {
            image_type: "LIGHT".to_string(),
            exposure_time,
            gain: -1,
            offset: 10,
            binning: Some(Binning { x: 1, y: 1 }),
        })
    }

    #[test]
    fn test_find_target_walks_up_through_plain_containers() {
        let mut seq = Sequence::new();
        let root = seq.push(None, StepStatus::Running, NodeKind::Container {
            name: "root".to_string(),
        });
        let target = seq.push(Some(root), StepStatus::Running, NodeKind::TargetContainer {
            name: "M42 block".to_string(),
            target: m42(),
        });
        let loop_container = seq.push(Some(target), StepStatus::Running, NodeKind::Container {
            name: "loop".to_string(),
        });
        let step = seq.push(Some(loop_container), StepStatus::Finished, light(60.0));

        let parent = seq.get(step).unwrap().parent;
        assert_eq!(seq.find_target(parent).unwrap().name, "M42");
    }

    #[test]
    fn test_find_target_returns_innermost() {
        let mut seq = Sequence::new();
        let mut outer = m42();
        outer.name = "outer".to_string();
        let a = seq.push(None, StepStatus::Running, NodeKind::TargetContainer {
            name: "a".to_string(),
            target: outer,
        });
        let b = seq.push(Some(a), StepStatus::Running, NodeKind::TargetContainer {
            name: "b".to_string(),
            target: m42(),
        });
        assert_eq!(seq.find_target(Some(b)).unwrap().name, "M42");
    }

    #[test]
    fn test_find_target_none_at_root() {
        let mut seq = Sequence::new();
        let root = seq.push(None, StepStatus::Running, NodeKind::Container {
            name: "root".to_string(),
        });
        seq.push(Some(root), StepStatus::Finished, light(30.0));

        assert!(seq.find_target(Some(root)).is_none());
        assert!(seq.find_target(None).is_none());
        assert!(seq.find_target(Some(NodeId(99))).is_none());
    }

    #[test]
    fn test_cyclic_chain_terminates() {
        let mut seq = Sequence::new();
        seq.push(Some(NodeId(1)), StepStatus::Running, NodeKind::Container {
            name: "a".to_string(),
        });
        seq.push(Some(NodeId(0)), StepStatus::Running, NodeKind::Container {
            name: "b".to_string(),
        });
        assert!(seq.find_target(Some(NodeId(0))).is_none());
        assert_eq!(seq.ancestors(Some(NodeId(0))).count(), 2);
    }

    #[test]
    fn test_deserialize_sequence() {
        let json = r#"{
            "nodes": [
                {"kind": "container", "name": "root"},
                {"kind": "target_container", "name": "M42", "parent": 0,
                 "target": {"name": "M42", "coordinates": {"ra_degrees": 83.8, "dec": -5.4}}},
                {"kind": "take_exposure", "parent": 1, "status": "FINISHED",
                 "image_type": "LIGHT", "exposure_time": 120, "gain": 100}
            ]
        }"#;
        let seq: Sequence = serde_json::from_str(json).unwrap();
        assert_eq!(seq.len(), 3);

        let step = seq.get(NodeId(2)).unwrap();
        assert_eq!(step.status, StepStatus::Finished);
        let exposure = step.as_exposure().unwrap();
        assert!(exposure.is_light());
        assert_eq!(exposure.gain, 100);
        assert_eq!(exposure.offset, USE_CAMERA_DEFAULT);
        assert_eq!(seq.find_target(step.parent).unwrap().name, "M42");
    }
}
