//! Sequencer entry point: fires after an exposure step finishes.
//!
//! The host calls [`CaptureTrigger::should_trigger_after`] on every step
//! transition. When the finished step was a light exposure its parameters are
//! remembered, and the following [`CaptureTrigger::execute`] reports it. The
//! remembered step is consumed by `execute` whatever the result, so a later
//! unrelated step can never reuse it.

use crate::capture::{
    EquipmentProvider, ExposureParameters, FrameSource, NodeId, Sequence, StepStatus,
    TakeExposure,
};
use crate::report::{CaptureSource, ExposureContext};

use super::reporter::{Dispatch, Reporter};

/// The exposure step that armed the trigger
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureStep {
    pub node: NodeId,
    pub parent: Option<NodeId>,
    pub parameters: TakeExposure,
}

pub struct CaptureTrigger {
    reporter: Reporter,
    last_exposure: Option<ExposureStep>,
}

impl CaptureTrigger {
    pub fn new(reporter: Reporter) -> Self {
        Self {
            reporter,
            last_exposure: None,
        }
    }

    /// The step waiting to be reported, if any
    pub fn pending(&self) -> Option<&ExposureStep> {
        self.last_exposure.as_ref()
    }

    /// Decide whether to run after `previous` finished.
    ///
    /// Only a finished light-frame exposure step qualifies. Any other kind of
    /// step is an ordinary non-match.
    pub fn should_trigger_after(
        &mut self,
        sequence: &Sequence,
        previous: Option<NodeId>,
        _next: Option<NodeId>,
    ) -> bool {
        self.last_exposure = None;

        let Some((id, node)) = previous.and_then(|id| sequence.get(id).map(|node| (id, node)))
        else {
            return false;
        };

        let Some(exposure) = node.as_exposure() else {
            tracing::trace!(step = %node.kind.label(), "Previous step is not an exposure");
            return false;
        };

        if node.status != StepStatus::Finished || !exposure.is_light() {
            return false;
        }

        self.last_exposure = Some(ExposureStep {
            node: id,
            parent: node.parent,
            parameters: exposure.clone(),
        });
        true
    }

    /// Report the remembered exposure.
    ///
    /// The target is taken from the nearest enclosing container that has
    /// one; equipment details come from `equipment`.
    pub fn execute(
        &mut self,
        sequence: &Sequence,
        equipment: &dyn EquipmentProvider,
    ) -> Option<Dispatch> {
        let step = self.last_exposure.take()?;
        let config = self.reporter.ready_config()?;

        let Some(target) = sequence.find_target(step.parent) else {
            tracing::warn!(step = step.node.0, "Could not identify target. Skipping.");
            return None;
        };

        let context = ExposureContext {
            source: CaptureSource::SequenceTrigger,
            target: target.clone(),
            camera: equipment.camera(),
            telescope_name: equipment.telescope_name(),
            filter_name: equipment.selected_filter(),
            exposure: ExposureParameters {
                duration: step.parameters.exposure_time,
                gain: step.parameters.gain,
                offset: step.parameters.offset,
                binning: step.parameters.binning,
            },
            guiding_rms: None,
            star_statistics: None,
            frame: FrameSource::None,
        };

        self.reporter.dispatch(context, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Coordinates, DeepSkyObject, EquipmentSnapshot, NodeKind};
    use crate::delivery::{DeliveryClient, NoopNotifier};
    use crate::settings::{SessionConfig, SettingsHandle};
    use std::sync::Arc;

    fn reporter(enabled: bool) -> Reporter {
        let settings = SettingsHandle::new(SessionConfig {
            username: "astro".to_string(),
            api_key: "key".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            enabled,
        });
        Reporter::new(settings, DeliveryClient::new(Arc::new(NoopNotifier)).unwrap())
    }

    fn exposure(image_type: &str) -> NodeKind {
        NodeKind::TakeExposure(TakeExposure {
            image_type: image_type.to_string(),
            exposure_time: 120.0,
            gain: -1,
            offset: -1,
            binning: None,
        })
    }

    /// root > [target container] > step
    fn sequence(with_target: bool, step: NodeKind, status: StepStatus) -> (Sequence, NodeId) {
        let mut seq = Sequence::new();
        let root = seq.push(None, StepStatus::Running, NodeKind::Container {
            name: "root".to_string(),
        });
        let parent = if with_target {
            seq.push(Some(root), StepStatus::Running, NodeKind::TargetContainer {
                name: "NGC 7000".to_string(),
                target: DeepSkyObject {
                    name: "NGC 7000".to_string(),
                    coordinates: Coordinates {
                        ra_degrees: 314.7,
                        dec: 44.3,
                    },
                    rotation: 90.0,
                },
            })
        } else {
            root
        };
        let step = seq.push(Some(parent), status, step);
        (seq, step)
    }

    #[test]
    fn test_arms_on_finished_light_exposure() {
        let mut trigger = CaptureTrigger::new(reporter(true));
        let (seq, step) = sequence(true, exposure("LIGHT"), StepStatus::Finished);

        assert!(trigger.should_trigger_after(&seq, Some(step), None));
        let pending = trigger.pending().unwrap();
        assert_eq!(pending.node, step);
        assert_eq!(pending.parameters.exposure_time, 120.0);
    }

    #[test]
    fn test_ignores_non_matching_steps() {
        let mut trigger = CaptureTrigger::new(reporter(true));

        let (seq, step) = sequence(true, exposure("FLAT"), StepStatus::Finished);
        assert!(!trigger.should_trigger_after(&seq, Some(step), None));

        let (seq, step) = sequence(true, exposure("LIGHT"), StepStatus::Failed);
        assert!(!trigger.should_trigger_after(&seq, Some(step), None));

        let instruction = NodeKind::Instruction {
            name: "run_autofocus".to_string(),
        };
        let (seq, step) = sequence(true, instruction, StepStatus::Finished);
        assert!(!trigger.should_trigger_after(&seq, Some(step), None));

        assert!(!trigger.should_trigger_after(&seq, None, None));
        assert!(!trigger.should_trigger_after(&seq, Some(NodeId(42)), None));
        assert!(trigger.pending().is_none());
    }

    #[test]
    fn test_non_match_clears_stale_step() {
        let mut trigger = CaptureTrigger::new(reporter(true));
        let (seq, step) = sequence(true, exposure("LIGHT"), StepStatus::Finished);
        assert!(trigger.should_trigger_after(&seq, Some(step), None));

        let (seq, step) = sequence(true, exposure("DARK"), StepStatus::Finished);
        assert!(!trigger.should_trigger_after(&seq, Some(step), None));
        assert!(trigger.pending().is_none());
    }

    #[test]
    fn test_missing_target_aborts_and_clears() {
        let mut trigger = CaptureTrigger::new(reporter(true));
        let (seq, step) = sequence(false, exposure("LIGHT"), StepStatus::Finished);

        assert!(trigger.should_trigger_after(&seq, Some(step), None));
        assert!(trigger.execute(&seq, &EquipmentSnapshot::default()).is_none());
        assert!(trigger.pending().is_none());
    }

    #[test]
    fn test_disabled_reporting_clears_without_dispatch() {
        let mut trigger = CaptureTrigger::new(reporter(false));
        let (seq, step) = sequence(true, exposure("LIGHT"), StepStatus::Finished);

        assert!(trigger.should_trigger_after(&seq, Some(step), None));
        assert!(trigger.execute(&seq, &EquipmentSnapshot::default()).is_none());
        assert!(trigger.pending().is_none());
    }

    #[test]
    fn test_execute_without_armed_step_does_nothing() {
        let mut trigger = CaptureTrigger::new(reporter(true));
        let (seq, _) = sequence(true, exposure("LIGHT"), StepStatus::Finished);
        assert!(trigger.execute(&seq, &EquipmentSnapshot::default()).is_none());
    }
}
