//! Contract between a stabilizing tracker and the fusion step.

use std::collections::BTreeMap;

use crate::Result;
use crate::result::{EstimatorKind, ExecFlags, FrameResult, Position};
use crate::tier::Tier;

/// Convergence state of one estimator for one tracked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EstimatorState {
    pub tier: Tier,
    /// Resolved value, present once `tier` is `Complete`.
    pub final_value: Option<i32>,
}

impl EstimatorState {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn in_progress() -> Self {
        Self {
            tier: Tier::InProgress,
            final_value: None,
        }
    }

    pub fn complete(value: i32) -> Self {
        Self {
            tier: Tier::Complete,
            final_value: Some(value),
        }
    }
}

/// A body or face as reported by the tracker for the current frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntity {
    /// Identifier stable across frames for the same physical entity
    pub track_id: i32,
    /// Slot of the matching record in this frame's raw sequence
    pub detection_index: i32,
    pub smoothed_position: Position,
    pub smoothed_size: i16,
    /// Estimators the tracker governs for this entity
    pub estimator_states: BTreeMap<EstimatorKind, EstimatorState>,
}

impl TrackedEntity {
    pub fn new(
        track_id: i32,
        detection_index: i32,
        smoothed_position: Position,
        smoothed_size: i16,
    ) -> Self {
        Self {
            track_id,
            detection_index,
            smoothed_position,
            smoothed_size,
            estimator_states: BTreeMap::new(),
        }
    }

    /// Attach an estimator state.
    pub fn with_estimator(mut self, kind: EstimatorKind, state: EstimatorState) -> Self {
        self.estimator_states.insert(kind, state);
        self
    }

    pub fn estimator(&self, kind: EstimatorKind) -> Option<&EstimatorState> {
        self.estimator_states.get(&kind)
    }
}

/// Tracked bodies and faces for one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackerOutput {
    pub bodies: Vec<TrackedEntity>,
    pub faces: Vec<TrackedEntity>,
}

impl TrackerOutput {
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Track id assigned to body slot `index`, if any.
    pub fn body_track_id(&self, index: usize) -> Option<i32> {
        find_track_id(&self.bodies, index)
    }

    /// Track id assigned to face slot `index`, if any.
    pub fn face_track_id(&self, index: usize) -> Option<i32> {
        find_track_id(&self.faces, index)
    }
}

fn find_track_id(entities: &[TrackedEntity], index: usize) -> Option<i32> {
    entities
        .iter()
        .find(|t| usize::try_from(t.detection_index).is_ok_and(|i| i == index))
        .map(|t| t.track_id)
}

/// Stateful multi-frame tracker consumed by the fusion pipeline.
///
/// Implementations own track-identity continuity and the evidence thresholds
/// that drive tier transitions; the fusion step only sees [`TrackerOutput`].
pub trait TrackerAdapter {
    /// Track the detections of one frame.
    ///
    /// An `Err` means the tracker is unavailable for this frame; the caller
    /// keeps the raw values.
    fn execute(&mut self, executed: ExecFlags, frame: &FrameResult) -> Result<TrackerOutput>;

    /// Release all internal state after the last frame.
    fn finalize(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_id_lookup() {
        let output = TrackerOutput {
            bodies: vec![TrackedEntity::new(7, 1, Position::new(0, 0), 10)],
            faces: vec![TrackedEntity::new(3, -1, Position::new(0, 0), 10)],
        };
        assert_eq!(output.body_track_id(1), Some(7));
        assert_eq!(output.body_track_id(0), None);
        assert_eq!(output.face_track_id(0), None);
        assert_eq!(output.body_count(), 1);
    }

    #[test]
    fn test_with_estimator() {
        let entity = TrackedEntity::new(0, 0, Position::new(1, 1), 5)
            .with_estimator(EstimatorKind::Age, EstimatorState::complete(34));
        assert_eq!(entity.estimator(EstimatorKind::Age).unwrap().final_value, Some(34));
        assert!(entity.estimator(EstimatorKind::Gender).is_none());
    }
}
