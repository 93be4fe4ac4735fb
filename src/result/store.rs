//! One frame's raw detector output, mutable in place by the fusion step.

use serde::{Deserialize, Serialize};

use super::entity::{DetectionKind, EstimatorKind, FaceResult, Position, RawEntity};
use super::flags::ExecFlags;

/// Raw detector output for a single frame.
///
/// Index operations panic on out-of-range slots: an invalid index here means
/// the caller's capability mask disagrees with what the device produced.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameResult {
    executed: ExecFlags,
    bodies: Vec<RawEntity>,
    hands: Vec<RawEntity>,
    faces: Vec<FaceResult>,
}

impl FrameResult {
    pub fn new(executed: ExecFlags) -> Self {
        Self {
            executed,
            ..Self::default()
        }
    }

    pub fn executed(&self) -> ExecFlags {
        self.executed
    }

    pub fn bodies(&self) -> &[RawEntity] {
        &self.bodies
    }

    pub fn hands(&self) -> &[RawEntity] {
        &self.hands
    }

    pub fn faces(&self) -> &[FaceResult] {
        &self.faces
    }

    pub fn push_body(&mut self, entity: RawEntity) -> usize {
        self.bodies.push(entity);
        self.bodies.len() - 1
    }

    pub fn push_hand(&mut self, entity: RawEntity) -> usize {
        self.hands.push(entity);
        self.hands.len() - 1
    }

    pub fn push_face(&mut self, face: FaceResult) -> usize {
        self.faces.push(face);
        self.faces.len() - 1
    }

    /// Number of populated slots for `kind`.
    pub fn len(&self, kind: DetectionKind) -> usize {
        match kind {
            DetectionKind::Body => self.bodies.len(),
            DetectionKind::Hand => self.hands.len(),
            DetectionKind::Face => self.faces.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty() && self.hands.is_empty() && self.faces.is_empty()
    }

    /// Detection record at `index` for `kind`.
    pub fn entity(&self, kind: DetectionKind, index: usize) -> &RawEntity {
        let len = self.len(kind);
        assert!(index < len, "{kind:?} index {index} out of range (len {len})");
        match kind {
            DetectionKind::Body => &self.bodies[index],
            DetectionKind::Hand => &self.hands[index],
            DetectionKind::Face => &self.faces[index].detection,
        }
    }

    /// Face record, including estimator results, at `index`.
    pub fn face(&self, index: usize) -> &FaceResult {
        let len = self.faces.len();
        assert!(index < len, "Face index {index} out of range (len {len})");
        &self.faces[index]
    }

    fn entity_mut(&mut self, kind: DetectionKind, index: usize) -> &mut RawEntity {
        let len = self.len(kind);
        assert!(index < len, "{kind:?} index {index} out of range (len {len})");
        match kind {
            DetectionKind::Body => &mut self.bodies[index],
            DetectionKind::Hand => &mut self.hands[index],
            DetectionKind::Face => &mut self.faces[index].detection,
        }
    }

    pub(crate) fn face_mut(&mut self, index: usize) -> &mut FaceResult {
        let len = self.faces.len();
        assert!(index < len, "Face index {index} out of range (len {len})");
        &mut self.faces[index]
    }

    /// Replace position and size of one detection. Confidence is kept.
    pub fn set_position(
        &mut self,
        kind: DetectionKind,
        index: usize,
        position: Position,
        size: i16,
    ) {
        let entity = self.entity_mut(kind, index);
        entity.position = position;
        entity.size = size;
    }

    /// Add `delta` to the confidence of `estimator` on face `index`.
    ///
    /// Does nothing when the estimator did not run for this frame. Panics
    /// when `index` is out of range.
    pub fn add_confidence_tier(&mut self, index: usize, estimator: EstimatorKind, delta: i32) {
        let face = self.face_mut(index);
        let confidence = match estimator {
            EstimatorKind::Age => face.age.as_mut().map(|r| &mut r.confidence),
            EstimatorKind::Gender => face.gender.as_mut().map(|r| &mut r.confidence),
            EstimatorKind::Recognition => face.recognition.as_mut().map(|r| &mut r.confidence),
        };
        if let Some(confidence) = confidence {
            *confidence = confidence.saturating_add(delta);
        }
    }

    /// Overwrite the value of `estimator` on face `index`.
    ///
    /// Returns `false` when the estimator did not run or `value` does not fit
    /// the field.
    pub(crate) fn set_estimator_value(
        &mut self,
        index: usize,
        estimator: EstimatorKind,
        value: i32,
    ) -> bool {
        let face = self.face_mut(index);
        match estimator {
            EstimatorKind::Age => match (face.age.as_mut(), i8::try_from(value)) {
                (Some(r), Ok(v)) => {
                    r.age = v;
                    true
                }
                _ => false,
            },
            EstimatorKind::Gender => match (face.gender.as_mut(), i8::try_from(value)) {
                (Some(r), Ok(v)) => {
                    r.gender = v;
                    true
                }
                _ => false,
            },
            EstimatorKind::Recognition => match face.recognition.as_mut() {
                Some(r) => {
                    r.uid = value;
                    true
                }
                None => false,
            },
        }
    }

    /// Keep only the records of capabilities in `flags`.
    pub fn restrict_to(&mut self, flags: ExecFlags) {
        self.executed = self.executed & flags;
        if !self.executed.contains(ExecFlags::BODY) {
            self.bodies.clear();
        }
        if !self.executed.contains(ExecFlags::HAND) {
            self.hands.clear();
        }
        if !self.executed.intersects(ExecFlags::FACE_ANY) {
            self.faces.clear();
            return;
        }
        let executed = self.executed;
        for face in &mut self.faces {
            if !executed.contains(ExecFlags::DIRECTION) {
                face.direction = None;
            }
            if !executed.contains(ExecFlags::AGE) {
                face.age = None;
            }
            if !executed.contains(ExecFlags::GENDER) {
                face.gender = None;
            }
            if !executed.contains(ExecFlags::GAZE) {
                face.gaze = None;
            }
            if !executed.contains(ExecFlags::BLINK) {
                face.blink = None;
            }
            if !executed.contains(ExecFlags::EXPRESSION) {
                face.expression = None;
            }
            if !executed.contains(ExecFlags::RECOGNITION) {
                face.recognition = None;
            }
            if !executed.contains(ExecFlags::VERIFICATION) {
                face.verification = None;
            }
        }
    }

    /// Drop detections for which `keep` returns false.
    pub fn retain(&mut self, kind: DetectionKind, mut keep: impl FnMut(&RawEntity) -> bool) {
        match kind {
            DetectionKind::Body => self.bodies.retain(|e| keep(e)),
            DetectionKind::Hand => self.hands.retain(|e| keep(e)),
            DetectionKind::Face => self.faces.retain(|f| keep(&f.detection)),
        }
    }
}
