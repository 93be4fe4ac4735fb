//! Per-entity records produced by the device for one frame.

use serde::{Deserialize, Serialize};

use super::flags::{ExecFlags, StabilizeFlags};

/// Estimation was not possible for this entity.
pub const NOT_POSSIBLE: i32 = -128;

/// The recognized or verified face is not enrolled in the album.
pub const NOT_ENROLLED: i32 = -127;

/// Gender value reported for a male face.
pub const GENDER_MALE: i8 = 1;

/// Gender value reported for a female face.
pub const GENDER_FEMALE: i8 = 0;

/// Center point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

impl Position {
    #[inline]
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// Raw detection of one body, hand or face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawEntity {
    pub position: Position,
    pub size: i16,
    pub confidence: i16,
}

impl RawEntity {
    pub fn new(x: i16, y: i16, size: i16, confidence: i16) -> Self {
        Self {
            position: Position::new(x, y),
            size,
            confidence,
        }
    }
}

/// Which detection sequence of the frame an index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetectionKind {
    Body,
    Hand,
    Face,
}

/// Slow-converging estimators a tracker can stabilize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EstimatorKind {
    Age,
    Gender,
    Recognition,
}

impl EstimatorKind {
    pub const ALL: [EstimatorKind; 3] = [Self::Age, Self::Gender, Self::Recognition];

    /// Device capability producing this estimator.
    pub const fn capability(self) -> ExecFlags {
        match self {
            Self::Age => ExecFlags::AGE,
            Self::Gender => ExecFlags::GENDER,
            Self::Recognition => ExecFlags::RECOGNITION,
        }
    }

    /// Tracker function stabilizing this estimator.
    pub const fn stabilize_flag(self) -> StabilizeFlags {
        match self {
            Self::Age => StabilizeFlags::AGE,
            Self::Gender => StabilizeFlags::GENDER,
            Self::Recognition => StabilizeFlags::RECOGNITION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DirectionResult {
    /// Left/right angle in degrees
    pub yaw: i16,
    /// Up/down angle in degrees
    pub pitch: i16,
    pub roll: i16,
    pub confidence: i16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgeResult {
    pub age: i8,
    pub confidence: i32,
}

impl AgeResult {
    pub fn is_sentinel(&self) -> bool {
        i32::from(self.age) == NOT_POSSIBLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenderResult {
    pub gender: i8,
    pub confidence: i32,
}

impl GenderResult {
    pub fn is_sentinel(&self) -> bool {
        i32::from(self.gender) == NOT_POSSIBLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GazeResult {
    pub lr: i8,
    pub ud: i8,
}

impl GazeResult {
    pub fn is_sentinel(&self) -> bool {
        i32::from(self.lr) == NOT_POSSIBLE || i32::from(self.ud) == NOT_POSSIBLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlinkResult {
    pub left: i8,
    pub right: i8,
}

impl BlinkResult {
    pub fn is_sentinel(&self) -> bool {
        i32::from(self.left) == NOT_POSSIBLE || i32::from(self.right) == NOT_POSSIBLE
    }
}

/// Facial expression reported as the top score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Expression {
    Unknown,
    Neutral,
    Happiness,
    Surprise,
    Anger,
    Sadness,
}

impl Expression {
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "?",
            Self::Neutral => "Neutral",
            Self::Happiness => "Happiness",
            Self::Surprise => "Surprise",
            Self::Anger => "Anger",
            Self::Sadness => "Sadness",
        }
    }
}

impl From<Expression> for u8 {
    fn from(value: Expression) -> Self {
        value as u8
    }
}

/// Codes above the known range decode as `Unknown`.
impl From<u8> for Expression {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Neutral,
            2 => Self::Happiness,
            3 => Self::Surprise,
            4 => Self::Anger,
            5 => Self::Sadness,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionResult {
    pub scores: [i8; 5],
    pub top: Expression,
    pub degree: i8,
}

impl ExpressionResult {
    pub fn is_sentinel(&self) -> bool {
        i32::from(self.scores[0]) == NOT_POSSIBLE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub uid: i32,
    pub confidence: i32,
}

impl RecognitionResult {
    pub fn is_sentinel(&self) -> bool {
        self.uid == NOT_POSSIBLE || self.uid == NOT_ENROLLED
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VerificationResult {
    pub auth: i32,
    pub confidence: i32,
}

impl VerificationResult {
    pub fn is_sentinel(&self) -> bool {
        self.auth == NOT_POSSIBLE || self.auth == NOT_ENROLLED
    }
}

/// A detected face and every estimator result attached to it.
///
/// Each `Option` is `Some` exactly when the matching capability ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceResult {
    pub detection: RawEntity,
    pub direction: Option<DirectionResult>,
    pub age: Option<AgeResult>,
    pub gender: Option<GenderResult>,
    pub gaze: Option<GazeResult>,
    pub blink: Option<BlinkResult>,
    pub expression: Option<ExpressionResult>,
    pub recognition: Option<RecognitionResult>,
    pub verification: Option<VerificationResult>,
}

impl FaceResult {
    pub fn new(detection: RawEntity) -> Self {
        Self {
            detection,
            ..Self::default()
        }
    }

    /// Confidence field of a stabilizable estimator, if it ran.
    pub fn estimator_confidence(&self, kind: EstimatorKind) -> Option<i32> {
        match kind {
            EstimatorKind::Age => self.age.map(|r| r.confidence),
            EstimatorKind::Gender => self.gender.map(|r| r.confidence),
            EstimatorKind::Recognition => self.recognition.map(|r| r.confidence),
        }
    }

    /// Value of a stabilizable estimator widened to `i32`, if it ran.
    pub fn estimator_value(&self, kind: EstimatorKind) -> Option<i32> {
        match kind {
            EstimatorKind::Age => self.age.map(|r| i32::from(r.age)),
            EstimatorKind::Gender => self.gender.map(|r| i32::from(r.gender)),
            EstimatorKind::Recognition => self.recognition.map(|r| r.uid),
        }
    }

    /// True when the estimator ran and reported a sentinel.
    pub fn estimator_is_sentinel(&self, kind: EstimatorKind) -> bool {
        match kind {
            EstimatorKind::Age => self.age.is_some_and(|r| r.is_sentinel()),
            EstimatorKind::Gender => self.gender.is_some_and(|r| r.is_sentinel()),
            EstimatorKind::Recognition => self.recognition.is_some_and(|r| r.is_sentinel()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        assert!(AgeResult { age: -128, confidence: 0 }.is_sentinel());
        assert!(!AgeResult { age: -1, confidence: 0 }.is_sentinel());
        assert!(RecognitionResult { uid: -127, confidence: 0 }.is_sentinel());
        assert!(RecognitionResult { uid: -128, confidence: 0 }.is_sentinel());
        assert!(!RecognitionResult { uid: 3, confidence: 0 }.is_sentinel());
        assert!(VerificationResult { auth: -127, confidence: 0 }.is_sentinel());
        assert!(GazeResult { lr: 4, ud: -128 }.is_sentinel());
    }

    #[test]
    fn test_expression_codes() {
        assert_eq!(Expression::from(2), Expression::Happiness);
        assert_eq!(Expression::from(6), Expression::Unknown);
        assert_eq!(u8::from(Expression::Sadness), 5);
        assert_eq!(u8::from(Expression::Sadness), 5);
        assert_eq!(Expression::Unknown.label(), "?");
    }

    #[test]
    fn test_estimator_accessors() {
        let mut face = FaceResult::new(RawEntity::new(10, 20, 64, 700));
        assert_eq!(face.estimator_value(EstimatorKind::Age), None);
        face.age = Some(AgeResult { age: 31, confidence: 420 });
        face.recognition = Some(RecognitionResult { uid: -127, confidence: 0 });
        assert_eq!(face.estimator_value(EstimatorKind::Age), Some(31));
        assert_eq!(face.estimator_confidence(EstimatorKind::Age), Some(420));
        assert!(face.estimator_is_sentinel(EstimatorKind::Recognition));
        assert!(!face.estimator_is_sentinel(EstimatorKind::Gender));
    }
}
