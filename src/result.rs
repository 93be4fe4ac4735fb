//! Frame result store: raw per-frame detector output.

mod entity;
mod flags;
mod store;

pub use entity::{
    AgeResult, BlinkResult, DetectionKind, DirectionResult, EstimatorKind, Expression,
    ExpressionResult, FaceResult, GENDER_FEMALE, GENDER_MALE, GazeResult, GenderResult,
    NOT_ENROLLED, NOT_POSSIBLE, Position, RawEntity, RecognitionResult, VerificationResult,
};
pub use flags::{ExecFlags, StabilizeFlags};
pub use store::FrameResult;
