//! Builder for assembling `FrameResult`s by hand.

use crate::error::{Error, Result};
use crate::result::{
    AgeResult, BlinkResult, DirectionResult, ExecFlags, Expression, ExpressionResult, FaceResult,
    FrameResult, GazeResult, GenderResult, RawEntity, RecognitionResult, VerificationResult,
};

/// Builder for creating a `FrameResult`.
///
/// Each added record also marks its capability as executed. Estimator
/// setters attach to the most recently added face.
#[derive(Debug, Clone, Default)]
pub struct FrameResultBuilder {
    frame: FrameResult,
    executed: ExecFlags,
    current_face: Option<FaceResult>,
    orphan: Option<&'static str>,
}

impl FrameResultBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark capabilities as executed even when they produced no record.
    pub fn executed(mut self, flags: ExecFlags) -> Self {
        self.executed |= flags;
        self
    }

    pub fn body(mut self, x: i16, y: i16, size: i16, confidence: i16) -> Self {
        self.executed |= ExecFlags::BODY;
        self.frame.push_body(RawEntity::new(x, y, size, confidence));
        self
    }

    pub fn hand(mut self, x: i16, y: i16, size: i16, confidence: i16) -> Self {
        self.executed |= ExecFlags::HAND;
        self.frame.push_hand(RawEntity::new(x, y, size, confidence));
        self
    }

    /// Start a new face record.
    pub fn face(mut self, x: i16, y: i16, size: i16, confidence: i16) -> Self {
        self.flush_face();
        self.executed |= ExecFlags::FACE;
        self.current_face = Some(FaceResult::new(RawEntity::new(x, y, size, confidence)));
        self
    }

    fn with_face(
        mut self,
        flag: ExecFlags,
        name: &'static str,
        apply: impl FnOnce(&mut FaceResult),
    ) -> Self {
        match self.current_face.as_mut() {
            Some(face) => {
                apply(face);
                self.executed |= flag;
            }
            None => self.orphan = Some(name),
        }
        self
    }

    pub fn direction(self, yaw: i16, pitch: i16, roll: i16, confidence: i16) -> Self {
        self.with_face(ExecFlags::DIRECTION, "direction", |f| {
            f.direction = Some(DirectionResult {
                yaw,
                pitch,
                roll,
                confidence,
            });
        })
    }

    pub fn age(self, age: i8, confidence: i32) -> Self {
        self.with_face(ExecFlags::AGE, "age", |f| f.age = Some(AgeResult { age, confidence }))
    }

    pub fn gender(self, gender: i8, confidence: i32) -> Self {
        self.with_face(ExecFlags::GENDER, "gender", |f| {
            f.gender = Some(GenderResult { gender, confidence });
        })
    }

    pub fn gaze(self, lr: i8, ud: i8) -> Self {
        self.with_face(ExecFlags::GAZE, "gaze", |f| f.gaze = Some(GazeResult { lr, ud }))
    }

    pub fn blink(self, left: i8, right: i8) -> Self {
        self.with_face(ExecFlags::BLINK, "blink", |f| f.blink = Some(BlinkResult { left, right }))
    }

    pub fn expression(self, scores: [i8; 5], top: Expression, degree: i8) -> Self {
        self.with_face(ExecFlags::EXPRESSION, "expression", |f| {
            f.expression = Some(ExpressionResult { scores, top, degree });
        })
    }

    pub fn recognition(self, uid: i32, confidence: i32) -> Self {
        self.with_face(ExecFlags::RECOGNITION, "recognition", |f| {
            f.recognition = Some(RecognitionResult { uid, confidence });
        })
    }

    pub fn verification(self, auth: i32, confidence: i32) -> Self {
        self.with_face(ExecFlags::VERIFICATION, "verification", |f| {
            f.verification = Some(VerificationResult { auth, confidence });
        })
    }

    fn flush_face(&mut self) {
        if let Some(face) = self.current_face.take() {
            self.frame.push_face(face);
        }
    }

    /// Build the final `FrameResult`.
    ///
    /// Fails when an estimator was set before any face was added.
    pub fn build(mut self) -> Result<FrameResult> {
        if let Some(name) = self.orphan {
            return Err(Error::InvalidInput(format!("{name} result added before any face")));
        }
        self.flush_face();

        let mut frame = FrameResult::new(self.executed);
        for body in self.frame.bodies() {
            frame.push_body(*body);
        }
        for hand in self.frame.hands() {
            frame.push_hand(*hand);
        }
        for face in self.frame.faces() {
            frame.push_face(*face);
        }
        Ok(frame)
    }
}
