//! Text rendering of processed frames.

use std::fmt::{self, Write};

use crate::integration::FusedFrame;
use crate::result::{
    AgeResult, ExecFlags, FaceResult, FrameResult, GENDER_MALE, GenderResult, NOT_ENROLLED,
    NOT_POSSIBLE, RawEntity, RecognitionResult, VerificationResult,
};
use crate::tier::TieredConfidence;
use crate::tracker::TrackerOutput;

const INDENT: &str = "      ";

/// Renders frames in the sensor console layout.
///
/// Tracking ids and tier markers appear only for stabilized frames; raw
/// frames print confidences as reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultFormatter;

impl ResultFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, fused: &FusedFrame) -> String {
        let mut out = String::new();
        // Writing to a String never fails
        let _ = self.write_frame(&mut out, &fused.frame, fused.tracks.as_ref());
        out
    }

    pub fn write_frame(
        &self,
        out: &mut impl Write,
        frame: &FrameResult,
        tracks: Option<&TrackerOutput>,
    ) -> fmt::Result {
        let executed = frame.executed();

        if executed.contains(ExecFlags::BODY) {
            writeln!(out, " Body result count:{}", frame.bodies().len())?;
            for (i, body) in frame.bodies().iter().enumerate() {
                let track_id = tracks.map(|t| t.body_track_id(i).unwrap_or(-1));
                write_detection(out, i, track_id, body)?;
            }
        }

        if executed.contains(ExecFlags::HAND) {
            writeln!(out, " Hand result count:{}", frame.hands().len())?;
            for (i, hand) in frame.hands().iter().enumerate() {
                write_detection(out, i, None, hand)?;
            }
        }

        if executed.intersects(ExecFlags::FACE_ANY) {
            writeln!(out, " Face result count:{}", frame.faces().len())?;
            for (i, face) in frame.faces().iter().enumerate() {
                if executed.contains(ExecFlags::FACE) {
                    let track_id = tracks.map(|t| t.face_track_id(i).unwrap_or(-1));
                    write_detection(out, i, track_id, &face.detection)?;
                }
                self.write_face(out, face, tracks.is_some())?;
            }
        }
        Ok(())
    }

    fn write_face(&self, out: &mut impl Write, face: &FaceResult, stabilized: bool) -> fmt::Result {
        if let Some(dir) = &face.direction {
            writeln!(
                out,
                "{INDENT}Face Direction\tLR:{} UD:{} Roll:{} Confidence:{}",
                dir.yaw, dir.pitch, dir.roll, dir.confidence
            )?;
        }
        if let Some(age) = &face.age {
            write_age(out, age, stabilized)?;
        }
        if let Some(gender) = &face.gender {
            write_gender(out, gender, stabilized)?;
        }
        if let Some(gaze) = &face.gaze {
            if gaze.is_sentinel() {
                writeln!(out, "{INDENT}Gaze\t\tEstimation not possible")?;
            } else {
                writeln!(out, "{INDENT}Gaze\t\tLR:{} UD:{}", gaze.lr, gaze.ud)?;
            }
        }
        if let Some(blink) = &face.blink {
            if blink.is_sentinel() {
                writeln!(out, "{INDENT}Blink\t\tEstimation not possible")?;
            } else {
                writeln!(out, "{INDENT}Blink\t\tLeft:{} Right:{}", blink.left, blink.right)?;
            }
        }
        if let Some(expr) = &face.expression {
            if expr.is_sentinel() {
                writeln!(out, "{INDENT}Expression\tEstimation not possible")?;
            } else {
                let [s0, s1, s2, s3, s4] = expr.scores;
                write!(out, "{INDENT}Expression\tExpression:{} ", expr.top.label())?;
                writeln!(out, "Score:{s0}, {s1}, {s2}, {s3}, {s4} Degree:{}", expr.degree)?;
            }
        }
        if let Some(rec) = &face.recognition {
            write_recognition(out, rec, stabilized)?;
        }
        if let Some(ver) = &face.verification {
            write_verification(out, ver)?;
        }
        Ok(())
    }
}

fn write_detection(
    out: &mut impl Write,
    index: usize,
    track_id: Option<i32>,
    entity: &RawEntity,
) -> fmt::Result {
    match track_id {
        Some(id) => write!(out, "{INDENT}Index:{index} TR_ID:{id} ")?,
        None => write!(out, "{INDENT}Index:{index} \t\t")?,
    }
    writeln!(
        out,
        "X:{} Y:{} Size:{} Confidence:{}",
        entity.position.x, entity.position.y, entity.size, entity.confidence
    )
}

/// Confidence text, decoded and suffixed with the tier marker when stabilized.
fn confidence(value: i32, stabilized: bool) -> String {
    if stabilized {
        let tiered = TieredConfidence::decode(value);
        format!("{} {}", tiered.raw, tiered.tier.marker())
    } else {
        value.to_string()
    }
}

fn write_age(out: &mut impl Write, age: &AgeResult, stabilized: bool) -> fmt::Result {
    if age.is_sentinel() {
        return writeln!(out, "{INDENT}Age\t\tEstimation not possible");
    }
    writeln!(
        out,
        "{INDENT}Age\t\tAge:{} Confidence:{}",
        age.age,
        confidence(age.confidence, stabilized)
    )
}

fn write_gender(out: &mut impl Write, gender: &GenderResult, stabilized: bool) -> fmt::Result {
    if gender.is_sentinel() {
        return writeln!(out, "{INDENT}Gender\t\tEstimation not possible");
    }
    let label = if gender.gender == GENDER_MALE { "Male" } else { "Female" };
    writeln!(
        out,
        "{INDENT}Gender\t\tGender:{label} Confidence:{}",
        confidence(gender.confidence, stabilized)
    )
}

fn write_recognition(
    out: &mut impl Write,
    rec: &RecognitionResult,
    stabilized: bool,
) -> fmt::Result {
    match rec.uid {
        NOT_POSSIBLE => writeln!(out, "{INDENT}Recognition\tRecognition not possible"),
        NOT_ENROLLED => writeln!(out, "{INDENT}Recognition\tNot registered"),
        uid => writeln!(
            out,
            "{INDENT}Recognition\tID:{uid} Confidence:{}",
            confidence(rec.confidence, stabilized)
        ),
    }
}

fn write_verification(out: &mut impl Write, ver: &VerificationResult) -> fmt::Result {
    match ver.auth {
        NOT_POSSIBLE => writeln!(out, "{INDENT}Verify\tVerify not possible"),
        NOT_ENROLLED => writeln!(out, "{INDENT}Verify\tNot registered"),
        auth => writeln!(
            out,
            "{INDENT}Verify\tResult:0x{:04X} Confidence:{}",
            auth & 0xFFFF,
            ver.confidence
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::FusionReport;
    use crate::integration::FrameResultBuilder;
    use crate::result::{Expression, Position};
    use crate::tracker::TrackedEntity;

    fn fused(frame: FrameResult, tracks: Option<TrackerOutput>) -> FusedFrame {
        FusedFrame {
            frame,
            tracks,
            report: FusionReport::default(),
        }
    }

    #[test]
    fn test_raw_frame() {
        let frame = FrameResultBuilder::new()
            .body(10, 20, 50, 700)
            .face(100, 110, 64, 800)
            .age(-128, 0)
            .gender(0, 650)
            .build()
            .unwrap();

        let text = ResultFormatter::new().render(&fused(frame, None));
        assert_eq!(
            text,
            " Body result count:1\n\
             \x20     Index:0 \t\tX:10 Y:20 Size:50 Confidence:700\n\
             \x20Face result count:1\n\
             \x20     Index:0 \t\tX:100 Y:110 Size:64 Confidence:800\n\
             \x20     Age\t\tEstimation not possible\n\
             \x20     Gender\t\tGender:Female Confidence:650\n"
        );
    }

    #[test]
    fn test_stabilized_markers_and_track_ids() {
        let frame = FrameResultBuilder::new()
            .face(100, 110, 64, 800)
            .age(34, 20_450)
            .gender(1, 10_300)
            .recognition(7, 120)
            .build()
            .unwrap();
        let tracks = TrackerOutput {
            bodies: Vec::new(),
            faces: vec![TrackedEntity::new(5, 0, Position::new(100, 110), 64)],
        };

        let text = ResultFormatter::new().render(&fused(frame, Some(tracks)));
        assert!(text.contains("Index:0 TR_ID:5 X:100 Y:110 Size:64 Confidence:800"));
        assert!(text.contains("Age\t\tAge:34 Confidence:450 (*)"));
        assert!(text.contains("Gender\t\tGender:Male Confidence:300 (-)"));
        assert!(text.contains("Recognition\tID:7 Confidence:120 (x)"));
    }

    #[test]
    fn test_untracked_slot_and_sentinels() {
        let frame = FrameResultBuilder::new()
            .body(1, 1, 40, 600)
            .face(0, 0, 64, 900)
            .recognition(NOT_ENROLLED, 0)
            .verification(0x1_0001, 800)
            .expression([-128, 0, 0, 0, 0], Expression::Unknown, 0)
            .build()
            .unwrap();

        let text = ResultFormatter::new().render(&fused(frame, Some(TrackerOutput::default())));
        assert!(text.contains("Index:0 TR_ID:-1 X:1"));
        assert!(text.contains("Recognition\tNot registered"));
        assert!(text.contains("Verify\tResult:0x0001 Confidence:800"));
        assert!(text.contains("Expression\tEstimation not possible"));
    }
}
