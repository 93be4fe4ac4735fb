//! Detection-result fusion.
//!
//! Merges a tracker's stabilized view of the current frame back into the raw
//! detector output:
//!
//! 1. tracked entities whose detection slot does not exist in this frame are
//!    skipped, since detector and tracker may be one frame apart;
//! 2. position and size are replaced by the smoothed values;
//! 3. every governed estimator that ran gets its confidence offset by the tier
//!    (see [`crate::tier`]) and, once complete, its value replaced by the
//!    tracker's final value;
//! 4. sentinel values ("not possible", "not enrolled") are left untouched.

use tracing::{debug, warn};

use crate::result::{DetectionKind, EstimatorKind, FrameResult};
use crate::tier::{COMPLETE_OFFSET, IN_PROGRESS_OFFSET, Tier};
use crate::tracker::{EstimatorState, TrackedEntity, TrackerOutput};

/// Outcome of one merge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FusionReport {
    pub bodies_merged: usize,
    pub faces_merged: usize,
    /// Tracked entities dropped for an out-of-range or repeated slot
    pub skipped: usize,
    /// Estimator confidences that received a tier offset
    pub tiers_applied: usize,
    /// Estimators left alone because the raw value is a sentinel
    pub sentinels: usize,
}

/// Merges tracker output into a frame in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct FusionResolver;

impl FusionResolver {
    pub fn new() -> Self {
        Self
    }

    /// Merge `tracks` into `frame`.
    ///
    /// Never fails: entities that cannot be placed are counted in
    /// [`FusionReport::skipped`]. When several entities name the same slot,
    /// only the first is merged and the rest are skipped.
    pub fn resolve(&self, frame: &mut FrameResult, tracks: &TrackerOutput) -> FusionReport {
        let mut report = FusionReport::default();

        let mut claimed = vec![false; frame.len(DetectionKind::Body)];
        for tracked in &tracks.bodies {
            let Some(slot) = claim_slot(tracked, &mut claimed) else {
                debug!(
                    track_id = tracked.track_id,
                    detection_index = tracked.detection_index,
                    bodies = claimed.len(),
                    "Skipping tracked body without a matching detection"
                );
                report.skipped += 1;
                continue;
            };
            frame.set_position(
                DetectionKind::Body,
                slot,
                tracked.smoothed_position,
                tracked.smoothed_size,
            );
            report.bodies_merged += 1;
        }

        let mut claimed = vec![false; frame.len(DetectionKind::Face)];
        for tracked in &tracks.faces {
            let Some(slot) = claim_slot(tracked, &mut claimed) else {
                debug!(
                    track_id = tracked.track_id,
                    detection_index = tracked.detection_index,
                    faces = claimed.len(),
                    "Skipping tracked face without a matching detection"
                );
                report.skipped += 1;
                continue;
            };
            frame.set_position(
                DetectionKind::Face,
                slot,
                tracked.smoothed_position,
                tracked.smoothed_size,
            );
            report.faces_merged += 1;

            for (&kind, state) in &tracked.estimator_states {
                if frame.executed().contains(kind.capability()) {
                    self.apply_tier(frame, slot, tracked.track_id, kind, state, &mut report);
                }
            }
        }

        report
    }

    fn apply_tier(
        &self,
        frame: &mut FrameResult,
        slot: usize,
        track_id: i32,
        kind: EstimatorKind,
        state: &EstimatorState,
        report: &mut FusionReport,
    ) {
        let face = frame.face(slot);
        if face.estimator_value(kind).is_none() {
            return;
        }
        if face.estimator_is_sentinel(kind) {
            report.sentinels += 1;
            return;
        }

        match state.tier {
            Tier::Pending => {}
            Tier::InProgress => {
                frame.add_confidence_tier(slot, kind, IN_PROGRESS_OFFSET);
                report.tiers_applied += 1;
            }
            Tier::Complete => {
                match state.final_value {
                    Some(value) => {
                        if !frame.set_estimator_value(slot, kind, value) {
                            warn!(
                                track_id,
                                ?kind,
                                value,
                                "Final value does not fit the estimator field"
                            );
                        }
                    }
                    None => warn!(track_id, ?kind, "Complete estimate without a final value"),
                }
                frame.add_confidence_tier(slot, kind, COMPLETE_OFFSET);
                report.tiers_applied += 1;
            }
        }
    }
}

/// Resolve a tracked entity's detection index to an unclaimed slot.
fn claim_slot(tracked: &TrackedEntity, claimed: &mut [bool]) -> Option<usize> {
    let slot = usize::try_from(tracked.detection_index).ok()?;
    let taken = claimed.get_mut(slot)?;
    if *taken {
        return None;
    }
    *taken = true;
    Some(slot)
}
