//! Reference tracker: BYTE-style association per entity kind plus per-face
//! property accumulation.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::result::{
    DetectionKind, DirectionResult, EstimatorKind, ExecFlags, FaceResult, FrameResult,
    StabilizeFlags,
};
use crate::tracker::adapter::{TrackedEntity, TrackerAdapter, TrackerOutput};
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching::{self, AssignmentResult, Detection};
use crate::tracker::property::{EstimationGate, RecognitionGate};
use crate::tracker::rect::{Rect, iou_batch};
use crate::tracker::track::{Track, TrackState};

/// Configuration for the [`Stabilizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// What the tracker stabilizes
    pub functions: StabilizeFlags,
    /// Frames a lost track survives before removal
    pub retry_count: u32,
    /// Position hold, percent of the entity size
    pub pos_steadiness: u32,
    /// Size hold, percent of the entity size
    pub size_steadiness: u32,
    pub track_thresh: f32,
    pub low_thresh: f32,
    pub match_thresh: f32,
    /// Age and gender gate
    pub property: EstimationGate,
    pub recognition: RecognitionGate,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            functions: StabilizeFlags::BODY
                | StabilizeFlags::FACE
                | StabilizeFlags::DIRECTION
                | StabilizeFlags::AGE
                | StabilizeFlags::GENDER
                | StabilizeFlags::RECOGNITION,
            retry_count: 2,
            pos_steadiness: 30,
            size_steadiness: 30,
            track_thresh: 0.5,
            low_thresh: 0.1,
            match_thresh: 0.8,
            property: EstimationGate::default(),
            recognition: RecognitionGate::default(),
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<()> {
        let functions = self.functions;
        if functions.is_empty() {
            return Err(Error::Config("tracker functions must not be empty".into()));
        }
        let face_dependent = StabilizeFlags::DIRECTION
            | StabilizeFlags::AGE
            | StabilizeFlags::GENDER
            | StabilizeFlags::RECOGNITION;
        if functions.intersects(face_dependent) && !functions.contains(StabilizeFlags::FACE) {
            return Err(Error::Config(format!(
                "tracker functions {functions} need face tracking"
            )));
        }
        if self.pos_steadiness > 100 || self.size_steadiness > 100 {
            return Err(Error::Config("steadiness must be within 0..=100 percent".into()));
        }
        for (name, value) in [
            ("track_thresh", self.track_thresh),
            ("low_thresh", self.low_thresh),
            ("match_thresh", self.match_thresh),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::Config(format!("{name} must be within 0.0..=1.0, got {value}")));
            }
        }
        validate_gate("property", &self.property)?;
        validate_gate("recognition", &self.recognition.gate())?;
        if self.recognition.min_ratio > 100 {
            return Err(Error::Config("recognition min_ratio must be within 0..=100".into()));
        }
        Ok(())
    }
}

fn validate_gate(name: &str, gate: &EstimationGate) -> Result<()> {
    if gate.frame_count == 0 {
        return Err(Error::Config(format!("{name} frame_count must be positive")));
    }
    if gate.pitch_min > gate.pitch_max || gate.yaw_min > gate.yaw_max {
        return Err(Error::Config(format!("{name} angle range is inverted")));
    }
    Ok(())
}

/// Live and lost tracks of one entity kind.
#[derive(Debug, Clone)]
pub struct TrackSet {
    tracked: Vec<Track>,
    lost: Vec<Track>,
    frame_id: u32,
    next_id: i32,
    kalman_filter: KalmanFilter,
}

impl Default for TrackSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackSet {
    pub fn new() -> Self {
        Self {
            tracked: Vec::new(),
            lost: Vec::new(),
            frame_id: 0,
            next_id: 0,
            kalman_filter: KalmanFilter::default(),
        }
    }

    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    pub fn lost_count(&self) -> usize {
        self.lost.len()
    }

    /// Drop every track and restart numbering.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    fn next_track_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Associate this frame's detections with the known tracks.
    pub fn update(&mut self, detections: Vec<Detection>, config: &TrackerConfig) {
        self.frame_id += 1;

        let mut activated = Vec::new();
        let mut lost = Vec::new();

        // Step 1: split detections by score
        let (detections, detections_low): (Vec<_>, Vec<_>) = detections
            .into_iter()
            .filter(|d| d.score > config.low_thresh)
            .partition(|d| d.score >= config.track_thresh);

        let mut unconfirmed = Vec::new();
        let mut pool = Vec::new();
        for mut track in self.tracked.drain(..).chain(self.lost.drain(..)) {
            track.detection_index = None;
            if track.state == TrackState::Tracked && !track.is_activated {
                unconfirmed.push(track);
            } else {
                pool.push(track);
            }
        }

        // Step 2: first association, high-score detections
        for track in &mut pool {
            track.predict(&self.kalman_filter);
        }

        let pool_rects: Vec<Rect> = pool.iter().map(Track::rect).collect();
        let det_rects: Vec<Rect> = detections.iter().map(|d| d.bbox).collect();
        let mut dists = matching::iou_distance(&pool_rects, &det_rects);
        matching::fuse_score(&mut dists, &detections);

        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::linear_assignment(&dists, config.match_thresh);

        let mut pool: Vec<Option<Track>> = pool.into_iter().map(Some).collect();
        for (itracked, idet) in matches {
            if let Some(mut track) = pool[itracked].take() {
                track.update(&detections[idet], &self.kalman_filter, self.frame_id);
                activated.push(track);
            }
        }

        // Step 3: second association, low-score detections against still-tracked
        let mut remaining = Vec::new();
        for idx in unmatched_tracks {
            if let Some(track) = pool[idx].take() {
                if track.state == TrackState::Tracked {
                    remaining.push(track);
                } else {
                    lost.push(track);
                }
            }
        }

        let r_rects: Vec<Rect> = remaining.iter().map(Track::rect).collect();
        let low_rects: Vec<Rect> = detections_low.iter().map(|d| d.bbox).collect();
        let dists_second = matching::iou_distance(&r_rects, &low_rects);
        let AssignmentResult {
            matches: matches_second,
            unmatched_tracks: unmatched_second,
            ..
        } = matching::linear_assignment(&dists_second, 0.5);

        let mut remaining: Vec<Option<Track>> = remaining.into_iter().map(Some).collect();
        for (itracked, idet) in matches_second {
            if let Some(mut track) = remaining[itracked].take() {
                track.update(&detections_low[idet], &self.kalman_filter, self.frame_id);
                activated.push(track);
            }
        }
        for idx in unmatched_second {
            if let Some(mut track) = remaining[idx].take() {
                track.mark_lost();
                lost.push(track);
            }
        }

        // Unconfirmed tracks, usually with only one beginning frame
        let detections_rem: Vec<&Detection> =
            unmatched_detections.iter().map(|&i| &detections[i]).collect();
        let unconfirmed_rects: Vec<Rect> = unconfirmed.iter().map(Track::rect).collect();
        let det_rem_rects: Vec<Rect> = detections_rem.iter().map(|d| d.bbox).collect();
        let mut dist_unconfirmed = matching::iou_distance(&unconfirmed_rects, &det_rem_rects);
        let det_rem_owned: Vec<Detection> = detections_rem.iter().map(|&d| d.clone()).collect();
        matching::fuse_score(&mut dist_unconfirmed, &det_rem_owned);

        let AssignmentResult {
            matches: matches_unconfirmed,
            unmatched_tracks: unmatched_unconfirmed,
            unmatched_detections: unmatched_new,
        } = matching::linear_assignment(&dist_unconfirmed, 0.7);

        for (itracked, idet) in matches_unconfirmed {
            unconfirmed[itracked].update(detections_rem[idet], &self.kalman_filter, self.frame_id);
        }
        let mut removed = 0usize;
        for (idx, track) in unconfirmed.into_iter().enumerate() {
            if unmatched_unconfirmed.contains(&idx) {
                removed += 1;
            } else {
                activated.push(track);
            }
        }

        // Step 4: new tracks
        for idx in unmatched_new {
            let det = detections_rem[idx];
            if det.score < config.track_thresh + 0.1 {
                continue;
            }
            let mut track = Track::from_detection(det);
            let id = self.next_track_id();
            track.activate(&self.kalman_filter, id, self.frame_id);
            trace!(track_id = id, slot = det.index, "New track");
            activated.push(track);
        }

        // Step 5: age out lost tracks
        let frame_id = self.frame_id;
        lost.retain_mut(|track| {
            if frame_id - track.end_frame() > config.retry_count {
                track.mark_removed();
                removed += 1;
                false
            } else {
                true
            }
        });

        let (tracked, lost) = remove_duplicate_tracks(activated, lost);
        self.tracked = tracked;
        self.lost = lost;

        trace!(
            frame = self.frame_id,
            tracked = self.tracked.len(),
            lost = self.lost.len(),
            removed,
            "Track set updated"
        );
    }

    /// Confirmed tracks matched to a detection this frame.
    pub fn reported_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.tracked
            .iter_mut()
            .filter(|t| t.is_activated && t.detection_index.is_some())
    }
}

/// Drop the younger of any tracked/lost pair that overlap heavily.
fn remove_duplicate_tracks(tracked: Vec<Track>, lost: Vec<Track>) -> (Vec<Track>, Vec<Track>) {
    if tracked.is_empty() || lost.is_empty() {
        return (tracked, lost);
    }

    let a_rects: Vec<Rect> = tracked.iter().map(Track::rect).collect();
    let b_rects: Vec<Rect> = lost.iter().map(Track::rect).collect();
    let ious = iou_batch(&a_rects, &b_rects);

    let mut dupa = vec![false; tracked.len()];
    let mut dupb = vec![false; lost.len()];
    for ((i, j), &iou) in ious.indexed_iter() {
        if iou > 0.85 {
            let time_a = tracked[i].frame_id - tracked[i].start_frame;
            let time_b = lost[j].frame_id - lost[j].start_frame;
            if time_a > time_b {
                dupb[j] = true;
            } else {
                dupa[i] = true;
            }
        }
    }

    let keep = |tracks: Vec<Track>, dup: &[bool]| -> Vec<Track> {
        tracks
            .into_iter()
            .zip(dup)
            .filter_map(|(t, &d)| (!d).then_some(t))
            .collect()
    };
    (keep(tracked, &dupa), keep(lost, &dupb))
}

/// Multi-frame stabilizer for bodies and faces.
///
/// Keeps body and face identities in separate [`TrackSet`]s and, for face
/// tracks, accumulates age, gender and recognition samples until each
/// converges.
#[derive(Debug, Clone)]
pub struct Stabilizer {
    config: TrackerConfig,
    governed: Vec<EstimatorKind>,
    bodies: TrackSet,
    faces: TrackSet,
}

impl Stabilizer {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        let governed = EstimatorKind::ALL
            .into_iter()
            .filter(|kind| config.functions.contains(kind.stabilize_flag()))
            .collect();
        debug!(functions = %config.functions, "Stabilizer initialized");
        Ok(Self {
            config,
            governed,
            bodies: TrackSet::new(),
            faces: TrackSet::new(),
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Estimators whose tier this stabilizer reports.
    pub fn governed(&self) -> &[EstimatorKind] {
        &self.governed
    }

    fn track_bodies(&mut self, frame: &FrameResult) -> Vec<TrackedEntity> {
        self.bodies
            .update(matching::detections_from(frame.bodies()), &self.config);

        let (pos, size) = (self.config.pos_steadiness, self.config.size_steadiness);
        self.bodies
            .reported_mut()
            .filter_map(|track| {
                let (position, smoothed) = track.steady_report(pos, size);
                track.to_entity(position, smoothed, &[])
            })
            .collect()
    }

    fn track_faces(&mut self, executed: ExecFlags, frame: &FrameResult) -> Vec<TrackedEntity> {
        self.faces.update(
            matching::detections_from(frame.faces().iter().map(|f| &f.detection)),
            &self.config,
        );

        let config = &self.config;
        let governed = &self.governed;
        let use_direction = config.functions.contains(StabilizeFlags::DIRECTION);
        let mut entities = Vec::new();
        for track in self.faces.reported_mut() {
            let Some(face) = track.detection_index.and_then(|i| frame.faces().get(i)) else {
                continue;
            };
            let direction = if use_direction { face.direction.as_ref() } else { None };
            for &kind in governed {
                if executed.contains(kind.capability()) {
                    feed(track, face, kind, direction, config);
                }
            }

            let (position, size) =
                track.steady_report(config.pos_steadiness, config.size_steadiness);
            entities.extend(track.to_entity(position, size, governed));
        }
        entities
    }
}

fn feed(
    track: &mut Track,
    face: &FaceResult,
    kind: EstimatorKind,
    direction: Option<&DirectionResult>,
    config: &TrackerConfig,
) {
    let (Some(value), Some(confidence)) =
        (face.estimator_value(kind), face.estimator_confidence(kind))
    else {
        return;
    };
    let (gate, min_ratio) = match kind {
        EstimatorKind::Recognition => (config.recognition.gate(), config.recognition.min_ratio),
        EstimatorKind::Age | EstimatorKind::Gender => (config.property, 0),
    };
    track.property_mut(kind).feed(value, confidence, direction, &gate, min_ratio);
}

impl TrackerAdapter for Stabilizer {
    fn execute(&mut self, executed: ExecFlags, frame: &FrameResult) -> Result<TrackerOutput> {
        if executed.intersects(ExecFlags::FACE_ANY) && !executed.contains(ExecFlags::FACE) {
            return Err(Error::Tracker(format!(
                "face estimators {executed} ran without face detection"
            )));
        }

        let mut output = TrackerOutput::default();
        let functions = self.config.functions;
        if functions.contains(StabilizeFlags::BODY) && executed.contains(ExecFlags::BODY) {
            output.bodies = self.track_bodies(frame);
        }
        if functions.contains(StabilizeFlags::FACE) && executed.contains(ExecFlags::FACE) {
            output.faces = self.track_faces(executed, frame);
        }

        debug!(
            bodies = frame.len(DetectionKind::Body),
            faces = frame.len(DetectionKind::Face),
            tracked_bodies = output.body_count(),
            tracked_faces = output.face_count(),
            "Stabilized frame"
        );
        Ok(output)
    }

    fn finalize(&mut self) {
        debug!(
            body_frames = self.bodies.frame_id(),
            face_frames = self.faces.frame_id(),
            "Stabilizer finalized"
        );
        self.bodies.clear();
        self.faces.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::RawEntity;

    fn dets(entities: &[RawEntity]) -> Vec<Detection> {
        matching::detections_from(entities)
    }

    #[test]
    fn test_config_validation() {
        assert!(TrackerConfig::default().validate().is_ok());

        let mut config = TrackerConfig::default();
        config.functions = StabilizeFlags::BODY | StabilizeFlags::AGE;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = TrackerConfig::default();
        config.functions = StabilizeFlags::NONE;
        assert!(config.validate().is_err());

        let mut config = TrackerConfig::default();
        config.recognition.min_ratio = 101;
        assert!(config.validate().is_err());

        let mut config = TrackerConfig::default();
        config.property.yaw_min = 30;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_track_set_keeps_identity() {
        let config = TrackerConfig::default();
        let mut set = TrackSet::new();

        set.update(dets(&[RawEntity::new(100, 100, 50, 900)]), &config);
        let first: Vec<i32> = set.reported_mut().map(|t| t.track_id).collect();
        assert_eq!(first, vec![0]);

        let frame = [RawEntity::new(300, 300, 50, 900), RawEntity::new(103, 101, 50, 900)];
        set.update(dets(&frame), &config);
        let matched: Vec<(i32, Option<usize>)> = set
            .reported_mut()
            .map(|t| (t.track_id, t.detection_index))
            .collect();
        assert_eq!(matched, vec![(0, Some(1))]);
    }

    #[test]
    fn test_lost_track_removed_after_retry_count() {
        let config = TrackerConfig::default();
        let mut set = TrackSet::new();
        set.update(dets(&[RawEntity::new(100, 100, 50, 900)]), &config);

        for _ in 0..config.retry_count {
            set.update(Vec::new(), &config);
            assert_eq!(set.lost_count(), 1);
        }
        set.update(Vec::new(), &config);
        assert_eq!(set.lost_count(), 0);
    }

    #[test]
    fn test_clear_restarts_ids() {
        let config = TrackerConfig::default();
        let mut set = TrackSet::new();
        set.update(dets(&[RawEntity::new(10, 10, 40, 900)]), &config);
        set.clear();
        set.update(dets(&[RawEntity::new(500, 500, 40, 900)]), &config);
        assert_eq!(set.reported_mut().next().map(|t| t.track_id), Some(0));
    }

    #[test]
    fn test_rejects_face_estimators_without_face() {
        let mut stabilizer = Stabilizer::new(TrackerConfig::default()).unwrap();
        let frame = FrameResult::new(ExecFlags::AGE);
        assert!(matches!(
            stabilizer.execute(ExecFlags::AGE, &frame),
            Err(Error::Tracker(_))
        ));
    }
}
