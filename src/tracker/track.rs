//! Single body or face track.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2};

use crate::result::{EstimatorKind, Position};
use crate::tracker::adapter::{EstimatorState, TrackedEntity};
use crate::tracker::kalman_filter::KalmanFilter;
use crate::tracker::matching::Detection;
use crate::tracker::property::PropertyAccumulator;
use crate::tracker::rect::Rect;

/// Track lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackState {
    /// Created this frame, not yet confirmed
    #[default]
    New,
    Tracked,
    /// Missed for up to `retry_count` frames
    Lost,
    Removed,
}

/// Position and size last handed out for a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Reported {
    position: Position,
    size: i16,
}

#[derive(Debug, Clone)]
pub struct Track {
    /// Assigned on activation; `-1` before that
    pub track_id: i32,
    pub state: TrackState,
    /// Whether the track has been confirmed
    pub is_activated: bool,
    pub score: f32,
    pub frame_id: u32,
    pub start_frame: u32,
    pub tracklet_len: u32,
    /// Slot of the detection matched in the current frame
    pub detection_index: Option<usize>,
    mean: Option<Array1<f64>>,
    covariance: Option<Array2<f64>>,
    /// Last measured box
    bbox: Rect,
    reported: Option<Reported>,
    properties: BTreeMap<EstimatorKind, PropertyAccumulator>,
}

fn measurement(bbox: &Rect) -> [f64; 3] {
    bbox.to_cxys().map(f64::from)
}

impl Track {
    pub fn from_detection(det: &Detection) -> Self {
        Self {
            track_id: -1,
            state: TrackState::New,
            is_activated: false,
            score: det.score,
            frame_id: 0,
            start_frame: 0,
            tracklet_len: 0,
            detection_index: Some(det.index),
            mean: None,
            covariance: None,
            bbox: det.bbox,
            reported: None,
            properties: BTreeMap::new(),
        }
    }

    /// Current box estimate, falling back to the last measurement.
    pub fn rect(&self) -> Rect {
        match &self.mean {
            Some(mean) => Rect::from_center_size(mean[0] as f32, mean[1] as f32, mean[2] as f32),
            None => self.bbox,
        }
    }

    pub fn end_frame(&self) -> u32 {
        self.frame_id
    }

    pub fn activate(&mut self, kalman_filter: &KalmanFilter, track_id: i32, frame_id: u32) {
        self.track_id = track_id;

        let (mean, covariance) = kalman_filter.initiate(measurement(&self.bbox));
        self.mean = Some(mean);
        self.covariance = Some(covariance);
        self.tracklet_len = 0;
        self.state = TrackState::Tracked;

        if frame_id == 1 {
            self.is_activated = true;
        }

        self.frame_id = frame_id;
        self.start_frame = frame_id;
    }

    /// Absorb the detection matched this frame.
    pub fn update(&mut self, det: &Detection, kalman_filter: &KalmanFilter, frame_id: u32) {
        if self.state == TrackState::Tracked {
            self.tracklet_len += 1;
        } else {
            self.tracklet_len = 0;
        }

        if let (Some(mean), Some(cov)) = (&self.mean, &self.covariance) {
            match kalman_filter.update(mean, cov, measurement(&det.bbox)) {
                Some((new_mean, new_cov)) => {
                    self.mean = Some(new_mean);
                    self.covariance = Some(new_cov);
                }
                None => tracing::debug!(
                    track_id = self.track_id,
                    "Singular innovation, keeping prediction"
                ),
            }
        }

        self.bbox = det.bbox;
        self.detection_index = Some(det.index);
        self.state = TrackState::Tracked;
        self.is_activated = true;
        self.frame_id = frame_id;
        self.score = det.score;
    }

    pub fn predict(&mut self, kalman_filter: &KalmanFilter) {
        if let (Some(mean), Some(cov)) = (&self.mean, &self.covariance) {
            let mut mean_to_predict = mean.clone();
            if self.state != TrackState::Tracked {
                // Freeze size velocity while lost
                mean_to_predict[5] = 0.0;
            }
            let (new_mean, new_cov) = kalman_filter.predict(&mean_to_predict, cov);
            self.mean = Some(new_mean);
            self.covariance = Some(new_cov);
        }
    }

    pub fn mark_lost(&mut self) {
        self.state = TrackState::Lost;
        self.detection_index = None;
    }

    pub fn mark_removed(&mut self) {
        self.state = TrackState::Removed;
        self.detection_index = None;
    }

    /// Smoothed position and size, held while the change stays within the
    /// steadiness percentages of the current size.
    pub fn steady_report(&mut self, pos_steadiness: u32, size_steadiness: u32) -> (Position, i16) {
        let [cx, cy, size] = self.rect().to_cxys();
        let current = Reported {
            position: Position::new(to_i16(cx), to_i16(cy)),
            size: to_i16(size),
        };

        let next = match self.reported {
            Some(prev) => {
                let pos_tol = f32::from(current.size) * pos_steadiness as f32 / 100.0;
                let dx = f32::from(current.position.x) - f32::from(prev.position.x);
                let dy = f32::from(current.position.y) - f32::from(prev.position.y);
                let position = if dx.abs() <= pos_tol && dy.abs() <= pos_tol {
                    prev.position
                } else {
                    current.position
                };

                let size_tol = f32::from(current.size) * size_steadiness as f32 / 100.0;
                let size = if (f32::from(current.size) - f32::from(prev.size)).abs() <= size_tol {
                    prev.size
                } else {
                    current.size
                };
                Reported { position, size }
            }
            None => current,
        };

        self.reported = Some(next);
        (next.position, next.size)
    }

    /// Accumulator for `kind`, created on first use.
    pub fn property_mut(&mut self, kind: EstimatorKind) -> &mut PropertyAccumulator {
        self.properties
            .entry(kind)
            .or_insert_with(|| PropertyAccumulator::new(kind))
    }

    pub fn property_state(&self, kind: EstimatorKind) -> EstimatorState {
        self.properties
            .get(&kind)
            .map(PropertyAccumulator::state)
            .unwrap_or_default()
    }

    /// Contract view for the current frame; `None` when unmatched.
    pub fn to_entity(
        &self,
        position: Position,
        size: i16,
        governed: &[EstimatorKind],
    ) -> Option<TrackedEntity> {
        let index = i32::try_from(self.detection_index?).ok()?;
        let entity = governed
            .iter()
            .fold(TrackedEntity::new(self.track_id, index, position, size), |entity, &kind| {
                entity.with_estimator(kind, self.property_state(kind))
            });
        Some(entity)
    }
}

fn to_i16(v: f32) -> i16 {
    v.round().clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::RawEntity;
    use crate::tier::Tier;

    fn detection(index: usize, x: i16, y: i16, size: i16) -> Detection {
        Detection::from_entity(index, &RawEntity::new(x, y, size, 900))
    }

    #[test]
    fn test_activate_and_update() {
        let kf = KalmanFilter::new();
        let mut track = Track::from_detection(&detection(0, 100, 100, 50));
        track.activate(&kf, 0, 1);
        assert_eq!(track.track_id, 0);
        assert!(track.is_activated);
        assert_eq!(track.state, TrackState::Tracked);

        track.predict(&kf);
        track.update(&detection(2, 104, 100, 50), &kf, 2);
        assert_eq!(track.detection_index, Some(2));
        assert_eq!(track.tracklet_len, 1);
        let (cx, _) = track.rect().center();
        assert!(cx > 100.0 && cx < 104.0);
    }

    #[test]
    fn test_not_activated_after_first_frame() {
        let kf = KalmanFilter::new();
        let mut track = Track::from_detection(&detection(0, 10, 10, 40));
        track.activate(&kf, 3, 5);
        assert!(!track.is_activated);
        assert_eq!(track.start_frame, 5);
    }

    #[test]
    fn test_steady_report_holds_small_moves() {
        let kf = KalmanFilter::new();
        let mut track = Track::from_detection(&detection(0, 100, 100, 50));
        track.activate(&kf, 0, 1);
        assert_eq!(track.steady_report(30, 30), (Position::new(100, 100), 50));

        // 5px jitter is within 30% of 50
        track.update(&detection(0, 105, 100, 52), &kf, 2);
        assert_eq!(track.steady_report(30, 30), (Position::new(100, 100), 50));

        // No steadiness: follow the filter
        let (position, _) = track.steady_report(0, 0);
        assert_ne!(position, Position::new(100, 100));
    }

    #[test]
    fn test_to_entity_requires_match() {
        let kf = KalmanFilter::new();
        let mut track = Track::from_detection(&detection(1, 100, 100, 50));
        track.activate(&kf, 4, 1);
        track.property_mut(EstimatorKind::Age).feed(33, 900, None, &Default::default(), 0);

        let entity = track
            .to_entity(Position::new(1, 2), 50, &[EstimatorKind::Age, EstimatorKind::Gender])
            .unwrap();
        assert_eq!(entity.track_id, 4);
        assert_eq!(entity.detection_index, 1);
        assert_eq!(entity.estimator(EstimatorKind::Age).unwrap().tier, Tier::InProgress);
        assert_eq!(entity.estimator(EstimatorKind::Gender).unwrap().tier, Tier::Pending);

        track.mark_lost();
        assert!(track.to_entity(Position::new(1, 2), 50, &[]).is_none());
    }
}
