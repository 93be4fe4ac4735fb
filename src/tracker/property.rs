//! Per-track accumulation of slow-converging face estimates.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::result::{DirectionResult, EstimatorKind, NOT_ENROLLED, NOT_POSSIBLE};
use crate::tier::Tier;
use crate::tracker::adapter::EstimatorState;

/// Which samples are trusted enough to count toward a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationGate {
    /// Minimum raw estimator confidence
    pub threshold: i32,
    /// Accepted face pitch (up/down) in degrees, inclusive
    pub pitch_min: i16,
    pub pitch_max: i16,
    /// Accepted face yaw (left/right) in degrees, inclusive
    pub yaw_min: i16,
    pub yaw_max: i16,
    /// Samples needed to complete
    pub frame_count: u32,
}

impl Default for EstimationGate {
    fn default() -> Self {
        Self {
            threshold: 300,
            pitch_min: -15,
            pitch_max: 20,
            yaw_min: -20,
            yaw_max: 20,
            frame_count: 10,
        }
    }
}

impl EstimationGate {
    /// Check a sample against the gate.
    ///
    /// Angle limits are only enforced when the face direction ran.
    pub fn accepts(&self, confidence: i32, direction: Option<&DirectionResult>) -> bool {
        if confidence < self.threshold {
            return false;
        }
        direction.is_none_or(|d| {
            (self.pitch_min..=self.pitch_max).contains(&d.pitch)
                && (self.yaw_min..=self.yaw_max).contains(&d.yaw)
        })
    }
}

/// Gate and vote ratio for face recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionGate {
    pub threshold: i32,
    pub pitch_min: i16,
    pub pitch_max: i16,
    pub yaw_min: i16,
    pub yaw_max: i16,
    pub frame_count: u32,
    /// Share of samples, in percent, the winning uid must reach
    pub min_ratio: u32,
}

impl Default for RecognitionGate {
    fn default() -> Self {
        Self {
            threshold: 300,
            pitch_min: -15,
            pitch_max: 20,
            yaw_min: -20,
            yaw_max: 20,
            frame_count: 5,
            min_ratio: 60,
        }
    }
}

impl RecognitionGate {
    /// Sample gate part of the recognition settings.
    pub fn gate(&self) -> EstimationGate {
        EstimationGate {
            threshold: self.threshold,
            pitch_min: self.pitch_min,
            pitch_max: self.pitch_max,
            yaw_min: self.yaw_min,
            yaw_max: self.yaw_max,
            frame_count: self.frame_count,
        }
    }
}

/// Sample window for one estimator of one face track.
#[derive(Debug, Clone)]
pub struct PropertyAccumulator {
    kind: EstimatorKind,
    samples: VecDeque<i32>,
    state: EstimatorState,
}

impl PropertyAccumulator {
    pub fn new(kind: EstimatorKind) -> Self {
        Self {
            kind,
            samples: VecDeque::new(),
            state: EstimatorState::pending(),
        }
    }

    pub fn kind(&self) -> EstimatorKind {
        self.kind
    }

    pub fn state(&self) -> EstimatorState {
        self.state
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Offer one raw sample.
    ///
    /// `min_ratio` is the vote share required for recognition and is ignored
    /// for age and gender. Sentinel values never count, and a completed
    /// accumulator ignores further samples.
    pub fn feed(
        &mut self,
        value: i32,
        confidence: i32,
        direction: Option<&DirectionResult>,
        gate: &EstimationGate,
        min_ratio: u32,
    ) {
        if self.state.tier == Tier::Complete || value == NOT_POSSIBLE || value == NOT_ENROLLED {
            return;
        }
        if !gate.accepts(confidence, direction) {
            return;
        }

        self.samples.push_back(value);
        self.state = EstimatorState::in_progress();

        let needed = usize::try_from(gate.frame_count).unwrap_or(usize::MAX).max(1);
        if self.samples.len() < needed {
            return;
        }

        match self.resolve(min_ratio) {
            Some(value) => {
                tracing::debug!(
                    kind = ?self.kind,
                    value,
                    samples = self.samples.len(),
                    "Estimate complete"
                );
                self.samples.clear();
                self.state = EstimatorState::complete(value);
            }
            None => {
                self.samples.pop_front();
            }
        }
    }

    fn resolve(&self, min_ratio: u32) -> Option<i32> {
        match self.kind {
            EstimatorKind::Age => {
                let sum: i64 = self.samples.iter().map(|&v| i64::from(v)).sum();
                let mean = sum as f64 / self.samples.len() as f64;
                Some(mean.round() as i32)
            }
            EstimatorKind::Gender => most_frequent(&self.samples).map(|(value, _)| value),
            EstimatorKind::Recognition => {
                let (uid, count) = most_frequent(&self.samples)?;
                let share = count * 100 / self.samples.len();
                (share >= min_ratio as usize).then_some(uid)
            }
        }
    }
}

/// Most frequent value and its count; ties go to the latest sample.
fn most_frequent(samples: &VecDeque<i32>) -> Option<(i32, usize)> {
    let mut best: Option<(i32, usize)> = None;
    for &candidate in samples.iter().rev() {
        let count = samples.iter().filter(|&&v| v == candidate).count();
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((candidate, count));
        }
    }
    best
}
