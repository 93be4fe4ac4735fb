//! Multi-frame tracking.
//!
//! [`TrackerAdapter`] is the seam the fusion pipeline talks to; [`Stabilizer`]
//! is the bundled implementation.

mod adapter;
mod kalman_filter;
mod matching;
mod property;
mod rect;
mod stabilizer;
mod track;

pub use adapter::{EstimatorState, TrackedEntity, TrackerAdapter, TrackerOutput};
pub use matching::Detection;
pub use property::{EstimationGate, PropertyAccumulator, RecognitionGate};
pub use rect::Rect;
pub use stabilizer::{Stabilizer, TrackSet, TrackerConfig};
pub use track::{Track, TrackState};
