//! Temporal stabilization and detection-result fusion for HVC vision sensors.
//!
//! A sensor frame ([`FrameResult`]) carries raw body, hand and face detections
//! plus per-face estimates. A [`TrackerAdapter`] follows those entities across
//! frames; the [`FusionResolver`] then writes the tracker's smoothed positions
//! back into the frame and encodes each estimate's convergence state into its
//! confidence (see [`tier`]).
//!
//! ```ignore
//! use hvc_fusion::{ExecFlags, FramePipeline, ReplayDevice, TrackerConfig};
//!
//! let device = ReplayDevice::from_file("session.json")?;
//! let mut pipeline = FramePipeline::with_stabilizer(device, TrackerConfig::default())?;
//! let fused = pipeline.process_frame(ExecFlags::FACE | ExecFlags::AGE)?;
//! ```

pub mod album;
pub mod config;
pub mod error;
pub mod format;
pub mod fusion;
pub mod integration;
pub mod result;
pub mod tier;
pub mod tracker;

pub use config::Config;
pub use error::{Error, Result};
pub use format::ResultFormatter;
pub use fusion::{FusionReport, FusionResolver};
pub use integration::{
    DeviceSettings, FramePipeline, FrameResultBuilder, FusedFrame, ReplayDevice, SensorDevice,
};
pub use result::{DetectionKind, EstimatorKind, ExecFlags, FaceResult, FrameResult, StabilizeFlags};
pub use tier::{Tier, TieredConfidence};
pub use tracker::{
    EstimatorState, Stabilizer, TrackedEntity, TrackerAdapter, TrackerConfig, TrackerOutput,
};
