//! Integration module for connecting sensor devices with the stabilizer.
//!
//! This module provides the device trait, a replay device for recorded
//! sessions and the pipeline that runs detection, tracking and fusion one
//! frame at a time.

mod builder;
mod device;
mod pipeline;
mod replay;

pub use builder::FrameResultBuilder;
pub use device::{DeviceSettings, SensorDevice, SizeRange};
pub use pipeline::{FramePipeline, FusedFrame};
pub use replay::ReplayDevice;
