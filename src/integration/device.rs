//! Trait for sensor devices that produce per-frame results.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::result::{ExecFlags, FrameResult};

/// Inclusive detection size window in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: i16,
    pub max: i16,
}

impl SizeRange {
    pub const fn new(min: i16, max: i16) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, size: i16) -> bool {
        (self.min..=self.max).contains(&size)
    }
}

/// Detector thresholds and size limits pushed to the device before execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceSettings {
    pub body_threshold: i16,
    pub hand_threshold: i16,
    pub face_threshold: i16,
    pub recognition_threshold: i32,
    pub verify_threshold: i32,
    pub body_size: SizeRange,
    pub hand_size: SizeRange,
    pub face_size: SizeRange,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            body_threshold: 500,
            hand_threshold: 500,
            face_threshold: 500,
            recognition_threshold: 500,
            verify_threshold: 500,
            body_size: SizeRange::new(30, 8192),
            hand_size: SizeRange::new(40, 8192),
            face_size: SizeRange::new(64, 8192),
        }
    }
}

impl DeviceSettings {
    pub fn validate(&self) -> Result<()> {
        for (name, range) in [
            ("body", self.body_size),
            ("hand", self.hand_size),
            ("face", self.face_size),
        ] {
            if range.min < 0 || range.min > range.max {
                return Err(Error::Config(format!(
                    "{name} size range {}..{} is invalid",
                    range.min, range.max
                )));
            }
        }
        let thresholds = [
            i32::from(self.body_threshold),
            i32::from(self.hand_threshold),
            i32::from(self.face_threshold),
            self.recognition_threshold,
            self.verify_threshold,
        ];
        if thresholds.iter().any(|&t| !(1..=1000).contains(&t)) {
            return Err(Error::Config("device thresholds must be within 1..=1000".into()));
        }
        Ok(())
    }
}

/// Source of frame results.
///
/// Implement this to connect a physical sensor, a simulator or a recording to
/// the fusion pipeline.
///
/// # Example
///
/// ```ignore
/// use hvc_fusion::{ExecFlags, FrameResult, SensorDevice};
///
/// struct Camera;
///
/// impl SensorDevice for Camera {
///     type Error = std::io::Error;
///
///     fn execute(&mut self, flags: ExecFlags) -> Result<FrameResult, Self::Error> {
///         Ok(FrameResult::new(flags))
///     }
/// }
/// ```
pub trait SensorDevice {
    /// Error type for device failures.
    type Error;

    /// Run the requested capabilities on the next frame.
    ///
    /// The returned frame reports the capabilities that actually ran.
    fn execute(&mut self, flags: ExecFlags) -> std::result::Result<FrameResult, Self::Error>;

    /// Apply thresholds and size limits. Devices without such settings keep
    /// the default no-op.
    fn configure(&mut self, settings: &DeviceSettings) -> std::result::Result<(), Self::Error> {
        let _ = settings;
        Ok(())
    }
}
