//! Device that plays back recorded frames.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::album::Album;
use crate::error::{Error, Result};
use crate::result::{DetectionKind, ExecFlags, FrameResult, NOT_ENROLLED};

use super::device::{DeviceSettings, SensorDevice};

/// Plays back a recording of `FrameResult`s stored as a JSON array.
///
/// Every execute call returns the next recorded frame restricted to the
/// requested capabilities, with the configured thresholds and size ranges
/// applied the way the sensor would apply them. Like the sensor, it only
/// recognizes faces while an album is loaded.
#[derive(Debug, Clone, Default)]
pub struct ReplayDevice {
    frames: VecDeque<FrameResult>,
    settings: DeviceSettings,
    album: Option<Album>,
    played: usize,
}

impl ReplayDevice {
    pub fn new(frames: Vec<FrameResult>) -> Self {
        Self {
            frames: frames.into(),
            settings: DeviceSettings::default(),
            album: None,
            played: 0,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let frames: Vec<FrameResult> = serde_json::from_str(json)?;
        Ok(Self::new(frames))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let device = Self::from_json(&fs::read_to_string(path)?)?;
        info!(path = %path.display(), frames = device.remaining(), "Loaded replay");
        Ok(device)
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn played(&self) -> usize {
        self.played
    }

    pub fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    /// Install the album recognition results are matched against.
    pub fn load_album(&mut self, album: Album) {
        debug!(bytes = album.len(), "Album installed");
        self.album = Some(album);
    }

    pub fn album(&self) -> Option<&Album> {
        self.album.as_ref()
    }

    fn apply_settings(&self, frame: &mut FrameResult) {
        let s = &self.settings;
        let enrolled = self.album.is_some();
        frame.retain(DetectionKind::Body, |e| {
            e.confidence >= s.body_threshold && s.body_size.contains(e.size)
        });
        frame.retain(DetectionKind::Hand, |e| {
            e.confidence >= s.hand_threshold && s.hand_size.contains(e.size)
        });
        frame.retain(DetectionKind::Face, |e| {
            e.confidence >= s.face_threshold && s.face_size.contains(e.size)
        });

        for index in 0..frame.len(DetectionKind::Face) {
            let face = frame.face_mut(index);
            if let Some(rec) = face.recognition.as_mut() {
                let rejected = !enrolled || rec.confidence < s.recognition_threshold;
                if !rec.is_sentinel() && rejected {
                    rec.uid = NOT_ENROLLED;
                }
            }
            if let Some(ver) = face.verification.as_mut() {
                if !ver.is_sentinel() && ver.confidence < s.verify_threshold {
                    ver.auth = 0;
                }
            }
        }
    }
}

impl SensorDevice for ReplayDevice {
    type Error = Error;

    fn execute(&mut self, flags: ExecFlags) -> Result<FrameResult> {
        let mut frame = self.frames.pop_front().ok_or_else(|| {
            Error::Replay(format!("recording exhausted after {} frames", self.played))
        })?;
        self.played += 1;

        frame.restrict_to(flags);
        self.apply_settings(&mut frame);
        debug!(
            frame = self.played,
            executed = %frame.executed(),
            bodies = frame.len(DetectionKind::Body),
            hands = frame.len(DetectionKind::Hand),
            faces = frame.len(DetectionKind::Face),
            "Replayed frame"
        );
        Ok(frame)
    }

    fn configure(&mut self, settings: &DeviceSettings) -> Result<()> {
        settings.validate()?;
        self.settings = settings.clone();
        Ok(())
    }
}
