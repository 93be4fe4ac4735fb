//! FramePipeline for combining a sensor device with stabilization.

use tracing::{debug, warn};

use crate::fusion::{FusionReport, FusionResolver};
use crate::result::{ExecFlags, FrameResult};
use crate::tracker::{Stabilizer, TrackerAdapter, TrackerConfig, TrackerOutput};

use super::device::{DeviceSettings, SensorDevice};

/// One processed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusedFrame {
    /// Device output, with tracker results merged in when available
    pub frame: FrameResult,
    /// Tracker view of the frame; `None` when it passed through raw
    pub tracks: Option<TrackerOutput>,
    pub report: FusionReport,
}

impl FusedFrame {
    fn raw(frame: FrameResult) -> Self {
        Self {
            frame,
            tracks: None,
            report: FusionReport::default(),
        }
    }

    /// Whether tracker results were merged into this frame.
    pub fn is_stabilized(&self) -> bool {
        self.tracks.is_some()
    }
}

/// Runs a device frame by frame and merges tracker output into each frame.
///
/// Without a tracker, or when the tracker fails for a frame, the device
/// output is returned untouched. The tracker is finalized when the pipeline
/// is dropped.
pub struct FramePipeline<D: SensorDevice, T: TrackerAdapter = Stabilizer> {
    device: D,
    tracker: Option<T>,
    resolver: FusionResolver,
    frames: u64,
}

impl<D: SensorDevice> FramePipeline<D, Stabilizer> {
    /// Create a pipeline with the bundled stabilizer.
    pub fn with_stabilizer(device: D, config: TrackerConfig) -> crate::Result<Self> {
        Ok(Self::new(device, Some(Stabilizer::new(config)?)))
    }
}

impl<D: SensorDevice, T: TrackerAdapter> FramePipeline<D, T> {
    pub fn new(device: D, tracker: Option<T>) -> Self {
        Self {
            device,
            tracker,
            resolver: FusionResolver::new(),
            frames: 0,
        }
    }

    /// Create a pipeline that passes device output through unchanged.
    pub fn without_tracker(device: D) -> Self {
        Self::new(device, None)
    }

    /// Push thresholds and size ranges to the device.
    pub fn configure(&mut self, settings: &DeviceSettings) -> Result<(), D::Error> {
        self.device.configure(settings)
    }

    /// Execute `flags` on the device and stabilize the result.
    ///
    /// Only device errors are returned; tracker failures degrade to raw
    /// output for that frame.
    pub fn process_frame(&mut self, flags: ExecFlags) -> Result<FusedFrame, D::Error> {
        let mut frame = self.device.execute(flags)?;
        self.frames += 1;

        let Some(tracker) = self.tracker.as_mut() else {
            return Ok(FusedFrame::raw(frame));
        };

        match tracker.execute(frame.executed(), &frame) {
            Ok(tracks) => {
                let report = self.resolver.resolve(&mut frame, &tracks);
                debug!(frame = self.frames, ?report, "Merged tracker output");
                Ok(FusedFrame {
                    frame,
                    tracks: Some(tracks),
                    report,
                })
            }
            Err(err) => {
                warn!(frame = self.frames, %err, "Tracker unavailable, keeping raw results");
                Ok(FusedFrame::raw(frame))
            }
        }
    }

    /// Frames pulled from the device so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn tracker(&self) -> Option<&T> {
        self.tracker.as_ref()
    }

    pub fn tracker_mut(&mut self) -> Option<&mut T> {
        self.tracker.as_mut()
    }
}

impl<D: SensorDevice, T: TrackerAdapter> Drop for FramePipeline<D, T> {
    fn drop(&mut self) {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.finalize();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::error::Error;
    use crate::integration::FrameResultBuilder;

    struct MockDevice {
        frame: FrameResult,
    }

    impl SensorDevice for MockDevice {
        type Error = std::convert::Infallible;

        fn execute(&mut self, _flags: ExecFlags) -> Result<FrameResult, Self::Error> {
            Ok(self.frame.clone())
        }
    }

    struct FailingTracker {
        finalized: Rc<Cell<bool>>,
    }

    impl TrackerAdapter for FailingTracker {
        fn execute(
            &mut self,
            _executed: ExecFlags,
            _frame: &FrameResult,
        ) -> crate::Result<TrackerOutput> {
            Err(Error::Tracker("offline".into()))
        }

        fn finalize(&mut self) {
            self.finalized.set(true);
        }
    }

    fn device() -> MockDevice {
        MockDevice {
            frame: FrameResultBuilder::new()
                .face(100, 100, 80, 900)
                .age(30, 700)
                .build()
                .unwrap(),
        }
    }

    #[test]
    fn test_tracker_failure_passes_through() {
        let finalized = Rc::new(Cell::new(false));
        let mut pipeline = FramePipeline::new(
            device(),
            Some(FailingTracker {
                finalized: Rc::clone(&finalized),
            }),
        );

        let fused = pipeline.process_frame(ExecFlags::FACE | ExecFlags::AGE).unwrap();
        assert!(!fused.is_stabilized());
        assert_eq!(fused.frame, device().frame);
        assert_eq!(pipeline.frame_count(), 1);

        drop(pipeline);
        assert!(finalized.get());
    }

    #[test]
    fn test_stabilized_frame() {
        let mut pipeline =
            FramePipeline::with_stabilizer(device(), TrackerConfig::default()).unwrap();
        let fused = pipeline.process_frame(ExecFlags::FACE | ExecFlags::AGE).unwrap();

        assert!(fused.is_stabilized());
        assert_eq!(fused.report.faces_merged, 1);
        // One accepted sample: in progress
        assert_eq!(fused.frame.face(0).age.unwrap().confidence, 10_700);
    }
}
