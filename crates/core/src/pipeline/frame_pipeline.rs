use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use crate::detection::domain::detector_adapter::{
    DetectionError, Detection, DetectorAdapter, DetectorKind,
};
use crate::pipeline::active_detector::{ActiveDetector, ControlMessage};
use crate::pipeline::fps_counter::FpsCounter;
use crate::shared::frame::Frame;

/// Result of running one frame through the detector stage.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub frame: Frame,
    pub detection: Detection,
    pub fps: Option<u32>,
    /// Detector that was active for this frame.
    pub active: ActiveDetector,
}

/// Creates the channel the interactive surface uses to switch detectors.
pub fn control_channel() -> (Sender<ControlMessage>, Receiver<ControlMessage>) {
    crossbeam_channel::unbounded()
}

/// Routes frames through the active detector adapter and times them.
///
/// Detector changes arrive as [`ControlMessage`]s and are applied between
/// frames, never while an adapter is running.
pub struct FramePipeline {
    hand: Option<Box<dyn DetectorAdapter>>,
    face: Option<Box<dyn DetectorAdapter>>,
    active: ActiveDetector,
    control_rx: Receiver<ControlMessage>,
    fps: FpsCounter,
}

impl FramePipeline {
    pub fn new(active: ActiveDetector, control_rx: Receiver<ControlMessage>) -> Self {
        Self {
            hand: None,
            face: None,
            active,
            control_rx,
            fps: FpsCounter::new(),
        }
    }

    pub fn with_adapter(mut self, adapter: Box<dyn DetectorAdapter>) -> Self {
        self.install(adapter);
        self
    }

    /// Installs `adapter` in the slot for its kind, replacing any previous one.
    pub fn install(&mut self, adapter: Box<dyn DetectorAdapter>) {
        let kind = adapter.kind();
        log::debug!("Installing {kind} detector");
        *self.slot(kind) = Some(adapter);
    }

    pub fn is_installed(&self, kind: DetectorKind) -> bool {
        match kind {
            DetectorKind::Hand => self.hand.is_some(),
            DetectorKind::Face => self.face.is_some(),
        }
    }

    pub fn active(&self) -> ActiveDetector {
        self.active
    }

    /// Applies every pending control message. Returns the resulting state.
    pub fn apply_control(&mut self) -> ActiveDetector {
        let before = self.active;
        for message in self.control_rx.try_iter() {
            self.active = self.active.apply(message);
        }
        if self.active != before {
            log::info!("Active detector: {} -> {}", before, self.active);
            if let Some(kind) = before.kind() {
                if let Some(adapter) = self.slot(kind).as_mut() {
                    adapter.reset();
                }
            }
        }
        self.active
    }

    /// Annotates `frame` with the active detector and measures the rate.
    ///
    /// With no detector active, or the active one not installed, the frame
    /// passes through unchanged with [`Detection::None`].
    pub fn process(&mut self, frame: &Frame, now: Instant) -> Result<PipelineOutput, DetectionError> {
        let active = self.apply_control();
        let fps = self.fps.tick(now);

        let adapter = match active.kind() {
            Some(kind) => self.slot(kind).as_mut(),
            None => None,
        };
        let (annotated, detection) = match adapter {
            Some(adapter) => {
                let result = adapter.annotate(frame)?;
                (result.frame, result.detection)
            }
            None => (frame.clone(), Detection::None),
        };

        Ok(PipelineOutput {
            frame: annotated,
            detection,
            fps,
            active,
        })
    }

    /// Restarts rate measurement, e.g. after switching sources.
    pub fn reset_timing(&mut self) {
        self.fps.reset();
    }

    fn slot(&mut self, kind: DetectorKind) -> &mut Option<Box<dyn DetectorAdapter>> {
        match kind {
            DetectorKind::Hand => &mut self.hand,
            DetectorKind::Face => &mut self.face,
        }
    }
}
