use crate::detection::domain::detector_adapter::DetectionError;
use crate::shared::frame::Frame;
use crate::shared::landmark::NormalizedLandmark;

/// Settings for the external hand landmark model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandModelConfig {
    /// Run palm detection on every frame instead of tracking between frames.
    pub static_mode: bool,
    pub max_hands: usize,
    pub detection_confidence: f32,
    pub tracking_confidence: f32,
}

impl Default for HandModelConfig {
    fn default() -> Self {
        Self {
            static_mode: false,
            max_hands: 2,
            detection_confidence: 0.5,
            tracking_confidence: 0.5,
        }
    }
}

impl HandModelConfig {
    pub fn validate(&self) -> Result<(), DetectionError> {
        if self.max_hands == 0 {
            return Err(DetectionError::InvalidConfig(
                "max_hands must be at least 1".into(),
            ));
        }
        check_unit_range("detection_confidence", self.detection_confidence)?;
        check_unit_range("tracking_confidence", self.tracking_confidence)?;
        Ok(())
    }
}

fn check_unit_range(name: &str, value: f32) -> Result<(), DetectionError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(DetectionError::InvalidConfig(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

/// One hand reported by the model, landmarks in MediaPipe order.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedHand {
    pub landmarks: Vec<NormalizedLandmark>,
    pub score: f32,
    pub handedness: Handedness,
}

/// Domain interface for the hand landmark model.
///
/// Stateful in tracking mode (the previous frame's hands seed the next
/// search), hence `&mut self`.
pub trait HandLandmarkModel: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedHand>, Box<dyn std::error::Error>>;

    /// Forgets any tracking state, e.g. after switching sources.
    fn reset(&mut self) {}
}
