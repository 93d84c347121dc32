//! Scripted stand-ins for the external models.

use crate::detection::domain::face_detection_model::{FaceDetection, FaceDetectionModel};
use crate::detection::domain::hand_landmark_model::{DetectedHand, HandLandmarkModel, Handedness};
use crate::shared::frame::Frame;
use crate::shared::landmark::NormalizedLandmark;

/// Returns the same hands for every frame.
pub(crate) struct StubHandModel {
    pub hands: Vec<DetectedHand>,
}

impl StubHandModel {
    pub fn empty() -> Self {
        Self { hands: vec![] }
    }

    pub fn with_hands(hands: Vec<DetectedHand>) -> Self {
        Self { hands }
    }
}

impl HandLandmarkModel for StubHandModel {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectedHand>, Box<dyn std::error::Error>> {
        Ok(self.hands.clone())
    }
}

/// Fails on every call.
pub(crate) struct FailingHandModel;

impl HandLandmarkModel for FailingHandModel {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<DetectedHand>, Box<dyn std::error::Error>> {
        Err("model exploded".into())
    }
}

/// A hand whose 21 landmarks lie on a diagonal from `start` to `end`.
pub(crate) fn diagonal_hand(start: f32, end: f32) -> DetectedHand {
    let landmarks = (0..21)
        .map(|i| {
            let t = start + (end - start) * i as f32 / 20.0;
            NormalizedLandmark::new(t, t, 0.0)
        })
        .collect();
    DetectedHand {
        landmarks,
        score: 0.9,
        handedness: Handedness::Right,
    }
}

/// Returns the same faces for every frame.
pub(crate) struct StubFaceModel {
    pub faces: Vec<FaceDetection>,
}

impl StubFaceModel {
    pub fn with_faces(faces: Vec<FaceDetection>) -> Self {
        Self { faces }
    }

    pub fn empty() -> Self {
        Self { faces: vec![] }
    }
}

impl FaceDetectionModel for StubFaceModel {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
        Ok(self.faces.clone())
    }
}
