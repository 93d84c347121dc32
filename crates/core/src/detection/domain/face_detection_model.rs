use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// A face found by the model, in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceDetection {
    pub bbox: BoundingBox,
    pub score: f32,
}

/// Domain interface for the face detection model.
///
/// Results are ordered by descending score.
pub trait FaceDetectionModel: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>>;
}
