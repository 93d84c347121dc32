use std::path::Path;

use crate::detection::domain::detector_adapter::DetectionError;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::hand_detector::{HandDetector, HandDrawOptions};
use crate::detection::domain::hand_landmark_model::HandModelConfig;

use super::onnx_face_detection_model::{OnnxFaceDetectionModel, DEFAULT_CONFIDENCE};
use super::onnx_hand_landmark_model::OnnxHandLandmarkModel;

/// Builds the hand adapter on top of the ONNX palm + landmark models.
pub fn create_hand_detector(
    palm_model: &Path,
    landmark_model: &Path,
    config: HandModelConfig,
    options: HandDrawOptions,
) -> Result<HandDetector, DetectionError> {
    config.validate()?;
    let model = OnnxHandLandmarkModel::new(palm_model, landmark_model, config).map_err(|e| {
        DetectionError::ModelLoad {
            model: "hand landmark model".into(),
            reason: e.to_string(),
        }
    })?;
    log::info!(
        "Hand detector ready (max_hands={}, static_mode={}, detection={:.2}, tracking={:.2})",
        config.max_hands,
        config.static_mode,
        config.detection_confidence,
        config.tracking_confidence
    );
    Ok(HandDetector::new(Box::new(model), options))
}

/// Builds the face adapter on top of the ONNX BlazeFace model.
pub fn create_face_detector(face_model: &Path, draw: bool) -> Result<FaceDetector, DetectionError> {
    let model = OnnxFaceDetectionModel::new(face_model, DEFAULT_CONFIDENCE).map_err(|e| {
        DetectionError::ModelLoad {
            model: "face detection model".into(),
            reason: e.to_string(),
        }
    })?;
    log::info!("Face detector ready (confidence={:.2})", DEFAULT_CONFIDENCE);
    Ok(FaceDetector::new(Box::new(model), draw))
}
