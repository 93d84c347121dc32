/// Two-stage MediaPipe hand pipeline using ONNX Runtime via `ort`.
///
/// Palm detection proposes a square crop per hand; the landmark model then
/// regresses 21 keypoints inside each crop. Outside static mode, the crop
/// for the next frame is derived from this frame's landmarks, so palm
/// detection only reruns while fewer than `max_hands` hands are tracked.
use std::path::Path;

use crate::detection::domain::hand_landmark_model::{
    DetectedHand, HandLandmarkModel, HandModelConfig, Handedness,
};
use crate::shared::constants::HAND_LANDMARK_COUNT;
use crate::shared::frame::Frame;
use crate::shared::landmark::NormalizedLandmark;

use super::math::bbox_iou;
use super::onnx_palm_detector::OnnxPalmDetector;
use super::onnx_session::load_session;
use super::roi::SquareRoi;

const INPUT_SIZE: u32 = 224;

/// Landmark bounds → next-frame crop expansion.
const TRACKING_ROI_SCALE: f32 = 2.0;

/// Presence required for a hand found via fresh palm detection.
const NEW_HAND_PRESENCE: f32 = 0.5;

/// A new palm overlapping a tracked hand this much is the same hand.
const DUPLICATE_IOU: f32 = 0.5;

/// Crops smaller than this (in pixels) are not worth running.
const MIN_ROI_SIZE: f32 = 8.0;

/// Raw landmark-model output for one crop, in frame pixel coordinates.
struct LandmarkResult {
    points: Vec<[f32; 3]>,
    presence: f32,
    handedness: Handedness,
}

pub struct OnnxHandLandmarkModel {
    palm_detector: OnnxPalmDetector,
    session: ort::session::Session,
    config: HandModelConfig,
    tracked: Vec<SquareRoi>,
}

impl OnnxHandLandmarkModel {
    pub fn new(
        palm_model_path: &Path,
        landmark_model_path: &Path,
        config: HandModelConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        config.validate()?;
        Ok(Self {
            palm_detector: OnnxPalmDetector::new(palm_model_path)?,
            session: load_session(landmark_model_path)?,
            config,
            tracked: Vec::new(),
        })
    }

    pub fn config(&self) -> HandModelConfig {
        self.config
    }

    fn run_landmarks(&mut self, frame: &Frame, roi: &SquareRoi) -> Result<LandmarkResult, Box<dyn std::error::Error>> {
        let input_value = ort::value::Tensor::from_array(roi.crop_tensor(frame, INPUT_SIZE))?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // screen landmarks [1, 63], presence [1, 1], handedness [1, 1], world landmarks [1, 63]
        if outputs.len() < 3 {
            return Err(format!(
                "hand landmark model expected at least 3 outputs, got {}",
                outputs.len()
            )
            .into());
        }
        let screen = outputs[0].try_extract_array::<f32>()?;
        let presence = outputs[1].try_extract_array::<f32>()?;
        let handedness = outputs[2].try_extract_array::<f32>()?;
        let screen = screen.as_slice().ok_or("Cannot get landmark slice")?;
        let presence = presence.iter().next().copied().ok_or("Empty presence output")?;
        let handedness = handedness.iter().next().copied().ok_or("Empty handedness output")?;

        if screen.len() < HAND_LANDMARK_COUNT * 3 {
            return Err(format!("expected {} landmark values, got {}", HAND_LANDMARK_COUNT * 3, screen.len()).into());
        }

        Ok(LandmarkResult {
            points: crop_to_frame(screen, roi),
            presence,
            handedness: if handedness > 0.5 {
                Handedness::Right
            } else {
                Handedness::Left
            },
        })
    }

    /// Crops to run this frame: tracked hands first, then new palms that do
    /// not duplicate them. Each crop carries the presence it must reach.
    fn candidate_rois(&mut self, frame: &Frame) -> Result<Vec<(SquareRoi, f32)>, Box<dyn std::error::Error>> {
        let mut rois: Vec<(SquareRoi, f32)> = if self.config.static_mode {
            Vec::new()
        } else {
            self.tracked
                .iter()
                .map(|roi| (*roi, self.config.tracking_confidence))
                .collect()
        };

        if rois.len() < self.config.max_hands {
            let palms = self
                .palm_detector
                .detect(frame, self.config.detection_confidence)?;
            for palm in palms {
                if rois.len() >= self.config.max_hands {
                    break;
                }
                let roi = palm.hand_roi();
                let duplicate = rois
                    .iter()
                    .any(|(r, _)| bbox_iou(&r.rect(), &roi.rect()) > DUPLICATE_IOU);
                if !duplicate {
                    rois.push((roi, NEW_HAND_PRESENCE));
                }
            }
        }
        Ok(rois)
    }
}

/// Maps crop-space landmarks (`0..INPUT_SIZE`) to frame pixels.
fn crop_to_frame(screen: &[f32], roi: &SquareRoi) -> Vec<[f32; 3]> {
    let depth_scale = roi.size / INPUT_SIZE as f32;
    screen
        .chunks_exact(3)
        .take(HAND_LANDMARK_COUNT)
        .map(|p| {
            let (x, y) = roi.to_frame(p[0], p[1], INPUT_SIZE);
            [x, y, p[2] * depth_scale]
        })
        .collect()
}

/// Square crop around the landmarks for the next frame.
fn tracking_roi(points: &[[f32; 3]]) -> Option<SquareRoi> {
    let xy: Vec<(f32, f32)> = points.iter().map(|p| (p[0], p[1])).collect();
    SquareRoi::around(&xy, TRACKING_ROI_SCALE)
}

fn normalize(points: &[[f32; 3]], width: u32, height: u32) -> Vec<NormalizedLandmark> {
    let (w, h) = (width.max(1) as f32, height.max(1) as f32);
    points
        .iter()
        .map(|p| NormalizedLandmark::new(p[0] / w, p[1] / h, p[2] / w))
        .collect()
}

impl HandLandmarkModel for OnnxHandLandmarkModel {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<DetectedHand>, Box<dyn std::error::Error>> {
        let rois = self.candidate_rois(frame)?;

        let mut hands = Vec::new();
        let mut next_tracked = Vec::new();
        for (roi, min_presence) in rois {
            if roi.size < MIN_ROI_SIZE {
                continue;
            }
            let result = self.run_landmarks(frame, &roi)?;
            if result.presence < min_presence {
                continue;
            }
            if let Some(next) = tracking_roi(&result.points) {
                next_tracked.push(next);
            }
            hands.push(DetectedHand {
                landmarks: normalize(&result.points, frame.width(), frame.height()),
                score: result.presence,
                handedness: result.handedness,
            });
        }

        self.tracked = if self.config.static_mode {
            Vec::new()
        } else {
            next_tracked
        };
        log::trace!("{} hand(s), {} tracked", hands.len(), self.tracked.len());
        Ok(hands)
    }

    fn reset(&mut self) {
        self.tracked.clear();
    }
}
