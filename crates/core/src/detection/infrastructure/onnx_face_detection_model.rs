/// BlazeFace short-range face detector using ONNX Runtime via `ort`.
use std::path::Path;

use crate::detection::domain::face_detection_model::{FaceDetection, FaceDetectionModel};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

use super::math::{nms, sigmoid, ssd_anchors, Anchor, RawDetection};
use super::onnx_session::load_session;
use super::roi::SquareRoi;

/// BlazeFace model input resolution.
const INPUT_SIZE: u32 = 128;

/// 16×16 grid × 2 anchors + 8×8 grid × 6 anchors.
const ANCHOR_LAYERS: [(usize, usize); 2] = [(8, 2), (16, 6)];

/// Box (4) + six keypoints (12).
const REGRESSOR_LEN: usize = 16;

pub const DEFAULT_CONFIDENCE: f32 = 0.5;

const NMS_IOU_THRESH: f32 = 0.3;

/// Raw scores are clipped before the sigmoid to keep it finite.
const SCORE_CLIP: f32 = 100.0;

pub struct OnnxFaceDetectionModel {
    session: ort::session::Session,
    confidence: f32,
    anchors: Vec<Anchor>,
}

impl OnnxFaceDetectionModel {
    pub fn new(model_path: &Path, confidence: f32) -> Result<Self, Box<dyn std::error::Error>> {
        let session = load_session(model_path)?;
        Ok(Self {
            session,
            confidence,
            anchors: ssd_anchors(INPUT_SIZE, &ANCHOR_LAYERS),
        })
    }
}

impl FaceDetectionModel for OnnxFaceDetectionModel {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>, Box<dyn std::error::Error>> {
        let roi = SquareRoi::full_frame(frame.width(), frame.height());
        let input_value = ort::value::Tensor::from_array(roi.crop_tensor(frame, INPUT_SIZE))?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // regressors: [1, 896, 16], classificators: [1, 896, 1]
        if outputs.len() < 2 {
            return Err(
                format!("BlazeFace model expected 2 outputs, got {}", outputs.len()).into(),
            );
        }
        let first = outputs[0].try_extract_array::<f32>()?;
        let second = outputs[1].try_extract_array::<f32>()?;
        let first = first.as_slice().ok_or("Cannot get output slice")?;
        let second = second.as_slice().ok_or("Cannot get output slice")?;
        let (regressors, scores) = if first.len() >= second.len() {
            (first, second)
        } else {
            (second, first)
        };

        let raw = decode(&self.anchors, regressors, scores, self.confidence);
        Ok(to_faces(nms(raw, NMS_IOU_THRESH), &roi, frame))
    }
}

/// Decodes anchor-relative boxes into normalized input coordinates.
fn decode(anchors: &[Anchor], regressors: &[f32], scores: &[f32], confidence: f32) -> Vec<RawDetection> {
    let size = INPUT_SIZE as f32;
    let mut dets = Vec::new();

    for (i, (&raw_score, anchor)) in scores.iter().zip(anchors).enumerate() {
        let score = sigmoid(raw_score.clamp(-SCORE_CLIP, SCORE_CLIP));
        if score < confidence {
            continue;
        }
        let Some(reg) = regressors.get(i * REGRESSOR_LEN..(i + 1) * REGRESSOR_LEN) else {
            break;
        };

        let cx = anchor.cx + reg[0] / size;
        let cy = anchor.cy + reg[1] / size;
        let w = reg[2] / size;
        let h = reg[3] / size;
        dets.push(RawDetection {
            rect: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
            score,
            keypoints: vec![],
        });
    }
    dets
}

fn to_faces(dets: Vec<RawDetection>, roi: &SquareRoi, frame: &Frame) -> Vec<FaceDetection> {
    let size = INPUT_SIZE as f32;
    dets.into_iter()
        .filter_map(|d| {
            let (x1, y1) = roi.to_frame(d.rect[0] * size, d.rect[1] * size, INPUT_SIZE);
            let (x2, y2) = roi.to_frame(d.rect[2] * size, d.rect[3] * size, INPUT_SIZE);
            let bbox = BoundingBox::from_corners(
                x1 as f64,
                y1 as f64,
                x2 as f64,
                y2 as f64,
                frame.width(),
                frame.height(),
            );
            (!bbox.is_empty()).then_some(FaceDetection {
                bbox,
                score: d.score,
            })
        })
        .collect()
}
