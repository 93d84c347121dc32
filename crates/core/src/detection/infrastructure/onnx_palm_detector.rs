/// MediaPipe palm detection (lite) using ONNX Runtime via `ort`.
use std::path::Path;

use crate::shared::frame::Frame;

use super::math::{nms, sigmoid, ssd_anchors, Anchor, RawDetection};
use super::onnx_session::load_session;
use super::roi::SquareRoi;

const INPUT_SIZE: u32 = 192;

/// 24×24 grid × 2 anchors + 12×12 grid × 6 anchors = 2016.
const ANCHOR_LAYERS: [(usize, usize); 2] = [(8, 2), (16, 6)];

/// Box (4) + seven palm keypoints (14).
const REGRESSOR_LEN: usize = 18;

const NMS_IOU_THRESH: f32 = 0.3;
const SCORE_CLIP: f32 = 100.0;

/// Keypoint indices within a palm detection.
pub const WRIST_KEYPOINT: usize = 0;
pub const MIDDLE_MCP_KEYPOINT: usize = 2;

/// Palm → whole-hand crop expansion.
const HAND_ROI_SCALE: f32 = 2.6;
/// Shift toward the fingers, as a fraction of the palm box size.
const HAND_ROI_SHIFT: f32 = 0.5;

/// A palm in frame pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Palm {
    /// `[x1, y1, x2, y2]`
    pub rect: [f32; 4],
    pub score: f32,
    pub keypoints: Vec<[f32; 2]>,
}

impl Palm {
    /// Square crop covering the whole hand, shifted from the palm toward the
    /// fingers along the wrist → middle-knuckle direction.
    pub fn hand_roi(&self) -> SquareRoi {
        let w = self.rect[2] - self.rect[0];
        let h = self.rect[3] - self.rect[1];
        let side = w.max(h);
        let mut cx = (self.rect[0] + self.rect[2]) / 2.0;
        let mut cy = (self.rect[1] + self.rect[3]) / 2.0;

        if let (Some(wrist), Some(middle)) = (
            self.keypoints.get(WRIST_KEYPOINT),
            self.keypoints.get(MIDDLE_MCP_KEYPOINT),
        ) {
            let (dx, dy) = (middle[0] - wrist[0], middle[1] - wrist[1]);
            let len = (dx * dx + dy * dy).sqrt();
            if len > f32::EPSILON {
                cx += dx / len * side * HAND_ROI_SHIFT;
                cy += dy / len * side * HAND_ROI_SHIFT;
            }
        }

        SquareRoi {
            cx,
            cy,
            size: side * HAND_ROI_SCALE,
        }
    }
}

pub struct OnnxPalmDetector {
    session: ort::session::Session,
    anchors: Vec<Anchor>,
}

impl OnnxPalmDetector {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: load_session(model_path)?,
            anchors: ssd_anchors(INPUT_SIZE, &ANCHOR_LAYERS),
        })
    }

    /// Palms scoring at least `confidence`, best first.
    pub fn detect(&mut self, frame: &Frame, confidence: f32) -> Result<Vec<Palm>, Box<dyn std::error::Error>> {
        let roi = SquareRoi::full_frame(frame.width(), frame.height());
        let input_value = ort::value::Tensor::from_array(roi.crop_tensor(frame, INPUT_SIZE))?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // boxes: [1, 2016, 18], scores: [1, 2016, 1]
        if outputs.len() < 2 {
            return Err(format!("palm model expected 2 outputs, got {}", outputs.len()).into());
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

        let raw = decode(&self.anchors, regressors, scores, confidence);
        Ok(nms(raw, NMS_IOU_THRESH)
            .into_iter()
            .map(|d| to_frame(d, &roi))
            .collect())
    }
}

/// Decodes regressors into model input pixel coordinates.
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

        let (ax, ay) = (anchor.cx * size, anchor.cy * size);
        let cx = reg[0] + ax;
        let cy = reg[1] + ay;
        let (w, h) = (reg[2], reg[3]);
        let keypoints = reg[4..]
            .chunks_exact(2)
            .map(|kp| [kp[0] + ax, kp[1] + ay])
            .collect();

        dets.push(RawDetection {
            rect: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
            score,
            keypoints,
        });
    }
    dets
}

fn to_frame(det: RawDetection, roi: &SquareRoi) -> Palm {
    let (x1, y1) = roi.to_frame(det.rect[0], det.rect[1], INPUT_SIZE);
    let (x2, y2) = roi.to_frame(det.rect[2], det.rect[3], INPUT_SIZE);
    let keypoints = det
        .keypoints
        .iter()
        .map(|kp| {
            let (x, y) = roi.to_frame(kp[0], kp[1], INPUT_SIZE);
            [x, y]
        })
        .collect();
    Palm {
        rect: [x1, y1, x2, y2],
        score: det.score,
        keypoints,
    }
}
