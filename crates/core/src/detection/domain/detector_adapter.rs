use std::fmt;

use thiserror::Error;

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;
use crate::shared::landmark::Landmark;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("invalid hand model config: {0}")]
    InvalidConfig(String),
    #[error("failed to load {model}: {reason}")]
    ModelLoad { model: String, reason: String },
    #[error("{kind} inference failed: {reason}")]
    Inference { kind: DetectorKind, reason: String },
}

impl DetectionError {
    pub fn inference(kind: DetectorKind, reason: impl ToString) -> Self {
        DetectionError::Inference {
            kind,
            reason: reason.to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DetectorKind {
    Hand,
    Face,
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectorKind::Hand => write!(f, "hand"),
            DetectorKind::Face => write!(f, "face"),
        }
    }
}

/// What a detector found in one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Detection {
    /// Landmarks of the selected hand; empty when no hand was found.
    Hand(Vec<Landmark>),
    /// Box of the first face, if any.
    Face(Option<BoundingBox>),
    /// No detector ran on this frame.
    None,
}

impl Detection {
    pub fn landmarks(&self) -> &[Landmark] {
        match self {
            Detection::Hand(landmarks) => landmarks,
            _ => &[],
        }
    }

    pub fn face_box(&self) -> Option<BoundingBox> {
        match self {
            Detection::Face(bbox) => *bbox,
            _ => None,
        }
    }

    /// True when nothing was detected (or no detector ran).
    pub fn is_empty(&self) -> bool {
        match self {
            Detection::Hand(landmarks) => landmarks.is_empty(),
            Detection::Face(bbox) => bbox.is_none(),
            Detection::None => true,
        }
    }
}

/// An annotated copy of the input frame together with the detection result.
#[derive(Clone, Debug)]
pub struct Annotated {
    pub frame: Frame,
    pub detection: Detection,
}

/// Domain interface for a detector stage.
///
/// Implementations never mutate the input frame; overlays are burned into a
/// copy. Adapters may keep tracking state across frames, hence `&mut self`.
pub trait DetectorAdapter: Send {
    fn kind(&self) -> DetectorKind;

    fn annotate(&mut self, frame: &Frame) -> Result<Annotated, DetectionError>;

    /// Drops any cross-frame state. Called when the adapter is switched off.
    fn reset(&mut self) {}
}
