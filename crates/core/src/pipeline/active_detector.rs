use std::fmt;

use crate::detection::domain::detector_adapter::DetectorKind;

/// Which detector, if any, runs on each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActiveDetector {
    #[default]
    None,
    Hand,
    Face,
}

/// Requests sent from the interactive surface to the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlMessage {
    SetActive(Option<DetectorKind>),
    /// Activates the detector, or deactivates it if it is already active.
    Toggle(DetectorKind),
}

impl ActiveDetector {
    pub fn from_kind(kind: Option<DetectorKind>) -> Self {
        match kind {
            Some(DetectorKind::Hand) => ActiveDetector::Hand,
            Some(DetectorKind::Face) => ActiveDetector::Face,
            None => ActiveDetector::None,
        }
    }

    pub fn kind(self) -> Option<DetectorKind> {
        match self {
            ActiveDetector::Hand => Some(DetectorKind::Hand),
            ActiveDetector::Face => Some(DetectorKind::Face),
            ActiveDetector::None => None,
        }
    }

    /// State after handling `message`.
    pub fn apply(self, message: ControlMessage) -> Self {
        match message {
            ControlMessage::SetActive(kind) => Self::from_kind(kind),
            ControlMessage::Toggle(kind) if self.kind() == Some(kind) => ActiveDetector::None,
            ControlMessage::Toggle(kind) => Self::from_kind(Some(kind)),
        }
    }
}

impl fmt::Display for ActiveDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            Some(kind) => write!(f, "{kind}"),
            None => write!(f, "none"),
        }
    }
}
