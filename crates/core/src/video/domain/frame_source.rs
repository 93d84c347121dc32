use thiserror::Error;

use crate::shared::frame::Frame;
use crate::shared::source_info::SourceInfo;
use crate::shared::source_spec::SourceSpec;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("cannot open {source_desc}: {reason}")]
    DeviceUnavailable { source_desc: String, reason: String },
    #[error("capture failed: {0}")]
    Capture(String),
    #[error("frame source has not been opened")]
    NotOpened,
    #[error("{0} is not supported by this source")]
    Unsupported(String),
}

impl SourceError {
    pub fn unavailable(spec: &SourceSpec, reason: impl ToString) -> Self {
        SourceError::DeviceUnavailable {
            source_desc: spec.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Produces frames from a camera or file.
///
/// `frames()` is lazy: each `next()` blocks until the next frame is ready.
/// The iterator ending means end of stream; an `Err` item means the source
/// failed. A finished source can only be restarted by opening it again.
pub trait FrameSource: Send {
    fn open(&mut self, spec: &SourceSpec) -> Result<SourceInfo, SourceError>;

    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, SourceError>> + '_>;

    /// Releases the device or file handle. Safe to call more than once.
    fn close(&mut self);
}
