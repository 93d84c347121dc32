use crate::shared::frame::Frame;
use crate::shared::source_info::SourceInfo;

/// Final pipeline stage: shows or stores annotated frames.
///
/// `fps` is `None` until two frames have been timed; sinks skip the rate
/// overlay in that case.
pub trait DisplaySink: Send {
    /// Called once the source reports its properties, before any frame.
    fn source_opened(&mut self, _info: &SourceInfo) {}

    fn present(&mut self, frame: &Frame, fps: Option<u32>) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes and releases the sink. Safe to call more than once.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
