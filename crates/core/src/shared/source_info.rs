use super::source_spec::SourceSpec;

/// What a frame source reports once it has been opened.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceInfo {
    pub width: u32,
    pub height: u32,
    /// Nominal frame rate; 0.0 when the source doesn't say.
    pub fps: f64,
    /// `None` for live sources whose length is unbounded.
    pub total_frames: Option<usize>,
    pub codec: String,
    pub source: SourceSpec,
}
