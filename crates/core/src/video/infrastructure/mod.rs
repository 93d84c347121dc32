pub mod camera_source;
pub mod ffmpeg_file_source;
pub mod image_file_source;

use crate::shared::source_spec::SourceSpec;
use crate::video::domain::frame_source::FrameSource;

use camera_source::CameraSource;
use ffmpeg_file_source::FfmpegFileSource;
use image_file_source::ImageFileSource;

/// Picks the source implementation for `spec` without opening it.
///
/// Opening is left to the capture thread so the device is owned by it.
pub fn source_for(spec: &SourceSpec) -> Box<dyn FrameSource> {
    match spec {
        SourceSpec::Camera(_) => Box::new(CameraSource::new()),
        SourceSpec::File(_) if spec.is_image() => Box::new(ImageFileSource::new()),
        SourceSpec::File(_) => Box::new(FfmpegFileSource::new()),
    }
}
