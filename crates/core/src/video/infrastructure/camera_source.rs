use std::time::Duration;

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

use crate::shared::frame::Frame;
use crate::shared::source_info::SourceInfo;
use crate::shared::source_spec::SourceSpec;
use crate::video::domain::frame_source::{FrameSource, SourceError};

/// Consecutive failed reads tolerated before the stream is reported broken.
const MAX_CONSECUTIVE_FAILURES: u32 = 5;
const RETRY_DELAY: Duration = Duration::from_millis(10);

/// Live webcam capture via nokhwa, decoded to RGB.
pub struct CameraSource {
    camera: Option<Camera>,
}

// Safety: the source is created on the caller's thread but the camera is only
// opened, read and dropped on the capture thread that owns the source.
unsafe impl Send for CameraSource {}

impl CameraSource {
    pub fn new() -> Self {
        Self { camera: None }
    }

    fn open_camera(index: u32) -> Result<Camera, nokhwa::NokhwaError> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);

        let mut camera = match Camera::new(CameraIndex::Index(index), requested) {
            Ok(c) => c,
            Err(e) => {
                log::warn!("Highest frame rate format rejected ({e}), trying any format");
                let fallback = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
                Camera::new(CameraIndex::Index(index), fallback)?
            }
        };
        camera.open_stream()?;
        Ok(camera)
    }
}

impl Default for CameraSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for CameraSource {
    fn open(&mut self, spec: &SourceSpec) -> Result<SourceInfo, SourceError> {
        let SourceSpec::Camera(index) = spec else {
            return Err(SourceError::Unsupported(spec.to_string()));
        };

        self.close();
        let camera = Self::open_camera(*index).map_err(|e| SourceError::unavailable(spec, e))?;

        let resolution = camera.resolution();
        let info = SourceInfo {
            width: resolution.width(),
            height: resolution.height(),
            fps: camera.frame_rate() as f64,
            total_frames: None,
            codec: format!("{:?}", camera.camera_format().format()),
            source: spec.clone(),
        };
        log::info!(
            "Camera opened: {} ({}x{} @ {} fps)",
            camera.info().human_name(),
            info.width,
            info.height,
            info.fps
        );

        self.camera = Some(camera);
        Ok(info)
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, SourceError>> + '_> {
        let Some(camera) = self.camera.as_mut() else {
            return Box::new(std::iter::once(Err(SourceError::NotOpened)));
        };

        Box::new(CameraFrameIter {
            camera,
            frame_index: 0,
            failed: false,
        })
    }

    fn close(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                log::warn!("Failed to stop camera stream: {e}");
            }
            log::info!("Camera released");
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Never ends on its own: a live camera produces frames until closed.
struct CameraFrameIter<'a> {
    camera: &'a mut Camera,
    frame_index: usize,
    failed: bool,
}

impl CameraFrameIter<'_> {
    fn read_one(&mut self) -> Result<Frame, nokhwa::NokhwaError> {
        let buffer = self.camera.frame()?;
        let image = buffer.decode_image::<RgbFormat>()?;
        let (width, height) = (image.width(), image.height());
        Ok(Frame::new(image.into_raw(), width, height, 3, self.frame_index))
    }
}

impl Iterator for CameraFrameIter<'_> {
    type Item = Result<Frame, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let mut failures = 0;
        loop {
            match self.read_one() {
                Ok(frame) => {
                    self.frame_index += 1;
                    return Some(Ok(frame));
                }
                Err(e) => {
                    failures += 1;
                    log::warn!("Failed to capture frame: {e}");
                    if failures >= MAX_CONSECUTIVE_FAILURES {
                        self.failed = true;
                        return Some(Err(SourceError::Capture(e.to_string())));
                    }
                    std::thread::sleep(RETRY_DELAY);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_frames_without_open_returns_error() {
        let mut source = CameraSource::new();
        let first = source.frames().next().unwrap();
        assert_eq!(first.unwrap_err(), SourceError::NotOpened);
    }

    #[test]
    fn test_open_file_is_unsupported() {
        let mut source = CameraSource::new();
        let err = source
            .open(&SourceSpec::File(PathBuf::from("clip.mp4")))
            .unwrap_err();
        assert!(matches!(err, SourceError::Unsupported(_)));
    }

    #[test]
    fn test_close_without_open_is_noop() {
        let mut source = CameraSource::new();
        source.close();
        source.close();
    }
}
