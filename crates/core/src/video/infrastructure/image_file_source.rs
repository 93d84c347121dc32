use crate::shared::frame::Frame;
use crate::shared::source_info::SourceInfo;
use crate::shared::source_spec::SourceSpec;
use crate::video::domain::frame_source::{FrameSource, SourceError};

/// Treats a still image as a one-frame stream with `fps = 0`.
pub struct ImageFileSource {
    frame: Option<Frame>,
}

impl ImageFileSource {
    pub fn new() -> Self {
        Self { frame: None }
    }
}

impl Default for ImageFileSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for ImageFileSource {
    fn open(&mut self, spec: &SourceSpec) -> Result<SourceInfo, SourceError> {
        let SourceSpec::File(path) = spec else {
            return Err(SourceError::Unsupported(spec.to_string()));
        };

        let rgb = image::open(path)
            .map_err(|e| SourceError::unavailable(spec, e))?
            .to_rgb8();
        let (width, height) = rgb.dimensions();
        let codec = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_lowercase();

        self.frame = Some(Frame::new(rgb.into_raw(), width, height, 3, 0));
        log::info!("Opened image {} ({}x{})", spec, width, height);

        Ok(SourceInfo {
            width,
            height,
            fps: 0.0,
            total_frames: Some(1),
            codec,
            source: spec.clone(),
        })
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, SourceError>> + '_> {
        match self.frame.take() {
            Some(frame) => Box::new(std::iter::once(Ok(frame))),
            None => Box::new(std::iter::once(Err(SourceError::NotOpened))),
        }
    }

    fn close(&mut self) {
        self.frame = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_png(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("still.png");
        let img = image::RgbImage::from_fn(8, 6, |x, y| image::Rgb([x as u8 * 10, y as u8 * 20, 7]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_open_reports_single_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path());

        let mut source = ImageFileSource::new();
        let info = source.open(&SourceSpec::File(path)).unwrap();
        assert_eq!((info.width, info.height), (8, 6));
        assert_eq!(info.total_frames, Some(1));
        assert_eq!(info.codec, "png");
    }

    #[test]
    fn test_yields_exactly_one_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path());

        let mut source = ImageFileSource::new();
        source.open(&SourceSpec::File(path)).unwrap();
        let frames: Vec<_> = source.frames().collect();
        assert_eq!(frames.len(), 1);

        let frame = frames.into_iter().next().unwrap().unwrap();
        assert_eq!(frame.index(), 0);
        assert_eq!(frame.pixel(3, 2), Some([30, 40, 7]));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let mut source = ImageFileSource::new();
        let err = source
            .open(&SourceSpec::File(PathBuf::from("/nonexistent/still.png")))
            .unwrap_err();
        assert!(matches!(err, SourceError::DeviceUnavailable { .. }));
    }

    #[test]
    fn test_frames_before_open_is_error() {
        let mut source = ImageFileSource::new();
        let first = source.frames().next().unwrap();
        assert_eq!(first.unwrap_err(), SourceError::NotOpened);
    }
}
