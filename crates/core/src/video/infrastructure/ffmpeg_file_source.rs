use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::source_info::SourceInfo;
use crate::shared::source_spec::SourceSpec;
use crate::video::domain::frame_source::{FrameSource, SourceError};

/// Plays back a video file via ffmpeg-next (libavformat + libavcodec).
///
/// Each decoded frame is converted to RGB24 and wrapped in a [`Frame`].
pub struct FfmpegFileSource {
    state: Option<DecodeState>,
}

struct DecodeState {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    video_stream_index: usize,
}

// Safety: the source is moved onto the capture thread before it is opened and
// is only used from that thread afterwards. The raw pointers inside ffmpeg
// types are never shared.
unsafe impl Send for FfmpegFileSource {}

impl FfmpegFileSource {
    pub fn new() -> Self {
        Self { state: None }
    }

    fn open_path(path: &Path) -> Result<(DecodeState, f64, usize, String), ffmpeg_next::Error> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(path)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or(ffmpeg_next::Error::StreamNotFound)?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };
        let total_frames = stream.frames().max(0) as usize;
        let codec = decoder
            .codec()
            .map(|c| c.name().to_string())
            .unwrap_or_default();

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let state = DecodeState {
            ictx,
            decoder,
            scaler,
            width,
            height,
            video_stream_index,
        };
        Ok((state, fps, total_frames, codec))
    }
}

impl Default for FfmpegFileSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for FfmpegFileSource {
    fn open(&mut self, spec: &SourceSpec) -> Result<SourceInfo, SourceError> {
        let SourceSpec::File(path) = spec else {
            return Err(SourceError::Unsupported(spec.to_string()));
        };

        let (state, fps, total_frames, codec) =
            Self::open_path(path).map_err(|e| SourceError::unavailable(spec, e))?;

        let info = SourceInfo {
            width: state.width,
            height: state.height,
            fps,
            total_frames: (total_frames > 0).then_some(total_frames),
            codec,
            source: spec.clone(),
        };
        log::info!(
            "Opened {} ({}x{}, {:.1} fps, {})",
            spec,
            info.width,
            info.height,
            info.fps,
            info.codec
        );

        self.state = Some(state);
        Ok(info)
    }

    fn frames(&mut self) -> Box<dyn Iterator<Item = Result<Frame, SourceError>> + '_> {
        let Some(state) = self.state.as_mut() else {
            return Box::new(std::iter::once(Err(SourceError::NotOpened)));
        };

        Box::new(FfmpegFrameIter {
            state,
            frame_index: 0,
            flushing: false,
            done: false,
        })
    }

    fn close(&mut self) {
        self.state = None;
    }
}

/// Decodes one frame per `next()` so the whole file is never buffered.
struct FfmpegFrameIter<'a> {
    state: &'a mut DecodeState,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl FfmpegFrameIter<'_> {
    fn try_receive(&mut self) -> Option<Result<Frame, SourceError>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.state.decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = self.state.scaler.run(&decoded, &mut rgb_frame) {
            return Some(Err(SourceError::Capture(e.to_string())));
        }

        let pixels = extract_rgb_pixels(&rgb_frame, self.state.width, self.state.height);
        let frame = Frame::new(
            pixels,
            self.state.width,
            self.state.height,
            3,
            self.frame_index,
        );
        self.frame_index += 1;
        Some(Ok(frame))
    }
}

impl Iterator for FfmpegFrameIter<'_> {
    type Item = Result<Frame, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if let Some(result) = self.try_receive() {
            return Some(result);
        }

        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let Some((stream, packet)) = self.state.ictx.packets().next() else {
                let _ = self.state.decoder.send_eof();
                self.flushing = true;
                if let Some(result) = self.try_receive() {
                    return Some(result);
                }
                self.done = true;
                return None;
            };

            if stream.index() != self.state.video_stream_index {
                continue;
            }

            if self.state.decoder.send_packet(&packet).is_err() {
                continue;
            }

            if let Some(result) = self.try_receive() {
                return Some(result);
            }
        }
    }
}

/// Copies an ffmpeg RGB24 frame into a tightly packed buffer.
///
/// ffmpeg rows may carry padding (stride > width * 3); it is dropped here.
pub(crate) fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Encodes `num_frames` solid gray frames into an MPEG-4 file.
    pub(crate) fn create_test_video(path: &Path, num_frames: usize, width: u32, height: u32, fps: i32) {
        ffmpeg_next::init().unwrap();

        let mut octx = ffmpeg_next::format::output(path).unwrap();
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        ost.set_parameters(&encoder);
        octx.write_header().unwrap();
        let ost_time_base = octx.stream(0).unwrap().time_base();

        let mut scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )
        .unwrap();

        for i in 0..num_frames {
            let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
            );
            let stride = rgb_frame.stride(0);
            let data = rgb_frame.data_mut(0);
            let value = ((i * 40) % 256) as u8;
            for row in 0..height as usize {
                for col in 0..width as usize {
                    let offset = row * stride + col * 3;
                    data[offset..offset + 3].fill(value);
                }
            }

            let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
            scaler.run(&rgb_frame, &mut yuv_frame).unwrap();
            yuv_frame.set_pts(Some(i as i64));
            encoder.send_frame(&yuv_frame).unwrap();

            let mut encoded = ffmpeg_next::Packet::empty();
            while encoder.receive_packet(&mut encoded).is_ok() {
                encoded.set_stream(0);
                encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
                encoded.write_interleaved(&mut octx).unwrap();
            }
        }

        encoder.send_eof().unwrap();
        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
            encoded.write_interleaved(&mut octx).unwrap();
        }
        octx.write_trailer().unwrap();
    }

    fn test_video(dir: &Path, num_frames: usize) -> PathBuf {
        let path = dir.join("test.mp4");
        create_test_video(&path, num_frames, 160, 120, 30);
        path
    }

    #[test]
    fn test_open_returns_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 5);

        let mut source = FfmpegFileSource::new();
        let info = source.open(&SourceSpec::File(path.clone())).unwrap();
        assert_eq!(info.width, 160);
        assert_eq!(info.height, 120);
        assert!(info.fps > 0.0);
        assert_eq!(info.source, SourceSpec::File(path));
    }

    #[test]
    fn test_open_nonexistent_is_unavailable() {
        let mut source = FfmpegFileSource::new();
        let err = source
            .open(&SourceSpec::File(PathBuf::from("/nonexistent/test.mp4")))
            .unwrap_err();
        assert!(matches!(err, SourceError::DeviceUnavailable { .. }));
    }

    #[test]
    fn test_open_camera_is_unsupported() {
        let mut source = FfmpegFileSource::new();
        let err = source.open(&SourceSpec::Camera(0)).unwrap_err();
        assert!(matches!(err, SourceError::Unsupported(_)));
    }

    #[test]
    fn test_frames_end_after_last_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 5);

        let mut source = FfmpegFileSource::new();
        source.open(&SourceSpec::File(path)).unwrap();

        let frames: Vec<_> = source.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 5);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index(), i);
            assert_eq!(frame.channels(), 3);
            assert_eq!(frame.data().len(), 160 * 120 * 3);
        }
    }

    #[test]
    fn test_frames_without_open_returns_error() {
        let mut source = FfmpegFileSource::new();
        let result = source.frames().next().unwrap();
        assert_eq!(result.unwrap_err(), SourceError::NotOpened);
    }

    #[test]
    fn test_close_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = test_video(dir.path(), 1);

        let mut source = FfmpegFileSource::new();
        source.open(&SourceSpec::File(path)).unwrap();
        source.close();
        source.close();
        assert!(source.frames().next().unwrap().is_err());
    }
}
