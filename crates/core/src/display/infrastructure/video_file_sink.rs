use std::path::{Path, PathBuf};

use crate::display::domain::display_sink::DisplaySink;
use crate::display::domain::fps_overlay::draw_fps;
use crate::shared::frame::Frame;
use crate::shared::source_info::SourceInfo;

const DEFAULT_FPS: i32 = 30;

/// Records annotated frames to a video file via ffmpeg-next.
///
/// The encoder is opened lazily from the first frame's dimensions. The rate
/// readout is burned into every frame that has one.
pub struct VideoFileSink {
    path: PathBuf,
    fps: i32,
    encoder: Option<EncodeState>,
    frames_written: usize,
}

struct EncodeState {
    octx: ffmpeg_next::format::context::Output,
    encoder: ffmpeg_next::codec::encoder::video::Encoder,
    scaler: ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    stream_time_base: ffmpeg_next::Rational,
}

// Safety: the sink is owned by one pipeline thread at a time. The raw
// pointers inside ffmpeg types are never shared.
unsafe impl Send for VideoFileSink {}

impl VideoFileSink {
    /// `fps` is the playback rate used unless the source reports its own;
    /// non-positive values fall back to 30.
    pub fn new(path: &Path, fps: f64) -> Self {
        Self {
            path: path.to_path_buf(),
            fps: playback_fps(fps).unwrap_or(DEFAULT_FPS),
            encoder: None,
            frames_written: 0,
        }
    }

    pub fn fps(&self) -> i32 {
        self.fps
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    fn open_encoder(&self, width: u32, height: u32) -> Result<EncodeState, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut octx = ffmpeg_next::format::output(&self.path)?;
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4)
            .ok_or("MPEG4 encoder not found")?;
        let mut ost = octx.add_stream(Some(codec))?;

        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()?;
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, self.fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(self.fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }

        let encoder = encoder_ctx.open_with(ffmpeg_next::Dictionary::new())?;
        ost.set_parameters(&encoder);

        octx.write_header()?;
        let stream_time_base = octx.stream(0).ok_or("output stream missing")?.time_base();

        let scaler = ffmpeg_next::software::scaling::Context::get(
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::format::Pixel::YUV420P,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        log::info!(
            "Recording {}x{} @ {} fps to {}",
            width,
            height,
            self.fps,
            self.path.display()
        );

        Ok(EncodeState {
            octx,
            encoder,
            scaler,
            width,
            height,
            stream_time_base,
        })
    }
}

fn playback_fps(fps: f64) -> Option<i32> {
    let fps = fps.round() as i32;
    (fps > 0).then_some(fps)
}

impl EncodeState {
    fn write_packets(&mut self, fps: i32) -> Result<(), ffmpeg_next::Error> {
        let mut encoded = ffmpeg_next::Packet::empty();
        while self.encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(ffmpeg_next::Rational(1, fps), self.stream_time_base);
            encoded.write_interleaved(&mut self.octx)?;
        }
        Ok(())
    }

    fn encode(&mut self, frame: &Frame, pts: i64, fps: i32) -> Result<(), Box<dyn std::error::Error>> {
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::new(
            ffmpeg_next::format::Pixel::RGB24,
            self.width,
            self.height,
        );

        let row_len = self.width as usize * 3;
        let stride = rgb_frame.stride(0);
        let dst = rgb_frame.data_mut(0);
        for (row, src_row) in frame.data().chunks_exact(row_len).enumerate() {
            let start = row * stride;
            dst[start..start + row_len].copy_from_slice(src_row);
        }

        let mut yuv_frame = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&rgb_frame, &mut yuv_frame)?;
        yuv_frame.set_pts(Some(pts));

        self.encoder.send_frame(&yuv_frame)?;
        self.write_packets(fps)?;
        Ok(())
    }

    fn finish(&mut self, fps: i32) -> Result<(), ffmpeg_next::Error> {
        self.encoder.send_eof()?;
        self.write_packets(fps)?;
        self.octx.write_trailer()
    }
}

impl DisplaySink for VideoFileSink {
    fn source_opened(&mut self, info: &SourceInfo) {
        if self.encoder.is_some() {
            return;
        }
        if let Some(fps) = playback_fps(info.fps) {
            self.fps = fps;
        }
    }

    fn present(&mut self, frame: &Frame, fps: Option<u32>) -> Result<(), Box<dyn std::error::Error>> {
        if self.encoder.is_none() {
            self.encoder = Some(self.open_encoder(frame.width(), frame.height())?);
        }
        let rate = self.fps;
        let pts = self.frames_written as i64;
        let Some(state) = self.encoder.as_mut() else {
            return Err("VideoFileSink: encoder not opened".into());
        };
        if (frame.width(), frame.height()) != (state.width, state.height) {
            return Err(format!(
                "frame size {}x{} differs from recording size {}x{}",
                frame.width(),
                frame.height(),
                state.width,
                state.height
            )
            .into());
        }

        state.encode(&draw_fps(frame, fps), pts, rate)?;
        self.frames_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(mut state) = self.encoder.take() {
            state.finish(self.fps)?;
            log::info!(
                "Wrote {} frames to {}",
                self.frames_written,
                self.path.display()
            );
        }
        Ok(())
    }
}

impl Drop for VideoFileSink {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to finalize {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::source_spec::SourceSpec;
    use crate::video::domain::frame_source::FrameSource;
    use crate::video::infrastructure::ffmpeg_file_source::FfmpegFileSource;
    use tempfile::TempDir;

    #[test]
    fn test_recorded_video_reads_back() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.mp4");

        let mut sink = VideoFileSink::new(&path, 25.0);
        for i in 0..6 {
            let frame = Frame::solid(160, 120, [40, 80, 120], i);
            sink.present(&frame, if i == 0 { None } else { Some(25) }).unwrap();
        }
        sink.close().unwrap();
        assert_eq!(sink.frames_written(), 6);

        let mut source = FfmpegFileSource::new();
        let info = source.open(&SourceSpec::File(path)).unwrap();
        assert_eq!((info.width, info.height), (160, 120));
        let frames: Vec<Frame> = source.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 6);
    }

    #[test]
    fn test_size_change_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut sink = VideoFileSink::new(&tmp.path().join("out.mp4"), 30.0);
        sink.present(&Frame::solid(64, 48, [0, 0, 0], 0), None).unwrap();
        let err = sink
            .present(&Frame::solid(32, 24, [0, 0, 0], 1), None)
            .unwrap_err();
        assert!(err.to_string().contains("differs"));
        assert_eq!(sink.frames_written(), 1);
    }

    #[test]
    fn test_source_rate_overrides_fallback() {
        let tmp = TempDir::new().unwrap();
        let mut sink = VideoFileSink::new(&tmp.path().join("out.mp4"), 0.0);
        assert_eq!(sink.fps(), 30);

        let mut info = SourceInfo {
            width: 64,
            height: 48,
            fps: 24.9,
            total_frames: Some(10),
            codec: "mpeg4".into(),
            source: SourceSpec::File("in.mp4".into()),
        };
        sink.source_opened(&info);
        assert_eq!(sink.fps(), 25);

        // A still image reports no rate.
        info.fps = 0.0;
        sink.source_opened(&info);
        assert_eq!(sink.fps(), 25);
    }

    #[test]
    fn test_close_without_frames_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("empty.mp4");
        let mut sink = VideoFileSink::new(&path, 0.0);
        sink.close().unwrap();
        sink.close().unwrap();
        assert!(!path.exists());
    }
}
