use crate::display::domain::display_sink::DisplaySink;
use crate::shared::frame::Frame;

/// Headless sink that reports presented frames through `log`.
///
/// Output is throttled to every `throttle_frames` frames.
pub struct LogDisplaySink {
    throttle_frames: usize,
    frames_presented: usize,
    last_fps: Option<u32>,
}

impl LogDisplaySink {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            frames_presented: 0,
            last_fps: None,
        }
    }

    pub fn frames_presented(&self) -> usize {
        self.frames_presented
    }

    pub fn last_fps(&self) -> Option<u32> {
        self.last_fps
    }
}

impl Default for LogDisplaySink {
    fn default() -> Self {
        Self::new(30)
    }
}

impl DisplaySink for LogDisplaySink {
    fn present(&mut self, frame: &Frame, fps: Option<u32>) -> Result<(), Box<dyn std::error::Error>> {
        self.frames_presented += 1;
        if fps.is_some() {
            self.last_fps = fps;
        }
        if self.frames_presented % self.throttle_frames == 1 || self.throttle_frames == 1 {
            match fps {
                Some(fps) => log::info!(
                    "Frame {} ({}x{}) at {fps} fps",
                    frame.index(),
                    frame.width(),
                    frame.height()
                ),
                None => log::info!("Frame {} ({}x{})", frame.index(), frame.width(), frame.height()),
            }
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        log::debug!("Presented {} frames", self.frames_presented);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_frames_and_keeps_last_rate() {
        let mut sink = LogDisplaySink::new(2);
        let frame = Frame::solid(4, 4, [0, 0, 0], 0);
        sink.present(&frame, None).unwrap();
        sink.present(&frame, Some(24)).unwrap();
        sink.present(&frame, None).unwrap();
        assert_eq!(sink.frames_presented(), 3);
        assert_eq!(sink.last_fps(), Some(24));
        sink.close().unwrap();
    }

    #[test]
    fn test_zero_throttle_is_clamped() {
        let mut sink = LogDisplaySink::new(0);
        sink.present(&Frame::solid(1, 1, [0, 0, 0], 0), Some(1)).unwrap();
        assert_eq!(sink.frames_presented(), 1);
    }
}
