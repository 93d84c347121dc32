use crate::overlay::canvas::{FrameCanvas, TextSize};
use crate::overlay::colors::MAGENTA;
use crate::shared::frame::Frame;

/// Baseline origin of the rate readout.
pub const FPS_ORIGIN: (i32, i32) = (60, 100);

/// Returns a copy of `frame` with the rate burned in, or an unchanged copy
/// when no rate is known yet.
pub fn draw_fps(frame: &Frame, fps: Option<u32>) -> Frame {
    let mut out = frame.clone();
    if let Some(fps) = fps {
        FrameCanvas::new(&mut out).text(FPS_ORIGIN, &fps.to_string(), MAGENTA, TextSize::Large);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn magenta_pixels(frame: &Frame) -> usize {
        let mut count = 0;
        for y in 0..frame.height() as i32 {
            for x in 0..frame.width() as i32 {
                if frame.pixel(x, y) == Some(MAGENTA) {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn test_none_leaves_frame_unchanged() {
        let frame = Frame::solid(200, 150, [0, 0, 0], 0);
        assert_eq!(draw_fps(&frame, None), frame);
    }

    #[test]
    fn test_value_is_drawn_near_origin() {
        let frame = Frame::solid(200, 150, [0, 0, 0], 0);
        let out = draw_fps(&frame, Some(30));
        assert!(magenta_pixels(&out) > 0);
        // Input untouched.
        assert_eq!(magenta_pixels(&frame), 0);
        // Nothing drawn left of the origin.
        for y in 0..150 {
            for x in 0..FPS_ORIGIN.0 {
                assert_eq!(out.pixel(x, y), Some([0, 0, 0]));
            }
        }
    }

    #[test]
    fn test_small_frame_clips_without_panicking() {
        let frame = Frame::solid(40, 40, [0, 0, 0], 0);
        assert_eq!(draw_fps(&frame, Some(999)), frame);
    }
}
