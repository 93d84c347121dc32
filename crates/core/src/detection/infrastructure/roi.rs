use ndarray::Array4;

use crate::shared::frame::Frame;

/// Axis-aligned square region in frame pixel coordinates, fed to a model
/// after resizing to its input size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SquareRoi {
    pub cx: f32,
    pub cy: f32,
    pub size: f32,
}

impl SquareRoi {
    /// The whole frame, letterboxed into a square.
    pub fn full_frame(width: u32, height: u32) -> Self {
        Self {
            cx: width as f32 / 2.0,
            cy: height as f32 / 2.0,
            size: width.max(height) as f32,
        }
    }

    /// Smallest square around `points`, scaled by `scale`.
    pub fn around(points: &[(f32, f32)], scale: f32) -> Option<Self> {
        let first = points.first()?;
        let (mut x1, mut y1, mut x2, mut y2) = (first.0, first.1, first.0, first.1);
        for &(x, y) in &points[1..] {
            x1 = x1.min(x);
            y1 = y1.min(y);
            x2 = x2.max(x);
            y2 = y2.max(y);
        }
        Some(Self {
            cx: (x1 + x2) / 2.0,
            cy: (y1 + y2) / 2.0,
            size: (x2 - x1).max(y2 - y1) * scale,
        })
    }

    pub fn left(&self) -> f32 {
        self.cx - self.size / 2.0
    }

    pub fn top(&self) -> f32 {
        self.cy - self.size / 2.0
    }

    pub fn rect(&self) -> [f32; 4] {
        [
            self.left(),
            self.top(),
            self.left() + self.size,
            self.top() + self.size,
        ]
    }

    /// Maps a point in model input space (`0..input_size`) back to frame pixels.
    pub fn to_frame(&self, u: f32, v: f32, input_size: u32) -> (f32, f32) {
        let scale = self.size / input_size as f32;
        (self.left() + u * scale, self.top() + v * scale)
    }

    /// Samples the region into an NCHW `[0, 1]` tensor of `input_size`².
    ///
    /// Nearest-neighbor; parts of the region outside the frame read as black.
    pub fn crop_tensor(&self, frame: &Frame, input_size: u32) -> Array4<f32> {
        let src = frame.as_ndarray();
        let (fw, fh) = (frame.width() as i64, frame.height() as i64);
        let s = input_size as usize;
        let step = self.size / input_size as f32;

        let mut tensor = Array4::<f32>::zeros((1, 3, s, s));
        for y in 0..s {
            let sy = (self.top() + (y as f32 + 0.5) * step).floor() as i64;
            if sy < 0 || sy >= fh {
                continue;
            }
            for x in 0..s {
                let sx = (self.left() + (x as f32 + 0.5) * step).floor() as i64;
                if sx < 0 || sx >= fw {
                    continue;
                }
                for c in 0..3 {
                    tensor[[0, c, y, x]] = src[[sy as usize, sx as usize, c]] as f32 / 255.0;
                }
            }
        }
        tensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_full_frame_letterboxes() {
        let roi = SquareRoi::full_frame(640, 480);
        assert_relative_eq!(roi.size, 640.0);
        assert_relative_eq!(roi.top(), -80.0);
        let (x, y) = roi.to_frame(96.0, 96.0, 192);
        assert_relative_eq!(x, 320.0);
        assert_relative_eq!(y, 240.0);
    }

    #[test]
    fn test_around_points_is_square_and_scaled() {
        let roi = SquareRoi::around(&[(10.0, 20.0), (30.0, 60.0)], 2.0).unwrap();
        assert_relative_eq!(roi.cx, 20.0);
        assert_relative_eq!(roi.cy, 40.0);
        assert_relative_eq!(roi.size, 80.0);
    }

    #[test]
    fn test_around_no_points() {
        assert!(SquareRoi::around(&[], 2.0).is_none());
    }

    #[test]
    fn test_crop_tensor_pads_outside_with_black() {
        let frame = Frame::solid(4, 2, [255, 255, 255], 0);
        let tensor = SquareRoi::full_frame(4, 2).crop_tensor(&frame, 4);
        assert_eq!(tensor.shape(), &[1, 3, 4, 4]);
        // Rows 0 and 3 fall in the letterbox padding.
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 0.0);
        assert_relative_eq!(tensor[[0, 0, 1, 0]], 1.0);
        assert_relative_eq!(tensor[[0, 2, 2, 3]], 1.0);
        assert_relative_eq!(tensor[[0, 1, 3, 2]], 0.0);
    }

    #[test]
    fn test_crop_tensor_channel_order() {
        let frame = Frame::solid(8, 8, [255, 0, 51], 0);
        let tensor = SquareRoi::full_frame(8, 8).crop_tensor(&frame, 2);
        assert_relative_eq!(tensor[[0, 0, 0, 0]], 1.0);
        assert_relative_eq!(tensor[[0, 1, 0, 0]], 0.0);
        assert_relative_eq!(tensor[[0, 2, 0, 0]], 0.2);
    }
}
