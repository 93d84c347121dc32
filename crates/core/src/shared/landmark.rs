/// A keypoint in normalized model coordinates.
///
/// `x` and `y` are fractions of the frame width and height; the model may
/// report values slightly outside `[0, 1]` for points near the border.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NormalizedLandmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl NormalizedLandmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Pixel position inside a `width` x `height` frame.
    ///
    /// Truncates like an integer cast, then clamps so the result always lies
    /// in `[0, width) x [0, height)`.
    pub fn to_pixel(&self, width: u32, height: u32) -> (i32, i32) {
        (
            scale_clamped(self.x, width),
            scale_clamped(self.y, height),
        )
    }
}

fn scale_clamped(value: f32, extent: u32) -> i32 {
    if extent == 0 {
        return 0;
    }
    let max = extent as i32 - 1;
    let scaled = (value * extent as f32) as i32;
    scaled.clamp(0, max)
}

/// A labeled keypoint in frame pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Landmark {
    pub index: usize,
    pub x: i32,
    pub y: i32,
}

impl Landmark {
    pub fn new(index: usize, x: i32, y: i32) -> Self {
        Self { index, x, y }
    }
}
