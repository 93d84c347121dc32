use std::time::Instant;

/// Instantaneous frame rate from the gap between consecutive frames.
#[derive(Debug, Default)]
pub struct FpsCounter {
    last: Option<Instant>,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a frame at `now` and returns `round(1 / dt)`.
    ///
    /// Returns `None` for the first frame and when `dt` is zero.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        let fps = self.last.and_then(|prev| {
            let dt = now.saturating_duration_since(prev).as_secs_f64();
            (dt > 0.0).then(|| (1.0 / dt).round() as u32)
        });
        self.last = Some(now);
        fps
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}
