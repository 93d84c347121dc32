use iced::widget::image::Handle;

use camsight_core::display::domain::display_image::to_display_image;
use camsight_core::display::domain::display_sink::DisplaySink;
use camsight_core::shared::constants::{DISPLAY_WIDTH, DISPLAY_HEIGHT};
use camsight_core::shared::frame::Frame;

/// Holds the latest frame as an iced image handle plus the rate label.
pub struct PreviewSurface {
    handle: Option<Handle>,
    size: Option<(u32, u32)>,
    fps: Option<u32>,
    max_width: u32,
    max_height: u32,
}

impl PreviewSurface {
    pub fn new() -> Self {
        Self {
            handle: None,
            size: None,
            fps: None,
            max_width: DISPLAY_WIDTH,
            max_height: DISPLAY_HEIGHT,
        }
    }

    pub fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }

    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    pub fn fps_label(&self) -> String {
        match self.fps {
            Some(fps) => format!("FPS: {fps}"),
            None => "FPS: --".to_string(),
        }
    }

    pub fn clear(&mut self) {
        self.handle = None;
        self.size = None;
        self.fps = None;
    }
}

impl DisplaySink for PreviewSurface {
    fn present(&mut self, frame: &Frame, fps: Option<u32>) -> Result<(), Box<dyn std::error::Error>> {
        let image = to_display_image(frame, self.max_width, self.max_height);
        self.size = Some((image.width, image.height));
        self.handle = Some(Handle::from_rgba(image.width, image.height, image.rgba));
        self.fps = fps;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.fps = None;
        Ok(())
    }
}
