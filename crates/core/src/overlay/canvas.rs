use std::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    mono_font::{ascii, MonoTextStyle},
    pixelcolor::Rgb888,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle},
    text::{Baseline, Text},
};

use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Text size for overlay labels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextSize {
    Small,
    Large,
}

/// Draws primitives straight into a frame's RGB buffer.
///
/// Anything falling outside the frame is clipped.
pub struct FrameCanvas<'a> {
    frame: &'a mut Frame,
}

impl<'a> FrameCanvas<'a> {
    pub fn new(frame: &'a mut Frame) -> Self {
        Self { frame }
    }

    pub fn line(&mut self, from: (i32, i32), to: (i32, i32), color: [u8; 3], width: u32) {
        self.draw(
            Line::new(Point::new(from.0, from.1), Point::new(to.0, to.1))
                .into_styled(PrimitiveStyle::with_stroke(rgb(color), width)),
        );
    }

    pub fn filled_circle(&mut self, center: (i32, i32), radius: u32, color: [u8; 3]) {
        self.draw(
            Circle::with_center(Point::new(center.0, center.1), radius * 2 + 1)
                .into_styled(PrimitiveStyle::with_fill(rgb(color))),
        );
    }

    pub fn rect_outline(&mut self, bbox: &BoundingBox, color: [u8; 3], width: u32) {
        if bbox.is_empty() {
            return;
        }
        self.draw(
            Rectangle::new(
                Point::new(bbox.x, bbox.y),
                Size::new(bbox.width as u32, bbox.height as u32),
            )
            .into_styled(PrimitiveStyle::with_stroke(rgb(color), width)),
        );
    }

    /// Draws `text` with its baseline starting at `origin`.
    pub fn text(&mut self, origin: (i32, i32), text: &str, color: [u8; 3], size: TextSize) {
        let font = match size {
            TextSize::Small => &ascii::FONT_6X10,
            TextSize::Large => &ascii::FONT_10X20,
        };
        let style = MonoTextStyle::new(font, rgb(color));
        self.draw(Text::with_baseline(
            text,
            Point::new(origin.0, origin.1),
            style,
            Baseline::Alphabetic,
        ));
    }

    fn draw(&mut self, drawable: impl Drawable<Color = Rgb888>) {
        match drawable.draw(self) {
            Ok(_) => {}
            Err(infallible) => match infallible {},
        }
    }
}

fn rgb(color: [u8; 3]) -> Rgb888 {
    Rgb888::new(color[0], color[1], color[2])
}

impl OriginDimensions for FrameCanvas<'_> {
    fn size(&self) -> Size {
        Size::new(self.frame.width(), self.frame.height())
    }
}

impl DrawTarget for FrameCanvas<'_> {
    type Color = Rgb888;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.frame
                .set_pixel(point.x, point.y, [color.r(), color.g(), color.b()]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::colors::{MAGENTA, WHITE};

    const BLACK: [u8; 3] = [0, 0, 0];

    #[test]
    fn test_line_paints_endpoints() {
        let mut frame = Frame::solid(20, 20, BLACK, 0);
        FrameCanvas::new(&mut frame).line((2, 3), (15, 3), WHITE, 1);
        assert_eq!(frame.pixel(2, 3), Some(WHITE));
        assert_eq!(frame.pixel(15, 3), Some(WHITE));
        assert_eq!(frame.pixel(2, 4), Some(BLACK));
    }

    #[test]
    fn test_filled_circle_covers_center_and_radius() {
        let mut frame = Frame::solid(40, 40, BLACK, 0);
        FrameCanvas::new(&mut frame).filled_circle((20, 20), 5, MAGENTA);
        assert_eq!(frame.pixel(20, 20), Some(MAGENTA));
        assert_eq!(frame.pixel(24, 20), Some(MAGENTA));
        assert_eq!(frame.pixel(20, 30), Some(BLACK));
    }

    #[test]
    fn test_rect_outline_leaves_interior() {
        let mut frame = Frame::solid(80, 80, BLACK, 0);
        let bbox = BoundingBox::new(10, 10, 50, 50);
        FrameCanvas::new(&mut frame).rect_outline(&bbox, MAGENTA, 1);
        assert_eq!(frame.pixel(10, 10), Some(MAGENTA));
        assert_eq!(frame.pixel(59, 59), Some(MAGENTA));
        assert_eq!(frame.pixel(35, 35), Some(BLACK));
    }

    #[test]
    fn test_empty_rect_draws_nothing() {
        let mut frame = Frame::solid(10, 10, BLACK, 0);
        let before = frame.clone();
        FrameCanvas::new(&mut frame).rect_outline(&BoundingBox::new(2, 2, 0, 5), WHITE, 1);
        assert_eq!(frame, before);
    }

    #[test]
    fn test_drawing_off_frame_is_clipped() {
        let mut frame = Frame::solid(10, 10, BLACK, 0);
        let mut canvas = FrameCanvas::new(&mut frame);
        canvas.filled_circle((-50, -50), 5, WHITE);
        canvas.line((-20, 5), (30, 5), WHITE, 1);
        assert_eq!(frame.pixel(0, 5), Some(WHITE));
        assert_eq!(frame.pixel(9, 5), Some(WHITE));
        assert_eq!(frame.pixel(0, 0), Some(BLACK));
    }

    #[test]
    fn test_text_marks_pixels_above_baseline() {
        let mut frame = Frame::solid(100, 40, BLACK, 0);
        FrameCanvas::new(&mut frame).text((5, 30), "88", WHITE, TextSize::Large);
        let painted = (0..100)
            .flat_map(|x| (0..40).map(move |y| (x, y)))
            .filter(|&(x, y)| frame.pixel(x, y) == Some(WHITE))
            .count();
        assert!(painted > 0);
        assert!((35..40).all(|y| (0..100).all(|x| frame.pixel(x, y) == Some(BLACK))));
    }
}
