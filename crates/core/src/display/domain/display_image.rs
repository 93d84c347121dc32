use image::imageops::FilterType;

use crate::shared::frame::Frame;

/// RGBA pixels ready for a GUI image surface.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Largest size with the aspect ratio of `width` x `height` that fits inside
/// `max_width` x `max_height`. Scales up as well as down.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 || max_width == 0 || max_height == 0 {
        return (0, 0);
    }
    let scale = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    let w = ((width as f64 * scale).round() as u32).clamp(1, max_width);
    let h = ((height as f64 * scale).round() as u32).clamp(1, max_height);
    (w, h)
}

/// Converts an RGB frame to RGBA, rescaled to fit the display area.
pub fn to_display_image(frame: &Frame, max_width: u32, max_height: u32) -> DisplayImage {
    let (w, h) = fit_within(frame.width(), frame.height(), max_width, max_height);
    let rgba = rgb_to_rgba(frame.data());

    if (w, h) == (frame.width(), frame.height()) || w == 0 {
        return DisplayImage {
            width: frame.width(),
            height: frame.height(),
            rgba,
        };
    }

    match image::RgbaImage::from_raw(frame.width(), frame.height(), rgba) {
        Some(img) => {
            let resized = image::imageops::resize(&img, w, h, FilterType::Triangle);
            DisplayImage {
                width: w,
                height: h,
                rgba: resized.into_raw(),
            }
        }
        None => {
            log::warn!("Frame {} has an inconsistent buffer, showing blank", frame.index());
            DisplayImage {
                width: w,
                height: h,
                rgba: vec![0; w as usize * h as usize * 4],
            }
        }
    }
}

fn rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(rgb.len() / 3 * 4);
    for px in rgb.chunks_exact(3) {
        rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
    }
    rgba
}
