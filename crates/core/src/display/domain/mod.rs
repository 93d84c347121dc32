pub mod display_image;
pub mod display_sink;
pub mod fps_overlay;
