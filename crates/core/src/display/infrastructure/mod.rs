pub mod log_display_sink;
pub mod video_file_sink;
