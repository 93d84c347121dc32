pub mod active_detector;
pub mod capture_worker;
pub mod fps_counter;
pub mod frame_pipeline;
pub mod pipeline_logger;
pub mod run_pipeline_use_case;
