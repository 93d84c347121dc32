pub mod detector_builder;
pub mod model_cache;
