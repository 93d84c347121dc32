pub mod bounding_box;
pub mod constants;
pub mod frame;
pub mod landmark;
pub mod source_info;
pub mod source_spec;
