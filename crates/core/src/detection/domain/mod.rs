pub mod detector_adapter;
pub mod face_detection_model;
pub mod face_detector;
pub mod hand_detector;
pub mod hand_landmark_model;

#[cfg(test)]
pub(crate) mod test_models;
