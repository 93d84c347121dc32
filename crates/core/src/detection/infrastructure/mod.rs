pub mod detector_factory;
pub mod math;
pub mod model_resolver;
pub mod onnx_face_detection_model;
pub mod onnx_hand_landmark_model;
pub mod onnx_palm_detector;
pub mod onnx_session;
pub mod roi;
