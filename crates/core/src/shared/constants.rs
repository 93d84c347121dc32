pub const PALM_MODEL_NAME: &str = "palm_detection_lite.onnx";
pub const PALM_MODEL_URL: &str =
    "https://github.com/PINTO0309/PINTO_model_zoo/raw/main/033_Hand_Detection_and_Tracking/palm_detection_lite.onnx";

pub const HAND_LANDMARK_MODEL_NAME: &str = "hand_landmark_lite.onnx";
pub const HAND_LANDMARK_MODEL_URL: &str =
    "https://github.com/PINTO0309/PINTO_model_zoo/raw/main/033_Hand_Detection_and_Tracking/hand_landmark_lite.onnx";

pub const FACE_MODEL_NAME: &str = "face_detection_short_range.onnx";
pub const FACE_MODEL_URL: &str =
    "https://github.com/PINTO0309/PINTO_model_zoo/raw/main/030_BlazeFace/face_detection_short_range.onnx";

/// Landmarks per hand in the MediaPipe labeling scheme.
pub const HAND_LANDMARK_COUNT: usize = 21;

pub const DEFAULT_CAMERA_INDEX: u32 = 0;

/// Size of the on-screen video surface; frames are scaled to fit inside it.
pub const DISPLAY_WIDTH: u32 = 640;
pub const DISPLAY_HEIGHT: u32 = 480;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];
