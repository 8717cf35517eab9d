/// Default detector: a single-class face YOLO with pose keypoints, whose
/// keypoint columns are ignored.
pub const DETECTOR_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const DETECTOR_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";
pub const DETECTOR_MODEL_CLASSES: usize = 1;

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Euclidean distance below which a candidate is the reference face.
pub const DEFAULT_DISTANCE_THRESHOLD: f32 = 0.45;

/// Run detection on every Nth frame.
pub const DEFAULT_DETECT_INTERVAL: u64 = 5;

/// Push a frame to the display on every Nth frame.
pub const DEFAULT_DISPLAY_INTERVAL: u64 = 2;

/// Orchestrator tick period (~33 fps).
pub const DEFAULT_TICK_MS: u64 = 30;

/// Upper bound on how long the match worker sleeps before re-checking its
/// inbox and stop flag.
pub const DEFAULT_IDLE_WAIT_MS: u64 = 5;

/// Upper bound on a single detector call before the tick gives up on it.
pub const DEFAULT_DETECT_TIMEOUT_MS: u64 = 2000;

/// Detector class id of the tracked object ("face" for face models,
/// "person" for COCO models).
pub const DEFAULT_TARGET_CLASS: usize = 0;

/// Overlay color and stroke width.
pub const OVERLAY_COLOR: [u8; 3] = [0, 255, 0];
pub const OVERLAY_THICKNESS: u32 = 3;
