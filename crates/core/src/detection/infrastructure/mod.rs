pub mod deadline_detector;
pub mod model_registry;
pub mod onnx_face_embedder;
pub mod onnx_session;
pub mod onnx_yolo_detector;
pub mod shared_model;
