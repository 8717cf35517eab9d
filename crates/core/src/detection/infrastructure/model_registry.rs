use std::path::PathBuf;
use std::sync::Arc;

use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::detection::infrastructure::onnx_face_embedder::OnnxFaceEmbedder;
use crate::detection::infrastructure::onnx_session::ModelLoadError;
use crate::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use crate::detection::infrastructure::shared_model::SharedModel;

pub type DetectorLoader =
    Box<dyn Fn() -> Result<Arc<dyn ObjectDetector>, ModelLoadError> + Send + Sync>;
pub type EmbedderLoader =
    Box<dyn Fn() -> Result<Arc<dyn FaceEmbedder>, ModelLoadError> + Send + Sync>;

/// Owns the process-wide detector and embedder.
///
/// Each model is built on first request, at most once, from whichever
/// thread asks first (reference loading or session start). Consumers receive
/// `Arc` handles; the registry itself is passed around as `Arc<ModelRegistry>`.
pub struct ModelRegistry {
    detector: SharedModel<dyn ObjectDetector>,
    embedder: SharedModel<dyn FaceEmbedder>,
    load_detector: DetectorLoader,
    load_embedder: EmbedderLoader,
}

/// Paths and knobs for the ONNX-backed models.
#[derive(Clone, Debug)]
pub struct OnnxModelPaths {
    pub detector: PathBuf,
    pub embedder: PathBuf,
    pub confidence: f32,
    pub num_classes: Option<usize>,
}

impl ModelRegistry {
    pub fn new(load_detector: DetectorLoader, load_embedder: EmbedderLoader) -> Arc<Self> {
        Arc::new(Self {
            detector: SharedModel::new(),
            embedder: SharedModel::new(),
            load_detector,
            load_embedder,
        })
    }

    pub fn onnx(paths: OnnxModelPaths) -> Arc<Self> {
        let detector_paths = paths.clone();
        Self::new(
            Box::new(move || {
                let detector = OnnxYoloDetector::new(
                    &detector_paths.detector,
                    detector_paths.confidence,
                    detector_paths.num_classes,
                )?;
                Ok(Arc::new(detector) as Arc<dyn ObjectDetector>)
            }),
            Box::new(move || {
                let embedder = OnnxFaceEmbedder::new(&paths.embedder)?;
                Ok(Arc::new(embedder) as Arc<dyn FaceEmbedder>)
            }),
        )
    }

    pub fn detector(&self) -> Result<Arc<dyn ObjectDetector>, ModelLoadError> {
        self.detector.get_or_try_init(&self.load_detector)
    }

    pub fn embedder(&self) -> Result<Arc<dyn FaceEmbedder>, ModelLoadError> {
        self.embedder.get_or_try_init(&self.load_embedder)
    }

    pub fn is_detector_loaded(&self) -> bool {
        self.detector.get().is_some()
    }

    pub fn is_embedder_loaded(&self) -> bool {
        self.embedder.get().is_some()
    }
}
