use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::detection::domain::embedding::ReferenceEmbedding;
use crate::detection::domain::face_embedder::EmbeddingError;
use crate::detection::domain::object_detector::DetectionError;
use crate::detection::infrastructure::model_registry::ModelRegistry;
use crate::detection::infrastructure::onnx_session::ModelLoadError;
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::VideoError;
use crate::video::infrastructure::image_file_reader::read_image_frame;

#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error(transparent)]
    Image(#[from] VideoError),
    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),
    #[error("face detection on reference failed: {0}")]
    Detection(#[from] DetectionError),
    #[error("no face found in {0}")]
    NoFaceFound(PathBuf),
    #[error("embedding the reference face failed: {0}")]
    Embedding(#[from] EmbeddingError),
}

/// Turns a reference photo into the embedding the session tracks:
/// read → detect → embed the first detected face.
pub struct LoadReferenceUseCase {
    models: Arc<ModelRegistry>,
    target_class: usize,
}

impl LoadReferenceUseCase {
    pub fn new(models: Arc<ModelRegistry>, target_class: usize) -> Self {
        Self {
            models,
            target_class,
        }
    }

    pub fn execute(&self, image_path: &Path) -> Result<ReferenceEmbedding, ReferenceError> {
        let frame = read_image_frame(image_path)?;
        self.from_frame(&frame, image_path)
    }

    /// `origin` names the image in errors and logs.
    pub fn from_frame(&self, frame: &Frame, origin: &Path) -> Result<ReferenceEmbedding, ReferenceError> {
        let detector = self.models.detector()?;
        let boxes = detector.detect(frame, self.target_class)?;
        let Some(face) = boxes.first() else {
            return Err(ReferenceError::NoFaceFound(origin.to_path_buf()));
        };
        if boxes.len() > 1 {
            log::warn!(
                "{} faces found in {}, using the first",
                boxes.len(),
                origin.display()
            );
        }

        let embedding = self.models.embedder()?.embed(frame, face)?;
        log::info!(
            "Reference face loaded from {} ({}-dim embedding)",
            origin.display(),
            embedding.len()
        );
        Ok(ReferenceEmbedding::new(embedding))
    }
}
