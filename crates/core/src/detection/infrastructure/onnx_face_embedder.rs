/// ArcFace embedder on ONNX Runtime.
///
/// Crops the candidate box, resizes it to 112x112, normalizes to [-1, 1]
/// and L2-normalizes the model output, so Euclidean distances between two
/// embeddings fall in [0, 2].
use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::embedding::Embedding;
use crate::detection::domain::face_embedder::{EmbeddingError, FaceEmbedder};
use crate::detection::infrastructure::onnx_session::{load_session, ModelLoadError};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct OnnxFaceEmbedder {
    session: Mutex<ort::session::Session>,
}

impl OnnxFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, ModelLoadError> {
        Ok(Self {
            session: Mutex::new(load_session(model_path)?),
        })
    }
}

impl FaceEmbedder for OnnxFaceEmbedder {
    fn embed(&self, frame: &Frame, bbox: &BoundingBox) -> Result<Embedding, EmbeddingError> {
        let crop = frame
            .crop(bbox)
            .ok_or(EmbeddingError::InvalidRegion(*bbox))?;
        let input = ort::value::Tensor::from_array(preprocess(&crop)).map_err(inference_error)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| EmbeddingError::Inference(format!("session lock poisoned: {e}")))?;
        let outputs = session.run(ort::inputs![input]).map_err(inference_error)?;
        let values = outputs[0]
            .try_extract_array::<f32>()
            .map_err(inference_error)?
            .iter()
            .copied()
            .collect::<Vec<f32>>();

        let mut embedding = Embedding::new(values);
        embedding.l2_normalize();
        Ok(embedding)
    }
}

fn inference_error(e: impl std::fmt::Display) -> EmbeddingError {
    EmbeddingError::Inference(e.to_string())
}

/// Nearest-neighbour resize of the crop to the model input, NCHW layout.
fn preprocess(crop: &Frame) -> ndarray::Array4<f32> {
    let src = crop.as_ndarray();
    let src_w = crop.width() as usize;
    let src_h = crop.height() as usize;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));
    for y in 0..INPUT_SIZE {
        let sy = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let sx = (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (src[[sy, sx, c]] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }
    tensor
}
