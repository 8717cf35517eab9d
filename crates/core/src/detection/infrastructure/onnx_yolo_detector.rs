/// YOLO object detector running on ONNX Runtime via `ort`.
///
/// Expects the usual Ultralytics export layout: one output of shape
/// `[1, 4 + classes (+ extras), anchors]` or its transpose, rows holding
/// `cx, cy, w, h` followed by per-class scores. Extra trailing columns (pose
/// keypoints, masks) are ignored.
use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::object_detector::{DetectionError, ObjectDetector};
use crate::detection::infrastructure::onnx_session::{load_session, static_input_size, ModelLoadError};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Fallback input resolution for models with dynamic input shapes.
const DEFAULT_INPUT_SIZE: u32 = 640;

pub const DEFAULT_CONFIDENCE: f32 = 0.25;

const NMS_IOU_THRESH: f32 = 0.45;

/// Letterbox padding value, YOLO convention.
const PAD_VALUE: f32 = 114.0 / 255.0;

pub struct OnnxYoloDetector {
    session: Mutex<ort::session::Session>,
    input_size: u32,
    confidence: f32,
    /// Number of class score columns; `None` means "everything after the box".
    num_classes: Option<usize>,
}

impl OnnxYoloDetector {
    pub fn new(
        model_path: &Path,
        confidence: f32,
        num_classes: Option<usize>,
    ) -> Result<Self, ModelLoadError> {
        let session = load_session(model_path)?;
        let input_size = static_input_size(&session).unwrap_or(DEFAULT_INPUT_SIZE);
        Ok(Self {
            session: Mutex::new(session),
            input_size,
            confidence,
            num_classes,
        })
    }

    fn infer(&self, frame: &Frame) -> Result<(Vec<f32>, Vec<usize>, Letterbox), DetectionError> {
        let (tensor, letterbox) = letterbox(frame, self.input_size);
        let input = ort::value::Tensor::from_array(tensor).map_err(inference_error)?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| DetectionError::Inference(format!("session lock poisoned: {e}")))?;
        let outputs = session.run(ort::inputs![input]).map_err(inference_error)?;
        if outputs.len() == 0 {
            return Err(DetectionError::Inference("model produced no outputs".into()));
        }
        let array = outputs[0]
            .try_extract_array::<f32>()
            .map_err(inference_error)?;
        let shape = array.shape().to_vec();
        let data = array
            .as_standard_layout()
            .as_slice()
            .map(<[f32]>::to_vec)
            .ok_or_else(|| DetectionError::Inference("output tensor is not contiguous".into()))?;
        Ok((data, shape, letterbox))
    }
}

impl ObjectDetector for OnnxYoloDetector {
    fn detect(&self, frame: &Frame, target_class: usize) -> Result<Vec<BoundingBox>, DetectionError> {
        let (data, shape, letterbox) = self.infer(frame)?;
        let layout = OutputLayout::from_shape(&shape)?;

        let class_columns = layout.features.saturating_sub(4);
        let num_classes = self.num_classes.unwrap_or(class_columns).min(class_columns);
        if target_class >= num_classes {
            return Err(DetectionError::Inference(format!(
                "class {target_class} out of range for a {num_classes}-class model"
            )));
        }

        let mut candidates = Vec::new();
        for anchor in 0..layout.anchors {
            let score = layout.value(&data, anchor, 4 + target_class);
            if score < self.confidence {
                continue;
            }
            let cx = layout.value(&data, anchor, 0);
            let cy = layout.value(&data, anchor, 1);
            let w = layout.value(&data, anchor, 2);
            let h = layout.value(&data, anchor, 3);
            candidates.push(Candidate {
                corners: letterbox.to_frame([cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0]),
                score,
            });
        }

        let kept = nms(candidates, NMS_IOU_THRESH);
        Ok(kept
            .into_iter()
            .map(|c| BoundingBox::from_corners(c.corners.map(f64::from), frame.sequence()))
            .collect())
    }
}

fn inference_error(e: impl std::fmt::Display) -> DetectionError {
    DetectionError::Inference(e.to_string())
}

// ---------------------------------------------------------------------------
// Output decoding
// ---------------------------------------------------------------------------

/// Row/column view over the raw `[1, A, B]` output tensor.
#[derive(Debug, PartialEq)]
struct OutputLayout {
    anchors: usize,
    features: usize,
    /// `true` when features are the slow axis (`[1, features, anchors]`).
    transposed: bool,
}

impl OutputLayout {
    fn from_shape(shape: &[usize]) -> Result<Self, DetectionError> {
        if shape.len() != 3 {
            return Err(DetectionError::Inference(format!(
                "unexpected YOLO output shape {shape:?}"
            )));
        }
        // Anchor count always dwarfs the feature count.
        let transposed = shape[1] < shape[2];
        let (anchors, features) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        if features < 5 {
            return Err(DetectionError::Inference(format!(
                "YOLO output has {features} features per anchor, need at least 5"
            )));
        }
        Ok(Self {
            anchors,
            features,
            transposed,
        })
    }

    fn value(&self, data: &[f32], anchor: usize, feature: usize) -> f32 {
        if self.transposed {
            data[feature * self.anchors + anchor]
        } else {
            data[anchor * self.features + feature]
        }
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
struct Letterbox {
    scale: f32,
    pad_x: f32,
    pad_y: f32,
}

impl Letterbox {
    fn to_frame(&self, [x1, y1, x2, y2]: [f32; 4]) -> [f32; 4] {
        [
            (x1 - self.pad_x) / self.scale,
            (y1 - self.pad_y) / self.scale,
            (x2 - self.pad_x) / self.scale,
            (y2 - self.pad_y) / self.scale,
        ]
    }
}

/// Aspect-preserving nearest-neighbour resize into a gray-padded square,
/// returned as a normalized NCHW tensor.
fn letterbox(frame: &Frame, target: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f32;
    let fh = frame.height() as f32;
    let scale = (target as f32 / fw).min(target as f32 / fh);
    let new_w = ((fw * scale).round() as u32).min(target);
    let new_h = ((fh * scale).round() as u32).min(target);
    let pad_x = (target - new_w) / 2;
    let pad_y = (target - new_h) / 2;

    let size = target as usize;
    let mut tensor = ndarray::Array4::<f32>::from_elem((1, 3, size, size), PAD_VALUE);
    let src = frame.as_ndarray();
    let max_x = frame.width() as usize - 1;
    let max_y = frame.height() as usize - 1;

    for y in 0..new_h as usize {
        let sy = ((y as f32 / scale) as usize).min(max_y);
        for x in 0..new_w as usize {
            let sx = ((x as f32 / scale) as usize).min(max_x);
            for c in 0..3 {
                tensor[[0, c, pad_y as usize + y, pad_x as usize + x]] = src[[sy, sx, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x: pad_x as f32,
            pad_y: pad_y as f32,
        },
    )
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct Candidate {
    corners: [f32; 4],
    score: f32,
}

/// Greedy NMS; output is ordered by descending score.
fn nms(mut candidates: Vec<Candidate>, iou_thresh: f32) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut kept: Vec<Candidate> = Vec::new();
    for candidate in candidates {
        if kept.iter().all(|k| iou(&k.corners, &candidate.corners) <= iou_thresh) {
            kept.push(candidate);
        }
    }
    kept
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
    let inter_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let inter_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = inter_w * inter_h;
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a[2] - a[0]) * (a[3] - a[1]);
    let area_b = (b[2] - b[0]) * (b[3] - b[1]);
    inter / (area_a + area_b - inter)
}
