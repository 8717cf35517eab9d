//! Scripted collaborators shared by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use crate::detection::domain::embedding::{Embedding, ReferenceEmbedding};
use crate::detection::domain::face_embedder::{EmbeddingError, FaceEmbedder};
use crate::detection::domain::object_detector::{DetectionError, ObjectDetector};
use crate::display::domain::display_sink::{DisplayError, DisplaySink, FrameRecorder};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;
use crate::video::domain::frame_source::{FrameSource, VideoError};

const GATE_TIMEOUT: Duration = Duration::from_secs(10);
const UNKNOWN_DISTANCE: f32 = 10.0;

/// Detector answering from a per-frame-sequence script. Unscripted frames
/// yield no boxes.
#[derive(Default)]
pub(crate) struct ScriptedDetector {
    boxes: HashMap<u64, Vec<BoundingBox>>,
    failures: HashMap<u64, DetectionError>,
    delays: HashMap<u64, Duration>,
    calls: Arc<Mutex<Vec<u64>>>,
    classes: Arc<Mutex<Vec<usize>>>,
}

impl ScriptedDetector {
    pub fn with_boxes(mut self, sequence: u64, boxes: Vec<BoundingBox>) -> Self {
        self.boxes.insert(sequence, boxes);
        self
    }

    pub fn with_failure(mut self, sequence: u64, error: DetectionError) -> Self {
        self.failures.insert(sequence, error);
        self
    }

    pub fn with_delay(mut self, sequence: u64, delay: Duration) -> Self {
        self.delays.insert(sequence, delay);
        self
    }

    /// Frame sequences the detector was called with, in call order.
    pub fn calls(&self) -> Arc<Mutex<Vec<u64>>> {
        Arc::clone(&self.calls)
    }

    pub fn classes(&self) -> Arc<Mutex<Vec<usize>>> {
        Arc::clone(&self.classes)
    }
}

impl ObjectDetector for ScriptedDetector {
    fn detect(&self, frame: &Frame, target_class: usize) -> Result<Vec<BoundingBox>, DetectionError> {
        let sequence = frame.sequence();
        self.calls.lock().unwrap().push(sequence);
        self.classes.lock().unwrap().push(target_class);
        if let Some(delay) = self.delays.get(&sequence) {
            thread::sleep(*delay);
        }
        if let Some(error) = self.failures.get(&sequence) {
            return Err(error.clone());
        }
        Ok(self.boxes.get(&sequence).cloned().unwrap_or_default())
    }
}

/// Reference embedding that [`ScriptedEmbedder`] distances are measured from.
pub(crate) fn reference() -> ReferenceEmbedding {
    ReferenceEmbedding::new(Embedding::new(vec![0.0, 0.0]))
}

/// Embedder whose distance to [`reference`] is scripted by the box's `x1`.
///
/// Unscripted boxes land far from the reference. A gate can hold calls for
/// chosen frame sequences until the test releases them.
#[derive(Default)]
pub(crate) struct ScriptedEmbedder {
    distances: HashMap<i32, Option<f32>>,
    calls: Arc<Mutex<Vec<BoundingBox>>>,
    frames: Arc<Mutex<Vec<u64>>>,
    gate: Option<GateInner>,
}

struct GateInner {
    sequences: Vec<u64>,
    entered: Sender<u64>,
    release: Receiver<()>,
}

/// Test-side handle of a gated [`ScriptedEmbedder`].
pub(crate) struct EmbedderGate {
    entered: Receiver<u64>,
    release: Sender<()>,
}

impl EmbedderGate {
    /// Waits until the embedder blocks on a gated frame; returns its sequence.
    pub fn wait_entered(&self) -> Option<u64> {
        self.entered.recv_timeout(GATE_TIMEOUT).ok()
    }

    pub fn release(&self) {
        let _ = self.release.send(());
    }
}

impl ScriptedEmbedder {
    pub fn with_distance(mut self, x1: i32, distance: f32) -> Self {
        self.distances.insert(x1, Some(distance));
        self
    }

    pub fn with_failure(mut self, x1: i32) -> Self {
        self.distances.insert(x1, None);
        self
    }

    pub fn gated_on(mut self, sequences: &[u64]) -> (Self, EmbedderGate) {
        let (entered_tx, entered_rx) = crossbeam_channel::unbounded();
        let (release_tx, release_rx) = crossbeam_channel::unbounded();
        self.gate = Some(GateInner {
            sequences: sequences.to_vec(),
            entered: entered_tx,
            release: release_rx,
        });
        (
            self,
            EmbedderGate {
                entered: entered_rx,
                release: release_tx,
            },
        )
    }

    /// Boxes the embedder was called with, in call order.
    pub fn calls(&self) -> Arc<Mutex<Vec<BoundingBox>>> {
        Arc::clone(&self.calls)
    }

    /// Sequence of the frame passed alongside each box.
    pub fn frames(&self) -> Arc<Mutex<Vec<u64>>> {
        Arc::clone(&self.frames)
    }
}

impl FaceEmbedder for ScriptedEmbedder {
    fn embed(&self, frame: &Frame, bbox: &BoundingBox) -> Result<Embedding, EmbeddingError> {
        self.calls.lock().unwrap().push(*bbox);
        self.frames.lock().unwrap().push(frame.sequence());

        if let Some(gate) = &self.gate {
            if gate.sequences.contains(&frame.sequence()) {
                let _ = gate.entered.send(frame.sequence());
                let _ = gate.release.recv_timeout(GATE_TIMEOUT);
            }
        }

        match self.distances.get(&bbox.x1) {
            Some(Some(distance)) => Ok(Embedding::new(vec![*distance, 0.0])),
            Some(None) => Err(EmbeddingError::Inference("scripted failure".into())),
            None => Ok(Embedding::new(vec![UNKNOWN_DISTANCE, 0.0])),
        }
    }
}

/// Source of blank frames with sequences `1..=count`, generated on demand.
pub(crate) struct VecFrameSource {
    next: u64,
    count: u64,
    width: u32,
    height: u32,
    fail_at: Option<u64>,
    closed: Arc<AtomicUsize>,
}

impl VecFrameSource {
    pub fn new(count: u64, width: u32, height: u32) -> Self {
        Self {
            next: 1,
            count,
            width,
            height,
            fail_at: None,
            closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Makes the read of frame `sequence` fail instead.
    pub fn failing_at(mut self, sequence: u64) -> Self {
        self.fail_at = Some(sequence);
        self
    }

    /// Number of `close` calls.
    pub fn closed(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closed)
    }
}

impl FrameSource for VecFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, VideoError> {
        if self.next > self.count {
            return Ok(None);
        }
        let sequence = self.next;
        self.next += 1;
        if self.fail_at == Some(sequence) {
            return Err(VideoError::NoVideoStream("scripted.mp4".into()));
        }
        Ok(Some(Frame::blank(self.width, self.height, sequence)))
    }

    fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

type Shown = Arc<Mutex<Vec<(Frame, Option<BoundingBox>)>>>;

/// Display sink and recorder that keeps everything it receives.
#[derive(Default)]
pub(crate) struct RecordingSink {
    shown: Shown,
    recorded: Arc<Mutex<Vec<Frame>>>,
    finish_calls: Arc<AtomicUsize>,
}

impl RecordingSink {
    pub fn shown(&self) -> Shown {
        Arc::clone(&self.shown)
    }

    pub fn recorded(&self) -> Arc<Mutex<Vec<Frame>>> {
        Arc::clone(&self.recorded)
    }

    pub fn finish_calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.finish_calls)
    }
}

impl DisplaySink for RecordingSink {
    fn show(&mut self, frame: Frame, track: Option<BoundingBox>) -> Result<(), DisplayError> {
        self.shown.lock().unwrap().push((frame, track));
        Ok(())
    }
}

impl FrameRecorder for RecordingSink {
    fn record(&mut self, frame: &Frame) -> Result<(), DisplayError> {
        self.recorded.lock().unwrap().push(frame.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DisplayError> {
        self.finish_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
