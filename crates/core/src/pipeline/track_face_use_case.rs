use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::detection::domain::detection_sampler::DetectionSampler;
use crate::detection::domain::embedding::ReferenceEmbedding;
use crate::detection::infrastructure::deadline_detector::DeadlineDetector;
use crate::detection::infrastructure::model_registry::ModelRegistry;
use crate::detection::infrastructure::onnx_session::ModelLoadError;
use crate::display::domain::display_sink::{DisplaySink, FrameRecorder};
use crate::display::domain::display_throttle::DisplayThrottle;
use crate::pipeline::infrastructure::periodic_ticker::PeriodicTicker;
use crate::pipeline::orchestrator::{Orchestrator, OrchestratorParts, SessionReport};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::config::{ConfigError, TrackerConfig};
use crate::tracking::domain::face_matcher::FaceMatcher;
use crate::tracking::domain::track_overlay::TrackOverlay;
use crate::tracking::infrastructure::match_worker::MatchWorker;
use crate::video::domain::frame_source::{FrameSource, VideoError};
use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;

#[derive(Error, Debug)]
pub enum StartError {
    #[error("cannot start: {0} is missing")]
    MissingPrerequisite(&'static str),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to load model: {0}")]
    ModelLoad(#[from] ModelLoadError),
    #[error(transparent)]
    Video(#[from] VideoError),
}

/// An opened frame source plus its expected length (0 when unknown).
pub struct OpenedSource {
    pub source: Box<dyn FrameSource>,
    pub total_frames: usize,
}

pub type SourceOpener = Box<dyn Fn(&Path) -> Result<OpenedSource, VideoError> + Send + Sync>;

/// What the user picked before pressing start.
#[derive(Default)]
pub struct SessionRequest {
    pub reference: Option<ReferenceEmbedding>,
    pub video: Option<PathBuf>,
    pub display: Option<Box<dyn DisplaySink>>,
    pub recorder: Option<Box<dyn FrameRecorder>>,
}

/// Starts and runs a tracking session.
///
/// Prerequisites are checked before anything is constructed. Models come
/// from the shared registry, so a detector warmed up by reference loading is
/// reused here.
pub struct TrackFaceUseCase {
    models: Arc<ModelRegistry>,
    config: TrackerConfig,
    open_source: SourceOpener,
}

impl TrackFaceUseCase {
    pub fn new(models: Arc<ModelRegistry>, config: TrackerConfig, open_source: SourceOpener) -> Self {
        Self {
            models,
            config,
            open_source,
        }
    }

    /// Reads video files through ffmpeg.
    pub fn with_ffmpeg(models: Arc<ModelRegistry>, config: TrackerConfig) -> Self {
        Self::new(
            models,
            config,
            Box::new(|path: &Path| {
                let reader = FfmpegReader::open(path)?;
                let metadata = reader.metadata();
                if let Some(period) = metadata.frame_period() {
                    log::info!(
                        "Opened {} ({}x{}, {:.2} fps, one frame every {period:?})",
                        path.display(),
                        metadata.width,
                        metadata.height,
                        metadata.fps
                    );
                }
                let total_frames = metadata.total_frames;
                Ok(OpenedSource {
                    source: Box::new(reader),
                    total_frames,
                })
            }),
        )
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Builds a ready-to-tick orchestrator with its match worker running.
    pub fn start(
        &self,
        request: SessionRequest,
        logger: Box<dyn PipelineLogger>,
    ) -> Result<Orchestrator, StartError> {
        let reference = request
            .reference
            .ok_or(StartError::MissingPrerequisite("reference face"))?;
        let video = request
            .video
            .ok_or(StartError::MissingPrerequisite("video path"))?;
        let display = request
            .display
            .ok_or(StartError::MissingPrerequisite("display sink"))?;
        self.config.validate()?;

        let detector = self.models.detector()?;
        let embedder = self.models.embedder()?;
        let opened = (self.open_source)(&video)?;

        let config = &self.config;
        let detector = Arc::new(DeadlineDetector::new(detector, config.detect_timeout));
        let sampler = DetectionSampler::new(detector, config.detect_interval, config.target_class)
            .map_err(|_| ConfigError::ZeroInterval("detect interval"))?;
        let throttle = DisplayThrottle::new(display, config.display_interval)
            .map_err(|_| ConfigError::ZeroInterval("display interval"))?;
        let matcher = FaceMatcher::new(embedder, reference, config.distance_threshold);

        log::info!(
            "Tracking {} (detect every {} frames, display every {}, threshold {}, on miss: {})",
            video.display(),
            config.detect_interval,
            config.display_interval,
            config.distance_threshold,
            config.no_match_policy
        );

        Ok(Orchestrator::new(OrchestratorParts {
            source: opened.source,
            sampler,
            worker: MatchWorker::spawn(matcher, config.idle_wait),
            overlay: TrackOverlay::new(config.no_match_policy),
            throttle,
            recorder: request.recorder,
            logger,
            total_frames: opened.total_frames,
        }))
    }

    /// Starts a session and ticks it on `ticker` until the video ends or the
    /// ticker is cancelled.
    pub fn execute(
        &self,
        request: SessionRequest,
        logger: Box<dyn PipelineLogger>,
        ticker: &PeriodicTicker,
    ) -> Result<SessionReport, StartError> {
        let mut orchestrator = self.start(request, logger)?;
        Ok(orchestrator.run(ticker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::face_embedder::FaceEmbedder;
    use crate::detection::domain::object_detector::ObjectDetector;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::shared::bounding_box::BoundingBox;
    use crate::test_support::{reference, RecordingSink, ScriptedDetector, ScriptedEmbedder, VecFrameSource};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn registry(detector: ScriptedDetector, embedder: ScriptedEmbedder) -> Arc<ModelRegistry> {
        let detector: Arc<dyn ObjectDetector> = Arc::new(detector);
        let embedder: Arc<dyn FaceEmbedder> = Arc::new(embedder);
        ModelRegistry::new(
            Box::new(move || Ok(Arc::clone(&detector))),
            Box::new(move || Ok(Arc::clone(&embedder))),
        )
    }

    fn counting_opener(frames: u64, opened: Arc<AtomicUsize>) -> SourceOpener {
        Box::new(move |_: &Path| {
            opened.fetch_add(1, Ordering::SeqCst);
            Ok(OpenedSource {
                source: Box::new(VecFrameSource::new(frames, 64, 48)),
                total_frames: frames as usize,
            })
        })
    }

    fn fast_config() -> TrackerConfig {
        TrackerConfig {
            tick_period: Duration::from_millis(1),
            ..TrackerConfig::default()
        }
    }

    fn request() -> SessionRequest {
        SessionRequest {
            reference: Some(reference()),
            video: Some(PathBuf::from("clip.mp4")),
            display: Some(Box::new(RecordingSink::default())),
            recorder: None,
        }
    }

    #[test]
    fn test_missing_reference_constructs_nothing() {
        let models = registry(ScriptedDetector::default(), ScriptedEmbedder::default());
        let opened = Arc::new(AtomicUsize::new(0));
        let use_case = TrackFaceUseCase::new(
            Arc::clone(&models),
            fast_config(),
            counting_opener(10, Arc::clone(&opened)),
        );

        let result = use_case.start(
            SessionRequest {
                reference: None,
                ..request()
            },
            Box::new(NullPipelineLogger),
        );

        assert!(matches!(result, Err(StartError::MissingPrerequisite("reference face"))));
        assert!(!models.is_detector_loaded());
        assert!(!models.is_embedder_loaded());
        assert_eq!(opened.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_video_is_rejected() {
        let use_case = TrackFaceUseCase::new(
            registry(ScriptedDetector::default(), ScriptedEmbedder::default()),
            fast_config(),
            counting_opener(10, Arc::new(AtomicUsize::new(0))),
        );
        let result = use_case.start(
            SessionRequest {
                video: None,
                ..request()
            },
            Box::new(NullPipelineLogger),
        );
        assert!(matches!(result, Err(StartError::MissingPrerequisite("video path"))));
    }

    #[test]
    fn test_model_load_failure_opens_no_source() {
        let opened = Arc::new(AtomicUsize::new(0));
        let models = ModelRegistry::new(
            Box::new(|| {
                Err(ModelLoadError::Session {
                    path: "yolo.onnx".into(),
                    message: "corrupt".into(),
                })
            }),
            Box::new(|| Ok(Arc::new(ScriptedEmbedder::default()) as Arc<dyn FaceEmbedder>)),
        );
        let use_case = TrackFaceUseCase::new(
            Arc::clone(&models),
            fast_config(),
            counting_opener(10, Arc::clone(&opened)),
        );

        let result = use_case.start(request(), Box::new(NullPipelineLogger));

        assert!(matches!(result, Err(StartError::ModelLoad(_))));
        assert!(!models.is_detector_loaded());
        assert_eq!(opened.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let use_case = TrackFaceUseCase::new(
            registry(ScriptedDetector::default(), ScriptedEmbedder::default()),
            TrackerConfig {
                detect_interval: 0,
                ..fast_config()
            },
            counting_opener(10, Arc::new(AtomicUsize::new(0))),
        );
        let result = use_case.start(request(), Box::new(NullPipelineLogger));
        assert!(matches!(
            result,
            Err(StartError::Config(ConfigError::ZeroInterval("detect interval")))
        ));
    }

    #[test]
    fn test_unopenable_video_is_reported() {
        let use_case = TrackFaceUseCase::with_ffmpeg(
            registry(ScriptedDetector::default(), ScriptedEmbedder::default()),
            fast_config(),
        );
        let result = use_case.start(
            SessionRequest {
                video: Some(PathBuf::from("/nonexistent/clip.mp4")),
                ..request()
            },
            Box::new(NullPipelineLogger),
        );
        assert!(matches!(result, Err(StartError::Video(_))));
    }

    #[test]
    fn test_execute_runs_session_to_end_of_stream() {
        let face = BoundingBox::new(4, 4, 24, 24, 5);
        let detector = ScriptedDetector::default().with_boxes(5, vec![face]);
        let embedder = ScriptedEmbedder::default().with_distance(4, 0.1);
        let recorder = RecordingSink::default();
        let recorded = recorder.recorded();
        let use_case = TrackFaceUseCase::new(
            registry(detector, embedder),
            fast_config(),
            counting_opener(12, Arc::new(AtomicUsize::new(0))),
        );
        let ticker = PeriodicTicker::new(use_case.config().tick_period);

        let report = use_case
            .execute(
                SessionRequest {
                    recorder: Some(Box::new(recorder)),
                    ..request()
                },
                Box::new(NullPipelineLogger),
                &ticker,
            )
            .unwrap();

        assert_eq!(report.frames_read, 12);
        assert_eq!(report.detections_run, 2);
        assert_eq!(report.frames_displayed, 6);
        assert_eq!(recorded.lock().unwrap().len(), 12);
    }
}
