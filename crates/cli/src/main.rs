use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use face_lock_core::detection::infrastructure::model_registry::{ModelRegistry, OnnxModelPaths};
use face_lock_core::detection::infrastructure::onnx_yolo_detector::DEFAULT_CONFIDENCE;
use face_lock_core::display::domain::display_sink::{DisplaySink, FrameRecorder};
use face_lock_core::display::infrastructure::image_sequence_recorder::ImageSequenceRecorder;
use face_lock_core::display::infrastructure::log_display_sink::LogDisplaySink;
use face_lock_core::display::infrastructure::preview_file_sink::PreviewFileSink;
use face_lock_core::pipeline::infrastructure::periodic_ticker::PeriodicTicker;
use face_lock_core::pipeline::load_reference_use_case::LoadReferenceUseCase;
use face_lock_core::pipeline::pipeline_logger::LogPipelineLogger;
use face_lock_core::pipeline::track_face_use_case::{SessionRequest, StartError, TrackFaceUseCase};
use face_lock_core::shared::config::TrackerConfig;
use face_lock_core::shared::constants::{
    DEFAULT_DETECT_INTERVAL, DEFAULT_DETECT_TIMEOUT_MS, DEFAULT_DISPLAY_INTERVAL,
    DEFAULT_DISTANCE_THRESHOLD, DEFAULT_IDLE_WAIT_MS, DEFAULT_TARGET_CLASS, DEFAULT_TICK_MS,
    DETECTOR_MODEL_CLASSES, DETECTOR_MODEL_NAME, DETECTOR_MODEL_URL, EMBEDDING_MODEL_NAME,
    EMBEDDING_MODEL_URL,
};
use face_lock_core::shared::model_resolver::{self, ModelSource};
use face_lock_core::tracking::domain::track_overlay::NoMatchPolicy;

/// Track one person's face through a video.
#[derive(Parser)]
#[command(name = "face-lock")]
struct Cli {
    /// Photo of the face to lock on to.
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Video to track the face in.
    #[arg(long)]
    video: Option<PathBuf>,

    /// YOLO ONNX model proposing candidate regions (face model downloaded
    /// to the user cache if omitted).
    #[arg(long)]
    detector_model: Option<PathBuf>,

    /// ArcFace ONNX model (downloaded to the user cache if omitted).
    #[arg(long)]
    embedding_model: Option<PathBuf>,

    /// Save every overlay-drawn frame as PNG into this directory.
    #[arg(long)]
    save_frames: Option<PathBuf>,

    /// Keep this image file updated with the latest displayed frame.
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Run detection every Nth frame.
    #[arg(long, default_value_t = DEFAULT_DETECT_INTERVAL)]
    detect_interval: u64,

    /// Display every Nth frame.
    #[arg(long, default_value_t = DEFAULT_DISPLAY_INTERVAL)]
    display_interval: u64,

    /// Pipeline tick period in milliseconds.
    #[arg(long, default_value_t = DEFAULT_TICK_MS)]
    tick_ms: u64,

    /// Maximum embedding distance that counts as the reference face.
    #[arg(long, default_value_t = DEFAULT_DISTANCE_THRESHOLD)]
    threshold: f32,

    /// Detector class index to keep.
    #[arg(long, default_value_t = DEFAULT_TARGET_CLASS)]
    target_class: usize,

    /// Number of classes the detector outputs (defaults to all score columns
    /// for a custom model, 1 for the bundled face model).
    #[arg(long)]
    num_classes: Option<usize>,

    /// Detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f32,

    /// What to draw after a detection without a match: clear or retain.
    #[arg(long, default_value = "clear")]
    no_match: String,

    /// Give up on a detection call after this many milliseconds.
    #[arg(long, default_value_t = DEFAULT_DETECT_TIMEOUT_MS)]
    detect_timeout_ms: u64,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    check_prerequisites(&cli)?;
    validate(&cli)?;
    let config = build_config(&cli)?;

    let models = build_models(&cli)?;
    let reference = match &cli.reference {
        Some(path) => Some(LoadReferenceUseCase::new(Arc::clone(&models), cli.target_class).execute(path)?),
        None => None,
    };

    let display: Box<dyn DisplaySink> = match &cli.preview {
        Some(path) => Box::new(PreviewFileSink::new(path)?),
        None => Box::new(LogDisplaySink::new()),
    };
    let recorder = match &cli.save_frames {
        Some(dir) => Some(Box::new(ImageSequenceRecorder::new(dir)?) as Box<dyn FrameRecorder>),
        None => None,
    };

    let ticker = PeriodicTicker::new(config.tick_period);
    let cancel = ticker.cancel_handle();
    ctrlc::set_handler(move || {
        log::info!("Interrupted, stopping session");
        cancel.cancel();
    })?;

    let use_case = TrackFaceUseCase::with_ffmpeg(models, config);
    let report = use_case.execute(
        SessionRequest {
            reference,
            video: cli.video,
            display: Some(display),
            recorder,
        },
        Box::new(LogPipelineLogger::default()),
        &ticker,
    )?;

    log::info!(
        "Done: {} frames, {} detections, {} jobs ({} overwritten), {} results, {} displayed",
        report.frames_read,
        report.detections_run,
        report.jobs_submitted,
        report.jobs_overwritten,
        report.results_applied,
        report.frames_displayed
    );
    match report.final_track {
        Some(b) => log::info!("Final lock: ({}, {})-({}, {})", b.x1, b.y1, b.x2, b.y2),
        None => log::info!("Final lock: none"),
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<TrackerConfig, Box<dyn std::error::Error>> {
    let config = TrackerConfig {
        detect_interval: cli.detect_interval,
        display_interval: cli.display_interval,
        tick_period: Duration::from_millis(cli.tick_ms),
        idle_wait: Duration::from_millis(DEFAULT_IDLE_WAIT_MS),
        detect_timeout: Duration::from_millis(cli.detect_timeout_ms),
        distance_threshold: cli.threshold,
        target_class: cli.target_class,
        no_match_policy: cli.no_match.parse::<NoMatchPolicy>()?,
    };
    config.validate()?;
    Ok(config)
}

fn build_models(cli: &Cli) -> Result<Arc<ModelRegistry>, Box<dyn std::error::Error>> {
    let cache_dir = model_resolver::default_cache_dir()?;

    log::info!("Resolving model: {DETECTOR_MODEL_NAME}");
    let detector = model_resolver::resolve(
        cli.detector_model.as_deref(),
        &ModelSource {
            name: DETECTOR_MODEL_NAME,
            url: DETECTOR_MODEL_URL,
        },
        &cache_dir,
        Some(Box::new(|done, total| download_progress("face detection", done, total))),
    )?;
    let num_classes = match (&cli.detector_model, cli.num_classes) {
        (_, Some(n)) => Some(n),
        (None, None) => Some(DETECTOR_MODEL_CLASSES),
        (Some(_), None) => None,
    };

    log::info!("Resolving model: {EMBEDDING_MODEL_NAME}");
    let embedder = model_resolver::resolve(
        cli.embedding_model.as_deref(),
        &ModelSource {
            name: EMBEDDING_MODEL_NAME,
            url: EMBEDDING_MODEL_URL,
        },
        &cache_dir,
        Some(Box::new(|done, total| download_progress("face embedding", done, total))),
    )?;

    Ok(ModelRegistry::onnx(OnnxModelPaths {
        detector,
        embedder,
        confidence: cli.confidence,
        num_classes,
    }))
}

/// Rejects a session missing its reference photo or video before any model
/// is resolved or loaded.
fn check_prerequisites(cli: &Cli) -> Result<(), StartError> {
    if cli.reference.is_none() {
        return Err(StartError::MissingPrerequisite("reference face"));
    }
    if cli.video.is_none() {
        return Err(StartError::MissingPrerequisite("video path"));
    }
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(video) = &cli.video {
        if !video.exists() {
            return Err(format!("Video file not found: {}", video.display()).into());
        }
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if let Some(n) = cli.num_classes {
        if cli.target_class >= n {
            return Err(format!(
                "Target class {} is out of range for {n} classes",
                cli.target_class
            )
            .into());
        }
    }
    Ok(())
}

fn download_progress(model: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {model} model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading {model} model... {downloaded} bytes");
    }
}
