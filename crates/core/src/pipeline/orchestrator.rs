use std::time::Instant;

use crate::detection::domain::detection_sampler::DetectionSampler;
use crate::display::domain::display_sink::FrameRecorder;
use crate::display::domain::display_throttle::DisplayThrottle;
use crate::pipeline::infrastructure::periodic_ticker::PeriodicTicker;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::bounding_box::BoundingBox;
use crate::tracking::domain::match_job::{MatchJob, MatchResult};
use crate::tracking::domain::track_overlay::TrackOverlay;
use crate::tracking::infrastructure::match_worker::MatchWorker;
use crate::video::domain::frame_source::FrameSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    Finished,
}

/// Counters for one tracking session.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SessionReport {
    pub frames_read: u64,
    pub detections_run: u64,
    pub jobs_submitted: u64,
    pub jobs_overwritten: u64,
    pub results_applied: u64,
    pub frames_displayed: u64,
    /// Box held by the overlay when the session ended.
    pub final_track: Option<BoundingBox>,
}

/// Components the orchestrator drives.
pub struct OrchestratorParts {
    pub source: Box<dyn FrameSource>,
    pub sampler: DetectionSampler,
    pub worker: MatchWorker,
    pub overlay: TrackOverlay,
    pub throttle: DisplayThrottle,
    pub recorder: Option<Box<dyn FrameRecorder>>,
    pub logger: Box<dyn PipelineLogger>,
    /// Expected frame count for progress reporting; 0 when unknown.
    pub total_frames: usize,
}

/// Tick-driven loop tying the frame source to detection, matching, overlay
/// and display.
///
/// Each tick reads one frame. Capture never waits on matching: jobs go to
/// the worker's single-slot inbox and results are picked up on whichever
/// tick finds them ready.
pub struct Orchestrator {
    source: Option<Box<dyn FrameSource>>,
    sampler: DetectionSampler,
    worker: MatchWorker,
    overlay: TrackOverlay,
    throttle: DisplayThrottle,
    recorder: Option<Box<dyn FrameRecorder>>,
    logger: Box<dyn PipelineLogger>,
    total_frames: usize,
    frame_count: u64,
    report: SessionReport,
    stopped: bool,
}

impl Orchestrator {
    pub fn new(parts: OrchestratorParts) -> Self {
        Self {
            source: Some(parts.source),
            sampler: parts.sampler,
            worker: parts.worker,
            overlay: parts.overlay,
            throttle: parts.throttle,
            recorder: parts.recorder,
            logger: parts.logger,
            total_frames: parts.total_frames,
            frame_count: 0,
            report: SessionReport::default(),
            stopped: false,
        }
    }

    /// Runs one pipeline step. Returns `Finished` once the source is
    /// exhausted or the session has been stopped.
    pub fn tick(&mut self) -> TickOutcome {
        if self.stopped {
            return TickOutcome::Finished;
        }
        let Some(source) = self.source.as_mut() else {
            return TickOutcome::Finished;
        };

        let mut frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::info!("End of stream after {} frames", self.frame_count);
                self.stop();
                return TickOutcome::Finished;
            }
            Err(e) => {
                log::warn!("Frame read failed after {} frames: {e}", self.frame_count);
                self.stop();
                return TickOutcome::Finished;
            }
        };
        self.frame_count += 1;
        self.report.frames_read += 1;
        self.logger.progress(self.frame_count, self.total_frames);

        let detect_start = Instant::now();
        if let Some(candidates) = self.sampler.sample(self.frame_count, &frame) {
            self.logger
                .timing("detect", detect_start.elapsed().as_secs_f64() * 1000.0);
            self.logger.metric("candidates", candidates.len() as f64);
            self.report.detections_run += 1;
            self.report.jobs_submitted += 1;
            if self.worker.submit(MatchJob::new(frame.clone(), candidates)) {
                self.report.jobs_overwritten += 1;
                self.logger.metric("jobs_overwritten", 1.0);
            }
        }

        if let Some(result) = self.worker.try_result() {
            self.apply_result(result);
        }
        self.overlay.draw(&mut frame);

        if let Some(recorder) = self.recorder.as_mut() {
            if let Err(e) = recorder.record(&frame) {
                log::warn!("Recording disabled: {e}");
                self.recorder = None;
            }
        }

        match self
            .throttle
            .offer(self.frame_count, &frame, self.overlay.current())
        {
            Ok(true) => self.report.frames_displayed += 1,
            Ok(false) => {}
            Err(e) => log::warn!("Display of frame {} failed: {e}", frame.sequence()),
        }

        TickOutcome::Continue
    }

    /// Ticks on every `ticker` period until the stream ends or the ticker is
    /// cancelled, then stops the session.
    pub fn run(&mut self, ticker: &PeriodicTicker) -> SessionReport {
        while ticker.wait_tick() {
            if self.tick() == TickOutcome::Finished {
                break;
            }
        }
        ticker.cancel();
        self.stop();
        self.report()
    }

    /// Stops the worker, applies its last result and releases the source and
    /// recorder. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        self.worker.stop();
        if let Some(result) = self.worker.try_result() {
            self.apply_result(result);
        }

        if let Some(mut source) = self.source.take() {
            source.close();
        }
        if let Some(mut recorder) = self.recorder.take() {
            if let Err(e) = recorder.finish() {
                log::warn!("Failed to finish recording: {e}");
            }
        }

        self.logger.info(&format!(
            "Session stopped after {} frames ({} jobs, {} overwritten)",
            self.report.frames_read, self.report.jobs_submitted, self.report.jobs_overwritten
        ));
        self.logger.summary();
    }

    fn apply_result(&mut self, result: MatchResult) {
        self.overlay.apply(result);
        self.report.results_applied += 1;
        self.logger.metric("results_applied", 1.0);
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn overlay(&self) -> &TrackOverlay {
        &self.overlay
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            final_track: self.overlay.current(),
            ..self.report
        }
    }

    /// Waits up to `timeout` for the worker to publish a result.
    pub fn wait_for_result(&self, timeout: std::time::Duration) -> bool {
        self.worker.wait_for_result(timeout)
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.stop();
    }
}
