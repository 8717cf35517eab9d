use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::tracking::domain::face_matcher::FaceMatcher;
use crate::tracking::domain::latest_slot::LatestSlot;
use crate::tracking::domain::match_job::{MatchJob, MatchResult};

/// Background thread that scores the most recent job against the reference.
///
/// Jobs arrive through a single-slot inbox and results leave through a
/// single-slot outbox; both keep only the latest value. A job that is
/// overwritten before the worker takes it is never evaluated.
pub struct MatchWorker {
    inbox: Arc<LatestSlot<MatchJob>>,
    outbox: Arc<LatestSlot<MatchResult>>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MatchWorker {
    /// Starts the worker thread. `idle_wait` bounds how long it sleeps on an
    /// empty inbox before re-checking the stop flag.
    pub fn spawn(matcher: FaceMatcher, idle_wait: Duration) -> Self {
        let inbox = Arc::new(LatestSlot::new());
        let outbox = Arc::new(LatestSlot::new());
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let inbox = Arc::clone(&inbox);
            let outbox = Arc::clone(&outbox);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || run(&matcher, &inbox, &outbox, &stop, idle_wait))
        };

        Self {
            inbox,
            outbox,
            stop,
            handle: Some(handle),
        }
    }

    /// Places `job` in the inbox. Returns `true` when it displaced a job the
    /// worker had not started yet.
    pub fn submit(&self, job: MatchJob) -> bool {
        match self.inbox.submit(job) {
            Some(stale) => {
                log::debug!("Match job for frame {} overwritten", stale.frame_sequence());
                true
            }
            None => false,
        }
    }

    /// Takes the latest unconsumed result, if any.
    pub fn try_result(&self) -> Option<MatchResult> {
        self.outbox.take()
    }

    /// Waits up to `timeout` for a result to be available, without taking it.
    pub fn wait_for_result(&self, timeout: Duration) -> bool {
        self.outbox.wait_filled(timeout)
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signals the thread and joins it. A job already being evaluated runs to
    /// completion; a queued one is abandoned. Calling again is a no-op.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        self.stop.store(true, Ordering::Release);
        self.inbox.wake_all();
        if handle.join().is_err() {
            log::error!("Match worker panicked");
        }
        if let Some(abandoned) = self.inbox.take() {
            log::debug!("Dropped unstarted match job for frame {}", abandoned.frame_sequence());
        }
    }
}

impl Drop for MatchWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    matcher: &FaceMatcher,
    inbox: &LatestSlot<MatchJob>,
    outbox: &LatestSlot<MatchResult>,
    stop: &AtomicBool,
    idle_wait: Duration,
) {
    log::debug!("Match worker started");
    while !stop.load(Ordering::Acquire) {
        let Some(job) = inbox.take_timeout(idle_wait) else {
            continue;
        };
        if stop.load(Ordering::Acquire) {
            break;
        }
        let result = matcher.evaluate(&job);
        if let Some(unread) = outbox.submit(result) {
            log::debug!("Unread match result for frame {} replaced", unread.frame_sequence);
        }
    }
    log::debug!("Match worker stopped");
}
