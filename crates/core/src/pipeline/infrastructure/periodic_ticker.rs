use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{select, Receiver, Sender};

/// Fixed-period tick source that can be cancelled from any thread.
pub struct PeriodicTicker {
    ticks: Receiver<Instant>,
    cancel_rx: Receiver<()>,
    cancel: CancelHandle,
}

/// Cloneable handle that stops a [`PeriodicTicker`].
#[derive(Clone)]
pub struct CancelHandle {
    tx: Sender<()>,
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::AcqRel) {
            let _ = self.tx.try_send(());
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl PeriodicTicker {
    pub fn new(period: Duration) -> Self {
        let (tx, cancel_rx) = crossbeam_channel::bounded(1);
        Self {
            ticks: crossbeam_channel::tick(period),
            cancel_rx,
            cancel: CancelHandle {
                tx,
                cancelled: Arc::new(AtomicBool::new(false)),
            },
        }
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Blocks until the next tick. Returns `false` once cancelled.
    pub fn wait_tick(&self) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        select! {
            recv(self.ticks) -> tick => tick.is_ok() && !self.cancel.is_cancelled(),
            recv(self.cancel_rx) -> _ => false,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_ticks_at_period() {
        let ticker = PeriodicTicker::new(Duration::from_millis(10));
        let start = Instant::now();
        for _ in 0..3 {
            assert!(ticker.wait_tick());
        }
        assert!(start.elapsed() >= Duration::from_millis(25));
    }

    #[test]
    fn test_cancel_from_other_thread_unblocks_waiter() {
        let ticker = PeriodicTicker::new(Duration::from_secs(60));
        let handle = ticker.cancel_handle();
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.cancel();
        });

        let start = Instant::now();
        assert!(!ticker.wait_tick());
        assert!(start.elapsed() < Duration::from_secs(5));
        canceller.join().unwrap();
    }

    #[test]
    fn test_stays_cancelled() {
        let ticker = PeriodicTicker::new(Duration::from_millis(1));
        ticker.cancel();
        ticker.cancel();
        assert!(!ticker.wait_tick());
        assert!(!ticker.wait_tick());
        assert!(ticker.cancel_handle().is_cancelled());
    }
}
