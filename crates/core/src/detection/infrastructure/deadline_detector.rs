use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::detection::domain::object_detector::{DetectionError, ObjectDetector};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Decorator that bounds how long a caller waits for the inner detector.
///
/// Calls run on a dedicated thread. If the answer misses the deadline the
/// caller gets [`DetectionError::Timeout`]; until that overrunning call
/// finishes, further calls fail fast with [`DetectionError::Busy`] instead of
/// queueing behind it.
pub struct DeadlineDetector {
    deadline: Duration,
    link: Mutex<Link>,
}

struct Link {
    requests: Sender<Request>,
    responses: Receiver<Response>,
    next_ticket: u64,
    outstanding: Option<u64>,
}

struct Request {
    ticket: u64,
    frame: Frame,
    target_class: usize,
}

struct Response {
    ticket: u64,
    result: Result<Vec<BoundingBox>, DetectionError>,
}

impl DeadlineDetector {
    pub fn new(inner: Arc<dyn ObjectDetector>, deadline: Duration) -> Self {
        let (request_tx, request_rx) = crossbeam_channel::bounded::<Request>(1);
        let (response_tx, response_rx) = crossbeam_channel::bounded::<Response>(1);

        thread::spawn(move || {
            for request in request_rx {
                let result = inner.detect(&request.frame, request.target_class);
                let response = Response {
                    ticket: request.ticket,
                    result,
                };
                if response_tx.send(response).is_err() {
                    break;
                }
            }
        });

        Self {
            deadline,
            link: Mutex::new(Link {
                requests: request_tx,
                responses: response_rx,
                next_ticket: 0,
                outstanding: None,
            }),
        }
    }
}

impl ObjectDetector for DeadlineDetector {
    fn detect(&self, frame: &Frame, target_class: usize) -> Result<Vec<BoundingBox>, DetectionError> {
        let mut link = self
            .link
            .lock()
            .map_err(|_| DetectionError::Disconnected)?;

        if let Some(stale) = link.outstanding {
            match link.responses.try_recv() {
                Ok(late) if late.ticket == stale => {
                    log::debug!("Discarding late detection result #{stale}");
                    link.outstanding = None;
                }
                Ok(_) => {}
                Err(TryRecvError::Empty) => return Err(DetectionError::Busy),
                Err(TryRecvError::Disconnected) => return Err(DetectionError::Disconnected),
            }
        }

        let ticket = link.next_ticket;
        link.next_ticket += 1;
        link.requests
            .send(Request {
                ticket,
                frame: frame.clone(),
                target_class,
            })
            .map_err(|_| DetectionError::Disconnected)?;
        link.outstanding = Some(ticket);

        match link.responses.recv_timeout(self.deadline) {
            Ok(response) => {
                link.outstanding = None;
                debug_assert_eq!(response.ticket, ticket);
                response.result
            }
            Err(RecvTimeoutError::Timeout) => Err(DetectionError::Timeout(self.deadline)),
            Err(RecvTimeoutError::Disconnected) => {
                link.outstanding = None;
                Err(DetectionError::Disconnected)
            }
        }
    }
}
