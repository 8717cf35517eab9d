use std::sync::Arc;

use crate::detection::domain::object_detector::ObjectDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Runs the detector on every `interval`-th frame for a single class.
///
/// Detection is best effort: a failed call yields an empty candidate set for
/// that frame and never stops the pipeline.
pub struct DetectionSampler {
    detector: Arc<dyn ObjectDetector>,
    interval: u64,
    target_class: usize,
}

impl DetectionSampler {
    pub fn new(
        detector: Arc<dyn ObjectDetector>,
        interval: u64,
        target_class: usize,
    ) -> Result<Self, &'static str> {
        if interval < 1 {
            return Err("detect interval must be >= 1");
        }
        Ok(Self {
            detector,
            interval,
            target_class,
        })
    }

    /// `frame_count` is 1-based: the first frame read is frame 1.
    pub fn is_due(&self, frame_count: u64) -> bool {
        frame_count > 0 && frame_count % self.interval == 0
    }

    /// Returns `None` off cadence, otherwise the candidates for `frame`.
    pub fn sample(&self, frame_count: u64, frame: &Frame) -> Option<Vec<BoundingBox>> {
        if !self.is_due(frame_count) {
            return None;
        }
        match self.detector.detect(frame, self.target_class) {
            Ok(boxes) => Some(boxes),
            Err(e) => {
                log::warn!("Detection on frame {} failed: {e}", frame.sequence());
                Some(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::object_detector::DetectionError;
    use crate::test_support::ScriptedDetector;
    use rstest::rstest;

    fn sampler(detector: ScriptedDetector, interval: u64) -> DetectionSampler {
        DetectionSampler::new(Arc::new(detector), interval, 0).unwrap()
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let result = DetectionSampler::new(Arc::new(ScriptedDetector::default()), 0, 0);
        assert!(result.is_err());
    }

    #[rstest]
    #[case(5, vec![5, 10, 15])]
    #[case(1, (1..=16).collect())]
    #[case(7, vec![7, 14])]
    fn test_sampling_happens_exactly_on_cadence(#[case] interval: u64, #[case] expected: Vec<u64>) {
        let detector = ScriptedDetector::default();
        let calls = detector.calls();
        let sampler = sampler(detector, interval);

        for count in 1..=16u64 {
            let frame = Frame::blank(8, 8, count);
            let sampled = sampler.sample(count, &frame);
            assert_eq!(sampled.is_some(), expected.contains(&count), "frame {count}");
        }

        assert_eq!(*calls.lock().unwrap(), expected);
    }

    #[test]
    fn test_frame_zero_is_never_due() {
        let sampler = sampler(ScriptedDetector::default(), 5);
        assert!(!sampler.is_due(0));
    }

    #[test]
    fn test_boxes_are_returned_in_detector_order() {
        let boxes = vec![
            BoundingBox::new(50, 0, 60, 10, 5),
            BoundingBox::new(0, 0, 10, 10, 5),
        ];
        let detector = ScriptedDetector::default().with_boxes(5, boxes.clone());
        let sampler = sampler(detector, 5);

        let sampled = sampler.sample(5, &Frame::blank(8, 8, 5)).unwrap();
        assert_eq!(sampled, boxes);
    }

    #[test]
    fn test_detector_failure_becomes_empty_candidates() {
        let detector = ScriptedDetector::default()
            .with_failure(5, DetectionError::Inference("boom".into()));
        let sampler = sampler(detector, 5);

        let sampled = sampler.sample(5, &Frame::blank(8, 8, 5));
        assert_eq!(sampled, Some(Vec::new()));
    }

    #[test]
    fn test_target_class_is_forwarded() {
        let detector = ScriptedDetector::default();
        let classes = detector.classes();
        let sampler = DetectionSampler::new(Arc::new(detector), 1, 3).unwrap();

        sampler.sample(1, &Frame::blank(8, 8, 1));
        assert_eq!(*classes.lock().unwrap(), vec![3]);
    }
}
