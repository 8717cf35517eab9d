use std::sync::Arc;

use crate::detection::domain::embedding::ReferenceEmbedding;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::tracking::domain::match_job::{MatchJob, MatchResult};

/// First-match scan of a job's candidates against the reference face.
///
/// Candidates are embedded in detector order. The first one whose Euclidean
/// distance is strictly below the threshold wins and the rest are never
/// embedded. Candidates whose embedding fails, or whose dimension differs
/// from the reference, are skipped.
pub struct FaceMatcher {
    embedder: Arc<dyn FaceEmbedder>,
    reference: ReferenceEmbedding,
    threshold: f32,
}

impl FaceMatcher {
    pub fn new(embedder: Arc<dyn FaceEmbedder>, reference: ReferenceEmbedding, threshold: f32) -> Self {
        Self {
            embedder,
            reference,
            threshold,
        }
    }

    pub fn evaluate(&self, job: &MatchJob) -> MatchResult {
        for candidate in job.candidates() {
            let embedding = match self.embedder.embed(job.frame(), candidate) {
                Ok(embedding) => embedding,
                Err(e) => {
                    log::debug!("Skipping candidate {candidate:?}: {e}");
                    continue;
                }
            };
            let Some(distance) = self.reference.distance_to(&embedding) else {
                log::debug!(
                    "Skipping candidate {candidate:?}: embedding has {} dims, reference has {}",
                    embedding.len(),
                    self.reference.embedding().len()
                );
                continue;
            };
            if distance < self.threshold {
                return MatchResult {
                    frame_sequence: job.frame_sequence(),
                    matched: Some(*candidate),
                    distance: Some(distance),
                };
            }
        }
        MatchResult::no_match(job.frame_sequence())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::frame::Frame;
    use crate::test_support::{reference, ScriptedEmbedder};
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn candidate(x1: i32, sequence: u64) -> BoundingBox {
        BoundingBox::new(x1, 0, x1 + 10, 10, sequence)
    }

    fn job(sequence: u64, xs: &[i32]) -> MatchJob {
        let candidates = xs.iter().map(|&x| candidate(x, sequence)).collect();
        MatchJob::new(Frame::blank(64, 16, sequence), candidates)
    }

    #[test]
    fn test_first_qualifying_candidate_wins_and_rest_are_not_embedded() {
        let embedder = ScriptedEmbedder::default()
            .with_distance(0, 0.9)
            .with_distance(20, 0.2)
            .with_distance(40, 0.05);
        let calls = embedder.calls();
        let matcher = FaceMatcher::new(Arc::new(embedder), reference(), 0.45);

        let result = matcher.evaluate(&job(5, &[0, 20, 40]));

        assert_eq!(result.matched, Some(candidate(20, 5)));
        assert_eq!(result.frame_sequence, 5);
        assert_relative_eq!(result.distance.unwrap(), 0.2, epsilon = 1e-6);
        let embedded: Vec<i32> = calls.lock().unwrap().iter().map(|b| b.x1).collect();
        assert_eq!(embedded, vec![0, 20]);
    }

    #[rstest]
    #[case(0.44, true)]
    #[case(0.45, false)]
    #[case(0.46, false)]
    fn test_threshold_is_strict(#[case] distance: f32, #[case] expect_match: bool) {
        let embedder = ScriptedEmbedder::default().with_distance(0, distance);
        let matcher = FaceMatcher::new(Arc::new(embedder), reference(), 0.45);

        assert_eq!(matcher.evaluate(&job(1, &[0])).is_match(), expect_match);
    }

    #[test]
    fn test_empty_candidates_yield_no_match() {
        let matcher = FaceMatcher::new(Arc::new(ScriptedEmbedder::default()), reference(), 0.45);
        let result = matcher.evaluate(&job(10, &[]));
        assert_eq!(result, MatchResult::no_match(10));
    }

    #[test]
    fn test_embedding_failure_skips_only_that_candidate() {
        let embedder = ScriptedEmbedder::default()
            .with_failure(0)
            .with_distance(20, 0.1);
        let calls = embedder.calls();
        let matcher = FaceMatcher::new(Arc::new(embedder), reference(), 0.45);

        let result = matcher.evaluate(&job(3, &[0, 20]));

        assert_eq!(result.matched, Some(candidate(20, 3)));
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_all_candidates_over_threshold_is_no_match() {
        let embedder = ScriptedEmbedder::default()
            .with_distance(0, 0.5)
            .with_distance(20, 1.2);
        let matcher = FaceMatcher::new(Arc::new(embedder), reference(), 0.45);

        assert_eq!(matcher.evaluate(&job(4, &[0, 20])), MatchResult::no_match(4));
    }

    #[test]
    fn test_dimension_mismatch_is_skipped() {
        use crate::detection::domain::embedding::{Embedding, ReferenceEmbedding};

        let embedder = ScriptedEmbedder::default().with_distance(0, 0.0);
        let three_dims = ReferenceEmbedding::new(Embedding::new(vec![0.0, 0.0, 0.0]));
        let matcher = FaceMatcher::new(Arc::new(embedder), three_dims, 0.45);

        assert!(!matcher.evaluate(&job(2, &[0])).is_match());
    }
}
