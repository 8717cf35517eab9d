use std::sync::Arc;

/// Fixed-length face descriptor produced by a [`FaceEmbedder`].
///
/// [`FaceEmbedder`]: super::face_embedder::FaceEmbedder
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn l2_normalize(&mut self) {
        let norm = self.0.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in self.0.iter_mut() {
                *x /= norm;
            }
        }
    }

    /// Euclidean distance, or `None` when the dimensions differ.
    pub fn euclidean_distance(&self, other: &Embedding) -> Option<f32> {
        if self.0.len() != other.0.len() {
            return None;
        }
        let sum: f32 = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        Some(sum.sqrt())
    }
}

/// The identity being tracked. Set once before a session starts and shared
/// read-only with the match worker afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceEmbedding(Arc<Embedding>);

impl ReferenceEmbedding {
    pub fn new(embedding: Embedding) -> Self {
        Self(Arc::new(embedding))
    }

    pub fn embedding(&self) -> &Embedding {
        &self.0
    }

    pub fn distance_to(&self, candidate: &Embedding) -> Option<f32> {
        self.0.euclidean_distance(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_l2_normalize() {
        let mut e = Embedding::new(vec![3.0, 4.0]);
        e.l2_normalize();
        assert_relative_eq!(e.values()[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(e.values()[1], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector_is_untouched() {
        let mut e = Embedding::new(vec![0.0; 3]);
        e.l2_normalize();
        assert_eq!(e.values(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_euclidean_distance() {
        let a = Embedding::new(vec![0.0, 0.0]);
        let b = Embedding::new(vec![3.0, 4.0]);
        assert_relative_eq!(a.euclidean_distance(&b).unwrap(), 5.0);
        assert_relative_eq!(b.euclidean_distance(&b).unwrap(), 0.0);
    }

    #[test]
    fn test_distance_dimension_mismatch() {
        let a = Embedding::new(vec![0.0, 0.0]);
        let b = Embedding::new(vec![0.0, 0.0, 0.0]);
        assert!(a.euclidean_distance(&b).is_none());
    }

    #[test]
    fn test_reference_clones_share_storage() {
        let reference = ReferenceEmbedding::new(Embedding::new(vec![1.0, 0.0]));
        let copy = reference.clone();
        assert!(std::ptr::eq(reference.embedding(), copy.embedding()));
        assert_relative_eq!(
            copy.distance_to(&Embedding::new(vec![0.0, 0.0])).unwrap(),
            1.0
        );
    }
}
