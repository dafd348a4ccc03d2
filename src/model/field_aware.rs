use super::Shape;
use crate::feature::Feature;

/// Read access to the parameters of a field-aware factorization machine.
///
/// Callers that only score examples depend on this trait, regardless of how the parameters
/// are stored or whether the model is still training.
pub trait FieldAwareModel {
    /// The global bias.
    fn w0(&self) -> f64;

    /// The linear weight of `x`, zero if it was never learned.
    fn w(&self, x: &Feature) -> f32;

    /// The latent vector of `x` paired with `field`.
    ///
    /// # Returns
    /// `None` if the pairing was never learned, which is different from a zero vector.
    fn v(&self, x: &Feature, field: i32) -> Option<&[f32]>;

    /// The dimensions of the model.
    fn shape(&self) -> Shape;

    fn factors(&self) -> usize {
        self.shape().factors()
    }

    fn num_features(&self) -> usize {
        self.shape().num_features()
    }

    fn num_fields(&self) -> usize {
        self.shape().num_fields()
    }

    /// Scores an example:
    /// `w0 + Σ W[i]·x_i + Σ_{i<j} <V[i, field_j], V[j, field_i]>·x_i·x_j`.
    ///
    /// Pairings that were never learned contribute nothing.
    fn predict(&self, features: &[Feature]) -> f64 {
        let mut score = self.w0();

        for x in features {
            score += f64::from(self.w(x)) * f64::from(x.value());
        }

        for (i, xi) in features.iter().enumerate() {
            for xj in &features[i + 1..] {
                let (Some(vi), Some(vj)) = (self.v(xi, xj.field()), self.v(xj, xi.field())) else {
                    continue;
                };

                let dot: f32 = vi.iter().zip(vj).map(|(a, b)| a * b).sum();
                score += f64::from(dot) * f64::from(xi.value()) * f64::from(xj.value());
            }
        }

        score
    }
}
