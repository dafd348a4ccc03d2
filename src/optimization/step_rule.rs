/// The rate to apply to a single latent dimension and the accumulator value to keep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub rate: f32,
    pub sum_sq: f32,
}

/// Defines how the scalar learning rate is turned into the effective rate of each latent
/// dimension.
pub trait StepRule {
    /// Whether new entries need a per-dimension squared gradient accumulator.
    fn accumulates(&self) -> bool {
        false
    }

    /// Computes the effective rate of a latent update.
    ///
    /// Implementations must not have side effects, the caller only commits the returned
    /// accumulator once the updated value turned out finite.
    ///
    /// # Arguments
    /// * `eta` - The current learning rate.
    /// * `grad` - The gradient of the dimension being updated.
    /// * `sum_sq` - The squared gradients accumulated so far for this dimension.
    fn step(&self, eta: f32, grad: f32, sum_sq: f32) -> Step;
}
