/// Provides the learning rate for a given point of the training.
pub trait EtaEstimator {
    /// Should return the learning rate to use at step `t`.
    ///
    /// # Arguments
    /// * `t` - The amount of training steps already taken.
    fn eta(&self, t: u64) -> f32;
}
