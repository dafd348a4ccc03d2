use super::{Step, StepRule};

/// AdaGrad, scales each dimension's rate by the inverse square root of its accumulated squared
/// gradients.
#[derive(Debug, Clone, Copy)]
pub struct AdaGrad {
    eps: f32,
}

impl AdaGrad {
    /// Creates a new `AdaGrad` step rule.
    ///
    /// # Arguments
    /// * `eps` - Smoothing term added to the accumulator before taking its square root.
    pub fn new(eps: f32) -> Self {
        Self { eps }
    }
}

impl StepRule for AdaGrad {
    fn accumulates(&self) -> bool {
        true
    }

    fn step(&self, eta: f32, grad: f32, sum_sq: f32) -> Step {
        let sum_sq = sum_sq + grad * grad;
        let rate = eta / (sum_sq + self.eps).sqrt();
        Step { rate, sum_sq }
    }
}
