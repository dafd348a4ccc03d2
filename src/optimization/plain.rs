use super::{Step, StepRule};

/// Plain stochastic gradient descent, every dimension moves at the given rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRate;

impl StepRule for PlainRate {
    fn step(&self, eta: f32, _grad: f32, sum_sq: f32) -> Step {
        Step { rate: eta, sum_sq }
    }
}
