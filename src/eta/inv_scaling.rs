use super::EtaEstimator;

/// Inverse scaling rate, `eta0 / t^power_t`.
#[derive(Debug, Clone, Copy)]
pub struct InvScalingEta {
    eta0: f32,
    power_t: f64,
}

impl InvScalingEta {
    /// Creates a new `InvScalingEta` estimator.
    ///
    /// # Arguments
    /// * `eta0` - The initial learning rate.
    /// * `power_t` - The exponent of the decay.
    pub fn new(eta0: f32, power_t: f64) -> Self {
        Self { eta0, power_t }
    }
}

impl EtaEstimator for InvScalingEta {
    fn eta(&self, t: u64) -> f32 {
        let t = t.max(1) as f64;
        (self.eta0 as f64 / t.powf(self.power_t)) as f32
    }
}
