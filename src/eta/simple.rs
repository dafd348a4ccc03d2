use super::EtaEstimator;

/// Decays the rate hyperbolically over a known amount of steps, `eta0 / (1 + t / total)`,
/// ending at half the initial rate.
#[derive(Debug, Clone, Copy)]
pub struct SimpleEta {
    eta0: f32,
    total_steps: u64,
}

impl SimpleEta {
    /// Creates a new `SimpleEta` estimator.
    ///
    /// # Arguments
    /// * `eta0` - The initial learning rate.
    /// * `total_steps` - The expected amount of training steps, clamped to at least one.
    pub fn new(eta0: f32, total_steps: u64) -> Self {
        Self {
            eta0,
            total_steps: total_steps.max(1),
        }
    }
}

impl EtaEstimator for SimpleEta {
    fn eta(&self, t: u64) -> f32 {
        let progress = t.min(self.total_steps) as f64 / self.total_steps as f64;
        (self.eta0 as f64 / (1. + progress)) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decays_to_half() {
        let eta = SimpleEta::new(0.2, 100);

        assert_eq!(eta.eta(0), 0.2);
        assert!(eta.eta(50) < 0.2);
        assert!((eta.eta(100) - 0.1).abs() < 1e-7);
        assert_eq!(eta.eta(100), eta.eta(1_000));
    }
}
