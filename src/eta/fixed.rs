use super::EtaEstimator;

/// A constant learning rate.
#[derive(Debug, Clone, Copy)]
pub struct FixedEta {
    eta0: f32,
}

impl FixedEta {
    pub fn new(eta0: f32) -> Self {
        Self { eta0 }
    }
}

impl EtaEstimator for FixedEta {
    fn eta(&self, _t: u64) -> f32 {
        self.eta0
    }
}
