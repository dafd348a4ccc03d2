use serde::{Deserialize, Serialize};

/// The specification for the `StepRule` trait.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRuleSpec {
    Plain,
    AdaGrad { eps: f32 },
}

/// The specification for the `EtaEstimator` trait.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EtaSpec {
    Fixed { eta0: f32 },
    Simple { eta0: f32, total_steps: u64 },
    InvScaling { eta0: f32, power_t: f64 },
}
