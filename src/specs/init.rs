use serde::{Deserialize, Serialize};

/// The specification for the `VInit` trait.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionSpec {
    Normal { std_dev: f32 },
    Uniform { range: f32 },
    Constant { value: f32 },
}
