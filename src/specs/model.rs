use serde::{Deserialize, Serialize};

use super::{DistributionSpec, EtaSpec, StepRuleSpec};
use crate::error::Result;

fn default_init_scale() -> f32 {
    1.
}

/// The specification of a field-aware model and how it trains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub factors: usize,
    pub num_features: usize,
    pub num_fields: usize,
    pub lambda: f32,
    pub init: DistributionSpec,
    #[serde(default = "default_init_scale")]
    pub init_scale: f32,
    pub step_rule: StepRuleSpec,
    pub eta: EtaSpec,
    pub seed: Option<u64>,
    pub capacity: Option<usize>,
}

impl ModelSpec {
    /// Parses a `ModelSpec` from its json representation.
    ///
    /// # Returns
    /// The spec or `InvalidSpec` if the json doesn't describe one.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snake_case_variants() {
        let json = r#"{
            "factors": 4,
            "num_features": 1000,
            "num_fields": 3,
            "lambda": 0.00002,
            "init": { "normal": { "std_dev": 0.1 } },
            "step_rule": { "ada_grad": { "eps": 1.0 } },
            "eta": { "inv_scaling": { "eta0": 0.1, "power_t": 0.1 } },
            "seed": 43,
            "capacity": null
        }"#;

        let spec = ModelSpec::from_json(json).unwrap();

        assert_eq!(spec.init, DistributionSpec::Normal { std_dev: 0.1 });
        assert_eq!(spec.init_scale, 1.);
        assert_eq!(spec.step_rule, StepRuleSpec::AdaGrad { eps: 1. });
        assert_eq!(spec.seed, Some(43));
        assert_eq!(spec.capacity, None);
    }

    #[test]
    fn plain_rule_is_a_bare_string() {
        let json = r#"{
            "factors": 2,
            "num_features": 10,
            "num_fields": 2,
            "lambda": 0.0,
            "init": { "constant": { "value": 0.5 } },
            "init_scale": 0.5,
            "step_rule": "plain",
            "eta": { "fixed": { "eta0": 0.2 } },
            "seed": null,
            "capacity": 128
        }"#;

        let spec = ModelSpec::from_json(json).unwrap();

        assert_eq!(spec.step_rule, StepRuleSpec::Plain);
        assert_eq!(spec.init_scale, 0.5);
        assert_eq!(spec.capacity, Some(128));
    }

    #[test]
    fn rejects_unknown_variant() {
        let json = r#"{ "factors": 2, "init": { "gamma": {} } }"#;
        assert!(ModelSpec::from_json(json).is_err());
    }
}
