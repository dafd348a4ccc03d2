use log::info;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    error::{FfmErr, Result},
    eta::{EtaEstimator, FixedEta, InvScalingEta, SimpleEta},
    feature::{FieldMajorKeys, KeyEncoder},
    initialization::{ConstVInit, RandVInit, VInit},
    model::{Shape, TrainingModel},
    optimization::{AdaGrad, PlainRate, StepRule},
    specs::{DistributionSpec, EtaSpec, ModelSpec, StepRuleSpec},
    trainer::Trainer,
};

/// Builds `Trainer`s given a specification.
pub struct ModelBuilder<K: KeyEncoder = FieldMajorKeys> {
    keys: K,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBuilder {
    /// Creates a new `ModelBuilder` that lays out interaction keys with `FieldMajorKeys`.
    pub fn new() -> Self {
        Self {
            keys: FieldMajorKeys,
        }
    }
}

impl<K: KeyEncoder + Clone> ModelBuilder<K> {
    /// Creates a new `ModelBuilder` with a custom interaction key layout.
    ///
    /// # Arguments
    /// * `keys` - Maps (feature, field) pairings into interaction keys.
    pub fn with_key_encoder(keys: K) -> Self {
        Self { keys }
    }

    /// Builds a new `Trainer` following a spec.
    ///
    /// # Arguments
    /// * `spec` - The specification of the model.
    ///
    /// # Returns
    /// A new trainer or `InvalidSpec` if the spec is inconsistent.
    pub fn build(&self, spec: &ModelSpec) -> Result<Trainer<K>> {
        let shape = Shape::new(spec.factors, spec.num_features, spec.num_fields)?;

        if !spec.lambda.is_finite() || spec.lambda < 0. {
            return Err(FfmErr::InvalidSpec(format!(
                "lambda must be finite and non negative, got {}",
                spec.lambda
            )));
        }

        let seed = self.resolve_seed(spec.seed);
        let v_init = self.resolve_v_init(spec, seed)?;
        let rule = self.resolve_step_rule(spec.step_rule)?;
        let eta = self.resolve_eta(spec.eta)?;

        let mut model = TrainingModel::new(shape, spec.lambda, v_init, rule, self.keys.clone());
        if let Some(capacity) = spec.capacity {
            model.reserve(capacity);
        }

        info!(
            factors = spec.factors,
            num_fields = spec.num_fields,
            seed = seed;
            "built training model"
        );

        Ok(Trainer::new(model, eta))
    }

    /// Parses a `ModelSpec` from json and builds it.
    pub fn build_from_json(&self, json: &str) -> Result<Trainer<K>> {
        let spec = ModelSpec::from_json(json)?;
        self.build(&spec)
    }

    /// Uses the given seed or draws one from the OS.
    fn resolve_seed(&self, seed: Option<u64>) -> u64 {
        match seed {
            Some(seed) => seed,
            None => StdRng::from_os_rng().random(),
        }
    }

    fn resolve_v_init(&self, spec: &ModelSpec, seed: u64) -> Result<Box<dyn VInit + Send>> {
        let scale = spec.init_scale;

        let v_init: Box<dyn VInit + Send> = match spec.init {
            DistributionSpec::Normal { std_dev } => {
                Box::new(RandVInit::normal(std_dev, scale, seed)?)
            }
            DistributionSpec::Uniform { range } => {
                Box::new(RandVInit::uniform(range, scale, seed)?)
            }
            DistributionSpec::Constant { value } => Box::new(ConstVInit::new(value * scale)),
        };

        Ok(v_init)
    }

    fn resolve_step_rule(&self, spec: StepRuleSpec) -> Result<Box<dyn StepRule + Send>> {
        match spec {
            StepRuleSpec::Plain => Ok(Box::new(PlainRate)),
            StepRuleSpec::AdaGrad { eps } if eps > 0. && eps.is_finite() => {
                Ok(Box::new(AdaGrad::new(eps)))
            }
            StepRuleSpec::AdaGrad { eps } => Err(FfmErr::InvalidSpec(format!(
                "ada_grad eps must be positive and finite, got {eps}"
            ))),
        }
    }

    fn resolve_eta(&self, spec: EtaSpec) -> Result<Box<dyn EtaEstimator + Send>> {
        let eta: Box<dyn EtaEstimator + Send> = match spec {
            EtaSpec::Fixed { eta0 } => Box::new(FixedEta::new(eta0)),
            EtaSpec::Simple { eta0, total_steps } => Box::new(SimpleEta::new(eta0, total_steps)),
            EtaSpec::InvScaling { eta0, power_t } => Box::new(InvScalingEta::new(eta0, power_t)),
        };

        Ok(eta)
    }
}
