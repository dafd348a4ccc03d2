use log::{debug, warn};

use super::{FieldAwareModel, PredictionModel, Shape};
use crate::{
    error::{FfmErr, Param, Result},
    feature::{Feature, FieldMajorKeys, KeyEncoder},
    initialization::VInit,
    optimization::StepRule,
    storage::{Entry, ParamTable},
};

/// The partner sums of a feature, one latent-sized vector per partner field.
type FieldSums = Vec<(i32, Vec<f32>)>;

/// The mutable, training time field-aware factorization machine.
///
/// Entries are created lazily the first time a key is referenced and updated in place after
/// that. Every mutating method takes `&mut self`, so there is a single writer at any time.
pub struct TrainingModel<K: KeyEncoder = FieldMajorKeys> {
    table: ParamTable,
    w0: f32,
    shape: Shape,
    lambda: f32,
    v_init: Box<dyn VInit + Send>,
    rule: Box<dyn StepRule + Send>,
    keys: K,
}

/// The quantities involved in updating a single scalar parameter.
struct Update {
    param: Param,
    x_value: f32,
    gradient: f32,
    prior: f32,
    dloss: f32,
    eta: f32,
}

impl Update {
    /// Computes `prior - rate * (gradient + 2 * lambda * prior)`.
    ///
    /// # Returns
    /// The next value or `NumericDivergence` if it isn't finite.
    fn apply(&self, rate: f32, lambda: f32) -> Result<f32> {
        let next = self.prior - rate * (self.gradient + 2. * lambda * self.prior);
        if next.is_finite() {
            return Ok(next);
        }

        warn!(
            param:% = self.param,
            gradient = self.gradient,
            prior = self.prior;
            "numeric divergence"
        );

        Err(FfmErr::NumericDivergence {
            param: self.param,
            next,
            x_value: self.x_value,
            gradient: self.gradient,
            prior: self.prior,
            dloss: self.dloss,
            eta: self.eta,
            rate,
        })
    }
}

impl<K: KeyEncoder> TrainingModel<K> {
    /// Creates a new `TrainingModel` without any entries.
    ///
    /// # Arguments
    /// * `shape` - The dimensions of the model.
    /// * `lambda` - The L2 regularization strength.
    /// * `v_init` - Generates the latent vector of new entries.
    /// * `rule` - Turns the learning rate into the rate of each latent dimension.
    /// * `keys` - Maps (feature, field) pairings into interaction keys.
    ///
    /// # Returns
    /// A new `TrainingModel` instance.
    pub fn new(
        shape: Shape,
        lambda: f32,
        v_init: Box<dyn VInit + Send>,
        rule: Box<dyn StepRule + Send>,
        keys: K,
    ) -> Self {
        Self {
            table: ParamTable::new(),
            w0: 0.,
            shape,
            lambda,
            v_init,
            rule,
            keys,
        }
    }

    /// Makes room for at least `additional` more entries.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// The amount of entries, linear and interaction keys alike.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn table(&self) -> &ParamTable {
        &self.table
    }

    /// Returns the latent vector of `x` paired with `field`, creating the entry if needed.
    ///
    /// This is the read used by the forward pass of training, every pairing it touches ends
    /// up in the model.
    pub fn v_or_init(&mut self, x: &Feature, field: i32) -> Result<&[f32]> {
        let (entry, _) = self.interaction_entry(x, field)?;
        Ok(entry.v())
    }

    /// Updates the global bias, `w0 ← w0 - eta * (dloss + 2 * lambda * w0)`.
    ///
    /// # Returns
    /// `NumericDivergence` if the next bias isn't finite, the bias is left untouched then.
    pub fn update_w0(&mut self, dloss: f32, eta: f32) -> Result<()> {
        let update = Update {
            param: Param::Bias,
            x_value: 1.,
            gradient: dloss,
            prior: self.w0,
            dloss,
            eta,
        };

        self.w0 = update.apply(eta, self.lambda)?;
        Ok(())
    }

    /// Updates the linear weight of `x`, `W ← W - eta * (dloss * x + 2 * lambda * W)`.
    ///
    /// # Arguments
    /// * `x` - The observed feature.
    /// * `dloss` - The derivative of the loss w.r.t. the prediction.
    /// * `eta` - The current learning rate.
    ///
    /// # Returns
    /// `NumericDivergence` if the next weight isn't finite, the weight is left untouched then.
    pub fn update_w(&mut self, x: &Feature, dloss: f32, eta: f32) -> Result<()> {
        let lambda = self.lambda;
        let entry = self.linear_entry(x);

        let update = Update {
            param: Param::Linear {
                feature: x.index(),
            },
            x_value: x.value(),
            gradient: dloss * x.value(),
            prior: entry.w,
            dloss,
            eta,
        };

        entry.w = update.apply(eta, lambda)?;
        Ok(())
    }

    /// Updates dimension `f` of the latent vector of `x` paired with `field`.
    ///
    /// # Arguments
    /// * `x` - The observed feature.
    /// * `field` - The field of the partner features.
    /// * `f` - The latent dimension.
    /// * `dloss` - The derivative of the loss w.r.t. the prediction.
    /// * `sum_vfx` - `Σ V[j, field(x)][f] * x_j` over the partner features `j` in `field`.
    /// * `eta` - The current learning rate.
    ///
    /// # Returns
    /// `FactorMismatch` if `f` is out of range, `NumericDivergence` if the next value isn't
    /// finite; nothing is written in either case.
    pub fn update_v(
        &mut self,
        x: &Feature,
        field: i32,
        f: usize,
        dloss: f32,
        sum_vfx: f32,
        eta: f32,
    ) -> Result<()> {
        let factors = self.shape.factors();
        if f >= factors {
            return Err(FfmErr::FactorMismatch {
                got: f + 1,
                expected: factors,
            });
        }

        let lambda = self.lambda;
        let (entry, rule) = self.interaction_entry(x, field)?;
        let prior = entry.v()[f];

        let gradient = dloss * x.value() * sum_vfx;
        let step = rule.step(eta, gradient, entry.sum_sq(f));

        let update = Update {
            param: Param::Latent {
                feature: x.index(),
                field,
                f,
            },
            x_value: x.value(),
            gradient,
            prior,
            dloss,
            eta,
        };

        entry.v_mut()[f] = update.apply(step.rate, lambda)?;
        entry.set_sum_sq(f, step.sum_sq);
        Ok(())
    }

    /// Updates every dimension of the latent vector of `x` paired with `field`.
    ///
    /// Either every dimension is written or none is.
    ///
    /// # Arguments
    /// * `x` - The observed feature.
    /// * `field` - The field of the partner features.
    /// * `dloss` - The derivative of the loss w.r.t. the prediction.
    /// * `sum_vx` - The partner sum of each dimension, see `update_v`.
    /// * `eta` - The current learning rate.
    pub fn update_v_all(
        &mut self,
        x: &Feature,
        field: i32,
        dloss: f32,
        sum_vx: &[f32],
        eta: f32,
    ) -> Result<()> {
        let factors = self.shape.factors();
        if sum_vx.len() != factors {
            return Err(FfmErr::FactorMismatch {
                got: sum_vx.len(),
                expected: factors,
            });
        }

        let lambda = self.lambda;
        let (entry, rule) = self.interaction_entry(x, field)?;
        let mut next = Vec::with_capacity(factors);

        for (f, (&prior, &sum)) in entry.v().iter().zip(sum_vx).enumerate() {
            let gradient = dloss * x.value() * sum;
            let step = rule.step(eta, gradient, entry.sum_sq(f));

            let update = Update {
                param: Param::Latent {
                    feature: x.index(),
                    field,
                    f,
                },
                x_value: x.value(),
                gradient,
                prior,
                dloss,
                eta,
            };

            next.push((update.apply(step.rate, lambda)?, step.sum_sq));
        }

        for (f, (value, sum_sq)) in next.into_iter().enumerate() {
            entry.v_mut()[f] = value;
            entry.set_sum_sq(f, sum_sq);
        }

        Ok(())
    }

    /// Takes a full gradient step on a single example.
    ///
    /// The bias, the linear weight of every feature and the latent vector of every pairing
    /// are updated. The latent gradients are computed from the values before this step.
    ///
    /// # Arguments
    /// * `features` - The active features of the example.
    /// * `dloss` - The derivative of the loss w.r.t. the prediction for this example.
    /// * `eta` - The current learning rate.
    pub fn train_example(&mut self, features: &[Feature], dloss: f32, eta: f32) -> Result<()> {
        let sums = self.interaction_sums(features)?;

        self.update_w0(dloss, eta)?;

        for x in features {
            self.update_w(x, dloss, eta)?;
        }

        for (x, field_sums) in features.iter().zip(&sums) {
            for (field, sum_vx) in field_sums {
                self.update_v_all(x, *field, dloss, sum_vx, eta)?;
            }
        }

        Ok(())
    }

    /// Consumes the model into an immutable `PredictionModel`.
    ///
    /// The parameter table moves into the new model, no entry is copied.
    pub fn into_prediction_model(self) -> PredictionModel<K> {
        debug!(
            entries = self.table.len(),
            capacity = self.table.capacity();
            "snapshotting training model"
        );

        PredictionModel::from_parts(self.table, f64::from(self.w0), self.shape, self.keys)
    }

    /// Computes, for each feature `i` and each partner field `p`,
    /// `Σ V[j, field_i] * x_j` over the other features `j` of field `p`.
    fn interaction_sums(&mut self, features: &[Feature]) -> Result<Vec<FieldSums>> {
        let factors = self.shape.factors();
        let mut sums = Vec::with_capacity(features.len());

        for (i, x) in features.iter().enumerate() {
            let mut field_sums: FieldSums = Vec::new();

            for (j, other) in features.iter().enumerate() {
                if i == j {
                    continue;
                }

                let pos = match field_sums.iter().position(|(p, _)| *p == other.field()) {
                    Some(pos) => pos,
                    None => {
                        field_sums.push((other.field(), vec![0.; factors]));
                        field_sums.len() - 1
                    }
                };

                let v = self.v_or_init(other, x.field())?;
                field_sums[pos]
                    .1
                    .iter_mut()
                    .zip(v)
                    .for_each(|(sum, vf)| *sum += vf * other.value());
            }

            sums.push(field_sums);
        }

        Ok(sums)
    }

    fn linear_entry(&mut self, x: &Feature) -> &mut Entry {
        let key = x.linear_key();
        let rule: &dyn StepRule = &*self.rule;

        self.table.get_or_insert_with(key, || {
            fresh_entry(&*self.v_init, rule, key, self.shape.factors())
        })
    }

    fn interaction_entry(&mut self, x: &Feature, field: i32) -> Result<(&mut Entry, &dyn StepRule)> {
        let key = self
            .keys
            .interaction_key(x.index(), field, self.shape.num_fields())?;
        let rule: &dyn StepRule = &*self.rule;

        let entry = self.table.get_or_insert_with(key, || {
            fresh_entry(&*self.v_init, rule, key, self.shape.factors())
        });

        Ok((entry, rule))
    }
}

/// Builds the entry of a key seen for the first time: a zero weight and a sampled vector.
fn fresh_entry(v_init: &dyn VInit, rule: &dyn StepRule, key: i32, factors: usize) -> Entry {
    let mut v = vec![0.; factors];
    v_init.init(key, &mut v);

    let entry = Entry::new(0., v);
    if rule.accumulates() {
        entry.with_accumulators()
    } else {
        entry
    }
}

impl<K: KeyEncoder> FieldAwareModel for TrainingModel<K> {
    fn w0(&self) -> f64 {
        f64::from(self.w0)
    }

    fn w(&self, x: &Feature) -> f32 {
        self.table.get(x.linear_key()).map_or(0., |entry| entry.w)
    }

    fn v(&self, x: &Feature, field: i32) -> Option<&[f32]> {
        let key = self
            .keys
            .interaction_key(x.index(), field, self.shape.num_fields())
            .ok()?;

        self.table.get(key).map(Entry::v)
    }

    fn shape(&self) -> Shape {
        self.shape
    }
}
