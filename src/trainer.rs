use log::{debug, trace};

use crate::{
    error::Result,
    eta::EtaEstimator,
    feature::{Feature, FieldMajorKeys, KeyEncoder},
    model::{FieldAwareModel, PredictionModel, TrainingModel},
};

/// Drives a `TrainingModel` one example at a time, asking an `EtaEstimator` for the learning
/// rate of each step.
pub struct Trainer<K: KeyEncoder = FieldMajorKeys> {
    model: TrainingModel<K>,
    eta: Box<dyn EtaEstimator + Send>,
    t: u64,
}

impl<K: KeyEncoder> Trainer<K> {
    /// Creates a new `Trainer`.
    ///
    /// # Arguments
    /// * `model` - The model to train.
    /// * `eta` - Provides the learning rate of each step.
    ///
    /// # Returns
    /// A new `Trainer` instance.
    pub fn new(model: TrainingModel<K>, eta: Box<dyn EtaEstimator + Send>) -> Self {
        Self { model, eta, t: 0 }
    }

    /// Scores an example with the current parameters, without creating entries.
    pub fn predict(&self, features: &[Feature]) -> f64 {
        self.model.predict(features)
    }

    /// Trains the model on a single example.
    ///
    /// # Arguments
    /// * `features` - The active features of the example.
    /// * `dloss` - The derivative of the loss w.r.t. the prediction for this example.
    ///
    /// # Returns
    /// The first error encountered, the step counter only advances on success.
    pub fn step(&mut self, features: &[Feature], dloss: f32) -> Result<()> {
        let eta = self.eta.eta(self.t);
        trace!(t = self.t, eta = eta, dloss = dloss; "training step");

        self.model.train_example(features, dloss, eta)?;
        self.t += 1;
        Ok(())
    }

    pub fn model(&self) -> &TrainingModel<K> {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut TrainingModel<K> {
        &mut self.model
    }

    /// The amount of successful steps.
    pub fn steps(&self) -> u64 {
        self.t
    }

    /// Ends the training, turning the model into a `PredictionModel`.
    pub fn finish(self) -> PredictionModel<K> {
        debug!(steps = self.t, entries = self.model.len(); "finished training");
        self.model.into_prediction_model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        eta::{FixedEta, SimpleEta},
        initialization::ConstVInit,
        model::Shape,
        optimization::PlainRate,
    };

    fn trainer(eta: Box<dyn EtaEstimator + Send>) -> Trainer {
        let shape = Shape::new(2, 10, 2).unwrap();
        let model = TrainingModel::new(
            shape,
            0.,
            Box::new(ConstVInit::new(0.1)),
            Box::new(PlainRate),
            FieldMajorKeys,
        );

        Trainer::new(model, eta)
    }

    #[test]
    fn test_step_uses_scheduled_rate() {
        let mut trainer = trainer(Box::new(SimpleEta::new(0.2, 1)));
        let x = [Feature::new(1, 0, 1.)];

        trainer.step(&x, 1.).unwrap();
        assert_eq!(trainer.model().w(&x[0]), -0.2);

        // At t = 1 the rate halves: 0.2 / (1 + 1).
        trainer.step(&x, 1.).unwrap();
        assert!((trainer.model().w(&x[0]) + 0.3).abs() < 1e-6);
        assert_eq!(trainer.steps(), 2);
    }

    #[test]
    fn test_failed_step_does_not_count() {
        let mut trainer = trainer(Box::new(FixedEta::new(f32::MAX)));
        let x = [Feature::new(1, 0, f32::MAX)];

        assert!(trainer.step(&x, f32::MAX).is_err());
        assert_eq!(trainer.steps(), 0);
    }

    #[test]
    fn test_finish_keeps_parameters() {
        let mut trainer = trainer(Box::new(FixedEta::new(0.1)));
        let features = [Feature::new(1, 0, 1.), Feature::new(2, 1, 1.)];

        for _ in 0..5 {
            let dloss = (trainer.predict(&features) - 1.) as f32;
            trainer.step(&features, dloss).unwrap();
        }

        let score = trainer.predict(&features);
        let model = trainer.finish();

        assert_eq!(model.predict(&features), score);
    }
}
