//! Invariants of the parameter store that should hold for any sequence of keys and updates.

use std::collections::HashSet;

use ffm_store::{
    Entry, Feature, FieldAwareModel, FieldMajorKeys, ParamTable, PredictionModel, Shape,
    TrainingModel, initialization::RandVInit, optimization::PlainRate,
};
use proptest::prelude::*;

const FACTORS: usize = 3;
const NUM_FIELDS: usize = 4;

fn model(seed: u64) -> TrainingModel {
    let shape = Shape::new(FACTORS, 10_000, NUM_FIELDS).unwrap();
    let v_init = RandVInit::normal(0.1, 1., seed).unwrap();

    TrainingModel::new(
        shape,
        0.001,
        Box::new(v_init),
        Box::new(PlainRate),
        FieldMajorKeys,
    )
}

fn feature_strategy() -> impl Strategy<Value = Feature> {
    (0..2000i32, 0..NUM_FIELDS as i32, -2.0f32..2.0f32)
        .prop_map(|(index, field, value)| Feature::new(index, field, value))
}

fn example_strategy() -> impl Strategy<Value = Vec<Feature>> {
    prop::collection::vec(feature_strategy(), 1..5)
}

proptest! {
    // Size equals the amount of distinct keys, regardless of order and repetition.
    #[test]
    fn test_table_size_counts_distinct_keys(keys in prop::collection::vec(any::<i32>(), 0..300)) {
        let mut table = ParamTable::with_capacity(11);

        for &key in &keys {
            table.put(key, Entry::new(key as f32, vec![0.; 2]));
        }

        let distinct: HashSet<_> = keys.iter().copied().collect();
        prop_assert_eq!(table.len(), distinct.len());

        for key in distinct {
            prop_assert_eq!(table.get(key).map(|e| e.w), Some(key as f32));
        }
    }

    #[test]
    fn test_removal_keeps_other_keys(
        keys in prop::collection::hash_set(any::<i32>(), 1..200),
        drop_every in 2usize..5
    ) {
        let mut table = ParamTable::with_capacity(11);
        let keys: Vec<_> = keys.into_iter().collect();

        for &key in &keys {
            table.put(key, Entry::new(key as f32, vec![0.]));
        }

        for key in keys.iter().step_by(drop_every) {
            prop_assert!(table.remove(*key).is_some());
        }

        for (i, key) in keys.iter().enumerate() {
            prop_assert_eq!(table.contains_key(*key), i % drop_every != 0);
        }
    }

    #[test]
    fn test_training_size_counts_touched_keys(
        examples in prop::collection::vec(example_strategy(), 1..20)
    ) {
        let mut model = model(3);
        let mut touched = HashSet::new();

        for features in &examples {
            for (i, x) in features.iter().enumerate() {
                touched.insert(x.linear_key());

                for (j, other) in features.iter().enumerate() {
                    if i != j {
                        touched.insert(x.index() * NUM_FIELDS as i32 + other.field());
                    }
                }
            }

            model.train_example(features, 0.01, 0.01).unwrap();
        }

        prop_assert_eq!(model.len(), touched.len());
    }

    // A key's first vector doesn't depend on which keys were initialized before it.
    #[test]
    fn test_lazy_init_ignores_history(
        history in prop::collection::vec(feature_strategy(), 0..50),
        x in feature_strategy(),
        field in 0..NUM_FIELDS as i32
    ) {
        let mut fresh = model(17);
        let expected = fresh.v_or_init(&x, field).unwrap().to_vec();

        let mut busy = model(17);
        for other in &history {
            if (other.index(), other.field()) != (x.index(), field) {
                busy.v_or_init(other, other.field()).unwrap();
            }
        }

        prop_assert_eq!(busy.v_or_init(&x, field).unwrap(), expected.as_slice());
    }

    #[test]
    fn test_round_trip_after_training(
        examples in prop::collection::vec(example_strategy(), 1..10)
    ) {
        let mut training = model(5);

        for features in &examples {
            training.train_example(features, 0.1, 0.05).unwrap();
        }

        let model = training.into_prediction_model();
        let read: PredictionModel = PredictionModel::deserialize(&model.serialize().unwrap()).unwrap();

        prop_assert_eq!(read.table().bulk_view(), model.table().bulk_view());
        prop_assert_eq!(read.w0().to_bits(), model.w0().to_bits());

        for features in &examples {
            prop_assert_eq!(read.predict(features), model.predict(features));
        }
    }
}
