use log::debug;
use rayon::prelude::*;

use super::{FieldAwareModel, Shape};
use crate::{
    error::Result,
    feature::{Feature, FieldMajorKeys, KeyEncoder},
    serialization::{self, Compression},
    storage::{Entry, ParamTable},
};

/// The immutable, prediction time field-aware factorization machine.
///
/// Built once from a `TrainingModel` or from serialized bytes, never written afterwards, so
/// it can be shared between threads and read concurrently.
#[derive(Debug, Clone)]
pub struct PredictionModel<K: KeyEncoder = FieldMajorKeys> {
    table: ParamTable,
    w0: f64,
    shape: Shape,
    keys: K,
}

impl<K: KeyEncoder> PredictionModel<K> {
    pub(crate) fn from_parts(table: ParamTable, w0: f64, shape: Shape, keys: K) -> Self {
        Self {
            table,
            w0,
            shape,
            keys,
        }
    }

    /// The amount of entries.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn table(&self) -> &ParamTable {
        &self.table
    }

    /// Packs the model into its canonical byte layout.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialization::write_model(self.w0, self.shape, &self.table)
    }

    /// Packs the model and then applies `compression` to the bytes.
    pub fn serialize_with<C: Compression>(&self, compression: &C) -> Result<Vec<u8>> {
        let bytes = self.serialize()?;
        let compressed = compression.compress(&bytes)?;

        debug!(raw = bytes.len(), compressed = compressed.len(); "compressed model");
        Ok(compressed)
    }

    /// Scores every example in parallel.
    ///
    /// # Arguments
    /// * `examples` - The active features of each example.
    ///
    /// # Returns
    /// The score of each example, in the same order.
    pub fn predict_batch<E>(&self, examples: &[E]) -> Vec<f64>
    where
        E: AsRef<[Feature]> + Sync,
        K: Sync,
    {
        examples
            .par_iter()
            .map(|features| self.predict(features.as_ref()))
            .collect()
    }
}

impl<K: KeyEncoder + Default> PredictionModel<K> {
    /// Reconstructs a model from bytes written by `serialize`.
    ///
    /// # Returns
    /// The model or `MalformedLayout` if the bytes aren't a valid model.
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let (w0, shape, table) = serialization::read_model(bytes)?;
        Ok(Self::from_parts(table, w0, shape, K::default()))
    }

    /// Reverts `compression` and then reconstructs the model.
    pub fn deserialize_with<C: Compression>(bytes: &[u8], compression: &C) -> Result<Self> {
        let bytes = compression.decompress(bytes)?;
        Self::deserialize(&bytes)
    }
}

impl<K: KeyEncoder> FieldAwareModel for PredictionModel<K> {
    fn w0(&self) -> f64 {
        self.w0
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
