use crate::error::{FfmErr, Result};

/// A single active feature of an example.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feature {
    index: i32,
    field: i32,
    value: f32,
}

impl Feature {
    /// Creates a new `Feature`.
    ///
    /// # Arguments
    /// * `index` - The feature's own index, also its linear key.
    /// * `field` - The field the feature belongs to.
    /// * `value` - The raw value observed for the feature.
    pub fn new(index: i32, field: i32, value: f32) -> Self {
        Self {
            index,
            field,
            value,
        }
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn field(&self) -> i32 {
        self.field
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// The key of this feature's linear weight.
    pub fn linear_key(&self) -> i32 {
        self.index
    }
}

/// Maps a (feature, target field) pairing into the key space of the parameter table.
///
/// Implementations must be injective and deterministic for a fixed amount of fields.
/// Changing the mapping breaks every model serialized with the previous one.
pub trait KeyEncoder {
    /// Computes the interaction key of `index` paired with `field`.
    ///
    /// # Arguments
    /// * `index` - The feature index.
    /// * `field` - The target field.
    /// * `num_fields` - The total amount of fields of the model.
    ///
    /// # Returns
    /// The key or `KeyOutOfRange` if the pairing can't be encoded.
    fn interaction_key(&self, index: i32, field: i32, num_fields: usize) -> Result<i32>;
}

/// Lays out the interaction keys of a feature contiguously, one per field:
/// `index * num_fields + field`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMajorKeys;

impl KeyEncoder for FieldMajorKeys {
    fn interaction_key(&self, index: i32, field: i32, num_fields: usize) -> Result<i32> {
        let out_of_range = || FfmErr::KeyOutOfRange {
            index,
            field,
            num_fields,
        };

        if index < 0 || field < 0 || field as usize >= num_fields {
            return Err(out_of_range());
        }

        let num_fields = i64::try_from(num_fields).map_err(|_| out_of_range())?;
        let key = index as i64 * num_fields + field as i64;
        i32::try_from(key).map_err(|_| out_of_range())
    }
}
