use crate::error::{FfmErr, Result};

/// The dimensions of a field-aware model, fixed for its entire lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    factors: usize,
    num_features: usize,
    num_fields: usize,
}

impl Shape {
    /// Creates a new `Shape`.
    ///
    /// # Arguments
    /// * `factors` - The length of every latent vector.
    /// * `num_features` - The amount of features, informative only.
    /// * `num_fields` - The amount of fields.
    ///
    /// # Returns
    /// An `InvalidSpec` error if `factors` or `num_fields` is zero or any dimension doesn't
    /// fit in an `i32`.
    pub fn new(factors: usize, num_features: usize, num_fields: usize) -> Result<Self> {
        if factors == 0 {
            return Err(FfmErr::InvalidSpec("factors must be positive".into()));
        }

        if num_fields == 0 {
            return Err(FfmErr::InvalidSpec("num_fields must be positive".into()));
        }

        let limit = i32::MAX as usize;
        if factors > limit || num_features > limit || num_fields > limit {
            return Err(FfmErr::InvalidSpec(format!(
                "dimensions must fit in an i32: factors={factors}, num_features={num_features}, num_fields={num_fields}"
            )));
        }

        Ok(Self {
            factors,
            num_features,
            num_fields,
        })
    }

    pub fn factors(&self) -> usize {
        self.factors
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn num_fields(&self) -> usize {
        self.num_fields
    }
}
