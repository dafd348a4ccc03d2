//! A sparse, integer keyed parameter store for field-aware factorization machines.
//!
//! A `TrainingModel` creates its entries lazily and updates them in place with regularized
//! SGD or AdaGrad. Once training ends it's consumed into an immutable `PredictionModel`,
//! which can be serialized into a compact byte layout and read back independently.

pub mod builder;
pub mod error;
pub mod eta;
pub mod feature;
pub mod initialization;
pub mod model;
pub mod optimization;
pub mod serialization;
pub mod specs;
pub mod storage;
pub mod trainer;

pub use builder::ModelBuilder;
pub use error::{FfmErr, Param, Result};
pub use feature::{Feature, FieldMajorKeys, KeyEncoder};
pub use model::{FieldAwareModel, PredictionModel, Shape, TrainingModel};
pub use specs::ModelSpec;
pub use storage::{Entry, ParamTable};
pub use trainer::Trainer;
