mod field_aware;
mod prediction;
mod shape;
mod training;

pub use field_aware::FieldAwareModel;
pub use prediction::PredictionModel;
pub use shape::Shape;
pub use training::TrainingModel;
