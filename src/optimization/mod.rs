mod adagrad;
mod plain;
mod step_rule;

pub use adagrad::AdaGrad;
pub use plain::PlainRate;
pub use step_rule::{Step, StepRule};
