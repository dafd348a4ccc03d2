mod init;
mod model;
mod optimization;

pub use init::DistributionSpec;
pub use model::ModelSpec;
pub use optimization::{EtaSpec, StepRuleSpec};
