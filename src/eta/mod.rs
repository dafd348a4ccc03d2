mod estimator;
mod fixed;
mod inv_scaling;
mod simple;

pub use estimator::EtaEstimator;
pub use fixed::FixedEta;
pub use inv_scaling::InvScalingEta;
pub use simple::SimpleEta;
