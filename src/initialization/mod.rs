mod constant;
mod random;
mod v_init;

pub use constant::ConstVInit;
pub use random::RandVInit;
pub use v_init::VInit;
