use std::{error::Error, fmt, io};

use rand_distr::{NormalError, uniform::Error as UniformError};

/// The result type used across the entire crate.
pub type Result<T> = std::result::Result<T, FfmErr>;

/// Identifies which learned parameter an update was computing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    /// The global bias `w0`.
    Bias,
    /// The linear weight `W` of a feature.
    Linear { feature: i32 },
    /// Dimension `f` of the latent vector of `feature` paired with `field`.
    Latent { feature: i32, field: i32, f: usize },
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Bias => write!(f, "w0"),
            Param::Linear { feature } => write!(f, "W[{feature}]"),
            Param::Latent {
                feature,
                field,
                f: dim,
            } => write!(f, "V[{feature}][{field}][{dim}]"),
        }
    }
}

/// The crate's error type.
#[derive(Debug)]
pub enum FfmErr {
    /// An update produced a non finite value, nothing was written.
    NumericDivergence {
        param: Param,
        next: f32,
        x_value: f32,
        gradient: f32,
        prior: f32,
        dloss: f32,
        /// The learning rate given by the caller.
        eta: f32,
        /// The rate actually applied, `eta` scaled by the step rule.
        rate: f32,
    },
    /// The parallel arrays or the serialized bytes of a table are inconsistent.
    MalformedLayout { reason: String },
    /// The interaction key for this feature and field doesn't fit in the key space.
    KeyOutOfRange {
        index: i32,
        field: i32,
        num_fields: usize,
    },
    FactorMismatch {
        got: usize,
        expected: usize,
    },
    InvalidSpec(String),
    Io(io::Error),
}

impl FfmErr {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedLayout {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FfmErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FfmErr::NumericDivergence {
                param,
                next,
                x_value,
                gradient,
                prior,
                dloss,
                eta,
                rate,
            } => write!(
                f,
                "got {next} for next {param}: x={x_value}, grad={gradient}, prior={prior}, dloss={dloss}, eta={eta}, rate={rate}"
            ),
            FfmErr::MalformedLayout { reason } => write!(f, "malformed table layout: {reason}"),
            FfmErr::KeyOutOfRange {
                index,
                field,
                num_fields,
            } => write!(
                f,
                "interaction key out of range for feature {index}, field {field} of {num_fields} fields"
            ),
            FfmErr::FactorMismatch { got, expected } => write!(
                f,
                "latent vector length mismatch: got {got}, expected {expected}"
            ),
            FfmErr::InvalidSpec(reason) => write!(f, "invalid model spec: {reason}"),
            FfmErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for FfmErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FfmErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FfmErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<NormalError> for FfmErr {
    fn from(value: NormalError) -> Self {
        Self::InvalidSpec(value.to_string())
    }
}

impl From<UniformError> for FfmErr {
    fn from(value: UniformError) -> Self {
        Self::InvalidSpec(value.to_string())
    }
}

impl From<serde_json::Error> for FfmErr {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidSpec(value.to_string())
    }
}

/// Boundary conversion for I/O APIs.
impl From<FfmErr> for io::Error {
    fn from(value: FfmErr) -> Self {
        match value {
            FfmErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
