//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum ReincarnateError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// A sub-configuration required to build a model is not set.
    #[error("Configuration is not set: {0}")]
    MissingConfig(String),

    /// A size in a configuration must be positive.
    #[error("Invalid size of {name}: {value}")]
    InvalidSize {
        /// Name of the configuration field.
        name: String,
        /// The given value.
        value: i64,
    },

    /// The length of the support does not match the number of atoms.
    #[error("Support has {support_len} elements, but the head has {num_atoms} atoms")]
    SupportMismatch {
        /// Length of the given support.
        support_len: i64,
        /// Number of atoms of the head.
        num_atoms: i64,
    },

    /// A parameter was not found in the destination of a transfer.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// A parameter has a different shape in the source and the destination of a transfer.
    #[error("Shape mismatch of {name}: {src:?} into {dest:?}")]
    ShapeMismatch {
        /// Name of the parameter.
        name: String,
        /// Shape in the source.
        src: Vec<i64>,
        /// Shape in the destination.
        dest: Vec<i64>,
    },
}

impl ReincarnateError {
    /// Returns an error if `value` is not positive.
    pub fn check_positive(name: &str, value: i64) -> Result<(), Self> {
        if value > 0 {
            Ok(())
        } else {
            Err(Self::InvalidSize {
                name: name.to_string(),
                value,
            })
        }
    }
}
