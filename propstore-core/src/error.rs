use thiserror::Error;

/// Recoverable errors raised by property storages and containers.
///
/// Type or shape mismatches between a view and the storage it is created for are programmer errors and panic
/// instead. Only invalid arguments, inconsistent inputs and integer overflows surface as `PropertyError`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// Invalid parameters for constructing a storage (zero components, bad stride etc.)
    #[error("{0}")]
    InvalidArgument(String),

    /// An input does not satisfy the preconditions of an operation, e.g. a bitmask whose length differs from the
    /// number of elements it is applied to
    #[error("{0}")]
    PreconditionViolation(String),

    /// A property that an operation depends on is absent or has the wrong length
    #[error("{0}")]
    MissingRequiredProperty(String),

    /// A property exists but has an incompatible data type, component count or stride
    #[error("{0}")]
    TypeMismatch(String),

    /// Multiplying the element count would exceed the range of `usize`
    #[error("Cannot replicate {count} elements {factor} times: the element count would overflow")]
    Overflow { count: usize, factor: usize },

    /// A property's length disagrees with its container's element count
    #[error("Property '{name}' has {actual} elements, but its container has {expected} elements")]
    InconsistentContainer {
        name: String,
        expected: usize,
        actual: usize,
    },

    /// A data type name does not identify one of the supported primitive types
    #[error("Unsupported property data type: {0}")]
    DataTypeUnsupported(String),

    /// A container already holds a property with the same semantic type or name
    #[error("Container already contains a property named '{0}'")]
    DuplicateProperty(String),
}

impl PropertyError {
    pub(crate) fn missing(name: &str) -> Self {
        Self::MissingRequiredProperty(format!(
            "Required property '{}' does not exist in the input dataset.",
            name
        ))
    }

    pub(crate) fn wrong_length(name: &str) -> Self {
        Self::MissingRequiredProperty(format!(
            "Property array '{}' has wrong length. It does not match the number of elements in the parent container.",
            name
        ))
    }

    pub(crate) fn mask_length(expected: usize, actual: usize) -> Self {
        Self::PreconditionViolation(format!(
            "Selection mask has {} entries, but the array has {} elements",
            actual, expected
        ))
    }
}

pub type Result<T> = std::result::Result<T, PropertyError>;
