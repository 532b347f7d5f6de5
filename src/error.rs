use thiserror::Error;

/// Errors returned by the algebra, data set and clustering layers of this crate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Input is empty.
    #[error("empty input")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Requested cluster count is incompatible with the dataset.
    #[error("invalid cluster count: requested {requested}, but dataset has {n_items} items")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of items in the dataset.
        n_items: usize,
    },

    /// Points in a dataset have inconsistent dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// A clustering state query or `apply` was issued before any `initialize_with_*` call.
    #[error("clustering algorithm is not initialized")]
    NotInitialized,

    /// Insertion into a data set that has already been sealed.
    #[error("data set is sealed; no further objects can be inserted")]
    DataSetSealed,

    /// A consumer that relies on stable IDs was handed a data set that is still open.
    #[error("data set must be sealed before it can be clustered or indexed")]
    DataSetNotSealed,
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand for the most common parameter error.
pub(crate) fn invalid(name: &'static str, message: &'static str) -> Error {
    Error::InvalidParameter { name, message }
}
