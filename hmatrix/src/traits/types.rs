//! Utility types for trait definitions.

/// Type to handle hierarchical matrix related errors
#[derive(thiserror::Error, Debug)]
pub enum HMatrixError {
    /// Rejected parameters, raised before any work is done
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Inconsistent input data, or builder stages called out of order
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Failure of a collective operation
    #[error("Communication failure: {0}")]
    Communication(String),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, HMatrixError>;
