//! Model-related error types

use thiserror::Error;

use catlm_core::error::{ConfigError, DesignError};

/// Model-related errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Unknown variable or level, or a malformed term list
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Non-finite input or an ill-conditioned factorization
    #[error("Numerical error: {message} (operation: {operation})")]
    NumericalError {
        /// Error message
        message: String,
        /// Operation that failed
        operation: String,
    },

    /// Design is rank deficient and the policy forbids inestimable coefficients
    #[error("Rank deficient design: rank {rank} of {ncols} columns; aliased: {aliased:?}")]
    RankDeficient {
        rank: usize,
        ncols: usize,
        /// Names of the columns dependent on earlier ones
        aliased: Vec<String>,
    },

    /// No residual degrees of freedom are left for inference
    #[error("Distributional error: {message}")]
    Distributional {
        /// Error message
        message: String,
    },

    /// Input lengths disagree
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Models compared by an F-test are not nested
    #[error("Models are not nested: {message}")]
    NotNested { message: String },

    /// Invalid model configuration
    #[error("Invalid model configuration: {message}")]
    InvalidConfig {
        /// Configuration error message
        message: String,
    },
}

impl From<DesignError> for ModelError {
    fn from(err: DesignError) -> Self {
        match err {
            DesignError::Config(config) => ModelError::Config(config),
            DesignError::NonFinite { column, term, row } => ModelError::numerical(
                format!(
                    "design column '{}' of term '{}' is not finite at row {}",
                    column, term, row
                ),
                "design",
            ),
        }
    }
}

impl ModelError {
    pub(crate) fn numerical(message: impl Into<String>, operation: &str) -> Self {
        ModelError::NumericalError {
            message: message.into(),
            operation: operation.to_string(),
        }
    }

    pub(crate) fn distributional(message: impl Into<String>) -> Self {
        ModelError::Distributional {
            message: message.into(),
        }
    }
}
