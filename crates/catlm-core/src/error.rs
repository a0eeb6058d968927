//! Error taxonomy shared by the data, formula and design layers

use thiserror::Error;

/// A problem with the model specification or the declared data.
///
/// These are raised before any numerical work starts and always carry the
/// offending identifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Variable referenced by a term or an option is not declared in the dataset
    #[error("Variable '{name}' not found in dataset. Available variables: {available:?}")]
    UnknownVariable {
        name: String,
        available: Vec<String>,
    },

    /// Level label is not an observed level of the factor
    #[error("Level '{level}' is not an observed level of '{variable}'. Available levels: {available:?}")]
    UnknownLevel {
        variable: String,
        level: String,
        available: Vec<String>,
    },

    /// Variable was declared with a different kind than the operation needs
    #[error("Variable '{variable}' is {actual}, but {expected} was expected")]
    TypeMismatch {
        variable: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Structurally invalid term list
    #[error("Malformed term list: {message}")]
    MalformedTerms { message: String },

    /// Factor with fewer than two observed levels used as a predictor
    #[error("Factor '{variable}' has a single observed level {levels:?} and cannot be encoded")]
    DegenerateFactor {
        variable: String,
        levels: Vec<String>,
    },

    /// Two columns declared under the same name
    #[error("Duplicate variable name: {0}")]
    DuplicateVariable(String),

    /// Column length disagrees with the dataset
    #[error("Variable '{variable}' has {actual} observations, expected {expected}")]
    LengthMismatch {
        variable: String,
        expected: usize,
        actual: usize,
    },

    /// Formula string could not be parsed
    #[error("Syntax error at position {position}: {message}")]
    Syntax { position: usize, message: String },
}

impl ConfigError {
    /// Create an unknown variable error from the dataset's declared names
    pub fn unknown_variable(name: &str, available: &[&str]) -> Self {
        ConfigError::UnknownVariable {
            name: name.to_string(),
            available: available.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Create a malformed term list error
    pub fn malformed(message: impl Into<String>) -> Self {
        ConfigError::MalformedTerms {
            message: message.into(),
        }
    }

    /// Create a syntax error at `position`
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        ConfigError::Syntax {
            position,
            message: message.into(),
        }
    }
}

/// Errors raised while assembling a design matrix
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DesignError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A design column holds NaN or an infinity
    #[error("Non-finite value in design column '{column}' (term '{term}') at row {row}")]
    NonFinite {
        column: String,
        term: String,
        row: usize,
    },
}

/// Result type for the data and formula layers
pub type Result<T> = std::result::Result<T, ConfigError>;
