//! Shared result types for fitted models
//!
//! Coefficient tables, goodness-of-fit statistics and the Student-t / F
//! tail probabilities used by every significance test.

pub use coefficient::Coefficient;
pub use distribution::{f_test, t_critical, t_two_sided_p_value};
pub use statistics::ModelStatistics;

pub use crate::error::ModelError;

pub mod coefficient;
pub mod distribution;
pub mod statistics;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;
