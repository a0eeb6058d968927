//! Linear models
//!
//! Ordinary least squares over a [`DesignMatrix`](catlm_core::DesignMatrix).
//! Rank-deficient designs are fitted on their estimable columns and the
//! remaining coefficients are reported as inestimable.

pub mod ols;
pub mod result;

#[cfg(test)]
mod tests;

pub use ols::{LeastSquaresSolver, LinearRegression};
pub use result::FittedModel;

use serde::{Deserialize, Serialize};

use crate::base::{ModelError, Result};
use catlm_core::data::Dataset;

/// What to do when the design has aliased columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RankDeficiencyPolicy {
    /// Fit the estimable columns, mark the rest inestimable
    #[default]
    MarkInestimable,
    /// Refuse to fit
    Fail,
}

/// Linear model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    /// Confidence level for intervals
    pub confidence_level: f64,
    /// Largest acceptable condition estimate of the estimable columns
    pub max_condition: f64,
    /// Handling of aliased design columns
    pub rank_deficiency: RankDeficiencyPolicy,
    /// Fit the models of a decomposition on the rayon pool
    pub parallel: bool,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            max_condition: 1e10,
            rank_deficiency: RankDeficiencyPolicy::MarkInestimable,
            parallel: true,
        }
    }
}

impl LinearConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ModelError::InvalidConfig {
                message: format!(
                    "confidence_level must lie in (0, 1), got {}",
                    self.confidence_level
                ),
            });
        }
        if !(self.max_condition >= 1.0) {
            return Err(ModelError::InvalidConfig {
                message: format!("max_condition must be at least 1, got {}", self.max_condition),
            });
        }
        Ok(())
    }
}

/// Convenience function for OLS regression
pub fn lm(formula: &str, data: &Dataset) -> Result<FittedModel> {
    LinearRegression::parse(formula)?.fit(data)
}
