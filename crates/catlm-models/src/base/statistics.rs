//! Goodness-of-fit statistics

use serde::{Deserialize, Serialize};

/// Model statistics
///
/// Fields that need residual degrees of freedom are `None` for a
/// saturated fit. Likelihood-based fields are `None` for an exact fit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStatistics {
    /// R-squared
    pub r_squared: Option<f64>,
    /// Adjusted R-squared
    pub adj_r_squared: Option<f64>,
    /// Residual standard error
    pub residual_std_error: Option<f64>,
    /// F-statistic against the constant-only (or empty) model
    pub f_statistic: Option<f64>,
    /// F-statistic p-value
    pub f_p_value: Option<f64>,
    /// Gaussian log-likelihood at the maximum likelihood variance
    pub log_likelihood: Option<f64>,
    /// AIC
    pub aic: Option<f64>,
    /// BIC
    pub bic: Option<f64>,
    /// Residual degrees of freedom
    pub df_residual: usize,
    /// Model degrees of freedom, not counting the intercept
    pub df_model: usize,
}
