//! Nested model F-test

use serde::{Deserialize, Serialize};

use crate::base::{ModelError, Result, f_test};
use crate::lm::FittedModel;

/// F-test of a reduced model against a full model containing it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelComparison {
    /// Rank difference between the models
    pub df: usize,
    /// Increase in residual sum of squares from dropping the extra columns
    pub sum_sq: f64,
    pub rss_reduced: f64,
    pub rss_full: f64,
    /// Residual degrees of freedom of the full model
    pub df_residual: usize,
    /// `None` when `df` is zero
    pub f_statistic: Option<f64>,
    pub p_value: Option<f64>,
}

/// Compare `reduced` against `full`.
///
/// Both must be fitted to the same observations and `reduced` must not
/// have a larger rank. Nesting of the column spaces is the caller's
/// responsibility.
pub fn compare_nested(reduced: &FittedModel, full: &FittedModel) -> Result<ModelComparison> {
    if reduced.n_obs() != full.n_obs() {
        return Err(ModelError::DimensionMismatch {
            expected: format!("{} observations", full.n_obs()),
            actual: format!("{} observations", reduced.n_obs()),
        });
    }
    if reduced.rank() > full.rank() {
        return Err(ModelError::NotNested {
            message: format!(
                "'{}' (rank {}) is larger than '{}' (rank {})",
                reduced.formula(),
                reduced.rank(),
                full.formula(),
                full.rank()
            ),
        });
    }
    full.require_inference()?;

    let df = full.rank() - reduced.rank();
    // Rounding can leave a tiny negative difference for equal column spaces
    let sum_sq = (reduced.rss() - full.rss()).max(0.0);
    let (f_statistic, p_value) = f_test(sum_sq, df, full.sigma2()?, full.df_residual())?;

    Ok(ModelComparison {
        df,
        sum_sq,
        rss_reduced: reduced.rss(),
        rss_full: full.rss(),
        df_residual: full.df_residual(),
        f_statistic,
        p_value,
    })
}
