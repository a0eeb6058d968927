//! Fitted linear model

use ndarray::{Array1, Array2};
use serde::Serialize;

use crate::base::{Coefficient, ModelError, ModelStatistics, Result, t_critical};
use catlm_core::design::{DesignColumn, DesignOptions};
use catlm_core::formula::Formula;

/// Result of a least squares fit
///
/// Owns everything derived from one design/response pair. Coefficients
/// follow the design column order, including inestimable ones.
#[derive(Debug, Clone, Serialize)]
pub struct FittedModel {
    pub(crate) formula: Formula,
    pub(crate) options: DesignOptions,
    pub(crate) columns: Vec<DesignColumn>,
    pub(crate) coefficients: Vec<Coefficient>,
    /// Design columns with estimates, in order; covariance rows follow it
    pub(crate) accepted: Vec<usize>,
    pub(crate) response: Array1<f64>,
    pub(crate) fitted_values: Array1<f64>,
    pub(crate) residuals: Array1<f64>,
    pub(crate) rss: f64,
    pub(crate) tss: f64,
    /// RSS of the intercept-only model, or Σy² without an intercept
    pub(crate) null_rss: f64,
    pub(crate) rank: usize,
    pub(crate) df_residual: usize,
    pub(crate) sigma2: Option<f64>,
    pub(crate) covariance: Option<Array2<f64>>,
    pub(crate) confidence_level: f64,
    pub(crate) statistics: ModelStatistics,
}

impl FittedModel {
    /// Formula the model was fitted from
    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// Design options the model was fitted with
    pub fn options(&self) -> &DesignOptions {
        &self.options
    }

    /// Coefficient table in design column order
    pub fn coefficients(&self) -> &[Coefficient] {
        &self.coefficients
    }

    /// Look up a coefficient by design column name
    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }

    /// Estimates in design column order, `None` where inestimable
    pub fn estimates(&self) -> Vec<Option<f64>> {
        self.coefficients.iter().map(|c| c.estimate).collect()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Names of the inestimable coefficients
    pub fn inestimable(&self) -> Vec<&str> {
        self.coefficients
            .iter()
            .filter(|c| !c.is_estimable())
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn response(&self) -> &Array1<f64> {
        &self.response
    }

    pub fn fitted_values(&self) -> &Array1<f64> {
        &self.fitted_values
    }

    pub fn residuals(&self) -> &Array1<f64> {
        &self.residuals
    }

    /// Residual sum of squares
    pub fn rss(&self) -> f64 {
        self.rss
    }

    /// Total sum of squares around the mean
    pub fn tss(&self) -> f64 {
        self.tss
    }

    /// Total sum of squares the terms decompose: around the mean with an
    /// intercept, uncentered without
    pub fn null_rss(&self) -> f64 {
        self.null_rss
    }

    /// Numerical rank of the design
    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Number of observations
    pub fn n_obs(&self) -> usize {
        self.response.len()
    }

    /// Number of design columns
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn df_residual(&self) -> usize {
        self.df_residual
    }

    pub fn has_intercept(&self) -> bool {
        self.formula.has_intercept()
    }

    /// Goodness-of-fit statistics
    pub fn statistics(&self) -> &ModelStatistics {
        &self.statistics
    }

    pub fn r_squared(&self) -> Option<f64> {
        self.statistics.r_squared
    }

    /// Confidence level of the intervals in the coefficient table
    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Residual mean square RSS / df
    pub fn sigma2(&self) -> Result<f64> {
        self.sigma2.ok_or_else(|| self.no_residual_df())
    }

    /// Covariance of two estimable coefficients, by design column index
    pub fn covariance(&self, i: usize, j: usize) -> Result<Option<f64>> {
        let cov = self.covariance.as_ref().ok_or_else(|| self.no_residual_df())?;
        let a = self.accepted.iter().position(|&c| c == i);
        let b = self.accepted.iter().position(|&c| c == j);
        Ok(a.zip(b).map(|(a, b)| cov[(a, b)]))
    }

    /// Covariance matrix over the estimable coefficients, in design order
    pub fn covariance_matrix(&self) -> Result<&Array2<f64>> {
        self.covariance.as_ref().ok_or_else(|| self.no_residual_df())
    }

    /// Confidence intervals at `level` for every coefficient.
    ///
    /// Inestimable coefficients get `None`.
    pub fn confint(&self, level: f64) -> Result<Vec<(String, Option<(f64, f64)>)>> {
        self.require_inference()?;
        let t_crit = t_critical(level, self.df_residual)?;
        Ok(self
            .coefficients
            .iter()
            .map(|c| {
                let interval = c
                    .estimate
                    .zip(c.std_error)
                    .map(|(est, se)| (est - t_crit * se, est + t_crit * se));
                (c.name.clone(), interval)
            })
            .collect())
    }

    /// Fail unless residual degrees of freedom remain for inference
    pub fn require_inference(&self) -> Result<()> {
        match self.df_residual {
            0 => Err(self.no_residual_df()),
            _ => Ok(()),
        }
    }

    fn no_residual_df(&self) -> ModelError {
        ModelError::distributional(format!(
            "'{}' has no residual degrees of freedom (n = {}, rank = {})",
            self.formula,
            self.n_obs(),
            self.rank
        ))
    }
}
