//! Ordinary least squares via Householder QR

use log::{debug, warn};
use ndarray::Array1;

use crate::base::{
    Coefficient, ModelError, ModelStatistics, Result, f_test, t_critical, t_two_sided_p_value,
};
use crate::lm::{FittedModel, LinearConfig, RankDeficiencyPolicy};
use catlm_core::data::Dataset;
use catlm_core::design::{DesignMatrix, DesignMatrixBuilder, DesignOptions};
use catlm_core::encoding::Coding;
use catlm_core::formula::Formula;

/// Least squares fit of a response on a prepared design matrix
#[derive(Debug, Clone, Default)]
pub struct LeastSquaresSolver {
    config: LinearConfig,
}

impl LeastSquaresSolver {
    pub fn new(config: LinearConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LinearConfig {
        &self.config
    }

    /// Fit `y` on `design`.
    ///
    /// Aliased columns get inestimable coefficients (or an error under
    /// [`RankDeficiencyPolicy::Fail`]). With no residual degrees of freedom
    /// the fit is still returned, without standard errors.
    pub fn fit(&self, design: &DesignMatrix, y: &Array1<f64>) -> Result<FittedModel> {
        self.config.validate()?;

        let formula = design.formula();
        let (n, p) = (design.nrows(), design.ncols());
        if n == 0 {
            return Err(ModelError::DimensionMismatch {
                expected: "at least one observation".to_string(),
                actual: "0".to_string(),
            });
        }
        if y.len() != n {
            return Err(ModelError::DimensionMismatch {
                expected: format!("response of length {}", n),
                actual: format!("length {}", y.len()),
            });
        }
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::numerical(
                format!("response '{}' is not finite at row {}", formula.response(), row),
                "fit",
            ));
        }

        let qr = design.qr();
        let rank = qr.rank();
        if rank < p {
            let aliased: Vec<String> = design.aliased_names().into_iter().map(String::from).collect();
            match self.config.rank_deficiency {
                RankDeficiencyPolicy::Fail => {
                    return Err(ModelError::RankDeficient {
                        rank,
                        ncols: p,
                        aliased,
                    });
                }
                RankDeficiencyPolicy::MarkInestimable => {
                    warn!("'{}': coefficients {:?} are inestimable", formula, aliased);
                }
            }
        }

        let condition = qr.condition_estimate();
        if condition > self.config.max_condition {
            return Err(ModelError::numerical(
                format!(
                    "design for '{}' is ill-conditioned: condition estimate {:.3e} exceeds {:.3e}",
                    formula, condition, self.config.max_condition
                ),
                "fit",
            ));
        }

        let beta = qr.solve(y);
        let residuals = qr.residuals(y);
        let fitted_values = y - &residuals;
        let rss = residuals.dot(&residuals);
        let df_residual = n - rank;

        let (sigma2, covariance) = if df_residual > 0 {
            let sigma2 = rss / df_residual as f64;
            (Some(sigma2), Some(qr.unscaled_covariance() * sigma2))
        } else {
            warn!(
                "'{}' leaves no residual degrees of freedom; inference is unavailable",
                formula
            );
            (None, None)
        };

        let critical = match sigma2 {
            Some(_) => Some(t_critical(self.config.confidence_level, df_residual)?),
            None => None,
        };

        let mut position = vec![None; p];
        for (a, &j) in qr.accepted().iter().enumerate() {
            position[j] = Some(a);
        }

        let mut coefficients = Vec::with_capacity(p);
        for (j, column) in design.columns().iter().enumerate() {
            let term = &formula.terms()[column.term];
            let mut coef = match position[j] {
                None => Coefficient::inestimable(&column.name, term.to_string()),
                Some(a) => {
                    let estimate = beta[a];
                    let mut coef = Coefficient::new(&column.name, term.to_string(), estimate);
                    if let (Some(cov), Some(t_crit)) = (&covariance, critical) {
                        let se = cov[(a, a)].max(0.0).sqrt();
                        coef = coef
                            .with_std_error(se)
                            .with_ci(estimate - t_crit * se, estimate + t_crit * se);
                        if se > 0.0 {
                            let t = estimate / se;
                            coef = coef
                                .with_t_stat(t)
                                .with_p_value(t_two_sided_p_value(t, df_residual)?);
                        }
                    }
                    coef
                }
            };
            if term.is_intercept() {
                coef = coef.as_intercept();
            }
            coefficients.push(coef);
        }

        let mean = y.sum() / n as f64;
        let tss = y.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
        let null_rss = if formula.has_intercept() { tss } else { y.dot(y) };
        let statistics = model_statistics(n, rank, formula.has_intercept(), rss, null_rss)?;

        debug!(
            "fitted '{}': n = {}, rank = {}, rss = {:.6e}",
            formula, n, rank, rss
        );

        Ok(FittedModel {
            formula: formula.clone(),
            options: design.options().clone(),
            columns: design.columns().to_vec(),
            coefficients,
            accepted: qr.accepted().to_vec(),
            response: y.clone(),
            fitted_values,
            residuals,
            rss,
            tss,
            null_rss,
            rank,
            df_residual,
            sigma2,
            covariance,
            confidence_level: self.config.confidence_level,
            statistics,
        })
    }
}

fn model_statistics(
    n: usize,
    rank: usize,
    has_intercept: bool,
    rss: f64,
    null_rss: f64,
) -> Result<ModelStatistics> {
    let df_residual = n - rank;
    let df_int = usize::from(has_intercept).min(rank);
    let df_model = rank - df_int;

    let mut stats = ModelStatistics {
        df_residual,
        df_model,
        ..ModelStatistics::default()
    };

    if null_rss > 0.0 {
        stats.r_squared = Some(1.0 - rss / null_rss);
    }
    if df_residual > 0 {
        let sigma2 = rss / df_residual as f64;
        stats.residual_std_error = Some(sigma2.sqrt());
        stats.adj_r_squared = stats
            .r_squared
            .map(|r2| 1.0 - (1.0 - r2) * ((n - df_int) as f64 / df_residual as f64));
        if df_model > 0 {
            let (f, p) = f_test((null_rss - rss).max(0.0), df_model, sigma2, df_residual)?;
            stats.f_statistic = f;
            stats.f_p_value = p;
        }
    }
    if rss > 0.0 {
        let n = n as f64;
        let ll = 0.5 * (-n * ((2.0 * std::f64::consts::PI).ln() + 1.0 - n.ln() + rss.ln()));
        let k = (rank + 1) as f64;
        stats.log_likelihood = Some(ll);
        stats.aic = Some(-2.0 * ll + 2.0 * k);
        stats.bic = Some(-2.0 * ll + n.ln() * k);
    }

    Ok(stats)
}

/// OLS linear regression model
///
/// ```
/// use catlm_core::Dataset;
/// use catlm_models::lm::LinearRegression;
///
/// let data = Dataset::builder()
///     .numeric("y", vec![1.0, 2.0, 4.0, 5.0])
///     .unwrap()
///     .categorical("g", &["a", "a", "b", "b"])
///     .unwrap()
///     .build();
/// let fit = LinearRegression::parse("y ~ g").unwrap().fit(&data).unwrap();
/// let slope = fit.coefficient("gb").and_then(|c| c.estimate).unwrap();
/// assert!((slope - 3.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct LinearRegression {
    formula: Formula,
    options: DesignOptions,
    config: LinearConfig,
}

impl LinearRegression {
    /// Create a new linear regression model
    pub fn new(formula: Formula) -> Self {
        Self {
            formula,
            options: DesignOptions::default(),
            config: LinearConfig::default(),
        }
    }

    /// Create a model from formula syntax such as `y ~ x * group`
    pub fn parse(formula: &str) -> Result<Self> {
        Ok(Self::new(Formula::parse(formula)?))
    }

    /// Set configuration
    pub fn config(mut self, config: LinearConfig) -> Self {
        self.config = config;
        self
    }

    /// Set design options
    pub fn options(mut self, options: DesignOptions) -> Self {
        self.options = options;
        self
    }

    /// Override the reference level of one factor
    pub fn reference(mut self, variable: impl Into<String>, level: impl Into<String>) -> Self {
        self.options = self.options.reference(variable, level);
        self
    }

    /// Override the coding of one factor
    pub fn coding(mut self, variable: impl Into<String>, coding: Coding) -> Self {
        self.options = self.options.coding(variable, coding);
        self
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// Fit the model to `data`
    pub fn fit(&self, data: &Dataset) -> Result<FittedModel> {
        let design = DesignMatrixBuilder::new(data, &self.formula)
            .options(self.options.clone())
            .build()?;
        let y = data.numeric(self.formula.response())?;
        LeastSquaresSolver::new(self.config.clone()).fit(&design, y)
    }
}
