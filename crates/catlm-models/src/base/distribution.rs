//! Student-t and F tail probabilities

use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

use crate::base::{ModelError, Result};

fn students_t(df: usize) -> Result<StudentsT> {
    if df == 0 {
        return Err(ModelError::distributional(
            "t-distribution needs at least one residual degree of freedom",
        ));
    }
    StudentsT::new(0.0, 1.0, df as f64)
        .map_err(|e| ModelError::distributional(format!("Failed to create t-distribution: {}", e)))
}

/// Two-sided p-value of a t-statistic
pub fn t_two_sided_p_value(t: f64, df: usize) -> Result<f64> {
    let dist = students_t(df)?;
    let p = 2.0 * dist.sf(t.abs());
    Ok(p.clamp(0.0, 1.0))
}

/// Quantile `1 - (1 - level) / 2` of the t-distribution
pub fn t_critical(level: f64, df: usize) -> Result<f64> {
    if !(level > 0.0 && level < 1.0) {
        return Err(ModelError::InvalidConfig {
            message: format!("confidence level must lie in (0, 1), got {}", level),
        });
    }
    let dist = students_t(df)?;
    Ok(dist.inverse_cdf(1.0 - (1.0 - level) / 2.0))
}

/// F-test of `sum_sq` on `df` degrees of freedom against a residual mean
/// square on `df_residual` degrees of freedom.
///
/// Returns `(F, p)`. Both are `None` when `df` is zero or when the
/// statistic is undefined (zero over zero).
pub fn f_test(
    sum_sq: f64,
    df: usize,
    residual_mean_sq: f64,
    df_residual: usize,
) -> Result<(Option<f64>, Option<f64>)> {
    if df_residual == 0 {
        return Err(ModelError::distributional(
            "F-test needs at least one residual degree of freedom",
        ));
    }
    if df == 0 {
        return Ok((None, None));
    }

    let mean_sq = sum_sq / df as f64;
    let f = mean_sq / residual_mean_sq;
    if f.is_nan() {
        return Ok((None, None));
    }
    if f.is_infinite() {
        return Ok((Some(f), Some(0.0)));
    }

    let dist = FisherSnedecor::new(df as f64, df_residual as f64)
        .map_err(|e| ModelError::distributional(format!("Failed to create F-distribution: {}", e)))?;
    Ok((Some(f), Some(dist.sf(f).clamp(0.0, 1.0))))
}
