//! Coefficient definition

use serde::{Deserialize, Serialize};

/// Coefficient estimate with statistics
///
/// An inestimable coefficient (its design column is aliased) keeps its
/// place in the table with `estimate == None` and no inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    /// Design column name
    pub name: String,
    /// Label of the owning term
    pub term: String,
    /// Coefficient estimate, `None` when inestimable
    pub estimate: Option<f64>,
    /// Standard error
    pub std_error: Option<f64>,
    /// t-statistic
    pub t_stat: Option<f64>,
    /// Two-sided p-value
    pub p_value: Option<f64>,
    /// Lower bound of confidence interval
    pub ci_lower: Option<f64>,
    /// Upper bound of confidence interval
    pub ci_upper: Option<f64>,
    /// Is this the intercept?
    pub is_intercept: bool,
}

impl Coefficient {
    /// Create an estimated coefficient
    pub fn new(name: impl Into<String>, term: impl Into<String>, estimate: f64) -> Self {
        Self {
            name: name.into(),
            term: term.into(),
            estimate: Some(estimate),
            std_error: None,
            t_stat: None,
            p_value: None,
            ci_lower: None,
            ci_upper: None,
            is_intercept: false,
        }
    }

    /// Create a coefficient the data cannot identify
    pub fn inestimable(name: impl Into<String>, term: impl Into<String>) -> Self {
        Self {
            estimate: None,
            ..Self::new(name, term, 0.0)
        }
    }

    /// Set standard error
    pub fn with_std_error(mut self, se: f64) -> Self {
        self.std_error = Some(se);
        self
    }

    /// Set t-statistic
    pub fn with_t_stat(mut self, t: f64) -> Self {
        self.t_stat = Some(t);
        self
    }

    /// Set p-value
    pub fn with_p_value(mut self, p: f64) -> Self {
        self.p_value = Some(p);
        self
    }

    /// Set confidence interval
    pub fn with_ci(mut self, lower: f64, upper: f64) -> Self {
        self.ci_lower = Some(lower);
        self.ci_upper = Some(upper);
        self
    }

    /// Mark as intercept
    pub fn as_intercept(mut self) -> Self {
        self.is_intercept = true;
        self
    }

    pub fn is_estimable(&self) -> bool {
        self.estimate.is_some()
    }
}
