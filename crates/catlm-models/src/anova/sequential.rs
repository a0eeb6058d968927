//! Sequential (type I) sums of squares

use log::debug;
use serde::{Deserialize, Serialize};

use crate::anova::fit_all;
use crate::base::{Result, f_test};
use crate::lm::{FittedModel, LinearConfig};
use catlm_core::data::Dataset;
use catlm_core::formula::{Formula, Term};

/// One term of a sequential ANOVA table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaRow {
    pub term: Term,
    /// Rank added by the term
    pub df: usize,
    /// Reduction in RSS from adding the term
    pub sum_sq: f64,
    /// `None` when the term adds no rank
    pub mean_sq: Option<f64>,
    pub f_statistic: Option<f64>,
    pub p_value: Option<f64>,
}

/// Residual line of an ANOVA table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResidualRow {
    pub df: usize,
    pub sum_sq: f64,
    pub mean_sq: f64,
}

/// Sequential ANOVA table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaTable {
    /// Terms in the order they entered the model
    pub rows: Vec<AnovaRow>,
    pub residual: ResidualRow,
    /// Sum of squares decomposed by the table
    pub total_sum_sq: f64,
}

impl AnovaTable {
    /// Row of `term`, matched regardless of variable order
    pub fn row(&self, term: &Term) -> Option<&AnovaRow> {
        self.rows.iter().find(|r| &r.term == term)
    }

    /// Sum of the term sums of squares
    pub fn term_sum_sq(&self) -> f64 {
        self.rows.iter().map(|r| r.sum_sq).sum()
    }
}

/// Builds sequential ANOVA tables
#[derive(Debug, Clone, Default)]
pub struct AnovaDecomposer {
    config: LinearConfig,
}

impl AnovaDecomposer {
    pub fn new(config: LinearConfig) -> Self {
        Self { config }
    }

    /// Decompose the fit of `full` on `data` term by term.
    ///
    /// Model i contains the intercept (when `full` has one) and the first
    /// i effects. Each term's sum of squares is the RSS drop from model
    /// i - 1 to model i.
    pub fn decompose(&self, data: &Dataset, full: &FittedModel) -> Result<AnovaTable> {
        full.require_inference()?;

        let formula = full.formula();
        let effects = formula.effects();
        let k = effects.len();

        let reduced: Vec<Formula> = (0..k).map(|i| formula.prefix(i)).collect();
        let nested = fit_all(data, full, &reduced, &self.config)?;
        debug!("sequential anova for '{}': {} nested fits", formula, nested.len());

        let residual_ms = full.sigma2()?;
        let df_residual = full.df_residual();

        let mut rows = Vec::with_capacity(k);
        for (i, term) in effects.into_iter().enumerate() {
            let previous = &nested[i];
            let current = nested.get(i + 1).unwrap_or(full);

            let df = current.rank().saturating_sub(previous.rank());
            let sum_sq = (previous.rss() - current.rss()).max(0.0);
            let (f_statistic, p_value) = f_test(sum_sq, df, residual_ms, df_residual)?;

            rows.push(AnovaRow {
                term: term.clone(),
                df,
                sum_sq,
                mean_sq: (df > 0).then(|| sum_sq / df as f64),
                f_statistic,
                p_value,
            });
        }

        Ok(AnovaTable {
            rows,
            residual: ResidualRow {
                df: df_residual,
                sum_sq: full.rss(),
                mean_sq: residual_ms,
            },
            total_sum_sq: full.null_rss(),
        })
    }
}
