//! Single-term deletion tests

use log::debug;
use serde::{Deserialize, Serialize};

use crate::anova::{compare_nested, fit_all};
use crate::base::Result;
use crate::lm::{FittedModel, LinearConfig};
use catlm_core::data::Dataset;
use catlm_core::formula::{Formula, Term};

/// Effect of deleting one term from the full model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropOneRow {
    pub term: Term,
    /// Rank lost by deleting the term
    pub df: usize,
    /// Increase in RSS from deleting the term
    pub sum_sq: f64,
    /// RSS of the reduced model
    pub rss: f64,
    /// `n ln(RSS / n) + 2 rank` of the reduced model
    pub aic: f64,
    /// `None` when the deletion removes no rank
    pub f_statistic: Option<f64>,
    pub p_value: Option<f64>,
}

/// Drop-one table for a full model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropOneTable {
    /// One row per non-intercept term, in the full model's term order
    pub rows: Vec<DropOneRow>,
    /// RSS of the full model
    pub rss: f64,
    /// AIC of the full model on the same scale as the rows
    pub aic: f64,
    pub df_residual: usize,
}

impl DropOneTable {
    /// Row of `term`, matched regardless of variable order
    pub fn row(&self, term: &Term) -> Option<&DropOneRow> {
        self.rows.iter().find(|r| &r.term == term)
    }
}

/// Runs single-term deletion F-tests against one full model
#[derive(Debug, Clone, Default)]
pub struct TermSignificanceTester {
    config: LinearConfig,
}

impl TermSignificanceTester {
    pub fn new(config: LinearConfig) -> Self {
        Self { config }
    }

    /// Test every non-intercept term of `full` by refitting without it
    pub fn test(&self, data: &Dataset, full: &FittedModel) -> Result<DropOneTable> {
        full.require_inference()?;

        let formula = full.formula();
        let effects = formula.effects();
        let reduced: Vec<Formula> = effects.iter().map(|t| formula.without(t)).collect();
        let fits = fit_all(data, full, &reduced, &self.config)?;
        debug!("drop-one tests for '{}': {} reduced fits", formula, fits.len());

        let n = full.n_obs();
        let mut rows = Vec::with_capacity(effects.len());
        for (term, reduced) in effects.into_iter().zip(&fits) {
            let comparison = compare_nested(reduced, full)?;
            rows.push(DropOneRow {
                term: term.clone(),
                df: comparison.df,
                sum_sq: comparison.sum_sq,
                rss: reduced.rss(),
                aic: extract_aic(n, reduced.rss(), reduced.rank()),
                f_statistic: comparison.f_statistic,
                p_value: comparison.p_value,
            });
        }

        Ok(DropOneTable {
            rows,
            rss: full.rss(),
            aic: extract_aic(n, full.rss(), full.rank()),
            df_residual: full.df_residual(),
        })
    }
}

fn extract_aic(n: usize, rss: f64, rank: usize) -> f64 {
    let n = n as f64;
    n * (rss / n).ln() + 2.0 * rank as f64
}
