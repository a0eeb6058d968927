//! Analysis of variance for fitted linear models
//!
//! - [`AnovaDecomposer`]: sequential sums of squares over the nested
//!   models obtained by adding terms in declaration order
//! - [`TermSignificanceTester`]: single-term deletion F-tests, independent
//!   of declaration order
//! - [`compare_nested`]: F-test of any reduced model against a full one

pub mod comparison;
pub mod drop1;
pub mod sequential;

#[cfg(test)]
mod tests;

pub use comparison::{ModelComparison, compare_nested};
pub use drop1::{DropOneRow, DropOneTable, TermSignificanceTester};
pub use sequential::{AnovaDecomposer, AnovaRow, AnovaTable, ResidualRow};

use rayon::prelude::*;

use crate::base::{ModelError, Result};
use crate::lm::{FittedModel, LinearConfig, LinearRegression};
use catlm_core::data::Dataset;
use catlm_core::formula::Formula;

/// Fit every formula with the options of `full`, keeping input order
pub(crate) fn fit_all(
    data: &Dataset,
    full: &FittedModel,
    formulas: &[Formula],
    config: &LinearConfig,
) -> Result<Vec<FittedModel>> {
    if data.nrows() != full.n_obs() {
        return Err(ModelError::DimensionMismatch {
            expected: format!("{} observations", full.n_obs()),
            actual: format!("{} observations", data.nrows()),
        });
    }

    let fit = |formula: &Formula| {
        LinearRegression::new(formula.clone())
            .options(full.options().clone())
            .config(config.clone())
            .fit(data)
    };

    if config.parallel {
        formulas.par_iter().map(fit).collect()
    } else {
        formulas.iter().map(fit).collect()
    }
}
