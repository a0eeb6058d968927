//! Factor encoding
//!
//! [`FactorEncoder`] turns a categorical variable into 0/1 indicator columns.
//! Under treatment coding the reference level is suppressed, so a factor
//! with L observed levels yields L - 1 columns and the reference level's mean
//! is carried by the intercept. Indicator coding keeps all L columns and is
//! used where no constant column is available to absorb the reference.
//!
//! Levels that never occur in the data are not part of the active level set
//! and get no column under either coding.

use log::warn;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::data::{ConfigError, Factor, Matrix, Result, Variable};

/// Contrast scheme used to encode a factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Coding {
    /// One indicator per non-reference level
    #[default]
    Treatment,
    /// One indicator per level
    Indicator,
}

/// Indicator columns of one factor
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFactor {
    /// n × k indicator matrix
    pub columns: Matrix,
    /// Active (observed) levels in level order
    pub level_order: Vec<String>,
    /// Suppressed level; `None` under indicator coding
    pub reference: Option<String>,
    /// Level marked by each column
    pub column_levels: Vec<String>,
    /// Coding that produced the columns
    pub coding: Coding,
}

impl EncodedFactor {
    /// Number of indicator columns
    pub fn ncols(&self) -> usize {
        self.columns.ncols()
    }

    /// A factor with fewer than two observed levels carries no contrast
    pub fn is_degenerate(&self) -> bool {
        self.level_order.len() < 2
    }
}

/// Encoder for categorical variables
pub struct FactorEncoder;

impl FactorEncoder {
    /// Treatment-code a factor.
    ///
    /// `reference_override` replaces the factor's own reference level and
    /// has to name an observed level.
    pub fn encode(variable: Variable<'_>, reference_override: Option<&str>) -> Result<EncodedFactor> {
        Self::encode_with(variable, Coding::Treatment, reference_override)
    }

    /// Encode a factor with an explicit coding
    pub fn encode_with(
        variable: Variable<'_>,
        coding: Coding,
        reference_override: Option<&str>,
    ) -> Result<EncodedFactor> {
        let factor = variable.factor()?;
        let active = factor.observed_levels();
        let reference = Self::resolve_reference(variable.name(), factor, &active, reference_override)?;

        let column_levels: Vec<String> = match coding {
            Coding::Treatment => active
                .iter()
                .filter(|level| Some(**level) != reference)
                .map(|level| level.to_string())
                .collect(),
            Coding::Indicator => active.iter().map(|level| level.to_string()).collect(),
        };

        let mut columns = Array2::zeros((factor.len(), column_levels.len()));
        for (j, level) in column_levels.iter().enumerate() {
            // Active levels are declared levels
            let code = factor.level_index(level).unwrap_or_default() as u32;
            for (i, &c) in factor.codes().iter().enumerate() {
                if c == code {
                    columns[(i, j)] = 1.0;
                }
            }
        }

        Ok(EncodedFactor {
            columns,
            level_order: active.iter().map(|level| level.to_string()).collect(),
            reference: match coding {
                Coding::Treatment => reference.map(str::to_string),
                Coding::Indicator => None,
            },
            column_levels,
            coding,
        })
    }

    /// Same observations, different suppressed level
    pub fn relevel(variable: Variable<'_>, new_reference: &str) -> Result<Factor> {
        let factor = variable.factor()?;
        factor
            .with_reference(new_reference)
            .ok_or_else(|| ConfigError::UnknownLevel {
                variable: variable.name().to_string(),
                level: new_reference.to_string(),
                available: factor
                    .observed_levels()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            })
    }

    fn resolve_reference<'f>(
        name: &str,
        factor: &'f Factor,
        active: &[&'f str],
        reference_override: Option<&str>,
    ) -> Result<Option<&'f str>> {
        if let Some(level) = reference_override {
            return active
                .iter()
                .find(|l| **l == level)
                .copied()
                .map(Some)
                .ok_or_else(|| ConfigError::UnknownLevel {
                    variable: name.to_string(),
                    level: level.to_string(),
                    available: active.iter().map(|l| l.to_string()).collect(),
                });
        }

        let declared = factor.reference_level();
        match active.iter().find(|l| **l == declared) {
            Some(level) => Ok(Some(*level)),
            None => {
                let fallback = active.first().copied();
                if let Some(level) = fallback {
                    warn!(
                        "reference level '{}' of '{}' is unobserved, using '{}'",
                        declared, name, level
                    );
                }
                Ok(fallback)
            }
        }
    }
}
