//! Dataset of typed variables

use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use super::*;

/// An immutable collection of equally long, typed columns
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub(crate) columns: IndexMap<String, Column>,
    pub(crate) nrows: usize,
}

/// Record of a mean-centering transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centering {
    /// Centered variable
    pub variable: String,
    /// Mean that was subtracted
    pub mean: f64,
}

impl Dataset {
    /// Create an empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Start declaring a dataset column by column
    pub fn builder() -> DatasetBuilder {
        DatasetBuilder::new()
    }

    /// Number of observations
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of variables
    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    /// Variable names in declaration order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.keys().map(|k| k.as_str()).collect()
    }

    /// Get a column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Check if a variable is declared
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Look up a declared variable
    pub fn variable(&self, name: &str) -> Result<Variable<'_>> {
        self.columns
            .get_key_value(name)
            .map(|(key, column)| Variable::new(key.as_str(), column))
            .ok_or_else(|| ConfigError::unknown_variable(name, &self.column_names()))
    }

    /// Values of a numeric variable
    pub fn numeric(&self, name: &str) -> Result<&FloatArray> {
        self.variable(name)?.numeric()
    }

    /// A categorical variable
    pub fn factor(&self, name: &str) -> Result<&Factor> {
        self.variable(name)?.factor()
    }

    /// Replace an existing column, keeping its position.
    pub fn replace_column(&self, name: &str, column: Column) -> Result<Self> {
        if !self.has_column(name) {
            return Err(ConfigError::unknown_variable(name, &self.column_names()));
        }
        if column.len() != self.nrows {
            return Err(ConfigError::LengthMismatch {
                variable: name.to_string(),
                expected: self.nrows,
                actual: column.len(),
            });
        }

        let mut columns = self.columns.clone();
        columns.insert(name.to_string(), column);
        Ok(Self {
            columns,
            nrows: self.nrows,
        })
    }

    /// Subtract the mean from a numeric variable.
    ///
    /// Returns the transformed dataset and the subtracted mean.
    pub fn center(&self, name: &str) -> Result<(Self, Centering)> {
        let values = self.numeric(name)?;
        let mean = values.mean().unwrap_or(0.0);
        debug!("centering '{}' around {}", name, mean);

        let centered = self.replace_column(name, Column::Numeric(values.mapv(|v| v - mean)))?;
        Ok((
            centered,
            Centering {
                variable: name.to_string(),
                mean,
            },
        ))
    }

    /// Change the reference level of a categorical variable
    pub fn relevel(&self, name: &str, level: &str) -> Result<Self> {
        let factor = crate::encoding::FactorEncoder::relevel(self.variable(name)?, level)?;
        self.replace_column(name, Column::Categorical(factor))
    }
}
