//! Builder for declaring datasets

use indexmap::IndexMap;

use super::*;

/// Builder for creating a [`Dataset`] with explicitly typed columns
#[derive(Debug, Default)]
pub struct DatasetBuilder {
    columns: IndexMap<String, Column>,
    nrows: Option<usize>,
}

impl DatasetBuilder {
    /// Create a new DatasetBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column to the dataset
    pub fn with_column<S: Into<String>>(mut self, name: S, column: Column) -> Result<Self> {
        let name = name.into();

        if self.columns.contains_key(&name) {
            return Err(ConfigError::DuplicateVariable(name));
        }

        match self.nrows {
            Some(n) if column.len() != n => {
                return Err(ConfigError::LengthMismatch {
                    variable: name,
                    expected: n,
                    actual: column.len(),
                });
            }
            None => {
                self.nrows = Some(column.len());
            }
            _ => {}
        }

        self.columns.insert(name, column);
        Ok(self)
    }

    /// Declare a numeric variable
    pub fn numeric<S: Into<String>>(self, name: S, values: impl Into<FloatArray>) -> Result<Self> {
        self.with_column(name, Column::numeric(values))
    }

    /// Declare a categorical variable with lexicographic level order
    pub fn categorical<S: Into<String>, T: AsRef<str>>(self, name: S, labels: &[T]) -> Result<Self> {
        self.with_column(name, Column::categorical(labels))
    }

    /// Declare a categorical variable with an explicit level order
    pub fn categorical_with_levels<S, T, L>(self, name: S, labels: &[T], levels: &[L]) -> Result<Self>
    where
        S: Into<String>,
        T: AsRef<str>,
        L: AsRef<str>,
    {
        let name = name.into();
        let factor = Factor::with_levels(labels, levels)
            .map_err(|e| Factor::rename_unknown_level(e, &name))?;
        self.with_column(name, Column::Categorical(factor))
    }

    /// Declare a categorical variable from an existing factor
    pub fn factor<S: Into<String>>(self, name: S, factor: Factor) -> Result<Self> {
        self.with_column(name, Column::Categorical(factor))
    }

    /// Build the Dataset
    pub fn build(self) -> Dataset {
        Dataset {
            columns: self.columns,
            nrows: self.nrows.unwrap_or(0),
        }
    }
}
