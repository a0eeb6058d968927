//! Declared column kinds

use std::fmt;

use serde::{Deserialize, Serialize};

use super::*;

/// Kind of a variable, fixed when the variable is declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableKind {
    Numeric,
    Categorical,
}

impl VariableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Numeric => "numeric",
            VariableKind::Categorical => "categorical",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed column of a [`Dataset`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Column {
    /// Real-valued observations
    Numeric(FloatArray),
    /// Level labels of a categorical variable
    Categorical(Factor),
}

impl Column {
    /// Create a numeric column
    pub fn numeric(data: impl Into<FloatArray>) -> Self {
        Column::Numeric(data.into())
    }

    /// Create a categorical column with lexicographically ordered levels
    pub fn categorical<T: AsRef<str>>(labels: &[T]) -> Self {
        Column::Categorical(Factor::new(labels))
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        match self {
            Column::Numeric(arr) => arr.len(),
            Column::Categorical(factor) => factor.len(),
        }
    }

    /// Check if the column is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Declared kind
    pub fn kind(&self) -> VariableKind {
        match self {
            Column::Numeric(_) => VariableKind::Numeric,
            Column::Categorical(_) => VariableKind::Categorical,
        }
    }

    /// Numeric values, if this is a numeric column
    pub fn as_numeric(&self) -> Option<&FloatArray> {
        match self {
            Column::Numeric(arr) => Some(arr),
            Column::Categorical(_) => None,
        }
    }

    /// Factor, if this is a categorical column
    pub fn as_factor(&self) -> Option<&Factor> {
        match self {
            Column::Categorical(factor) => Some(factor),
            Column::Numeric(_) => None,
        }
    }
}

/// A named view of one dataset column
#[derive(Debug, Clone, Copy)]
pub struct Variable<'a> {
    name: &'a str,
    column: &'a Column,
}

impl<'a> Variable<'a> {
    pub fn new(name: &'a str, column: &'a Column) -> Self {
        Self { name, column }
    }

    pub fn name(&self) -> &'a str {
        self.name
    }

    pub fn column(&self) -> &'a Column {
        self.column
    }

    pub fn kind(&self) -> VariableKind {
        self.column.kind()
    }

    /// Numeric values, or a type mismatch naming this variable
    pub fn numeric(&self) -> Result<&'a FloatArray> {
        self.column
            .as_numeric()
            .ok_or_else(|| self.mismatch(VariableKind::Numeric))
    }

    /// Factor, or a type mismatch naming this variable
    pub fn factor(&self) -> Result<&'a Factor> {
        self.column
            .as_factor()
            .ok_or_else(|| self.mismatch(VariableKind::Categorical))
    }

    fn mismatch(&self, expected: VariableKind) -> ConfigError {
        ConfigError::TypeMismatch {
            variable: self.name.to_string(),
            expected: expected.as_str(),
            actual: self.kind().as_str(),
        }
    }
}
