//! Categorical variables stored as level codes

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::*;

/// A categorical variable: one level code per observation, an ordered level
/// set, and the index of the reference level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    codes: Vec<u32>,
    levels: Vec<String>,
    reference: usize,
}

impl Factor {
    /// Create a factor whose levels are the distinct labels in lexicographic
    /// order. The first of them is the reference level.
    pub fn new<T: AsRef<str>>(labels: &[T]) -> Self {
        let levels: Vec<String> = labels
            .iter()
            .map(|s| s.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        // Every label is in `levels` by construction
        let codes = labels
            .iter()
            .map(|s| {
                levels
                    .binary_search_by(|level| level.as_str().cmp(s.as_ref()))
                    .unwrap_or_default() as u32
            })
            .collect();

        Self {
            codes,
            levels,
            reference: 0,
        }
    }

    /// Create a factor with an explicitly declared level order.
    ///
    /// Declared levels may be unobserved; every label has to be one of them.
    pub fn with_levels<T: AsRef<str>, L: AsRef<str>>(labels: &[T], levels: &[L]) -> Result<Self> {
        let levels: Vec<String> = levels.iter().map(|l| l.as_ref().to_string()).collect();

        let mut seen = BTreeSet::new();
        for level in &levels {
            if !seen.insert(level.as_str()) {
                return Err(ConfigError::malformed(format!(
                    "level '{}' declared more than once",
                    level
                )));
            }
        }

        let mut codes = Vec::with_capacity(labels.len());
        for label in labels {
            let label = label.as_ref();
            let code = levels.iter().position(|l| l == label).ok_or_else(|| {
                ConfigError::UnknownLevel {
                    variable: String::new(),
                    level: label.to_string(),
                    available: levels.clone(),
                }
            })?;
            codes.push(code as u32);
        }

        Ok(Self {
            codes,
            levels,
            reference: 0,
        })
    }

    /// Number of observations
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Check if the factor has no observations
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// All declared levels, in level order
    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    /// Level code of every observation
    pub fn codes(&self) -> &[u32] {
        &self.codes
    }

    /// Index of the reference level in [`Factor::levels`]
    pub fn reference_index(&self) -> usize {
        self.reference
    }

    /// Label of the reference level
    pub fn reference_level(&self) -> &str {
        &self.levels[self.reference]
    }

    /// Label of observation `i`
    pub fn label(&self, i: usize) -> Option<&str> {
        self.codes
            .get(i)
            .and_then(|&code| self.levels.get(code as usize))
            .map(String::as_str)
    }

    /// Position of `level` in the level order
    pub fn level_index(&self, level: &str) -> Option<usize> {
        self.levels.iter().position(|l| l == level)
    }

    /// Occurrence count of each declared level
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.levels.len()];
        for &code in &self.codes {
            counts[code as usize] += 1;
        }
        counts
    }

    /// Levels that occur at least once, in level order
    pub fn observed_levels(&self) -> Vec<&str> {
        self.levels
            .iter()
            .zip(self.counts())
            .filter(|(_, count)| *count > 0)
            .map(|(level, _)| level.as_str())
            .collect()
    }

    /// Check whether `level` occurs in the data
    pub fn is_observed(&self, level: &str) -> bool {
        self.level_index(level)
            .is_some_and(|idx| self.codes.iter().any(|&code| code as usize == idx))
    }

    /// Same observations with a different reference level.
    ///
    /// Returns `None` when `level` is not observed.
    pub fn with_reference(&self, level: &str) -> Option<Self> {
        if !self.is_observed(level) {
            return None;
        }
        let reference = self.level_index(level)?;
        Some(Self {
            codes: self.codes.clone(),
            levels: self.levels.clone(),
            reference,
        })
    }

    pub(crate) fn rename_unknown_level(err: ConfigError, variable: &str) -> ConfigError {
        match err {
            ConfigError::UnknownLevel {
                level, available, ..
            } => ConfigError::UnknownLevel {
                variable: variable.to_string(),
                level,
                available,
            },
            other => other,
        }
    }
}
