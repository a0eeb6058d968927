//! Design matrix construction
//!
//! [`DesignMatrixBuilder`] resolves every term of a [`Formula`] into columns:
//!
//! - the intercept becomes a column of ones,
//! - a numeric main effect is the variable itself,
//! - a categorical main effect is its [`FactorEncoder`] output,
//! - an interaction is the elementwise product of every combination of
//!   its variables' columns (the first variable varies fastest).
//!
//! A factor inside a term is treatment coded when the term without that
//! factor is also in the model, and indicator coded otherwise. With an
//! intercept and all marginal terms present this is plain treatment coding;
//! without an intercept the first factor main effect gets one column per
//! level.
//!
//! A coding given in [`DesignOptions`] overrides this rule for one factor,
//! so `Coding::Indicator` with an intercept keeps every level's column.
//!
//! The builder never drops columns. Linear dependence is found with a
//! rank-revealing QR and reported as the list of columns that are
//! combinations of earlier ones.

use indexmap::IndexMap;
use log::{debug, warn};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::data::{Dataset, Matrix, VariableKind};
use crate::encoding::{Coding, FactorEncoder};
use crate::error::{ConfigError, DesignError};
use crate::formula::{Formula, Term};
use crate::linalg::{DEFAULT_RANK_TOLERANCE, HouseholderQr};


/// Name of the intercept column
pub const INTERCEPT: &str = "(Intercept)";

/// Options controlling design matrix assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignOptions {
    /// Reference level per categorical variable, overriding the factor's own
    pub references: IndexMap<String, String>,
    /// Coding per categorical variable, overriding the marginality rule
    pub codings: IndexMap<String, Coding>,
    /// Relative tolerance for declaring a column aliased
    pub rank_tolerance: f64,
}

impl Default for DesignOptions {
    fn default() -> Self {
        Self {
            references: IndexMap::new(),
            codings: IndexMap::new(),
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
        }
    }
}

impl DesignOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `level` as the reference level of `variable`
    pub fn reference(mut self, variable: impl Into<String>, level: impl Into<String>) -> Self {
        self.references.insert(variable.into(), level.into());
        self
    }

    /// Encode `variable` with `coding` in every term it appears in
    pub fn coding(mut self, variable: impl Into<String>, coding: Coding) -> Self {
        self.codings.insert(variable.into(), coding);
        self
    }

    /// Set the rank tolerance
    pub fn rank_tolerance(mut self, tolerance: f64) -> Self {
        self.rank_tolerance = tolerance;
        self
    }
}

/// One column of a design matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignColumn {
    /// Column label, e.g. `groupB` or `x:groupB`
    pub name: String,
    /// Index of the owning term in [`Formula::terms`]
    pub term: usize,
}

/// An n × p design matrix with its term tags and rank diagnostics
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    matrix: Matrix,
    columns: Vec<DesignColumn>,
    formula: Formula,
    options: DesignOptions,
    qr: HouseholderQr,
}

impl DesignMatrix {
    /// The n × p matrix
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }

    /// Column descriptors in matrix order
    pub fn columns(&self) -> &[DesignColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Formula the matrix was built from
    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    /// Options the matrix was built with
    pub fn options(&self) -> &DesignOptions {
        &self.options
    }

    /// Numerical rank
    pub fn rank(&self) -> usize {
        self.qr.rank()
    }

    pub fn is_rank_deficient(&self) -> bool {
        self.rank() < self.ncols()
    }

    /// Indices of the columns that are linear combinations of earlier columns
    pub fn aliased(&self) -> &[usize] {
        self.qr.aliased()
    }

    /// Names of the aliased columns
    pub fn aliased_names(&self) -> Vec<&str> {
        self.aliased()
            .iter()
            .map(|&j| self.columns[j].name.as_str())
            .collect()
    }

    /// Columns belonging to term `term`
    pub fn term_columns(&self, term: usize) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.term == term)
            .map(|(j, _)| j)
            .collect()
    }

    /// QR factorization of the matrix
    pub fn qr(&self) -> &HouseholderQr {
        &self.qr
    }
}

/// Builder resolving a formula against a dataset
pub struct DesignMatrixBuilder<'a> {
    data: &'a Dataset,
    formula: &'a Formula,
    options: DesignOptions,
}

/// Columns contributed by one variable inside a term
struct Block {
    names: Vec<String>,
    columns: Vec<Array1<f64>>,
}

impl<'a> DesignMatrixBuilder<'a> {
    pub fn new(data: &'a Dataset, formula: &'a Formula) -> Self {
        Self {
            data,
            formula,
            options: DesignOptions::default(),
        }
    }

    /// Replace all options
    pub fn options(mut self, options: DesignOptions) -> Self {
        self.options = options;
        self
    }

    /// Override the reference level of one factor
    pub fn reference(mut self, variable: impl Into<String>, level: impl Into<String>) -> Self {
        self.options = self.options.reference(variable, level);
        self
    }

    /// Override the coding of one factor
    pub fn coding(mut self, variable: impl Into<String>, coding: Coding) -> Self {
        self.options = self.options.coding(variable, coding);
        self
    }

    /// Set the relative rank tolerance
    pub fn rank_tolerance(mut self, tolerance: f64) -> Self {
        self.options = self.options.rank_tolerance(tolerance);
        self
    }

    /// Assemble the design matrix and compute its rank
    pub fn build(self) -> Result<DesignMatrix, DesignError> {
        self.formula.validate(self.data)?;
        for (variable, level) in &self.options.references {
            FactorEncoder::relevel(self.data.variable(variable)?, level)?;
        }
        for variable in self.options.codings.keys() {
            self.data.factor(variable)?;
        }

        let n = self.data.nrows();
        let mut names = Vec::new();
        let mut tags = Vec::new();
        let mut columns: Vec<Array1<f64>> = Vec::new();

        // A constant is in the column space once there is an intercept or a
        // factor main effect with one column per level
        let mut has_constant = self.formula.has_intercept();

        for (term_idx, term) in self.formula.terms().iter().enumerate() {
            if term.is_intercept() {
                names.push(INTERCEPT.to_string());
                tags.push(term_idx);
                columns.push(Array1::ones(n));
                continue;
            }

            let mut blocks = Vec::new();
            let mut full_factor_main = false;
            for variable in term.variables() {
                let (block, treatment) = self.resolve(term, variable, has_constant)?;
                if !treatment && matches!(term, Term::Main(_)) {
                    full_factor_main = true;
                }
                blocks.push(block);
            }
            if full_factor_main {
                has_constant = true;
            }

            for (name, column) in cross(&blocks) {
                names.push(name);
                tags.push(term_idx);
                columns.push(column);
            }
        }

        let mut matrix = Array2::zeros((n, columns.len()));
        for (j, column) in columns.iter().enumerate() {
            if let Some(row) = column.iter().position(|v| !v.is_finite()) {
                return Err(DesignError::NonFinite {
                    column: names[j].clone(),
                    term: self.formula.terms()[tags[j]].to_string(),
                    row,
                });
            }
            matrix.column_mut(j).assign(column);
        }

        let qr = HouseholderQr::decompose(&matrix, self.options.rank_tolerance);
        let columns: Vec<DesignColumn> = names
            .into_iter()
            .zip(tags)
            .map(|(name, term)| DesignColumn { name, term })
            .collect();

        debug!(
            "design for '{}': {} x {} with rank {}",
            self.formula,
            n,
            columns.len(),
            qr.rank()
        );
        if !qr.aliased().is_empty() {
            let aliased: Vec<&str> = qr.aliased().iter().map(|&j| columns[j].name.as_str()).collect();
            warn!(
                "design for '{}' is rank deficient ({} of {}); aliased columns: {:?}",
                self.formula,
                qr.rank(),
                columns.len(),
                aliased
            );
        }

        Ok(DesignMatrix {
            matrix,
            columns,
            formula: self.formula.clone(),
            options: self.options,
            qr,
        })
    }

    /// Columns of `variable` within `term`, and whether a factor dropped
    /// its reference column (`true` for numeric variables)
    fn resolve(&self, term: &Term, variable: &str, has_constant: bool) -> Result<(Block, bool), ConfigError> {
        let var = self.data.variable(variable)?;
        match var.kind() {
            VariableKind::Numeric => Ok((
                Block {
                    names: vec![variable.to_string()],
                    columns: vec![var.numeric()?.clone()],
                },
                true,
            )),
            VariableKind::Categorical => {
                let margin = term.without_variable(variable);
                let margin_present = if margin.is_intercept() {
                    has_constant
                } else {
                    self.formula.contains(&margin)
                };
                let coding = match self.options.codings.get(variable) {
                    Some(&coding) => coding,
                    None if margin_present => Coding::Treatment,
                    None => Coding::Indicator,
                };

                let reference = self.options.references.get(variable).map(String::as_str);
                let encoded = FactorEncoder::encode_with(var, coding, reference)?;
                if encoded.is_degenerate() {
                    return Err(ConfigError::DegenerateFactor {
                        variable: variable.to_string(),
                        levels: encoded.level_order,
                    });
                }

                let names = encoded
                    .column_levels
                    .iter()
                    .map(|level| format!("{}{}", variable, level))
                    .collect();
                let columns = encoded.columns.columns().into_iter().map(|c| c.to_owned()).collect();
                Ok((Block { names, columns }, coding == Coding::Treatment))
            }
        }
    }
}

/// Elementwise products of one column from each block, first block fastest
fn cross(blocks: &[Block]) -> Vec<(String, Array1<f64>)> {
    let mut out: Vec<(String, Array1<f64>)> = Vec::new();
    for (b, block) in blocks.iter().enumerate() {
        if b == 0 {
            out = block
                .names
                .iter()
                .cloned()
                .zip(block.columns.iter().cloned())
                .collect();
            continue;
        }
        let mut next = Vec::with_capacity(out.len() * block.columns.len());
        for (name, column) in block.names.iter().zip(&block.columns) {
            for (prev_name, prev) in &out {
                next.push((format!("{}:{}", prev_name, name), prev * column));
            }
        }
        out = next;
    }
    out
}
