//! Core data structures for catlm
//!
//! Typed datasets, factor encoding, ordered term lists and design matrices
//! for linear models with categorical predictors. Model fitting lives in
//! `catlm-models`.

pub mod data;
pub mod design;
pub mod encoding;
pub mod error;
pub mod formula;
pub mod linalg;

pub use data::{Centering, Column, Dataset, DatasetBuilder, Factor, Variable, VariableKind};
pub use design::{DesignColumn, DesignMatrix, DesignMatrixBuilder, DesignOptions};
pub use encoding::{Coding, EncodedFactor, FactorEncoder};
pub use error::{ConfigError, DesignError};
pub use formula::{Formula, Term};
pub use linalg::HouseholderQr;
