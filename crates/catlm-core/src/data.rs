//! Typed datasets for linear modelling
//!
//! Every variable is declared with its kind when it enters a [`Dataset`]:
//! either a numeric column or a categorical [`Factor`]. The kind is never
//! inferred from how the values look.

mod builder;
mod column;
mod dataset;
mod factor;


pub use builder::DatasetBuilder;
pub use column::{Column, Variable, VariableKind};
pub use dataset::{Centering, Dataset};
pub use factor::Factor;

pub use crate::error::{ConfigError, Result};

pub type FloatArray = ndarray::Array1<f64>;
pub type Matrix = ndarray::Array2<f64>;
