//! Linear models with categorical predictors
//!
//! Least squares fits over [`catlm_core`] design matrices, with
//! inestimable coefficients for rank-deficient designs, sequential
//! analysis of variance and single-term deletion tests.
//!
//! ```
//! use catlm_core::Dataset;
//! use catlm_models::anova::TermSignificanceTester;
//! use catlm_models::lm::lm;
//!
//! let data = Dataset::builder()
//!     .numeric("y", vec![1.1, 2.3, 2.9, 4.2, 5.1, 5.8, 7.2, 8.1])
//!     .unwrap()
//!     .numeric("x", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])
//!     .unwrap()
//!     .categorical("site", &["n", "s", "n", "s", "n", "s", "n", "s"])
//!     .unwrap()
//!     .build();
//!
//! let fit = lm("y ~ x + site", &data).unwrap();
//! assert_eq!(fit.column_names(), vec!["(Intercept)", "x", "sites"]);
//!
//! let table = TermSignificanceTester::default().test(&data, &fit).unwrap();
//! assert_eq!(table.rows.len(), 2);
//! ```

pub mod anova;
pub mod base;
pub mod error;
pub mod lm;

pub use anova::{AnovaDecomposer, AnovaTable, DropOneTable, TermSignificanceTester, compare_nested};
pub use base::{Coefficient, ModelStatistics, Result};
pub use error::ModelError;
pub use lm::{FittedModel, LeastSquaresSolver, LinearConfig, LinearRegression, RankDeficiencyPolicy, lm};
