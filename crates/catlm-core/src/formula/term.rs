//! Model terms
//!
//! A term is the intercept, the main effect of one variable, or the
//! interaction of two or more variables. Interactions compare equal
//! regardless of the order their variables are listed in.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A term in a linear model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Term {
    /// Constant column
    Intercept,
    /// Main effect of one variable
    Main(String),
    /// Elementwise product of the encodings of several variables
    Interaction(Vec<String>),
}

impl Term {
    /// Create a main effect term
    pub fn main(name: impl Into<String>) -> Self {
        Term::Main(name.into())
    }

    /// Create an interaction term
    pub fn interaction<S: AsRef<str>>(variables: &[S]) -> Self {
        Term::Interaction(variables.iter().map(|v| v.as_ref().to_string()).collect())
    }

    /// Build the term spanned by a set of variables: the intercept for no
    /// variables, a main effect for one, an interaction otherwise.
    pub fn from_variables<S: AsRef<str>>(variables: &[S]) -> Self {
        match variables {
            [] => Term::Intercept,
            [single] => Term::main(single.as_ref()),
            _ => Term::interaction(variables),
        }
    }

    /// Check if this is the intercept
    pub fn is_intercept(&self) -> bool {
        matches!(self, Term::Intercept)
    }

    /// Check if this is an interaction
    pub fn is_interaction(&self) -> bool {
        matches!(self, Term::Interaction(_))
    }

    /// Variables in declaration order
    pub fn variables(&self) -> Vec<&str> {
        match self {
            Term::Intercept => Vec::new(),
            Term::Main(name) => vec![name.as_str()],
            Term::Interaction(vars) => vars.iter().map(String::as_str).collect(),
        }
    }

    /// Number of variables in the term
    pub fn order(&self) -> usize {
        match self {
            Term::Intercept => 0,
            Term::Main(_) => 1,
            Term::Interaction(vars) => vars.len(),
        }
    }

    /// Sorted variable names, used for term identity
    pub fn key(&self) -> Vec<&str> {
        let mut vars = self.variables();
        vars.sort_unstable();
        vars
    }

    /// Check if the term involves `variable`
    pub fn involves(&self, variable: &str) -> bool {
        self.variables().contains(&variable)
    }

    /// The term with `variable` removed
    pub fn without_variable(&self, variable: &str) -> Term {
        let rest: Vec<&str> = self
            .variables()
            .into_iter()
            .filter(|v| *v != variable)
            .collect();
        Term::from_variables(&rest)
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Term {}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Intercept => write!(f, "(Intercept)"),
            Term::Main(name) => write!(f, "{}", name),
            Term::Interaction(vars) => write!(f, "{}", vars.join(":")),
        }
    }
}
