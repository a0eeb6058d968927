//! Ordered term lists
//!
//! A [`Formula`] names the response and lists the model terms in the order
//! they enter the model. It is built programmatically with named
//! operations, or parsed from the familiar `y ~ a * b - 1` notation.
//!
//! ```
//! use catlm_core::formula::Formula;
//!
//! let formula = Formula::new("weight").main("height").main("sex").interaction(&["height", "sex"]);
//! assert_eq!(formula.to_string(), "weight ~ height + sex + height:sex");
//! assert_eq!(Formula::parse("weight ~ height * sex").unwrap(), formula);
//! ```

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::{Dataset, VariableKind};
use crate::error::{ConfigError, Result};

mod parser;
mod term;


pub use parser::FormulaParser;
pub use term::Term;

/// Response plus an ordered list of terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    response: String,
    /// Terms in model order; the intercept, when present, is first
    terms: Vec<Term>,
}

impl Formula {
    /// Intercept-only model for `response`
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            terms: vec![Term::Intercept],
        }
    }

    /// Parse a formula from a string
    pub fn parse(formula: &str) -> Result<Self> {
        FormulaParser::parse(formula)
    }

    /// Add a main effect
    pub fn main(self, name: impl Into<String>) -> Self {
        self.term(Term::main(name))
    }

    /// Add an interaction between `variables`
    pub fn interaction<S: AsRef<str>>(self, variables: &[S]) -> Self {
        self.term(Term::interaction(variables))
    }

    /// Add every main effect and interaction of `variables`, lower orders
    /// first (`a * b` is `a + b + a:b`)
    pub fn cross<S: AsRef<str>>(mut self, variables: &[S]) -> Self {
        let vars: Vec<&str> = variables.iter().map(AsRef::as_ref).collect();
        for size in 1..=vars.len() {
            for combo in combinations(&vars, size) {
                self = self.term(Term::from_variables(&combo));
            }
        }
        self
    }

    /// Add a term. Adding a term that is already present is a no-op.
    pub fn term(mut self, term: Term) -> Self {
        if term.is_intercept() {
            return self.with_intercept();
        }
        if !self.terms.contains(&term) {
            self.terms.push(term);
        }
        self
    }

    /// Remove a term if present
    pub fn remove(mut self, term: &Term) -> Self {
        self.terms.retain(|t| t != term);
        self
    }

    /// Remove the intercept
    pub fn no_intercept(self) -> Self {
        self.remove(&Term::Intercept)
    }

    /// Restore the intercept as the first term
    pub fn with_intercept(mut self) -> Self {
        if !self.has_intercept() {
            self.terms.insert(0, Term::Intercept);
        }
        self
    }

    /// Copy of this formula without `term`
    pub fn without(&self, term: &Term) -> Self {
        self.clone().remove(term)
    }

    /// Copy keeping the intercept (if any) and the first `k` non-intercept terms
    pub fn prefix(&self, k: usize) -> Self {
        let mut terms = Vec::with_capacity(k + 1);
        if self.has_intercept() {
            terms.push(Term::Intercept);
        }
        terms.extend(self.effects().into_iter().take(k).cloned());
        Self {
            response: self.response.clone(),
            terms,
        }
    }

    /// Copy with the non-intercept terms rearranged.
    ///
    /// `order[i]` is the current position of the term that should come i-th.
    pub fn with_effect_order(&self, order: &[usize]) -> Result<Self> {
        let effects = self.effects();
        let mut seen = vec![false; effects.len()];
        if order.len() != effects.len() {
            return Err(ConfigError::malformed(format!(
                "term order lists {} positions for {} terms",
                order.len(),
                effects.len()
            )));
        }
        for &idx in order {
            if idx >= effects.len() || std::mem::replace(&mut seen[idx], true) {
                return Err(ConfigError::malformed(format!(
                    "term order {:?} is not a permutation",
                    order
                )));
            }
        }

        let mut terms = Vec::with_capacity(self.terms.len());
        if self.has_intercept() {
            terms.push(Term::Intercept);
        }
        terms.extend(order.iter().map(|&idx| effects[idx].clone()));
        Ok(Self {
            response: self.response.clone(),
            terms,
        })
    }

    /// Name of the response variable
    pub fn response(&self) -> &str {
        &self.response
    }

    /// All terms in model order
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Non-intercept terms in model order
    pub fn effects(&self) -> Vec<&Term> {
        self.terms.iter().filter(|t| !t.is_intercept()).collect()
    }

    /// Check if the model has an intercept
    pub fn has_intercept(&self) -> bool {
        self.terms.iter().any(Term::is_intercept)
    }

    /// Check if `term` is part of the model
    pub fn contains(&self, term: &Term) -> bool {
        self.terms.contains(term)
    }

    /// Predictor variables in order of first appearance
    pub fn variables(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.terms
            .iter()
            .flat_map(|t| t.variables())
            .filter(|v| seen.insert(*v))
            .collect()
    }

    /// Check every term against the dataset's declared variables
    pub fn validate(&self, data: &Dataset) -> Result<()> {
        let response = data.variable(&self.response)?;
        if response.kind() != VariableKind::Numeric {
            return Err(ConfigError::TypeMismatch {
                variable: self.response.clone(),
                expected: VariableKind::Numeric.as_str(),
                actual: response.kind().as_str(),
            });
        }

        for term in &self.terms {
            let vars = term.variables();
            if term.is_interaction() {
                if vars.len() < 2 {
                    return Err(ConfigError::malformed(format!(
                        "interaction '{}' needs at least two variables",
                        term
                    )));
                }
                let distinct: HashSet<&str> = vars.iter().copied().collect();
                if distinct.len() != vars.len() {
                    return Err(ConfigError::malformed(format!(
                        "interaction '{}' repeats a variable",
                        term
                    )));
                }
            }
            for var in vars {
                if var == self.response {
                    return Err(ConfigError::malformed(format!(
                        "response '{}' cannot appear in term '{}'",
                        var, term
                    )));
                }
                data.variable(var)?;
            }
        }

        Ok(())
    }
}

/// Subsets of `items` of the given size, in lexicographic position order
fn combinations<'a>(items: &[&'a str], size: usize) -> Vec<Vec<&'a str>> {
    if size == 0 {
        return vec![Vec::new()];
    }
    let mut result = Vec::new();
    for (i, item) in items.iter().enumerate() {
        for mut rest in combinations(&items[i + 1..], size - 1) {
            rest.insert(0, *item);
            result.push(rest);
        }
    }
    result
}

impl FromStr for Formula {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Formula::parse(s)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ ", self.response)?;

        let effects = self.effects();
        if effects.is_empty() {
            return write!(f, "{}", if self.has_intercept() { "1" } else { "0" });
        }

        let mut first = true;
        if !self.has_intercept() {
            write!(f, "0")?;
            first = false;
        }
        for term in effects {
            if !first {
                write!(f, " + ")?;
            }
            write!(f, "{}", term)?;
            first = false;
        }
        Ok(())
    }
}
