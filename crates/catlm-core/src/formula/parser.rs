//! Parser for the compact formula notation
//!
//! Supported syntax:
//! - Response: `y ~ ...`
//! - Sum of terms: `a + b`
//! - Interaction: `a:b`, `a:b:c`
//! - Crossing: `a * b` (same as `a + b + a:b`)
//! - Removal: `a * b - a:b`
//! - Intercept control: `0 + a`, `a - 1`, `y ~ 1`
//!
//! The result is the same structured [`Formula`] the builder methods produce.

use std::iter::Peekable;
use std::str::Chars;

use crate::error::{ConfigError, Result};
use crate::formula::{Formula, Term};

/// Formula parser
pub struct FormulaParser<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

/// One `+`/`-` separated item of the right-hand side
enum Item {
    Intercept(bool),
    Terms(Vec<Term>),
}

impl<'a> FormulaParser<'a> {
    /// Create a new parser
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            position: 0,
        }
    }

    /// Parse a formula
    pub fn parse(formula: &str) -> Result<Formula> {
        FormulaParser::new(formula).parse_formula()
    }

    fn parse_formula(&mut self) -> Result<Formula> {
        self.skip_whitespace();
        if self.chars.peek().is_none() {
            return Err(ConfigError::syntax(self.position, "Empty formula"));
        }

        let response = self.parse_identifier()?;
        self.skip_whitespace();
        self.expect('~')?;

        let mut formula = Formula::new(response);
        let mut negate = false;
        let mut expect_item = true;

        loop {
            self.skip_whitespace();
            match self.peek_char() {
                None if expect_item => {
                    return Err(ConfigError::syntax(
                        self.position,
                        "Unexpected end of formula, expected a term",
                    ));
                }
                None => break,
                Some(c @ ('+' | '-')) if !expect_item => {
                    self.advance();
                    negate = c == '-';
                    expect_item = true;
                }
                Some(c) if expect_item => {
                    let item = self.parse_item(c)?;
                    formula = apply(formula, item, negate);
                    expect_item = false;
                }
                Some(c) => {
                    return Err(ConfigError::syntax(
                        self.position,
                        format!("Expected '+' or '-', found '{}'", c),
                    ));
                }
            }
        }

        Ok(formula)
    }

    fn parse_item(&mut self, first: char) -> Result<Item> {
        if first == '0' || first == '1' {
            self.advance();
            if self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                return Err(ConfigError::syntax(
                    self.position,
                    "Only 0 or 1 may appear as a constant term",
                ));
            }
            return Ok(Item::Intercept(first == '1'));
        }

        // Factors joined by '*', each factor a ':' chain of variables
        let mut factors = vec![self.parse_colon_chain()?];
        loop {
            self.skip_whitespace();
            if self.peek_char() == Some('*') {
                self.advance();
                self.skip_whitespace();
                factors.push(self.parse_colon_chain()?);
            } else {
                break;
            }
        }

        Ok(Item::Terms(expand_product(&factors)))
    }

    fn parse_colon_chain(&mut self) -> Result<Vec<String>> {
        let mut vars = vec![self.parse_identifier()?];
        loop {
            self.skip_whitespace();
            if self.peek_char() == Some(':') {
                self.advance();
                self.skip_whitespace();
                let start = self.position;
                let var = self.parse_identifier()?;
                if vars.contains(&var) {
                    return Err(ConfigError::syntax(
                        start,
                        format!("Variable '{}' repeated in interaction", var),
                    ));
                }
                vars.push(var);
            } else {
                break;
            }
        }
        Ok(vars)
    }

    fn parse_identifier(&mut self) -> Result<String> {
        let start = self.position;
        let mut ident = String::new();

        match self.peek_char() {
            Some(c) if c.is_alphabetic() || c == '_' => {
                ident.push(c);
                self.advance();
            }
            Some(c) => {
                return Err(ConfigError::syntax(
                    start,
                    format!("Identifier must start with a letter, found '{}'", c),
                ));
            }
            None => {
                return Err(ConfigError::syntax(
                    start,
                    "Unexpected end of input, expected identifier",
                ));
            }
        }

        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        Ok(ident)
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek_char() {
            Some(c) if c == expected => {
                self.advance();
                Ok(())
            }
            Some(c) => Err(ConfigError::syntax(
                self.position,
                format!("Expected '{}', found '{}'", expected, c),
            )),
            None => Err(ConfigError::syntax(
                self.position,
                format!("Unexpected end of formula, expected '{}'", expected),
            )),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn advance(&mut self) {
        if self.chars.next().is_some() {
            self.position += 1;
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }
}

fn apply(formula: Formula, item: Item, negate: bool) -> Formula {
    match item {
        Item::Intercept(one) if one != negate => formula.with_intercept(),
        Item::Intercept(_) => formula.no_intercept(),
        Item::Terms(terms) if negate => terms.iter().fold(formula, |f, t| f.remove(t)),
        Item::Terms(terms) => terms.into_iter().fold(formula, Formula::term),
    }
}

/// Every non-empty selection of factors, lower orders first
fn expand_product(factors: &[Vec<String>]) -> Vec<Term> {
    let mut terms = Vec::new();
    for size in 1..=factors.len() {
        for selection in selections(factors.len(), size) {
            let mut vars: Vec<&str> = Vec::new();
            for idx in selection {
                for var in &factors[idx] {
                    if !vars.contains(&var.as_str()) {
                        vars.push(var.as_str());
                    }
                }
            }
            let term = Term::from_variables(&vars);
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
    }
    terms
}

fn selections(n: usize, size: usize) -> Vec<Vec<usize>> {
    fn recurse(start: usize, n: usize, size: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == size {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            recurse(i + 1, n, size, current, out);
            current.pop();
        }
    }

    let mut out = Vec::new();
    recurse(0, n, size, &mut Vec::new(), &mut out);
    out
}
