//! Formula parsing and design-matrix construction for R-style model specifications.
//!
//! Supported: `y ~ x1 + x2` (intercept added), `y ~ 0 + x1 + x2` and `y ~ x1 + x2 - 1`
//! (no intercept), `y ~ 1 + x1` (explicit intercept). Interaction, categorical and
//! transformed terms are rejected.

use crate::error::{Error, Result};
use crate::frame::DataFrame;
use ndarray::{Array1, Array2};

/// Name of the intercept column in formula-built designs.
pub const INTERCEPT: &str = "Intercept";

/// Result of parsing a formula.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFormula {
    pub response: String,
    /// Predictor columns in formula order, intercept excluded.
    pub terms: Vec<String>,
    pub has_intercept: bool,
}

/// Design matrix, response and coefficient names built from a formula.
#[derive(Debug, Clone)]
pub struct Design {
    pub x: Array2<f64>,
    pub y: Array1<f64>,
    pub names: Vec<String>,
}

fn check_name(name: &str, formula: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Formula(format!("empty term in '{formula}'")));
    }
    if let Some(c) = name.chars().find(|c| matches!(c, ':' | '*' | '(' | ')' | '^' | '|' | '/')) {
        return Err(Error::Formula(format!(
            "unsupported operator '{c}' in term '{name}'"
        )));
    }
    if name.contains(char::is_whitespace) {
        return Err(Error::Formula(format!("malformed term '{name}'")));
    }
    Ok(())
}

/// Parse a formula string into its response and predictor terms.
pub fn parse_formula(formula: &str) -> Result<ParsedFormula> {
    let parts: Vec<&str> = formula.split('~').collect();
    if parts.len() != 2 {
        return Err(Error::Formula(format!(
            "formula must contain exactly one '~': {formula}"
        )));
    }
    let response = parts[0].trim().to_string();
    check_name(&response, formula)?;
    if parts[1].trim().is_empty() {
        return Err(Error::Formula(format!("formula '{formula}' has no terms")));
    }

    // Rewrite "a - b" as "a + -b" so removals split like any other term.
    let mut has_intercept = true;
    let mut terms: Vec<String> = Vec::new();
    let rhs = parts[1].replace('-', "+-");
    for (idx, raw) in rhs.split('+').enumerate() {
        let raw = raw.trim();
        if raw.is_empty() {
            // A leading "-" leaves an empty first piece.
            if idx == 0 {
                continue;
            }
            return Err(Error::Formula(format!("empty term in '{formula}'")));
        }
        let (negated, term) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest.trim()),
            None => (false, raw),
        };
        match (negated, term) {
            (false, "1") => has_intercept = true,
            (false, "0") | (true, "1") => has_intercept = false,
            (true, other) => {
                return Err(Error::Formula(format!(
                    "removing term '{other}' is not supported"
                )));
            }
            (false, name) => {
                check_name(name, formula)?;
                if !terms.iter().any(|t| t == name) {
                    terms.push(name.to_string());
                }
            }
        }
    }

    if terms.is_empty() && !has_intercept {
        return Err(Error::Formula(format!("formula '{formula}' has no terms")));
    }
    Ok(ParsedFormula {
        response,
        terms,
        has_intercept,
    })
}

impl ParsedFormula {
    /// Coefficient names in design-matrix column order.
    pub fn coefficient_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.terms.len() + 1);
        if self.has_intercept {
            names.push(INTERCEPT.to_string());
        }
        names.extend(self.terms.iter().cloned());
        names
    }

    /// Build the design matrix and response from `data`.
    pub fn build(&self, data: &DataFrame) -> Result<Design> {
        let lookup = |name: &str| {
            data.column(name)
                .ok_or_else(|| Error::Formula(format!("column '{name}' not found in data frame")))
        };
        let y = lookup(self.response.as_str())?.clone();
        let n = data.n_rows();
        let names = self.coefficient_names();
        let mut x = Array2::zeros((n, names.len()));
        let mut col = 0;
        if self.has_intercept {
            x.column_mut(0).fill(1.0);
            col = 1;
        }
        for term in &self.terms {
            x.column_mut(col).assign(lookup(term.as_str())?);
            col += 1;
        }
        Ok(Design { x, y, names })
    }
}

/// Parse `formula` and build its design from `data`.
pub fn build_design(formula: &str, data: &DataFrame) -> Result<Design> {
    parse_formula(formula)?.build(data)
}
