//! Minimal in-memory data frame of named numeric columns.

use crate::error::{Error, Result};
use ndarray::Array1;

/// Ordered collection of equal-length, named `f64` columns.
///
/// # Example
/// ```
/// use bayesglm::DataFrame;
///
/// let df = DataFrame::new()
///     .with_column("x1", vec![1.0, 2.0, 3.0])?
///     .with_column("y", vec![0.5, 1.5, 2.5])?;
/// assert_eq!(df.n_rows(), 3);
/// assert_eq!(df.names(), vec!["x1", "y"]);
/// # Ok::<(), bayesglm::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    columns: Vec<(String, Array1<f64>)>,
}

impl DataFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, values)` pairs.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        columns
            .into_iter()
            .try_fold(Self::new(), |df, (name, values)| df.with_column(name, values))
    }

    /// Append a column, replacing any existing column of the same name.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        values: impl Into<Array1<f64>>,
    ) -> Result<Self> {
        let name = name.into();
        let values = values.into();
        if let Some(n) = self.columns.first().map(|(_, c)| c.len()) {
            if values.len() != n {
                return Err(Error::DimensionMismatch {
                    what: "data frame column length",
                    expected: n,
                    found: values.len(),
                });
            }
        }
        match self.columns.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = values,
            None => self.columns.push((name, values)),
        }
        Ok(self)
    }

    pub fn column(&self, name: &str) -> Option<&Array1<f64>> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |(_, c)| c.len())
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_keep_insertion_order_and_replace_by_name() {
        let df = DataFrame::from_columns([("b", vec![1.0, 2.0]), ("a", vec![3.0, 4.0])])
            .unwrap()
            .with_column("b", vec![9.0, 9.0])
            .unwrap();
        assert_eq!(df.names(), vec!["b", "a"]);
        assert_eq!(df.column("b").unwrap().to_vec(), vec![9.0, 9.0]);
        assert!(df.column("c").is_none());
        assert_eq!(df.n_columns(), 2);
    }

    #[test]
    fn ragged_column_is_rejected() {
        let err = DataFrame::new()
            .with_column("x", vec![1.0, 2.0, 3.0])
            .unwrap()
            .with_column("y", vec![1.0])
            .unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                what: "data frame column length",
                expected: 3,
                found: 1
            }
        );
    }
}
