//! Dense linear algebra used by the likelihoods and the sampler.
//!
//! Storage is `ndarray` throughout; factorizations go through `nalgebra` and are
//! converted back. Every matrix here is small (coefficients × coefficients) except the
//! design matrix itself, which is only ever multiplied.

use crate::error::{Error, Result};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

/// Linear predictor `η = Xβ`.
///
/// Fails with [`Error::DimensionMismatch`] when `beta.len()` differs from the column
/// count of `x`.
pub fn linear_predictor(x: ArrayView2<'_, f64>, beta: &[f64]) -> Result<Array1<f64>> {
    if x.ncols() != beta.len() {
        return Err(Error::DimensionMismatch {
            what: "coefficient vector length vs design matrix columns",
            expected: x.ncols(),
            found: beta.len(),
        });
    }
    Ok(x.dot(&ArrayView1::from(beta)))
}

/// `Xᵀ v`, used for score vectors.
pub fn transpose_mul(x: ArrayView2<'_, f64>, v: ArrayView1<'_, f64>) -> Array1<f64> {
    x.t().dot(&v)
}

/// Weighted cross product `Xᵀ diag(w) X`.
pub fn weighted_cross_product(x: ArrayView2<'_, f64>, w: ArrayView1<'_, f64>) -> Array2<f64> {
    let xw = &x * &w.insert_axis(Axis(1));
    x.t().dot(&xw)
}

fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[(i, j)])
}

fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

fn cholesky_of(a: &Array2<f64>) -> Result<nalgebra::Cholesky<f64, nalgebra::Dyn>> {
    if a.nrows() != a.ncols() {
        return Err(Error::DimensionMismatch {
            what: "square matrix",
            expected: a.nrows(),
            found: a.ncols(),
        });
    }
    let not_pd = || Error::Linalg("matrix is not positive definite".to_string());
    let chol = to_dmatrix(a).cholesky().ok_or_else(not_pd)?;
    // A zero pivot passes the factorization but makes every solve blow up.
    if chol.l_dirty().diagonal().iter().any(|d| !(*d > 0.0)) {
        return Err(not_pd());
    }
    Ok(chol)
}

/// Lower-triangular Cholesky factor `L` with `A = L Lᵀ`.
pub fn cholesky_lower(a: &Array2<f64>) -> Result<Array2<f64>> {
    Ok(from_dmatrix(&cholesky_of(a)?.l()))
}

/// Solve `A x = b` for symmetric positive definite `A`.
pub fn solve_spd(a: &Array2<f64>, b: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
    if b.len() != a.nrows() {
        return Err(Error::DimensionMismatch {
            what: "right-hand side length",
            expected: a.nrows(),
            found: b.len(),
        });
    }
    let chol = cholesky_of(a)?;
    let rhs = DVector::from_iterator(b.len(), b.iter().copied());
    let sol = chol.solve(&rhs);
    Ok(sol.iter().copied().collect())
}

/// Inverse of a symmetric positive definite matrix.
pub fn inverse_spd(a: &Array2<f64>) -> Result<Array2<f64>> {
    Ok(from_dmatrix(&cholesky_of(a)?.inverse()))
}

/// Lower-triangular matrix times vector, `L z`.
pub fn lower_mul(l: &Array2<f64>, z: &[f64]) -> Array1<f64> {
    let d = z.len();
    Array1::from_shape_fn(d, |i| (0..=i).map(|j| l[(i, j)] * z[j]).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn linear_predictor_rejects_wrong_length() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let err = linear_predictor(x.view(), &[1.0]).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 2, found: 1, .. }));
        let eta = linear_predictor(x.view(), &[1.0, -1.0]).unwrap();
        assert_eq!(eta, array![-1.0, -1.0]);
    }

    #[test]
    fn cross_product_matches_explicit_weights() {
        let x = array![[1.0, 0.5], [1.0, -1.0], [1.0, 2.0]];
        let w = array![1.0, 2.0, 0.5];
        let xtwx = weighted_cross_product(x.view(), w.view());
        assert_abs_diff_eq!(xtwx[(0, 0)], 3.5, epsilon = 1e-12);
        assert_abs_diff_eq!(xtwx[(0, 1)], 0.5 - 2.0 + 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(xtwx[(1, 0)], xtwx[(0, 1)], epsilon = 1e-12);
        assert_abs_diff_eq!(xtwx[(1, 1)], 0.25 + 2.0 + 2.0, epsilon = 1e-12);
    }

    #[test]
    fn cholesky_and_solve_agree() {
        let a = array![[4.0, 2.0], [2.0, 3.0]];
        let l = cholesky_lower(&a).unwrap();
        let rebuilt = l.dot(&l.t());
        for (u, v) in rebuilt.iter().zip(a.iter()) {
            assert_abs_diff_eq!(u, v, epsilon = 1e-12);
        }
        let b = array![2.0, 1.0];
        let x = solve_spd(&a, b.view()).unwrap();
        let back = a.dot(&x);
        assert_abs_diff_eq!(back[0], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(back[1], 1.0, epsilon = 1e-12);

        let inv = inverse_spd(&a).unwrap();
        let eye = a.dot(&inv);
        assert_abs_diff_eq!(eye[(0, 0)], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(eye[(0, 1)], 0.0, epsilon = 1e-12);

        let lz = lower_mul(&l, &[1.0, 1.0]);
        assert_abs_diff_eq!(lz[0], l[(0, 0)], epsilon = 1e-12);
        assert_abs_diff_eq!(lz[1], l[(1, 0)] + l[(1, 1)], epsilon = 1e-12);
    }

    #[test]
    fn indefinite_matrix_is_reported() {
        let a = array![[1.0, 2.0], [2.0, 1.0]];
        assert!(matches!(cholesky_lower(&a), Err(Error::Linalg(_))));
    }
}
