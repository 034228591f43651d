//! Correlation and covariance matrices with Cholesky decomposition.
//!
//! ## Mathematical Background
//!
//! Given `n` independent standard normal random variables `X = [X1, ..., Xn]`,
//! correlated normals with covariance `C` are obtained as:
//!
//! ```text
//! Y = mean + H * X
//! ```
//!
//! where `H` is the lower triangular Cholesky factor of `C`:
//! ```text
//! C = H * H^T
//! ```
//!
//! The covariance is assembled from per-variable variances and a
//! correlation matrix: `C[i][i] = var[i]`, `C[i][j] = rho[i][j] * sd[i] * sd[j]`
//! (Devroye, *Non-Uniform Random Variate Generation*, 1986, ch. XI).

use num_traits::Float;
use thiserror::Error;

use crate::error::ConfigError;

/// Cholesky decomposition hit a non-positive pivot.
///
/// This is an expected condition for real correlation inputs (for example a
/// correlation above 1 or a singular matrix) and callers usually degrade to
/// uncorrelated sampling instead of failing.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("Matrix is not positive definite: pivot {pivot} is {value}")]
pub struct NotPositiveDefinite {
    /// Index of the failing pivot.
    pub pivot: usize,
    /// Value of the pivot before the square root.
    pub value: f64,
}

fn tolerance<T: Float>() -> T {
    T::from(1e-10).unwrap_or_else(T::epsilon)
}

fn to_f64<T: Float>(x: T) -> f64 {
    x.to_f64().unwrap_or(f64::NAN)
}

/// Validates length, finiteness and symmetry of row-major square data.
fn validate_square<T: Float>(data: &[T], dim: usize) -> Result<(), ConfigError> {
    let expected = dim * dim;
    if data.len() != expected {
        return Err(ConfigError::NotSquare {
            dim,
            expected,
            got: data.len(),
        });
    }

    for i in 0..dim {
        for j in 0..dim {
            if !data[i * dim + j].is_finite() {
                return Err(ConfigError::NonFinite { i, j });
            }
        }
    }

    let eps = tolerance::<T>();
    for i in 0..dim {
        for j in (i + 1)..dim {
            let upper = data[i * dim + j];
            let lower = data[j * dim + i];
            if (upper - lower).abs() > eps {
                return Err(ConfigError::NotSymmetric {
                    i,
                    j,
                    upper: to_f64(upper),
                    lower: to_f64(lower),
                });
            }
        }
    }
    Ok(())
}

/// Flattens nested rows, rejecting ragged input.
fn flatten_rows<T: Float>(rows: &[Vec<T>]) -> Result<Vec<T>, ConfigError> {
    let dim = rows.len();
    let mut data = Vec::with_capacity(dim * dim);
    for row in rows {
        if row.len() != dim {
            return Err(ConfigError::NotSquare {
                dim,
                expected: dim * dim,
                got: rows.iter().map(Vec::len).sum(),
            });
        }
        data.extend_from_slice(row);
    }
    Ok(data)
}

/// Symmetric correlation matrix with unit diagonal.
///
/// Off-diagonal entries are not range-checked: a correlation outside
/// `[-1, 1]` is structurally well formed and shows up later as a matrix
/// that is not positive definite.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelationMatrix<T: Float> {
    /// Matrix elements in row-major order
    data: Vec<T>,
    /// Matrix dimension (n x n)
    dim: usize,
}

impl<T: Float> CorrelationMatrix<T> {
    /// Creates a correlation matrix from flat row-major data.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotSquare`] unless `data.len() == dim * dim`
    /// - [`ConfigError::NonFinite`] for NaN or infinite entries
    /// - [`ConfigError::InvalidDiagonal`] unless every diagonal entry is 1
    /// - [`ConfigError::NotSymmetric`] if `C[i][j] != C[j][i]`
    pub fn new(data: &[T], dim: usize) -> Result<Self, ConfigError> {
        validate_square(data, dim)?;

        let eps = tolerance::<T>();
        for i in 0..dim {
            let diag = data[i * dim + i];
            if (diag - T::one()).abs() > eps {
                return Err(ConfigError::InvalidDiagonal {
                    index: i,
                    value: to_f64(diag),
                });
            }
        }

        Ok(Self {
            data: data.to_vec(),
            dim,
        })
    }

    /// Creates a correlation matrix from nested rows.
    ///
    /// # Errors
    ///
    /// Same as [`CorrelationMatrix::new`]; ragged rows are not square.
    pub fn from_rows(rows: &[Vec<T>]) -> Result<Self, ConfigError> {
        let data = flatten_rows(rows)?;
        Self::new(&data, rows.len())
    }

    /// Identity correlation matrix (no correlation).
    pub fn identity(dim: usize) -> Self {
        let mut data = vec![T::zero(); dim * dim];
        for i in 0..dim {
            data[i * dim + i] = T::one();
        }
        Self { data, dim }
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at (i, j).
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[i * self.dim + j]
    }
}

/// Symmetric covariance matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct CovarianceMatrix<T: Float> {
    data: Vec<T>,
    dim: usize,
}

impl<T: Float> CovarianceMatrix<T> {
    /// Creates a covariance matrix from flat row-major data.
    ///
    /// # Errors
    ///
    /// Structural errors as for [`CorrelationMatrix::new`], plus
    /// [`ConfigError::InvalidVariance`] for a negative diagonal entry.
    pub fn new(data: &[T], dim: usize) -> Result<Self, ConfigError> {
        validate_square(data, dim)?;
        for i in 0..dim {
            let variance = data[i * dim + i];
            if variance < T::zero() {
                return Err(ConfigError::InvalidVariance {
                    index: i,
                    value: to_f64(variance),
                });
            }
        }
        Ok(Self {
            data: data.to_vec(),
            dim,
        })
    }

    /// Assembles `C[i][j] = rho[i][j] * sd[i] * sd[j]` with `C[i][i] = var[i]`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::DimensionMismatch`] if `variances` and the correlation
    ///   matrix disagree on the number of variables
    /// - [`ConfigError::InvalidVariance`] for a negative or non-finite variance
    pub fn from_correlation(
        variances: &[T],
        correlation: &CorrelationMatrix<T>,
    ) -> Result<Self, ConfigError> {
        let n = correlation.dim();
        if variances.len() != n {
            return Err(ConfigError::DimensionMismatch {
                name: "variances",
                expected: n,
                got: variances.len(),
            });
        }
        for (index, &variance) in variances.iter().enumerate() {
            if !variance.is_finite() || variance < T::zero() {
                return Err(ConfigError::InvalidVariance {
                    index,
                    value: to_f64(variance),
                });
            }
        }

        let std_devs: Vec<T> = variances.iter().map(|v| v.sqrt()).collect();
        let mut data = vec![T::zero(); n * n];
        for i in 0..n {
            data[i * n + i] = variances[i];
            for j in (i + 1)..n {
                let cov = correlation.get(i, j) * std_devs[i] * std_devs[j];
                data[i * n + j] = cov;
                data[j * n + i] = cov;
            }
        }
        Ok(Self { data, dim: n })
    }

    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at (i, j).
    pub fn get(&self, i: usize, j: usize) -> T {
        self.data[i * self.dim + j]
    }

    /// Computes the lower triangular factor `H` with `C = H * H^T`.
    ///
    /// Variables are processed in index order; the first pivot that is not
    /// strictly positive aborts the factorisation and the partial factor is
    /// discarded.
    ///
    /// # Errors
    ///
    /// [`NotPositiveDefinite`] naming the failing pivot.
    pub fn cholesky(&self) -> Result<CholeskyFactor<T>, NotPositiveDefinite> {
        let n = self.dim;
        let mut lower = vec![T::zero(); n * n];

        for j in 0..n {
            let mut pivot = self.get(j, j);
            for k in 0..j {
                let h_jk = lower[j * n + k];
                pivot = pivot - h_jk * h_jk;
            }
            if !(pivot > T::zero()) {
                return Err(NotPositiveDefinite {
                    pivot: j,
                    value: to_f64(pivot),
                });
            }
            let h_jj = pivot.sqrt();
            lower[j * n + j] = h_jj;

            for i in (j + 1)..n {
                let mut sum = self.get(i, j);
                for k in 0..j {
                    sum = sum - lower[i * n + k] * lower[j * n + k];
                }
                lower[i * n + j] = sum / h_jj;
            }
        }

        Ok(CholeskyFactor { data: lower, dim: n })
    }
}

impl<T: Float> From<CorrelationMatrix<T>> for CovarianceMatrix<T> {
    /// A correlation matrix is the covariance of standardised variables.
    fn from(correlation: CorrelationMatrix<T>) -> Self {
        Self {
            data: correlation.data,
            dim: correlation.dim,
        }
    }
}

/// Lower triangular Cholesky factor of a covariance matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct CholeskyFactor<T: Float> {
    /// Lower triangular matrix elements (row-major)
    data: Vec<T>,
    /// Matrix dimension
    dim: usize,
}

impl<T: Float> CholeskyFactor<T> {
    /// Matrix dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Element at (i, j); zero above the diagonal.
    pub fn get(&self, i: usize, j: usize) -> T {
        if j > i {
            T::zero()
        } else {
            self.data[i * self.dim + j]
        }
    }

    /// Computes `H * z` using only the lower triangle.
    ///
    /// # Panics
    ///
    /// Panics if `z.len() < self.dim()`.
    pub fn transform(&self, z: &[T]) -> Vec<T> {
        let mut w = z[..self.dim].to_vec();
        self.transform_inplace(&mut w);
        w
    }

    /// Computes `H * z` in place.
    ///
    /// Rows are processed bottom-up so each row only reads entries of `z`
    /// that have not been overwritten yet.
    ///
    /// # Panics
    ///
    /// Panics if `z.len() < self.dim()`.
    pub fn transform_inplace(&self, z: &mut [T]) {
        assert!(
            z.len() >= self.dim,
            "Input vector length {} is less than matrix dimension {}",
            z.len(),
            self.dim
        );

        let n = self.dim;
        for i in (0..n).rev() {
            let mut sum = T::zero();
            for j in 0..=i {
                sum = sum + self.data[i * n + j] * z[j];
            }
            z[i] = sum;
        }
    }

    /// Reconstructs `H * H^T` in row-major order.
    pub fn reconstruct(&self) -> Vec<T> {
        let n = self.dim;
        let mut out = vec![T::zero(); n * n];
        for i in 0..n {
            for j in 0..n {
                let mut sum = T::zero();
                for k in 0..=i.min(j) {
                    sum = sum + self.get(i, k) * self.get(j, k);
                }
                out[i * n + j] = sum;
            }
        }
        out
    }
}
