//! Configuration error type for the stochastic core.
//!
//! Every constructor in this crate validates its inputs eagerly and fails
//! with [`ConfigError`]. Conditions that are expected in real demand data
//! (a covariance matrix that is not positive definite) are not errors; see
//! [`crate::correlation::Factorisation`].

use thiserror::Error;

/// Structural configuration error detected at construction time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Flat matrix data does not hold `dim * dim` elements.
    #[error("Matrix is not square: expected {expected} elements for a {dim}x{dim} matrix, got {got}")]
    NotSquare {
        /// Requested dimension.
        dim: usize,
        /// Expected element count.
        expected: usize,
        /// Provided element count.
        got: usize,
    },

    /// Matrix is not symmetric.
    #[error("Matrix is not symmetric at ({i}, {j}): {upper} != {lower}")]
    NotSymmetric {
        /// Row index.
        i: usize,
        /// Column index.
        j: usize,
        /// Value at (i, j).
        upper: f64,
        /// Value at (j, i).
        lower: f64,
    },

    /// Correlation matrix diagonal element differs from 1.
    #[error("Correlation diagonal at index {index} is {value}, expected 1.0")]
    InvalidDiagonal {
        /// Diagonal index.
        index: usize,
        /// Offending value.
        value: f64,
    },

    /// Negative or non-finite variance.
    #[error("Variance at index {index} is {value}, must be finite and non-negative")]
    InvalidVariance {
        /// Variable index.
        index: usize,
        /// Offending value.
        value: f64,
    },

    /// Vectors and matrix disagree on the number of variables.
    #[error("Dimension mismatch for {name}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Name of the mismatched input.
        name: &'static str,
        /// Expected length.
        expected: usize,
        /// Provided length.
        got: usize,
    },

    /// Non-finite matrix element.
    #[error("Matrix element at ({i}, {j}) is not finite")]
    NonFinite {
        /// Row index.
        i: usize,
        /// Column index.
        j: usize,
    },

    /// Invalid distribution parameter.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Description of the invalid value.
        reason: String,
    },

    /// Stream snapshot with a zero xorshift or multiply-with-carry word.
    #[error("Invalid stream state: {reason}")]
    InvalidStreamState {
        /// Which word is invalid.
        reason: &'static str,
    },
}
