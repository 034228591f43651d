//! Covariance structures and correlated vector sampling.
//!
//! This module provides:
//! - [`CorrelationMatrix`] and [`CovarianceMatrix`]: validated square matrices
//! - [`CholeskyFactor`]: lower triangular factor `H` with `C = H * H^T`
//! - [`CorrelatedSampler`]: multivariate normal draws `mean + H * x`
//! - [`CorrelatedTriangular`]: correlated triangular draws via a Gaussian copula
//!
//! A covariance matrix that is not positive definite never fails sampler
//! construction. The sampler records the failed pivot, emits a debug event
//! and draws uncorrelated standard normal offsets instead.

mod matrix;
mod sampler;

pub use matrix::{CholeskyFactor, CorrelationMatrix, CovarianceMatrix, NotPositiveDefinite};
pub use sampler::{CorrelatedSampler, CorrelatedTriangular, Factorisation};
