//! # Univariate Distributions
//!
//! Inverse-CDF samplers consuming [`crate::rng::StreamGenerator`] draws:
//!
//! - [`Uniform`]: `min + u * (max - min)`
//! - [`Normal`]: `mean + std_dev * inverse_norm_cdf(u)` (AS241)
//! - [`Triangular`]: two-branch square-root inverse, `0.0` when degenerate
//!
//! [`DistributionSpec`] is the tagged union over the three, and
//! [`UnivariateSampler`] is the shared sampling interface.
//!
//! One scalar sample consumes exactly one uniform draw, so the stream
//! position after `n` samples never depends on the sampled values.

mod normal;
mod univariate;

pub use normal::{inverse_norm_cdf, norm_cdf, norm_pdf};
pub use univariate::{DistributionSpec, Normal, Triangular, Uniform, UnivariateSampler};
