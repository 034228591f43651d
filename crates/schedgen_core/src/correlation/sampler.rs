//! Correlated normal and triangular vector samplers.

use tracing::debug;

use crate::distributions::{norm_cdf, Normal, Triangular, UnivariateSampler};
use crate::error::ConfigError;
use crate::rng::StreamGenerator;

use super::matrix::{CholeskyFactor, CorrelationMatrix, CovarianceMatrix, NotPositiveDefinite};

/// Outcome of factorising a sampler's covariance matrix.
///
/// Fixed at construction; sampling never re-checks positive definiteness.
#[derive(Clone, Debug, PartialEq)]
pub enum Factorisation {
    /// Positive definite: draws are `mean + H * x`.
    Correlated(CholeskyFactor<f64>),
    /// Not positive definite: draws are `mean + x` with `x` standard normal.
    /// The correlation structure and the variances are not honoured.
    Uncorrelated(NotPositiveDefinite),
}

fn factorise(covariance: &CovarianceMatrix<f64>) -> Factorisation {
    match covariance.cholesky() {
        Ok(factor) => Factorisation::Correlated(factor),
        Err(reason) => {
            debug!(
                dim = covariance.dim(),
                pivot = reason.pivot,
                value = reason.value,
                "Covariance matrix is not positive definite; sampling uncorrelated"
            );
            Factorisation::Uncorrelated(reason)
        }
    }
}

/// Multivariate normal sampler based on the Cholesky factor of the
/// covariance matrix.
///
/// # Examples
///
/// ```rust
/// use schedgen_core::correlation::{CorrelatedSampler, CorrelationMatrix};
/// use schedgen_core::rng::StreamGenerator;
///
/// let corr = CorrelationMatrix::new(&[1.0, 0.8, 0.8, 1.0], 2).unwrap();
/// let sampler = CorrelatedSampler::new(&[10.0, 20.0], &[4.0, 9.0], &corr).unwrap();
/// assert!(sampler.is_positive_definite());
///
/// let stream = StreamGenerator::new(42);
/// let y = sampler.next_vector(&stream);
/// assert_eq!(y.len(), 2);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelatedSampler {
    means: Vec<f64>,
    factorisation: Factorisation,
}

impl CorrelatedSampler {
    /// Creates a sampler from means, variances and a correlation matrix.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DimensionMismatch`] if the vectors disagree with the
    /// matrix, [`ConfigError::InvalidVariance`] for a negative variance.
    /// A matrix that is not positive definite is not an error.
    pub fn new(
        means: &[f64],
        variances: &[f64],
        correlation: &CorrelationMatrix<f64>,
    ) -> Result<Self, ConfigError> {
        let covariance = CovarianceMatrix::from_correlation(variances, correlation)?;
        Self::from_covariance(means, &covariance)
    }

    /// Creates a sampler from means and an explicit covariance matrix.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DimensionMismatch`] if `means` disagrees with the matrix.
    pub fn from_covariance(
        means: &[f64],
        covariance: &CovarianceMatrix<f64>,
    ) -> Result<Self, ConfigError> {
        if means.len() != covariance.dim() {
            return Err(ConfigError::DimensionMismatch {
                name: "means",
                expected: covariance.dim(),
                got: means.len(),
            });
        }
        if let Some(index) = means.iter().position(|m| !m.is_finite()) {
            return Err(ConfigError::InvalidParameter {
                name: "means",
                reason: format!("mean at index {} is not finite", index),
            });
        }
        Ok(Self {
            means: means.to_vec(),
            factorisation: factorise(covariance),
        })
    }

    /// Creates a standardised sampler: zero means, unit variances.
    pub fn standard(correlation: &CorrelationMatrix<f64>) -> Self {
        let covariance: CovarianceMatrix<f64> = correlation.clone().into();
        Self {
            means: vec![0.0; correlation.dim()],
            factorisation: factorise(&covariance),
        }
    }

    /// Number of variables.
    pub fn dim(&self) -> usize {
        self.means.len()
    }

    /// Mean vector.
    pub fn means(&self) -> &[f64] {
        &self.means
    }

    /// Factorisation fixed at construction.
    pub fn factorisation(&self) -> &Factorisation {
        &self.factorisation
    }

    /// Returns `false` when draws fall back to uncorrelated variates.
    pub fn is_positive_definite(&self) -> bool {
        matches!(self.factorisation, Factorisation::Correlated(_))
    }

    /// Draws one vector, consuming exactly `dim()` uniform draws.
    pub fn next_vector(&self, stream: &StreamGenerator) -> Vec<f64> {
        let mut out = vec![0.0; self.dim()];
        self.fill_vector(stream, &mut out);
        out
    }

    /// Draws one vector into `out`.
    ///
    /// # Panics
    ///
    /// Panics if `out.len() != self.dim()`.
    pub fn fill_vector(&self, stream: &StreamGenerator, out: &mut [f64]) {
        assert_eq!(
            out.len(),
            self.dim(),
            "Output length {} does not match sampler dimension {}",
            out.len(),
            self.dim()
        );

        Normal::STANDARD.fill(stream, out);
        if let Factorisation::Correlated(factor) = &self.factorisation {
            factor.transform_inplace(out);
        }
        for (y, mean) in out.iter_mut().zip(&self.means) {
            *y += mean;
        }
    }
}

/// Correlated triangular vectors through a Gaussian copula.
///
/// A correlated standard normal vector is mapped through the normal CDF to
/// correlated uniforms, which are then inverted through one shared
/// triangular marginal.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelatedTriangular {
    normals: CorrelatedSampler,
    marginal: Triangular,
}

impl CorrelatedTriangular {
    /// Creates a sampler with a shared triangular marginal.
    pub fn new(marginal: Triangular, correlation: &CorrelationMatrix<f64>) -> Self {
        Self {
            normals: CorrelatedSampler::standard(correlation),
            marginal,
        }
    }

    /// Number of variables.
    pub fn dim(&self) -> usize {
        self.normals.dim()
    }

    /// Shared marginal distribution.
    pub fn marginal(&self) -> &Triangular {
        &self.marginal
    }

    /// Returns `false` when the underlying normals are drawn uncorrelated.
    pub fn is_positive_definite(&self) -> bool {
        self.normals.is_positive_definite()
    }

    /// Draws one vector, consuming exactly `dim()` uniform draws.
    pub fn next_vector(&self, stream: &StreamGenerator) -> Vec<f64> {
        let mut out = self.normals.next_vector(stream);
        for value in out.iter_mut() {
            *value = self.marginal.inverse_cdf(norm_cdf(*value));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_correlation(pairs: &[(f64, f64)]) -> f64 {
        let n = pairs.len() as f64;
        let (mx, my) = pairs
            .iter()
            .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
        let (mx, my) = (mx / n, my / n);
        let mut sxy = 0.0;
        let mut sxx = 0.0;
        let mut syy = 0.0;
        for (x, y) in pairs {
            sxy += (x - mx) * (y - my);
            sxx += (x - mx).powi(2);
            syy += (y - my).powi(2);
        }
        sxy / (sxx * syy).sqrt()
    }

    #[test]
    fn test_sampler_reproduces_moments_and_correlation() {
        let corr = CorrelationMatrix::new(&[1.0, 0.7, 0.7, 1.0], 2).unwrap();
        let sampler = CorrelatedSampler::new(&[10.0, -5.0], &[4.0, 1.0], &corr).unwrap();
        let stream = StreamGenerator::new(2718);

        let pairs: Vec<(f64, f64)> = (0..50_000)
            .map(|_| {
                let y = sampler.next_vector(&stream);
                (y[0], y[1])
            })
            .collect();

        let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / pairs.len() as f64;
        let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / pairs.len() as f64;
        assert!((mean_x - 10.0).abs() < 0.05, "mean_x {}", mean_x);
        assert!((mean_y + 5.0).abs() < 0.05, "mean_y {}", mean_y);
        assert!((sample_correlation(&pairs) - 0.7).abs() < 0.02);
    }

    #[test]
    fn test_first_component_uses_first_draw_only() {
        let corr = CorrelationMatrix::new(&[1.0, 0.5, 0.5, 1.0], 2).unwrap();
        let sampler = CorrelatedSampler::new(&[1.0, 2.0], &[9.0, 1.0], &corr).unwrap();
        let stream = StreamGenerator::new(4);
        let reference = StreamGenerator::new(4);

        let y = sampler.next_vector(&stream);
        let x0 = Normal::STANDARD.sample(&reference);
        let x1 = Normal::STANDARD.sample(&reference);

        assert_relative_eq!(y[0], 1.0 + 3.0 * x0, epsilon = 1e-12);
        assert_relative_eq!(y[1], 2.0 + 0.5 * x0 + 0.75_f64.sqrt() * x1, epsilon = 1e-12);
        assert_eq!(stream.state(), reference.state());
    }

    #[test]
    fn test_not_positive_definite_falls_back() {
        let corr = CorrelationMatrix::new(&[1.0, 1.2, 1.2, 1.0], 2).unwrap();
        let sampler = CorrelatedSampler::new(&[100.0, 200.0], &[25.0, 25.0], &corr).unwrap();
        assert!(!sampler.is_positive_definite());
        assert!(matches!(
            sampler.factorisation(),
            Factorisation::Uncorrelated(NotPositiveDefinite { pivot: 1, .. })
        ));

        let stream = StreamGenerator::new(6);
        let reference = StreamGenerator::new(6);
        let y = sampler.next_vector(&stream);
        assert_relative_eq!(y[0], 100.0 + Normal::STANDARD.sample(&reference), epsilon = 1e-12);
        assert_relative_eq!(y[1], 200.0 + Normal::STANDARD.sample(&reference), epsilon = 1e-12);
    }

    #[test]
    fn test_dimension_mismatch_fails_fast() {
        let corr = CorrelationMatrix::<f64>::identity(2);
        let result = CorrelatedSampler::new(&[0.0], &[1.0, 1.0], &corr);
        assert!(matches!(
            result,
            Err(ConfigError::DimensionMismatch { name: "means", .. })
        ));
    }

    #[test]
    fn test_standard_sampler_has_zero_means() {
        let corr = CorrelationMatrix::<f64>::identity(3);
        let sampler = CorrelatedSampler::standard(&corr);
        assert_eq!(sampler.means(), &[0.0, 0.0, 0.0]);
        assert!(sampler.is_positive_definite());
    }

    #[test]
    fn test_correlated_triangular_bounds_and_dependence() {
        let corr = CorrelationMatrix::new(&[1.0, 0.9, 0.9, 1.0], 2).unwrap();
        let marginal = Triangular::new(0.8, 1.0, 1.3).unwrap();
        let sampler = CorrelatedTriangular::new(marginal, &corr);
        let stream = StreamGenerator::new(99);

        let pairs: Vec<(f64, f64)> = (0..20_000)
            .map(|_| {
                let t = sampler.next_vector(&stream);
                (t[0], t[1])
            })
            .collect();

        for &(a, b) in &pairs {
            assert!((0.8..=1.3).contains(&a));
            assert!((0.8..=1.3).contains(&b));
        }
        assert!(sample_correlation(&pairs) > 0.8);
    }

    #[test]
    fn test_correlated_triangular_not_positive_definite() {
        let corr = CorrelationMatrix::new(&[1.0, 2.0, 2.0, 1.0], 2).unwrap();
        let marginal = Triangular::new(0.0, 0.5, 1.0).unwrap();
        let sampler = CorrelatedTriangular::new(marginal, &corr);
        assert!(!sampler.is_positive_definite());

        let stream = StreamGenerator::new(1);
        let t = sampler.next_vector(&stream);
        assert!(t.iter().all(|x| (0.0..=1.0).contains(x)));
    }
}
