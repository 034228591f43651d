//! Inverse-CDF univariate distributions.
//!
//! Each distribution maps one `[0, 1)` draw to one sample through its
//! closed-form quantile function, so a scalar sample always consumes
//! exactly one draw from the stream.

use crate::error::ConfigError;
use crate::rng::StreamGenerator;

use super::normal::inverse_norm_cdf;

/// Smallest probability fed to the normal quantile; a zero draw maps here.
const MIN_NORMAL_PROBABILITY: f64 = 1.0 / (1u64 << 54) as f64;

/// Largest probability fed to the normal quantile.
const MAX_NORMAL_PROBABILITY: f64 = 1.0 - 1.0 / (1u64 << 53) as f64;

/// Sampling by inversion of a univariate distribution function.
///
/// # Examples
///
/// ```rust
/// use schedgen_core::distributions::{Triangular, UnivariateSampler};
/// use schedgen_core::rng::StreamGenerator;
///
/// let tri = Triangular::new(5.0, 7.0, 10.0).unwrap();
/// assert_eq!(tri.inverse_cdf(0.0), 5.0);
///
/// let stream = StreamGenerator::new(1);
/// let x = tri.sample(&stream);
/// assert!((5.0..=10.0).contains(&x));
/// ```
pub trait UnivariateSampler {
    /// Maps a probability in `[0, 1)` to a sample.
    fn inverse_cdf(&self, u: f64) -> f64;

    /// Distribution mean.
    fn mean(&self) -> f64;

    /// Draws one sample, consuming exactly one uniform draw.
    #[inline]
    fn sample(&self, stream: &StreamGenerator) -> f64 {
        self.inverse_cdf(stream.next_uniform())
    }

    /// Fills the buffer with independent samples.
    fn fill(&self, stream: &StreamGenerator, buffer: &mut [f64]) {
        stream.fill_uniform(buffer);
        for value in buffer.iter_mut() {
            *value = self.inverse_cdf(*value);
        }
    }
}

fn require_finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("must be finite, got {}", value),
        })
    }
}

/// Continuous uniform distribution on `[min, max)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Uniform {
    min: f64,
    max: f64,
}

impl Uniform {
    /// Creates a uniform distribution.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] for non-finite bounds or
    /// `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, ConfigError> {
        require_finite("min", min)?;
        require_finite("max", max)?;
        if min > max {
            return Err(ConfigError::InvalidParameter {
                name: "max",
                reason: format!("must not be below min ({} < {})", max, min),
            });
        }
        Ok(Self { min, max })
    }

    /// Lower bound.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> f64 {
        self.max
    }
}

impl UnivariateSampler for Uniform {
    #[inline]
    fn inverse_cdf(&self, u: f64) -> f64 {
        self.min + u * (self.max - self.min)
    }

    fn mean(&self) -> f64 {
        0.5 * (self.min + self.max)
    }
}

/// Normal distribution sampled through the AS241 quantile function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Normal {
    mean: f64,
    std_dev: f64,
}

impl Normal {
    /// Standard normal N(0, 1).
    pub const STANDARD: Normal = Normal {
        mean: 0.0,
        std_dev: 1.0,
    };

    /// Creates a normal distribution.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] for a non-finite mean or a
    /// negative or non-finite standard deviation. A zero standard deviation
    /// is allowed and yields the mean.
    pub fn new(mean: f64, std_dev: f64) -> Result<Self, ConfigError> {
        require_finite("mean", mean)?;
        require_finite("std_dev", std_dev)?;
        if std_dev < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "std_dev",
                reason: format!("must be non-negative, got {}", std_dev),
            });
        }
        Ok(Self { mean, std_dev })
    }

    /// Standard deviation.
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }
}

impl UnivariateSampler for Normal {
    /// Zero draws are nudged to 2^-54 so every sample is finite.
    #[inline]
    fn inverse_cdf(&self, u: f64) -> f64 {
        let p = u.clamp(MIN_NORMAL_PROBABILITY, MAX_NORMAL_PROBABILITY);
        self.mean + self.std_dev * inverse_norm_cdf(p)
    }

    fn mean(&self) -> f64 {
        self.mean
    }
}

/// Triangular distribution on `[min, max]` with peak at `mode`.
///
/// When `max <= min` the distribution is degenerate and every sample is
/// `0.0`; this mirrors the fallback of the demand scaling inputs and is not
/// an error.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangular {
    min: f64,
    mode: f64,
    max: f64,
}

impl Triangular {
    /// Creates a triangular distribution.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] for non-finite parameters,
    /// or, when `max > min`, a mode outside `[min, max]`.
    pub fn new(min: f64, mode: f64, max: f64) -> Result<Self, ConfigError> {
        require_finite("min", min)?;
        require_finite("mode", mode)?;
        require_finite("max", max)?;
        if max > min && !(min..=max).contains(&mode) {
            return Err(ConfigError::InvalidParameter {
                name: "mode",
                reason: format!("must lie in [{}, {}], got {}", min, max, mode),
            });
        }
        Ok(Self { min, mode, max })
    }

    /// Returns `true` when `max <= min`.
    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    /// Lower bound.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Mode.
    pub fn mode(&self) -> f64 {
        self.mode
    }

    /// Upper bound.
    pub fn max(&self) -> f64 {
        self.max
    }
}

impl UnivariateSampler for Triangular {
    #[inline]
    fn inverse_cdf(&self, u: f64) -> f64 {
        if self.is_degenerate() {
            return 0.0;
        }
        let range = self.max - self.min;
        let mode_area = (self.mode - self.min) / range;
        if u <= mode_area {
            self.min + (u * (self.mode - self.min) * range).sqrt()
        } else {
            self.max - ((self.max - self.mode) * range * (1.0 - u)).sqrt()
        }
    }

    fn mean(&self) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            (self.min + self.mode + self.max) / 3.0
        }
    }
}

/// Tagged parameter bundle for the supported univariate distributions.
///
/// # Examples
///
/// ```rust
/// use schedgen_core::distributions::{DistributionSpec, UnivariateSampler};
///
/// let spec = DistributionSpec::uniform(5.0, 10.0).unwrap();
/// assert_eq!(spec.inverse_cdf(0.5), 7.5);
/// assert!(DistributionSpec::normal(0.0, -1.0).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DistributionSpec {
    /// Uniform on `[min, max)`.
    Uniform(Uniform),
    /// Normal with mean and standard deviation.
    Normal(Normal),
    /// Triangular with min, mode, max.
    Triangular(Triangular),
}

impl DistributionSpec {
    /// Validated uniform specification.
    pub fn uniform(min: f64, max: f64) -> Result<Self, ConfigError> {
        Uniform::new(min, max).map(Self::Uniform)
    }

    /// Validated normal specification.
    pub fn normal(mean: f64, std_dev: f64) -> Result<Self, ConfigError> {
        Normal::new(mean, std_dev).map(Self::Normal)
    }

    /// Validated triangular specification.
    pub fn triangular(min: f64, mode: f64, max: f64) -> Result<Self, ConfigError> {
        Triangular::new(min, mode, max).map(Self::Triangular)
    }
}

impl UnivariateSampler for DistributionSpec {
    #[inline]
    fn inverse_cdf(&self, u: f64) -> f64 {
        match self {
            Self::Uniform(d) => d.inverse_cdf(u),
            Self::Normal(d) => d.inverse_cdf(u),
            Self::Triangular(d) => d.inverse_cdf(u),
        }
    }

    fn mean(&self) -> f64 {
        match self {
            Self::Uniform(d) => d.mean(),
            Self::Normal(d) => d.mean(),
            Self::Triangular(d) => d.mean(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn moments(samples: &[f64]) -> (f64, f64) {
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        (mean, variance.sqrt())
    }

    #[test]
    fn test_uniform_inverse() {
        let d = Uniform::new(5.0, 10.0).unwrap();
        assert_eq!(d.inverse_cdf(0.0), 5.0);
        assert_eq!(d.inverse_cdf(0.5), 7.5);
        assert_relative_eq!(d.mean(), 7.5);
    }

    #[test]
    fn test_uniform_rejects_inverted_bounds() {
        assert!(Uniform::new(2.0, 1.0).is_err());
        assert!(Uniform::new(f64::NAN, 1.0).is_err());
        assert!(Uniform::new(1.0, 1.0).is_ok());
    }

    #[test]
    fn test_normal_moments() {
        let d = Normal::new(500.0, 5.0).unwrap();
        let stream = StreamGenerator::new(5);
        let samples: Vec<f64> = (0..100_000).map(|_| d.sample(&stream)).collect();
        let (mean, std_dev) = moments(&samples);

        assert!((mean - 500.0).abs() < 0.1, "mean {}", mean);
        assert!((std_dev - 5.0).abs() < 0.1, "std_dev {}", std_dev);
    }

    #[test]
    fn test_normal_consumes_one_draw() {
        let d = Normal::new(0.0, 1.0).unwrap();
        let stream = StreamGenerator::new(11);
        let reference = StreamGenerator::new(11);

        d.sample(&stream);
        reference.next_uniform();
        assert_eq!(stream.state(), reference.state());
    }

    #[test]
    fn test_normal_zero_draw_is_finite() {
        let d = Normal::STANDARD;
        assert!(d.inverse_cdf(0.0).is_finite());
        assert!(d.inverse_cdf(0.0) < -8.0);
    }

    #[test]
    fn test_normal_validation() {
        assert!(Normal::new(0.0, -0.1).is_err());
        assert!(Normal::new(f64::INFINITY, 1.0).is_err());
        let point = Normal::new(3.0, 0.0).unwrap();
        assert_eq!(point.inverse_cdf(0.9), 3.0);
    }

    #[test]
    fn test_triangular_bounds() {
        let d = Triangular::new(5.0, 7.0, 10.0).unwrap();
        let stream = StreamGenerator::new(5);
        let mut buffer = vec![0.0; 100_000];
        d.fill(&stream, &mut buffer);

        for &x in &buffer {
            assert!((5.0..=10.0).contains(&x), "sample {} outside [5, 10]", x);
        }
        let (mean, _) = moments(&buffer);
        assert!((mean - 22.0 / 3.0).abs() < 0.05, "mean {}", mean);
    }

    #[test]
    fn test_triangular_inverse_at_mode_boundary() {
        let d = Triangular::new(0.0, 2.0, 4.0).unwrap();
        assert_relative_eq!(d.inverse_cdf(0.5), 2.0, epsilon = 1e-12);
        assert_relative_eq!(d.inverse_cdf(0.0), 0.0);
        assert_relative_eq!(d.inverse_cdf(1.0), 4.0);
    }

    #[test]
    fn test_triangular_degenerate_returns_zero() {
        let d = Triangular::new(3.0, 3.0, 3.0).unwrap();
        assert!(d.is_degenerate());
        assert_eq!(d.inverse_cdf(0.3), 0.0);

        let inverted = Triangular::new(5.0, 1.0, 2.0).unwrap();
        assert_eq!(inverted.inverse_cdf(0.7), 0.0);
        assert_eq!(inverted.mean(), 0.0);
    }

    #[test]
    fn test_triangular_mode_outside_range() {
        assert!(Triangular::new(0.0, 5.0, 4.0).is_err());
        assert!(Triangular::new(0.0, -1.0, 4.0).is_err());
    }

    #[test]
    fn test_distribution_spec_dispatch() {
        let stream = StreamGenerator::new(9);
        let reference = StreamGenerator::new(9);
        let spec = DistributionSpec::triangular(1.0, 2.0, 3.0).unwrap();
        let tri = Triangular::new(1.0, 2.0, 3.0).unwrap();
        assert_eq!(spec.sample(&stream), tri.sample(&reference));
        assert_relative_eq!(spec.mean(), 2.0);
    }
}
