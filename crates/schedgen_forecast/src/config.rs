//! Engine configuration.
//!
//! Loadable from TOML; every field has a default so an empty document is a
//! valid configuration:
//!
//! ```toml
//! integerization_threshold = 0.5
//! max_clones_per_pair = 99
//! clone_time_shift_std_dev_minutes = 5.0
//!
//! [seeds]
//! selection = 123456789
//! jitter = 987654321
//! scaling = 192837465
//!
//! [scaling]
//! min = 0.9
//! mode = 1.0
//! max = 1.2
//! correlations = [
//!     { group = 1, airport_a = "KJFK", airport_b = "KLGA", rho = 0.8 },
//! ]
//! ```

use std::path::Path;

use schedgen_core::rng::DEFAULT_SEED;
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::integerize::DEFAULT_INTEGERIZATION_THRESHOLD;
use crate::scaling::ScalingConfig;
use crate::synth::DEFAULT_MAX_CLONES_PER_PAIR;

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Largest seed a TOML integer can hold.
const TOML_SEED_MASK: u64 = i64::MAX as u64;

/// SplitMix64 finaliser.
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seeds of the three independent streams of one instance.
///
/// TOML integers are signed, so seeds written to or loaded from a file are
/// limited to `0..=i64::MAX`. [`derive`](Self::derive) stays in that range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceSeeds {
    /// Index selection for cloning and removal.
    pub selection: u64,
    /// Clone time jitter.
    pub jitter: u64,
    /// Airport multiplier sampling.
    pub scaling: u64,
}

impl Default for InstanceSeeds {
    fn default() -> Self {
        Self {
            selection: DEFAULT_SEED,
            jitter: 987_654_321,
            scaling: 192_837_465,
        }
    }
}

impl InstanceSeeds {
    /// Derives the seeds of Monte Carlo instance `instance` from a master
    /// seed.
    ///
    /// A pure function of its arguments: the same pair always yields the
    /// same seeds, and distinct instances get unrelated streams. The top bit
    /// is cleared so derived seeds serialise as TOML integers.
    pub fn derive(master: u64, instance: u64) -> Self {
        let base = master ^ mix64(instance.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA));
        let stream = |k: u64| {
            mix64(base.wrapping_add(k.wrapping_mul(GOLDEN_GAMMA))) & TOML_SEED_MASK
        };
        Self {
            selection: stream(1),
            jitter: stream(2),
            scaling: stream(3),
        }
    }
}

/// Configuration of a [`ForecastEngine`](crate::engine::ForecastEngine).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Capacity threshold of the integerizer top-up pass.
    pub integerization_threshold: f64,
    /// Per-pair clone cap.
    pub max_clones_per_pair: usize,
    /// Standard deviation of the clone time shift, in minutes.
    pub clone_time_shift_std_dev_minutes: f64,
    /// Stream seeds of a single run.
    pub seeds: InstanceSeeds,
    /// Airport multiplier scaling; disabled when absent.
    pub scaling: Option<ScalingConfig>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            integerization_threshold: DEFAULT_INTEGERIZATION_THRESHOLD,
            max_clones_per_pair: DEFAULT_MAX_CLONES_PER_PAIR,
            clone_time_shift_std_dev_minutes: 0.0,
            seeds: InstanceSeeds::default(),
            scaling: None,
        }
    }
}

impl ForecastConfig {
    /// Create a builder starting from the defaults.
    pub fn builder() -> ForecastConfigBuilder {
        ForecastConfigBuilder::default()
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ForecastError> {
        let config: ForecastConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ForecastError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// [`ForecastError::InvalidConfig`] for a negative or non-finite
    /// threshold or time-shift deviation, and any scaling error.
    pub fn validate(&self) -> Result<(), ForecastError> {
        if !self.integerization_threshold.is_finite() || self.integerization_threshold < 0.0 {
            return Err(ForecastError::invalid_config(
                "integerization_threshold",
                format!(
                    "must be finite and non-negative, got {}",
                    self.integerization_threshold
                ),
            ));
        }
        if !self.clone_time_shift_std_dev_minutes.is_finite()
            || self.clone_time_shift_std_dev_minutes < 0.0
        {
            return Err(ForecastError::invalid_config(
                "clone_time_shift_std_dev_minutes",
                format!(
                    "must be finite and non-negative, got {}",
                    self.clone_time_shift_std_dev_minutes
                ),
            ));
        }
        if let Some(scaling) = &self.scaling {
            scaling.validate()?;
        }
        Ok(())
    }
}

/// Builder for [`ForecastConfig`].
///
/// # Examples
///
/// ```rust
/// use schedgen_forecast::config::ForecastConfig;
///
/// let config = ForecastConfig::builder()
///     .integerization_threshold(0.25)
///     .clone_time_shift_std_dev_minutes(5.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_clones_per_pair, 99);
///
/// assert!(ForecastConfig::builder().integerization_threshold(-1.0).build().is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ForecastConfigBuilder {
    config: ForecastConfig,
}

impl ForecastConfigBuilder {
    /// Set the integerization threshold.
    pub fn integerization_threshold(mut self, threshold: f64) -> Self {
        self.config.integerization_threshold = threshold;
        self
    }

    /// Set the per-pair clone cap.
    pub fn max_clones_per_pair(mut self, cap: usize) -> Self {
        self.config.max_clones_per_pair = cap;
        self
    }

    /// Set the clone time-shift standard deviation in minutes.
    pub fn clone_time_shift_std_dev_minutes(mut self, minutes: f64) -> Self {
        self.config.clone_time_shift_std_dev_minutes = minutes;
        self
    }

    /// Set all stream seeds.
    pub fn seeds(mut self, seeds: InstanceSeeds) -> Self {
        self.config.seeds = seeds;
        self
    }

    /// Enable airport multiplier scaling.
    pub fn scaling(mut self, scaling: ScalingConfig) -> Self {
        self.config.scaling = Some(scaling);
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<ForecastConfig, ForecastError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::od::AirportId;

    #[test]
    fn test_empty_document_is_default() {
        let config = ForecastConfig::from_toml_str("").unwrap();
        assert_eq!(config, ForecastConfig::default());
        assert_eq!(config.integerization_threshold, 0.5);
        assert_eq!(config.max_clones_per_pair, 99);
        assert_eq!(config.seeds.selection, DEFAULT_SEED);
    }

    #[test]
    fn test_full_document() {
        let content = r#"
            integerization_threshold = 0.3
            max_clones_per_pair = 10
            clone_time_shift_std_dev_minutes = 7.5

            [seeds]
            jitter = 5

            [scaling]
            min = 0.9
            mode = 1.0
            max = 1.2
            correlations = [
                { group = 2, airport_a = "KJFK", airport_b = "KLGA", rho = 0.8 },
            ]
        "#;
        let config = ForecastConfig::from_toml_str(content).unwrap();

        assert_eq!(config.integerization_threshold, 0.3);
        assert_eq!(config.max_clones_per_pair, 10);
        assert_eq!(config.seeds.jitter, 5);
        assert_eq!(config.seeds.selection, DEFAULT_SEED);

        let scaling = config.scaling.unwrap();
        assert_eq!(scaling.correlations.len(), 1);
        assert_eq!(scaling.correlations[0].airport_b, AirportId::new("KLGA"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            ForecastConfig::from_toml_str("clone_time_shift_std_dev_minutes = -2.0"),
            Err(ForecastError::InvalidConfig { .. })
        ));
        assert!(matches!(
            ForecastConfig::from_toml_str("integerization_threshold = \"high\""),
            Err(ForecastError::Toml(_))
        ));
        assert!(matches!(
            ForecastConfig::from_toml_str("[scaling]\nmin = 2.0\nmode = 1.0\nmax = 3.0"),
            Err(ForecastError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ForecastConfig::from_file("/nonexistent/schedgen.toml"),
            Err(ForecastError::Io(_))
        ));
    }

    #[test]
    fn test_derived_seeds_are_deterministic_and_distinct() {
        let a = InstanceSeeds::derive(42, 0);
        assert_eq!(a, InstanceSeeds::derive(42, 0));
        assert_ne!(a, InstanceSeeds::derive(42, 1));
        assert_ne!(a, InstanceSeeds::derive(43, 0));
        assert_ne!(a.selection, a.jitter);
        assert_ne!(a.jitter, a.scaling);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = ForecastConfig::builder()
            .max_clones_per_pair(5)
            .seeds(InstanceSeeds {
                selection: 1,
                jitter: 2,
                scaling: 3,
            })
            .build()
            .unwrap();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(ForecastConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_derived_seeds_round_trip_through_toml() {
        for instance in 0..64 {
            let seeds = InstanceSeeds::derive(u64::MAX - instance, instance);
            for seed in [seeds.selection, seeds.jitter, seeds.scaling] {
                assert!(seed <= i64::MAX as u64);
            }

            let config = ForecastConfig::builder().seeds(seeds).build().unwrap();
            let text = toml::to_string(&config).unwrap();
            assert_eq!(ForecastConfig::from_toml_str(&text).unwrap().seeds, seeds);
        }
    }
}
