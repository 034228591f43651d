//! Monte Carlo perturbation of airport growth.
//!
//! Each instance may scale every airport's growth coefficients by a sampled
//! multiplier. Multipliers share one triangular marginal. Airports listed
//! together in a correlation group are drawn jointly through a Gaussian
//! copula ([`CorrelatedTriangular`]); all other airports draw independently.
//!
//! ## Draw order
//!
//! 1. Groups in ascending group id, one vector per group, airports in
//!    order of first appearance in the group's correlation list
//! 2. Ungrouped airports in ascending airport id, one draw each
//!
//! An airport listed in several groups keeps the multiplier of the last
//! group drawn.

use std::collections::{BTreeMap, BTreeSet};

use schedgen_core::correlation::{CorrelatedTriangular, CorrelationMatrix};
use schedgen_core::distributions::{Triangular, UnivariateSampler};
use schedgen_core::rng::StreamGenerator;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ForecastError;
use crate::od::{AirportGrowth, AirportId, GrowthModel};

/// Pairwise correlation between two airports' multipliers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AirportCorrelation {
    /// Correlation group id.
    pub group: u32,
    /// First airport.
    pub airport_a: AirportId,
    /// Second airport.
    pub airport_b: AirportId,
    /// Correlation coefficient.
    pub rho: f64,
}

/// Multiplier distribution and correlation groups.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScalingConfig {
    /// Lower bound of the multiplier.
    pub min: f64,
    /// Most likely multiplier.
    pub mode: f64,
    /// Upper bound of the multiplier.
    pub max: f64,
    /// Pairwise correlations, grouped by `group`.
    #[serde(default)]
    pub correlations: Vec<AirportCorrelation>,
}

impl ScalingConfig {
    /// Checks the marginal and every correlation entry.
    ///
    /// # Errors
    ///
    /// [`ForecastError::InvalidConfig`] for an empty multiplier range
    /// (`max <= min`), a non-finite coefficient or an airport correlated
    /// with itself. [`ForecastError::Config`] for any other invalid
    /// triangular marginal.
    pub fn validate(&self) -> Result<(), ForecastError> {
        // A flat triangular samples 0, which would zero every projection.
        if self.max <= self.min {
            return Err(ForecastError::invalid_config(
                "scaling.max",
                format!("must exceed min ({} <= {})", self.max, self.min),
            ));
        }
        Triangular::new(self.min, self.mode, self.max)?;
        for entry in &self.correlations {
            if !entry.rho.is_finite() {
                return Err(ForecastError::invalid_config(
                    "scaling.correlations.rho",
                    format!(
                        "{} / {} in group {} is not finite",
                        entry.airport_a, entry.airport_b, entry.group
                    ),
                ));
            }
            if entry.airport_a == entry.airport_b {
                return Err(ForecastError::invalid_config(
                    "scaling.correlations",
                    format!("{} is correlated with itself in group {}", entry.airport_a, entry.group),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
struct ScalingGroup {
    id: u32,
    airports: Vec<AirportId>,
    sampler: CorrelatedTriangular,
}

impl ScalingGroup {
    fn build(
        id: u32,
        entries: &[&AirportCorrelation],
        marginal: Triangular,
    ) -> Result<Self, ForecastError> {
        fn index_of(airport: &AirportId, airports: &mut Vec<AirportId>) -> usize {
            match airports.iter().position(|a| a == airport) {
                Some(i) => i,
                None => {
                    airports.push(airport.clone());
                    airports.len() - 1
                }
            }
        }

        let mut airports: Vec<AirportId> = Vec::new();
        let mut links = Vec::with_capacity(entries.len());
        for entry in entries {
            let a = index_of(&entry.airport_a, &mut airports);
            let b = index_of(&entry.airport_b, &mut airports);
            links.push((a, b, entry.rho));
        }

        let n = airports.len();
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        for (a, b, rho) in links {
            data[a * n + b] = rho;
            data[b * n + a] = rho;
        }

        let correlation = CorrelationMatrix::new(&data, n)?;
        let sampler = CorrelatedTriangular::new(marginal, &correlation);
        if !sampler.is_positive_definite() {
            debug!(
                group = id,
                airports = n,
                "Airport correlation group is not positive definite; multipliers drawn uncorrelated"
            );
        }
        Ok(Self {
            id,
            airports,
            sampler,
        })
    }
}

/// Samples per-airport growth multipliers.
///
/// # Examples
///
/// ```rust
/// use std::collections::BTreeSet;
/// use schedgen_core::rng::StreamGenerator;
/// use schedgen_forecast::od::AirportId;
/// use schedgen_forecast::scaling::{AirportCorrelation, AirportScaler, ScalingConfig};
///
/// let config = ScalingConfig {
///     min: 0.9,
///     mode: 1.0,
///     max: 1.2,
///     correlations: vec![AirportCorrelation {
///         group: 1,
///         airport_a: AirportId::new("KJFK"),
///         airport_b: AirportId::new("KLGA"),
///         rho: 0.8,
///     }],
/// };
/// let scaler = AirportScaler::new(&config).unwrap();
///
/// let airports: BTreeSet<AirportId> = ["KJFK", "KLGA", "KBOS"].into_iter().map(AirportId::from).collect();
/// let multipliers = scaler.sample(&airports, &StreamGenerator::new(1));
/// assert_eq!(multipliers.len(), 3);
/// assert!(multipliers.values().all(|m| (0.9..=1.2).contains(m)));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct AirportScaler {
    marginal: Triangular,
    groups: Vec<ScalingGroup>,
}

impl AirportScaler {
    /// Builds one correlated sampler per group.
    ///
    /// # Errors
    ///
    /// As for [`ScalingConfig::validate`].
    pub fn new(config: &ScalingConfig) -> Result<Self, ForecastError> {
        config.validate()?;
        let marginal = Triangular::new(config.min, config.mode, config.max)?;

        let mut grouped: BTreeMap<u32, Vec<&AirportCorrelation>> = BTreeMap::new();
        for entry in &config.correlations {
            grouped.entry(entry.group).or_default().push(entry);
        }

        let groups = grouped
            .into_iter()
            .map(|(id, entries)| ScalingGroup::build(id, &entries, marginal))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { marginal, groups })
    }

    /// Shared multiplier distribution.
    pub fn marginal(&self) -> &Triangular {
        &self.marginal
    }

    /// Ids of groups whose correlation matrix is not positive definite.
    pub fn degraded_groups(&self) -> Vec<u32> {
        self.groups
            .iter()
            .filter(|g| !g.sampler.is_positive_definite())
            .map(|g| g.id)
            .collect()
    }

    /// Airports covered by a correlation group.
    pub fn grouped_airports(&self) -> BTreeSet<&AirportId> {
        self.groups.iter().flat_map(|g| g.airports.iter()).collect()
    }

    /// Draws multipliers for all grouped airports and for every airport in
    /// `airports` that belongs to no group.
    pub fn sample(
        &self,
        airports: &BTreeSet<AirportId>,
        stream: &StreamGenerator,
    ) -> BTreeMap<AirportId, f64> {
        let mut multipliers = BTreeMap::new();
        for group in &self.groups {
            let draws = group.sampler.next_vector(stream);
            for (airport, m) in group.airports.iter().zip(draws) {
                multipliers.insert(airport.clone(), m);
            }
        }

        let grouped = self.grouped_airports();
        for airport in airports {
            if !grouped.contains(airport) {
                multipliers.insert(airport.clone(), self.marginal.sample(stream));
            }
        }
        multipliers
    }
}

/// Growth model with per-airport multipliers applied on top.
///
/// Airports without a multiplier keep their base growth.
pub struct ScaledGrowth<'a, G: ?Sized> {
    base: &'a G,
    multipliers: &'a BTreeMap<AirportId, f64>,
}

impl<'a, G: GrowthModel + ?Sized> ScaledGrowth<'a, G> {
    /// Wraps `base` with `multipliers`.
    pub fn new(base: &'a G, multipliers: &'a BTreeMap<AirportId, f64>) -> Self {
        Self { base, multipliers }
    }
}

impl<G: GrowthModel + ?Sized> GrowthModel for ScaledGrowth<'_, G> {
    fn growth(&self, airport: &AirportId) -> AirportGrowth {
        let growth = self.base.growth(airport);
        match self.multipliers.get(airport) {
            Some(&m) => growth.scaled(m),
            None => growth,
        }
    }
}
