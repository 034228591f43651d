//! One Monte Carlo instance, end to end.
//!
//! ## Pipeline
//!
//! 1. Sample airport multipliers (when scaling is configured)
//! 2. Project every pair: `base * departure(origin) * arrival(destination)`
//! 3. Integerize the projections
//! 4. Clone or remove records to meet the targets
//! 5. Merge kept originals and clones into the final schedule
//!
//! Each stage draws from its own [`StreamGenerator`], seeded from
//! [`InstanceSeeds`]; a run is a pure function of the configuration, the
//! seeds and the input pairs. Instances share no mutable state, so
//! [`ForecastEngine::run_instances`] runs them on the rayon pool and
//! returns exactly what a sequential loop would.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use schedgen_core::rng::StreamGenerator;
use tracing::info;

use crate::config::{ForecastConfig, InstanceSeeds};
use crate::error::ForecastError;
use crate::flight::FlightRecord;
use crate::integerize::{DemandIntegerizer, IntegerizationReport};
use crate::od::{AirportId, GrowthModel, OdPairForecast};
use crate::scaling::{AirportScaler, ScaledGrowth};
use crate::synth::{merge_schedule, RecordCloner, RecordSynthesizer, SynthesisOutcome};

/// Result of one instance.
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastRun {
    /// Seeds the instance ran with.
    pub seeds: InstanceSeeds,
    /// Airport multipliers applied to growth; empty without scaling.
    pub multipliers: BTreeMap<AirportId, f64>,
    /// Integerization totals.
    pub integerization: IntegerizationReport,
    /// Integer target of each pair, in input order.
    pub targets: Vec<usize>,
    /// Clones, removals and limited allocations.
    pub synthesis: SynthesisOutcome,
    /// Kept originals followed by clones.
    pub schedule: Vec<FlightRecord>,
}

/// Forecasting engine built from a validated [`ForecastConfig`].
///
/// # Examples
///
/// ```rust
/// use std::collections::HashMap;
/// use schedgen_forecast::config::ForecastConfig;
/// use schedgen_forecast::engine::ForecastEngine;
/// use schedgen_forecast::flight::{FlightId, FlightRecord};
/// use schedgen_forecast::od::{AirportGrowth, AirportId, OdPairForecast};
///
/// let engine = ForecastEngine::new(ForecastConfig::default()).unwrap();
///
/// let mut pairs = vec![OdPairForecast::from_flights(
///     "KATL",
///     "KMIA",
///     (1..=4).map(|id| FlightRecord::new(FlightId(id * 100), "ASDI")),
/// )];
/// let mut growth = HashMap::new();
/// growth.insert(AirportId::new("KATL"), AirportGrowth::new(1.5, 1.0));
///
/// let run = engine.run(&mut pairs, &growth).unwrap();
/// assert_eq!(run.targets, vec![6]);
/// assert_eq!(run.schedule.len(), 6);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastEngine {
    config: ForecastConfig,
    integerizer: DemandIntegerizer,
    synthesizer: RecordSynthesizer,
    scaler: Option<AirportScaler>,
}

impl ForecastEngine {
    /// Validates `config` and builds the pipeline stages.
    ///
    /// # Errors
    ///
    /// Any error of [`ForecastConfig::validate`].
    pub fn new(config: ForecastConfig) -> Result<Self, ForecastError> {
        config.validate()?;
        let integerizer = DemandIntegerizer::new(config.integerization_threshold)?;
        let cloner = RecordCloner::new(config.clone_time_shift_std_dev_minutes)?;
        let synthesizer = RecordSynthesizer::new(config.max_clones_per_pair, cloner);
        let scaler = config.scaling.as_ref().map(AirportScaler::new).transpose()?;

        Ok(Self {
            config,
            integerizer,
            synthesizer,
            scaler,
        })
    }

    /// Configuration the engine was built from.
    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Airport multiplier sampler, when scaling is configured.
    pub fn scaler(&self) -> Option<&AirportScaler> {
        self.scaler.as_ref()
    }

    /// Runs one instance with the configured seeds.
    ///
    /// Targets and projections are written back into `pairs`.
    pub fn run<G: GrowthModel + ?Sized>(
        &self,
        pairs: &mut [OdPairForecast],
        growth: &G,
    ) -> Result<ForecastRun, ForecastError> {
        self.run_with_seeds(pairs, growth, self.config.seeds)
    }

    /// Runs one instance with explicit seeds.
    ///
    /// Multipliers scale only pairs whose projection is not fixed.
    pub fn run_with_seeds<G: GrowthModel + ?Sized>(
        &self,
        pairs: &mut [OdPairForecast],
        growth: &G,
        seeds: InstanceSeeds,
    ) -> Result<ForecastRun, ForecastError> {
        let multipliers = match &self.scaler {
            Some(scaler) => {
                let airports: BTreeSet<AirportId> = pairs
                    .iter()
                    .flat_map(|p| [p.origin().clone(), p.destination().clone()])
                    .collect();
                scaler.sample(&airports, &StreamGenerator::new(seeds.scaling))
            }
            None => BTreeMap::new(),
        };

        let scaled = ScaledGrowth::new(growth, &multipliers);
        self.integerizer.project(pairs, &scaled)?;
        let integerization = self.integerizer.integerize(pairs)?;

        let selection = StreamGenerator::new(seeds.selection);
        let jitter = StreamGenerator::new(seeds.jitter);
        let synthesis = self.synthesizer.synthesize(pairs, &selection, &jitter)?;
        let schedule = merge_schedule(pairs, &synthesis);

        info!(
            pairs = pairs.len(),
            top_ups = integerization.top_ups,
            clones = synthesis.cloned.len(),
            removed = synthesis.removed.len(),
            limited = synthesis.limited.len(),
            scheduled = schedule.len(),
            "Forecast instance complete"
        );

        Ok(ForecastRun {
            seeds,
            multipliers,
            targets: pairs.iter().filter_map(OdPairForecast::target).collect(),
            integerization,
            synthesis,
            schedule,
        })
    }

    /// Runs `count` instances in parallel, each on its own copy of `pairs`.
    ///
    /// Instance `i` uses [`InstanceSeeds::derive`]`(master_seed, i)`.
    /// Results are in instance order.
    ///
    /// # Errors
    ///
    /// The first error encountered by any instance.
    pub fn run_instances<G: GrowthModel + Sync + ?Sized>(
        &self,
        pairs: &[OdPairForecast],
        growth: &G,
        master_seed: u64,
        count: usize,
    ) -> Result<Vec<ForecastRun>, ForecastError> {
        (0..count)
            .into_par_iter()
            .map(|instance| {
                let mut local = pairs.to_vec();
                let seeds = InstanceSeeds::derive(master_seed, instance as u64);
                self.run_with_seeds(&mut local, growth, seeds)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::FlightId;
    use crate::od::AirportGrowth;
    use crate::scaling::ScalingConfig;

    fn pairs() -> Vec<OdPairForecast> {
        let mut next_id = 0u64;
        let mut make = |origin: &str, destination: &str, n: usize| {
            let records: Vec<FlightRecord> = (0..n)
                .map(|_| {
                    next_id += 1_000;
                    FlightRecord::new(FlightId(next_id), "ASDI")
                })
                .collect();
            OdPairForecast::from_flights(origin, destination, records)
        };
        vec![make("A", "B", 6), make("B", "C", 3), make("C", "A", 5)]
    }

    fn growth() -> BTreeMap<AirportId, AirportGrowth> {
        let mut growth = BTreeMap::new();
        growth.insert(AirportId::new("A"), AirportGrowth::new(1.4, 0.7));
        growth.insert(AirportId::new("B"), AirportGrowth::new(1.0, 1.3));
        growth.insert(AirportId::new("C"), AirportGrowth::new(2.1, 1.0));
        growth
    }

    #[test]
    fn test_run_is_reproducible() {
        let engine = ForecastEngine::new(
            ForecastConfig::builder()
                .clone_time_shift_std_dev_minutes(10.0)
                .build()
                .unwrap(),
        )
        .unwrap();

        let a = engine.run(&mut pairs(), &growth()).unwrap();
        let b = engine.run(&mut pairs(), &growth()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_schedule_matches_targets() {
        let engine = ForecastEngine::new(ForecastConfig::default()).unwrap();
        let mut input = pairs();
        let run = engine.run(&mut input, &growth()).unwrap();

        assert_eq!(run.targets.len(), 3);
        assert!(run.synthesis.limited.is_empty());
        let total: usize = run.targets.iter().sum();
        assert_eq!(run.schedule.len(), total);
        assert_eq!(total as u64, run.integerization.final_total());
    }

    #[test]
    fn test_flat_scaling_marginal_is_rejected() {
        let mut config = ForecastConfig::default();
        config.scaling = Some(ScalingConfig {
            min: 1.5,
            mode: 1.5,
            max: 1.5,
            correlations: Vec::new(),
        });
        assert!(matches!(
            ForecastEngine::new(config),
            Err(ForecastError::InvalidConfig { name: "scaling.max", .. })
        ));
    }

    #[test]
    fn test_parallel_instances_match_sequential() {
        let engine = ForecastEngine::new(
            ForecastConfig::builder()
                .clone_time_shift_std_dev_minutes(3.0)
                .scaling(ScalingConfig {
                    min: 0.5,
                    mode: 1.0,
                    max: 2.0,
                    correlations: Vec::new(),
                })
                .build()
                .unwrap(),
        )
        .unwrap();
        let input = pairs();
        let parallel = engine.run_instances(&input, &growth(), 99, 8).unwrap();

        assert_eq!(parallel.len(), 8);
        for (i, run) in parallel.iter().enumerate() {
            let seeds = InstanceSeeds::derive(99, i as u64);
            let sequential = engine
                .run_with_seeds(&mut input.clone(), &growth(), seeds)
                .unwrap();
            assert_eq!(run, &sequential);
        }
        assert_ne!(parallel[0].multipliers, parallel[1].multipliers);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ForecastConfig {
            integerization_threshold: f64::NAN,
            ..ForecastConfig::default()
        };
        assert!(ForecastEngine::new(config).is_err());
    }
}
