//! # schedgen_forecast: Flight Demand Integerization and Record Synthesis
//!
//! ## Layer 2 (Forecast) Role
//!
//! schedgen_forecast turns fractional origin-destination demand into a
//! concrete flight schedule for one Monte Carlo instance:
//! - Flight records and their six timestamps (`flight`)
//! - OD pairs, airport accumulators and the growth model seam (`od`)
//! - Controlled rounding of fractional projections (`integerize`)
//! - Choose-k-of-n selection, cloning with time jitter, removal (`synth`)
//! - Correlated airport growth multipliers (`scaling`)
//! - Configuration, single runs and parallel instances (`config`, `engine`)
//!
//! ## Reproducibility
//!
//! All randomness comes from `schedgen_core::rng::StreamGenerator`
//! instances seeded from [`config::InstanceSeeds`]. Pairs are processed in
//! presentation order, so a run is a pure function of its configuration,
//! seeds and input.
//!
//! ## Usage Examples
//!
//! ```rust
//! use std::collections::HashMap;
//! use schedgen_forecast::prelude::*;
//!
//! let mut pairs = vec![
//!     OdPairForecast::from_flights(
//!         "KORD",
//!         "KDFW",
//!         (1..=3).map(|id| FlightRecord::new(FlightId(id * 10), "ASDI")),
//!     ),
//!     OdPairForecast::from_flights(
//!         "KDFW",
//!         "KORD",
//!         (4..=8).map(|id| FlightRecord::new(FlightId(id * 10), "ASDI")),
//!     ),
//! ];
//!
//! let mut growth = HashMap::new();
//! growth.insert(AirportId::new("KORD"), AirportGrowth::new(1.7, 0.4));
//!
//! let engine = ForecastEngine::new(ForecastConfig::default()).unwrap();
//! let run = engine.run(&mut pairs, &growth).unwrap();
//!
//! assert_eq!(run.targets, vec![5, 2]);
//! assert_eq!(run.synthesis.cloned.len(), 2);
//! assert_eq!(run.synthesis.removed.len(), 3);
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod engine;
pub mod error;
pub mod flight;
pub mod integerize;
pub mod od;
pub mod scaling;
pub mod synth;

pub use error::ForecastError;

/// Commonly used types.
pub mod prelude {
    pub use crate::config::{ForecastConfig, InstanceSeeds};
    pub use crate::engine::{ForecastEngine, ForecastRun};
    pub use crate::error::ForecastError;
    pub use crate::flight::{FlightId, FlightRecord, TimestampField};
    pub use crate::integerize::{DemandIntegerizer, IntegerizationReport};
    pub use crate::od::{AirportAccumulator, AirportGrowth, AirportId, GrowthModel, OdPairForecast};
    pub use crate::scaling::{AirportCorrelation, AirportScaler, ScalingConfig};
    pub use crate::synth::{RecordSynthesizer, SynthesisOutcome};
}
