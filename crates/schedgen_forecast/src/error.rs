//! Error types for the forecast layer.

use schedgen_core::ConfigError;
use thiserror::Error;

use crate::flight::FlightId;
use crate::od::AirportId;

/// Errors raised while projecting, integerizing or synthesizing demand.
///
/// Capped clone allocations and degraded correlated sampling are not
/// errors; they are reported through
/// [`SynthesisOutcome::limited`](crate::synth::SynthesisOutcome::limited) and
/// [`AirportScaler::degraded_groups`](crate::scaling::AirportScaler::degraded_groups).
#[derive(Error, Debug)]
pub enum ForecastError {
    /// Structural error from the stochastic core.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Raw projection is negative or not finite.
    #[error("Invalid raw projection for {origin} -> {destination}: {value}")]
    InvalidProjection {
        /// Origin airport.
        origin: AirportId,
        /// Destination airport.
        destination: AirportId,
        /// Offending value.
        value: f64,
    },

    /// Integerization reached a pair without a raw projection.
    #[error("OD pair {origin} -> {destination} has no raw projection")]
    MissingProjection {
        /// Origin airport.
        origin: AirportId,
        /// Destination airport.
        destination: AirportId,
    },

    /// Synthesis reached a pair without an integer target.
    #[error("OD pair {origin} -> {destination} has not been integerized")]
    NotIntegerized {
        /// Origin airport.
        origin: AirportId,
        /// Destination airport.
        destination: AirportId,
    },

    /// A flight id appears in more than one OD pair.
    #[error("Flight {id} of {origin} -> {destination} is already assigned to another OD pair")]
    DuplicateFlightId {
        /// Repeated id.
        id: FlightId,
        /// Origin of the later pair.
        origin: AirportId,
        /// Destination of the later pair.
        destination: AirportId,
    },

    /// Invalid engine configuration value.
    #[error("Invalid configuration value '{name}': {reason}")]
    InvalidConfig {
        /// Field name.
        name: &'static str,
        /// Description of the invalid value.
        reason: String,
    },

    /// Configuration file is not valid TOML for [`ForecastConfig`](crate::config::ForecastConfig).
    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),
}

impl ForecastError {
    pub(crate) fn invalid_config(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            name,
            reason: reason.into(),
        }
    }
}
