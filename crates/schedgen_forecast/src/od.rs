//! Origin-destination demand and per-airport growth.
//!
//! An [`OdPairForecast`] carries one OD pair through a forecasting run:
//! the observed base count and records, the raw fractional projection from
//! the trip-distribution model, and the integer target set by the
//! [`DemandIntegerizer`](crate::integerize::DemandIntegerizer).

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::flight::{FlightId, FlightRecord};

/// Airport identifier (for example an ICAO code).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AirportId(String);

impl AirportId {
    /// Wraps an airport code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Airport code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AirportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AirportId {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for AirportId {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// Departure and arrival growth coefficients of one airport.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AirportGrowth {
    /// Departure growth coefficient.
    pub departure: f64,
    /// Arrival growth coefficient.
    pub arrival: f64,
}

impl AirportGrowth {
    /// No growth.
    pub const NEUTRAL: AirportGrowth = AirportGrowth {
        departure: 1.0,
        arrival: 1.0,
    };

    /// Creates growth coefficients.
    pub fn new(departure: f64, arrival: f64) -> Self {
        Self {
            departure,
            arrival,
        }
    }

    /// Both coefficients multiplied by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            departure: self.departure * factor,
            arrival: self.arrival * factor,
        }
    }
}

impl Default for AirportGrowth {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Source of per-airport growth coefficients.
///
/// Stands in for the external trip-distribution model.
pub trait GrowthModel {
    /// Growth of `airport`; airports the model does not know grow neutrally.
    fn growth(&self, airport: &AirportId) -> AirportGrowth;
}

impl GrowthModel for HashMap<AirportId, AirportGrowth> {
    fn growth(&self, airport: &AirportId) -> AirportGrowth {
        self.get(airport).copied().unwrap_or_default()
    }
}

impl GrowthModel for BTreeMap<AirportId, AirportGrowth> {
    fn growth(&self, airport: &AirportId) -> AirportGrowth {
        self.get(airport).copied().unwrap_or_default()
    }
}

impl<G: GrowthModel + ?Sized> GrowthModel for &G {
    fn growth(&self, airport: &AirportId) -> AirportGrowth {
        (**self).growth(airport)
    }
}

/// Running fractional and integer totals of one airport.
///
/// Departures accumulate on the origin of each pair and arrivals on the
/// destination.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AirportAccumulator {
    /// Sum of raw projections departing this airport.
    pub fractional_departures: f64,
    /// Sum of raw projections arriving at this airport.
    pub fractional_arrivals: f64,
    /// Sum of integer targets departing this airport.
    pub integer_departures: u64,
    /// Sum of integer targets arriving at this airport.
    pub integer_arrivals: u64,
}

impl AirportAccumulator {
    /// `integer - fractional` for departures.
    pub fn departure_excess(&self) -> f64 {
        self.integer_departures as f64 - self.fractional_departures
    }

    /// `integer - fractional` for arrivals.
    pub fn arrival_excess(&self) -> f64 {
        self.integer_arrivals as f64 - self.fractional_arrivals
    }
}

fn validate_projection(
    origin: &AirportId,
    destination: &AirportId,
    value: f64,
) -> Result<f64, ForecastError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ForecastError::InvalidProjection {
            origin: origin.clone(),
            destination: destination.clone(),
            value,
        })
    }
}

/// Demand and records of one origin-destination pair.
///
/// # Examples
///
/// ```rust
/// use std::collections::HashMap;
/// use schedgen_forecast::flight::{FlightId, FlightRecord};
/// use schedgen_forecast::od::{AirportGrowth, AirportId, OdPairForecast};
///
/// let mut pair = OdPairForecast::new("KBOS", "KDCA");
/// pair.add_flight(FlightRecord::new(FlightId(1), "ASDI"));
/// pair.add_flight(FlightRecord::new(FlightId(2), "ASDI"));
/// assert_eq!(pair.base_count(), 2);
///
/// let mut growth = HashMap::new();
/// growth.insert(AirportId::new("KBOS"), AirportGrowth::new(1.5, 1.0));
/// growth.insert(AirportId::new("KDCA"), AirportGrowth::new(1.0, 1.2));
/// let raw = pair.project(&growth).unwrap();
/// assert!((raw - 3.6).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct OdPairForecast {
    origin: AirportId,
    destination: AirportId,
    base_count: usize,
    raw_projection: Option<f64>,
    projection_fixed: bool,
    target: Option<usize>,
    flights: Vec<FlightRecord>,
    ids: HashSet<FlightId>,
}

impl OdPairForecast {
    /// Creates an empty pair; the base count follows the added records.
    pub fn new(origin: impl Into<AirportId>, destination: impl Into<AirportId>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            base_count: 0,
            raw_projection: None,
            projection_fixed: false,
            target: None,
            flights: Vec::new(),
            ids: HashSet::new(),
        }
    }

    /// Creates a pair from its records, dropping repeated ids.
    pub fn from_flights(
        origin: impl Into<AirportId>,
        destination: impl Into<AirportId>,
        flights: impl IntoIterator<Item = FlightRecord>,
    ) -> Self {
        let mut pair = Self::new(origin, destination);
        for record in flights {
            pair.add_flight(record);
        }
        pair
    }

    /// Fixes the raw projection; [`project`](Self::project) leaves it alone.
    ///
    /// # Errors
    ///
    /// [`ForecastError::InvalidProjection`] for a negative or non-finite value.
    pub fn with_raw_projection(mut self, raw: f64) -> Result<Self, ForecastError> {
        self.raw_projection = Some(validate_projection(&self.origin, &self.destination, raw)?);
        self.projection_fixed = true;
        Ok(self)
    }

    /// Adds a record unless one with the same id is already present.
    ///
    /// Returns `true` when the record was added.
    pub fn add_flight(&mut self, record: FlightRecord) -> bool {
        if !self.ids.insert(record.id) {
            return false;
        }
        self.flights.push(record);
        self.base_count = self.flights.len();
        true
    }

    /// Whether a record with `id` belongs to this pair.
    pub fn contains_flight(&self, id: FlightId) -> bool {
        self.ids.contains(&id)
    }

    /// Origin airport.
    pub fn origin(&self) -> &AirportId {
        &self.origin
    }

    /// Destination airport.
    pub fn destination(&self) -> &AirportId {
        &self.destination
    }

    /// Observed flight count (number of records).
    pub fn base_count(&self) -> usize {
        self.base_count
    }

    /// Records in presentation order.
    pub fn flights(&self) -> &[FlightRecord] {
        &self.flights
    }

    /// Raw fractional projection, once projected.
    pub fn raw_projection(&self) -> Option<f64> {
        self.raw_projection
    }

    /// Whether the raw projection was fixed by the caller.
    pub fn is_projection_fixed(&self) -> bool {
        self.projection_fixed
    }

    /// `raw - floor(raw)`, once projected.
    pub fn remainder(&self) -> Option<f64> {
        self.raw_projection.map(|raw| raw - raw.floor())
    }

    /// Integer target, once integerized.
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// Overrides the integer target.
    pub fn set_target(&mut self, target: usize) {
        self.target = Some(target);
    }

    pub(crate) fn increment_target(&mut self) {
        if let Some(target) = self.target.as_mut() {
            *target += 1;
        }
    }

    /// Sets the raw projection to `base * departure(origin) * arrival(destination)`.
    ///
    /// A fixed projection is returned unchanged.
    ///
    /// # Errors
    ///
    /// [`ForecastError::InvalidProjection`] if the product is negative or
    /// not finite.
    pub fn project<G: GrowthModel + ?Sized>(&mut self, growth: &G) -> Result<f64, ForecastError> {
        if self.projection_fixed {
            if let Some(raw) = self.raw_projection {
                return Ok(raw);
            }
        }
        let departure = growth.growth(&self.origin).departure;
        let arrival = growth.growth(&self.destination).arrival;
        let raw = validate_projection(
            &self.origin,
            &self.destination,
            self.base_count as f64 * departure * arrival,
        )?;
        self.raw_projection = Some(raw);
        Ok(raw)
    }
}
