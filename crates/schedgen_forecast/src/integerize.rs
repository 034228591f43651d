//! Controlled rounding of fractional OD projections.
//!
//! ## Algorithm
//!
//! Two passes over the pairs in presentation order:
//!
//! 1. **Seed**: accumulate every raw projection into the origin's
//!    fractional departures and the destination's fractional arrivals, and
//!    set each pair's provisional target to `max(1, floor(raw))`,
//!    accumulating it into the integer totals.
//! 2. **Top-up**: for each pair with a positive remainder `raw - floor(raw)`,
//!    add one flight when both
//!    `integer_departures(origin) < fractional_departures(origin) - threshold` and
//!    `integer_arrivals(destination) < fractional_arrivals(destination) - threshold`.
//!
//! The top-up pass is greedy and order dependent: it caps over-allocation
//! per airport rather than searching for a global optimum. No randomness
//! is consumed.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::ForecastError;
use crate::od::{AirportAccumulator, AirportId, GrowthModel, OdPairForecast};

/// Default capacity threshold.
pub const DEFAULT_INTEGERIZATION_THRESHOLD: f64 = 0.5;

/// Totals produced by one integerization pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntegerizationReport {
    /// Per-airport totals after the top-up pass.
    pub accumulators: BTreeMap<AirportId, AirportAccumulator>,
    /// Sum of `max(1, floor(raw))` over all pairs.
    pub provisional_total: u64,
    /// Number of successful top-ups.
    pub top_ups: usize,
}

impl IntegerizationReport {
    /// Sum of final targets: provisional total plus top-ups.
    pub fn final_total(&self) -> u64 {
        self.provisional_total + self.top_ups as u64
    }
}

/// Converts raw fractional projections to integer targets.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DemandIntegerizer {
    threshold: f64,
}

impl Default for DemandIntegerizer {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_INTEGERIZATION_THRESHOLD,
        }
    }
}

impl DemandIntegerizer {
    /// Creates an integerizer with the given capacity threshold.
    ///
    /// # Errors
    ///
    /// [`ForecastError::InvalidConfig`] unless the threshold is finite and
    /// non-negative.
    pub fn new(threshold: f64) -> Result<Self, ForecastError> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(ForecastError::invalid_config(
                "integerization_threshold",
                format!("must be finite and non-negative, got {}", threshold),
            ));
        }
        Ok(Self { threshold })
    }

    /// Capacity threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Projects every pair whose raw projection is not fixed.
    ///
    /// # Errors
    ///
    /// [`ForecastError::InvalidProjection`] from the first pair whose
    /// product is invalid.
    pub fn project<G: GrowthModel + ?Sized>(
        &self,
        pairs: &mut [OdPairForecast],
        growth: &G,
    ) -> Result<(), ForecastError> {
        for pair in pairs.iter_mut() {
            pair.project(growth)?;
        }
        Ok(())
    }

    /// Sets the integer target of every pair.
    ///
    /// # Errors
    ///
    /// [`ForecastError::MissingProjection`] if any pair has no raw
    /// projection; no target is modified in that case.
    pub fn integerize(
        &self,
        pairs: &mut [OdPairForecast],
    ) -> Result<IntegerizationReport, ForecastError> {
        let mut raws = Vec::with_capacity(pairs.len());
        for pair in pairs.iter() {
            let raw = pair
                .raw_projection()
                .ok_or_else(|| ForecastError::MissingProjection {
                    origin: pair.origin().clone(),
                    destination: pair.destination().clone(),
                })?;
            raws.push(raw);
        }

        let mut report = IntegerizationReport::default();

        // Seed phase
        for (pair, &raw) in pairs.iter_mut().zip(&raws) {
            let provisional = raw.floor().max(1.0) as u64;

            let origin = report.accumulators.entry(pair.origin().clone()).or_default();
            origin.fractional_departures += raw;
            origin.integer_departures += provisional;

            let destination = report
                .accumulators
                .entry(pair.destination().clone())
                .or_default();
            destination.fractional_arrivals += raw;
            destination.integer_arrivals += provisional;

            pair.set_target(provisional as usize);
            report.provisional_total += provisional;
        }

        // Greedy top-up phase
        for pair in pairs.iter_mut() {
            if !matches!(pair.remainder(), Some(r) if r > 0.0) {
                continue;
            }
            if !self.has_capacity(&report.accumulators, pair) {
                continue;
            }
            if let Some(origin) = report.accumulators.get_mut(pair.origin()) {
                origin.integer_departures += 1;
            }
            if let Some(destination) = report.accumulators.get_mut(pair.destination()) {
                destination.integer_arrivals += 1;
            }
            pair.increment_target();
            report.top_ups += 1;
        }

        debug!(
            pairs = pairs.len(),
            airports = report.accumulators.len(),
            provisional = report.provisional_total,
            top_ups = report.top_ups,
            "Integerized OD projections"
        );
        Ok(report)
    }

    fn has_capacity(
        &self,
        accumulators: &BTreeMap<AirportId, AirportAccumulator>,
        pair: &OdPairForecast,
    ) -> bool {
        let (Some(origin), Some(destination)) = (
            accumulators.get(pair.origin()),
            accumulators.get(pair.destination()),
        ) else {
            return false;
        };
        (origin.integer_departures as f64) < origin.fractional_departures - self.threshold
            && (destination.integer_arrivals as f64)
                < destination.fractional_arrivals - self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(origin: &str, destination: &str, raw: f64) -> OdPairForecast {
        OdPairForecast::new(origin, destination)
            .with_raw_projection(raw)
            .unwrap()
    }

    fn targets(pairs: &[OdPairForecast]) -> Vec<usize> {
        pairs.iter().map(|p| p.target().unwrap()).collect()
    }

    #[test]
    fn test_provisional_count_is_at_least_one() {
        let mut pairs = vec![fixed("A", "B", 0.0), fixed("B", "A", 0.3)];
        let report = DemandIntegerizer::default().integerize(&mut pairs).unwrap();

        assert_eq!(targets(&pairs), vec![1, 1]);
        assert_eq!(report.provisional_total, 2);
        assert_eq!(report.top_ups, 0);
    }

    #[test]
    fn test_top_up_follows_presentation_order() {
        // A departs 5.2 fractional against 4 provisional: room for one, taken first.
        let mut pairs = vec![fixed("A", "B", 2.6), fixed("A", "C", 2.6)];
        let report = DemandIntegerizer::default().integerize(&mut pairs).unwrap();

        assert_eq!(targets(&pairs), vec![3, 2]);
        assert_eq!(report.top_ups, 1);

        let mut pairs = vec![fixed("A", "B", 2.6), fixed("A", "C", 2.6), fixed("A", "B", 0.9)];
        let report = DemandIntegerizer::default().integerize(&mut pairs).unwrap();
        // A: fractional 6.1, provisional 5; B arrivals: 3.5 vs 3; C arrivals 2.6 vs 2.
        assert_eq!(targets(&pairs), vec![2, 3, 1]);
        assert_eq!(report.top_ups, 1);
        assert_eq!(report.final_total(), 6);
    }

    #[test]
    fn test_zero_remainder_never_topped_up() {
        let mut pairs = vec![fixed("A", "B", 3.0), fixed("A", "B", 3.9)];
        DemandIntegerizer::new(0.0)
            .unwrap()
            .integerize(&mut pairs)
            .unwrap();
        assert_eq!(targets(&pairs), vec![3, 4]);
    }

    #[test]
    fn test_strict_comparison_at_boundary() {
        // A departures: fractional 5.5, provisional 5; 5 < 5.5 - 0.5 is false.
        let mut pairs = vec![fixed("A", "B", 5.5)];
        let report = DemandIntegerizer::default().integerize(&mut pairs).unwrap();
        assert_eq!(targets(&pairs), vec![5]);
        assert_eq!(report.top_ups, 0);

        let mut pairs = vec![fixed("A", "B", 5.5)];
        DemandIntegerizer::new(0.25)
            .unwrap()
            .integerize(&mut pairs)
            .unwrap();
        assert_eq!(targets(&pairs), vec![6]);
    }

    #[test]
    fn test_missing_projection_fails_without_side_effects() {
        let mut pairs = vec![fixed("A", "B", 2.0), OdPairForecast::new("B", "C")];
        let result = DemandIntegerizer::default().integerize(&mut pairs);
        assert!(matches!(
            result,
            Err(ForecastError::MissingProjection { .. })
        ));
        assert_eq!(pairs[0].target(), None);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        assert!(DemandIntegerizer::new(-0.1).is_err());
        assert!(DemandIntegerizer::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_accumulators_track_both_directions() {
        let mut pairs = vec![fixed("A", "B", 2.4), fixed("B", "A", 1.2)];
        let report = DemandIntegerizer::default().integerize(&mut pairs).unwrap();

        let a = &report.accumulators[&AirportId::new("A")];
        assert!((a.fractional_departures - 2.4).abs() < 1e-12);
        assert!((a.fractional_arrivals - 1.2).abs() < 1e-12);
        assert_eq!(a.integer_departures, 2);
        assert_eq!(a.integer_arrivals, 1);
    }
}
