//! Per-pair cloning and removal of flight records.

use std::collections::{BTreeSet, HashSet};

use schedgen_core::rng::StreamGenerator;
use tracing::debug;

use crate::error::ForecastError;
use crate::flight::{FlightId, FlightRecord};
use crate::od::{AirportId, OdPairForecast};

use super::cloner::RecordCloner;
use super::selection::choose_indices;

/// Default cap on clones created for one OD pair.
pub const DEFAULT_MAX_CLONES_PER_PAIR: usize = 99;

/// Why an OD pair received fewer clones than its target asked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AllocationLimit {
    /// The request exceeded the per-pair clone cap.
    CloneCap,
    /// The pair has no records to clone from.
    NoSourceRecords,
}

/// A clone allocation that did not meet its target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CappedAllocation {
    /// Origin airport.
    pub origin: AirportId,
    /// Destination airport.
    pub destination: AirportId,
    /// Clones needed to reach the target.
    pub requested: usize,
    /// Clones actually created.
    pub granted: usize,
    /// Limiting condition.
    pub reason: AllocationLimit,
}

/// Records created and removed by a synthesis pass.
///
/// Clones and removed ids are disjoint: removal only ever names original
/// records, and originals are never mutated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SynthesisOutcome {
    /// New records, grouped by pair and source record in input order.
    pub cloned: Vec<FlightRecord>,
    /// Identifiers of original records to drop.
    pub removed: BTreeSet<FlightId>,
    /// Pairs whose clone target was not met.
    pub limited: Vec<CappedAllocation>,
}

impl SynthesisOutcome {
    /// Whether the original record `id` was marked removed.
    pub fn has_removed(&self, id: FlightId) -> bool {
        self.removed.contains(&id)
    }

    /// Number of clones created.
    pub fn cloned_count(&self) -> usize {
        self.cloned.len()
    }

    /// Empties all collections.
    pub fn clear(&mut self) {
        self.cloned.clear();
        self.removed.clear();
        self.limited.clear();
    }
}

/// Reconciles each pair's records with its integer target.
///
/// # Examples
///
/// ```rust
/// use schedgen_core::rng::StreamGenerator;
/// use schedgen_forecast::flight::{FlightId, FlightRecord};
/// use schedgen_forecast::od::OdPairForecast;
/// use schedgen_forecast::synth::RecordSynthesizer;
///
/// let mut pair = OdPairForecast::from_flights(
///     "KSEA",
///     "KSFO",
///     (1..=5).map(|id| FlightRecord::new(FlightId(id * 10), "ASDI")),
/// );
/// pair.set_target(2);
///
/// let stream = StreamGenerator::new(42);
/// let outcome = RecordSynthesizer::default()
///     .synthesize(std::slice::from_ref(&pair), &stream, &stream)
///     .unwrap();
/// assert_eq!(outcome.removed.len(), 3);
/// assert!(outcome.cloned.is_empty());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecordSynthesizer {
    max_clones_per_pair: usize,
    cloner: RecordCloner,
}

impl Default for RecordSynthesizer {
    fn default() -> Self {
        Self {
            max_clones_per_pair: DEFAULT_MAX_CLONES_PER_PAIR,
            cloner: RecordCloner::default(),
        }
    }
}

impl RecordSynthesizer {
    /// Creates a synthesizer.
    pub fn new(max_clones_per_pair: usize, cloner: RecordCloner) -> Self {
        Self {
            max_clones_per_pair,
            cloner,
        }
    }

    /// Per-pair clone cap.
    pub fn max_clones_per_pair(&self) -> usize {
        self.max_clones_per_pair
    }

    /// Clone factory.
    pub fn cloner(&self) -> &RecordCloner {
        &self.cloner
    }

    /// Synthesizes every pair in order into a fresh outcome.
    ///
    /// `selection` drives index selection and `jitter` drives clone time
    /// shifts; passing the same stream for both is allowed.
    ///
    /// Removed ids are collected run-wide, so every original record id
    /// must belong to exactly one pair.
    ///
    /// # Errors
    ///
    /// [`ForecastError::DuplicateFlightId`] if two pairs share a record id,
    /// checked before any draw. [`ForecastError::NotIntegerized`] for a pair
    /// without a target; pairs before it have already consumed draws.
    pub fn synthesize(
        &self,
        pairs: &[OdPairForecast],
        selection: &StreamGenerator,
        jitter: &StreamGenerator,
    ) -> Result<SynthesisOutcome, ForecastError> {
        check_unique_ids(pairs)?;
        let mut outcome = SynthesisOutcome::default();
        for pair in pairs {
            self.synthesize_pair(pair, selection, jitter, &mut outcome)?;
        }
        Ok(outcome)
    }

    /// Clones or removes records of one pair, appending to `outcome`.
    ///
    /// The caller keeps record ids unique across the pairs fed into one
    /// outcome.
    ///
    /// # Errors
    ///
    /// [`ForecastError::NotIntegerized`] if the pair has no target.
    pub fn synthesize_pair(
        &self,
        pair: &OdPairForecast,
        selection: &StreamGenerator,
        jitter: &StreamGenerator,
        outcome: &mut SynthesisOutcome,
    ) -> Result<(), ForecastError> {
        let target = pair.target().ok_or_else(|| ForecastError::NotIntegerized {
            origin: pair.origin().clone(),
            destination: pair.destination().clone(),
        })?;
        let flights = pair.flights();
        let base = flights.len();

        if target > base {
            let requested = target - base;
            if base == 0 {
                self.record_limit(pair, requested, 0, AllocationLimit::NoSourceRecords, outcome);
                return Ok(());
            }

            let total = requested.min(self.max_clones_per_pair);
            if total < requested {
                self.record_limit(pair, requested, total, AllocationLimit::CloneCap, outcome);
            }

            let counts = choose_indices(total, base, selection);
            for (record, &count) in flights.iter().zip(&counts) {
                if count > 0 {
                    outcome
                        .cloned
                        .extend(self.cloner.clone_record(record, count, jitter));
                }
            }
        } else if target < base {
            let flags = choose_indices(base - target, base, selection);
            for (record, &flag) in flights.iter().zip(&flags) {
                if flag > 0 {
                    outcome.removed.insert(record.id);
                }
            }
        }
        Ok(())
    }

    fn record_limit(
        &self,
        pair: &OdPairForecast,
        requested: usize,
        granted: usize,
        reason: AllocationLimit,
        outcome: &mut SynthesisOutcome,
    ) {
        debug!(
            origin = %pair.origin(),
            destination = %pair.destination(),
            requested,
            granted,
            ?reason,
            "Clone allocation limited"
        );
        outcome.limited.push(CappedAllocation {
            origin: pair.origin().clone(),
            destination: pair.destination().clone(),
            requested,
            granted,
            reason,
        });
    }
}

fn check_unique_ids(pairs: &[OdPairForecast]) -> Result<(), ForecastError> {
    let mut seen = HashSet::with_capacity(pairs.iter().map(|p| p.flights().len()).sum());
    for pair in pairs {
        for record in pair.flights() {
            if !seen.insert(record.id) {
                return Err(ForecastError::DuplicateFlightId {
                    id: record.id,
                    origin: pair.origin().clone(),
                    destination: pair.destination().clone(),
                });
            }
        }
    }
    Ok(())
}

/// Final schedule: every original record not removed, then every clone.
pub fn merge_schedule(pairs: &[OdPairForecast], outcome: &SynthesisOutcome) -> Vec<FlightRecord> {
    let mut schedule: Vec<FlightRecord> = pairs
        .iter()
        .flat_map(|pair| pair.flights())
        .filter(|record| !outcome.has_removed(record.id))
        .cloned()
        .collect();
    schedule.extend(outcome.cloned.iter().cloned());
    schedule
}
