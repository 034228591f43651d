//! Clone factory with per-clone time jitter.

use schedgen_core::distributions::{Normal, UnivariateSampler};
use schedgen_core::rng::StreamGenerator;

use crate::error::ForecastError;
use crate::flight::FlightRecord;

/// Provenance tag prefix of synthesized records.
pub const CLONE_TAG_PREFIX: &str = "CLONE_";

const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// Produces time-shifted copies of flight records.
///
/// Each clone draws exactly one normal offset (mean 0, configured standard
/// deviation in minutes), rounds it to milliseconds and applies it to
/// every timestamp of the clone, so relative timing within the flight is
/// preserved. A zero standard deviation still consumes the draw.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RecordCloner {
    std_dev_minutes: f64,
}

impl RecordCloner {
    /// Creates a cloner with the given time-shift standard deviation.
    ///
    /// # Errors
    ///
    /// [`ForecastError::InvalidConfig`] for a negative or non-finite deviation.
    pub fn new(std_dev_minutes: f64) -> Result<Self, ForecastError> {
        if !std_dev_minutes.is_finite() || std_dev_minutes < 0.0 {
            return Err(ForecastError::invalid_config(
                "clone_time_shift_std_dev_minutes",
                format!("must be finite and non-negative, got {}", std_dev_minutes),
            ));
        }
        Ok(Self { std_dev_minutes })
    }

    /// Time-shift standard deviation in minutes.
    pub fn std_dev_minutes(&self) -> f64 {
        self.std_dev_minutes
    }

    /// Draws one offset in whole milliseconds.
    pub fn draw_offset_ms(&self, stream: &StreamGenerator) -> i64 {
        let minutes = self.std_dev_minutes * Normal::STANDARD.sample(stream);
        (minutes * MILLIS_PER_MINUTE).round() as i64
    }

    /// Makes `count` clones of `source`.
    ///
    /// The `k`-th clone (1-based) gets id `source.id + k` and tag
    /// `CLONE_<source id>`.
    pub fn clone_record(
        &self,
        source: &FlightRecord,
        count: usize,
        stream: &StreamGenerator,
    ) -> Vec<FlightRecord> {
        (1..=count as u64)
            .map(|k| {
                let mut clone = source.clone();
                clone.id = source.id.offset(k);
                clone.source_type = format!("{}{}", CLONE_TAG_PREFIX, source.id);
                clone.shift_timestamps(self.draw_offset_ms(stream));
                clone
            })
            .collect()
    }
}
