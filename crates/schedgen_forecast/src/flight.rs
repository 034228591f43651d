//! Flight records: identity, provenance tag and six timestamps.
//!
//! Records are opaque value objects to the synthesis machinery. A clone is
//! a fresh, independently owned record; nothing here aliases a record
//! between the kept and removed sets.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Numeric flight identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlightId(pub u64);

impl FlightId {
    /// Identifier `self + k`, wrapping on overflow.
    #[inline]
    pub fn offset(self, k: u64) -> Self {
        Self(self.0.wrapping_add(k))
    }
}

impl fmt::Display for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FlightId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// The six timestamp fields carried by a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimestampField {
    /// Off-block time.
    GateOut,
    /// Wheels-off time.
    RunwayOff,
    /// Wheels-on time.
    RunwayOn,
    /// On-block time.
    GateIn,
    /// Scheduled departure time.
    ScheduledDeparture,
    /// Scheduled arrival time.
    ScheduledArrival,
}

impl TimestampField {
    /// All fields in record order.
    pub const ALL: [TimestampField; 6] = [
        TimestampField::GateOut,
        TimestampField::RunwayOff,
        TimestampField::RunwayOn,
        TimestampField::GateIn,
        TimestampField::ScheduledDeparture,
        TimestampField::ScheduledArrival,
    ];
}

/// Minimal flight record.
///
/// # Examples
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use schedgen_forecast::flight::{FlightId, FlightRecord, TimestampField};
///
/// let t = Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
/// let mut record = FlightRecord::new(FlightId(100), "ASDI")
///     .with_timestamp(TimestampField::GateOut, t);
/// record.shift_timestamps(90_000);
///
/// assert_eq!(
///     record.timestamp(TimestampField::GateOut),
///     Some(Utc.with_ymd_and_hms(2024, 7, 1, 12, 1, 30).unwrap())
/// );
/// assert_eq!(record.timestamp(TimestampField::GateIn), None);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightRecord {
    /// Identifier, unique across all OD pairs of a run.
    pub id: FlightId,
    /// Provenance tag (data source, or `CLONE_<id>` for synthesized records).
    pub source_type: String,
    /// Off-block time.
    #[serde(default)]
    pub gate_out: Option<DateTime<Utc>>,
    /// Wheels-off time.
    #[serde(default)]
    pub runway_off: Option<DateTime<Utc>>,
    /// Wheels-on time.
    #[serde(default)]
    pub runway_on: Option<DateTime<Utc>>,
    /// On-block time.
    #[serde(default)]
    pub gate_in: Option<DateTime<Utc>>,
    /// Scheduled departure time.
    #[serde(default)]
    pub scheduled_departure: Option<DateTime<Utc>>,
    /// Scheduled arrival time.
    #[serde(default)]
    pub scheduled_arrival: Option<DateTime<Utc>>,
}

impl FlightRecord {
    /// Creates a record with no timestamps.
    pub fn new(id: FlightId, source_type: impl Into<String>) -> Self {
        Self {
            id,
            source_type: source_type.into(),
            gate_out: None,
            runway_off: None,
            runway_on: None,
            gate_in: None,
            scheduled_departure: None,
            scheduled_arrival: None,
        }
    }

    /// Sets one timestamp, builder style.
    pub fn with_timestamp(mut self, field: TimestampField, time: DateTime<Utc>) -> Self {
        self.set_timestamp(field, Some(time));
        self
    }

    /// Reads one timestamp.
    pub fn timestamp(&self, field: TimestampField) -> Option<DateTime<Utc>> {
        *self.slot(field)
    }

    /// Overwrites one timestamp.
    pub fn set_timestamp(&mut self, field: TimestampField, time: Option<DateTime<Utc>>) {
        *self.slot_mut(field) = time;
    }

    /// All timestamps in [`TimestampField::ALL`] order.
    pub fn timestamps(&self) -> [Option<DateTime<Utc>>; 6] {
        TimestampField::ALL.map(|field| self.timestamp(field))
    }

    /// Shifts every present timestamp by the same number of milliseconds.
    ///
    /// Absent timestamps stay absent. A shift that would leave chrono's
    /// representable range leaves that timestamp unchanged.
    pub fn shift_timestamps(&mut self, offset_ms: i64) {
        let Some(offset) = TimeDelta::try_milliseconds(offset_ms) else {
            return;
        };
        for field in TimestampField::ALL {
            let slot = self.slot_mut(field);
            if let Some(time) = *slot {
                *slot = Some(time.checked_add_signed(offset).unwrap_or(time));
            }
        }
    }

    fn slot(&self, field: TimestampField) -> &Option<DateTime<Utc>> {
        match field {
            TimestampField::GateOut => &self.gate_out,
            TimestampField::RunwayOff => &self.runway_off,
            TimestampField::RunwayOn => &self.runway_on,
            TimestampField::GateIn => &self.gate_in,
            TimestampField::ScheduledDeparture => &self.scheduled_departure,
            TimestampField::ScheduledArrival => &self.scheduled_arrival,
        }
    }

    fn slot_mut(&mut self, field: TimestampField) -> &mut Option<DateTime<Utc>> {
        match field {
            TimestampField::GateOut => &mut self.gate_out,
            TimestampField::RunwayOff => &mut self.runway_off,
            TimestampField::RunwayOn => &mut self.runway_on,
            TimestampField::GateIn => &mut self.gate_in,
            TimestampField::ScheduledDeparture => &mut self.scheduled_departure,
            TimestampField::ScheduledArrival => &mut self.scheduled_arrival,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn full_record() -> FlightRecord {
        let base = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
        let mut record = FlightRecord::new(FlightId(7), "ETMS");
        for (i, field) in TimestampField::ALL.into_iter().enumerate() {
            record.set_timestamp(field, Some(base + TimeDelta::minutes(10 * i as i64)));
        }
        record
    }

    #[test]
    fn test_offset_wraps() {
        assert_eq!(FlightId(10).offset(2), FlightId(12));
        assert_eq!(FlightId(u64::MAX).offset(1), FlightId(0));
    }

    #[test]
    fn test_shift_preserves_relative_timing() {
        let original = full_record();
        let mut shifted = original.clone();
        shifted.shift_timestamps(-123_456);

        for field in TimestampField::ALL {
            let before = original.timestamp(field).unwrap();
            let after = shifted.timestamp(field).unwrap();
            assert_eq!(after - before, TimeDelta::milliseconds(-123_456));
        }
    }

    #[test]
    fn test_shift_leaves_absent_fields_absent() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut record =
            FlightRecord::new(FlightId(1), "ASDI").with_timestamp(TimestampField::RunwayOn, t);
        record.shift_timestamps(1_000);

        assert_eq!(record.runway_on, Some(t + TimeDelta::seconds(1)));
        assert_eq!(record.gate_out, None);
        assert_eq!(record.scheduled_arrival, None);
    }

    #[test]
    fn test_record_serialises() {
        let record = full_record();
        let json = serde_json::to_string(&record).unwrap();
        let decoded: FlightRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, record);
    }
}
