use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A bounded span of time with a fixed start and end.
///
/// Calendar window periods are half-open: `start` is inclusive and `end`
/// exclusive. Rolling window periods end exactly at the queried instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimePeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimePeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        debug_assert!(start <= end, "period start {start} is after end {end}");
        Self { start, end }
    }

    /// Absolute length of the period. Calendar periods spanning a DST
    /// transition differ from the nominal length by the offset change.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// `start <= t < end`
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }
}
