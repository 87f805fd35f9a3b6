//! Time units and the window types they are legal for.
//!
//! Rolling windows trail "now" by a fixed absolute duration, so they only
//! accept units with a fixed length ([`ROLLING_UNITS`]). Calendar-aligned
//! windows repeat on wall-clock cadence and accept the calendar units
//! ([`CALENDAR_UNITS`]). Month, Quarter and Year have no fixed duration.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WindowError};

pub(crate) const HOURS_IN_DAY: i64 = 24;
pub(crate) const DAYS_IN_WEEK: i64 = 7;
pub(crate) const MONTHS_IN_QUARTER: i64 = 3;
pub(crate) const MONTHS_IN_YEAR: i64 = 12;

/// Unit of calendar granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

/// Units accepted by [`RollingTimeWindow`](crate::RollingTimeWindow).
pub const ROLLING_UNITS: &[TimeUnit] = &[TimeUnit::Minute, TimeUnit::Hour, TimeUnit::Day];

/// Units accepted by [`CalendarTimeWindow`](crate::CalendarTimeWindow).
pub const CALENDAR_UNITS: &[TimeUnit] = &[
    TimeUnit::Day,
    TimeUnit::Week,
    TimeUnit::Month,
    TimeUnit::Quarter,
    TimeUnit::Year,
];

impl TimeUnit {
    pub const ALL: [TimeUnit; 8] = [
        TimeUnit::Second,
        TimeUnit::Minute,
        TimeUnit::Hour,
        TimeUnit::Day,
        TimeUnit::Week,
        TimeUnit::Month,
        TimeUnit::Quarter,
        TimeUnit::Year,
    ];

    /// Canonical name, e.g. `"Quarter"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Second => "Second",
            TimeUnit::Minute => "Minute",
            TimeUnit::Hour => "Hour",
            TimeUnit::Day => "Day",
            TimeUnit::Week => "Week",
            TimeUnit::Month => "Month",
            TimeUnit::Quarter => "Quarter",
            TimeUnit::Year => "Year",
        }
    }

    /// The absolute length of one unit, or `None` for Month, Quarter and Year
    /// whose length depends on where they fall in the calendar.
    pub fn fixed_duration(&self) -> Option<Duration> {
        match self {
            TimeUnit::Second => Some(Duration::seconds(1)),
            TimeUnit::Minute => Some(Duration::minutes(1)),
            TimeUnit::Hour => Some(Duration::hours(1)),
            TimeUnit::Day => Some(Duration::hours(HOURS_IN_DAY)),
            TimeUnit::Week => Some(Duration::hours(HOURS_IN_DAY * DAYS_IN_WEEK)),
            TimeUnit::Month | TimeUnit::Quarter | TimeUnit::Year => None,
        }
    }

    /// Like [`fixed_duration`](Self::fixed_duration) but yields zero for
    /// calendar-only units. Never meaningful for Month, Quarter or Year.
    pub fn duration(&self) -> Duration {
        self.fixed_duration().unwrap_or_else(Duration::zero)
    }

    /// Whether this unit may be used by a window of the given type.
    pub fn is_valid_for(&self, window_type: WindowType) -> bool {
        match window_type {
            WindowType::Rolling => ROLLING_UNITS.contains(self),
            WindowType::Calendar => CALENDAR_UNITS.contains(self),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = WindowError;

    /// Case-insensitive; always yields the canonical variant.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        TimeUnit::ALL
            .into_iter()
            .find(|unit| unit.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| WindowError::InvalidTimeUnit(format!("'{s}'")))
    }
}

/// The two windowing models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    /// Trailing window that always ends at the queried instant.
    Rolling,
    /// Window pinned to a wall-clock anchor in a time zone.
    Calendar,
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowType::Rolling => write!(f, "Rolling"),
            WindowType::Calendar => write!(f, "Calendar"),
        }
    }
}

/// Whether `name` is any known time unit.
pub fn is_time_unit(name: &str) -> bool {
    name.parse::<TimeUnit>().is_ok()
}

/// Look up `name` among the units legal for `window_type`.
pub fn time_unit_for_window_type(window_type: WindowType, name: &str) -> Option<TimeUnit> {
    name.parse::<TimeUnit>()
        .ok()
        .filter(|unit| unit.is_valid_for(window_type))
}

/// Validate that `name` is a unit usable by a rolling window.
///
/// # Errors
///
/// Returns [`WindowError::InvalidTimeUnit`] if the name is not a known unit,
/// or [`WindowError::InvalidUnitForWindowType`] if it is a calendar-only unit.
pub fn validate_rolling_window_time_unit(name: &str) -> Result<()> {
    validate_for(WindowType::Rolling, name)
}

/// Validate that `name` is a unit usable by a calendar-aligned window.
///
/// # Errors
///
/// Same as [`validate_rolling_window_time_unit`], against [`CALENDAR_UNITS`].
pub fn validate_calendar_aligned_time_unit(name: &str) -> Result<()> {
    validate_for(WindowType::Calendar, name)
}

fn validate_for(window_type: WindowType, name: &str) -> Result<()> {
    let unit: TimeUnit = name.parse()?;
    if unit.is_valid_for(window_type) {
        Ok(())
    } else {
        Err(WindowError::InvalidUnitForWindowType { unit, window_type })
    }
}
