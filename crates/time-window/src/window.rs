//! Rolling and calendar-aligned time windows.
//!
//! A window answers one question: which [`TimePeriod`] contains a given
//! instant. Both window types are immutable values; lookups are pure and
//! may be shared freely across threads.
//!
//! # Wall-clock cadence
//!
//! Calendar-aligned periods keep the anchor's clock time in the window's
//! zone, not a fixed UTC offset. A "1 Day" window anchored at midnight in
//! `America/New_York` has one 23-hour period in March and one 25-hour period
//! in November. Windows that need fixed-length periods should use `UTC`.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use chrono_tz::Tz;
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use tracing::{debug, trace};

use crate::calculator::{
    resolve_local, time_period, whole_seconds, DayPeriodCalculator, MonthPeriodCalculator,
    YearPeriodCalculator,
};
use crate::error::{Result, WindowError};
use crate::period::TimePeriod;
use crate::unit::{TimeUnit, WindowType, DAYS_IN_WEEK, MONTHS_IN_QUARTER};

// ── Rolling ─────────────────────────────────────────────────────────────────

/// A trailing window of fixed absolute length that always ends at the
/// queried instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RollingTimeWindow {
    unit: TimeUnit,
    count: u32,
}

impl RollingTimeWindow {
    /// Create a rolling window of `count` × `unit`.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidUnitForWindowType`] unless `unit` is one
    /// of [`ROLLING_UNITS`](crate::ROLLING_UNITS).
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero. Counts come from validated configuration;
    /// a zero here is a bug in the caller.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use time_window::{RollingTimeWindow, TimeUnit};
    ///
    /// let window = RollingTimeWindow::new(TimeUnit::Hour, 24).unwrap();
    /// let now = Utc.with_ymd_and_hms(2006, 1, 4, 15, 4, 5).unwrap();
    /// let period = window.get_time_period(now);
    /// assert_eq!(period.start, Utc.with_ymd_and_hms(2006, 1, 3, 15, 4, 5).unwrap());
    /// assert_eq!(period.end, now);
    /// ```
    pub fn new(unit: TimeUnit, count: u32) -> Result<Self> {
        assert!(count > 0, "time window count must be greater than zero");
        if !unit.is_valid_for(WindowType::Rolling) {
            debug!(%unit, count, "rejected unit for rolling time window");
            return Err(WindowError::InvalidUnitForWindowType {
                unit,
                window_type: WindowType::Rolling,
            });
        }
        Ok(Self { unit, count })
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Total absolute length of the window.
    pub fn duration(&self) -> Duration {
        Duration::seconds(self.unit.duration().num_seconds() * i64::from(self.count))
    }

    /// The period `[now - duration, now]`. A start before chrono's range
    /// clamps to `DateTime::<Utc>::MIN_UTC`.
    pub fn get_time_period(&self, now: DateTime<Utc>) -> TimePeriod {
        let start = now
            .checked_sub_signed(self.duration())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        TimePeriod::new(start, now)
    }

    pub fn window_type(&self) -> WindowType {
        WindowType::Rolling
    }
}

impl fmt::Display for RollingTimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rolling {} {}", self.count, self.unit)
    }
}

impl Serialize for RollingTimeWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("RollingTimeWindow", 3)?;
        state.serialize_field("type", &WindowType::Rolling)?;
        state.serialize_field("unit", &self.unit)?;
        state.serialize_field("count", &self.count)?;
        state.end()
    }
}

// ── Calendar ────────────────────────────────────────────────────────────────

/// A window pinned to a wall-clock anchor in a time zone, repeating every
/// `count` calendar units.
///
/// The n-th period starts at the anchor's civil date and time plus
/// `n × count` units, attached to the window's zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarTimeWindow {
    unit: TimeUnit,
    count: u32,
    time_zone: Tz,
    anchor: NaiveDateTime,
}

impl CalendarTimeWindow {
    /// Create a calendar-aligned window.
    ///
    /// `anchor` is a civil date and time read in `time_zone`; sub-second
    /// precision is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidUnitForWindowType`] unless `unit` is one
    /// of [`CALENDAR_UNITS`](crate::CALENDAR_UNITS).
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{NaiveDate, TimeZone, Utc};
    /// use time_window::{CalendarTimeWindow, TimeUnit};
    ///
    /// let anchor = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap().and_hms_opt(22, 0, 0).unwrap();
    /// let window = CalendarTimeWindow::new(
    ///     TimeUnit::Day,
    ///     3,
    ///     chrono_tz::America::Anchorage,
    ///     anchor,
    /// )
    /// .unwrap();
    ///
    /// let period = window.get_time_period(Utc.with_ymd_and_hms(2021, 12, 23, 1, 0, 0).unwrap());
    /// assert_eq!(period.start, Utc.with_ymd_and_hms(2021, 12, 20, 7, 0, 0).unwrap());
    /// assert_eq!(period.end, Utc.with_ymd_and_hms(2021, 12, 23, 7, 0, 0).unwrap());
    /// ```
    pub fn new(unit: TimeUnit, count: u32, time_zone: Tz, anchor: NaiveDateTime) -> Result<Self> {
        assert!(count > 0, "time window count must be greater than zero");
        if !unit.is_valid_for(WindowType::Calendar) {
            debug!(%unit, count, "rejected unit for calendar time window");
            return Err(WindowError::InvalidUnitForWindowType {
                unit,
                window_type: WindowType::Calendar,
            });
        }
        Ok(Self {
            unit,
            count,
            time_zone,
            anchor: anchor.date().and_time(whole_seconds(anchor.time())),
        })
    }

    /// Like [`new`](Self::new) but takes an IANA zone name.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidTimezone`] if the zone name is unknown,
    /// otherwise the same errors as [`new`](Self::new).
    pub fn with_zone_name(
        unit: TimeUnit,
        count: u32,
        time_zone: &str,
        anchor: NaiveDateTime,
    ) -> Result<Self> {
        let tz = parse_timezone(time_zone)?;
        Self::new(unit, count, tz, anchor)
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// The anchor's civil date and time, as read in [`time_zone`](Self::time_zone).
    pub fn anchor(&self) -> NaiveDateTime {
        self.anchor
    }

    /// The instant at which the period starting on the anchor begins.
    pub fn start_time(&self) -> DateTime<Tz> {
        resolve_local(&self.time_zone, &self.anchor)
    }

    /// The period containing `timestamp`. Start is inclusive, end exclusive.
    pub fn get_time_period(&self, timestamp: DateTime<Utc>) -> TimePeriod {
        let count = i64::from(self.count);
        let period = match self.unit {
            TimeUnit::Year => time_period(&YearPeriodCalculator, self, count, timestamp),
            TimeUnit::Quarter => time_period(
                &MonthPeriodCalculator,
                self,
                count * MONTHS_IN_QUARTER,
                timestamp,
            ),
            TimeUnit::Month => time_period(&MonthPeriodCalculator, self, count, timestamp),
            TimeUnit::Week => {
                time_period(&DayPeriodCalculator, self, count * DAYS_IN_WEEK, timestamp)
            }
            TimeUnit::Day => time_period(&DayPeriodCalculator, self, count, timestamp),
            // Construction only admits calendar units.
            TimeUnit::Second | TimeUnit::Minute | TimeUnit::Hour => {
                unreachable!("unit {} is not a calendar unit", self.unit)
            }
        };
        trace!(
            window = %self,
            %timestamp,
            start = %period.start,
            end = %period.end,
            "resolved calendar time period"
        );
        period
    }

    pub fn window_type(&self) -> WindowType {
        WindowType::Calendar
    }
}

impl fmt::Display for CalendarTimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Calendar {} {} {} {}",
            self.count,
            self.unit,
            self.time_zone.name(),
            format_start_date(&self.start_time())
        )
    }
}

impl Serialize for CalendarTimeWindow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CalendarTimeWindow", 5)?;
        state.serialize_field("type", &WindowType::Calendar)?;
        state.serialize_field("unit", &self.unit)?;
        state.serialize_field("count", &self.count)?;
        state.serialize_field("start_date", &format_start_date(&self.start_time()))?;
        state.serialize_field("time_zone", self.time_zone.name())?;
        state.end()
    }
}

fn format_start_date(start: &DateTime<Tz>) -> String {
    start.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an IANA timezone string into `Tz`.
pub(crate) fn parse_timezone(s: &str) -> Result<Tz> {
    s.parse::<Tz>()
        .map_err(|_| WindowError::InvalidTimezone(format!("'{s}'")))
}

// ── Either ──────────────────────────────────────────────────────────────────

/// Either kind of window, for callers that hold windows built from
/// configuration without caring which model they use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum TimeWindow {
    Rolling(RollingTimeWindow),
    Calendar(CalendarTimeWindow),
}

impl TimeWindow {
    /// See [`RollingTimeWindow::new`].
    pub fn rolling(unit: TimeUnit, count: u32) -> Result<Self> {
        RollingTimeWindow::new(unit, count).map(Self::Rolling)
    }

    /// See [`CalendarTimeWindow::new`].
    pub fn calendar(
        unit: TimeUnit,
        count: u32,
        time_zone: Tz,
        anchor: NaiveDateTime,
    ) -> Result<Self> {
        CalendarTimeWindow::new(unit, count, time_zone, anchor).map(Self::Calendar)
    }

    pub fn get_time_period(&self, timestamp: DateTime<Utc>) -> TimePeriod {
        match self {
            TimeWindow::Rolling(w) => w.get_time_period(timestamp),
            TimeWindow::Calendar(w) => w.get_time_period(timestamp),
        }
    }

    pub fn window_type(&self) -> WindowType {
        match self {
            TimeWindow::Rolling(_) => WindowType::Rolling,
            TimeWindow::Calendar(_) => WindowType::Calendar,
        }
    }

    pub fn unit(&self) -> TimeUnit {
        match self {
            TimeWindow::Rolling(w) => w.unit(),
            TimeWindow::Calendar(w) => w.unit(),
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            TimeWindow::Rolling(w) => w.count(),
            TimeWindow::Calendar(w) => w.count(),
        }
    }
}

impl From<RollingTimeWindow> for TimeWindow {
    fn from(window: RollingTimeWindow) -> Self {
        TimeWindow::Rolling(window)
    }
}

impl From<CalendarTimeWindow> for TimeWindow {
    fn from(window: CalendarTimeWindow) -> Self {
        TimeWindow::Calendar(window)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindow::Rolling(w) => w.fmt(f),
            TimeWindow::Calendar(w) => w.fmt(f),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
