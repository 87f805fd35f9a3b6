//! Time window descriptors as they appear in manifests.
//!
//! A descriptor is the raw, user-supplied shape:
//!
//! ```json
//! { "unit": "Month", "count": 1, "calendar": { "startTime": "2022-01-01 00:00:00", "timeZone": "Europe/Warsaw" } }
//! { "unit": "Day", "count": 28, "isRolling": true }
//! ```
//!
//! [`TimeWindowConfig::build`] checks it and produces a [`TimeWindow`].
//! Product-specific limits on window size are left to the caller.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, WindowError};
use crate::unit::{TimeUnit, WindowType};
use crate::window::{parse_timezone, CalendarTimeWindow, RollingTimeWindow, TimeWindow};

/// Layout of calendar start times: date and time, no zone, no fraction.
pub const START_DATE_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindowConfig {
    pub unit: String,
    pub count: u32,
    #[serde(default)]
    pub is_rolling: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar: Option<CalendarConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarConfig {
    /// Civil start date in [`START_DATE_LAYOUT`], read in `time_zone`.
    pub start_time: String,
    /// IANA zone name.
    pub time_zone: String,
}

impl TimeWindowConfig {
    /// Deserialize a descriptor from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidConfig`] if the JSON does not match the
    /// descriptor shape.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| WindowError::InvalidConfig(e.to_string()))
    }

    /// Calendar iff a `calendar` section is present.
    pub fn window_type(&self) -> WindowType {
        if self.calendar.is_some() {
            WindowType::Calendar
        } else {
            WindowType::Rolling
        }
    }

    /// Validate the descriptor and construct the window it describes.
    ///
    /// # Errors
    ///
    /// - [`WindowError::InvalidConfig`] if `isRolling` and `calendar`
    ///   contradict each other (both set, or neither)
    /// - [`WindowError::InvalidCount`] if `count` is zero
    /// - [`WindowError::InvalidTimeUnit`] / [`WindowError::InvalidUnitForWindowType`]
    ///   for an unknown unit or one the window type does not accept
    /// - [`WindowError::InvalidTimezone`] for an unknown zone
    /// - [`WindowError::InvalidStartDate`] for a malformed start time or one
    ///   before [`min_start_date`]
    ///
    /// # Examples
    ///
    /// ```
    /// use time_window::{TimeWindowConfig, WindowType};
    ///
    /// let config = TimeWindowConfig::from_json(r#"{"unit": "Hour", "count": 24, "isRolling": true}"#)
    ///     .unwrap();
    /// let window = config.build().unwrap();
    /// assert_eq!(window.window_type(), WindowType::Rolling);
    /// assert_eq!(window.to_string(), "Rolling 24 Hour");
    /// ```
    pub fn build(&self) -> Result<TimeWindow> {
        self.check_ambiguity()?;
        if self.count == 0 {
            return Err(WindowError::InvalidCount);
        }
        let unit: TimeUnit = self.unit.parse()?;

        match &self.calendar {
            None => RollingTimeWindow::new(unit, self.count).map(TimeWindow::Rolling),
            Some(calendar) => {
                let tz = parse_timezone(&calendar.time_zone)?;
                let start = parse_start_date(&calendar.start_time)?;
                if start < min_start_date().naive_utc() {
                    return Err(WindowError::InvalidStartDate(format!(
                        "'{}' must be after or equal to {}",
                        calendar.start_time,
                        min_start_date().to_rfc3339()
                    )));
                }
                CalendarTimeWindow::new(unit, self.count, tz, start).map(TimeWindow::Calendar)
            }
        }
    }

    fn check_ambiguity(&self) -> Result<()> {
        match (self.is_rolling, self.calendar.is_some()) {
            (true, true) => Err(WindowError::InvalidConfig(
                "if 'isRolling' property is true, 'calendar' property must be omitted".to_string(),
            )),
            (false, false) => Err(WindowError::InvalidConfig(
                "if 'isRolling' property is false or not set, 'calendar' property must be provided"
                    .to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Parse a calendar start time in [`START_DATE_LAYOUT`].
///
/// # Errors
///
/// Returns [`WindowError::InvalidStartDate`] if the string does not match
/// the layout or names an impossible date.
pub fn parse_start_date(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), START_DATE_LAYOUT)
        .map_err(|e| WindowError::InvalidStartDate(format!("'{s}': {e}")))
}

/// The earliest start time a calendar window may be configured with.
pub fn min_start_date() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2020, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
