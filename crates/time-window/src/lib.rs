//! # time-window
//!
//! Period boundaries for error-budget time windows.
//!
//! Given a window descriptor and an instant, find the bounded period the
//! instant belongs to. Two models are supported:
//!
//! - **Rolling**: a fixed-length period trailing the instant itself.
//! - **Calendar-aligned**: periods pinned to a wall-clock anchor in an IANA
//!   zone, repeating every N days, weeks, months, quarters or years. Period
//!   boundaries keep the anchor's clock time across DST changes, so a period
//!   may be an hour shorter or longer than its nominal length.
//!
//! All lookups are pure functions of the window and the instant.
//!
//! ## Modules
//!
//! - [`unit`] — Time units, window types and unit validation
//! - [`period`] — The [`TimePeriod`] result type
//! - [`window`] — Rolling and calendar-aligned windows
//! - [`config`] — Manifest descriptors and start date parsing
//! - [`error`] — Error types

mod calculator;
pub mod config;
pub mod error;
pub mod period;
pub mod unit;
pub mod window;

pub use config::{min_start_date, parse_start_date, CalendarConfig, TimeWindowConfig};
pub use error::{Result, WindowError};
pub use period::TimePeriod;
pub use unit::{
    is_time_unit, time_unit_for_window_type, validate_calendar_aligned_time_unit,
    validate_rolling_window_time_unit, TimeUnit, WindowType, CALENDAR_UNITS, ROLLING_UNITS,
};
pub use window::{CalendarTimeWindow, RollingTimeWindow, TimeWindow};
