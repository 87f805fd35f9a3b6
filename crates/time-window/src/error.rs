//! Error types for time window construction and configuration.

use thiserror::Error;

use crate::unit::{TimeUnit, WindowType};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    #[error("Unit '{unit}' is not valid for {window_type} time window")]
    InvalidUnitForWindowType {
        unit: TimeUnit,
        window_type: WindowType,
    },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid time unit: {0}")]
    InvalidTimeUnit(String),

    #[error("Invalid start date: {0}")]
    InvalidStartDate(String),

    #[error("Invalid count: time window count must be greater than zero")]
    InvalidCount,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, WindowError>;
