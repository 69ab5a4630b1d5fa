/// Time-window and sensor predicates applied to the working set
use std::fmt;
use std::str::FromStr;
use time::{Duration, OffsetDateTime};

use crate::error::ConfigError;
use crate::models::Reading;

/// Lookback selection measured back from "now" at evaluation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimeWindow {
    Last15Minutes,
    Last30Minutes,
    #[default]
    LastHour,
    Last24Hours,
    All,
}

impl TimeWindow {
    pub const VARIANTS: [TimeWindow; 5] = [
        TimeWindow::Last15Minutes,
        TimeWindow::Last30Minutes,
        TimeWindow::LastHour,
        TimeWindow::Last24Hours,
        TimeWindow::All,
    ];

    /// Lookback duration, `None` for `All`
    pub fn duration(self) -> Option<Duration> {
        match self {
            TimeWindow::Last15Minutes => Some(Duration::minutes(15)),
            TimeWindow::Last30Minutes => Some(Duration::minutes(30)),
            TimeWindow::LastHour => Some(Duration::minutes(60)),
            TimeWindow::Last24Hours => Some(Duration::hours(24)),
            TimeWindow::All => None,
        }
    }

    /// Earliest instant still inside the window, inclusive
    pub fn lower_bound(self, now: OffsetDateTime) -> Option<OffsetDateTime> {
        self.duration().map(|d| now - d)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeWindow::Last15Minutes => "last15Minutes",
            TimeWindow::Last30Minutes => "last30Minutes",
            TimeWindow::LastHour => "lastHour",
            TimeWindow::Last24Hours => "last24Hours",
            TimeWindow::All => "all",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        TimeWindow::VARIANTS
            .into_iter()
            .find(|w| w.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::InvalidWindow(s.to_string()))
    }
}

/// Active sensor selection and time window
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    /// `None` or empty matches every sensor
    pub sensor_id: Option<String>,
    pub window: TimeWindow,
}

impl FilterState {
    pub fn new(sensor_id: Option<String>, window: TimeWindow) -> Self {
        let sensor_id = sensor_id.filter(|id| !id.is_empty());
        FilterState { sensor_id, window }
    }

    pub fn all_sensors(window: TimeWindow) -> Self {
        FilterState {
            sensor_id: None,
            window,
        }
    }

    pub fn sensor(sensor_id: impl Into<String>, window: TimeWindow) -> Self {
        Self::new(Some(sensor_id.into()), window)
    }

    pub fn matches(&self, reading: &Reading, now: OffsetDateTime) -> bool {
        within_window(reading.timestamp, self.window, now)
            && matches_sensor(&reading.sensor_id, self.sensor_id.as_deref())
    }
}

pub fn within_window(timestamp: OffsetDateTime, window: TimeWindow, now: OffsetDateTime) -> bool {
    match window.lower_bound(now) {
        Some(bound) => timestamp >= bound,
        None => true,
    }
}

pub fn matches_sensor(sensor_id: &str, wanted: Option<&str>) -> bool {
    match wanted {
        Some(wanted) if !wanted.is_empty() => sensor_id == wanted,
        _ => true,
    }
}
