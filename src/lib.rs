//! Client-side core of a live sensor dashboard.
//!
//! A [`SeriesAggregator`] keeps the readings received from a batch fetch and a
//! live subscription, and derives the temperature and humidity series shown
//! under the current sensor and time-window selection.

pub mod aggregator;
pub mod chart;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod session;
pub mod source;
pub mod utils;

pub use aggregator::{Clock, IngestReport, Rejection, SeriesAggregator, SystemClock};
pub use chart::ChartData;
pub use config::{DashboardConfig, SensorCatalogue, SeriesOrder};
pub use error::{ConfigError, RecordError, SourceError};
pub use filter::{FilterState, TimeWindow};
pub use models::{RawReading, Reading, SeriesPoint, VisibleSeries};
pub use session::{DashboardSession, Presenter, SessionStats};
pub use source::SessionEvent;
