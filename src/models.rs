use serde::Deserialize;
use time::OffsetDateTime;

/// Sensor identifier as delivered by the backend: a string or a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawSensorId {
    Text(String),
    Number(i64),
    Float(f64),
}

impl RawSensorId {
    /// String-coerced form used for all sensor comparisons
    pub fn normalized(&self) -> String {
        match self {
            RawSensorId::Text(s) => s.clone(),
            RawSensorId::Number(n) => n.to_string(),
            // f64 Display drops a zero fraction, so 1.0 becomes "1"
            RawSensorId::Float(n) => n.to_string(),
        }
    }
}

/// Timestamp as delivered by the backend: a date-time string or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Text(String),
    Millis(i64),
    FractionalMillis(f64),
}

/// Numeric measurement, some backends serialize decimals as strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
}

/// One record exactly as the backend sends it, before validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawReading {
    pub sensor_id: Option<RawSensorId>,
    pub timestamp: Option<RawTimestamp>,
    pub temperatura: Option<RawNumber>,
    pub umidade: Option<RawNumber>,
}

/// A validated sensor observation
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub sensor_id: String,
    pub timestamp: OffsetDateTime,
    pub temperature: f64,
    pub humidity: f64,
}

/// A single chart point: instant and metric value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub time: OffsetDateTime,
    pub value: f64,
}

/// The filtered view handed to the presenter, one series per metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleSeries {
    pub temperature: Vec<SeriesPoint>,
    pub humidity: Vec<SeriesPoint>,
}

impl VisibleSeries {
    pub fn from_readings<'a, I>(readings: I) -> Self
    where
        I: IntoIterator<Item = &'a Reading>,
    {
        let mut series = VisibleSeries::default();
        for r in readings {
            series.temperature.push(SeriesPoint {
                time: r.timestamp,
                value: r.temperature,
            });
            series.humidity.push(SeriesPoint {
                time: r.timestamp,
                value: r.humidity,
            });
        }
        series
    }

    pub fn len(&self) -> usize {
        self.temperature.len()
    }

    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty()
    }
}

/// Min/avg/max of one metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stats {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensorSummary {
    pub sensor_id: String,
    pub name: String,
    pub samples: usize,
    pub temperature: Stats,
    pub humidity: Stats,
}
