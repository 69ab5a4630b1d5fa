/// Working-set ownership, record validation and visible-series recomputation
use log::{debug, warn};
use serde::Deserialize;
use time::OffsetDateTime;

use crate::config::SeriesOrder;
use crate::error::RecordError;
use crate::filter::FilterState;
use crate::models::{RawNumber, RawReading, Reading, VisibleSeries};
use crate::utils::parse_timestamp;

/// Source of "now" for window evaluation, sampled on every recomputation
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

impl<F> Clock for F
where
    F: Fn() -> OffsetDateTime,
{
    fn now(&self) -> OffsetDateTime {
        self()
    }
}

/// One dropped record and its position in the input
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub index: usize,
    pub error: RecordError,
}

/// Outcome of an ingest call. Rejections are diagnostics, not failures.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub accepted: usize,
    pub rejected: Vec<Rejection>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Validate one raw backend record
pub fn validate(raw: &RawReading) -> Result<Reading, RecordError> {
    let sensor_id = raw
        .sensor_id
        .as_ref()
        .ok_or_else(|| RecordError::MalformedRecord("missing sensor_id".into()))?
        .normalized();
    let timestamp = raw
        .timestamp
        .as_ref()
        .ok_or_else(|| RecordError::MalformedRecord("missing timestamp".into()))?;
    let timestamp = parse_timestamp(timestamp)?;
    let temperature = number(raw.temperatura.as_ref(), "temperatura")?;
    let humidity = number(raw.umidade.as_ref(), "umidade")?;

    Ok(Reading {
        sensor_id,
        timestamp,
        temperature,
        humidity,
    })
}

fn number(value: Option<&RawNumber>, field: &str) -> Result<f64, RecordError> {
    let parsed = match value {
        None => return Err(RecordError::MalformedRecord(format!("missing {}", field))),
        Some(RawNumber::Number(n)) => Some(*n),
        Some(RawNumber::Text(s)) => s.trim().parse::<f64>().ok(),
    };
    parsed
        .filter(|n| n.is_finite())
        .ok_or_else(|| RecordError::MalformedRecord(format!("{} is not a number", field)))
}

/// Decode and validate an untyped JSON record
pub fn validate_value(value: &serde_json::Value) -> Result<Reading, RecordError> {
    let raw = RawReading::deserialize(value)
        .map_err(|e| RecordError::MalformedRecord(e.to_string()))?;
    validate(&raw)
}

/// Client-side working set and the filtered view derived from it
///
/// Every mutating call recomputes the visible series synchronously, sampling
/// the clock once per recomputation. Filtering always runs over the whole
/// working set, so widening a filter restores readings a narrower one hid.
pub struct SeriesAggregator<C = SystemClock> {
    clock: C,
    working_set: Vec<Reading>,
    filter: FilterState,
    order: SeriesOrder,
    visible: Vec<usize>,
    series: VisibleSeries,
    rejected_total: u64,
}

impl SeriesAggregator<SystemClock> {
    pub fn new(filter: FilterState) -> Self {
        Self::with_clock(filter, SystemClock)
    }
}

impl<C: Clock> SeriesAggregator<C> {
    pub fn with_clock(filter: FilterState, clock: C) -> Self {
        SeriesAggregator {
            clock,
            working_set: Vec::new(),
            filter,
            order: SeriesOrder::default(),
            visible: Vec::new(),
            series: VisibleSeries::default(),
            rejected_total: 0,
        }
    }

    /// Replace the working set with the valid records of `records`
    pub fn load_batch<I>(&mut self, records: I) -> IngestReport
    where
        I: IntoIterator<Item = serde_json::Value>,
    {
        let mut report = IngestReport::default();
        let mut fresh = Vec::new();

        for (index, value) in records.into_iter().enumerate() {
            match validate_value(&value) {
                Ok(reading) => fresh.push(reading),
                Err(error) => {
                    warn!("Dropping batch record {}: {}", index, error);
                    report.rejected.push(Rejection { index, error });
                }
            }
        }

        report.accepted = fresh.len();
        self.rejected_total += report.rejected.len() as u64;
        self.working_set = fresh;
        debug!(
            "Batch loaded: {} accepted, {} rejected",
            report.accepted,
            report.rejected.len()
        );
        self.recompute();
        report
    }

    /// Append one pushed record if it is valid
    pub fn push_one(&mut self, record: serde_json::Value) -> IngestReport {
        match validate_value(&record) {
            Ok(reading) => {
                self.working_set.push(reading);
                self.recompute();
                IngestReport {
                    accepted: 1,
                    rejected: Vec::new(),
                }
            }
            Err(error) => {
                warn!("Dropping pushed record: {}", error);
                self.rejected_total += 1;
                IngestReport {
                    accepted: 0,
                    rejected: vec![Rejection { index: 0, error }],
                }
            }
        }
    }

    pub fn set_filter(&mut self, filter: FilterState) {
        self.filter = filter;
        self.recompute();
    }

    pub fn set_order(&mut self, order: SeriesOrder) {
        self.order = order;
        self.recompute();
    }

    /// Re-evaluate the filter against a fresh "now" without other changes
    pub fn refresh(&mut self) {
        self.recompute();
    }

    pub fn visible_series(&self) -> &VisibleSeries {
        &self.series
    }

    /// Readings behind the visible series, in the same order
    pub fn visible_readings(&self) -> Vec<Reading> {
        self.visible
            .iter()
            .map(|&i| self.working_set[i].clone())
            .collect()
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn order(&self) -> SeriesOrder {
        self.order
    }

    pub fn working_set_len(&self) -> usize {
        self.working_set.len()
    }

    pub fn rejected_total(&self) -> u64 {
        self.rejected_total
    }

    fn recompute(&mut self) {
        let now = self.clock.now();
        let filter = &self.filter;

        let mut visible: Vec<usize> = self
            .working_set
            .iter()
            .enumerate()
            .filter(|(_, r)| filter.matches(r, now))
            .map(|(i, _)| i)
            .collect();

        if self.order == SeriesOrder::Chronological {
            // stable sort keeps arrival order for equal timestamps
            visible.sort_by_key(|&i| self.working_set[i].timestamp);
        }

        self.series = VisibleSeries::from_readings(visible.iter().map(|&i| &self.working_set[i]));
        self.visible = visible;

        debug!(
            "Recomputed visible series: {} of {} readings (sensor={:?}, window={})",
            self.visible.len(),
            self.working_set.len(),
            self.filter.sensor_id,
            self.filter.window
        );
    }
}
