/// Utility functions for timestamp parsing, formatting and summaries
use std::collections::BTreeMap;
use time::format_description::well_known::{Iso8601, Rfc2822, Rfc3339};
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::config::SensorCatalogue;
use crate::error::RecordError;
use crate::models::{RawTimestamp, Reading, SensorSummary, Stats};

/// Parse a backend timestamp into a UTC instant
///
/// Every accepted form is normalized to UTC so that readings from the batch
/// fetch and the live stream compare on one time line. Accepted forms:
/// RFC 3339, ISO 8601 with an offset, RFC 2822, `YYYY-MM-DD[T| ]HH:MM[:SS[.fff]]`
/// without an offset (read as UTC), a bare date (midnight UTC) and epoch
/// milliseconds, fractional milliseconds truncated.
pub fn parse_timestamp(raw: &RawTimestamp) -> Result<OffsetDateTime, RecordError> {
    match raw {
        RawTimestamp::Millis(ms) => OffsetDateTime::from_unix_timestamp_nanos(*ms as i128 * 1_000_000)
            .map_err(|_| RecordError::InvalidTimestamp(ms.to_string())),
        RawTimestamp::FractionalMillis(ms) => {
            OffsetDateTime::from_unix_timestamp_nanos(ms.trunc() as i128 * 1_000_000)
                .map_err(|_| RecordError::InvalidTimestamp(ms.to_string()))
        }
        RawTimestamp::Text(text) => parse_timestamp_str(text),
    }
}

pub fn parse_timestamp_str(text: &str) -> Result<OffsetDateTime, RecordError> {
    let text = text.trim();

    if let Ok(dt) = OffsetDateTime::parse(text, &Rfc3339) {
        return Ok(dt.to_offset(UtcOffset::UTC));
    }
    if let Ok(dt) = OffsetDateTime::parse(text, &Iso8601::DEFAULT) {
        return Ok(dt.to_offset(UtcOffset::UTC));
    }
    if let Ok(dt) = OffsetDateTime::parse(text, &Rfc2822) {
        return Ok(dt.to_offset(UtcOffset::UTC));
    }

    let with_t = format_description!(
        "[year]-[month]-[day]T[hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
    );
    let with_space = format_description!(
        "[year]-[month]-[day] [hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
    );
    let date_only = format_description!("[year]-[month]-[day]");
    PrimitiveDateTime::parse(text, &with_t)
        .or_else(|_| PrimitiveDateTime::parse(text, &with_space))
        .or_else(|_| Date::parse(text, &date_only).map(Date::midnight))
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|_| RecordError::InvalidTimestamp(text.to_string()))
}

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    let format = format_description!("[day].[month].[year] - [hour]:[minute]:[second]");
    dt.format(&format).unwrap_or_else(|_| dt.to_string())
}

/// Chart axis label: wall-clock `HH:MM:SS` in the display offset
pub fn format_label(dt: &OffsetDateTime, offset: UtcOffset) -> String {
    let format = format_description!("[hour]:[minute]:[second]");
    let local = dt.to_offset(offset);
    local.format(&format).unwrap_or_else(|_| local.to_string())
}

fn stats(values: impl Iterator<Item = f64> + Clone) -> Stats {
    let count = values.clone().count() as f64;
    let sum: f64 = values.clone().sum();
    let min = values.clone().fold(f64::INFINITY, f64::min);
    let max = values.fold(f64::NEG_INFINITY, f64::max);

    Stats {
        min: round2(min),
        avg: round2(sum / count),
        max: round2(max),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-sensor statistics of the given readings
///
/// Readings are grouped by sensor id; the result is sorted by id and sensors
/// without readings are omitted. Names come from the catalogue, falling back
/// to "Unknown".
pub fn summarize(readings: &[Reading], catalogue: &SensorCatalogue) -> Vec<SensorSummary> {
    let mut grouped: BTreeMap<&str, Vec<&Reading>> = BTreeMap::new();
    for r in readings {
        grouped.entry(r.sensor_id.as_str()).or_default().push(r);
    }

    grouped
        .into_iter()
        .map(|(sensor_id, points)| SensorSummary {
            sensor_id: sensor_id.to_string(),
            name: catalogue
                .name_of(sensor_id)
                .map(str::to_string)
                .unwrap_or_else(|| "Unknown".to_string()),
            samples: points.len(),
            temperature: stats(points.iter().map(|r| r.temperature)),
            humidity: stats(points.iter().map(|r| r.humidity)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn rfc3339_with_offset_is_normalized_to_utc() {
        let dt = parse_timestamp_str("2024-05-01T09:00:00-03:00").unwrap();
        assert_eq!(dt, datetime!(2024-05-01 12:00:00 UTC));
        assert_eq!(dt.offset(), UtcOffset::UTC);
    }

    #[test]
    fn offsetless_forms_are_read_as_utc() {
        let expected = datetime!(2024-05-01 12:00:00 UTC);
        assert_eq!(parse_timestamp_str("2024-05-01T12:00:00").unwrap(), expected);
        assert_eq!(parse_timestamp_str("2024-05-01 12:00:00").unwrap(), expected);
        assert_eq!(
            parse_timestamp_str("2024-05-01T12:00:00.250").unwrap(),
            datetime!(2024-05-01 12:00:00.25 UTC)
        );
    }

    #[test]
    fn epoch_millis_and_strings_share_a_time_line() {
        let from_ms = parse_timestamp(&RawTimestamp::Millis(1_714_564_800_000)).unwrap();
        let from_str = parse_timestamp(&RawTimestamp::Text("2024-05-01T12:00:00.000Z".into())).unwrap();
        assert_eq!(from_ms, from_str);
    }

    #[test]
    fn minute_precision_and_bare_dates() {
        let noon = datetime!(2024-05-01 12:00:00 UTC);
        assert_eq!(parse_timestamp_str("2024-05-01T12:00").unwrap(), noon);
        assert_eq!(parse_timestamp_str("2024-05-01 12:00").unwrap(), noon);
        assert_eq!(
            parse_timestamp_str("2024-05-01").unwrap(),
            datetime!(2024-05-01 00:00:00 UTC)
        );
    }

    #[test]
    fn rfc2822_dates() {
        assert_eq!(
            parse_timestamp_str("Wed, 01 May 2024 12:00:00 GMT").unwrap(),
            datetime!(2024-05-01 12:00:00 UTC)
        );
        assert_eq!(
            parse_timestamp_str("Wed, 01 May 2024 09:00:00 -0300").unwrap(),
            datetime!(2024-05-01 12:00:00 UTC)
        );
    }

    #[test]
    fn fractional_millis_are_truncated() {
        assert_eq!(
            parse_timestamp(&RawTimestamp::FractionalMillis(1_714_564_800_000.0)).unwrap(),
            datetime!(2024-05-01 12:00:00 UTC)
        );
        assert_eq!(
            parse_timestamp(&RawTimestamp::FractionalMillis(1_714_564_800_001.9)).unwrap(),
            datetime!(2024-05-01 12:00:00.001 UTC)
        );
    }

    #[test]
    fn garbage_is_an_invalid_timestamp() {
        assert_eq!(
            parse_timestamp_str("not-a-date"),
            Err(RecordError::InvalidTimestamp("not-a-date".into()))
        );
        assert!(parse_timestamp_str("").is_err());
        assert!(parse_timestamp_str("2024-13-45T99:00:00Z").is_err());
        assert!(parse_timestamp_str("2024-05-01T12").is_err());
    }

    #[test]
    fn labels_use_display_offset() {
        let dt = datetime!(2024-05-01 12:34:56 UTC);
        assert_eq!(format_label(&dt, offset!(-3)), "09:34:56");
        assert_eq!(format_datetime(&dt), "01.05.2024 - 12:34:56");
    }

    #[test]
    fn summaries_group_by_sensor() {
        let at = datetime!(2024-05-01 12:00:00 UTC);
        let reading = |id: &str, t: f64, h: f64| Reading {
            sensor_id: id.to_string(),
            timestamp: at,
            temperature: t,
            humidity: h,
        };
        let readings = vec![
            reading("2", 30.0, 70.0),
            reading("1", 20.0, 50.0),
            reading("1", 22.0, 55.0),
        ];
        let catalogue = SensorCatalogue::from_pairs("1=São Paulo");

        let summary = summarize(&readings, &catalogue);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].sensor_id, "1");
        assert_eq!(summary[0].name, "São Paulo");
        assert_eq!(summary[0].samples, 2);
        assert_eq!(summary[0].temperature, Stats { min: 20.0, avg: 21.0, max: 22.0 });
        assert_eq!(summary[0].humidity.avg, 52.5);
        assert_eq!(summary[1].name, "Unknown");
    }
}
