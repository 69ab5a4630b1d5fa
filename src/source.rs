/// Decoding of data-source inputs: batch bodies and session event lines
use serde_json::Value;
use std::path::Path;

use crate::error::SourceError;
use crate::filter::{FilterState, TimeWindow};

/// Something that happens to a running dashboard session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A record delivered by the live subscription
    Push(Value),
    /// A new selection from the filter controls
    Filter(FilterState),
}

/// Split a batch response body into individual records
///
/// The body must be a JSON array; its elements are kept untyped so that a
/// single bad record cannot fail the whole batch.
pub fn parse_batch(body: &[u8]) -> Result<Vec<Value>, SourceError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Array(records) => Ok(records),
        _ => Err(SourceError::NotAnArray),
    }
}

pub async fn read_batch_file(path: &Path) -> Result<Vec<Value>, SourceError> {
    let body = tokio::fs::read(path).await?;
    parse_batch(&body)
}

/// Parse one input line into a session event
///
/// `filter <sensor|*> <window>` changes the filter, anything else must be a
/// JSON record. Blank lines yield `None`. Push lines that are not valid JSON
/// are passed through as JSON strings so the aggregator drops and reports
/// them like any other malformed record.
pub fn parse_event_line(line: &str) -> Result<Option<SessionEvent>, SourceError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    if let Some(args) = line.strip_prefix("filter") {
        if args.is_empty() || args.starts_with(char::is_whitespace) {
            return parse_filter_command(args).map(|f| Some(SessionEvent::Filter(f)));
        }
    }

    let value = serde_json::from_str(line).unwrap_or_else(|_| Value::String(line.to_string()));
    Ok(Some(SessionEvent::Push(value)))
}

fn parse_filter_command(args: &str) -> Result<FilterState, SourceError> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let (sensor, window) = match parts.as_slice() {
        [sensor, window] => (*sensor, *window),
        _ => {
            return Err(SourceError::InvalidCommand(format!(
                "expected 'filter <sensor|*> <window>', got 'filter{}'",
                args
            )))
        }
    };

    let window: TimeWindow = window
        .parse()
        .map_err(|e| SourceError::InvalidCommand(format!("{}", e)))?;
    let sensor = match sensor {
        "*" => None,
        id => Some(id.to_string()),
    };
    Ok(FilterState::new(sensor, window))
}
