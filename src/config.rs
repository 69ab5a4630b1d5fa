use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::path::PathBuf;
use time::UtcOffset;

use crate::error::ConfigError;
use crate::filter::{FilterState, TimeWindow};

/// Display offset used when none is configured (America/Sao_Paulo, no DST)
pub const DEFAULT_DISPLAY_OFFSET: &str = "-03:00";

/// Order of points in the visible series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeriesOrder {
    /// Arrival order in the working set
    #[default]
    Arrival,
    /// Sorted by timestamp, arrival order breaks ties
    Chronological,
}

impl std::str::FromStr for SeriesOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arrival" => Ok(SeriesOrder::Arrival),
            "chronological" => Ok(SeriesOrder::Chronological),
            _ => Err(ConfigError::InvalidOrder(s.to_string())),
        }
    }
}

/// Known sensors and their display names
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorCatalogue {
    names: BTreeMap<String, String>,
}

impl SensorCatalogue {
    /// Parse `id=name` pairs separated by commas; malformed pairs are skipped
    pub fn from_pairs(spec: &str) -> Self {
        let mut names = BTreeMap::new();
        for pair in spec.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            if let Some((id, name)) = pair.split_once('=') {
                let id = id.trim();
                let name = name.trim();
                if !id.is_empty() && !name.is_empty() {
                    names.insert(id.to_string(), name.to_string());
                }
            } else {
                debug!("Skipping sensor pair without '=': '{}'", pair);
            }
        }
        SensorCatalogue { names }
    }

    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(id.into(), name.into());
    }

    pub fn name_of(&self, sensor_id: &str) -> Option<&str> {
        self.names.get(sensor_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub sensors: SensorCatalogue,
    pub initial_filter: FilterState,
    pub display_offset: UtcOffset,
    pub order: SeriesOrder,
    pub batch_file: Option<PathBuf>,
}

impl DashboardConfig {
    pub fn new() -> Result<Self, ConfigError> {
        // Load environment variables
        dotenv::dotenv().ok();
        Self::from_vars(env::vars())
    }

    /// Build the configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();

        // Try SENSOR_NAMES format first
        let sensors = if let Some(spec) = vars.get("SENSOR_NAMES") {
            debug!("Found SENSOR_NAMES: '{}'", spec);
            SensorCatalogue::from_pairs(spec)
        } else {
            // Fallback to individual environment variables
            let mut catalogue = SensorCatalogue::default();
            for (key, value) in &vars {
                if let Some(index) = key
                    .strip_prefix("SENSOR_")
                    .and_then(|s| s.strip_suffix("_ID"))
                {
                    let name_key = format!("SENSOR_{}_NAME", index);
                    if let Some(name) = vars.get(&name_key) {
                        catalogue.insert(value.trim(), name.trim());
                    }
                }
            }
            catalogue
        };

        let window = match vars.get("DEFAULT_WINDOW") {
            Some(w) => w.parse::<TimeWindow>()?,
            None => TimeWindow::default(),
        };
        let initial_filter = FilterState::new(vars.get("DEFAULT_SENSOR").cloned(), window);

        let display_offset = parse_offset(
            vars.get("DISPLAY_UTC_OFFSET")
                .map(String::as_str)
                .unwrap_or(DEFAULT_DISPLAY_OFFSET),
        )?;

        let order = match vars.get("SERIES_ORDER") {
            Some(o) => o.parse::<SeriesOrder>()?,
            None => SeriesOrder::default(),
        };

        let batch_file = vars
            .get("BATCH_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        info!("Total sensors in catalogue: {}", sensors.len());
        for (id, name) in sensors.iter() {
            debug!("Sensor: {} -> {}", id, name);
        }

        Ok(DashboardConfig {
            sensors,
            initial_filter,
            display_offset,
            order,
            batch_file,
        })
    }
}

/// Parse `+HH:MM`, `-HH:MM`, `Z` or `UTC`
pub fn parse_offset(text: &str) -> Result<UtcOffset, ConfigError> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("z") || text.eq_ignore_ascii_case("utc") {
        return Ok(UtcOffset::UTC);
    }

    let invalid = || ConfigError::InvalidOffset(text.to_string());
    let (sign, rest) = match text.as_bytes().first() {
        Some(b'+') => (1i8, &text[1..]),
        Some(b'-') => (-1i8, &text[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i8 = hours.parse().map_err(|_| invalid())?;
    let minutes: i8 = minutes.parse().map_err(|_| invalid())?;
    if !(0..=23).contains(&hours) || !(0..=59).contains(&minutes) {
        return Err(invalid());
    }

    UtcOffset::from_hms(sign * hours, sign * minutes, 0).map_err(|_| invalid())
}
