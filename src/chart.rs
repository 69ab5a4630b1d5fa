/// Chart datasets derived from the visible series
use time::UtcOffset;

use crate::models::{SeriesPoint, VisibleSeries};
use crate::utils::format_label;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub title: &'static str,
    pub unit: &'static str,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartData {
    pub fn temperature(series: &VisibleSeries, offset: UtcOffset) -> Self {
        Self::build("Temperature", "°C", &series.temperature, offset)
    }

    pub fn humidity(series: &VisibleSeries, offset: UtcOffset) -> Self {
        Self::build("Relative humidity", "%", &series.humidity, offset)
    }

    fn build(
        title: &'static str,
        unit: &'static str,
        points: &[SeriesPoint],
        offset: UtcOffset,
    ) -> Self {
        ChartData {
            title,
            unit,
            labels: points.iter().map(|p| format_label(&p.time, offset)).collect(),
            values: points.iter().map(|p| p.value).collect(),
        }
    }

    /// Most recent value in display order
    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied()
    }
}
