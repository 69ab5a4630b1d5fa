/// One dashboard session: a single consumer applying events to an aggregator
use futures_util::{Stream, StreamExt};
use log::info;
use serde_json::Value;

use crate::aggregator::{Clock, IngestReport, SeriesAggregator};
use crate::models::VisibleSeries;
use crate::source::SessionEvent;

/// Receives the visible series after every mutating call
pub trait Presenter {
    fn present(&mut self, series: &VisibleSeries);
}

impl<F> Presenter for F
where
    F: FnMut(&VisibleSeries),
{
    fn present(&mut self, series: &VisibleSeries) {
        self(series)
    }
}

/// Counters for a finished session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub pushes_accepted: usize,
    pub pushes_rejected: usize,
    pub filter_changes: usize,
}

pub struct DashboardSession<C, P> {
    aggregator: SeriesAggregator<C>,
    presenter: P,
}

impl<C: Clock, P: Presenter> DashboardSession<C, P> {
    pub fn new(aggregator: SeriesAggregator<C>, presenter: P) -> Self {
        DashboardSession {
            aggregator,
            presenter,
        }
    }

    pub fn aggregator(&self) -> &SeriesAggregator<C> {
        &self.aggregator
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn load_batch(&mut self, records: Vec<Value>) -> IngestReport {
        let report = self.aggregator.load_batch(records);
        info!(
            "Initial batch: {} readings loaded, {} dropped",
            report.accepted,
            report.rejected.len()
        );
        self.presenter.present(self.aggregator.visible_series());
        report
    }

    pub fn apply(&mut self, event: SessionEvent, stats: &mut SessionStats) {
        match event {
            SessionEvent::Push(record) => {
                let report = self.aggregator.push_one(record);
                stats.pushes_accepted += report.accepted;
                stats.pushes_rejected += report.rejected.len();
            }
            SessionEvent::Filter(filter) => {
                info!(
                    "Filter changed: sensor={}, window={}",
                    filter.sensor_id.as_deref().unwrap_or("*"),
                    filter.window
                );
                self.aggregator.set_filter(filter);
                stats.filter_changes += 1;
            }
        }
        self.presenter.present(self.aggregator.visible_series());
    }

    /// Consume events until the stream ends
    ///
    /// Each event runs to completion before the next one is polled. The
    /// working set lives as long as the session value, so dropping the
    /// session after `run` returns discards it.
    pub async fn run<S>(&mut self, events: S) -> SessionStats
    where
        S: Stream<Item = SessionEvent>,
    {
        let mut stats = SessionStats::default();
        futures_util::pin_mut!(events);

        while let Some(event) = events.next().await {
            self.apply(event, &mut stats);
        }

        info!(
            "Session stream closed: {} pushes accepted, {} dropped, {} filter changes",
            stats.pushes_accepted, stats.pushes_rejected, stats.filter_changes
        );
        stats
    }
}
