use futures_util::stream;
use log::{error, info, warn};
use time::UtcOffset;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use sensor_dashboard::config::DashboardConfig;
use sensor_dashboard::source::{parse_event_line, read_batch_file, SessionEvent};
use sensor_dashboard::utils::{format_datetime, summarize};
use sensor_dashboard::{ChartData, DashboardSession, Presenter, SeriesAggregator, VisibleSeries};

const EVENT_QUEUE_CAPACITY: usize = 64;

/// Logs the latest point of each chart whenever the view changes
struct LogPresenter {
    offset: UtcOffset,
}

impl Presenter for LogPresenter {
    fn present(&mut self, series: &VisibleSeries) {
        let temperature = ChartData::temperature(series, self.offset);
        let humidity = ChartData::humidity(series, self.offset);

        match (temperature.labels.last(), temperature.latest(), humidity.latest()) {
            (Some(label), Some(temp), Some(humid)) => info!(
                "{} visible points, latest at {}: {:.2}{} / {:.2}{}",
                series.len(),
                label,
                temp,
                temperature.unit,
                humid,
                humidity.unit
            ),
            _ => info!("No readings match the current filter"),
        }
    }
}

/// Forward stdin lines as session events until EOF
async fn read_events(tx: mpsc::Sender<SessionEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match parse_event_line(&line) {
                Ok(Some(event)) => {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Ignoring input line: {}", e),
            },
            Ok(None) => break,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match DashboardConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let mut aggregator = SeriesAggregator::new(config.initial_filter.clone());
    aggregator.set_order(config.order);
    let mut session = DashboardSession::new(
        aggregator,
        LogPresenter {
            offset: config.display_offset,
        },
    );

    info!(
        "Dashboard session opened at {}",
        format_datetime(&time::OffsetDateTime::now_utc())
    );

    if let Some(path) = &config.batch_file {
        match read_batch_file(path).await {
            Ok(records) => {
                session.load_batch(records);
            }
            Err(e) => error!("Initial batch from {} failed: {}", path.display(), e),
        }
    }

    let (event_tx, mut event_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    tokio::spawn(read_events(event_tx));
    let events = stream::poll_fn(move |cx| event_rx.poll_recv(cx));

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        let _ = tx.send(());
    });

    // Run the session or wait for shutdown signal
    tokio::select! {
        stats = session.run(events) => {
            info!("Input closed after {} accepted pushes", stats.pushes_accepted);
        }
        _ = &mut rx => {
            info!("Session terminated by user. Closing subscription.");
        }
    }

    // Print summary
    let readings = session.aggregator().visible_readings();
    for summary in summarize(&readings, &config.sensors) {
        info!("Summary for {} ({}):", summary.name, summary.sensor_id);
        info!(
            "  Temperature: min {:.2}°C, avg {:.2}°C, max {:.2}°C",
            summary.temperature.min, summary.temperature.avg, summary.temperature.max
        );
        info!(
            "  Humidity: min {:.2}%, avg {:.2}%, max {:.2}%",
            summary.humidity.min, summary.humidity.avg, summary.humidity.max
        );
        info!("  Based on {} samples", summary.samples);
    }

    if readings.is_empty() {
        warn!("No readings visible at session end!");
    }
    if session.aggregator().rejected_total() > 0 {
        warn!(
            "{} records were dropped during the session",
            session.aggregator().rejected_total()
        );
    }

    Ok(())
}
