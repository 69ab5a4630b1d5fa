use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use sensor_dashboard::source::parse_batch;
use sensor_dashboard::{FilterState, SeriesAggregator, SeriesPoint, TimeWindow};

const NOW: OffsetDateTime = datetime!(2024-05-01 12:00:00 UTC);

fn at(minutes_ago: i64) -> OffsetDateTime {
    NOW - Duration::minutes(minutes_ago)
}

fn record(sensor: Value, when: OffsetDateTime, temp: f64, humid: f64) -> Value {
    json!({
        "sensor_id": sensor,
        "timestamp": when.format(&Rfc3339).unwrap(),
        "temperatura": temp,
        "umidade": humid,
    })
}

fn aggregator(filter: FilterState) -> SeriesAggregator<impl Fn() -> OffsetDateTime> {
    SeriesAggregator::with_clock(filter, || NOW)
}

fn times(points: &[SeriesPoint]) -> Vec<OffsetDateTime> {
    points.iter().map(|p| p.time).collect()
}

fn scenario_batch() -> Vec<Value> {
    vec![
        record(json!("1"), at(10), 22.0, 60.0),
        record(json!(1), at(40), 21.0, 62.0),
        record(json!("2"), at(5), 30.0, 40.0),
    ]
}

#[test]
fn sensor_and_hour_filter_selects_matching_readings() {
    let mut agg = aggregator(FilterState::sensor("1", TimeWindow::LastHour));
    agg.load_batch(scenario_batch());

    let series = agg.visible_series();
    assert_eq!(times(&series.temperature), vec![at(10), at(40)]);
    assert_eq!(times(&series.humidity), vec![at(10), at(40)]);
    assert_eq!(
        series.temperature.iter().map(|p| p.value).collect::<Vec<_>>(),
        vec![22.0, 21.0]
    );
    assert_eq!(
        series.humidity.iter().map(|p| p.value).collect::<Vec<_>>(),
        vec![60.0, 62.0]
    );
}

#[test]
fn reading_exactly_one_hour_old_is_included() {
    let mut agg = aggregator(FilterState::all_sensors(TimeWindow::LastHour));
    agg.load_batch(vec![
        record(json!("1"), at(60), 20.0, 50.0),
        record(json!("1"), at(60) - Duration::seconds(1), 20.0, 50.0),
    ]);

    assert_eq!(times(&agg.visible_series().temperature), vec![at(60)]);
}

#[test]
fn empty_sensor_id_matches_all_sensors_in_every_window() {
    for window in TimeWindow::VARIANTS {
        let mut agg = aggregator(FilterState::new(Some(String::new()), window));
        agg.load_batch(scenario_batch());

        let expected: Vec<OffsetDateTime> = [at(10), at(40), at(5)]
            .into_iter()
            .filter(|t| match window.duration() {
                Some(d) => *t >= NOW - d,
                None => true,
            })
            .collect();
        assert_eq!(times(&agg.visible_series().temperature), expected, "window {}", window);
    }
}

#[test]
fn visible_set_is_exactly_the_filtered_working_set() {
    let batch = vec![
        record(json!("1"), at(1), 1.0, 1.0),
        record(json!("2"), at(20), 2.0, 2.0),
        record(json!(3), at(45), 3.0, 3.0),
        record(json!("1"), at(90), 4.0, 4.0),
        record(json!("2"), at(60 * 30), 5.0, 5.0),
    ];
    let filters = [
        (FilterState::all_sensors(TimeWindow::Last15Minutes), vec![1.0]),
        (FilterState::all_sensors(TimeWindow::Last30Minutes), vec![1.0, 2.0]),
        (FilterState::sensor("3", TimeWindow::LastHour), vec![3.0]),
        (FilterState::sensor("1", TimeWindow::Last24Hours), vec![1.0, 4.0]),
        (FilterState::sensor("2", TimeWindow::All), vec![2.0, 5.0]),
        (FilterState::sensor("9", TimeWindow::All), vec![]),
    ];

    let mut agg = aggregator(FilterState::default());
    agg.load_batch(batch);
    for (filter, expected) in filters {
        agg.set_filter(filter.clone());
        let values: Vec<f64> = agg.visible_series().temperature.iter().map(|p| p.value).collect();
        assert_eq!(values, expected, "filter {:?}", filter);
    }
}

#[test]
fn set_filter_is_idempotent() {
    let mut agg = aggregator(FilterState::default());
    agg.load_batch(scenario_batch());

    let filter = FilterState::sensor("1", TimeWindow::Last24Hours);
    agg.set_filter(filter.clone());
    let first = agg.visible_series().clone();
    agg.set_filter(filter);
    assert_eq!(agg.visible_series(), &first);
}

#[test]
fn valid_push_never_hides_visible_readings() {
    let mut agg = aggregator(FilterState::sensor("1", TimeWindow::LastHour));
    agg.load_batch(scenario_batch());
    let before = agg.visible_series().clone();

    agg.push_one(record(json!("2"), at(1), 25.0, 45.0));
    assert_eq!(agg.visible_series(), &before);

    agg.push_one(record(json!("1"), at(1), 23.0, 58.0));
    let after = agg.visible_series();
    assert_eq!(after.temperature[..before.len()], before.temperature[..]);
    assert_eq!(times(&after.temperature), vec![at(10), at(40), at(1)]);
}

#[test]
fn push_with_bad_timestamp_is_dropped_silently() {
    let mut agg = aggregator(FilterState::all_sensors(TimeWindow::All));
    agg.load_batch(scenario_batch());
    let before = agg.visible_series().clone();

    let report = agg.push_one(json!({
        "sensor_id": "1", "timestamp": "not-a-date", "temperatura": 20, "umidade": 50
    }));

    assert!(!report.is_clean());
    assert_eq!(agg.visible_series(), &before);
    assert_eq!(agg.working_set_len(), 3);
}

#[test]
fn batch_reflects_only_its_own_valid_records_under_active_filter() {
    let body = format!(
        r#"[
            {{"sensor_id": 1, "timestamp": "{}", "temperatura": "19.5", "umidade": "70"}},
            {{"sensor_id": 2, "timestamp": "invalid", "temperatura": 20, "umidade": 50}},
            {{"sensor_id": 1, "timestamp": {}, "temperatura": 18, "umidade": 72}},
            {{"sensor_id": 1, "timestamp": "{}", "temperatura": 17, "umidade": 74}},
            {{"timestamp": "{}", "temperatura": 17, "umidade": 74}}
        ]"#,
        at(3).format(&Rfc3339).unwrap(),
        (at(6).unix_timestamp_nanos() / 1_000_000) as i64,
        "2024-05-01 11:50:00",
        at(3).format(&Rfc3339).unwrap(),
    );

    let mut agg = aggregator(FilterState::all_sensors(TimeWindow::Last15Minutes));
    agg.push_one(record(json!("7"), at(1), 1.0, 1.0));
    let report = agg.load_batch(parse_batch(body.as_bytes()).unwrap());

    assert_eq!(report.accepted, 3);
    assert_eq!(report.rejected.len(), 2);
    assert_eq!(times(&agg.visible_series().temperature), vec![at(3), at(6), at(10)]);
    assert_eq!(
        agg.visible_series().humidity.iter().map(|p| p.value).collect::<Vec<_>>(),
        vec![70.0, 72.0, 74.0]
    );
}
