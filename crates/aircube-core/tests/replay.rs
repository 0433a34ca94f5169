use aircube_core::config::ReplayConfig;
use aircube_core::datalog::{
    load_rows, CancelFlag, LoadError, ManualClock, ReplayDriver, Row, TimeScale, Timeline,
    WindowSnapshot,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::io::Write;
use std::time::Duration;

/// Copies of every snapshot handed to the sink
#[derive(Default)]
struct RecordingSink {
    frames: Vec<Frame>,
}

#[derive(Debug, Clone, PartialEq)]
struct Frame {
    time: Vec<f64>,
    temperature_c: Vec<f64>,
    eco2: Vec<f64>,
}

impl aircube_core::datalog::RenderSink for RecordingSink {
    fn render(&mut self, snapshot: &WindowSnapshot<'_>) {
        assert_eq!(snapshot.time.len(), snapshot.temperature_c.len());
        assert_eq!(snapshot.time.len(), snapshot.humidity.len());
        assert_eq!(snapshot.time.len(), snapshot.aqi.len());
        assert_eq!(snapshot.time.len(), snapshot.eco2.len());
        assert_eq!(snapshot.time.len(), snapshot.etvoc.len());
        self.frames.push(Frame {
            time: snapshot.time.to_vec(),
            temperature_c: snapshot.temperature_c.to_vec(),
            eco2: snapshot.eco2.to_vec(),
        });
    }
}

fn config(speed: f64, max_window_size: usize, preload_count: usize) -> ReplayConfig {
    ReplayConfig {
        speed,
        max_window_size,
        preload_count,
        ..ReplayConfig::default()
    }
}

fn sample(ts: &str, temp: &str) -> Row {
    Row::from_pairs([
        ("timestamp", ts),
        ("temperature_c", temp),
        ("humidity", "40.0"),
        ("aqi", "1"),
        ("eco2", "420"),
        ("etvoc", "30"),
    ])
}

fn replay(rows: Vec<Row>, cfg: &ReplayConfig) -> (RecordingSink, ManualClock, aircube_core::datalog::ReplaySummary) {
    let timeline = Timeline::from_rows(rows);
    let mut driver = ReplayDriver::new(cfg, ManualClock::new(), CancelFlag::new());
    let mut sink = RecordingSink::default();
    let summary = driver.run(&timeline, &mut sink);
    (sink, driver.clock().clone(), summary)
}

#[test]
fn test_end_to_end_millisecond_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sensor_log.csv");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "timestamp,ens210_status,temperature_c,temperature_f,humidity,ens16x_status,etvoc,eco2,aqi").unwrap();
    writeln!(f, "2000,0,22.0,71.6,40.0,OK,30,420,1").unwrap();
    writeln!(f, "0,0,20.0,68.0,40.0,OK,30,420,1").unwrap();
    writeln!(f, "1000,0,21.0,69.8,40.0,OK,30,420,1").unwrap();
    drop(f);

    let rows = load_rows(&path).unwrap();
    let timeline = Timeline::from_rows(rows);
    assert_eq!(timeline.scale(), TimeScale::Milliseconds);

    let mut driver = ReplayDriver::new(&config(1.0, 300, 0), ManualClock::new(), CancelFlag::new());
    let mut sink = RecordingSink::default();
    let summary = driver.run(&timeline, &mut sink);

    let last = sink.frames.last().unwrap();
    assert_eq!(last.time, vec![0.0, 1.0, 2.0]);
    assert_eq!(last.temperature_c, vec![20.0, 21.0, 22.0]);
    assert_eq!(summary.emitted, 3);
    assert_eq!(
        driver.clock().sleeps(),
        &[Duration::from_secs(1), Duration::from_secs(1)]
    );
}

#[test]
fn test_missing_source_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_rows(dir.path().join("sensor_log.csv")).unwrap_err();
    assert!(matches!(err, LoadError::NotFound(_)));
}

#[test]
fn test_preload_never_sleeps() {
    let rows: Vec<Row> = (0..10)
        .map(|i| sample(&(i * 60_000).to_string(), "20"))
        .collect();

    let (sink, clock, summary) = replay(rows, &config(1.0, 300, 10));
    assert!(clock.sleeps().is_empty());
    assert_eq!(summary.preloaded, 10);
    // preload hand-off plus the final one
    assert_eq!(sink.frames.len(), 2);
    assert_eq!(sink.frames[0].time.len(), 10);
}

#[test]
fn test_preload_truncates_to_window() {
    let rows: Vec<Row> = (0..8).map(|i| sample(&i.to_string(), "20")).collect();

    let (sink, _, _) = replay(rows, &config(1.0, 3, 8));
    assert_eq!(sink.frames[0].time, vec![5.0, 6.0, 7.0]);
}

#[test]
fn test_rows_missing_temperature_are_skipped() {
    let rows = vec![
        sample("0", "20"),
        sample("1", ""),
        Row::from_pairs([("timestamp", "2"), ("temperature_c", "22"), ("humidity", "40"), ("aqi", "1")]),
    ];

    let (sink, clock, summary) = replay(rows, &config(1.0, 10, 1));
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.emitted, 2);

    let last = sink.frames.last().unwrap();
    assert_eq!(last.time, vec![0.0, 2.0]);
    assert!(last.eco2[1].is_nan());

    // The skipped row still moves the pacing reference forward
    assert_eq!(clock.sleeps(), &[Duration::from_secs(1), Duration::from_secs(1)]);
}

#[test]
fn test_nothing_preloaded_paces_from_first_row() {
    let rows = vec![sample("10", "20"), sample("12", "21")];

    let (sink, clock, summary) = replay(rows, &config(2.0, 10, 0));
    // the first row has no gap to wait for
    assert_eq!(clock.sleeps(), &[Duration::from_secs(1)]);
    assert_eq!(summary.hand_offs, 4);
    assert!(sink.frames[0].time.is_empty());
    assert_eq!(sink.frames.last().unwrap().time, vec![0.0, 2.0]);
}

#[test]
fn test_cancellation_mid_pacing_hands_off_once() {
    let rows: Vec<Row> = (0..6).map(|i| sample(&i.to_string(), "20")).collect();
    let timeline = Timeline::from_rows(rows);

    let cancel = CancelFlag::new();
    let clock = ManualClock::new().cancel_during_sleep(2, cancel.clone());
    let mut driver = ReplayDriver::new(&config(1.0, 10, 2), clock, cancel);
    let mut sink = RecordingSink::default();
    let summary = driver.run(&timeline, &mut sink);

    assert!(summary.cancelled);
    // preload, one paced sample, final
    assert_eq!(sink.frames.len(), 3);
    assert_eq!(sink.frames.last().unwrap().time, vec![0.0, 1.0, 2.0]);
    assert_eq!(sink.frames[1], sink.frames[2]);
    assert_eq!(driver.clock().sleeps().len(), 2);
}

#[test]
fn test_cancelled_before_pacing() {
    let rows: Vec<Row> = (0..4).map(|i| sample(&i.to_string(), "20")).collect();
    let timeline = Timeline::from_rows(rows);

    let cancel = CancelFlag::new();
    cancel.cancel();
    let mut driver = ReplayDriver::new(&config(1.0, 10, 1), ManualClock::new(), cancel);
    let mut sink = RecordingSink::default();
    let summary = driver.run(&timeline, &mut sink);

    assert!(summary.cancelled);
    assert_eq!(sink.frames.len(), 2);
    assert!(driver.clock().sleeps().is_empty());
}

#[test]
fn test_speed_scales_waits() {
    let rows = vec![sample("0", "20"), sample("4", "20")];

    let (_, fast, _) = replay(rows.clone(), &config(4.0, 10, 1));
    let (_, slow, _) = replay(rows, &config(0.5, 10, 1));
    assert_eq!(fast.elapsed(), Duration::from_secs(1));
    assert_eq!(slow.elapsed(), Duration::from_secs(8));
}

proptest! {
    #[test]
    fn prop_window_never_exceeds_capacity(
        times in prop::collection::vec(0u32..10_000, 0..120),
        capacity in 1usize..20,
        preload in 0usize..40,
    ) {
        let rows: Vec<Row> = times.iter().map(|t| sample(&t.to_string(), "20")).collect();
        let (sink, _, summary) = replay(rows, &config(1000.0, capacity, preload));

        for frame in &sink.frames {
            prop_assert!(frame.time.len() <= capacity);
        }
        prop_assert_eq!(summary.emitted + summary.skipped, times.len());
    }

    #[test]
    fn prop_timeline_sorted_and_stable(times in prop::collection::vec(0u32..20, 0..60)) {
        let rows: Vec<Row> = times
            .iter()
            .enumerate()
            .map(|(i, t)| Row::from_pairs([("timestamp", t.to_string()), ("aqi", i.to_string())]))
            .collect();
        let timeline = Timeline::from_rows(rows);
        let records = timeline.records();

        for pair in records.windows(2) {
            prop_assert!(pair[0].raw_time <= pair[1].raw_time);
            if pair[0].raw_time == pair[1].raw_time {
                prop_assert!(pair[0].aqi < pair[1].aqi);
            }
        }
    }
}
