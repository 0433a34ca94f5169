//! Live log tailing
//!
//! Rebuilds the most recent window from a log that is still being written.

use std::path::Path;

use super::{fields, read_log, CsvLog, LoadError, Row, SlidingWindow, WindowPoint};

/// Read the last `max_points` samples of a growing log
///
/// The x value is `pc_time` when the header has that column, otherwise
/// `timestamp`, otherwise the row index. Clock based x values are made
/// relative to the first accepted row. A row is skipped when its time or
/// any sensor value cannot be parsed; a sensor column missing from the
/// header reads as NaN.
///
/// Returns `Ok(None)` when the file is missing, has no header or yields no
/// samples, so callers keep showing what they had.
pub fn read_live_window<P: AsRef<Path>>(
    path: P,
    max_points: usize,
) -> Result<Option<SlidingWindow>, LoadError> {
    let log = match read_log(path) {
        Ok(log) => log,
        Err(LoadError::NotFound(_)) => return Ok(None),
        Err(e) => return Err(e),
    };
    if log.headers.is_empty() {
        return Ok(None);
    }
    Ok(live_window(&log, max_points))
}

fn live_window(log: &CsvLog, max_points: usize) -> Option<SlidingWindow> {
    let time_column = [fields::PC_TIME, fields::TIMESTAMP]
        .into_iter()
        .find(|name| log.has_column(name));

    let mut window = SlidingWindow::new(max_points);
    let mut t0 = None;
    let mut accepted = 0usize;

    for (idx, row) in log.rows.iter().enumerate() {
        let Some(mut point) = live_point(log, row, time_column, idx) else {
            continue;
        };
        if time_column.is_some() {
            let start = *t0.get_or_insert(point.time);
            point.time -= start;
        }
        window.push(point);
        accepted += 1;
    }

    tracing::trace!(rows = log.rows.len(), accepted, "Refreshed live window");
    (accepted > 0).then_some(window)
}

fn live_point(log: &CsvLog, row: &Row, time_column: Option<&str>, idx: usize) -> Option<WindowPoint> {
    let time = match time_column {
        Some(name) => row.parse_f64(name)?,
        None => idx as f64,
    };

    let value = |name: &str| {
        if log.has_column(name) {
            row.parse_f64(name)
        } else {
            Some(f64::NAN)
        }
    };

    Some(WindowPoint {
        time,
        temperature_c: value(fields::TEMPERATURE_C)?,
        humidity: value(fields::HUMIDITY)?,
        aqi: value(fields::AQI)?,
        eco2: value(fields::ECO2)?,
        etvoc: value(fields::ETVOC)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn log_file(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensor_log.csv");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(content.as_bytes())
            .unwrap();
        (dir, path)
    }

    #[test]
    fn test_missing_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let window = read_live_window(dir.path().join("missing.csv"), 10).unwrap();
        assert!(window.is_none());
    }

    #[test]
    fn test_prefers_pc_time_and_normalizes() {
        let (_dir, path) = log_file(
            "timestamp,pc_time,temperature_c,humidity,aqi,eco2,etvoc\n\
             5000,100.5,20,40,1,400,10\n\
             6000,101.5,21,41,1,410,11\n",
        );

        let mut window = read_live_window(&path, 10).unwrap().unwrap();
        assert_eq!(window.snapshot().time, &[0.0, 1.0]);
    }

    #[test]
    fn test_skips_malformed_rows_and_keeps_tail() {
        let (_dir, path) = log_file(
            "timestamp,temperature_c,humidity,aqi,eco2,etvoc\n\
             0,20,40,1,400,10\n\
             1000,,40,1,400,10\n\
             2000,22,42,1,400,10\n\
             3000,23,43,1,400,10\n",
        );

        let mut window = read_live_window(&path, 2).unwrap().unwrap();
        let snapshot = window.snapshot();
        assert_eq!(snapshot.time, &[2000.0, 3000.0]);
        assert_eq!(snapshot.temperature_c, &[22.0, 23.0]);
    }

    #[test]
    fn test_absent_gas_columns_read_as_nan() {
        let (_dir, path) = log_file("temperature_c,humidity,aqi\n20,40,1\n21,41,2\n");

        let mut window = read_live_window(&path, 10).unwrap().unwrap();
        let snapshot = window.snapshot();
        assert_eq!(snapshot.time, &[0.0, 1.0]);
        assert!(snapshot.eco2.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_header_only_yields_nothing() {
        let (_dir, path) = log_file("timestamp,temperature_c,humidity,aqi\n");
        assert!(read_live_window(&path, 10).unwrap().is_none());
    }
}
