//! Log file format
//!
//! Reads and appends the CSV logs produced by the AirCube logger.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Column order written by the serial logger
pub const LOG_HEADER: [&str; 9] = [
    "timestamp",
    "ens210_status",
    "temperature_c",
    "temperature_f",
    "humidity",
    "ens16x_status",
    "etvoc",
    "eco2",
    "aqi",
];

/// Errors that can occur while loading a log
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("CSV file '{0}' not found")]
    NotFound(PathBuf),

    #[error("CSV file '{0}' is empty or has no data rows")]
    Empty(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl LoadError {
    /// Whether this error means there is nothing to replay
    pub fn is_missing_source(&self) -> bool {
        matches!(self, LoadError::NotFound(_) | LoadError::Empty(_))
    }
}

/// One data row keyed by header name
///
/// Values are kept as raw strings; numeric interpretation is left to the
/// consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    fields: HashMap<String, String>,
}

impl Row {
    /// Build a row from name/value pairs
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Raw value of a field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Whether the row has a value for `name`
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Parse a field as a number
    ///
    /// Missing, empty and non-numeric values all yield `None`. Surrounding
    /// whitespace is ignored.
    pub fn parse_f64(&self, name: &str) -> Option<f64> {
        let value = self.get(name)?.trim();
        if value.is_empty() {
            return None;
        }
        value.parse::<f64>().ok()
    }
}

/// A parsed log: header plus rows in file order
#[derive(Debug, Clone, Default)]
pub struct CsvLog {
    /// Header names in column order
    pub headers: Vec<String>,
    /// Data rows in file order
    pub rows: Vec<Row>,
}

impl CsvLog {
    /// Whether the header has a column named `name`
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }
}

/// Read a log file with its header
///
/// Rows with fewer fields than the header simply lack the trailing keys;
/// surplus fields are dropped. Blank lines are skipped.
pub fn read_log<P: AsRef<Path>>(path: P) -> Result<CsvLog, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = Row::from_pairs(
            headers
                .iter()
                .zip(record.iter())
                .map(|(name, value)| (name.as_str(), value)),
        );
        rows.push(row);
    }

    Ok(CsvLog { headers, rows })
}

/// Load all data rows of a log
///
/// Fails with [`LoadError::NotFound`] when the file does not exist and with
/// [`LoadError::Empty`] when it has no data rows.
pub fn load_rows<P: AsRef<Path>>(path: P) -> Result<Vec<Row>, LoadError> {
    let path = path.as_ref();
    let log = read_log(path)?;
    if log.rows.is_empty() {
        return Err(LoadError::Empty(path.to_path_buf()));
    }
    Ok(log.rows)
}

/// Appending CSV writer that flushes after every row
pub struct CsvLogWriter {
    writer: csv::Writer<File>,
    header: Vec<String>,
}

impl CsvLogWriter {
    /// Open `path` for appending, writing `header` first if the file is new
    /// or empty
    ///
    /// An existing file keeps its own header, available from
    /// [`CsvLogWriter::header`].
    pub fn open<P: AsRef<Path>>(path: P, header: &[&str]) -> io::Result<Self> {
        let path = path.as_ref();
        let existing = match std::fs::metadata(path) {
            Ok(meta) if meta.len() > 0 => Some(read_header(path)?),
            Ok(_) => None,
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file);

        let header = match existing {
            Some(existing) => existing,
            None => {
                writer.write_record(header).map_err(csv_to_io)?;
                writer.flush()?;
                header.iter().map(|h| h.to_string()).collect()
            }
        };

        Ok(Self { writer, header })
    }

    /// Create `path`, replacing any existing content, and write `header`
    pub fn create<P: AsRef<Path>>(path: P, header: &[&str]) -> io::Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(File::create(path)?);
        writer.write_record(header).map_err(csv_to_io)?;
        writer.flush()?;

        Ok(Self {
            writer,
            header: header.iter().map(|h| h.to_string()).collect(),
        })
    }

    /// Header of the file being appended to
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Append one row and flush it to disk
    pub fn write_row<I, T>(&mut self, fields: I) -> io::Result<()>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer.write_record(fields).map_err(csv_to_io)?;
        self.writer.flush()
    }
}

fn read_header(path: &Path) -> io::Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_to_io)?;
    let header = reader.headers().map_err(csv_to_io)?;
    Ok(header.iter().map(str::to_string).collect())
}

fn csv_to_io(e: csv::Error) -> io::Error {
    match e.into_kind() {
        csv::ErrorKind::Io(err) => err,
        other => io::Error::new(io::ErrorKind::Other, format!("{:?}", other)),
    }
}
