//! CSV Replay Adapter
//!
//! Loads a header-first CSV export from the machine data logger into a
//! columnar [`SensorLog`]. One column carries the timestamp (name from
//! `[input] timestamp_column`); every other column becomes a numeric channel
//! keyed by its header.
//!
//! Accepted timestamp forms: epoch seconds or milliseconds, RFC 3339, and
//! `YYYY-MM-DD HH:MM:SS[.f]` read as UTC. Empty, `nan`, `null` and `-` cells
//! are missing readings.
//!
//! # Usage
//!
//! ```ignore
//! use tbm_report::replay;
//!
//! let (log, info) = replay::load("shift.csv", &config.input)?;
//! let report = ShiftReport::build(&log, &config)?;
//! ```
//!
//! Row order is preserved; ordering is checked by the analyses.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::InputConfig;
use crate::types::SensorLog;

/// Rows with a bad timestamp that are logged individually
const MAX_LOGGED_ROW_ERRORS: usize = 10;

/// Epoch values above this are read as milliseconds
const EPOCH_MILLIS_CUTOFF: i64 = 10_000_000_000;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("empty file: no header row")]
    MissingHeader,
    #[error("timestamp column '{0}' not found in header")]
    MissingTimestampColumn(String),
    #[error("cannot parse timestamp: '{0}'")]
    BadTimestamp(String),
    #[error("no valid rows ({skipped} skipped)")]
    NoRows { skipped: usize },
}

/// Metadata about a loaded CSV
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayInfo {
    pub rows_loaded: usize,
    /// Rows dropped for an unparseable timestamp
    pub skipped_rows: usize,
    pub channels: Vec<String>,
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

// ============================================================================
// CSV Parsing Helpers
// ============================================================================

/// Split a CSV line respecting quoted fields (handles commas inside quotes).
/// Returns owned strings because quoted fields need unquoting.
fn csv_split(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

/// Parse a numeric cell; placeholders and non-finite values are missing.
fn parse_cell(cell: &str) -> Option<f64> {
    let s = cell.trim();
    if s.is_empty()
        || s == "-"
        || s.eq_ignore_ascii_case("nan")
        || s.eq_ignore_ascii_case("null")
    {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse the supported timestamp forms into UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ReplayError> {
    let s = raw.trim().trim_matches('"');
    let bad = || ReplayError::BadTimestamp(s.to_string());

    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return Err(bad());
    }

    // Unix epoch, seconds or milliseconds
    if let Ok(epoch) = s.parse::<i64>() {
        let parsed = if epoch.abs() > EPOCH_MILLIS_CUTOFF {
            DateTime::from_timestamp_millis(epoch)
        } else {
            DateTime::from_timestamp(epoch, 0)
        };
        return parsed.ok_or_else(bad);
    }
    if let Ok(epoch) = s.parse::<f64>() {
        if epoch.is_finite() {
            let micros = (epoch * 1e6).round() as i64;
            return DateTime::from_timestamp_micros(micros).ok_or_else(bad);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt.with_timezone(&Utc));
    }

    // Without timezone (assume UTC)
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.and_utc());
        }
    }

    Err(bad())
}

// ============================================================================
// Loading
// ============================================================================

/// Load a CSV file from disk.
pub fn load(
    path: impl AsRef<Path>,
    input: &InputConfig,
) -> Result<(SensorLog, ReplayInfo), ReplayError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ReplayError::Io {
        path: path.display().to_string(),
        source,
    })?;
    info!(file = %path.display(), "Loading CSV");
    from_reader(BufReader::new(file), input)
}

/// Load CSV text from any buffered reader.
pub fn from_reader<R: BufRead>(
    reader: R,
    input: &InputConfig,
) -> Result<(SensorLog, ReplayInfo), ReplayError> {
    let io_err = |source: std::io::Error| ReplayError::Io {
        path: "<input>".to_string(),
        source,
    };
    let mut lines = reader.lines();

    let header_line = loop {
        match lines.next() {
            Some(line) => {
                let line = line.map_err(io_err)?;
                if !line.trim().is_empty() {
                    break line;
                }
            }
            None => return Err(ReplayError::MissingHeader),
        }
    };

    let header: Vec<String> = csv_split(header_line.trim_start_matches('\u{feff}'))
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();
    let time_idx = header
        .iter()
        .position(|h| *h == input.timestamp_column)
        .ok_or_else(|| ReplayError::MissingTimestampColumn(input.timestamp_column.clone()))?;

    let channel_columns: Vec<(usize, &str)> = header
        .iter()
        .enumerate()
        .filter(|&(i, name)| i != time_idx && !name.is_empty())
        .map(|(i, name)| (i, name.as_str()))
        .collect();
    debug!(
        timestamp_column = %input.timestamp_column,
        channels = channel_columns.len(),
        "CSV header parsed"
    );

    let mut timestamps = Vec::new();
    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); channel_columns.len()];
    let mut skipped = 0usize;
    let mut line_num = 1usize;

    for line in lines {
        line_num += 1;
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }

        let fields = csv_split(&line);
        let raw_time = fields.get(time_idx).map_or("", String::as_str);
        let timestamp = match parse_timestamp(raw_time) {
            Ok(t) => t,
            Err(e) => {
                if skipped < MAX_LOGGED_ROW_ERRORS {
                    warn!(line = line_num, error = %e, "Skipping row");
                }
                skipped += 1;
                continue;
            }
        };

        timestamps.push(timestamp);
        for (column, &(idx, _)) in columns.iter_mut().zip(&channel_columns) {
            column.push(fields.get(idx).and_then(|c| parse_cell(c)));
        }
    }

    if timestamps.is_empty() {
        return Err(ReplayError::NoRows { skipped });
    }
    if skipped > MAX_LOGGED_ROW_ERRORS {
        warn!(skipped, "Further unparseable rows were not logged");
    }

    let mut log = SensorLog::new(timestamps);
    for ((_, name), values) in channel_columns.iter().zip(columns) {
        // Lengths match by construction; only duplicate headers can collide
        if log.has_channel(name) {
            warn!(channel = %name, "Duplicate column, keeping the first");
            continue;
        }
        if let Err(e) = log.insert_channel(*name, values) {
            warn!(channel = %name, error = %e, "Dropping column");
        }
    }

    let info = ReplayInfo {
        rows_loaded: log.len(),
        skipped_rows: skipped,
        channels: log.channel_names().map(str::to_string).collect(),
        time_range: log.time_range(),
    };

    info!(
        rows = info.rows_loaded,
        skipped = info.skipped_rows,
        channels = info.channels.len(),
        "CSV loaded"
    );

    Ok((log, info))
}
