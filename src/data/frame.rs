//! Provider-shaped tables
//!
//! Market-data providers hand back tables whose shape varies: multi-level
//! column headers, `Adj Close` instead of `Close`, the time axis named
//! `Date`, `Datetime` or `index`. `RawFrame` holds such a table as strings
//! and `to_series` normalizes it into a `RawSeries`.

use std::io::Read;
use std::path::Path;

use chrono::DateTime;

use super::series::{RawRow, RawSeries};
use crate::error::{Error, Result};

/// Canonical name of the time column after normalization
pub const DATETIME_COLUMN: &str = "Datetime";

/// Alternate names a provider may use for the time column
const DATETIME_ALIASES: [&str; 2] = ["Date", "index"];

/// Table of string cells with (possibly multi-level) column headers
#[derive(Debug, Clone, Default)]
pub struct RawFrame {
    /// Header levels per column, outermost level first
    pub columns: Vec<Vec<String>>,
    /// Data rows, one cell per column
    pub rows: Vec<Vec<String>>,
}

impl RawFrame {
    /// Create a frame with single-level headers
    pub fn new(columns: &[&str], rows: Vec<Vec<String>>) -> Self {
        Self {
            columns: columns.iter().map(|c| vec![c.to_string()]).collect(),
            rows,
        }
    }

    /// Create a frame with multi-level headers
    pub fn with_levels(columns: Vec<Vec<String>>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }

    /// Check if the frame carries no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether any column has more than one header level
    pub fn is_multi_level(&self) -> bool {
        self.columns.iter().any(|levels| levels.len() > 1)
    }

    /// Column labels after collapsing multi-level headers to their first
    /// level and renaming time-axis aliases to `Datetime`
    pub fn labels(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|levels| {
                let label = levels.first().map(|s| s.trim()).unwrap_or_default();
                if DATETIME_ALIASES.contains(&label) {
                    DATETIME_COLUMN.to_string()
                } else {
                    label.to_string()
                }
            })
            .collect()
    }

    /// Normalize into a chronological close/volume series
    pub fn to_series(&self, ticker: &str) -> Result<RawSeries> {
        let labels = self.labels();
        let position = |name: &str| labels.iter().position(|l| l == name);

        let time_col = position(DATETIME_COLUMN).unwrap_or(0);
        let close_col = match position("Close").or_else(|| position("Adj Close")) {
            Some(idx) => idx,
            None if labels.len() > 1 => 1,
            None => return Err(Error::MissingColumn("Close".to_string())),
        };
        let volume_col =
            position("Volume").ok_or_else(|| Error::MissingColumn("Volume".to_string()))?;

        let rows = self
            .rows
            .iter()
            .map(|row| {
                let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");
                RawRow::new(
                    normalize_timestamp(cell(time_col)),
                    parse_number(cell(close_col)),
                    parse_number(cell(volume_col)),
                )
            })
            .collect();

        Ok(RawSeries::new(ticker, rows))
    }

    /// Read a frame from CSV, treating the first `header_rows` records as header levels
    pub fn from_csv_reader<R: Read>(reader: R, header_rows: usize) -> Result<Self> {
        if header_rows == 0 {
            return Err(Error::InvalidInput(
                "at least one header row is required".to_string(),
            ));
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut columns: Vec<Vec<String>> = Vec::new();
        let mut rows = Vec::new();

        for (i, result) in reader.records().enumerate() {
            let record = result?;

            if i < header_rows {
                if columns.len() < record.len() {
                    columns.resize(record.len(), Vec::new());
                }
                for (col, field) in record.iter().enumerate() {
                    columns[col].push(field.to_string());
                }
            } else {
                rows.push(record.iter().map(|f| f.to_string()).collect());
            }
        }

        Ok(Self { columns, rows })
    }

    /// Load a frame from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P, header_rows: usize) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file, header_rows)
    }
}

/// Parse a numeric cell; blanks and NaN markers become missing values
pub fn parse_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_nan() => None,
        Ok(v) => Some(v),
        Err(_) => None,
    }
}

/// Render epoch timestamps as `YYYY-MM-DD HH:MM:SS+00:00`; pass other text through
pub fn normalize_timestamp(cell: &str) -> String {
    let cell = cell.trim();
    if cell.is_empty() || !cell.bytes().all(|b| b.is_ascii_digit()) {
        return cell.to_string();
    }

    let Ok(raw) = cell.parse::<i64>() else {
        return cell.to_string();
    };

    // Millisecond epochs pass 1e11 in 1973; second epochs won't until year 5138
    let parsed = if raw >= 100_000_000_000 {
        DateTime::from_timestamp_millis(raw)
    } else {
        DateTime::from_timestamp(raw, 0)
    };

    match parsed {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S%:z").to_string(),
        None => cell.to_string(),
    }
}
