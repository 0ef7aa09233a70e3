//! Raw price/volume series
//!
//! Core input structures: one row per timestamp, insertion order is
//! chronological order. Cells may be missing or zero.

use serde::{Deserialize, Serialize};

/// Single raw observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub timestamp: String,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl RawRow {
    /// Create a new raw row
    pub fn new(timestamp: impl Into<String>, close: Option<f64>, volume: Option<f64>) -> Self {
        Self {
            timestamp: timestamp.into(),
            close,
            volume,
        }
    }
}

/// Series of raw rows for one ticker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSeries {
    pub ticker: String,
    pub rows: Vec<RawRow>,
}

impl RawSeries {
    /// Create a series with data
    pub fn new(ticker: impl Into<String>, rows: Vec<RawRow>) -> Self {
        Self {
            ticker: ticker.into(),
            rows,
        }
    }

    /// Build a series from parallel close/volume slices, labelling rows by position
    pub fn from_values(ticker: impl Into<String>, closes: &[f64], volumes: &[f64]) -> Self {
        let rows = closes
            .iter()
            .zip(volumes.iter())
            .enumerate()
            .map(|(i, (&c, &v))| RawRow::new(i.to_string(), Some(c), Some(v)))
            .collect();

        Self::new(ticker, rows)
    }

    /// Check if series is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Get all close prices (missing cells included)
    pub fn closes(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.close).collect()
    }

    /// Get all volumes (missing cells included)
    pub fn volumes(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(|r| r.volume).collect()
    }

    /// Get all timestamps
    pub fn timestamps(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.timestamp.as_str()).collect()
    }
}
