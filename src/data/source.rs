//! Series sources
//!
//! Retrieval itself is someone else's job; the pipeline only needs a
//! `RawFrame` per ticker and scan window.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::frame::RawFrame;

/// Retrieval window handed to a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanProfile {
    /// Look-back period, e.g. "5d" or "2y"
    pub period: String,
    /// Bar granularity, e.g. "5m" or "1d"
    pub interval: String,
}

impl ScanProfile {
    pub fn new(period: &str, interval: &str) -> Self {
        Self {
            period: period.to_string(),
            interval: interval.to_string(),
        }
    }

    /// Short window, fine granularity
    pub fn live() -> Self {
        Self::new("5d", "5m")
    }

    /// Long window, coarse granularity
    pub fn deep() -> Self {
        Self::new("2y", "1d")
    }
}

/// Kind of scan requested for a ticker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Live window, no narrative
    Live,
    /// Deep window, no narrative
    Deep,
    /// Live window with the narrative forced on
    Explain,
}

impl ScanMode {
    /// Whether this mode always produces a narrative
    pub fn forces_narrative(&self) -> bool {
        matches!(self, ScanMode::Explain)
    }

    /// Log banner for the scan
    pub fn banner(&self) -> &'static str {
        match self {
            ScanMode::Live => "LIVE SCAN",
            ScanMode::Deep => "DEEP SCAN",
            ScanMode::Explain => "EXPLAINING",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanMode::Live => write!(f, "live"),
            ScanMode::Deep => write!(f, "deep"),
            ScanMode::Explain => write!(f, "explain"),
        }
    }
}

impl FromStr for ScanMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "live" | "analyze" => Ok(ScanMode::Live),
            "deep" | "deep-scan" => Ok(ScanMode::Deep),
            "explain" => Ok(ScanMode::Explain),
            other => Err(format!("unknown scan mode: {}", other)),
        }
    }
}

/// Anything that can supply a raw frame for a ticker
pub trait SeriesSource {
    /// Retrieve the raw table for `ticker` over the given window
    fn fetch(&self, ticker: &str, profile: &ScanProfile) -> anyhow::Result<RawFrame>;

    /// Get the name of the source
    fn name(&self) -> &str;
}

/// Reads frames from CSV files on disk
#[derive(Debug, Clone)]
pub struct CsvSource {
    location: CsvLocation,
    header_rows: usize,
}

#[derive(Debug, Clone)]
enum CsvLocation {
    /// Same file regardless of ticker
    File(PathBuf),
    /// `<dir>/<TICKER>.csv`
    Directory(PathBuf),
}

impl CsvSource {
    /// Read every ticker from one file
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: CsvLocation::File(path.into()),
            header_rows: 1,
        }
    }

    /// Read `<TICKER>.csv` from a directory
    pub fn directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            location: CsvLocation::Directory(dir.into()),
            header_rows: 1,
        }
    }

    /// Set the number of header rows (provider exports often carry several)
    pub fn with_header_rows(mut self, header_rows: usize) -> Self {
        self.header_rows = header_rows;
        self
    }

    fn path_for(&self, ticker: &str) -> PathBuf {
        match &self.location {
            CsvLocation::File(path) => path.clone(),
            CsvLocation::Directory(dir) => dir.join(format!("{}.csv", ticker)),
        }
    }
}

impl SeriesSource for CsvSource {
    fn fetch(&self, ticker: &str, _profile: &ScanProfile) -> anyhow::Result<RawFrame> {
        let path = self.path_for(ticker);
        let frame = RawFrame::from_csv(&path, self.header_rows)
            .with_context(|| format!("Failed to read {:?}", path))?;
        Ok(frame)
    }

    fn name(&self) -> &str {
        "csv"
    }
}
