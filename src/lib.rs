//! Market Forensics
//!
//! Flags statistically anomalous trading behavior in a price/volume series
//! and turns the result into a short risk report.
//!
//! # Modules
//!
//! - `data`: raw series, provider-shaped frames and series sources
//! - `features`: per-row return / volume / VWAP features
//! - `anomaly`: seeded isolation forest and row labelling
//! - `risk`: bounded 0-99 risk score
//! - `narrative`: deterministic forensic report
//! - `analysis`: the orchestrator tying the stages together
//! - `utils`: configuration
//!
//! # Example
//!
//! ```
//! use market_forensics::analysis::{AnalysisOptions, Analyzer};
//! use market_forensics::data::{RawRow, RawSeries};
//!
//! let rows = (0..30)
//!     .map(|i| RawRow::new(format!("t{}", i), Some(100.0 + i as f64), Some(1000.0)))
//!     .collect();
//! let series = RawSeries::new("DEMO", rows);
//!
//! let analyzer = Analyzer::default();
//! let result = analyzer.analyze(&series, AnalysisOptions::default()).unwrap();
//! assert!(result.risk_score <= 99);
//! ```

pub mod analysis;
pub mod anomaly;
pub mod data;
pub mod error;
pub mod features;
pub mod narrative;
pub mod risk;
pub mod utils;

pub use analysis::{AnalysisOptions, AnalysisResult, Analyzer};
pub use anomaly::{AnomalyLabel, AnomalyResult, AnomalyScorer, IsolationForest};
pub use data::{CsvSource, RawFrame, RawRow, RawSeries, ScanMode, SeriesSource};
pub use error::{Error, Result};
pub use features::{FeatureEngine, FeatureRow, FeatureSet};
pub use narrative::{generate_report, NarrativeInput, Severity, Trend};
pub use risk::risk_score;
pub use utils::{load_config, Config};
