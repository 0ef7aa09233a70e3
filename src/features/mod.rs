//! Feature engineering module for anomaly detection
//!
//! Derives return, volume-change and VWAP-deviation features per row.

mod engine;

pub use engine::*;
