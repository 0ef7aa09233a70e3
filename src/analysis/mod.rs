//! Analysis orchestration
//!
//! Sequences feature engineering, scoring, risk aggregation and (on request)
//! narrative generation for one ticker.

mod orchestrator;

pub use orchestrator::*;
