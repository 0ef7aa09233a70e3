//! Forensic narrative generation
//!
//! A classifier-then-template pipeline: trend, severity and narrative body
//! are small tagged classifications over the numeric signals, and the report
//! is a fixed template over them. Identical inputs give identical text.

mod report;

pub use report::*;
