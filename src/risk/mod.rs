//! Risk aggregation
//!
//! Converts anomaly density into a bounded, perceptually amplified score.

mod score;

pub use score::*;
