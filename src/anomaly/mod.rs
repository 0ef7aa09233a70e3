//! Anomaly detection
//!
//! Maps a sensitivity setting to an expected outlier fraction, fits a seeded
//! isolation forest over the feature matrix and labels each row.

mod isolation_forest;

pub use isolation_forest::*;

use std::fmt;

use ndarray::Array2;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::features::FeatureSet;
use crate::utils::ModelConfig;

/// Lowest expected outlier fraction (sensitivity 0)
pub const MIN_CONTAMINATION: f64 = 0.01;
/// Highest expected outlier fraction (sensitivity 100)
pub const MAX_CONTAMINATION: f64 = 0.20;
/// Sensitivity used when the caller gives none
pub const DEFAULT_SENSITIVITY: i32 = 50;

/// Map sensitivity in [0, 100] to a contamination in [0.01, 0.20]
pub fn contamination_for(sensitivity: i32) -> f64 {
    let s = sensitivity.clamp(0, 100) as f64;
    MIN_CONTAMINATION + (s / 100.0) * (MAX_CONTAMINATION - MIN_CONTAMINATION)
}

/// Per-row verdict
///
/// Serialized with the outlier-detector convention: `1` normal, `-1` anomalous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnomalyLabel {
    Normal,
    Anomalous,
}

impl AnomalyLabel {
    /// Wire value of the label
    pub fn as_i8(&self) -> i8 {
        match self {
            AnomalyLabel::Normal => 1,
            AnomalyLabel::Anomalous => -1,
        }
    }

    pub fn is_anomalous(&self) -> bool {
        matches!(self, AnomalyLabel::Anomalous)
    }
}

impl fmt::Display for AnomalyLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyLabel::Normal => write!(f, "normal"),
            AnomalyLabel::Anomalous => write!(f, "anomalous"),
        }
    }
}

impl Serialize for AnomalyLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.as_i8())
    }
}

impl<'de> Deserialize<'de> for AnomalyLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match i8::deserialize(deserializer)? {
            1 => Ok(AnomalyLabel::Normal),
            -1 => Ok(AnomalyLabel::Anomalous),
            other => Err(de::Error::custom(format!(
                "anomaly label must be 1 or -1, got {}",
                other
            ))),
        }
    }
}

/// Result of anomaly detection
#[derive(Debug, Clone)]
pub struct AnomalyResult {
    /// One label per input row
    pub labels: Vec<AnomalyLabel>,
    /// Isolation scores (higher = more anomalous); zero when fitting was skipped
    pub scores: Vec<f64>,
    /// Score a row must exceed to be anomalous
    pub threshold: Option<f64>,
}

impl AnomalyResult {
    /// Create a new anomaly result
    pub fn new(labels: Vec<AnomalyLabel>, scores: Vec<f64>, threshold: Option<f64>) -> Self {
        Self {
            labels,
            scores,
            threshold,
        }
    }

    /// Every row normal, no model fitted
    pub fn all_normal(n: usize) -> Self {
        Self::new(vec![AnomalyLabel::Normal; n], vec![0.0; n], None)
    }

    /// Get the number of detected anomalies
    pub fn anomaly_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_anomalous()).count()
    }

    /// Get indices of anomalies
    pub fn anomaly_indices(&self) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter_map(|(i, l)| if l.is_anomalous() { Some(i) } else { None })
            .collect()
    }

    /// Get the anomaly rate
    pub fn anomaly_rate(&self) -> f64 {
        if self.labels.is_empty() {
            0.0
        } else {
            self.anomaly_count() as f64 / self.labels.len() as f64
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Trait for multivariate anomaly detectors
pub trait MultivariateDetector {
    /// Fit the detector to training data
    fn fit(&mut self, data: &Array2<f64>);

    /// Detect anomalies in the given data
    fn detect(&self, data: &Array2<f64>) -> AnomalyResult;

    /// Get the name of the detector
    fn name(&self) -> &str;
}

/// Request-scoped scorer: builds a fresh forest for every call
#[derive(Debug, Clone)]
pub struct AnomalyScorer {
    pub n_estimators: usize,
    pub max_samples: usize,
    pub seed: u64,
    /// Below this many rows no model is fitted
    pub min_samples: usize,
}

impl Default for AnomalyScorer {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}

impl AnomalyScorer {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            n_estimators: config.n_estimators,
            max_samples: config.max_samples,
            seed: config.seed,
            min_samples: config.min_samples,
        }
    }

    /// Label every feature row at the given sensitivity
    pub fn score(&self, features: &FeatureSet, sensitivity: i32) -> AnomalyResult {
        let n = features.len();
        if n < self.min_samples {
            debug!(
                rows = n,
                min_samples = self.min_samples,
                "Too few rows to fit a model, labelling all normal"
            );
            return AnomalyResult::all_normal(n);
        }

        let contamination = contamination_for(sensitivity);
        let data = features.matrix();

        let mut forest = IsolationForest::new(self.n_estimators, contamination)
            .with_seed(self.seed)
            .with_max_samples(self.max_samples);
        forest.fit(&data);
        let result = forest.detect(&data);

        debug!(
            detector = forest.name(),
            rows = n,
            contamination,
            anomalies = result.anomaly_count(),
            rate = result.anomaly_rate(),
            "Isolation forest scored"
        );

        result
    }
}
