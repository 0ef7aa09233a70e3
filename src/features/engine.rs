//! Feature engineering engine
//!
//! Turns a raw close/volume series into the three model features
//! `[return, volume_change, vwap_deviation]`, dropping undefined rows.

use ndarray::Array2;

use crate::data::RawSeries;

/// Names of the model feature columns, in matrix order
pub const FEATURE_NAMES: [&str; 3] = ["return", "volume_change", "vwap_deviation"];

/// Derived features for one surviving row
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    /// Position of the row in the raw series
    pub index: usize,
    pub timestamp: String,
    /// Close after forward fill
    pub close: f64,
    /// Volume after zero substitution
    pub volume: f64,
    /// Fractional close change from the previous row
    pub ret: f64,
    /// Fractional volume change from the previous row
    pub volume_change: f64,
    /// Cumulative volume-weighted average price through this row
    pub vwap: f64,
    /// (close - vwap) / vwap
    pub vwap_deviation: f64,
}

impl FeatureRow {
    /// Model input vector for this row
    pub fn vector(&self) -> [f64; 3] {
        [self.ret, self.volume_change, self.vwap_deviation]
    }
}

/// Ordered surviving feature rows
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    pub rows: Vec<FeatureRow>,
    /// Number of raw rows the set was derived from
    pub source_len: usize,
}

impl FeatureSet {
    /// Get the number of surviving rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of raw rows that were dropped as undefined
    pub fn dropped(&self) -> usize {
        self.source_len - self.rows.len()
    }

    /// Feature matrix (rows = time, columns = `FEATURE_NAMES`)
    pub fn matrix(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.rows.len(), FEATURE_NAMES.len()), |(i, j)| {
            self.rows[i].vector()[j]
        })
    }

    /// Surviving close prices
    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.close).collect()
    }

    /// Surviving timestamps
    pub fn timestamps(&self) -> Vec<String> {
        self.rows.iter().map(|r| r.timestamp.clone()).collect()
    }
}

/// Feature engineering engine (fixed computation, no options)
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEngine;

impl FeatureEngine {
    /// Create a new feature engine
    pub fn new() -> Self {
        Self
    }

    /// Compute features from a raw series
    pub fn compute(&self, series: &RawSeries) -> FeatureSet {
        let volumes = substitute_zero_volume(&series.volumes());
        let closes = forward_fill(&series.closes());

        let rets = pct_change(&closes);
        // Gaps are padded for the change only; the gap row itself still drops
        let vol_changes = pct_change(&forward_fill(&volumes));
        let vwaps = cumulative_vwap(&closes, &volumes);

        let rows = series
            .rows
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| {
                let close = closes[i]?;
                let volume = volumes[i]?;
                let ret = rets[i]?;
                let volume_change = vol_changes[i]?;
                let vwap = vwaps[i]?;
                let vwap_deviation = finite((close - vwap) / vwap)?;

                Some(FeatureRow {
                    index: i,
                    timestamp: raw.timestamp.clone(),
                    close,
                    volume,
                    ret: finite(ret)?,
                    volume_change: finite(volume_change)?,
                    vwap: finite(vwap)?,
                    vwap_deviation,
                })
            })
            .collect();

        FeatureSet {
            rows,
            source_len: series.len(),
        }
    }
}

/// Keep only finite values
fn finite(x: f64) -> Option<f64> {
    if x.is_finite() {
        Some(x)
    } else {
        None
    }
}

/// Replace zero volume with 1 so later ratios stay defined
pub fn substitute_zero_volume(volumes: &[Option<f64>]) -> Vec<Option<f64>> {
    volumes
        .iter()
        .map(|v| v.map(|v| if v == 0.0 { 1.0 } else { v }))
        .collect()
}

/// Each missing value takes the most recent preceding value; leading gaps stay missing
pub fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|v| {
            if v.is_some() {
                last = *v;
            }
            last
        })
        .collect()
}

/// Fractional change from the previous row; the first row has none
pub fn pct_change(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    if values.is_empty() {
        return out;
    }

    out.push(None);
    for w in values.windows(2) {
        out.push(match (w[0], w[1]) {
            (Some(prev), Some(cur)) => Some((cur - prev) / prev),
            _ => None,
        });
    }
    out
}

/// Running Σ(close·volume) / Σ(volume); rows with a missing cell are skipped in the sums
pub fn cumulative_vwap(closes: &[Option<f64>], volumes: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut pv_sum = 0.0;
    let mut vol_sum = 0.0;

    closes
        .iter()
        .zip(volumes.iter())
        .map(|(c, v)| match (c, v) {
            (Some(c), Some(v)) => {
                pv_sum += c * v;
                vol_sum += v;
                Some(pv_sum / vol_sum)
            }
            _ => None,
        })
        .collect()
}
