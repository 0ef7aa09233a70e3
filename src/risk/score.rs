//! Risk score computation.

/// Amplifies small anomaly fractions into a wider score range.
pub const RISK_MULTIPLIER: f64 = 2.5;

/// Highest attainable score; 100 is reserved.
pub const MAX_RISK_SCORE: u8 = 99;

/// `min(floor(anomalies / total · 100 · 2.5), 99)`, or 0 for an empty series.
pub fn risk_score(anomaly_count: usize, total_points: usize) -> u8 {
    if total_points == 0 {
        return 0;
    }

    let fraction = anomaly_count as f64 / total_points as f64;
    let raw = (fraction * 100.0 * RISK_MULTIPLIER).floor();

    if raw >= MAX_RISK_SCORE as f64 {
        MAX_RISK_SCORE
    } else {
        raw.max(0.0) as u8
    }
}
