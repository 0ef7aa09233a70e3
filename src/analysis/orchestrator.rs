//! Per-request analysis pipeline.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::anomaly::{AnomalyLabel, AnomalyScorer};
use crate::data::{RawFrame, RawSeries, ScanMode, SeriesSource};
use crate::error::{Error, Result};
use crate::features::FeatureEngine;
use crate::narrative::{generate_report, NarrativeInput};
use crate::risk::risk_score;
use crate::utils::{Config, ScanConfig};

/// Per-request knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// 0-100; higher flags more rows
    pub sensitivity: i32,
    /// Attach the forensic narrative
    pub explain: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            sensitivity: crate::anomaly::DEFAULT_SENSITIVITY,
            explain: false,
        }
    }
}

impl AnalysisOptions {
    pub fn new(sensitivity: i32, explain: bool) -> Self {
        Self {
            sensitivity,
            explain,
        }
    }
}

/// Outcome of analyzing one ticker.
///
/// `prices`, `timestamps` and `anomalies` are index-aligned, one entry per
/// surviving feature row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub ticker: String,
    pub total_points: usize,
    pub anomaly_count: usize,
    pub risk_score: u8,
    /// Closes rounded to two decimals
    pub prices: Vec<f64>,
    pub timestamps: Vec<String>,
    pub anomalies: Vec<AnomalyLabel>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub explanation: Option<String>,
}

impl AnalysisResult {
    /// Positions flagged anomalous
    pub fn anomaly_indices(&self) -> Vec<usize> {
        self.anomalies
            .iter()
            .enumerate()
            .filter_map(|(i, l)| if l.is_anomalous() { Some(i) } else { None })
            .collect()
    }
}

/// Round to two decimals, ties to even; applying it twice changes nothing.
pub fn round_price(price: f64) -> f64 {
    (price * 100.0).round_ties_even() / 100.0
}

/// Stateless orchestrator; holds only read-only configuration.
#[derive(Debug, Clone)]
pub struct Analyzer {
    engine: FeatureEngine,
    scorer: AnomalyScorer,
    scan: ScanConfig,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Analyzer {
    pub fn from_config(config: &Config) -> Self {
        Self {
            engine: FeatureEngine::new(),
            scorer: AnomalyScorer::from_config(&config.model),
            scan: config.scan.clone(),
        }
    }

    /// Analyze a chronological series.
    pub fn analyze(&self, series: &RawSeries, options: AnalysisOptions) -> Result<AnalysisResult> {
        if series.is_empty() {
            return Err(Error::NoData(series.ticker.clone()));
        }

        let features = self.engine.compute(series);
        // Row 0 never has features
        if features.dropped() > 1 {
            debug!(
                ticker = %series.ticker,
                dropped = features.dropped(),
                "Dropped rows with undefined features"
            );
        }

        let scored = self.scorer.score(&features, options.sensitivity);
        let total_points = features.len();
        let anomaly_count = scored.anomaly_count();
        let risk = risk_score(anomaly_count, total_points);

        info!(
            ticker = %series.ticker,
            total_points,
            anomaly_count,
            risk_score = risk,
            "Analysis complete"
        );

        let prices: Vec<f64> = features.closes().into_iter().map(round_price).collect();

        let explanation = if options.explain {
            Some(generate_report(&NarrativeInput {
                ticker: &series.ticker,
                risk_score: risk,
                anomaly_count,
                total_points,
                prices: &prices,
            }))
        } else {
            None
        };

        Ok(AnalysisResult {
            ticker: series.ticker.clone(),
            total_points,
            anomaly_count,
            risk_score: risk,
            prices,
            timestamps: features.timestamps(),
            anomalies: scored.labels,
            explanation,
        })
    }

    /// Normalize a provider-shaped table, then analyze it.
    pub fn analyze_frame(
        &self,
        ticker: &str,
        frame: &RawFrame,
        options: AnalysisOptions,
    ) -> Result<AnalysisResult> {
        if frame.is_empty() {
            return Err(Error::NoData(ticker.to_string()));
        }
        let series = frame.to_series(ticker)?;
        self.analyze(&series, options)
    }

    /// Retrieve data through `source` for the mode's window and analyze it.
    pub fn scan(
        &self,
        source: &dyn SeriesSource,
        ticker: &str,
        mode: ScanMode,
        sensitivity: Option<i32>,
    ) -> Result<AnalysisResult> {
        info!("--- {}: {} ---", mode.banner(), ticker);

        let profile = self.scan.profile(mode);
        let frame = source.fetch(ticker, profile).map_err(|e| {
            warn!(source = source.name(), error = %e, "Data retrieval failed");
            Error::Upstream(format!("{:#}", e))
        })?;

        let options = AnalysisOptions::new(
            sensitivity.unwrap_or(self.scan.default_sensitivity),
            mode.forces_narrative(),
        );
        self.analyze_frame(ticker, &frame, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{RawRow, ScanProfile};

    fn rising_series(n: usize) -> RawSeries {
        let rows = (0..n)
            .map(|i| {
                let close = 100.0 + 10.0 * i as f64 / (n - 1) as f64;
                RawRow::new(format!("2024-01-01 09:{:02}:00", i), Some(close), Some(1000.0))
            })
            .collect();
        RawSeries::new("RISE", rows)
    }

    struct FailingSource;

    impl SeriesSource for FailingSource {
        fn fetch(&self, _ticker: &str, _profile: &ScanProfile) -> anyhow::Result<RawFrame> {
            anyhow::bail!("provider unavailable")
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct FixedSource(RawFrame);

    impl SeriesSource for FixedSource {
        fn fetch(&self, _ticker: &str, _profile: &ScanProfile) -> anyhow::Result<RawFrame> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_empty_series_is_no_data() {
        let err = Analyzer::default()
            .analyze(&RawSeries::new("NONE", vec![]), AnalysisOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::NoData(ref t) if t == "NONE"));
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_result_is_index_aligned() {
        let result = Analyzer::default()
            .analyze(&rising_series(40), AnalysisOptions::default())
            .unwrap();

        assert_eq!(result.total_points, 39);
        assert_eq!(result.prices.len(), result.total_points);
        assert_eq!(result.timestamps.len(), result.total_points);
        assert_eq!(result.anomalies.len(), result.total_points);
        assert_eq!(result.anomaly_count, result.anomaly_indices().len());
        assert_eq!(result.timestamps[0], "2024-01-01 09:01:00");
        assert!(result.explanation.is_none());
    }

    #[test]
    fn test_insufficient_rows_degrade_to_zero_risk() {
        let result = Analyzer::default()
            .analyze(&rising_series(8), AnalysisOptions::new(100, true))
            .unwrap();

        assert_eq!(result.total_points, 7);
        assert_eq!(result.anomaly_count, 0);
        assert_eq!(result.risk_score, 0);
        assert!(result.anomalies.iter().all(|l| !l.is_anomalous()));
        assert!(result.explanation.unwrap().contains("LOW (0/100)"));
    }

    #[test]
    fn test_single_row_series() {
        let series = RawSeries::new("ONE", vec![RawRow::new("t0", Some(5.0), Some(1.0))]);
        let result = Analyzer::default()
            .analyze(&series, AnalysisOptions::new(50, true))
            .unwrap();

        assert_eq!(result.total_points, 0);
        assert!(result.prices.is_empty());
        assert_eq!(result.risk_score, 0);
        assert!(result.explanation.unwrap().contains("(0.00% change)"));
    }

    #[test]
    fn test_round_price_is_idempotent() {
        for &p in &[101.234_567, 0.005, 99.995, 1234.5, 0.125, 42.0] {
            let once = round_price(p);
            assert_eq!(round_price(once), once);
        }
        assert_eq!(round_price(101.2349), 101.23);
        assert_eq!(round_price(0.125), 0.12);
    }

    #[test]
    fn test_upstream_failure_carries_cause() {
        let err = Analyzer::default()
            .scan(&FailingSource, "AAPL", ScanMode::Live, None)
            .unwrap_err();

        assert!(matches!(err, Error::Upstream(_)));
        assert!(err.to_string().contains("provider unavailable"));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_scan_empty_frame_is_no_data() {
        let frame = RawFrame::new(&["Datetime", "Close", "Volume"], vec![]);
        let err = Analyzer::default()
            .scan(&FixedSource(frame), "GONE", ScanMode::Deep, Some(10))
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn test_explain_mode_forces_narrative() {
        let rows = (0..30)
            .map(|i| {
                vec![
                    format!("d{}", i),
                    format!("{}", 50.0 - i as f64 * 0.5),
                    "2000".to_string(),
                ]
            })
            .collect();
        let frame = RawFrame::new(&["Date", "Close", "Volume"], rows);
        let source = FixedSource(frame);
        let analyzer = Analyzer::default();

        let live = analyzer.scan(&source, "DOWN", ScanMode::Live, None).unwrap();
        assert!(live.explanation.is_none());

        let explained = analyzer.scan(&source, "DOWN", ScanMode::Explain, None).unwrap();
        let text = explained.explanation.unwrap();
        assert!(text.starts_with("### Forensic Analysis for DOWN"));
        assert!(text.contains("Bearish (Downward)"));
        assert_eq!(explained.timestamps[0], "d1");
    }
}
