//! Integration tests for market forensics

use std::io::Write;

use market_forensics::{
    // Pipeline
    AnalysisOptions, AnalysisResult, Analyzer,
    // Data
    CsvSource, RawFrame, RawRow, RawSeries, ScanMode,
    // Narrative
    generate_report, NarrativeInput, Severity, Trend,
    // Config
    Config, Error,
};
use tempfile::tempdir;

/// Quiet drift with a handful of volume bursts
fn choppy_series(n: usize) -> RawSeries {
    let rows = (0..n)
        .map(|i| {
            let wiggle = ((i * 37) % 23) as f64 / 23.0 - 0.5;
            let close = 200.0 + i as f64 * 0.05 + wiggle;
            let volume = if i % 41 == 17 {
                90_000.0
            } else {
                5_000.0 + ((i * 11) % 29) as f64 * 40.0
            };
            RawRow::new(format!("2024-03-01 10:{:02}:{:02}", i / 60, i % 60), Some(close), Some(volume))
        })
        .collect();
    RawSeries::new("CHOP", rows)
}

fn linear_series(n: usize, from: f64, to: f64, volume: f64) -> RawSeries {
    let rows = (0..n)
        .map(|i| {
            let close = from + (to - from) * i as f64 / (n - 1) as f64;
            RawRow::new(format!("t{}", i), Some(close), Some(volume))
        })
        .collect();
    RawSeries::new("LINE", rows)
}

mod result_shape {
    use super::*;

    #[test]
    fn test_parallel_sequences_match_total_points() {
        let result = Analyzer::default()
            .analyze(&choppy_series(150), AnalysisOptions::default())
            .unwrap();

        assert_eq!(result.total_points, 149);
        assert_eq!(result.prices.len(), result.total_points);
        assert_eq!(result.timestamps.len(), result.total_points);
        assert_eq!(result.anomalies.len(), result.total_points);
    }

    #[test]
    fn test_anomaly_count_matches_labels() {
        let result = Analyzer::default()
            .analyze(&choppy_series(150), AnalysisOptions::new(70, false))
            .unwrap();

        let flagged = result.anomalies.iter().filter(|l| l.is_anomalous()).count();
        assert_eq!(result.anomaly_count, flagged);
        assert!(result.anomaly_count > 0);
    }

    #[test]
    fn test_risk_bounds() {
        let analyzer = Analyzer::default();
        for s in [0, 25, 50, 75, 100] {
            let result = analyzer
                .analyze(&choppy_series(120), AnalysisOptions::new(s, false))
                .unwrap();
            assert!(result.risk_score <= 99);
            if result.anomaly_count == 0 {
                assert_eq!(result.risk_score, 0);
            }
        }
    }

    #[test]
    fn test_json_field_names() {
        let result = Analyzer::default()
            .analyze(&choppy_series(30), AnalysisOptions::default())
            .unwrap();
        let value: serde_json::Value = serde_json::to_value(&result).unwrap();

        for key in [
            "ticker",
            "total_points",
            "anomaly_count",
            "risk_score",
            "prices",
            "timestamps",
            "anomalies",
        ] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert!(value.get("explanation").is_none());
        assert!(value["anomalies"]
            .as_array()
            .unwrap()
            .iter()
            .all(|v| v == 1 || v == -1));
    }
}

mod determinism {
    use super::*;

    #[test]
    fn test_identical_runs_are_byte_identical() {
        let analyzer = Analyzer::default();
        let series = choppy_series(200);

        for explain in [false, true] {
            let options = AnalysisOptions::new(60, explain);
            let a = serde_json::to_string(&analyzer.analyze(&series, options).unwrap()).unwrap();
            let b = serde_json::to_string(&analyzer.analyze(&series, options).unwrap()).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_fresh_analyzers_agree() {
        let series = choppy_series(90);
        let a = Analyzer::default().analyze(&series, AnalysisOptions::default()).unwrap();
        let b = Analyzer::from_config(&Config::default())
            .analyze(&series, AnalysisOptions::default())
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sensitivity_is_monotone() {
        let analyzer = Analyzer::default();
        let series = choppy_series(180);

        let counts: Vec<usize> = (0..=100)
            .step_by(5)
            .map(|s| {
                analyzer
                    .analyze(&series, AnalysisOptions::new(s, false))
                    .unwrap()
                    .anomaly_count
            })
            .collect();

        assert!(counts.windows(2).all(|w| w[1] >= w[0]), "counts: {:?}", counts);
    }
}

mod degenerate_input {
    use super::*;

    #[test]
    fn test_empty_series_is_not_found() {
        let err = Analyzer::default()
            .analyze(&RawSeries::new("VOID", vec![]), AnalysisOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::NoData(_)));
    }

    #[test]
    fn test_fewer_than_ten_rows_scores_zero() {
        let result = Analyzer::default()
            .analyze(&choppy_series(10), AnalysisOptions::new(100, false))
            .unwrap();
        assert_eq!(result.total_points, 9);
        assert_eq!(result.anomaly_count, 0);
        assert_eq!(result.risk_score, 0);
    }

    #[test]
    fn test_invalid_rows_shrink_below_threshold() {
        let mut rows: Vec<RawRow> = (0..12)
            .map(|i| RawRow::new(format!("t{}", i), Some(10.0 + i as f64), Some(100.0)))
            .collect();
        // Leading gaps cannot be forward-filled
        for row in rows.iter_mut().take(4) {
            row.close = None;
        }

        let result = Analyzer::default()
            .analyze(&RawSeries::new("GAPS", rows), AnalysisOptions::default())
            .unwrap();
        assert_eq!(result.total_points, 7);
        assert_eq!(result.anomaly_count, 0);
        assert_eq!(result.timestamps[0], "t5");
    }

    #[test]
    fn test_zero_volume_does_not_fail() {
        let volumes: Vec<f64> = (0..25).map(|i| if i % 5 == 0 { 0.0 } else { 300.0 }).collect();
        let closes: Vec<f64> = (0..25).map(|i| 20.0 + (i % 3) as f64).collect();

        let result = Analyzer::default()
            .analyze(&RawSeries::from_values("ZV", &closes, &volumes), AnalysisOptions::default())
            .unwrap();
        assert_eq!(result.total_points, 24);
    }
}

mod narrative {
    use super::*;

    #[test]
    fn test_critical_risk_names_scenario_by_direction() {
        let up = [10.0, 12.0];
        let report = generate_report(&NarrativeInput {
            ticker: "PUMP",
            risk_score: 80,
            anomaly_count: 32,
            total_points: 100,
            prices: &up,
        });
        assert!(report.contains("CRITICAL"));
        assert!(report.contains("Pump and Dump"));

        let down = [12.0, 10.0];
        let report = generate_report(&NarrativeInput {
            ticker: "DUMP",
            risk_score: 80,
            anomaly_count: 32,
            total_points: 100,
            prices: &down,
        });
        assert!(report.contains("CRITICAL"));
        assert!(report.contains("Panic Sell"));
    }

    #[test]
    fn test_rising_twenty_row_scenario() {
        let series = linear_series(20, 100.0, 110.0, 1000.0);
        let result = Analyzer::default()
            .analyze(&series, AnalysisOptions::new(50, true))
            .unwrap();

        assert!(result.risk_score <= 99);
        let (trend, pct) = Trend::from_prices(&result.prices);
        assert_eq!(trend, Trend::Bullish);
        // The first row has no return, so the window starts one step above 100
        assert!(pct > 9.0 && pct <= 10.0, "return {}", pct);

        let text = result.explanation.unwrap();
        assert!(text.contains("Bullish (Upward)"));
        assert!(text.contains(&format!("({:.2}% change)", pct)));
        assert!(text.contains(Severity::from_risk(result.risk_score).label()));
    }

    #[test]
    fn test_narrative_only_when_requested() {
        let series = linear_series(30, 50.0, 40.0, 500.0);
        let analyzer = Analyzer::default();

        let quiet = analyzer.analyze(&series, AnalysisOptions::new(50, false)).unwrap();
        let loud = analyzer.analyze(&series, AnalysisOptions::new(50, true)).unwrap();

        assert!(quiet.explanation.is_none());
        assert!(loud.explanation.unwrap().contains("Bearish (Downward)"));
        assert_eq!(quiet.anomalies, loud.anomalies);
    }
}

mod round_trip {
    use super::*;

    #[test]
    fn test_prices_and_timestamps_survive_reserialization() {
        let result = Analyzer::default()
            .analyze(&choppy_series(60), AnalysisOptions::new(50, true))
            .unwrap();

        let json = serde_json::to_string(&result).unwrap();
        let back: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);

        for &p in &back.prices {
            assert_eq!((p * 100.0).round_ties_even() / 100.0, p);
        }
    }
}

mod csv_pipeline {
    use super::*;

    #[test]
    fn test_scan_provider_export_with_multi_level_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("NVDA.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Price,Close,High,Low,Open,Volume").unwrap();
        writeln!(file, "Ticker,NVDA,NVDA,NVDA,NVDA,NVDA").unwrap();
        writeln!(file, "Datetime,,,,,").unwrap();
        for i in 0..40 {
            let close = 480.0 + (i % 7) as f64 * 1.5;
            let volume = if i == 25 { 0 } else { 100_000 + i * 250 };
            writeln!(file, "2024-05-01 13:{:02}:00+00:00,{},0,0,0,{}", i, close, volume).unwrap();
        }
        drop(file);

        let source = CsvSource::directory(dir.path()).with_header_rows(3);
        let result = Analyzer::default()
            .scan(&source, "NVDA", ScanMode::Deep, Some(40))
            .unwrap();

        assert_eq!(result.ticker, "NVDA");
        assert_eq!(result.total_points, 39);
        assert_eq!(result.timestamps[0], "2024-05-01 13:01:00+00:00");
        assert!(result.explanation.is_none());
    }

    #[test]
    fn test_missing_ticker_file_is_upstream_failure() {
        let dir = tempdir().unwrap();
        let err = Analyzer::default()
            .scan(&CsvSource::directory(dir.path()), "MISSING", ScanMode::Live, None)
            .unwrap_err();

        assert!(matches!(err, Error::Upstream(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_frame_without_rows_is_not_found() {
        let frame = RawFrame::new(&["Date", "Close", "Volume"], vec![]);
        let err = Analyzer::default()
            .analyze_frame("EMPTY", &frame, AnalysisOptions::default())
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
    }
}
