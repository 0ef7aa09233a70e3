//! Report classification and rendering.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction of the price move across the analyzed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Bullish,
    Bearish,
}

impl Trend {
    /// Classify from the first and last price; returns the trend and percent change.
    ///
    /// An empty window or a zero first price counts as a flat, bearish move.
    pub fn from_prices(prices: &[f64]) -> (Self, f64) {
        let return_pct = match (prices.first(), prices.last()) {
            (Some(&first), Some(&last)) if first != 0.0 => (last - first) / first * 100.0,
            _ => 0.0,
        };

        let trend = if return_pct > 0.0 {
            Trend::Bullish
        } else {
            Trend::Bearish
        };

        (trend, return_pct)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Trend::Bullish => "Bullish (Upward)",
            Trend::Bearish => "Bearish (Downward)",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Severity bucket (40/75 split).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// risk <= 40
    Low,
    /// 41..=75
    High,
    /// risk > 75
    Critical,
}

impl Severity {
    pub fn from_risk(risk_score: u8) -> Self {
        match risk_score {
            r if r > 75 => Severity::Critical,
            r if r > 40 => Severity::High,
            _ => Severity::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Low => "LOW",
        }
    }

    /// Recommended follow-up
    pub fn action(&self) -> &'static str {
        match self {
            Severity::Critical => "Immediate Investigation Required",
            Severity::High => "Monitor Closely",
            Severity::Low => "No Action Needed",
        }
    }

    /// Adjective describing the trading pattern
    pub fn tone(&self) -> &'static str {
        match self {
            Severity::Critical => "highly suspicious",
            Severity::High => "irregular",
            Severity::Low => "stable",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Manipulation scenario named by the alarming narrative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scenario {
    PumpAndDump,
    PanicSell,
}

impl Scenario {
    pub fn from_return(return_pct: f64) -> Self {
        if return_pct > 0.0 {
            Scenario::PumpAndDump
        } else {
            Scenario::PanicSell
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Scenario::PumpAndDump => "Pump and Dump",
            Scenario::PanicSell => "Panic Sell",
        }
    }
}

/// Observation paragraph variant (20/75 split, independent of `Severity`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NarrativeBody {
    /// risk < 20: anomalies read as volatility noise
    Reassuring,
    /// 20..=75: flags volume spikes without asserting manipulation
    Cautious,
    /// risk > 75: names a manipulation scenario
    Alarming(Scenario),
}

impl NarrativeBody {
    pub fn from_risk(risk_score: u8, return_pct: f64) -> Self {
        match risk_score {
            r if r < 20 => NarrativeBody::Reassuring,
            r if r > 75 => NarrativeBody::Alarming(Scenario::from_return(return_pct)),
            _ => NarrativeBody::Cautious,
        }
    }
}

/// Signals the report is built from.
#[derive(Debug, Clone)]
pub struct NarrativeInput<'a> {
    pub ticker: &'a str,
    pub risk_score: u8,
    pub anomaly_count: usize,
    pub total_points: usize,
    /// Chronological closes; only the first and last are used
    pub prices: &'a [f64],
}

/// Full classification behind a report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub trend: Trend,
    pub return_pct: f64,
    pub severity: Severity,
    pub body: NarrativeBody,
}

impl Classification {
    pub fn of(input: &NarrativeInput<'_>) -> Self {
        let (trend, return_pct) = Trend::from_prices(input.prices);
        Self {
            trend,
            return_pct,
            severity: Severity::from_risk(input.risk_score),
            body: NarrativeBody::from_risk(input.risk_score, return_pct),
        }
    }
}

/// Render the forensic report for the given signals.
pub fn generate_report(input: &NarrativeInput<'_>) -> String {
    let class = Classification::of(input);
    render(input, &class)
}

fn render(input: &NarrativeInput<'_>, class: &Classification) -> String {
    let mut report = format!("### Forensic Analysis for {}\n\n", input.ticker);
    report.push_str(&format!(
        "**Risk Assessment:** {} ({}/100)\n",
        class.severity.label(),
        input.risk_score
    ));
    report.push_str(&format!(
        "**Market Trend:** {} ({:.2}% change)\n\n",
        class.trend.label(),
        class.return_pct
    ));
    report.push_str("**AI Observation:**\n");
    report.push_str(&observation(input, class));
    report
}

fn observation(input: &NarrativeInput<'_>, class: &Classification) -> String {
    match class.body {
        NarrativeBody::Reassuring => format!(
            "The system analyzed {} data points and found minimal deviations. \
             Trading behavior is consistent with normal market liquidity. \
             The {} detected anomalies are likely standard volatility noise rather than manipulation.",
            input.total_points, input.anomaly_count
        ),
        NarrativeBody::Alarming(scenario) => format!(
            "⚠️ **ALERT:** {} is exhibiting {} trading patterns. \
             The model detected {} significant anomalies, clustering around sharp price moves. \
             This divergence between Price and Volume (VWAP) strongly suggests artificial order flow \
             or a potential '{}' scenario.",
            input.ticker,
            class.severity.tone(),
            input.anomaly_count,
            scenario.label()
        ),
        NarrativeBody::Cautious => format!(
            "The stock is showing some {} volatility. \
             While {} anomalies were flagged, they do not yet form a conclusive manipulation pattern. \
             However, the volume spikes during the {} trend warrant caution.",
            class.severity.tone(),
            input.anomaly_count,
            class.trend.label()
        ),
    }
}
