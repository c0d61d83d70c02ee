use crate::analyzer::market_indicators::{IndicatorEngine, IndicatorSnapshot};
use crate::analyzer::probability::{ProbabilityModel, ReturnDistribution};
use crate::analyzer::risk::{RiskMetrics, RiskMetricsCalculator};
use crate::analyzer::signal::{FactorVote, Signal, SignalClassifier, SignalInputs};
use crate::config::AnalysisConfig;
use crate::model::{AnalysisError, PriceSeries};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

/// Trait defining the interface for a single-symbol analyzer.
pub trait Analyzer {
    fn analyze(
        &self,
        symbol: &str,
        series: &PriceSeries,
        benchmark: &PriceSeries,
    ) -> Result<AnalysisResult, AnalysisError>;
}

/// Structure representing the overall analysis result for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub close: f64,
    /// False when the history is shorter than the configured full-analysis length.
    pub complete_history: bool,
    pub indicators: IndicatorSnapshot,
    pub distributions: Vec<ReturnDistribution>,
    pub risk: RiskMetrics,
    pub signal: Signal,
    /// Weighted vote in [-1, 1].
    pub score: f64,
    /// Data completeness times signal strength, in [0, 1].
    pub confidence: f64,
    pub votes: Vec<FactorVote>,
}

/// Implementation of the analyzer, wiring the engine stages together.
pub struct AnalyzerImpl {
    config: AnalysisConfig,
    indicators: IndicatorEngine,
    probability: ProbabilityModel,
    risk: RiskMetricsCalculator,
    classifier: SignalClassifier,
}

impl AnalyzerImpl {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            indicators: IndicatorEngine::new(config.indicator_windows.clone()),
            probability: ProbabilityModel::new(&config.probability_horizons_trading_days, &config.confidence_levels),
            risk: RiskMetricsCalculator::new(config.risk_free_rate),
            classifier: SignalClassifier::new(config.signal_thresholds),
            config,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }
}

impl Default for AnalyzerImpl {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl Analyzer for AnalyzerImpl {
    /// Runs indicators, probability model and risk metrics, then classifies.
    /// Fails only on whole-symbol problems: a history below the absolute
    /// floor or no dates shared with the benchmark.
    fn analyze(
        &self,
        symbol: &str,
        series: &PriceSeries,
        benchmark: &PriceSeries,
    ) -> Result<AnalysisResult, AnalysisError> {
        if series.len() < self.config.absolute_min_bars {
            return Err(AnalysisError::InsufficientData {
                required: self.config.absolute_min_bars,
                available: series.len(),
            });
        }

        let indicators = self.indicators.compute(series);
        let distributions = self.probability.forecast(series);
        let risk = self.risk.compute(series, benchmark)?;

        let classification = self.classifier.classify(&SignalInputs {
            indicators: &indicators,
            distributions: &distributions,
            risk: &risk,
        });

        debug!(
            "{}: score {:.3} -> {} ({} factors)",
            symbol,
            classification.score,
            classification.signal.label(),
            classification.votes.len()
        );

        let latest = series.latest();
        Ok(AnalysisResult {
            symbol: symbol.to_string(),
            as_of: latest.date,
            close: latest.close,
            complete_history: series.len() >= self.config.min_bars_required,
            indicators,
            distributions,
            risk,
            signal: classification.signal,
            score: classification.score,
            confidence: classification.confidence,
            votes: classification.votes,
        })
    }
}

/// Free-function form of [`Analyzer::analyze`] for one-off calls.
pub fn analyze(
    symbol: &str,
    series: &PriceSeries,
    benchmark: &PriceSeries,
    config: &AnalysisConfig,
) -> Result<AnalysisResult, AnalysisError> {
    AnalyzerImpl::new(config.clone()).analyze(symbol, series, benchmark)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PriceBar;
    use chrono::Duration;

    fn series(symbol: &str, n: usize, phase: f64) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let bars = (0..n)
            .map(|i| {
                let close = 80.0 + (i as f64 * 0.21 + phase).sin() * 6.0 + i as f64 * 0.04;
                PriceBar {
                    date: start + Duration::days(i as i64),
                    open: close,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 1_000.0 + (i % 7) as f64 * 100.0,
                }
            })
            .collect();
        PriceSeries::new(symbol, bars).unwrap()
    }

    #[test]
    fn test_full_analysis_is_deterministic() {
        let s = series("AAPL", 260, 0.3);
        let bench = series("SPY", 260, 0.0);
        let analyzer = AnalyzerImpl::default();
        let first = analyzer.analyze("AAPL", &s, &bench).unwrap();
        let second = analyzer.analyze("AAPL", &s, &bench).unwrap();
        assert_eq!(first, second);
        assert!(first.complete_history);
        assert_eq!(first.distributions.len(), 3);
        assert!((0.0..=1.0).contains(&first.confidence));
        assert_eq!(first.as_of, s.latest().date);
    }

    #[test]
    fn test_below_floor_fails() {
        let s = series("TINY", 20, 0.0);
        let bench = series("SPY", 260, 0.0);
        let err = AnalyzerImpl::default().analyze("TINY", &s, &bench).unwrap_err();
        assert_eq!(err, AnalysisError::InsufficientData { required: 30, available: 20 });
    }

    #[test]
    fn test_short_history_degrades_without_failing() {
        let s = series("IPO", 120, 1.0);
        let bench = series("SPY", 260, 0.0);
        let result = analyze("IPO", &s, &bench, &AnalysisConfig::default()).unwrap();
        assert!(!result.complete_history);
        assert!(result.indicators.moving_average(200).is_none());
        assert!(result.indicators.rsi.is_some());
    }
}
