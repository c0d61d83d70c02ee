use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

/// Windows used by the indicator engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorWindows {
    pub sma: Vec<usize>,
    pub rsi: usize,
    /// Fast, slow and signal periods.
    pub macd: [usize; 3],
    pub bollinger: usize,
}

impl Default for IndicatorWindows {
    fn default() -> Self {
        Self {
            sma: vec![20, 50, 200],
            rsi: 14,
            macd: [12, 26, 9],
            bollinger: 20,
        }
    }
}

/// Score cut-offs for the five signal states.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    pub strong_buy: f64,
    pub buy: f64,
    pub sell: f64,
    pub strong_sell: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            strong_buy: 0.6,
            buy: 0.2,
            sell: -0.2,
            strong_sell: -0.6,
        }
    }
}

/// Options recognized by the analysis engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Annual risk-free rate as a fraction (0.045 = 4.5%).
    pub risk_free_rate: f64,
    pub indicator_windows: IndicatorWindows,
    pub probability_horizons_trading_days: Vec<usize>,
    pub confidence_levels: Vec<f64>,
    pub signal_thresholds: SignalThresholds,
    /// History length that supports every computation.
    pub min_bars_required: usize,
    /// Below this many bars a symbol fails instead of degrading.
    pub absolute_min_bars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.0,
            indicator_windows: IndicatorWindows::default(),
            probability_horizons_trading_days: vec![5, 21, 63],
            confidence_levels: vec![0.68, 0.95],
            signal_thresholds: SignalThresholds::default(),
            min_bars_required: 200,
            absolute_min_bars: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    pub symbols: Vec<String>,
    #[serde(default = "default_benchmark")]
    pub benchmark_symbol: String,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default)]
    pub check_interval_seconds: Option<u64>,
    #[serde(default)]
    pub report_path: Option<String>,
    #[serde(default)]
    pub telegram_bot_token: Option<String>,
    #[serde(default)]
    pub telegram_chat_id: Option<i64>,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

fn default_data_dir() -> String {
    "data".into()
}

fn default_benchmark() -> String {
    "SPY".into()
}

fn default_workers() -> usize {
    4
}

fn default_top_n() -> usize {
    5
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_string(),
        source,
    })?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg = parse_config(r#"{ "symbols": ["AAPL", "MSFT"] }"#).unwrap();
        assert_eq!(cfg.symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(cfg.benchmark_symbol, "SPY");
        assert_eq!(cfg.workers, 4);
        assert_eq!(cfg.top_n, 5);
        assert!(cfg.check_interval_seconds.is_none());
        assert_eq!(cfg.analysis, AnalysisConfig::default());
        assert_eq!(cfg.analysis.indicator_windows.sma, vec![20, 50, 200]);
        assert_eq!(cfg.analysis.min_bars_required, 200);
    }

    #[test]
    fn test_partial_analysis_block_keeps_other_defaults() {
        let cfg = parse_config(
            r#"{
                "symbols": ["AAPL"],
                "analysis": {
                    "risk_free_rate": 0.045,
                    "signal_thresholds": { "buy": 0.25 },
                    "indicator_windows": { "rsi": 21 }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.analysis.risk_free_rate, 0.045);
        assert_eq!(cfg.analysis.signal_thresholds.buy, 0.25);
        assert_eq!(cfg.analysis.signal_thresholds.strong_buy, 0.6);
        assert_eq!(cfg.analysis.indicator_windows.rsi, 21);
        assert_eq!(cfg.analysis.indicator_windows.macd, [12, 26, 9]);
        assert_eq!(cfg.analysis.probability_horizons_trading_days, vec![5, 21, 63]);
    }

    #[test]
    fn test_missing_symbols_is_an_error() {
        assert!(matches!(parse_config("{}"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            load_config("/definitely/not/here/config.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
