// Core structs: PriceBar, PriceSeries and the error kinds shared across the crate
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One daily OHLCV record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Validated, date-ordered daily history for a single symbol.
///
/// Bars can only be set through [`PriceSeries::new`], which rejects
/// non-monotonic dates and negative or non-finite values. Missing trading
/// days are tolerated and never filled in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, AnalysisError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(AnalysisError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        for (i, bar) in bars.iter().enumerate() {
            let values = [bar.open, bar.high, bar.low, bar.close, bar.volume];
            if values.iter().any(|v| !v.is_finite()) {
                return Err(AnalysisError::invalid(&symbol, format!("non-finite value on {}", bar.date)));
            }
            if values.iter().any(|&v| v < 0.0) {
                return Err(AnalysisError::invalid(&symbol, format!("negative price or volume on {}", bar.date)));
            }
            if bar.close <= 0.0 {
                return Err(AnalysisError::invalid(&symbol, format!("non-positive close on {}", bar.date)));
            }
            if i > 0 && bar.date <= bars[i - 1].date {
                return Err(AnalysisError::invalid(
                    &symbol,
                    format!("dates not strictly increasing at {} (after {})", bar.date, bars[i - 1].date),
                ));
            }
        }

        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn latest(&self) -> &PriceBar {
        // Non-empty by construction.
        &self.bars[self.bars.len() - 1]
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume).collect()
    }
}

/// Whole-symbol failures of the analysis engine.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisError {
    #[error("insufficient data: {available} bars available, {required} required")]
    InsufficientData { required: usize, available: usize },
    #[error("{symbol} shares no usable dates with benchmark {benchmark}")]
    MisalignedSeries { symbol: String, benchmark: String },
    #[error("invalid series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },
}

impl AnalysisError {
    fn invalid(symbol: &str, reason: String) -> Self {
        AnalysisError::InvalidSeries {
            symbol: symbol.to_string(),
            reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ProviderError {
    #[error("no price history for {0}")]
    NotFound(String),
    #[error("failed to read price history: {0}")]
    Io(String),
    #[error("failed to parse price history: {0}")]
    Parse(String),
    #[error(transparent)]
    Invalid(#[from] AnalysisError),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("telegram api error: {0}")]
    ApiError(String),
    #[error("telegram unreachable")]
    Unreachable,
}
