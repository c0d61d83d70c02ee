//! Risk-adjusted return metrics, benchmarked against a market index.

use crate::analyzer::stats::{self, TRADING_DAYS};
use crate::model::{AnalysisError, PriceSeries};
use serde::Serialize;
use std::collections::HashMap;

/// All values are fractions (0.12 = 12%), annualized where applicable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RiskMetrics {
    pub sharpe: Option<f64>,
    pub sortino: Option<f64>,
    pub calmar: Option<f64>,
    pub beta: Option<f64>,
    pub alpha: Option<f64>,
    pub annual_return: Option<f64>,
    pub annual_volatility: Option<f64>,
    /// Largest peak-to-trough decline, reported as a positive fraction.
    pub max_drawdown: Option<f64>,
    pub correlation: Option<f64>,
    pub benchmark_return: Option<f64>,
    /// Annual return minus the benchmark's annual return.
    pub relative_performance: Option<f64>,
}

pub struct RiskMetricsCalculator {
    risk_free_rate: f64,
}

impl RiskMetricsCalculator {
    pub fn new(risk_free_rate: f64) -> Self {
        Self { risk_free_rate }
    }

    pub fn compute(&self, series: &PriceSeries, benchmark: &PriceSeries) -> Result<RiskMetrics, AnalysisError> {
        let (closes, bench_closes) = align_closes(series, benchmark);
        if closes.len() < 2 {
            return Err(AnalysisError::MisalignedSeries {
                symbol: series.symbol().to_string(),
                benchmark: benchmark.symbol().to_string(),
            });
        }

        let returns = stats::simple_returns(&closes);
        let bench_returns = stats::simple_returns(&bench_closes);
        let rf = self.risk_free_rate;

        let annual_return = stats::mean(&returns).map(|m| m * TRADING_DAYS);
        let benchmark_return = stats::mean(&bench_returns).map(|m| m * TRADING_DAYS);
        let annual_volatility = stats::sample_std_dev(&returns).map(|s| s * TRADING_DAYS.sqrt());
        let max_drawdown = max_drawdown(&returns);

        let sharpe = match (annual_return, annual_volatility) {
            (Some(ret), Some(vol)) if vol > 0.0 => Some((ret - rf) / vol),
            _ => None,
        };
        let sortino = match (annual_return, downside_deviation(&returns)) {
            (Some(ret), Some(dd)) => Some((ret - rf) / dd),
            _ => None,
        };
        let calmar = match (annual_return, max_drawdown) {
            (Some(ret), Some(dd)) if dd > 0.0 => Some(ret / dd),
            _ => None,
        };

        let beta = match (stats::covariance(&returns, &bench_returns), stats::sample_variance(&bench_returns)) {
            (Some(cov), Some(var)) if var > 0.0 => Some(cov / var),
            _ => None,
        };
        let alpha = match (annual_return, benchmark_return, beta) {
            (Some(ret), Some(bench), Some(beta)) => Some(ret - (rf + beta * (bench - rf))),
            _ => None,
        };

        Ok(RiskMetrics {
            sharpe,
            sortino,
            calmar,
            beta,
            alpha,
            annual_return,
            annual_volatility,
            max_drawdown,
            correlation: stats::correlation(&returns, &bench_returns),
            benchmark_return,
            relative_performance: annual_return.zip(benchmark_return).map(|(a, b)| a - b),
        })
    }
}

/// Closes of both series restricted to the dates they share, in date order.
pub fn align_closes(series: &PriceSeries, benchmark: &PriceSeries) -> (Vec<f64>, Vec<f64>) {
    let bench_by_date: HashMap<_, f64> = benchmark.bars().iter().map(|b| (b.date, b.close)).collect();
    series
        .bars()
        .iter()
        .filter_map(|bar| bench_by_date.get(&bar.date).map(|&bench| (bar.close, bench)))
        .unzip()
}

/// Annualized sample standard deviation of the negative returns only.
/// Undefined with fewer than two losing days.
pub fn downside_deviation(returns: &[f64]) -> Option<f64> {
    let negative: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
    let std = stats::sample_std_dev(&negative)?;
    (std > 0.0).then(|| std * TRADING_DAYS.sqrt())
}

/// Largest peak-to-trough decline of the compounded return curve, as a positive fraction.
pub fn max_drawdown(returns: &[f64]) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let mut equity = 1.0;
    let mut peak = 1.0;
    let mut max_dd: f64 = 0.0;
    for r in returns {
        equity *= 1.0 + r;
        if equity > peak {
            peak = equity;
        }
        max_dd = max_dd.max((peak - equity) / peak);
    }
    Some(max_dd)
}
