//! Multi-horizon return distributions and price confidence bands.
//!
//! Period returns are sampled without overlap, walking backwards from the
//! latest close, so the most recent period is always part of the sample.

use crate::analyzer::stats;
use crate::model::PriceSeries;
use serde::Serialize;

/// Below this many periods a distribution is flagged as low-confidence.
pub const MIN_RELIABLE_PERIODS: usize = 10;

/// Two-sided normal coverage of ±1σ, ±2σ, ±3σ.
const SIGMA_COVERAGE: [(f64, f64); 3] = [(1.0, 0.6827), (2.0, 0.9545), (3.0, 0.9973)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Horizon {
    pub trading_days: usize,
}

impl Horizon {
    pub fn label(&self) -> String {
        match self.trading_days {
            5 => "1w".into(),
            21 => "1m".into(),
            63 => "3m".into(),
            days => format!("{days}d"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBand {
    pub level: f64,
    pub sigmas: f64,
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnDistribution {
    pub horizon: Horizon,
    /// Number of period returns in the sample.
    pub samples: usize,
    /// Mean period return, percent.
    pub mean_pct: f64,
    /// Sample standard deviation of period returns, percent.
    pub std_pct: f64,
    pub low_confidence: bool,
    pub expected_price: f64,
    /// Ordered by ascending level.
    pub bands: Vec<ConfidenceBand>,
}

impl ReturnDistribution {
    pub fn band(&self, level: f64) -> Option<&ConfidenceBand> {
        self.bands.iter().find(|b| (b.level - level).abs() < 1e-9)
    }
}

pub struct ProbabilityModel {
    horizons: Vec<usize>,
    levels: Vec<f64>,
}

impl ProbabilityModel {
    pub fn new(horizons: &[usize], levels: &[f64]) -> Self {
        let mut levels = levels.to_vec();
        levels.sort_by(f64::total_cmp);
        Self {
            horizons: horizons.to_vec(),
            levels,
        }
    }

    /// One distribution per horizon that has at least two sample periods.
    pub fn forecast(&self, series: &PriceSeries) -> Vec<ReturnDistribution> {
        let closes = series.closes();
        let close = series.latest().close;
        self.horizons
            .iter()
            .filter_map(|&days| self.distribution(&closes, close, days))
            .collect()
    }

    fn distribution(&self, closes: &[f64], close: f64, days: usize) -> Option<ReturnDistribution> {
        let returns = period_returns(closes, days);
        let mean = stats::mean(&returns)?;
        let std = stats::sample_std_dev(&returns)?;

        let bands = self
            .levels
            .iter()
            .map(|&level| {
                let k = sigmas_for_level(level);
                let low = (close * (1.0 + mean - k * std)).min(close).max(0.0);
                let high = (close * (1.0 + mean + k * std)).max(close);
                ConfidenceBand { level, sigmas: k, low, high }
            })
            .collect();

        Some(ReturnDistribution {
            horizon: Horizon { trading_days: days },
            samples: returns.len(),
            mean_pct: mean * 100.0,
            std_pct: std * 100.0,
            low_confidence: returns.len() < MIN_RELIABLE_PERIODS,
            expected_price: close * (1.0 + mean),
            bands,
        })
    }
}

/// Non-overlapping `days`-long simple returns, newest first.
pub fn period_returns(closes: &[f64], days: usize) -> Vec<f64> {
    if days == 0 || closes.is_empty() {
        return Vec::new();
    }
    let last = closes.len() - 1;
    (0..last / days)
        .map(|i| {
            let end = last - i * days;
            closes[end] / closes[end - days] - 1.0
        })
        .collect()
}

/// Whole number of standard deviations whose normal coverage is closest to `level`.
pub fn sigmas_for_level(level: f64) -> f64 {
    SIGMA_COVERAGE
        .iter()
        .min_by(|a, b| (a.1 - level).abs().total_cmp(&(b.1 - level).abs()))
        .map(|&(k, _)| k)
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PriceBar;
    use chrono::{Duration, NaiveDate};

    fn series_from_closes(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2022, 3, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 10.0,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    fn default_model() -> ProbabilityModel {
        ProbabilityModel::new(&[5, 21, 63], &[0.68, 0.95])
    }

    #[test]
    fn test_sigmas_for_standard_levels() {
        assert_eq!(sigmas_for_level(0.68), 1.0);
        assert_eq!(sigmas_for_level(0.95), 2.0);
        assert_eq!(sigmas_for_level(0.997), 3.0);
    }

    #[test]
    fn test_period_returns_are_non_overlapping_from_latest() {
        let closes = [100.0, 101.0, 102.0, 103.0, 104.0, 110.0, 111.0];
        let returns = period_returns(&closes, 3);
        // (111 / 103 - 1), (103 / 100 - 1)
        assert_eq!(returns.len(), 2);
        assert!((returns[0] - (111.0 / 103.0 - 1.0)).abs() < 1e-12);
        assert!((returns[1] - 0.03).abs() < 1e-12);
        assert!(period_returns(&closes, 7).is_empty());
    }

    #[test]
    fn test_band_ordering_on_noisy_series() {
        let closes: Vec<f64> = (0..252)
            .map(|i| 50.0 + (i as f64 * 0.31).sin() * 4.0 + (i as f64 * 0.07).cos() * 2.0)
            .collect();
        let series = series_from_closes(&closes);
        let close = series.latest().close;
        let forecast = default_model().forecast(&series);
        assert_eq!(forecast.len(), 3);
        for dist in &forecast {
            let b68 = dist.band(0.68).unwrap();
            let b95 = dist.band(0.95).unwrap();
            assert!(b95.low <= b68.low);
            assert!(b68.low <= close);
            assert!(close <= b68.high);
            assert!(b68.high <= b95.high);
        }
    }

    #[test]
    fn test_bands_contain_close_when_drift_dominates() {
        // steady growth with tiny dispersion: mean return far larger than sigma
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 * 1.01f64.powi(i) * (1.0 + 0.0001 * (i % 2) as f64))
            .collect();
        let series = series_from_closes(&closes);
        let close = series.latest().close;
        for dist in default_model().forecast(&series) {
            for band in &dist.bands {
                assert!(band.low <= close && close <= band.high);
            }
            assert!(dist.expected_price > close);
        }
    }

    #[test]
    fn test_low_confidence_and_missing_horizons() {
        let closes: Vec<f64> = (0..200).map(|i| 20.0 + (i as f64 * 0.5).sin()).collect();
        let forecast = default_model().forecast(&series_from_closes(&closes));
        let by_days = |d: usize| forecast.iter().find(|f| f.horizon.trading_days == d);

        assert!(!by_days(5).unwrap().low_confidence);
        // 199 / 21 = 9 periods
        assert!(by_days(21).unwrap().low_confidence);
        assert_eq!(by_days(63).unwrap().samples, 3);

        let short: Vec<f64> = (0..70).map(|i| 20.0 + (i as f64 * 0.5).sin()).collect();
        let forecast = default_model().forecast(&series_from_closes(&short));
        assert!(forecast.iter().all(|f| f.horizon.trading_days != 63));
    }

    #[test]
    fn test_mean_and_std_in_percent() {
        // alternating +10% / -10% weekly periods
        let mut closes = vec![100.0];
        for i in 0..40 {
            let last = *closes.last().unwrap();
            let target = if i % 2 == 0 { last * 1.1 } else { last / 1.1 };
            for step in 1..=5 {
                closes.push(last + (target - last) * step as f64 / 5.0);
            }
        }
        let forecast = ProbabilityModel::new(&[5], &[0.68]).forecast(&series_from_closes(&closes));
        let dist = &forecast[0];
        assert_eq!(dist.samples, 40);
        assert!(dist.std_pct > 8.0 && dist.std_pct < 11.0);
        assert!(dist.mean_pct.abs() < 1.0);
        assert_eq!(dist.horizon.label(), "1w");
    }
}
