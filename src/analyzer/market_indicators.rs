use crate::analyzer::stats::{self, TRADING_DAYS};
use crate::config::IndicatorWindows;
use crate::model::PriceSeries;
use serde::Serialize;

/// Trailing window for the volume ratio.
pub const VOLUME_WINDOW: usize = 20;
/// Volume ratio above which the latest bar counts as high volume.
pub const HIGH_VOLUME_RATIO: f64 = 1.5;
pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;
const BOLLINGER_STD_DEVS: f64 = 2.0;
const SHORT_VOLATILITY_WINDOW: usize = 20;
const LONG_VOLATILITY_WINDOW: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MovingAverage {
    pub window: usize,
    /// Average at the latest bar.
    pub value: Option<f64>,
    /// Average one bar earlier.
    pub previous: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiZone {
    Oversold,
    Neutral,
    Overbought,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RsiReading {
    pub value: f64,
    pub zone: RsiZone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Crossover {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MacdReading {
    pub line: f64,
    pub signal: f64,
    pub histogram: f64,
    pub previous_histogram: f64,
    /// Set when the MACD line crossed the signal line between the last two bars.
    pub crossover: Option<Crossover>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BandPosition {
    BreakoutAbove,
    BreakoutBelow,
    /// Close sits in the middle third of the band.
    Consolidation,
    Inside,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BollingerReading {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    /// 0 at the lower band, 1 at the upper band. Undefined for a zero-width band.
    pub percent_b: Option<f64>,
    pub bandwidth: f64,
    pub position: BandPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolumeReading {
    pub latest: f64,
    pub average: f64,
    pub ratio: f64,
    pub high_volume: bool,
}

/// Indicator values at the most recent bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub close: f64,
    pub previous_close: Option<f64>,
    pub moving_averages: Vec<MovingAverage>,
    pub rsi: Option<RsiReading>,
    pub macd: Option<MacdReading>,
    pub bollinger: Option<BollingerReading>,
    pub volume: Option<VolumeReading>,
    /// Annualized volatility of daily log returns, trailing 20 returns.
    pub volatility_20: Option<f64>,
    /// Annualized volatility of daily log returns, trailing 60 returns.
    pub volatility_60: Option<f64>,
}

impl IndicatorSnapshot {
    pub fn moving_average(&self, window: usize) -> Option<f64> {
        self.moving_averages
            .iter()
            .find(|ma| ma.window == window)
            .and_then(|ma| ma.value)
    }
}

pub struct IndicatorEngine {
    windows: IndicatorWindows,
}

impl IndicatorEngine {
    pub fn new(windows: IndicatorWindows) -> Self {
        Self { windows }
    }

    pub fn compute(&self, series: &PriceSeries) -> IndicatorSnapshot {
        let closes = series.closes();
        let volumes = series.volumes();
        let close = series.latest().close;
        let previous_close = closes.len().checked_sub(2).map(|i| closes[i]);

        let moving_averages = self
            .windows
            .sma
            .iter()
            .map(|&window| MovingAverage {
                window,
                value: Self::sma(&closes, window),
                previous: Self::sma(&closes[..closes.len() - 1], window),
            })
            .collect();

        let [fast, slow, signal] = self.windows.macd;
        let log_returns = stats::log_returns(&closes);

        IndicatorSnapshot {
            close,
            previous_close,
            moving_averages,
            rsi: Self::rsi(&closes, self.windows.rsi).map(|value| RsiReading {
                value,
                zone: rsi_zone(value),
            }),
            macd: Self::macd(&closes, fast, slow, signal),
            bollinger: Self::bollinger(&closes, self.windows.bollinger),
            volume: Self::volume(&volumes),
            volatility_20: Self::annualized_volatility(&log_returns, SHORT_VOLATILITY_WINDOW),
            volatility_60: Self::annualized_volatility(&log_returns, LONG_VOLATILITY_WINDOW),
        }
    }

    /// Simple moving average over the trailing `window` values.
    pub fn sma(values: &[f64], window: usize) -> Option<f64> {
        stats::trailing_mean(values, window)
    }

    /// EMA series seeded with the SMA of the first `period` values.
    ///
    /// Element `j` of the output corresponds to input index `period - 1 + j`.
    pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
        if period == 0 || values.len() < period {
            return Vec::new();
        }
        let alpha = 2.0 / (period as f64 + 1.0);
        let seed = values[..period].iter().sum::<f64>() / period as f64;
        let mut out = Vec::with_capacity(values.len() - period + 1);
        out.push(seed);
        let mut prev = seed;
        for &v in &values[period..] {
            prev = alpha * v + (1.0 - alpha) * prev;
            out.push(prev);
        }
        out
    }

    /// RSI with Wilder's smoothing. Needs `period + 1` prices.
    pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
        if period == 0 || prices.len() < period + 1 {
            return None;
        }

        let changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
        let (mut avg_gain, mut avg_loss) = changes.iter().take(period).fold((0.0, 0.0), |(g, l), &change| {
            if change > 0.0 { (g + change, l) } else { (g, l - change) }
        });
        avg_gain /= period as f64;
        avg_loss /= period as f64;

        for &change in changes.iter().skip(period) {
            let (gain, loss) = if change > 0.0 { (change, 0.0) } else { (0.0, -change) };
            avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
            avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
        }

        if avg_gain == 0.0 && avg_loss == 0.0 {
            // no movement at all
            return None;
        }
        if avg_loss == 0.0 {
            return Some(100.0);
        }
        let rs = avg_gain / avg_loss;
        Some((100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0))
    }

    /// MACD line, signal line and crossover between the last two bars.
    /// Needs `slow + signal` prices so that two signal values exist.
    pub fn macd(prices: &[f64], fast: usize, slow: usize, signal: usize) -> Option<MacdReading> {
        if fast == 0 || signal == 0 || fast > slow || prices.len() < slow + signal {
            return None;
        }

        let fast_ema = Self::ema_series(prices, fast);
        let slow_ema = Self::ema_series(prices, slow);
        let offset = slow - fast;
        let macd_line: Vec<f64> = slow_ema
            .iter()
            .enumerate()
            .map(|(j, slow_value)| fast_ema[j + offset] - slow_value)
            .collect();

        let signal_line = Self::ema_series(&macd_line, signal);
        if signal_line.len() < 2 {
            return None;
        }

        let line = macd_line[macd_line.len() - 1];
        let signal_value = signal_line[signal_line.len() - 1];
        let histogram = line - signal_value;
        let previous_histogram = macd_line[macd_line.len() - 2] - signal_line[signal_line.len() - 2];

        let crossover = if previous_histogram <= 0.0 && histogram > 0.0 {
            Some(Crossover::Bullish)
        } else if previous_histogram >= 0.0 && histogram < 0.0 {
            Some(Crossover::Bearish)
        } else {
            None
        };

        Some(MacdReading {
            line,
            signal: signal_value,
            histogram,
            previous_histogram,
            crossover,
        })
    }

    /// Bollinger bands of ±2 sample standard deviations around the SMA.
    pub fn bollinger(prices: &[f64], window: usize) -> Option<BollingerReading> {
        if window < 2 || prices.len() < window {
            return None;
        }
        let recent = &prices[prices.len() - window..];
        let middle = stats::mean(recent)?;
        let std = stats::sample_std_dev(recent)?;
        let upper = middle + BOLLINGER_STD_DEVS * std;
        let lower = middle - BOLLINGER_STD_DEVS * std;
        let close = prices[prices.len() - 1];
        let width = upper - lower;

        let position = if close > upper {
            BandPosition::BreakoutAbove
        } else if close < lower {
            BandPosition::BreakoutBelow
        } else if close >= lower + width / 3.0 && close <= upper - width / 3.0 {
            BandPosition::Consolidation
        } else {
            BandPosition::Inside
        };

        Some(BollingerReading {
            upper,
            middle,
            lower,
            percent_b: (width > 0.0).then(|| (close - lower) / width),
            bandwidth: width / middle,
            position,
        })
    }

    /// Latest volume against the average of the preceding [`VOLUME_WINDOW`] bars.
    pub fn volume(volumes: &[f64]) -> Option<VolumeReading> {
        if volumes.len() < VOLUME_WINDOW + 1 {
            return None;
        }
        let latest = volumes[volumes.len() - 1];
        let average = stats::trailing_mean(&volumes[..volumes.len() - 1], VOLUME_WINDOW)?;
        if average <= 0.0 {
            return None;
        }
        let ratio = latest / average;
        Some(VolumeReading {
            latest,
            average,
            ratio,
            high_volume: ratio > HIGH_VOLUME_RATIO,
        })
    }

    pub fn annualized_volatility(log_returns: &[f64], window: usize) -> Option<f64> {
        if window < 2 || log_returns.len() < window {
            return None;
        }
        let std = stats::sample_std_dev(&log_returns[log_returns.len() - window..])?;
        Some(std * TRADING_DAYS.sqrt())
    }
}

fn rsi_zone(value: f64) -> RsiZone {
    if value < RSI_OVERSOLD {
        RsiZone::Oversold
    } else if value > RSI_OVERBOUGHT {
        RsiZone::Overbought
    } else {
        RsiZone::Neutral
    }
}
