//! Small statistics helpers shared by the indicator, probability and risk modules.

/// Trading days per year used for every annualization.
pub const TRADING_DAYS: f64 = 252.0;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample covariance (n - 1 denominator).
pub fn covariance(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mean_x = mean(x)?;
    let mean_y = mean(y)?;
    let sum: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(xi, yi)| (xi - mean_x) * (yi - mean_y))
        .sum();
    Some(sum / (x.len() - 1) as f64)
}

/// Sample variance, computed through [`covariance`] so that `var(x)` and
/// `cov(x, x)` agree bit for bit.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    covariance(values, values)
}

pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Pearson correlation coefficient. `None` for mismatched lengths or a flat input.
pub fn correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    let cov = covariance(x, y)?;
    let denominator = (sample_variance(x)? * sample_variance(y)?).sqrt();
    if denominator == 0.0 {
        None
    } else {
        Some(cov / denominator)
    }
}

/// Simple returns `p[i] / p[i-1] - 1`.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Log returns `ln(p[i] / p[i-1])`.
pub fn log_returns(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect()
}

/// Mean of the last `window` values.
pub fn trailing_mean(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    mean(&values[values.len() - window..])
}

pub fn clamp_unit(value: f64) -> f64 {
    value.clamp(-1.0, 1.0)
}
