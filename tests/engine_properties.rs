use chrono::{Duration, NaiveDate};
use equity_signals::analyzer::{Analyzer, AnalyzerImpl, analyze};
use equity_signals::config::AnalysisConfig;
use equity_signals::model::{AnalysisError, PriceBar, PriceSeries};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_walk(symbol: &str, n: usize, seed: u64) -> PriceSeries {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
    let mut close = 50.0 + rng.random_range(0.0..100.0);
    let bars = (0..n)
        .map(|i| {
            close *= 1.0 + rng.random_range(-0.03..0.03);
            PriceBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume: rng.random_range(10_000.0..50_000.0),
            }
        })
        .collect();
    PriceSeries::new(symbol, bars).unwrap()
}

fn rising(symbol: &str, n: usize) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
    let bars = (0..n)
        .map(|i| {
            // Flat every third day so the path is non-decreasing but not a straight line.
            let close = 20.0 + (i - i / 3) as f64 * 0.1;
            PriceBar {
                date: start + Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1_000.0,
            }
        })
        .collect();
    PriceSeries::new(symbol, bars).unwrap()
}

#[test]
fn identical_inputs_give_identical_results() {
    let analyzer = AnalyzerImpl::default();
    for seed in 0..5 {
        let series = random_walk("RND", 300, seed);
        let bench = random_walk("SPY", 300, seed + 100);
        let first = analyzer.analyze("RND", &series, &bench).unwrap();
        let second = analyzer.analyze("RND", &series, &bench).unwrap();
        assert_eq!(first, second, "seed {}", seed);
    }
}

#[test]
fn long_average_needs_full_window() {
    let bench = random_walk("SPY", 260, 7);
    let config = AnalysisConfig::default();

    let exact = random_walk("AAA", 200, 1);
    let result = analyze("AAA", &exact, &bench, &config).unwrap();
    assert!(result.indicators.moving_average(200).is_some());
    assert!(result.complete_history);

    let short = PriceSeries::new("AAA", exact.bars()[1..].to_vec()).unwrap();
    let result = analyze("AAA", &short, &bench, &config).unwrap();
    assert!(result.indicators.moving_average(200).is_none());
    assert!(result.indicators.moving_average(50).is_some());
    assert!(!result.complete_history);
}

#[test]
fn rsi_stays_in_range() {
    let bench = random_walk("SPY", 260, 99);
    let analyzer = AnalyzerImpl::default();
    for seed in 0..20 {
        let series = random_walk("RND", 260, seed);
        let result = analyzer.analyze("RND", &series, &bench).unwrap();
        let rsi = result.indicators.rsi.expect("rsi defined on 260 bars");
        assert!((0.0..=100.0).contains(&rsi.value), "seed {} rsi {}", seed, rsi.value);
    }
}

#[test]
fn bands_nest_and_contain_close() {
    let bench = random_walk("SPY", 300, 42);
    let analyzer = AnalyzerImpl::default();
    for seed in 0..10 {
        let series = random_walk("RND", 300, seed);
        let result = analyzer.analyze("RND", &series, &bench).unwrap();
        assert_eq!(result.distributions.len(), 3);
        for dist in &result.distributions {
            for band in &dist.bands {
                assert!(band.low >= 0.0);
                assert!(band.low <= result.close && result.close <= band.high);
            }
            for pair in dist.bands.windows(2) {
                assert!(pair[1].low <= pair[0].low);
                assert!(pair[1].high >= pair[0].high);
            }
        }
    }
}

#[test]
fn no_losses_means_undefined_downside_ratios() {
    let series = rising("UP", 260);
    let bench = random_walk("SPY", 260, 3);
    let result = analyze("UP", &series, &bench, &AnalysisConfig::default()).unwrap();
    assert_eq!(result.risk.sortino, None);
    assert_eq!(result.risk.calmar, None);
    assert_eq!(result.risk.max_drawdown, Some(0.0));
    assert!(result.risk.sharpe.is_some());
}

#[test]
fn self_benchmark_has_unit_beta_and_zero_alpha() {
    let series = random_walk("SPY", 260, 11);
    let result = analyze("SPY", &series, &series, &AnalysisConfig::default()).unwrap();
    assert_eq!(result.risk.beta, Some(1.0));
    assert!(result.risk.alpha.unwrap().abs() < 1e-12);
    assert!((result.risk.correlation.unwrap() - 1.0).abs() < 1e-9);
    assert!(result.risk.relative_performance.unwrap().abs() < 1e-12);
}

#[test]
fn disjoint_benchmark_is_misaligned() {
    let series = random_walk("AAA", 100, 5);
    let later: Vec<PriceBar> = random_walk("SPY", 100, 6)
        .bars()
        .iter()
        .map(|b| PriceBar {
            date: b.date + Duration::days(1_000),
            ..*b
        })
        .collect();
    let bench = PriceSeries::new("SPY", later).unwrap();
    let err = analyze("AAA", &series, &bench, &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::MisalignedSeries { .. }));
}
