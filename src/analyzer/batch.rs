//! Universe-wide analysis: one independent run per symbol, ranked afterwards.

use crate::analyzer::price_analysis::{AnalysisResult, Analyzer, AnalyzerImpl};
use crate::analyzer::signal::Signal;
use crate::config::AnalysisConfig;
use crate::model::{AnalysisError, PriceSeries, ProviderError};
use crate::provider::SeriesProvider;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    #[error(transparent)]
    Analysis(AnalysisError),
    #[error(transparent)]
    Unavailable(ProviderError),
    #[error("analysis worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub reason: FailureReason,
}

/// Outcome of a batch run. `results` is ranked, failures are kept aside.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub results: Vec<AnalysisResult>,
    pub failures: Vec<SymbolFailure>,
    /// Symbols never finished because the batch was cancelled.
    pub skipped: Vec<String>,
    pub cancelled: bool,
}

impl BatchReport {
    fn new(mut results: Vec<AnalysisResult>, mut failures: Vec<SymbolFailure>, skipped: Vec<String>, cancelled: bool) -> Self {
        rank_results(&mut results);
        failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Self {
            results,
            failures,
            skipped,
            cancelled,
        }
    }

    pub fn top(&self, n: usize) -> &[AnalysisResult] {
        &self.results[..n.min(self.results.len())]
    }

    pub fn top_buys(&self, n: usize) -> Vec<&AnalysisResult> {
        self.results.iter().filter(|r| r.signal.is_buy()).take(n).collect()
    }

    /// Most bearish first.
    pub fn top_sells(&self, n: usize) -> Vec<&AnalysisResult> {
        let mut sells: Vec<&AnalysisResult> = self.results.iter().filter(|r| r.signal.is_sell()).collect();
        sells.sort_by(|a, b| {
            b.signal
                .rank()
                .cmp(&a.signal.rank())
                .then(b.confidence.total_cmp(&a.confidence))
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        sells.truncate(n);
        sells
    }

    pub fn signal_counts(&self) -> Vec<(Signal, usize)> {
        Signal::ALL
            .iter()
            .map(|&signal| (signal, self.results.iter().filter(|r| r.signal == signal).count()))
            .collect()
    }

    pub fn result(&self, symbol: &str) -> Option<&AnalysisResult> {
        self.results.iter().find(|r| r.symbol == symbol)
    }
}

/// Orders by signal (StrongBuy first), then confidence descending, then symbol.
pub fn rank_results(results: &mut [AnalysisResult]) {
    results.sort_by(|a, b| {
        a.signal
            .rank()
            .cmp(&b.signal.rank())
            .then(b.confidence.total_cmp(&a.confidence))
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
}

/// Analyzes every symbol against the shared benchmark with at most `workers`
/// symbols in flight. A failing symbol is recorded, never fatal.
pub async fn analyze_batch<P>(
    symbols: &[String],
    provider: &P,
    benchmark: Arc<PriceSeries>,
    config: Arc<AnalysisConfig>,
    workers: usize,
) -> BatchReport
where
    P: SeriesProvider + ?Sized,
{
    analyze_batch_until(symbols, provider, benchmark, config, workers, std::future::pending::<()>()).await
}

/// Like [`analyze_batch`], but stops collecting once `cancel` resolves and
/// returns what finished so far.
pub async fn analyze_batch_until<P, C>(
    symbols: &[String],
    provider: &P,
    benchmark: Arc<PriceSeries>,
    config: Arc<AnalysisConfig>,
    workers: usize,
    cancel: C,
) -> BatchReport
where
    P: SeriesProvider + ?Sized,
    C: Future<Output = ()>,
{
    let workers = workers.max(1);
    let analyzer = Arc::new(AnalyzerImpl::new((*config).clone()));
    info!("📊 Analyzing {} symbols against {} ({} workers)", symbols.len(), benchmark.symbol(), workers);

    let outcomes = stream::iter(symbols.iter().cloned())
        .map(|symbol| {
            let analyzer = analyzer.clone();
            let benchmark = benchmark.clone();
            async move {
                let outcome = analyze_one(&symbol, provider, analyzer, benchmark).await;
                (symbol, outcome)
            }
        })
        .buffer_unordered(workers);
    tokio::pin!(outcomes);
    tokio::pin!(cancel);

    let mut results = Vec::new();
    let mut failures = Vec::new();
    let mut finished = HashSet::new();
    let mut cancelled = false;

    loop {
        tokio::select! {
            biased;
            _ = &mut cancel => {
                warn!("⏹ Batch cancelled after {} of {} symbols", finished.len(), symbols.len());
                cancelled = true;
                break;
            }
            next = outcomes.next() => match next {
                Some((symbol, Ok(result))) => {
                    info!("✅ {}: {} ({:.0}%)", symbol, result.signal.label(), result.confidence * 100.0);
                    finished.insert(symbol);
                    results.push(result);
                }
                Some((symbol, Err(reason))) => {
                    warn!("❌ Failed: {} ({})", symbol, reason);
                    finished.insert(symbol.clone());
                    failures.push(SymbolFailure { symbol, reason });
                }
                None => break,
            },
        }
    }

    let skipped: Vec<String> = symbols.iter().filter(|s| !finished.contains(*s)).cloned().collect();
    info!(
        "🎉 Batch complete: {} analyzed, {} failed, {} skipped",
        results.len(),
        failures.len(),
        skipped.len()
    );
    BatchReport::new(results, failures, skipped, cancelled)
}

async fn analyze_one<P>(
    symbol: &str,
    provider: &P,
    analyzer: Arc<AnalyzerImpl>,
    benchmark: Arc<PriceSeries>,
) -> Result<AnalysisResult, FailureReason>
where
    P: SeriesProvider + ?Sized,
{
    let series = provider.series(symbol).await.map_err(FailureReason::Unavailable)?;
    let symbol = symbol.to_string();
    tokio::task::spawn_blocking(move || analyzer.analyze(&symbol, &series, &benchmark))
        .await
        .map_err(|e| FailureReason::Worker(e.to_string()))?
        .map_err(FailureReason::Analysis)
}
