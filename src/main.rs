use equity_signals::analyzer::{BatchReport, analyze_batch_until};
use equity_signals::config::{AppConfig, load_config};
use equity_signals::notifier::TelegramNotifier;
use equity_signals::provider::{JsonDirProvider, SeriesProvider};
use std::sync::Arc;
use tokio::time::{Duration, sleep};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config: Arc<AppConfig> = match load_config(&config_path) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    let notifier = match (&config.telegram_bot_token, config.telegram_chat_id) {
        (Some(token), Some(chat_id)) => match TelegramNotifier::new(token.clone(), chat_id) {
            Ok(n) => Some(n),
            Err(e) => {
                warn!("Telegram disabled: {}", e);
                None
            }
        },
        _ => None,
    };

    loop {
        info!("Starting analysis run over {} symbols...", config.symbols.len());
        let Some(report) = run_once(&config).await else {
            return;
        };

        log_report(&report, config.top_n);

        if let Some(path) = &config.report_path {
            write_report(path, &report).await;
        }

        if let Some(notifier) = &notifier {
            info!("Sending Telegram summary...");
            if let Err(e) = notifier.notify_report(&report, config.top_n).await {
                warn!("Telegram summary failed: {}", e);
            }
        }

        if report.cancelled {
            info!("Shutting down after cancelled run.");
            return;
        }

        let Some(interval) = config.check_interval_seconds else {
            return;
        };
        info!("Waiting {}s for the next run...", interval);
        tokio::select! {
            _ = sleep(Duration::from_secs(interval)) => {
                info!("Timer triggered.");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down.");
                return;
            }
        }
    }
}

/// Runs one batch. The provider lives for this run only. Returns `None` when
/// the benchmark cannot be loaded.
async fn run_once(config: &AppConfig) -> Option<BatchReport> {
    let provider = JsonDirProvider::new(&config.data_dir);

    let benchmark = match provider.series(&config.benchmark_symbol).await {
        Ok(series) => Arc::new(series),
        Err(e) => {
            error!("Benchmark {} unavailable: {}", config.benchmark_symbol, e);
            return None;
        }
    };
    info!("✅ Benchmark {} loaded ({} bars)", config.benchmark_symbol, benchmark.len());

    let report = analyze_batch_until(
        &config.symbols,
        &provider,
        benchmark,
        Arc::new(config.analysis.clone()),
        config.workers,
        async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Ctrl-C handler failed: {}", e);
                std::future::pending::<()>().await;
            }
        },
    )
    .await;
    Some(report)
}

fn log_report(report: &BatchReport, top_n: usize) {
    for (signal, count) in report.signal_counts() {
        info!("{:>11}: {}", signal.label(), count);
    }
    for (i, r) in report.top_buys(top_n).iter().enumerate() {
        info!(
            "#{} {} {} ({:.0}%) close {:.2}",
            i + 1,
            r.symbol,
            r.signal.label(),
            r.confidence * 100.0,
            r.close
        );
    }
    for failure in &report.failures {
        warn!("Failed: {}: {}", failure.symbol, failure.reason);
    }
}

async fn write_report(path: &str, report: &BatchReport) {
    let json = match serde_json::to_string_pretty(report) {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize report: {}", e);
            return;
        }
    };
    if let Err(e) = tokio::fs::write(path, json).await {
        warn!("Failed to write report to {}: {}", path, e);
    } else {
        info!("Saved report: {}", path);
    }
}
