// notifier/telegram/format.rs

use crate::analyzer::{AnalysisResult, BatchReport, Signal};
use std::fmt::Write;

fn signal_emoji(signal: Signal) -> &'static str {
    match signal {
        Signal::StrongBuy => "🚀",
        Signal::Buy => "📈",
        Signal::Hold => "⏸",
        Signal::Sell => "📉",
        Signal::StrongSell => "💥",
    }
}

/// Signal counts for the whole batch.
pub fn format_summary(report: &BatchReport) -> String {
    let mut msg = String::from("📊 Market Analysis Summary\n");
    let _ = writeln!(msg, "Total stocks analyzed: {}", report.results.len());
    if !report.failures.is_empty() {
        let _ = writeln!(msg, "Failed: {}", report.failures.len());
    }
    msg.push('\n');
    for (signal, count) in report.signal_counts() {
        let _ = writeln!(msg, "{} {}: {}", signal_emoji(signal), signal.label(), count);
    }
    if report.cancelled {
        let _ = writeln!(msg, "\n⏹ Partial results, {} symbols skipped", report.skipped.len());
    }
    msg
}

pub fn format_top_list(results: &[&AnalysisResult]) -> String {
    let mut msg = String::from("🚀 Top Buy Signals:\n\n");
    for (i, r) in results.iter().enumerate() {
        let _ = writeln!(
            msg,
            "{}. {} - {} ({:.0}%)\n   Price: ${:.2}\n",
            i + 1,
            r.symbol,
            r.signal.label(),
            r.confidence * 100.0,
            r.close
        );
    }
    msg
}

/// Detailed message for one symbol.
pub fn format_result(r: &AnalysisResult) -> String {
    let mut msg = String::new();
    let _ = writeln!(msg, "{} {} Analysis ({})\n", signal_emoji(r.signal), r.symbol, r.as_of);
    let _ = writeln!(msg, "💰 Current Price: ${:.2}", r.close);
    let _ = writeln!(
        msg,
        "📊 Signal: {} ({:.0}% confidence)",
        r.signal.label(),
        r.confidence * 100.0
    );
    match r.indicators.rsi {
        Some(rsi) => {
            let _ = writeln!(msg, "📈 RSI: {:.1}", rsi.value);
        }
        None => {
            let _ = writeln!(msg, "📈 RSI: n/a");
        }
    }

    if !r.distributions.is_empty() {
        msg.push_str("\n📅 Price Ranges:\n");
        for d in &r.distributions {
            let _ = write!(msg, "{}: ${:.2}", d.horizon.label(), d.expected_price);
            if d.low_confidence {
                msg.push_str(" (low confidence)");
            }
            msg.push('\n');
            if let Some(band) = d.bands.first() {
                let _ = writeln!(
                    msg,
                    "  {:.0}% range: ${:.2} - ${:.2}",
                    band.level * 100.0,
                    band.low,
                    band.high
                );
            }
        }
    }

    msg.push_str("\n⚖️ Risk Metrics:\n");
    let _ = writeln!(msg, "Sharpe Ratio: {}", ratio(r.risk.sharpe));
    let _ = writeln!(msg, "Sortino Ratio: {}", ratio(r.risk.sortino));
    let _ = writeln!(msg, "Annual Return: {}", percent(r.risk.annual_return));
    let _ = writeln!(msg, "Max Drawdown: {}", percent(r.risk.max_drawdown.map(|d| -d)));

    msg.push_str("\n📊 vs Benchmark:\n");
    let _ = writeln!(msg, "Performance: {}", percent(r.risk.relative_performance));
    let _ = writeln!(msg, "Beta: {}", ratio(r.risk.beta));
    let _ = writeln!(msg, "Alpha: {}", percent(r.risk.alpha));
    msg
}

fn ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".into(), |v| format!("{:.2}", v))
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".into(), |v| format!("{:+.1}%", v * 100.0))
}
