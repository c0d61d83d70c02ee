// Analyzer module: aggregates submodules for different aspects of analysis.

pub mod batch;
pub mod market_indicators;
pub mod price_analysis;
pub mod probability;
pub mod risk;
pub mod signal;
pub mod stats;

// Re-export the main Analyzer implementation for ease of use.
pub use batch::{BatchReport, FailureReason, SymbolFailure, analyze_batch, analyze_batch_until};
pub use price_analysis::{AnalysisResult, Analyzer, AnalyzerImpl, analyze};
pub use signal::Signal;
