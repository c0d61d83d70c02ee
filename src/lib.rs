//! Daily equity analysis: technical indicators, multi-horizon probability
//! bands and benchmark-relative risk metrics, reduced to a buy/sell/hold
//! signal per symbol.

pub mod analyzer;
pub mod config;
pub mod model;
pub mod notifier;
pub mod provider;
