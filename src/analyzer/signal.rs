//! Reduces indicators, return distributions and risk metrics to a discrete signal.
//!
//! Scoring is driven by [`VOTE_TABLE`]: every factor that can be evaluated for
//! a symbol casts a vote in `[-1, 1]`, and the score is the weight-averaged
//! vote over the evaluated factors only. Factors without data neither vote nor
//! enter the denominator.

use crate::analyzer::market_indicators::{BandPosition, Crossover, IndicatorSnapshot, RSI_OVERBOUGHT, RSI_OVERSOLD};
use crate::analyzer::probability::ReturnDistribution;
use crate::analyzer::risk::RiskMetrics;
use crate::analyzer::stats::clamp_unit;
use crate::config::SignalThresholds;
use serde::Serialize;

/// Relative weight of a low-confidence horizon in the outlook vote.
pub const LOW_CONFIDENCE_WEIGHT: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl Signal {
    /// 0 for the most bullish state.
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Signal::StrongBuy | Signal::Buy)
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, Signal::StrongSell | Signal::Sell)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Signal::StrongBuy => "STRONG BUY",
            Signal::Buy => "BUY",
            Signal::Hold => "HOLD",
            Signal::Sell => "SELL",
            Signal::StrongSell => "STRONG SELL",
        }
    }

    pub const ALL: [Signal; 5] = [
        Signal::StrongBuy,
        Signal::Buy,
        Signal::Hold,
        Signal::Sell,
        Signal::StrongSell,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Rsi,
    Macd,
    Trend,
    Bollinger,
    Volume,
    Sharpe,
    Sortino,
    Alpha,
    Outlook,
}

#[derive(Debug, Clone, Copy)]
pub struct VoteRule {
    pub factor: Factor,
    pub weight: f64,
}

pub const VOTE_TABLE: &[VoteRule] = &[
    VoteRule { factor: Factor::Rsi, weight: 1.5 },
    VoteRule { factor: Factor::Macd, weight: 1.5 },
    VoteRule { factor: Factor::Trend, weight: 1.0 },
    VoteRule { factor: Factor::Bollinger, weight: 0.75 },
    VoteRule { factor: Factor::Volume, weight: 0.5 },
    VoteRule { factor: Factor::Sharpe, weight: 1.0 },
    VoteRule { factor: Factor::Sortino, weight: 0.5 },
    VoteRule { factor: Factor::Alpha, weight: 0.5 },
    VoteRule { factor: Factor::Outlook, weight: 0.75 },
];

/// A factor's contribution to the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FactorVote {
    pub factor: Factor,
    /// Effective weight after any reliability discount.
    pub weight: f64,
    pub vote: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub signal: Signal,
    pub score: f64,
    pub confidence: f64,
    pub votes: Vec<FactorVote>,
}

/// Everything the classifier looks at, borrowed from the analysis in progress.
pub struct SignalInputs<'a> {
    pub indicators: &'a IndicatorSnapshot,
    pub distributions: &'a [ReturnDistribution],
    pub risk: &'a RiskMetrics,
}

pub struct SignalClassifier {
    thresholds: SignalThresholds,
    table: &'static [VoteRule],
}

impl SignalClassifier {
    pub fn new(thresholds: SignalThresholds) -> Self {
        Self {
            thresholds,
            table: VOTE_TABLE,
        }
    }

    pub fn classify(&self, inputs: &SignalInputs<'_>) -> Classification {
        let votes: Vec<FactorVote> = self
            .table
            .iter()
            .filter_map(|rule| {
                let (vote, reliability) = evaluate(rule.factor, inputs)?;
                Some(FactorVote {
                    factor: rule.factor,
                    weight: rule.weight * reliability,
                    vote: clamp_unit(vote),
                })
            })
            .collect();

        let total_weight: f64 = votes.iter().map(|v| v.weight).sum();
        let score = if total_weight > 0.0 {
            clamp_unit(votes.iter().map(|v| v.weight * v.vote).sum::<f64>() / total_weight)
        } else {
            0.0
        };

        let completeness = votes.len() as f64 / self.table.len() as f64;

        Classification {
            signal: self.signal_for(score),
            score,
            confidence: (completeness * score.abs()).clamp(0.0, 1.0),
            votes,
        }
    }

    pub fn signal_for(&self, score: f64) -> Signal {
        let t = &self.thresholds;
        if score >= t.strong_buy {
            Signal::StrongBuy
        } else if score >= t.buy {
            Signal::Buy
        } else if score <= t.strong_sell {
            Signal::StrongSell
        } else if score <= t.sell {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

/// Vote and reliability in `(0, 1]` for one factor, or `None` without data.
fn evaluate(factor: Factor, inputs: &SignalInputs<'_>) -> Option<(f64, f64)> {
    let ind = inputs.indicators;
    let risk = inputs.risk;
    let vote = match factor {
        Factor::Rsi => {
            let rsi = ind.rsi?.value;
            if rsi < RSI_OVERSOLD {
                1.0
            } else if rsi > RSI_OVERBOUGHT {
                -1.0
            } else {
                (50.0 - rsi) / 40.0
            }
        }
        Factor::Macd => {
            let macd = ind.macd?;
            match macd.crossover {
                Some(Crossover::Bullish) => 1.0,
                Some(Crossover::Bearish) => -1.0,
                None if macd.histogram > 0.0 => 0.5,
                None if macd.histogram < 0.0 => -0.5,
                None => 0.0,
            }
        }
        Factor::Trend => {
            let defined: Vec<f64> = ind.moving_averages.iter().filter_map(|ma| ma.value).collect();
            if defined.is_empty() {
                return None;
            }
            let above = defined.iter().filter(|&&ma| ind.close > ma).count() as f64;
            let below = defined.iter().filter(|&&ma| ind.close < ma).count() as f64;
            (above - below) / defined.len() as f64
        }
        Factor::Bollinger => match ind.bollinger?.position {
            BandPosition::BreakoutBelow => 1.0,
            BandPosition::BreakoutAbove => -1.0,
            BandPosition::Consolidation | BandPosition::Inside => 0.0,
        },
        Factor::Volume => {
            let volume = ind.volume?;
            let previous = ind.previous_close?;
            if !volume.high_volume {
                0.0
            } else if ind.close > previous {
                1.0
            } else if ind.close < previous {
                -1.0
            } else {
                0.0
            }
        }
        Factor::Sharpe => risk.sharpe?,
        Factor::Sortino => risk.sortino? / 2.0,
        Factor::Alpha => risk.alpha? / 0.2,
        Factor::Outlook => return outlook(inputs.distributions),
    };
    Some((vote, 1.0))
}

/// Drift-to-dispersion vote across horizons. Low-confidence horizons count
/// for less, and the factor loses weight in proportion.
fn outlook(distributions: &[ReturnDistribution]) -> Option<(f64, f64)> {
    let (weighted, total, count) = distributions
        .iter()
        .filter(|d| d.std_pct > 0.0)
        .fold((0.0, 0.0, 0usize), |(acc, total, count), d| {
            let w = if d.low_confidence { LOW_CONFIDENCE_WEIGHT } else { 1.0 };
            (acc + w * clamp_unit(d.mean_pct / d.std_pct), total + w, count + 1)
        });
    if count == 0 {
        return None;
    }
    Some((weighted / total, total / count as f64))
}
