//! Strategy variants and their signal policies.
//!
//! Each variant names the indicators it needs and maps one bar plus the
//! precomputed [`IndicatorSet`] to a [`Signal`]. Signals are stateless per
//! bar; entry/exit transitions are detected by the simulator.

use crate::domain::error::StratbenchError;
use crate::domain::indicator::{IndicatorSet, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    BuyAndHold,
    GoldenCross,
    Rsi,
    Bollinger,
    Macd,
}

impl StrategyKind {
    /// Registry key for the kind.
    pub fn key(self) -> &'static str {
        match self {
            StrategyKind::BuyAndHold => "buy_and_hold",
            StrategyKind::GoldenCross => "golden_cross",
            StrategyKind::Rsi => "rsi",
            StrategyKind::Bollinger => "bollinger",
            StrategyKind::Macd => "macd",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    /// Benchmark: enter on the second bar and never exit.
    BuyAndHold,
    GoldenCross {
        short_ma: usize,
        long_ma: usize,
    },
    Rsi {
        period: usize,
        oversold: f64,
        overbought: f64,
    },
    Bollinger {
        period: usize,
        stddev_mult: f64,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl Strategy {
    pub fn golden_cross(short_ma: usize, long_ma: usize) -> Result<Self, StratbenchError> {
        let key = StrategyKind::GoldenCross.key();
        require_period(key, "short_ma", short_ma)?;
        require_period(key, "long_ma", long_ma)?;
        if short_ma >= long_ma {
            return Err(invalid(key, "short_ma", "must be less than long_ma"));
        }
        Ok(Strategy::GoldenCross { short_ma, long_ma })
    }

    pub fn rsi(period: usize, oversold: f64, overbought: f64) -> Result<Self, StratbenchError> {
        let key = StrategyKind::Rsi.key();
        require_period(key, "rsi_period", period)?;
        if !(0.0..=100.0).contains(&oversold) {
            return Err(invalid(key, "oversold", "must be between 0 and 100"));
        }
        if !(0.0..=100.0).contains(&overbought) {
            return Err(invalid(key, "overbought", "must be between 0 and 100"));
        }
        if oversold >= overbought {
            return Err(invalid(key, "oversold", "must be less than overbought"));
        }
        Ok(Strategy::Rsi {
            period,
            oversold,
            overbought,
        })
    }

    /// `std_dev` is the band multiplier `k`.
    pub fn bollinger(period: usize, std_dev: f64) -> Result<Self, StratbenchError> {
        let key = StrategyKind::Bollinger.key();
        require_period(key, "period", period)?;
        if !std_dev.is_finite() || std_dev <= 0.0 {
            return Err(invalid(key, "std_dev", "must be a positive number"));
        }
        Ok(Strategy::Bollinger {
            period,
            stddev_mult: std_dev,
        })
    }

    pub fn macd(fast: usize, slow: usize, signal: usize) -> Result<Self, StratbenchError> {
        let key = StrategyKind::Macd.key();
        require_period(key, "fast_period", fast)?;
        require_period(key, "slow_period", slow)?;
        require_period(key, "signal_period", signal)?;
        if fast >= slow {
            return Err(invalid(key, "fast_period", "must be less than slow_period"));
        }
        Ok(Strategy::Macd { fast, slow, signal })
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::BuyAndHold => StrategyKind::BuyAndHold,
            Strategy::GoldenCross { .. } => StrategyKind::GoldenCross,
            Strategy::Rsi { .. } => StrategyKind::Rsi,
            Strategy::Bollinger { .. } => StrategyKind::Bollinger,
            Strategy::Macd { .. } => StrategyKind::Macd,
        }
    }

    /// Human-readable name including parameters.
    pub fn name(&self) -> String {
        match *self {
            Strategy::BuyAndHold => "Buy and Hold (Benchmark)".to_string(),
            Strategy::GoldenCross { short_ma, long_ma } => {
                format!("Golden Cross ({}/{})", short_ma, long_ma)
            }
            Strategy::Rsi {
                period,
                oversold,
                overbought,
            } => format!("RSI ({}, {}/{})", period, oversold, overbought),
            Strategy::Bollinger {
                period,
                stddev_mult,
            } => format!("Bollinger Bands ({}, {}σ)", period, stddev_mult),
            Strategy::Macd { fast, slow, signal } => {
                format!("MACD ({}/{}/{})", fast, slow, signal)
            }
        }
    }

    pub fn required_indicators(&self) -> Vec<IndicatorType> {
        match *self {
            Strategy::BuyAndHold => Vec::new(),
            Strategy::GoldenCross { short_ma, long_ma } => {
                vec![IndicatorType::Sma(short_ma), IndicatorType::Sma(long_ma)]
            }
            Strategy::Rsi { period, .. } => vec![IndicatorType::Rsi(period)],
            Strategy::Bollinger {
                period,
                stddev_mult,
            } => vec![IndicatorType::bollinger(period, stddev_mult)],
            Strategy::Macd { fast, slow, signal } => {
                vec![IndicatorType::Macd { fast, slow, signal }]
            }
        }
    }

    pub fn compute_indicators(&self, bars: &[OhlcvBar]) -> IndicatorSet {
        IndicatorSet::compute(bars, &self.required_indicators())
    }

    /// Signal for bar `index`. Undefined indicator values yield `Hold`.
    pub fn signal_for_bar(
        &self,
        index: usize,
        bar: &OhlcvBar,
        indicators: &IndicatorSet,
    ) -> Signal {
        match *self {
            Strategy::BuyAndHold => {
                if index >= 1 {
                    Signal::Buy
                } else {
                    Signal::Hold
                }
            }
            Strategy::GoldenCross { short_ma, long_ma } => Signal::from_comparison(
                indicators.simple_at(&IndicatorType::Sma(short_ma), index),
                indicators.simple_at(&IndicatorType::Sma(long_ma), index),
            ),
            Strategy::Rsi {
                period,
                oversold,
                overbought,
            } => match indicators.simple_at(&IndicatorType::Rsi(period), index) {
                Some(rsi) if rsi < oversold => Signal::Buy,
                Some(rsi) if rsi > overbought => Signal::Sell,
                _ => Signal::Hold,
            },
            Strategy::Bollinger {
                period,
                stddev_mult,
            } => {
                let bands =
                    indicators.value_at(&IndicatorType::bollinger(period, stddev_mult), index);
                match bands {
                    Some(IndicatorValue::Bollinger { lower, .. }) if bar.close < lower => {
                        Signal::Buy
                    }
                    Some(IndicatorValue::Bollinger { upper, .. }) if bar.close > upper => {
                        Signal::Sell
                    }
                    _ => Signal::Hold,
                }
            }
            Strategy::Macd { fast, slow, signal } => {
                match indicators.value_at(&IndicatorType::Macd { fast, slow, signal }, index) {
                    Some(IndicatorValue::Macd {
                        line,
                        signal: signal_line,
                        ..
                    }) => Signal::from_comparison(Some(line), Some(signal_line)),
                    _ => Signal::Hold,
                }
            }
        }
    }

    /// One signal per bar, in bar order.
    pub fn generate_signals(&self, bars: &[OhlcvBar], indicators: &IndicatorSet) -> Vec<Signal> {
        bars.iter()
            .enumerate()
            .map(|(i, bar)| self.signal_for_bar(i, bar, indicators))
            .collect()
    }
}

fn require_period(strategy: &str, key: &str, value: usize) -> Result<(), StratbenchError> {
    if value == 0 {
        return Err(invalid(strategy, key, "must be at least 1"));
    }
    Ok(())
}

fn invalid(strategy: &str, key: &str, reason: &str) -> StratbenchError {
    StratbenchError::InvalidParameter {
        strategy: strategy.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
