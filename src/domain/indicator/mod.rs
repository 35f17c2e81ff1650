//! Technical indicator implementations.
//!
//! Every indicator is a pure function over closing prices whose output is
//! aligned with its input: one entry per bar, `None` while the lookback
//! window is incomplete.
//!
//! - `IndicatorValue`: enum for the different indicator output shapes
//! - `IndicatorType`: indicator identity + parameters (serves as map key)
//! - `IndicatorSeries`: one indicator over a whole price series
//! - `IndicatorSet`: every indicator a strategy needs for one run

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod stddev;

pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stddev::calculate_stddev;

use crate::domain::ohlcv::{OhlcvBar, closes};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

impl IndicatorValue {
    pub fn as_simple(&self) -> Option<f64> {
        match self {
            IndicatorValue::Simple(v) => Some(*v),
            _ => None,
        }
    }

    /// Flattened components, in the order of [`IndicatorType::column_names`].
    pub fn components(&self) -> Vec<f64> {
        match *self {
            IndicatorValue::Simple(v) => vec![v],
            IndicatorValue::Macd {
                line,
                signal,
                histogram,
            } => vec![line, signal, histogram],
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => vec![upper, middle, lower],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Stddev(usize),
    /// The multiplier is stored as its bit pattern so the type stays
    /// `Eq + Ord + Hash`; see [`IndicatorType::bollinger`].
    Bollinger {
        period: usize,
        stddev_mult_bits: u64,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl IndicatorType {
    pub fn bollinger(period: usize, stddev_mult: f64) -> Self {
        IndicatorType::Bollinger {
            period,
            stddev_mult_bits: stddev_mult.to_bits(),
        }
    }

    /// Run this indicator over a series of closing prices.
    pub fn compute(&self, closes: &[f64]) -> IndicatorSeries {
        match *self {
            IndicatorType::Sma(period) => calculate_sma(closes, period),
            IndicatorType::Ema(span) => calculate_ema(closes, span),
            IndicatorType::Rsi(period) => calculate_rsi(closes, period),
            IndicatorType::Stddev(period) => calculate_stddev(closes, period),
            IndicatorType::Bollinger {
                period,
                stddev_mult_bits,
            } => calculate_bollinger(closes, period, f64::from_bits(stddev_mult_bits)),
            IndicatorType::Macd { fast, slow, signal } => {
                calculate_macd(closes, fast, slow, signal)
            }
        }
    }

    /// Column headers used when the series is exported as a table.
    pub fn column_names(&self) -> Vec<String> {
        let base = self.to_string();
        match self {
            IndicatorType::Macd { .. } => vec![
                format!("{base}.line"),
                format!("{base}.signal"),
                format!("{base}.histogram"),
            ],
            IndicatorType::Bollinger { .. } => vec![
                format!("{base}.upper"),
                format!("{base}.middle"),
                format!("{base}.lower"),
            ],
            _ => vec![base],
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Stddev(period) => write!(f, "STDDEV({})", period),
            IndicatorType::Bollinger {
                period,
                stddev_mult_bits,
            } => write!(f, "BOLLINGER({},{})", period, f64::from_bits(*stddev_mult_bits)),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<Option<IndicatorValue>>,
}

impl IndicatorSeries {
    /// A series of `len` undefined points.
    pub fn undefined(indicator_type: IndicatorType, len: usize) -> Self {
        Self {
            indicator_type,
            values: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<IndicatorValue> {
        self.values.get(index).copied().flatten()
    }
}

#[cfg(test)]
impl IndicatorSeries {
    /// Index of the first defined point, if any.
    pub(crate) fn first_defined(&self) -> Option<usize> {
        self.values.iter().position(Option::is_some)
    }
}

/// Indicators computed once per run, keyed by type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSet {
    series: BTreeMap<IndicatorType, IndicatorSeries>,
}

impl IndicatorSet {
    pub fn compute(bars: &[OhlcvBar], types: &[IndicatorType]) -> Self {
        let closes = closes(bars);
        let series = types
            .iter()
            .map(|t| (t.clone(), t.compute(&closes)))
            .collect();
        Self { series }
    }

    pub fn get(&self, indicator_type: &IndicatorType) -> Option<&IndicatorSeries> {
        self.series.get(indicator_type)
    }

    /// Value of `indicator_type` at bar `index`; `None` if the indicator is
    /// absent or undefined there.
    pub fn value_at(&self, indicator_type: &IndicatorType, index: usize) -> Option<IndicatorValue> {
        self.get(indicator_type).and_then(|s| s.get(index))
    }

    pub fn simple_at(&self, indicator_type: &IndicatorType, index: usize) -> Option<f64> {
        self.value_at(indicator_type, index)
            .and_then(|v| v.as_simple())
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorSeries> {
        self.series.values()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
