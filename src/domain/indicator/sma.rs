//! Simple Moving Average.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]).
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};

/// Trailing arithmetic mean over `period` values, rolled incrementally.
pub fn sma_values(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let mut sum: f64 = values[..period].iter().sum();
    out[period - 1] = Some(sum / period as f64);

    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out[i] = Some(sum / period as f64);
    }

    out
}

pub fn calculate_sma(closes: &[f64], period: usize) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values: sma_values(closes, period)
            .into_iter()
            .map(|v| v.map(IndicatorValue::Simple))
            .collect(),
    }
}
