//! Exponential Moving Average.
//!
//! k = 2/(n+1), seeded with the first value, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! No warmup: defined from the first bar onward, unlike SMA.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};

/// Recursive EMA over raw values. Empty when `span` is 0.
pub fn ema_values(values: &[f64], span: usize) -> Vec<f64> {
    if span == 0 {
        return Vec::new();
    }

    let k = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());
    for (i, &value) in values.iter().enumerate() {
        let ema = if i == 0 {
            value
        } else {
            value * k + out[i - 1] * (1.0 - k)
        };
        out.push(ema);
    }
    out
}

pub fn calculate_ema(closes: &[f64], span: usize) -> IndicatorSeries {
    if span == 0 {
        return IndicatorSeries::undefined(IndicatorType::Ema(span), closes.len());
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(span),
        values: ema_values(closes, span)
            .into_iter()
            .map(|v| Some(IndicatorValue::Simple(v)))
            .collect(),
    }
}
