//! Rolling standard deviation.
//!
//! Sample standard deviation (divides by n-1) over n closing prices, the
//! same convention as a pandas rolling `std()`.
//! Warmup: first (n-1) bars are undefined; n < 2 is undefined everywhere.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};

pub fn stddev_values(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period < 2 || values.len() < period {
        return out;
    }

    for i in (period - 1)..values.len() {
        let window = &values[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window
            .iter()
            .map(|v| {
                let diff = v - mean;
                diff * diff
            })
            .sum::<f64>()
            / (period - 1) as f64;
        out[i] = Some(variance.sqrt());
    }

    out
}

pub fn calculate_stddev(closes: &[f64], period: usize) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type: IndicatorType::Stddev(period),
        values: stddev_values(closes, period)
            .into_iter()
            .map(|v| v.map(IndicatorValue::Simple))
            .collect(),
    }
}
