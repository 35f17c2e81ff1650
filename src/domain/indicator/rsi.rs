//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss:
//! - gain/loss per bar from the close-to-close change; the first bar has no
//!   prior close and contributes a change of 0
//! - first average: simple mean of the first n gains/losses (bar n-1)
//! - subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100 when avg_gain > 0, undefined when both are 0.
//!
//! Warmup: first (n-1) bars are undefined.

use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};

pub fn calculate_rsi(closes: &[f64], period: usize) -> IndicatorSeries {
    if period == 0 || closes.len() < period {
        return IndicatorSeries::undefined(IndicatorType::Rsi(period), closes.len());
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let change = if i == 0 { 0.0 } else { close - closes[i - 1] };
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    let n = period as f64;
    let seed_gain = gains[..period].iter().sum::<f64>() / n;
    let seed_loss = losses[..period].iter().sum::<f64>() / n;

    let mut values = vec![None; period - 1];
    values.push(rsi_from_averages(seed_gain, seed_loss).map(IndicatorValue::Simple));

    values.extend(
        gains[period..]
            .iter()
            .zip(&losses[period..])
            .scan((seed_gain, seed_loss), |(avg_gain, avg_loss), (&gain, &loss)| {
                *avg_gain = (*avg_gain * (n - 1.0) + gain) / n;
                *avg_loss = (*avg_loss * (n - 1.0) + loss) / n;
                Some(rsi_from_averages(*avg_gain, *avg_loss).map(IndicatorValue::Simple))
            }),
    );

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 { Some(100.0) } else { None }
    } else {
        Some(100.0 - (100.0 / (1.0 + avg_gain / avg_loss)))
    }
}
