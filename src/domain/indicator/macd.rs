//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! The EMAs are seeded with the first value, so MACD is defined from the
//! first bar. A zero period yields an undefined series.

use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};

pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Macd {
        fast,
        slow,
        signal: signal_period,
    };
    if fast == 0 || slow == 0 || signal_period == 0 {
        return IndicatorSeries::undefined(indicator_type, closes.len());
    }

    let ema_fast = ema_values(closes, fast);
    let ema_slow = ema_values(closes, slow);
    let macd_line: Vec<f64> = ema_fast.iter().zip(&ema_slow).map(|(f, s)| f - s).collect();
    let signal_line = ema_values(&macd_line, signal_period);

    let values = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(&line, &signal)| {
            Some(IndicatorValue::Macd {
                line,
                signal,
                histogram: line - signal,
            })
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn macd_at(series: &IndicatorSeries, i: usize) -> (f64, f64, f64) {
        match series.get(i) {
            Some(IndicatorValue::Macd {
                line,
                signal,
                histogram,
            }) => (line, signal, histogram),
            other => panic!("expected MACD value at {}, got {:?}", i, other),
        }
    }

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn macd_defined_from_first_bar() {
        let series = calculate_macd(&rising(5), 12, 26, 9);
        assert_eq!(series.first_defined(), Some(0));
        let (line, signal, histogram) = macd_at(&series, 0);
        assert_relative_eq!(line, 0.0);
        assert_relative_eq!(signal, 0.0);
        assert_relative_eq!(histogram, 0.0);
    }

    #[test]
    fn macd_histogram_equals_line_minus_signal() {
        let series = calculate_macd(&rising(40), 12, 26, 9);
        for i in 0..series.len() {
            let (line, signal, histogram) = macd_at(&series, i);
            assert_relative_eq!(histogram, line - signal);
        }
    }

    #[test]
    fn macd_line_is_ema_fast_minus_ema_slow() {
        let closes = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];
        let series = calculate_macd(&closes, 3, 5, 2);

        let ema_fast = ema_values(&closes, 3);
        let ema_slow = ema_values(&closes, 5);
        let line: Vec<f64> = ema_fast.iter().zip(&ema_slow).map(|(f, s)| f - s).collect();
        let signal = ema_values(&line, 2);

        for i in 0..closes.len() {
            let (l, s, _) = macd_at(&series, i);
            assert_relative_eq!(l, line[i]);
            assert_relative_eq!(s, signal[i]);
        }
    }

    #[test]
    fn macd_uptrend_line_above_signal() {
        let series = calculate_macd(&rising(30), 3, 6, 3);
        let (line, signal, _) = macd_at(&series, 29);
        assert!(line > signal);
    }

    #[test]
    fn macd_indicator_type() {
        let series = calculate_macd(&[100.0, 101.0, 102.0], 5, 10, 3);
        assert_eq!(
            series.indicator_type,
            IndicatorType::Macd {
                fast: 5,
                slow: 10,
                signal: 3
            }
        );
    }

    #[test]
    fn macd_empty() {
        let series = calculate_macd(&[], 12, 26, 9);
        assert!(series.is_empty());
    }

    #[test]
    fn macd_zero_period() {
        let closes = [100.0, 101.0, 102.0];
        for (f, s, g) in [(0, 26, 9), (12, 0, 9), (12, 26, 0)] {
            let series = calculate_macd(&closes, f, s, g);
            assert_eq!(series.len(), 3);
            assert_eq!(series.first_defined(), None);
        }
    }
}
