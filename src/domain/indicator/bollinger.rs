//! Bollinger Bands.
//!
//! - Middle: SMA over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! StdDev is the rolling sample standard deviation (see [`super::stddev`]).
//! Warmup: first (period-1) bars are undefined.

use crate::domain::indicator::sma::sma_values;
use crate::domain::indicator::stddev::stddev_values;
use crate::domain::indicator::{IndicatorSeries, IndicatorType, IndicatorValue};

pub fn calculate_bollinger(closes: &[f64], period: usize, mult: f64) -> IndicatorSeries {
    let middle = sma_values(closes, period);
    let stddev = stddev_values(closes, period);

    let values = middle
        .into_iter()
        .zip(stddev)
        .map(|(middle, sd)| {
            let (middle, sd) = (middle?, sd?);
            Some(IndicatorValue::Bollinger {
                upper: middle + mult * sd,
                middle,
                lower: middle - mult * sd,
            })
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::bollinger(period, mult),
        values,
    }
}
