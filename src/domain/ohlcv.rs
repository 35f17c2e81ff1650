//! OHLCV bar representation.

use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// Calendar date of the bar, dropping any intraday component.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Closing prices of a series, in bar order.
pub fn closes(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// Whether `ticker` is usable as a file name stem: letters, digits and
/// `.-_^=`, not starting with a dot.
pub fn is_valid_ticker(ticker: &str) -> bool {
    !ticker.is_empty()
        && !ticker.starts_with('.')
        && ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '^' | '='))
}
