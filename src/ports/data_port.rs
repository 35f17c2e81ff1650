//! Data access port trait.

use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars of `ticker` whose date lies in `[start_date, end_date]`, sorted
    /// by timestamp.
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, StratbenchError>;

    fn list_tickers(&self) -> Result<Vec<String>, StratbenchError>;
}
