#![allow(dead_code)]

use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use stratbench::domain::backtest::{BacktestConfig, BacktestResult};
use stratbench::domain::error::StratbenchError;
pub use stratbench::domain::ohlcv::OhlcvBar;
use stratbench::domain::position::TradeUnit;
use stratbench::ports::data_port::DataPort;
use stratbench::ports::report_port::ReportPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
    pub list_error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
            list_error: None,
        }
    }

    pub fn with_bars(mut self, ticker: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(ticker.to_string(), bars);
        self
    }

    pub fn with_error(mut self, ticker: &str, reason: &str) -> Self {
        self.errors.insert(ticker.to_string(), reason.to_string());
        self
    }

    pub fn with_list_error(mut self, reason: &str) -> Self {
        self.list_error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, StratbenchError> {
        if let Some(reason) = self.errors.get(ticker) {
            return Err(StratbenchError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(ticker)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date() >= start_date && b.date() <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_tickers(&self) -> Result<Vec<String>, StratbenchError> {
        if let Some(reason) = &self.list_error {
            return Err(StratbenchError::DataSource {
                reason: reason.clone(),
            });
        }
        let mut tickers: Vec<String> = self.data.keys().cloned().collect();
        tickers.sort();
        Ok(tickers)
    }
}

/// Records which results were handed to it instead of writing files.
#[derive(Default)]
pub struct RecordingReportPort {
    pub written: RefCell<Vec<(String, String)>>,
    pub fail: bool,
}

impl ReportPort for RecordingReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, StratbenchError> {
        if self.fail {
            return Err(StratbenchError::Io(std::io::Error::other("disk full")));
        }
        self.written
            .borrow_mut()
            .push((result.ticker.clone(), result.strategy_name()));
        Ok(vec![output_dir.join(format!("{}.csv", result.ticker))])
    }
}

pub fn make_bar(date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp: NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
    }
}

/// Consecutive daily bars with the given closes, starting at `start_date`.
pub fn bars_from_closes(start_date: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let day = start + chrono::Duration::days(i as i64);
            make_bar(&day.format("%Y-%m-%d").to_string(), close)
        })
        .collect()
}

/// A smooth oscillating series, long enough for every built-in strategy.
pub fn generate_bars(start_date: &str, count: usize, start_price: f64) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| start_price + 0.1 * i as f64 + 10.0 * (i as f64 / 7.0).sin())
        .collect();
    bars_from_closes(start_date, &closes)
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        initial_capital: 1000.0,
        trade_unit: TradeUnit::Full,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Writes `<dir>/<ticker>.csv` in the layout the CSV data adapter reads.
pub fn write_price_csv(dir: &Path, ticker: &str, bars: &[OhlcvBar]) {
    let mut content = String::from("Date,Open,High,Low,Close,Volume\n");
    for bar in bars {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.date().format("%Y-%m-%d"),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            bar.volume
        ));
    }
    std::fs::write(dir.join(format!("{ticker}.csv")), content).unwrap();
}
