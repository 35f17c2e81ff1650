//! CSV file data adapter.
//!
//! One file per ticker, `<base>/<TICKER>.csv`. Headers are matched
//! case-insensitively; the timestamp column may be named `date`, `datetime`
//! or `timestamp`. Extra columns are ignored.

use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::{is_valid_ticker, OhlcvBar};
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;

const TIMESTAMP_HEADERS: [&str; 3] = ["date", "datetime", "timestamp"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

/// Column positions resolved from the header row.
struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, StratbenchError> {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |name: &str| {
            names
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| data_error(format!("missing {} column", name)))
        };
        let timestamp = names
            .iter()
            .position(|h| TIMESTAMP_HEADERS.contains(&h.as_str()))
            .ok_or_else(|| data_error("missing date column".to_string()))?;

        Ok(Self {
            timestamp,
            open: find("open")?,
            high: find("high")?,
            low: find("low")?,
            close: find("close")?,
            volume: find("volume")?,
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> Result<PathBuf, StratbenchError> {
        if !is_valid_ticker(ticker) {
            return Err(data_error(format!("invalid ticker '{}'", ticker)));
        }
        Ok(self.base_path.join(format!("{}.csv", ticker)))
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, StratbenchError> {
        let path = self.csv_path(ticker)?;
        let content = fs::read_to_string(&path)
            .map_err(|e| data_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| data_error(format!("CSV parse error: {}", e)))?
            .clone();
        let columns = Columns::from_headers(&headers)?;

        let mut bars = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| data_error(format!("CSV parse error: {}", e)))?;
            // header is line 1
            let line = line + 2;

            let timestamp = parse_timestamp(field(&record, columns.timestamp, "date", line)?)
                .ok_or_else(|| data_error(format!("invalid date format on line {}", line)))?;

            let date = timestamp.date();
            if date < start_date || date > end_date {
                continue;
            }

            let bar = OhlcvBar {
                timestamp,
                open: parse_price(&record, columns.open, "open", line)?,
                high: parse_price(&record, columns.high, "high", line)?,
                low: parse_price(&record, columns.low, "low", line)?,
                close: parse_price(&record, columns.close, "close", line)?,
                volume: parse_number(&record, columns.volume, "volume", line)?,
            };
            if bar.volume < 0.0 {
                return Err(data_error(format!("negative volume on line {}", line)));
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.timestamp);
        if let Some(w) = bars.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
            return Err(data_error(format!(
                "duplicate timestamp {} in {}",
                w[0].timestamp,
                path.display()
            )));
        }
        Ok(bars)
    }

    fn list_tickers(&self) -> Result<Vec<String>, StratbenchError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| {
            data_error(format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        let mut tickers = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| data_error(format!("directory entry error: {}", e)))?;
            let path = entry.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
                continue;
            };
            if is_csv && is_valid_ticker(&stem) {
                tickers.push(stem);
            }
        }

        tickers.sort();
        Ok(tickers)
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn field<'r>(
    record: &'r StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<&'r str, StratbenchError> {
    record
        .get(index)
        .ok_or_else(|| data_error(format!("missing {} value on line {}", name, line)))
}

fn parse_number(
    record: &StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<f64, StratbenchError> {
    let value: f64 = field(record, index, name, line)?
        .trim()
        .parse()
        .map_err(|e| data_error(format!("invalid {} value on line {}: {}", name, line, e)))?;
    if !value.is_finite() {
        return Err(data_error(format!("invalid {} value on line {}", name, line)));
    }
    Ok(value)
}

fn parse_price(
    record: &StringRecord,
    index: usize,
    name: &str,
    line: usize,
) -> Result<f64, StratbenchError> {
    let value = parse_number(record, index, name, line)?;
    if value <= 0.0 {
        return Err(data_error(format!(
            "{} must be positive on line {}, got {}",
            name, line, value
        )));
    }
    Ok(value)
}

fn data_error(reason: String) -> StratbenchError {
    StratbenchError::DataSource { reason }
}
