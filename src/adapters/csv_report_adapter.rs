//! CSV report adapter.
//!
//! Writes three files per run into the output directory, prefixed with
//! `<ticker>_<strategy>`:
//!
//! - `_timeseries.csv`: bars, indicator columns and the ledger
//! - `_trades.csv`: the trade log
//! - `_performance.csv`: one `metric,value` row per metric

use crate::domain::backtest::BacktestResult;
use crate::domain::error::StratbenchError;
use crate::domain::metrics::drawdown_series;
use crate::domain::ohlcv::is_valid_ticker;
use crate::ports::report_port::ReportPort;
use chrono::{NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const LEDGER_HEADERS: [&str; 10] = [
    "trade_signal",
    "trade_log",
    "num_stocks",
    "holding_size",
    "holding_return(%)",
    "cash",
    "total_assets",
    "cumulative_return(%)",
    "peak",
    "drawdown",
];

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

#[derive(Serialize)]
struct TradeRow {
    #[serde(rename = "type")]
    action: String,
    date: String,
    price: f64,
    shares: u64,
    value: f64,
}

#[derive(Serialize)]
struct MetricRow<'a> {
    metric: &'a str,
    value: String,
}

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn file_prefix(result: &BacktestResult) -> String {
        format!("{}_{}", result.ticker, result.strategy.kind().key())
    }

    fn write_timeseries(
        &self,
        result: &BacktestResult,
        path: &Path,
        ts_format: &str,
    ) -> Result<(), StratbenchError> {
        let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;

        let mut headers: Vec<String> = ["date", "open", "high", "low", "close", "volume"]
            .iter()
            .map(|h| h.to_string())
            .collect();
        for series in result.indicators.iter() {
            headers.extend(series.indicator_type.column_names());
        }
        headers.extend(LEDGER_HEADERS.iter().map(|h| h.to_string()));
        wtr.write_record(&headers).map_err(csv_error)?;

        let drawdowns = drawdown_series(&result.simulation.ledger);
        for (i, ((bar, row), dd)) in result
            .bars
            .iter()
            .zip(&result.simulation.ledger)
            .zip(&drawdowns)
            .enumerate()
        {
            let mut record = vec![
                bar.timestamp.format(ts_format).to_string(),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.volume.to_string(),
            ];
            for series in result.indicators.iter() {
                match series.get(i) {
                    Some(value) => record.extend(value.components().iter().map(f64::to_string)),
                    None => {
                        let width = series.indicator_type.column_names().len();
                        record.extend(std::iter::repeat_n(String::new(), width));
                    }
                }
            }
            record.extend([
                row.signal.to_string(),
                row.trade.map(|t| t.to_string()).unwrap_or_default(),
                row.num_stocks.to_string(),
                row.holding_size.to_string(),
                row.holding_return_pct.to_string(),
                row.cash.to_string(),
                row.total_assets.to_string(),
                row.cumulative_return_pct.to_string(),
                dd.peak.to_string(),
                dd.drawdown.to_string(),
            ]);
            wtr.write_record(&record).map_err(csv_error)?;
        }

        wtr.flush()?;
        Ok(())
    }

    fn write_trades(
        &self,
        result: &BacktestResult,
        path: &Path,
        ts_format: &str,
    ) -> Result<(), StratbenchError> {
        let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;
        if result.simulation.trades.is_empty() {
            wtr.write_record(["type", "date", "price", "shares", "value"])
                .map_err(csv_error)?;
        }
        for trade in &result.simulation.trades {
            wtr.serialize(TradeRow {
                action: trade.action.to_string(),
                date: trade.timestamp.format(ts_format).to_string(),
                price: trade.price,
                shares: trade.shares,
                value: trade.value(),
            })
            .map_err(csv_error)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_performance(
        &self,
        result: &BacktestResult,
        path: &Path,
        ts_format: &str,
    ) -> Result<(), StratbenchError> {
        let m = &result.metrics;
        let rows = [
            ("ticker", result.ticker.clone()),
            ("strategy", result.strategy_name()),
            ("initial_capital", result.config.initial_capital.to_string()),
            ("trade_unit_size", result.config.trade_unit.to_string()),
            ("cumulative_return", m.cumulative_return.to_string()),
            ("total_trades", m.total_trades.to_string()),
            ("win_rate", m.win_rate.to_string()),
            ("mdd", m.mdd.to_string()),
            (
                "mdd_date",
                m.mdd_date
                    .map(|d| d.format(ts_format).to_string())
                    .unwrap_or_default(),
            ),
            ("cagr", m.cagr.to_string()),
            ("sharpe_ratio", m.sharpe_ratio.to_string()),
        ];

        let mut wtr = csv::Writer::from_path(path).map_err(csv_error)?;
        for (metric, value) in rows {
            wtr.serialize(MetricRow { metric, value })
                .map_err(csv_error)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, StratbenchError> {
        if !is_valid_ticker(&result.ticker) {
            return Err(StratbenchError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("'{}' is not a valid ticker for a report file name", result.ticker),
            )));
        }
        fs::create_dir_all(output_dir)?;

        let prefix = Self::file_prefix(result);
        let ts_format = timestamp_format(result.bars.iter().map(|b| b.timestamp));
        let timeseries = output_dir.join(format!("{prefix}_timeseries.csv"));
        let trades = output_dir.join(format!("{prefix}_trades.csv"));
        let performance = output_dir.join(format!("{prefix}_performance.csv"));

        self.write_timeseries(result, &timeseries, ts_format)?;
        self.write_trades(result, &trades, ts_format)?;
        self.write_performance(result, &performance, ts_format)?;

        info!(dir = %output_dir.display(), prefix = %prefix, "report written");
        Ok(vec![timeseries, trades, performance])
    }
}

/// Date-only output when every timestamp falls on midnight.
fn timestamp_format(mut timestamps: impl Iterator<Item = NaiveDateTime>) -> &'static str {
    if timestamps.all(|t| t.time() == NaiveTime::MIN) {
        DATE_FORMAT
    } else {
        DATETIME_FORMAT
    }
}

fn csv_error(e: csv::Error) -> StratbenchError {
    StratbenchError::Io(std::io::Error::other(e))
}
