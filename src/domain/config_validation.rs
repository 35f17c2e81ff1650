//! Configuration validation.
//!
//! Validates config fields before any data is read.

use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::is_valid_ticker;
use crate::domain::position::TradeUnit;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), StratbenchError> {
    validate_data_path(config)?;
    validate_ticker(config)?;
    validate_dates(config)?;
    parse_initial_capital(config)?;
    parse_trade_unit(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), StratbenchError> {
    match config.get_string("strategy", "strategy_type") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(StratbenchError::ConfigMissing {
            section: "strategy".to_string(),
            key: "strategy_type".to_string(),
        }),
    }
}

/// `[backtest] trade_unit_size`: a positive amount or `full`.
pub fn parse_trade_unit(config: &dyn ConfigPort) -> Result<TradeUnit, StratbenchError> {
    let raw = config
        .get_string("backtest", "trade_unit_size")
        .ok_or_else(|| StratbenchError::ConfigMissing {
            section: "backtest".to_string(),
            key: "trade_unit_size".to_string(),
        })?;
    raw.parse().map_err(|reason| StratbenchError::ConfigInvalid {
        section: "backtest".to_string(),
        key: "trade_unit_size".to_string(),
        reason,
    })
}

/// `[data] start_date` / `end_date` as `YYYY-MM-DD`.
pub fn parse_date_range(
    config: &dyn ConfigPort,
) -> Result<(NaiveDate, NaiveDate), StratbenchError> {
    let start_str = config.get_string("data", "start_date");
    let end_str = config.get_string("data", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;
    Ok((start_date, end_date))
}

fn validate_data_path(config: &dyn ConfigPort) -> Result<(), StratbenchError> {
    require_non_empty(config, "data", "path")
}

fn validate_ticker(config: &dyn ConfigPort) -> Result<(), StratbenchError> {
    require_non_empty(config, "data", "ticker")?;
    let ticker = config.get_string("data", "ticker").unwrap_or_default();
    check_ticker(ticker.trim())
}

/// Rejects tickers that could escape the data or report directory.
pub fn check_ticker(ticker: &str) -> Result<(), StratbenchError> {
    if is_valid_ticker(ticker) {
        Ok(())
    } else {
        Err(StratbenchError::ConfigInvalid {
            section: "data".to_string(),
            key: "ticker".to_string(),
            reason: format!("'{ticker}' is not a valid ticker symbol"),
        })
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), StratbenchError> {
    let (start_date, end_date) = parse_date_range(config)?;
    if start_date >= end_date {
        return Err(StratbenchError::ConfigInvalid {
            section: "data".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

/// `[backtest] initial_capital`: a finite amount above zero.
pub fn parse_initial_capital(config: &dyn ConfigPort) -> Result<f64, StratbenchError> {
    if config.get_string("backtest", "initial_capital").is_none() {
        return Err(StratbenchError::ConfigMissing {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
        });
    }
    let value = config.get_double("backtest", "initial_capital", 0.0);
    if !value.is_finite() || value <= 0.0 {
        return Err(StratbenchError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(value)
}

fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, StratbenchError> {
    match value {
        None => Err(StratbenchError::ConfigMissing {
            section: "data".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            StratbenchError::ConfigInvalid {
                section: "data".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn require_non_empty(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), StratbenchError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(StratbenchError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}
