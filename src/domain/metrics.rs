//! Performance metrics over a completed simulation.
//!
//! Annualisation uses fixed calendar conventions (252 trading days for the
//! Sharpe ratio, 365 calendar days for CAGR) whatever the bar interval.

use crate::domain::simulator::{LedgerRow, TradeAction, TradeRecord};
use chrono::NaiveDateTime;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const CALENDAR_DAYS_PER_YEAR: f64 = 365.0;

/// Summary statistics of one run. Percentages are in percent units.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub cumulative_return: f64,
    /// Number of executed buys.
    pub total_trades: usize,
    pub win_rate: f64,
    /// Most negative drawdown, ≤ 0.
    pub mdd: f64,
    pub mdd_date: Option<NaiveDateTime>,
    pub cagr: f64,
    pub sharpe_ratio: f64,
}

/// Running peak and drawdown of the equity curve at one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownPoint {
    pub timestamp: NaiveDateTime,
    pub peak: f64,
    /// `equity / peak - 1`, ≤ 0.
    pub drawdown: f64,
}

impl Metrics {
    pub fn compute(ledger: &[LedgerRow], trades: &[TradeRecord], initial_capital: f64) -> Self {
        let final_assets = ledger
            .last()
            .map(|row| row.total_assets)
            .unwrap_or(initial_capital);

        let cumulative_return = if initial_capital > 0.0 {
            (final_assets / initial_capital - 1.0) * 100.0
        } else {
            0.0
        };

        let (mdd, mdd_date) = compute_drawdown(ledger);
        let final_close = ledger.last().map(|row| row.close);
        let (total_trades, win_rate) = compute_win_rate(trades, final_close);

        Metrics {
            cumulative_return,
            total_trades,
            win_rate,
            mdd,
            mdd_date,
            cagr: compute_cagr(ledger, initial_capital, final_assets),
            sharpe_ratio: compute_sharpe(ledger),
        }
    }
}

pub fn drawdown_series(ledger: &[LedgerRow]) -> Vec<DrawdownPoint> {
    let mut peak = f64::NEG_INFINITY;
    ledger
        .iter()
        .map(|row| {
            peak = peak.max(row.total_assets);
            let drawdown = if peak > 0.0 {
                row.total_assets / peak - 1.0
            } else {
                0.0
            };
            DrawdownPoint {
                timestamp: row.timestamp,
                peak,
                drawdown,
            }
        })
        .collect()
}

/// Maximum drawdown in percent and the timestamp of its first occurrence.
fn compute_drawdown(ledger: &[LedgerRow]) -> (f64, Option<NaiveDateTime>) {
    let worst = drawdown_series(ledger)
        .into_iter()
        .fold(None::<DrawdownPoint>, |worst, point| match worst {
            Some(w) if w.drawdown <= point.drawdown => Some(w),
            _ => Some(point),
        });

    match worst {
        Some(point) => (point.drawdown * 100.0, Some(point.timestamp)),
        None => (0.0, None),
    }
}

/// Buys paired with the first sell after them; a buy wins when that sell
/// price is higher. Only the last buy is marked to `final_close` when no
/// sell follows it; earlier unmatched buys stay in the denominator.
fn compute_win_rate(trades: &[TradeRecord], final_close: Option<f64>) -> (usize, f64) {
    let buys: Vec<&TradeRecord> = trades
        .iter()
        .filter(|t| t.action == TradeAction::Buy)
        .collect();
    if buys.is_empty() {
        return (0, 0.0);
    }

    let wins = buys
        .iter()
        .enumerate()
        .filter(|(i, buy)| {
            let exit = trades
                .iter()
                .find(|t| t.action == TradeAction::Sell && t.timestamp > buy.timestamp);
            match exit {
                Some(sell) => sell.price > buy.price,
                None if *i == buys.len() - 1 => final_close.is_some_and(|close| close > buy.price),
                None => false,
            }
        })
        .count();

    (buys.len(), wins as f64 / buys.len() as f64 * 100.0)
}

fn compute_cagr(ledger: &[LedgerRow], initial_capital: f64, final_assets: f64) -> f64 {
    let (Some(first), Some(last)) = (ledger.first(), ledger.last()) else {
        return 0.0;
    };
    let days = (last.timestamp - first.timestamp).num_days();
    if days <= 0 || initial_capital <= 0.0 {
        return 0.0;
    }
    ((final_assets / initial_capital).powf(CALENDAR_DAYS_PER_YEAR / days as f64) - 1.0) * 100.0
}

/// √252 × mean / sample std of bar-over-bar equity returns, risk-free rate 0.
fn compute_sharpe(ledger: &[LedgerRow]) -> f64 {
    let returns: Vec<f64> = ledger
        .windows(2)
        .map(|w| {
            let prev = w[0].total_assets;
            if prev > 0.0 {
                (w[1].total_assets / prev - 1.0) * 100.0
            } else {
                0.0
            }
        })
        .collect();

    if returns.len() < 2 {
        return 0.0;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        TRADING_DAYS_PER_YEAR.sqrt() * mean / stddev
    } else {
        0.0
    }
}
