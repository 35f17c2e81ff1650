//! Trade simulator.
//!
//! Walks the bars in order and reacts to signal transitions:
//!
//! - entry: previous signal ≤ 0 and current signal is Buy → buy at the close
//! - exit: otherwise, previous signal ≥ 0, current signal is Sell and shares
//!   are held → sell everything at the close
//!
//! Bar 0 is the reference row and is never traded. Every bar produces one
//! [`LedgerRow`]; every executed trade appends one [`TradeRecord`].

use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::{Position, TradeUnit};
use crate::domain::signal::Signal;
use chrono::NaiveDateTime;
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "BUY"),
            TradeAction::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub action: TradeAction,
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub shares: u64,
}

impl TradeRecord {
    pub fn value(&self) -> f64 {
        self.shares as f64 * self.price
    }
}

/// State of the run after bar `timestamp` was processed.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub signal: Signal,
    pub trade: Option<TradeAction>,
    pub num_stocks: u64,
    pub holding_size: f64,
    pub cash: f64,
    pub total_assets: f64,
    pub cumulative_return_pct: f64,
    /// Return of the close against the most recent buy close while shares
    /// are held, 0 otherwise.
    pub holding_return_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub ledger: Vec<LedgerRow>,
    pub trades: Vec<TradeRecord>,
}

impl SimulationResult {
    pub fn final_assets(&self) -> Option<f64> {
        self.ledger.last().map(|row| row.total_assets)
    }

    pub fn buy_count(&self) -> usize {
        self.count(TradeAction::Buy)
    }

    pub fn sell_count(&self) -> usize {
        self.count(TradeAction::Sell)
    }

    fn count(&self, action: TradeAction) -> usize {
        self.trades.iter().filter(|t| t.action == action).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simulator {
    pub initial_capital: f64,
    pub trade_unit: TradeUnit,
}

impl Simulator {
    pub fn new(initial_capital: f64, trade_unit: TradeUnit) -> Self {
        Self {
            initial_capital,
            trade_unit,
        }
    }

    pub fn run(
        &self,
        bars: &[OhlcvBar],
        signals: &[Signal],
    ) -> Result<SimulationResult, StratbenchError> {
        if signals.len() != bars.len() {
            return Err(StratbenchError::SignalLengthMismatch {
                signals: signals.len(),
                bars: bars.len(),
            });
        }

        let mut position = Position::new(self.initial_capital);
        let mut trades = Vec::new();
        let mut ledger = Vec::with_capacity(bars.len());
        let mut buy_close: Option<f64> = None;

        for (i, (bar, &signal)) in bars.iter().zip(signals).enumerate() {
            let trade = if i == 0 {
                None
            } else {
                self.step(&mut position, bar, signals[i - 1], signal, &mut trades)
            };

            match trade {
                Some(TradeAction::Buy) => buy_close = Some(bar.close),
                Some(TradeAction::Sell) => buy_close = None,
                None => {}
            }

            ledger.push(self.ledger_row(bar, signal, trade, &position, buy_close));
        }

        Ok(SimulationResult { ledger, trades })
    }

    fn step(
        &self,
        position: &mut Position,
        bar: &OhlcvBar,
        prev: Signal,
        current: Signal,
        trades: &mut Vec<TradeRecord>,
    ) -> Option<TradeAction> {
        let price = bar.close;
        if prev.as_i8() <= 0 && current == Signal::Buy {
            let shares = position.buy_quantity(price, self.trade_unit);
            if shares == 0 {
                debug!(
                    timestamp = %bar.timestamp,
                    price,
                    cash = position.cash,
                    "buy skipped: insufficient cash"
                );
                return None;
            }
            position.buy(shares, price);
            debug!(
                timestamp = %bar.timestamp,
                price,
                shares,
                cash = position.cash,
                "buy"
            );
            trades.push(TradeRecord {
                action: TradeAction::Buy,
                timestamp: bar.timestamp,
                price,
                shares,
            });
            Some(TradeAction::Buy)
        } else if prev.as_i8() >= 0 && current == Signal::Sell && position.is_open() {
            let shares = position.sell_all(price);
            debug!(timestamp = %bar.timestamp, price, shares, cash = position.cash, "sell");
            trades.push(TradeRecord {
                action: TradeAction::Sell,
                timestamp: bar.timestamp,
                price,
                shares,
            });
            Some(TradeAction::Sell)
        } else {
            None
        }
    }

    fn ledger_row(
        &self,
        bar: &OhlcvBar,
        signal: Signal,
        trade: Option<TradeAction>,
        position: &Position,
        buy_close: Option<f64>,
    ) -> LedgerRow {
        let holding_size = position.market_value(bar.close);
        let total_assets = position.total_value(bar.close);
        let holding_return_pct = match buy_close {
            Some(reference) if position.is_open() && reference > 0.0 => {
                (bar.close / reference - 1.0) * 100.0
            }
            _ => 0.0,
        };
        LedgerRow {
            timestamp: bar.timestamp,
            close: bar.close,
            signal,
            trade,
            num_stocks: position.shares,
            holding_size,
            cash: position.cash,
            total_assets,
            cumulative_return_pct: (total_assets / self.initial_capital - 1.0) * 100.0,
            holding_return_pct,
        }
    }
}
