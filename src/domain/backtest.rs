//! Backtest pipeline: indicators → signals → simulation → metrics.

use crate::domain::error::StratbenchError;
use crate::domain::indicator::IndicatorSet;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::TradeUnit;
use crate::domain::signal::Signal;
use crate::domain::simulator::{SimulationResult, Simulator};
use crate::domain::strategy::Strategy;
use rayon::prelude::*;
use tracing::info;

/// Bars needed for at least one tradable bar after the reference bar.
pub const MIN_BARS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub trade_unit: TradeUnit,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub ticker: String,
    pub strategy: Strategy,
    pub config: BacktestConfig,
    pub bars: Vec<OhlcvBar>,
    pub indicators: IndicatorSet,
    pub signals: Vec<Signal>,
    pub simulation: SimulationResult,
    pub metrics: Metrics,
}

impl BacktestResult {
    pub fn strategy_name(&self) -> String {
        self.strategy.name()
    }
}

pub fn check_data(ticker: &str, bars: &[OhlcvBar]) -> Result<(), StratbenchError> {
    if bars.is_empty() {
        return Err(StratbenchError::NoData {
            ticker: ticker.to_string(),
        });
    }
    if bars.len() < MIN_BARS {
        return Err(StratbenchError::InsufficientData {
            ticker: ticker.to_string(),
            bars: bars.len(),
            minimum: MIN_BARS,
        });
    }
    Ok(())
}

pub fn run_backtest(
    ticker: &str,
    bars: &[OhlcvBar],
    strategy: &Strategy,
    config: &BacktestConfig,
) -> Result<BacktestResult, StratbenchError> {
    check_data(ticker, bars)?;

    let indicators = strategy.compute_indicators(bars);
    let signals = strategy.generate_signals(bars, &indicators);
    let simulation =
        Simulator::new(config.initial_capital, config.trade_unit).run(bars, &signals)?;
    let metrics = Metrics::compute(&simulation.ledger, &simulation.trades, config.initial_capital);

    info!(
        ticker,
        strategy = %strategy.name(),
        bars = bars.len(),
        trades = simulation.trades.len(),
        cumulative_return = metrics.cumulative_return,
        "backtest complete"
    );

    Ok(BacktestResult {
        ticker: ticker.to_string(),
        strategy: strategy.clone(),
        config: *config,
        bars: bars.to_vec(),
        indicators,
        signals,
        simulation,
        metrics,
    })
}

/// Runs every strategy over the same bars in parallel. Results keep the
/// order of `strategies`; the first error aborts the comparison.
pub fn compare_strategies(
    ticker: &str,
    bars: &[OhlcvBar],
    strategies: &[Strategy],
    config: &BacktestConfig,
) -> Result<Vec<BacktestResult>, StratbenchError> {
    check_data(ticker, bars)?;
    strategies
        .par_iter()
        .map(|strategy| run_backtest(ticker, bars, strategy, config))
        .collect()
}

/// Result with the highest cumulative return; the earliest wins ties.
pub fn best_by_cumulative_return(results: &[BacktestResult]) -> Option<&BacktestResult> {
    results.iter().reduce(|best, r| {
        if r.metrics.cumulative_return > best.metrics.cumulative_return {
            r
        } else {
            best
        }
    })
}
