//! Integration tests.
//!
//! Tests cover:
//! - Full backtest pipeline with a mock data port
//! - Pipeline over CSV files through the CSV data adapter
//! - Ledger invariants for every built-in strategy
//! - Parallel comparison over one price series
//! - Report generation through the report port

mod common;

use approx::assert_relative_eq;
use common::*;
use stratbench::adapters::csv_adapter::CsvAdapter;
use stratbench::adapters::csv_report_adapter::CsvReportAdapter;
use stratbench::domain::backtest::{
    best_by_cumulative_return, compare_strategies, run_backtest, BacktestConfig,
};
use stratbench::domain::error::StratbenchError;
use stratbench::domain::position::TradeUnit;
use stratbench::domain::registry::{StrategyParams, StrategyRegistry};
use stratbench::domain::signal::Signal;
use stratbench::domain::simulator::TradeAction;
use stratbench::domain::strategy::Strategy;
use stratbench::ports::data_port::DataPort;
use stratbench::ports::report_port::ReportPort;
use tempfile::TempDir;

fn all_strategies() -> Vec<Strategy> {
    vec![
        Strategy::BuyAndHold,
        Strategy::golden_cross(5, 20).unwrap(),
        Strategy::rsi(14, 30.0, 70.0).unwrap(),
        Strategy::bollinger(20, 2.0).unwrap(),
        Strategy::macd(12, 26, 9).unwrap(),
    ]
}

mod full_backtest_pipeline {
    use super::*;

    // SMA(2) crosses above SMA(3) on the 4th bar and below on the 7th.
    fn cross_bars() -> Vec<OhlcvBar> {
        bars_from_closes("2024-01-01", &[10.0, 10.0, 10.0, 13.0, 16.0, 10.0, 4.0, 4.0])
    }

    #[test]
    fn full_pipeline_with_mock_data_port() {
        let port = MockDataPort::new().with_bars("TSLA", cross_bars());
        let bars = port
            .fetch_ohlcv("TSLA", date(2024, 1, 1), date(2024, 12, 31))
            .unwrap();
        let strategy = Strategy::golden_cross(2, 3).unwrap();

        let result = run_backtest("TSLA", &bars, &strategy, &sample_config()).unwrap();

        let codes: Vec<i8> = result.signals.iter().map(|s| s.as_i8()).collect();
        assert_eq!(codes, vec![0, 0, 0, 1, 1, 0, -1, -1]);

        let trades = &result.simulation.trades;
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].action, TradeAction::Buy);
        assert_eq!(trades[0].shares, 76);
        assert_relative_eq!(trades[0].price, 13.0);
        assert_eq!(trades[1].action, TradeAction::Sell);
        assert_eq!(trades[1].shares, 76);
        assert_relative_eq!(trades[1].price, 4.0);

        let last = result.simulation.ledger.last().unwrap();
        assert_eq!(last.num_stocks, 0);
        assert_relative_eq!(last.cash, 316.0, epsilon = 1e-9);

        let m = &result.metrics;
        assert_eq!(m.total_trades, 1);
        assert_relative_eq!(m.win_rate, 0.0);
        assert_relative_eq!(m.cumulative_return, -68.4, epsilon = 1e-9);
        assert_relative_eq!(m.mdd, (316.0 / 1228.0 - 1.0) * 100.0, epsilon = 1e-9);
        assert_eq!(m.mdd_date.unwrap().date(), date(2024, 1, 7));
    }

    #[test]
    fn mock_port_date_filter_is_inclusive() {
        let port = MockDataPort::new().with_bars("TSLA", cross_bars());
        let bars = port
            .fetch_ohlcv("TSLA", date(2024, 1, 2), date(2024, 1, 4))
            .unwrap();
        assert_eq!(bars.len(), 3);
    }

    #[test]
    fn data_port_error_propagates() {
        let port = MockDataPort::new().with_error("TSLA", "connection refused");
        let err = port
            .fetch_ohlcv("TSLA", date(2024, 1, 1), date(2024, 12, 31))
            .unwrap_err();
        assert!(matches!(err, StratbenchError::DataSource { .. }));
    }

    #[test]
    fn unknown_ticker_yields_no_data() {
        let port = MockDataPort::new();
        let bars = port
            .fetch_ohlcv("NOPE", date(2024, 1, 1), date(2024, 12, 31))
            .unwrap();
        let err = run_backtest("NOPE", &bars, &Strategy::BuyAndHold, &sample_config()).unwrap_err();
        assert!(matches!(err, StratbenchError::NoData { .. }));
    }

    #[test]
    fn strategy_from_registry_matches_direct_construction() {
        let registry = StrategyRegistry::with_builtins();
        let params = StrategyParams::new()
            .with("short_ma", 2)
            .with("long_ma", 3);
        let from_registry = registry.create("golden_cross", &params).unwrap();
        assert_eq!(from_registry, Strategy::golden_cross(2, 3).unwrap());

        let bars = cross_bars();
        let a = run_backtest("X", &bars, &from_registry, &sample_config()).unwrap();
        let b = run_backtest("X", &bars, &Strategy::golden_cross(2, 3).unwrap(), &sample_config())
            .unwrap();
        assert_eq!(a.simulation, b.simulation);
    }
}

mod csv_pipeline {
    use super::*;

    #[test]
    fn backtest_over_csv_file() {
        let dir = TempDir::new().unwrap();
        let bars = generate_bars("2023-01-02", 120, 100.0);
        write_price_csv(dir.path(), "AAPL", &bars);

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let loaded = adapter
            .fetch_ohlcv("AAPL", date(2023, 1, 1), date(2023, 12, 31))
            .unwrap();
        assert_eq!(loaded.len(), bars.len());

        let strategy = Strategy::rsi(14, 30.0, 70.0).unwrap();
        let from_csv = run_backtest("AAPL", &loaded, &strategy, &sample_config()).unwrap();
        let in_memory = run_backtest("AAPL", &bars, &strategy, &sample_config()).unwrap();
        assert_eq!(from_csv.signals, in_memory.signals);
        assert_eq!(
            from_csv.simulation.trades.len(),
            in_memory.simulation.trades.len()
        );
    }

    #[test]
    fn date_range_narrows_csv_data() {
        let dir = TempDir::new().unwrap();
        write_price_csv(dir.path(), "AAPL", &generate_bars("2023-01-01", 60, 100.0));

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let loaded = adapter
            .fetch_ohlcv("AAPL", date(2023, 1, 10), date(2023, 1, 19))
            .unwrap();
        assert_eq!(loaded.len(), 10);
        assert_eq!(loaded[0].date(), date(2023, 1, 10));
        assert_eq!(loaded[9].date(), date(2023, 1, 19));
    }

    #[test]
    fn single_bar_in_range_is_insufficient() {
        let dir = TempDir::new().unwrap();
        write_price_csv(dir.path(), "AAPL", &generate_bars("2023-01-01", 30, 100.0));

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let day = date(2023, 1, 5);
        let loaded = adapter.fetch_ohlcv("AAPL", day, day).unwrap();
        let err =
            run_backtest("AAPL", &loaded, &Strategy::BuyAndHold, &sample_config()).unwrap_err();
        assert!(matches!(err, StratbenchError::InsufficientData { bars: 1, .. }));
    }
}

mod ledger_invariants {
    use super::*;

    fn configs() -> Vec<BacktestConfig> {
        vec![
            sample_config(),
            BacktestConfig {
                initial_capital: 1000.0,
                trade_unit: TradeUnit::Fixed(100.0),
            },
            BacktestConfig {
                initial_capital: 50.0,
                trade_unit: TradeUnit::Fixed(10.0),
            },
        ]
    }

    #[test]
    fn total_assets_equal_cash_plus_holdings() {
        let bars = generate_bars("2023-01-01", 250, 100.0);
        for strategy in all_strategies() {
            for config in configs() {
                let result = run_backtest("X", &bars, &strategy, &config).unwrap();
                for row in &result.simulation.ledger {
                    let expected = row.cash + row.num_stocks as f64 * row.close;
                    assert_relative_eq!(row.total_assets, expected, epsilon = 1e-6);
                    assert!(row.cash >= -1e-9, "{}: negative cash", strategy.name());
                }
            }
        }
    }

    #[test]
    fn sells_never_exceed_buys() {
        let bars = generate_bars("2023-01-01", 250, 100.0);
        for strategy in all_strategies() {
            for config in configs() {
                let sim = run_backtest("X", &bars, &strategy, &config).unwrap().simulation;
                assert!(sim.sell_count() <= sim.buy_count(), "{}", strategy.name());
            }
        }
    }

    #[test]
    fn bar_zero_never_trades() {
        let bars = generate_bars("2023-01-01", 100, 100.0);
        for strategy in all_strategies() {
            let result = run_backtest("X", &bars, &strategy, &sample_config()).unwrap();
            let first = &result.simulation.ledger[0];
            assert!(first.trade.is_none());
            assert_eq!(first.num_stocks, 0);
            assert_relative_eq!(first.cash, 1000.0);
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let bars = generate_bars("2023-01-01", 200, 100.0);
        for strategy in all_strategies() {
            let a = run_backtest("X", &bars, &strategy, &sample_config()).unwrap();
            let b = run_backtest("X", &bars, &strategy, &sample_config()).unwrap();
            assert_eq!(a.simulation, b.simulation);
            assert_eq!(a.metrics, b.metrics);
        }
    }

    #[test]
    fn buy_and_hold_buys_once() {
        let bars = bars_from_closes("2024-01-01", &[100.0, 100.0, 110.0, 120.0, 150.0]);
        let result = run_backtest("X", &bars, &Strategy::BuyAndHold, &sample_config()).unwrap();
        assert_eq!(
            result.signals,
            vec![Signal::Hold, Signal::Buy, Signal::Buy, Signal::Buy, Signal::Buy]
        );
        assert_eq!(result.simulation.buy_count(), 1);
        assert_eq!(result.simulation.sell_count(), 0);
        assert_eq!(result.simulation.trades[0].timestamp.date(), date(2024, 1, 2));
    }
}

mod comparison {
    use super::*;

    #[test]
    fn compare_all_builtins_keeps_order() {
        let bars = generate_bars("2023-01-01", 300, 100.0);
        let strategies = all_strategies();
        let results = compare_strategies("X", &bars, &strategies, &sample_config()).unwrap();

        let names: Vec<String> = results.iter().map(|r| r.strategy_name()).collect();
        let expected: Vec<String> = strategies.iter().map(Strategy::name).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn best_strategy_has_max_return() {
        let bars = generate_bars("2023-01-01", 300, 100.0);
        let results = compare_strategies("X", &bars, &all_strategies(), &sample_config()).unwrap();
        let best = best_by_cumulative_return(&results).unwrap();
        assert!(results
            .iter()
            .all(|r| r.metrics.cumulative_return <= best.metrics.cumulative_return));
    }

    #[test]
    fn compare_insufficient_data_fails() {
        let bars = generate_bars("2023-01-01", 1, 100.0);
        let err = compare_strategies("X", &bars, &all_strategies(), &sample_config()).unwrap_err();
        assert!(matches!(err, StratbenchError::InsufficientData { .. }));
    }
}

mod report_generation {
    use super::*;

    #[test]
    fn report_port_receives_result() {
        let bars = generate_bars("2023-01-01", 60, 100.0);
        let result = run_backtest("TSLA", &bars, &Strategy::BuyAndHold, &sample_config()).unwrap();

        let port = RecordingReportPort::default();
        let dir = TempDir::new().unwrap();
        let files = port.write(&result, dir.path()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(
            port.written.borrow().as_slice(),
            &[("TSLA".to_string(), "Buy and Hold (Benchmark)".to_string())]
        );
    }

    #[test]
    fn csv_report_rows_match_ledger() {
        let bars = generate_bars("2023-01-01", 60, 100.0);
        let strategy = Strategy::macd(12, 26, 9).unwrap();
        let result = run_backtest("TSLA", &bars, &strategy, &sample_config()).unwrap();

        let dir = TempDir::new().unwrap();
        let files = CsvReportAdapter::new().write(&result, dir.path()).unwrap();
        assert_eq!(files.len(), 3);

        let mut rdr = csv::Reader::from_path(&files[0]).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert!(headers.iter().any(|h| h.starts_with("MACD")));
        let total_idx = headers.iter().position(|h| h == "total_assets").unwrap();

        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), result.simulation.ledger.len());
        for (row, ledger) in rows.iter().zip(&result.simulation.ledger) {
            let total: f64 = row[total_idx].parse().unwrap();
            assert_relative_eq!(total, ledger.total_assets, epsilon = 1e-9);
        }

        let mut trades = csv::Reader::from_path(&files[1]).unwrap();
        assert_eq!(trades.records().count(), result.simulation.trades.len());
    }
}
