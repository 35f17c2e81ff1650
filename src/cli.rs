//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    check_ticker, parse_date_range, parse_initial_capital, parse_trade_unit,
    validate_backtest_config, validate_strategy_config,
};
use crate::domain::error::StratbenchError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::registry::{StrategyParams, StrategyRegistry};
use crate::domain::strategy::{Strategy, StrategyKind};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const STRATEGY_SECTION: &str = "strategy";
const DAILY_INTERVAL: &str = "1d";

#[derive(Parser, Debug)]
#[command(name = "stratbench", about = "Trading strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Strategy type, overriding `[strategy] strategy_type`
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(long)]
        ticker: Option<String>,
        /// Directory for the CSV report
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run several strategies over the same data and rank them
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, value_delimiter = ',')]
        strategies: Vec<String>,
        #[arg(long)]
        ticker: Option<String>,
        /// Directory for one CSV report per strategy
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List registered strategy types
    ListStrategies,
    /// List tickers with a CSV file under `[data] path`
    ListTickers {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// `[data]` settings after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSettings {
    pub path: PathBuf,
    pub ticker: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub interval: String,
}

pub fn run(cli: Cli) -> ExitCode {
    let registry = StrategyRegistry::with_builtins();
    match cli.command {
        Command::Backtest {
            config,
            strategy,
            ticker,
            output,
        } => run_backtest(
            &config,
            &registry,
            strategy.as_deref(),
            ticker.as_deref(),
            output.as_deref(),
        ),
        Command::Compare {
            config,
            strategies,
            ticker,
            output,
        } => run_compare(
            &config,
            &registry,
            &strategies,
            ticker.as_deref(),
            output.as_deref(),
        ),
        Command::ListStrategies => run_list_strategies(&registry),
        Command::ListTickers { config } => run_list_tickers(&config),
        Command::Validate { config } => run_validate(&config, &registry),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = StratbenchError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn run_backtest(
    config_path: &Path,
    registry: &StrategyRegistry,
    strategy_override: Option<&str>,
    ticker_override: Option<&str>,
    output_dir: Option<&Path>,
) -> ExitCode {
    // Stage 1: load and validate config
    let adapter = match load_validated(config_path, strategy_override.is_none()) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: strategy, backtest parameters and data settings
    let prepared = build_strategy(&adapter, registry, strategy_override).and_then(|strategy| {
        let bt_config = build_backtest_config(&adapter)?;
        let settings = build_data_settings(&adapter, ticker_override)?;
        Ok((strategy, bt_config, settings))
    });
    let (strategy, bt_config, settings) = match prepared {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: data, simulation, report
    let data_port = CsvAdapter::new(settings.path.clone());
    let report_port = CsvReportAdapter::new();
    run_backtest_pipeline(
        &data_port,
        &report_port,
        &strategy,
        &bt_config,
        &settings,
        output_dir,
    )
}

fn run_compare(
    config_path: &Path,
    registry: &StrategyRegistry,
    names: &[String],
    ticker_override: Option<&str>,
    output_dir: Option<&Path>,
) -> ExitCode {
    let adapter = match load_validated(config_path, false) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let prepared = resolve_compare_strategies(&adapter, registry, names).and_then(|strategies| {
        let bt_config = build_backtest_config(&adapter)?;
        let settings = build_data_settings(&adapter, ticker_override)?;
        Ok((strategies, bt_config, settings))
    });
    let (strategies, bt_config, settings) = match prepared {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_port = CsvAdapter::new(settings.path.clone());
    let report_port = CsvReportAdapter::new();
    run_compare_pipeline(
        &data_port,
        &report_port,
        &strategies,
        &bt_config,
        &settings,
        output_dir,
    )
}

fn load_validated(
    config_path: &Path,
    require_strategy: bool,
) -> Result<FileConfigAdapter, ExitCode> {
    info!(path = %config_path.display(), "loading config");
    let adapter = load_config(config_path)?;

    let validated = validate_backtest_config(&adapter).and_then(|()| {
        if require_strategy {
            validate_strategy_config(&adapter)
        } else {
            Ok(())
        }
    });
    if let Err(e) = validated {
        eprintln!("error: {e}");
        return Err((&e).into());
    }
    Ok(adapter)
}

pub fn build_backtest_config(
    adapter: &dyn ConfigPort,
) -> Result<BacktestConfig, StratbenchError> {
    Ok(BacktestConfig {
        initial_capital: parse_initial_capital(adapter)?,
        trade_unit: parse_trade_unit(adapter)?,
    })
}

pub fn build_data_settings(
    adapter: &dyn ConfigPort,
    ticker_override: Option<&str>,
) -> Result<DataSettings, StratbenchError> {
    let path = adapter
        .get_string("data", "path")
        .ok_or_else(|| StratbenchError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    let ticker = match ticker_override {
        Some(t) => t.trim().to_string(),
        None => adapter
            .get_string("data", "ticker")
            .map(|t| t.trim().to_string())
            .ok_or_else(|| StratbenchError::ConfigMissing {
                section: "data".into(),
                key: "ticker".into(),
            })?,
    };
    check_ticker(&ticker)?;
    let (start_date, end_date) = parse_date_range(adapter)?;
    let interval = adapter
        .get_string("data", "interval")
        .unwrap_or_else(|| DAILY_INTERVAL.to_string());

    Ok(DataSettings {
        path: PathBuf::from(path.trim()),
        ticker,
        start_date,
        end_date,
        interval: interval.trim().to_string(),
    })
}

/// Strategy named by `name_override`, or by `[strategy] strategy_type`.
///
/// Parameters come from `[strategy.<name>]` when that section exists,
/// otherwise from `[strategy]` when it describes the same type.
pub fn build_strategy(
    adapter: &dyn ConfigPort,
    registry: &StrategyRegistry,
    name_override: Option<&str>,
) -> Result<Strategy, StratbenchError> {
    let name = match name_override {
        Some(n) => n.trim().to_string(),
        None => adapter
            .get_string(STRATEGY_SECTION, "strategy_type")
            .map(|s| s.trim().to_string())
            .ok_or_else(|| StratbenchError::ConfigMissing {
                section: STRATEGY_SECTION.into(),
                key: "strategy_type".into(),
            })?,
    };
    let params = strategy_params(adapter, &name);
    registry.create(&name, &params)
}

fn strategy_params(adapter: &dyn ConfigPort, name: &str) -> StrategyParams {
    let dedicated = format!("{STRATEGY_SECTION}.{name}");
    if !adapter.section_keys(&dedicated).is_empty() {
        return StrategyParams::from_config(adapter, &dedicated);
    }
    let primary_type = adapter
        .get_string(STRATEGY_SECTION, "strategy_type")
        .map(|s| s.trim().to_string());
    if primary_type.as_deref() == Some(name) {
        StrategyParams::from_config(adapter, STRATEGY_SECTION)
    } else {
        StrategyParams::new()
    }
}

/// Strategies for `compare`: the given names, or else the primary
/// `[strategy]`, every `[strategy.<name>]` section and the buy-and-hold
/// benchmark.
pub fn resolve_compare_strategies(
    adapter: &dyn ConfigPort,
    registry: &StrategyRegistry,
    names: &[String],
) -> Result<Vec<Strategy>, StratbenchError> {
    let mut names: Vec<String> = names
        .iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();

    if names.is_empty() {
        if let Some(primary) = adapter.get_string(STRATEGY_SECTION, "strategy_type") {
            names.push(primary.trim().to_string());
        }
        let prefix = format!("{STRATEGY_SECTION}.");
        let mut sections: Vec<String> = adapter
            .sections()
            .into_iter()
            .filter_map(|s| s.strip_prefix(&prefix).map(str::to_string))
            .collect();
        sections.sort();
        names.extend(sections);
        names.push(StrategyKind::BuyAndHold.key().to_string());
    }

    let mut seen = HashSet::new();
    names.retain(|n| seen.insert(n.clone()));

    names
        .iter()
        .map(|name| build_strategy(adapter, registry, Some(name)))
        .collect()
}

fn warn_if_not_daily(interval: &str) {
    if interval != DAILY_INTERVAL {
        warn!(
            interval,
            "Sharpe and CAGR annualise with daily conventions (252 / 365 days)"
        );
    }
}

fn fetch_bars(
    data_port: &dyn DataPort,
    settings: &DataSettings,
) -> Result<Vec<OhlcvBar>, StratbenchError> {
    info!(
        ticker = %settings.ticker,
        start = %settings.start_date,
        end = %settings.end_date,
        "fetching data"
    );
    let bars = data_port.fetch_ohlcv(&settings.ticker, settings.start_date, settings.end_date)?;
    backtest_engine::check_data(&settings.ticker, &bars)?;
    info!(bars = bars.len(), "data loaded");
    Ok(bars)
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    strategy: &Strategy,
    bt_config: &BacktestConfig,
    settings: &DataSettings,
    output_dir: Option<&Path>,
) -> ExitCode {
    warn_if_not_daily(&settings.interval);

    let result = fetch_bars(data_port, settings).and_then(|bars| {
        backtest_engine::run_backtest(&settings.ticker, &bars, strategy, bt_config)
    });
    let result = match result {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_summary(&result);

    if let Some(dir) = output_dir {
        if let Err(e) = write_report(report_port, &result, dir) {
            eprintln!("error: failed to write report: {e}");
            return (&e).into();
        }
    }
    ExitCode::SUCCESS
}

pub fn run_compare_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    strategies: &[Strategy],
    bt_config: &BacktestConfig,
    settings: &DataSettings,
    output_dir: Option<&Path>,
) -> ExitCode {
    warn_if_not_daily(&settings.interval);

    let results = fetch_bars(data_port, settings).and_then(|bars| {
        backtest_engine::compare_strategies(&settings.ticker, &bars, strategies, bt_config)
    });
    let results = match results {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_comparison(&results);

    if let Some(dir) = output_dir {
        let written: Result<(), StratbenchError> = results
            .iter()
            .try_for_each(|result| write_report(report_port, result, dir));
        if let Err(e) = written {
            eprintln!("error: failed to write report: {e}");
            return (&e).into();
        }
    }
    ExitCode::SUCCESS
}

fn write_report(
    report_port: &dyn ReportPort,
    result: &BacktestResult,
    dir: &Path,
) -> Result<(), StratbenchError> {
    for file in report_port.write(result, dir)? {
        eprintln!("Report written to: {}", file.display());
    }
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!("\n=== {} | {} ===", result.ticker, result.strategy_name());
    let sim = &result.simulation;
    if let Some(final_assets) = sim.final_assets() {
        println!("Final Assets:      {:.2}", final_assets);
    }
    println!("Cumulative Return: {:.2}%", m.cumulative_return);
    println!(
        "Total Trades:      {} ({} buys, {} sells)",
        m.total_trades,
        sim.buy_count(),
        sim.sell_count()
    );
    println!("Win Rate:          {:.1}%", m.win_rate);
    match m.mdd_date {
        Some(date) => println!("Max Drawdown:      {:.2}% ({})", m.mdd, date.date()),
        None => println!("Max Drawdown:      {:.2}%", m.mdd),
    }
    println!("CAGR:              {:.2}%", m.cagr);
    println!("Sharpe Ratio:      {:.2}", m.sharpe_ratio);
}

fn print_comparison(results: &[BacktestResult]) {
    println!(
        "\n{:<32} {:>12} {:>8} {:>9} {:>9} {:>9} {:>8}",
        "Strategy", "Return(%)", "Trades", "Win(%)", "MDD(%)", "CAGR(%)", "Sharpe"
    );
    for r in results {
        let m = &r.metrics;
        println!(
            "{:<32} {:>12.2} {:>8} {:>9.1} {:>9.2} {:>9.2} {:>8.2}",
            r.strategy_name(),
            m.cumulative_return,
            m.total_trades,
            m.win_rate,
            m.mdd,
            m.cagr,
            m.sharpe_ratio
        );
    }
    if let Some(best) = backtest_engine::best_by_cumulative_return(results) {
        println!(
            "\nBest: {} ({:.2}%)",
            best.strategy_name(),
            best.metrics.cumulative_return
        );
    }
}

fn run_list_strategies(registry: &StrategyRegistry) -> ExitCode {
    for name in registry.available() {
        println!("{}", name);
    }
    ExitCode::SUCCESS
}

fn run_list_tickers(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let path = match adapter.get_string("data", "path") {
        Some(p) if !p.trim().is_empty() => PathBuf::from(p.trim()),
        _ => {
            let err = StratbenchError::ConfigMissing {
                section: "data".into(),
                key: "path".into(),
            };
            eprintln!("error: {err}");
            return (&err).into();
        }
    };
    run_list_tickers_pipeline(&CsvAdapter::new(path))
}

/// Prints every ticker the data port can serve, one per line.
pub fn run_list_tickers_pipeline(data_port: &dyn DataPort) -> ExitCode {
    match data_port.list_tickers() {
        Ok(tickers) => {
            info!(count = tickers.len(), "tickers found");
            for ticker in tickers {
                println!("{ticker}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &Path, registry: &StrategyRegistry) -> ExitCode {
    let adapter = match load_validated(config_path, true) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let strategy = match build_strategy(&adapter, registry, None) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut indicators: Vec<String> = strategy
        .required_indicators()
        .iter()
        .map(|i| i.to_string())
        .collect();
    indicators.sort();

    eprintln!("Strategy: {}", strategy.name());
    if !indicators.is_empty() {
        eprintln!("Indicators: {}", indicators.join(", "));
    }
    eprintln!("Configuration is valid");
    ExitCode::SUCCESS
}
