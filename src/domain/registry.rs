//! Name → constructor registry for strategies.
//!
//! Built-in entries: `buy_and_hold`, `golden_cross`, `rsi`, `bollinger`,
//! `macd`. Parameters come in as a string bag (usually one INI section) and
//! are parsed by the constructor; a missing parameter is an error.

use crate::domain::error::StratbenchError;
use crate::domain::strategy::{Strategy, StrategyKind};
use crate::ports::config_port::ConfigPort;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Raw strategy parameters keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyParams {
    values: BTreeMap<String, String>,
}

impl StrategyParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every key of `section`. `strategy_type` is not a parameter and is skipped.
    pub fn from_config(config: &dyn ConfigPort, section: &str) -> Self {
        let values = config
            .section_keys(section)
            .into_iter()
            .filter(|key| key != "strategy_type")
            .filter_map(|key| config.get_string(section, &key).map(|v| (key, v)))
            .collect();
        Self { values }
    }

    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl ToString) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn require_usize(&self, strategy: &str, key: &str) -> Result<usize, StratbenchError> {
        self.require(strategy, key, "expected a non-negative integer")
    }

    pub fn require_f64(&self, strategy: &str, key: &str) -> Result<f64, StratbenchError> {
        self.require(strategy, key, "expected a number")
    }

    fn require<T: FromStr>(
        &self,
        strategy: &str,
        key: &str,
        expected: &str,
    ) -> Result<T, StratbenchError> {
        let raw = self.get(key).ok_or_else(|| StratbenchError::MissingParameter {
            strategy: strategy.to_string(),
            key: key.to_string(),
        })?;
        raw.trim()
            .parse()
            .map_err(|_| StratbenchError::InvalidParameter {
                strategy: strategy.to_string(),
                key: key.to_string(),
                reason: format!("{expected}, got '{raw}'"),
            })
    }
}

pub type StrategyConstructor = fn(&StrategyParams) -> Result<Strategy, StratbenchError>;

#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    constructors: BTreeMap<String, StrategyConstructor>,
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl StrategyRegistry {
    /// A registry with no entries.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(StrategyKind::BuyAndHold.key(), build_buy_and_hold);
        registry.register(StrategyKind::GoldenCross.key(), build_golden_cross);
        registry.register(StrategyKind::Rsi.key(), build_rsi);
        registry.register(StrategyKind::Bollinger.key(), build_bollinger);
        registry.register(StrategyKind::Macd.key(), build_macd);
        registry
    }

    /// Adds `name`, replacing any existing entry of that name.
    pub fn register(&mut self, name: &str, constructor: StrategyConstructor) {
        self.constructors.insert(name.to_string(), constructor);
    }

    pub fn create(&self, name: &str, params: &StrategyParams) -> Result<Strategy, StratbenchError> {
        let constructor =
            self.constructors
                .get(name)
                .ok_or_else(|| StratbenchError::UnknownStrategy {
                    name: name.to_string(),
                    available: self.available(),
                })?;
        constructor(params)
    }

    /// Registered names, sorted.
    pub fn available(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }
}

fn build_buy_and_hold(_params: &StrategyParams) -> Result<Strategy, StratbenchError> {
    Ok(Strategy::BuyAndHold)
}

fn build_golden_cross(params: &StrategyParams) -> Result<Strategy, StratbenchError> {
    let key = StrategyKind::GoldenCross.key();
    Strategy::golden_cross(
        params.require_usize(key, "short_ma")?,
        params.require_usize(key, "long_ma")?,
    )
}

fn build_rsi(params: &StrategyParams) -> Result<Strategy, StratbenchError> {
    let key = StrategyKind::Rsi.key();
    Strategy::rsi(
        params.require_usize(key, "rsi_period")?,
        params.require_f64(key, "oversold")?,
        params.require_f64(key, "overbought")?,
    )
}

fn build_bollinger(params: &StrategyParams) -> Result<Strategy, StratbenchError> {
    let key = StrategyKind::Bollinger.key();
    Strategy::bollinger(
        params.require_usize(key, "period")?,
        params.require_f64(key, "std_dev")?,
    )
}

fn build_macd(params: &StrategyParams) -> Result<Strategy, StratbenchError> {
    let key = StrategyKind::Macd.key();
    Strategy::macd(
        params.require_usize(key, "fast_period")?,
        params.require_usize(key, "slow_period")?,
        params.require_usize(key, "signal_period")?,
    )
}
