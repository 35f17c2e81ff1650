//! Simulator position state and buy sizing.

use std::fmt;
use std::str::FromStr;

/// Amount committed per buy: a fixed cash amount or all available cash.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TradeUnit {
    Fixed(f64),
    Full,
}

impl TradeUnit {
    /// Cash budget for one buy given the current balance.
    pub fn budget(&self, cash: f64) -> f64 {
        match *self {
            TradeUnit::Fixed(amount) => amount,
            TradeUnit::Full => cash,
        }
    }
}

impl FromStr for TradeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("full") {
            return Ok(TradeUnit::Full);
        }
        match s.parse::<f64>() {
            Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(TradeUnit::Fixed(amount)),
            _ => Err(format!(
                "trade unit must be a positive amount or 'full', got '{s}'"
            )),
        }
    }
}

impl fmt::Display for TradeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeUnit::Fixed(amount) => write!(f, "{}", amount),
            TradeUnit::Full => write!(f, "full"),
        }
    }
}

/// Cash and whole shares held during one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub cash: f64,
    pub shares: u64,
}

impl Position {
    pub fn new(cash: f64) -> Self {
        Self { cash, shares: 0 }
    }

    pub fn is_open(&self) -> bool {
        self.shares > 0
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn total_value(&self, price: f64) -> f64 {
        self.cash + self.market_value(price)
    }

    /// Shares to buy at `price` under `unit`.
    ///
    /// When one share costs more than the budget but cash covers it, exactly
    /// one share is bought. Otherwise the budget must be covered by cash and
    /// is spent in whole shares.
    pub fn buy_quantity(&self, price: f64, unit: TradeUnit) -> u64 {
        if price.is_nan() || price <= 0.0 {
            return 0;
        }
        let budget = unit.budget(self.cash);
        if price > budget && self.cash >= price {
            1
        } else if self.cash >= budget {
            (budget / price).floor() as u64
        } else {
            0
        }
    }

    /// Buys `shares` at `price`, debiting cash.
    pub fn buy(&mut self, shares: u64, price: f64) {
        self.cash -= shares as f64 * price;
        self.shares += shares;
    }

    /// Sells the whole position at `price`; returns the number of shares sold.
    pub fn sell_all(&mut self, price: f64) -> u64 {
        let sold = self.shares;
        self.cash += self.market_value(price);
        self.shares = 0;
        sold
    }
}
