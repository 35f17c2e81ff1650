//! Per-bar trading signal.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Hold,
}

impl Signal {
    /// Numeric encoding used in exported tables: Buy = 1, Sell = -1, Hold = 0.
    pub fn as_i8(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Sell => -1,
            Signal::Hold => 0,
        }
    }

    /// Signal from a strict comparison: `a > b` is Buy, `a < b` is Sell,
    /// equality or an undefined side is Hold.
    pub fn from_comparison(a: Option<f64>, b: Option<f64>) -> Self {
        match (a, b) {
            (Some(a), Some(b)) if a > b => Signal::Buy,
            (Some(a), Some(b)) if a < b => Signal::Sell,
            _ => Signal::Hold,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}
