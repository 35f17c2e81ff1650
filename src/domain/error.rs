//! Domain error types.

/// Top-level error type for stratbench.
#[derive(Debug, thiserror::Error)]
pub enum StratbenchError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown strategy type '{name}' (available: {})", available.join(", "))]
    UnknownStrategy { name: String, available: Vec<String> },

    #[error("strategy '{strategy}' requires parameter '{key}'")]
    MissingParameter { strategy: String, key: String },

    #[error("invalid parameter '{key}' for strategy '{strategy}': {reason}")]
    InvalidParameter {
        strategy: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("insufficient data for {ticker}: have {bars} bars, need {minimum}")]
    InsufficientData {
        ticker: String,
        bars: usize,
        minimum: usize,
    },

    #[error("signal series has {signals} entries but price series has {bars} bars")]
    SignalLengthMismatch { signals: usize, bars: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&StratbenchError> for std::process::ExitCode {
    fn from(err: &StratbenchError) -> Self {
        let code: u8 = match err {
            StratbenchError::Io(_) => 1,
            StratbenchError::ConfigParse { .. }
            | StratbenchError::ConfigMissing { .. }
            | StratbenchError::ConfigInvalid { .. } => 2,
            StratbenchError::DataSource { .. } => 3,
            StratbenchError::UnknownStrategy { .. }
            | StratbenchError::MissingParameter { .. }
            | StratbenchError::InvalidParameter { .. }
            | StratbenchError::SignalLengthMismatch { .. } => 4,
            StratbenchError::NoData { .. } | StratbenchError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
