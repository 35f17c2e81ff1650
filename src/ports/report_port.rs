//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::StratbenchError;
use std::path::{Path, PathBuf};

/// Port for writing backtest reports.
pub trait ReportPort {
    /// Writes the report for `result` into `output_dir`; returns the files
    /// written.
    fn write(
        &self,
        result: &BacktestResult,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, StratbenchError>;
}
