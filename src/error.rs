use thiserror::Error;

use crate::brain::BrainError;
use crate::driver::DriverError;
use crate::filter::FilterError;

/// Top-level error for the binary: everything a pipeline run can fail with.
#[derive(Debug, Error)]
pub enum AlphasubError {
    #[error("filter step failed: {0}")]
    Filter(#[from] FilterError),

    #[error("Brain API error: {0}")]
    Brain(#[from] BrainError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error(transparent)]
    Config(#[from] anyhow::Error),
}
