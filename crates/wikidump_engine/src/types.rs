use std::path::PathBuf;

use thiserror::Error;

use crate::convert::ConversionError;
use crate::persist::PersistError;

/// Why a single page produced no article.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),
    #[error("write failed: {0}")]
    Persist(#[from] PersistError),
    #[error("worker panicked: {0}")]
    Panicked(String),
}

/// Outcome of processing one page record.
#[derive(Debug)]
pub struct ConversionResult {
    pub title: String,
    pub outcome: Result<PathBuf, PageError>,
}

impl ConversionResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Per-batch tally handed back to the state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub succeeded: u64,
    pub failed: u64,
}

impl BatchTally {
    pub fn from_results(results: &[ConversionResult]) -> Self {
        results.iter().fold(Self::default(), |mut tally, result| {
            if result.is_success() {
                tally.succeeded += 1;
            } else {
                tally.failed += 1;
            }
            tally
        })
    }
}
