use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Crate-level error for the thin I/O around the pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Failures the controller can see while driving one target.
///
/// `NotFound` is deliberately absent: a 404 page is a terminal outcome,
/// not an error, and never consumes retry budget. Extractor mismatches
/// are absorbed inside the extractors and never reach this type.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The document never produced its minimal structure within budget.
    #[error("document not ready after {0:?}")]
    ReadinessTimeout(Duration),
    /// Transport/session-level failure. The owned session is assumed
    /// poisoned and must be recreated before the next attempt.
    #[error("session fault: {0}")]
    SessionFault(String),
    /// A navigation was never issued or its document was lost.
    #[error("no document loaded")]
    NoDocument,
}

impl FetchError {
    /// Only session faults force the controller to destroy and recreate
    /// the owned session; everything else retries on the same handle.
    pub fn forces_restart(&self) -> bool {
        matches!(self, FetchError::SessionFault(_))
    }
}

/* Conversions so `?` works smoothly */
impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::SessionFault(e.to_string())
    }
}
