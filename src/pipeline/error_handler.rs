//! Error aggregation for a walk: many threads append, one caller reads at the end.

use std::fmt;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Thread-safe, append-only collector of non-fatal failures.
#[derive(Debug, Default)]
pub struct ErrorAggregator {
    errors: Mutex<Vec<anyhow::Error>>,
}

impl ErrorAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking appender must not cost us the errors already recorded.
    fn lock(&self) -> MutexGuard<'_, Vec<anyhow::Error>> {
        self.errors.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn append(&self, err: anyhow::Error) {
        log::warn!("{:#}", err);
        self.lock().push(err);
    }

    /// Append failures that were already reported elsewhere (no logging).
    pub fn extend<I: IntoIterator<Item = anyhow::Error>>(&self, errors: I) {
        self.lock().extend(errors);
    }

    pub fn has_errors(&self) -> bool {
        !self.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_errors()
    }

    /// Messages (with full context chain) of everything recorded so far.
    pub fn messages(&self) -> Vec<String> {
        self.lock().iter().map(|e| format!("{:#}", e)).collect()
    }

    /// Drain into a consolidated error, or `None` when nothing was recorded.
    pub fn take(&self) -> Option<AggregateError> {
        let errors = std::mem::take(&mut *self.lock());
        (!errors.is_empty()).then_some(AggregateError { errors })
    }

    pub fn into_result(self) -> Result<(), AggregateError> {
        let errors = self.errors.into_inner().unwrap_or_else(|e| e.into_inner());
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AggregateError { errors })
        }
    }
}

/// Every failure of a walk, in the order they were recorded.
#[derive(Debug)]
pub struct AggregateError {
    errors: Vec<anyhow::Error>,
}

impl AggregateError {
    pub fn errors(&self) -> &[anyhow::Error] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<anyhow::Error> {
        self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [one] => write!(f, "{:#}", one),
            errors => {
                write!(f, "{} errors:", errors.len())?;
                for e in errors {
                    write!(f, "\n  {:#}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for AggregateError {}

/// Outcome of a walk that did not finish cleanly. Cancellation wins over anything aggregated;
/// failures recorded before the cancel ride along and are listed after it.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("walk cancelled{}", cancelled_suffix(.0))]
    Cancelled(Option<AggregateError>),
    #[error(transparent)]
    Failed(#[from] AggregateError),
}

fn cancelled_suffix(earlier: &Option<AggregateError>) -> String {
    earlier
        .as_ref()
        .map(|agg| format!("; before that:\n{}", agg))
        .unwrap_or_default()
}

impl WalkError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WalkError::Cancelled(_))
    }

    /// The aggregated failures, including those recorded before a cancellation.
    pub fn aggregate(&self) -> Option<&AggregateError> {
        match self {
            WalkError::Failed(agg) => Some(agg),
            WalkError::Cancelled(earlier) => earlier.as_ref(),
        }
    }
}
