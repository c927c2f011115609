use crate::types::{AnimalId, ExperimentId};
use crate::window::AnalysisWindow;

use chrono::NaiveDateTime;
use std::collections::BTreeSet;

/// Error returned from [crate::TimeSeries] constructors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TimeSeriesError {
    #[error("timestamps and temperatures have different lengths: {t} and {m}")]
    LengthMismatch { t: usize, m: usize },

    #[error("timestamps must be non-decreasing, sample {index} goes back in time")]
    Unsorted { index: usize },

    #[error("temperature of sample {index} is not a finite number")]
    NonFinite { index: usize },
}

/// Error returned from [crate::select]
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("event date is missing or invalid: {reason}")]
    InvalidEventDate { reason: String },

    #[error(
        "window of {days_before} days before and {days_after} days after {event} is out of the supported date range"
    )]
    SpanOutOfRange {
        event: NaiveDateTime,
        days_before: u32,
        days_after: u32,
    },
}

impl WindowError {
    pub(crate) fn invalid_event_date(reason: impl Into<String>) -> Self {
        Self::InvalidEventDate {
            reason: reason.into(),
        }
    }
}

/// Error returned from [crate::CosinorFit::fit]
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FitError {
    #[error("time-series' length {actual} is smaller than the minimum required length {minimum}")]
    ShortTimeSeries { actual: usize, minimum: usize },

    #[error("optimal parameters not found: {diagnostic}")]
    ConvergenceFailure { diagnostic: String },
}

/// Error returned from [crate::GroupConfig::validate]
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum GroupConfigError {
    #[error("animals {0:?} belong to both groups")]
    Overlapping(BTreeSet<AnimalId>),

    #[error("group labels must be distinct and non-empty, got {0:?}")]
    BadLabels(Vec<String>),
}

/// Error returned from [crate::ResultTable] constructors
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum TableError {
    #[error("duplicate record for animal {animal}, experiment {experiment}, {window} window")]
    DuplicateKey {
        animal: AnimalId,
        experiment: ExperimentId,
        window: AnalysisWindow,
    },
}

/// Error returned from [crate::AnalysisConfig] loading and validation
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot parse analysis configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Groups(#[from] GroupConfigError),
}
